use std::path::PathBuf;

use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_MINING_ROUNDS};
use crate::error::ConfigError;

/// Runtime settings of a node. Built from CLI flags and the environment.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Run the mining job. Non-mining nodes still validate peer blocks.
    pub mine: bool,
    pub difficulty: u32,
    pub mining_rounds: u64,
    /// Base URLs of the other nodes, e.g. `http://10.0.0.2:5000/`.
    pub peers: Vec<String>,
    pub data_dir: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            mine: false,
            difficulty: DEFAULT_DIFFICULTY,
            mining_rounds: DEFAULT_MINING_ROUNDS,
            peers: Vec::new(),
            data_dir: PathBuf::from("chaindata"),
        }
    }
}

impl NodeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // a sha-256 hex digest has 64 digits
        if self.difficulty > 64 {
            return Err(ConfigError::DifficultyTooHigh(self.difficulty));
        }
        if self.mining_rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if let Some(bad) = self
            .peers
            .iter()
            .find(|p| !(p.starts_with("http://") || p.starts_with("https://")))
        {
            return Err(ConfigError::BadPeer(bad.clone()));
        }
        Ok(())
    }
}
