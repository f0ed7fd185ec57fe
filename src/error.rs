use std::path::PathBuf;

/// Reasons a sequence of blocks is not a valid chain.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("chain has no blocks")]
    Empty,

    #[error("block 0 is not the genesis block")]
    BadGenesis,

    #[error("block #{index} does not link to its predecessor")]
    BrokenLink { index: u64 },

    #[error("block #{index} fails its hash or difficulty check")]
    InvalidBlock { index: u64 },

    #[error("block #{index} carries no claim data")]
    EmptyBlock { index: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed block file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored chain is invalid: {0}")]
    Chain(#[from] ChainError),
}

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("request to {peer} failed: {source}")]
    Http {
        peer: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("peer {peer} answered with status {status}")]
    Status { peer: String, status: u16 },
}

/// Invariant violations in the mining engine. These are never expected and
/// halt the node.
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("mined block #{index} (nonce {nonce}) fails its own validity check")]
    InconsistentSeal { index: u64, nonce: u64 },

    #[error("mining task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("difficulty {0} exceeds the 64 hex digits of a sha-256 hash")]
    DifficultyTooHigh(u32),

    #[error("mining rounds must be greater than zero")]
    ZeroRounds,

    #[error("peer address {0:?} must start with http:// or https://")]
    BadPeer(String),

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
