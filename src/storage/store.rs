use log::{debug, info};
use std::fs;
use std::path::PathBuf;

use crate::blockchain::{Block, Chain};
use crate::error::StoreError;

/// Local chain store: one JSON file per block, named by zero-padded index.
#[derive(Debug, Clone)]
pub struct ChainStore {
    dir: PathBuf,
}

impl ChainStore {
    /// Open (and create if needed) the store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Read the stored chain. An empty store yields a genesis-only chain.
    pub fn load(&self, difficulty: u32) -> Result<Chain, StoreError> {
        let indices = self.stored_indices()?;
        if indices.is_empty() {
            debug!("no blocks in {}, starting from genesis", self.dir.display());
            return Ok(Chain::new(difficulty));
        }

        let mut blocks = Vec::with_capacity(indices.len());
        for index in indices {
            let path = self.block_path(index);
            let raw = fs::read(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let block: Block = serde_json::from_slice(&raw)
                .map_err(|source| StoreError::Malformed { path, source })?;
            blocks.push(block);
        }
        Ok(Chain::from_blocks(blocks, difficulty)?)
    }

    /// Persist a single newly committed block.
    pub fn append(&self, block: &Block) -> Result<(), StoreError> {
        self.write_block(block)?;
        debug!("stored block #{} in {}", block.index, self.dir.display());
        Ok(())
    }

    /// Replace the stored chain with `chain`, removing blocks past its tip.
    pub fn save_chain(&self, chain: &Chain) -> Result<(), StoreError> {
        for block in chain.blocks() {
            self.write_block(block)?;
        }
        let len = chain.len() as u64;
        for index in self.stored_indices()?.into_iter().filter(|i| *i >= len) {
            let path = self.block_path(index);
            fs::remove_file(&path).map_err(|source| StoreError::Io { path, source })?;
        }
        info!(
            "saved chain of {} block(s) to {}",
            chain.len(),
            self.dir.display()
        );
        Ok(())
    }

    fn block_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{index:06}.json"))
    }

    // Write to a temp file first, then rename over the final name.
    fn write_block(&self, block: &Block) -> Result<(), StoreError> {
        let path = self.block_path(block.index);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(block).map_err(|source| StoreError::Malformed {
            path: path.clone(),
            source,
        })?;
        fs::write(&tmp, body).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    fn stored_indices(&self) -> Result<Vec<u64>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut indices = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(index) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }
}
