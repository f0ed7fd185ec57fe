use log::info;

use super::PeerClient;
use crate::blockchain::{Chain, select_canonical};
use crate::error::StoreError;
use crate::storage::ChainStore;

/// Reconciles the local chain with the peers' chains.
#[derive(Debug, Clone)]
pub struct ChainSync {
    store: ChainStore,
    peers: PeerClient,
    difficulty: u32,
}

impl ChainSync {
    pub fn new(store: ChainStore, peers: PeerClient, difficulty: u32) -> Self {
        Self {
            store,
            peers,
            difficulty,
        }
    }

    pub fn store(&self) -> &ChainStore {
        &self.store
    }

    pub fn peers(&self) -> &PeerClient {
        &self.peers
    }

    /// Re-read the locally persisted chain without contacting peers.
    pub fn sync_local(&self) -> Result<Chain, StoreError> {
        self.store.load(self.difficulty)
    }

    /// Query every peer and return the canonical chain among the local one and
    /// all fully valid peer chains. Unreachable peers are skipped. With `save`,
    /// the winner is persisted locally.
    pub async fn sync(&self, save: bool) -> Result<Chain, StoreError> {
        let local = self.sync_local()?;
        let local_len = local.len();

        let candidates = self.peers.fetch_all().await;
        let best = select_canonical(local, candidates);
        if best.len() > local_len {
            info!(
                "adopting peer chain: {} -> {} block(s)",
                local_len,
                best.len()
            );
        }

        if save {
            self.store.save_chain(&best)?;
        }
        Ok(best)
    }
}
