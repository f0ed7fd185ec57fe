use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::sync::RwLock;

use crate::blockchain::{Block, Chain};
use crate::claims::{ClaimConflict, ClaimRecord, ClaimTracker, PendingClaims};
use crate::config::NodeConfig;
use crate::error::ChainError;
use crate::mining::{MiningJob, Scheduler};
use crate::network::ChainSync;

/// Shared node state.
///
/// The committed chain sits behind one `RwLock`; every commit holds the write
/// lock while it appends, prunes claims and persists. Locks are always taken
/// in the order chain, then claims.
pub struct Node {
    chain: RwLock<Chain>,
    claims: ClaimTracker,
    sync: ChainSync,
    scheduler: Scheduler,
    mine: bool,
    mining_rounds: u64,
}

impl Node {
    pub fn new(chain: Chain, sync: ChainSync, config: &NodeConfig) -> Self {
        Self {
            chain: RwLock::new(chain),
            claims: ClaimTracker::new(),
            sync,
            scheduler: Scheduler::new(),
            mine: config.mine,
            mining_rounds: config.mining_rounds,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn difficulty(&self) -> u32 {
        self.chain.read().expect("lock poisoned").difficulty()
    }

    pub fn chain_len(&self) -> usize {
        self.chain.read().expect("lock poisoned").len()
    }

    pub fn tip(&self) -> Block {
        self.chain.read().expect("lock poisoned").tip().clone()
    }

    /// Committed blocks from `index` on.
    pub fn blocks_from(&self, index: usize) -> Vec<Block> {
        self.chain
            .read()
            .expect("lock poisoned")
            .blocks_from(index)
            .to_vec()
    }

    pub fn pending(&self) -> PendingClaims {
        self.claims.snapshot()
    }

    /// Queue a status report, or reject it if it claims a target another node
    /// holds. An accepted report wakes a parked mining job.
    pub fn accept_report(&self, report: ClaimRecord) -> Result<(), ClaimConflict> {
        {
            let chain = self.chain.read().expect("lock poisoned");
            self.claims.accept_report(report, &chain)?;
        }
        self.scheduler.unpark_mining();
        Ok(())
    }

    /// Unsealed block on the current tip carrying a snapshot of pending claims.
    pub fn candidate(&self, timestamp: Option<DateTime<Utc>>) -> Block {
        let chain = self.chain.read().expect("lock poisoned");
        Block::candidate(chain.tip(), self.claims.snapshot(), timestamp)
    }

    /// Put mining on the schedule if this node mines.
    pub fn start_mining(&self) {
        if self.mine {
            self.scheduler.submit_mining(MiningJob::fresh(self.mining_rounds));
        }
    }

    /// Hold `job` back while there is nothing to seal.
    pub fn park_mining(&self, job: MiningJob) {
        debug!("nothing pending, parking mining job");
        self.scheduler.park_mining(job);
        // a report may have been queued after the candidate was built
        if !self.claims.is_empty() {
            self.scheduler.unpark_mining();
        }
    }

    /// Commit a block mined locally, announce it, and mine on the new tip.
    pub async fn commit_mined(&self, block: Block) {
        match self.commit(block.clone()) {
            Ok(()) => {
                info!("mined block #{} committed ({})", block.index, block.hash);
                self.sync.peers().announce(&block).await;
            }
            Err(e) => warn!("discarding stale mined block #{}: {}", block.index, e),
        }
        self.start_mining();
    }

    /// Validate a block announced by a peer and adopt it if it extends our tip.
    /// Returns whether the block was adopted; a rejection is not an error.
    pub fn adopt_peer_block(&self, block: Block) -> bool {
        if block.data.is_empty() {
            debug!("rejecting peer block #{} with empty data", block.index);
            return false;
        }
        let index = block.index;
        if let Err(e) = self.commit(block) {
            debug!("rejecting peer block #{}: {}", index, e);
            return false;
        }
        info!("adopted peer block #{}", index);

        // the queued mining job targets the old tip
        self.scheduler.remove_mining();
        self.start_mining();
        true
    }

    fn commit(&self, block: Block) -> Result<(), ChainError> {
        let mut chain = self.chain.write().expect("lock poisoned");
        chain.push(block)?;
        let committed = chain.tip();
        self.claims.prune_on_commit(committed);
        if let Err(e) = self.sync.store().append(committed) {
            error!("failed to persist block #{}: {}", committed.index, e);
        }
        Ok(())
    }
}
