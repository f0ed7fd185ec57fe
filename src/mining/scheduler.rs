use log::{debug, error};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

use super::miner::{MiningJob, mine_block};
use crate::blockchain::Block;
use crate::error::ConsensusError;
use crate::node::Node;

/// Stable identity of the mining job. At most one job with it is queued.
pub const MINING_JOB_ID: &str = "mining";

/// Check a block announced by a peer. Runs once.
#[derive(Debug, Clone)]
pub struct ValidationJob {
    pub id: Uuid,
    pub block: Block,
}

#[derive(Debug, Clone)]
pub enum Job {
    Mine(MiningJob),
    Validate(ValidationJob),
}

#[derive(Debug, Default)]
struct Queue {
    mining: Option<MiningJob>,
    // mining job set aside while there is nothing to seal
    parked: Option<MiningJob>,
    validations: VecDeque<ValidationJob>,
}

/// Single-consumer job queue. One slot holds the mining job, validation jobs
/// queue FIFO and are handed out before the next mining round. A parked mining
/// job is never handed out until it is unparked.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: Mutex<Queue>,
    wakeup: Notify,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `job` under [`MINING_JOB_ID`], replacing a queued or parked one.
    /// Returns `true` if a job was replaced.
    pub fn submit_mining(&self, job: MiningJob) -> bool {
        let replaced = {
            let mut queue = self.queue.lock().expect("mutex poisoned");
            let parked = queue.parked.take().is_some();
            queue.mining.replace(job).is_some() || parked
        };
        self.wakeup.notify_one();
        replaced
    }

    /// Remove the queued (or parked) mining job, if any.
    pub fn remove_mining(&self) -> Option<MiningJob> {
        let removed = {
            let mut queue = self.queue.lock().expect("mutex poisoned");
            let parked = queue.parked.take();
            queue.mining.take().or(parked)
        };
        match &removed {
            Some(_) => debug!("removed queued {} job", MINING_JOB_ID),
            None => debug!("no queued {} job to remove", MINING_JOB_ID),
        }
        removed
    }

    /// Set `job` aside until [`Scheduler::unpark_mining`].
    pub fn park_mining(&self, job: MiningJob) {
        let mut queue = self.queue.lock().expect("mutex poisoned");
        if queue.mining.is_none() {
            queue.parked = Some(job);
        }
    }

    /// Move a parked mining job back into the queue. Returns `true` if one was
    /// parked.
    pub fn unpark_mining(&self) -> bool {
        let unparked = {
            let mut queue = self.queue.lock().expect("mutex poisoned");
            match queue.parked.take() {
                Some(job) => {
                    if queue.mining.is_none() {
                        queue.mining = Some(job);
                    }
                    true
                }
                None => false,
            }
        };
        if unparked {
            debug!("unparked {} job", MINING_JOB_ID);
            self.wakeup.notify_one();
        }
        unparked
    }

    pub fn submit_validation(&self, block: Block) -> Uuid {
        let id = Uuid::new_v4();
        debug!("queued validation {} for block #{}", id, block.index);
        self.queue
            .lock()
            .expect("mutex poisoned")
            .validations
            .push_back(ValidationJob { id, block });
        self.wakeup.notify_one();
        id
    }

    #[cfg(test)]
    pub fn queued_mining(&self) -> Option<MiningJob> {
        self.queue.lock().expect("mutex poisoned").mining.clone()
    }

    pub fn try_next(&self) -> Option<Job> {
        let mut queue = self.queue.lock().expect("mutex poisoned");
        if let Some(job) = queue.validations.pop_front() {
            return Some(Job::Validate(job));
        }
        queue.mining.take().map(Job::Mine)
    }

    /// Wait for the next job.
    pub async fn next(&self) -> Job {
        loop {
            if let Some(job) = self.try_next() {
                return job;
            }
            self.wakeup.notified().await;
        }
    }
}

/// Execute one job against `node`. Only a fatal mining invariant violation
/// is returned as an error.
pub async fn run_job(node: &Node, job: Job) -> Result<(), ConsensusError> {
    match job {
        Job::Validate(job) => {
            debug!("running validation {}", job.id);
            node.adopt_peer_block(job.block);
        }
        Job::Mine(job) => {
            let candidate = node.candidate(job.timestamp);
            if candidate.data.is_empty() {
                node.park_mining(job);
                return Ok(());
            }
            let difficulty = node.difficulty();
            let outcome = tokio::task::spawn_blocking(move || {
                mine_block(candidate, job.rounds, job.start_nonce, difficulty)
            })
            .await
            .map_err(|e| ConsensusError::Aborted(e.to_string()))??;

            match outcome.block {
                Some(block) => node.commit_mined(block).await,
                None => {
                    node.scheduler().submit_mining(MiningJob::resume(&outcome));
                }
            }
        }
    }
    Ok(())
}

/// Drive the scheduler until a fatal error.
pub async fn run_worker(node: Arc<Node>) -> Result<(), ConsensusError> {
    loop {
        let job = node.scheduler().next().await;
        if let Err(e) = run_job(&node, job).await {
            error!("scheduler halted: {}", e);
            return Err(e);
        }
    }
}
