use chrono::{DateTime, Utc};
use log::{debug, error, info};

use crate::blockchain::{Block, meets_difficulty};
use crate::error::ConsensusError;

/// A resumable slice of nonce search: try `[start_nonce, start_nonce + rounds)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningJob {
    pub rounds: u64,
    pub start_nonce: u64,
    /// Fixed candidate timestamp when resuming; `None` stamps a fresh candidate.
    pub timestamp: Option<DateTime<Utc>>,
}

impl MiningJob {
    /// First round against a new tip.
    pub fn fresh(rounds: u64) -> Self {
        Self {
            rounds,
            start_nonce: 0,
            timestamp: None,
        }
    }

    /// The round following an exhausted one.
    pub fn resume(outcome: &MineOutcome) -> Self {
        Self {
            rounds: outcome.rounds,
            start_nonce: outcome.start_nonce.saturating_add(outcome.rounds),
            timestamp: Some(outcome.timestamp),
        }
    }
}

/// Result of one bounded search. `block` is `None` when the range was exhausted;
/// the other fields echo what was tried so the caller can resume.
#[derive(Debug, Clone)]
pub struct MineOutcome {
    pub block: Option<Block>,
    pub rounds: u64,
    pub start_nonce: u64,
    pub timestamp: DateTime<Utc>,
}

/// Search nonces in increasing order and seal `candidate` with the first one
/// whose hash meets `difficulty`. A candidate with empty data is never sealed.
///
/// Returns [`ConsensusError::InconsistentSeal`] if the sealed block fails its
/// own validity check.
pub fn mine_block(
    mut candidate: Block,
    rounds: u64,
    start_nonce: u64,
    difficulty: u32,
) -> Result<MineOutcome, ConsensusError> {
    let timestamp = candidate.timestamp;
    let outcome = |block| MineOutcome {
        block,
        rounds,
        start_nonce,
        timestamp,
    };

    debug!(
        "mining for block #{} start_nonce={} rounds={}",
        candidate.index, start_nonce, rounds
    );
    if candidate.data.is_empty() {
        return Ok(outcome(None));
    }

    let payload = candidate.payload();
    for nonce in start_nonce..start_nonce.saturating_add(rounds) {
        candidate.nonce = nonce;
        candidate.hash = candidate.hash_with_payload(&payload);
        if !meets_difficulty(&candidate.hash, difficulty) {
            continue;
        }

        if !candidate.is_valid(None, difficulty) {
            error!(
                "block #{} sealed with nonce {} fails validation",
                candidate.index, nonce
            );
            return Err(ConsensusError::InconsistentSeal {
                index: candidate.index,
                nonce,
            });
        }
        info!("block #{} mined, nonce {}", candidate.index, nonce);
        return Ok(outcome(Some(candidate)));
    }

    Ok(outcome(None))
}
