use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::GENESIS_PREV_HASH;
use crate::claims::{ClaimData, PendingClaims};

/// A single block in the ledger holding the claim records of one or more nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub data: ClaimData,
    pub prev_hash: String,
    pub nonce: u64, // Proof-of-Work nonce
    pub hash: String,
}

impl Block {
    /// The fixed first block. Every node derives the same one.
    pub fn genesis() -> Self {
        let mut block = Self {
            index: 0,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            data: ClaimData::new(),
            prev_hash: String::from(GENESIS_PREV_HASH),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Build an unsealed block on top of `prev`. `pending` is taken by value so
    /// the candidate is isolated from later changes to the pending queue.
    pub fn candidate(
        prev: &Block,
        pending: PendingClaims,
        timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        let mut block = Self {
            index: prev.index + 1,
            timestamp: timestamp.unwrap_or_else(Utc::now),
            data: pending,
            prev_hash: prev.hash.clone(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Deterministic JSON of the claim data, as it enters the hash preimage.
    pub fn payload(&self) -> String {
        serde_json::to_string(&self.data).expect("claim data is always serializable")
    }

    /// SHA-256 over every field except `hash` itself.
    pub fn compute_hash(&self) -> String {
        self.hash_with_payload(&self.payload())
    }

    /// Same as [`Block::compute_hash`] with the data JSON supplied by the caller,
    /// so a nonce search serializes the payload only once.
    pub fn hash_with_payload(&self, payload: &str) -> String {
        let preimage = format!(
            "{}:{}:{}:{}:{}",
            self.index,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.prev_hash,
            self.nonce,
            payload
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Validate hash integrity and PoW difficulty and, when `prev` is given,
    /// linkage to it. A failed check is an ordinary rejection.
    pub fn is_valid(&self, prev: Option<&Block>, difficulty: u32) -> bool {
        if self.hash != self.compute_hash() {
            return false;
        }
        if !meets_difficulty(&self.hash, difficulty) {
            return false;
        }
        match prev {
            Some(prev) => self.prev_hash == prev.hash && self.index == prev.index + 1,
            None => true,
        }
    }
}

/// `true` when `hash` starts with `difficulty` zero hex digits.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
