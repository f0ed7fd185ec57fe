pub mod block;
pub mod chain;

pub use block::{Block, meets_difficulty};
pub use chain::{Chain, select_canonical};

/// `prev_hash` of the genesis block.
pub const GENESIS_PREV_HASH: &str = "0";

/// Default Proof-of-Work difficulty (number of leading zero hex digits).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Nonces tried per mining job before yielding back to the scheduler.
pub const DEFAULT_MINING_ROUNDS: u64 = 100_000;
