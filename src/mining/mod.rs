pub mod miner;
pub mod scheduler;

pub use miner::MiningJob;
pub use scheduler::{Scheduler, run_worker};
