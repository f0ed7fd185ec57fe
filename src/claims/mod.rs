pub mod model;
pub mod tracker;

pub use model::{ClaimData, ClaimRecord, PendingClaims};
pub use tracker::{ClaimConflict, ClaimTracker};
