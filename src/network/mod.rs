pub mod peers;
pub mod sync;

pub use peers::PeerClient;
pub use sync::ChainSync;
