pub mod store;

pub use store::ChainStore;
