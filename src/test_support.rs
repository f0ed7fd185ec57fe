//! Fixtures shared by the unit tests.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

use crate::blockchain::{Block, Chain, meets_difficulty};
use crate::claims::model::{Claim, ClaimData, ClaimRecord, Status};
use crate::config::NodeConfig;
use crate::network::{ChainSync, PeerClient};
use crate::node::Node;
use crate::storage::ChainStore;

/// Nonces per round on nodes built by [`test_node`].
pub const TEST_ROUNDS: u64 = 10_000;

pub fn record(node: &str, status: Status) -> ClaimRecord {
    ClaimRecord {
        node: node.into(),
        status,
        timestamp: Utc::now(),
    }
}

pub fn claim_record(node: &str, target: &str) -> ClaimRecord {
    record(
        node,
        Status::Claim(Claim {
            target: target.into(),
            metadata: Default::default(),
        }),
    )
}

pub fn idle_record(node: &str) -> ClaimRecord {
    record(node, Status::Idle("idle".into()))
}

/// Block data with a single claim.
pub fn claim(node: &str, target: &str) -> ClaimData {
    let mut data = ClaimData::new();
    data.insert(node.into(), vec![claim_record(node, target)]);
    data
}

/// Seal a block on top of `prev` with an unbounded nonce search.
pub fn mine_next(prev: &Block, data: ClaimData, difficulty: u32) -> Block {
    let mut block = Block::candidate(prev, data, None);
    while !meets_difficulty(&block.hash, difficulty) {
        block.nonce += 1;
        block.hash = block.compute_hash();
    }
    block
}

/// A valid chain of `len` blocks, genesis included.
pub fn chain_of(len: usize, difficulty: u32) -> Chain {
    let mut chain = Chain::new(difficulty);
    for i in 1..len {
        let block = mine_next(chain.tip(), claim(&format!("node-{i}"), "dish-1"), difficulty);
        chain.push(block).expect("freshly mined block extends the tip");
    }
    chain
}

/// A node with no peers, persisting into `dir`.
pub fn test_node(dir: &Path, difficulty: u32, mine: bool) -> Arc<Node> {
    let config = NodeConfig {
        mine,
        difficulty,
        mining_rounds: TEST_ROUNDS,
        data_dir: dir.to_path_buf(),
        ..Default::default()
    };
    let store = ChainStore::open(&config.data_dir).expect("open store");
    let chain = store.load(difficulty).expect("load store");
    let peers = PeerClient::new(Vec::new()).expect("http client");
    let sync = ChainSync::new(store, peers, difficulty);
    Arc::new(Node::new(chain, sync, &config))
}
