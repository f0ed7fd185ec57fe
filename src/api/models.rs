use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::node::Node;

/// Shared application state handed to every handler.
pub struct AppState {
    pub node: Arc<Node>,
}

impl AppState {
    pub fn new(node: Arc<Node>) -> Self {
        Self { node }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub height: usize,
    pub tip: String,
}

/* ---------- Chain API Models ---------- */

#[derive(Deserialize)]
pub struct ChainQuery {
    /// First block index to return.
    #[serde(default)]
    pub i: usize,
}

/* ---------- Peer API Models ---------- */

#[derive(Serialize, Deserialize)]
pub struct ReceivedResponse {
    pub received: bool,
}

#[derive(Serialize, Deserialize)]
pub struct ConflictResponse {
    pub failure_reason: String,
}
