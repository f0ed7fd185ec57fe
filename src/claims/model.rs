use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A structured claim on a shared resource. Anything besides `target` is kept
/// verbatim as metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub target: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// What a node reported. A bare JSON string is an idle/informational status,
/// an object naming a `target` is a claim on that target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Status {
    Claim(Claim),
    Idle(String),
}

impl Status {
    /// The target this status actively claims, if any.
    pub fn claimed_target(&self) -> Option<&str> {
        match self {
            Status::Claim(claim) => Some(claim.target.as_str()),
            Status::Idle(_) => None,
        }
    }
}

/// One status report from a node, as received on `/status` and as embedded in
/// block data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub node: String,
    pub status: Status,
    pub timestamp: DateTime<Utc>,
}

/// Records per node, oldest first. Used both for block payloads and for the
/// pending (not yet committed) queue. Ordered so the JSON form is stable.
pub type ClaimData = BTreeMap<String, Vec<ClaimRecord>>;

pub type PendingClaims = ClaimData;
