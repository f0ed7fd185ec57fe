use log::{debug, warn};
use std::time::Duration;

use crate::blockchain::Block;
use crate::error::PeerError;

/// Timeout for a single peer request.
const PEER_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the configured peer set. Every call is best-effort.
#[derive(Debug, Clone)]
pub struct PeerClient {
    client: reqwest::Client,
    peers: Vec<String>,
}

impl PeerClient {
    pub fn new(peers: Vec<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(PEER_TIMEOUT).build()?;
        Ok(Self { client, peers })
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// Fetch a peer's full chain from `GET /blockchain.json`.
    pub async fn fetch_chain(&self, peer: &str) -> Result<Vec<Block>, PeerError> {
        let url = endpoint(peer, "blockchain.json");
        let http = |source| PeerError::Http {
            peer: peer.to_string(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(http)?;
        if !response.status().is_success() {
            return Err(PeerError::Status {
                peer: peer.to_string(),
                status: response.status().as_u16(),
            });
        }
        response.json::<Vec<Block>>().await.map_err(http)
    }

    /// Chains of every reachable peer, in configured order.
    pub async fn fetch_all(&self) -> Vec<(String, Vec<Block>)> {
        let mut chains = Vec::with_capacity(self.peers.len());
        for peer in &self.peers {
            match self.fetch_chain(peer).await {
                Ok(blocks) => {
                    debug!("peer {} sent {} block(s)", peer, blocks.len());
                    chains.push((peer.clone(), blocks));
                }
                Err(e) => warn!("skipping peer: {}", e),
            }
        }
        chains
    }

    /// Announce a freshly mined block to every peer via `POST /mined`.
    /// Returns how many peers accepted the announcement.
    pub async fn announce(&self, block: &Block) -> usize {
        let mut delivered = 0;
        for peer in &self.peers {
            let url = endpoint(peer, "mined");
            match self.client.post(&url).json(block).send().await {
                Ok(resp) if resp.status().is_success() => delivered += 1,
                Ok(resp) => warn!("peer {} refused block #{}: {}", peer, block.index, resp.status()),
                Err(e) => warn!("peer {} not reachable: {}", peer, e),
            }
        }
        debug!(
            "block #{} announced to {}/{} peer(s)",
            block.index,
            delivered,
            self.peers.len()
        );
        delivered
    }
}

fn endpoint(peer: &str, path: &str) -> String {
    format!("{}/{}", peer.trim_end_matches('/'), path)
}
