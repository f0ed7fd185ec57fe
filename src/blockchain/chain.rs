use log::debug;

use super::Block;
use crate::error::ChainError;

/// Ordered, append-only sequence of blocks rooted at the shared genesis block.
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    difficulty: u32,
}

impl Chain {
    /// A chain holding only the genesis block.
    pub fn new(difficulty: u32) -> Self {
        Self {
            blocks: vec![Block::genesis()],
            difficulty,
        }
    }

    /// Adopt a block sequence received from disk or from a peer, rejecting it
    /// unless every block passes the link and difficulty checks.
    pub fn from_blocks(blocks: Vec<Block>, difficulty: u32) -> Result<Self, ChainError> {
        validate(&blocks, difficulty)?;
        Ok(Self { blocks, difficulty })
    }

    /// Return the last block in the chain.
    pub fn tip(&self) -> &Block {
        self.blocks
            .last()
            .expect("chain always holds at least the genesis block")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks from `index` on; empty when `index` is past the tip.
    pub fn blocks_from(&self, index: usize) -> &[Block] {
        self.blocks.get(index..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Append `block` if it extends the current tip.
    pub fn push(&mut self, block: Block) -> Result<(), ChainError> {
        let tip = self.tip();
        if block.prev_hash != tip.hash || block.index != tip.index + 1 {
            return Err(ChainError::BrokenLink { index: block.index });
        }
        if block.data.is_empty() {
            return Err(ChainError::EmptyBlock { index: block.index });
        }
        if !block.is_valid(Some(tip), self.difficulty) {
            return Err(ChainError::InvalidBlock { index: block.index });
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Canonical ordering: longer wins.
    pub fn is_longer_than(&self, other: &Chain) -> bool {
        self.len() > other.len()
    }
}

/// Check a block sequence: block 0 must be the genesis block, every later block
/// must link to its predecessor, carry claim data and satisfy the difficulty
/// condition.
pub fn validate(blocks: &[Block], difficulty: u32) -> Result<(), ChainError> {
    let genesis = blocks.first().ok_or(ChainError::Empty)?;
    if *genesis != Block::genesis() {
        return Err(ChainError::BadGenesis);
    }

    for pair in blocks.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);
        if current.prev_hash != prev.hash || current.index != prev.index + 1 {
            return Err(ChainError::BrokenLink {
                index: current.index,
            });
        }
        if current.data.is_empty() {
            return Err(ChainError::EmptyBlock {
                index: current.index,
            });
        }
        if !current.is_valid(Some(prev), difficulty) {
            return Err(ChainError::InvalidBlock {
                index: current.index,
            });
        }
    }
    Ok(())
}

/// Pick the canonical chain among `local` and the peer-supplied candidates.
/// Invalid candidates are dropped. A candidate only displaces the current best
/// when strictly longer, so ties keep the local chain (or the earliest peer).
pub fn select_canonical<I>(local: Chain, candidates: I) -> Chain
where
    I: IntoIterator<Item = (String, Vec<Block>)>,
{
    let difficulty = local.difficulty();
    let mut best = local;

    for (source, blocks) in candidates {
        match Chain::from_blocks(blocks, difficulty) {
            Ok(candidate) if candidate.is_longer_than(&best) => {
                debug!(
                    "candidate chain from {} is longer ({} > {})",
                    source,
                    candidate.len(),
                    best.len()
                );
                best = candidate;
            }
            Ok(candidate) => {
                debug!(
                    "candidate chain from {} not longer ({} <= {})",
                    source,
                    candidate.len(),
                    best.len()
                );
            }
            Err(e) => debug!("discarding candidate chain from {}: {}", source, e),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimData;
    use crate::test_support::{chain_of, claim, mine_next};

    const DIFF: u32 = 1;

    #[test]
    fn new_chain_holds_genesis() {
        let chain = Chain::new(DIFF);
        assert_eq!(chain.len(), 1);
        assert_eq!(*chain.tip(), Block::genesis());
    }

    #[test]
    fn push_accepts_only_tip_extensions() {
        let mut chain = Chain::new(DIFF);
        let genesis = chain.tip().clone();
        let b1 = mine_next(&genesis, claim("a", "dish-1"), DIFF);
        chain.push(b1.clone()).unwrap();

        // a second block on top of genesis no longer links to the tip
        let stale = mine_next(&genesis, claim("b", "dish-2"), DIFF);
        assert!(matches!(
            chain.push(stale),
            Err(ChainError::BrokenLink { index: 1 })
        ));

        let mut forged = mine_next(&b1, claim("b", "dish-2"), DIFF);
        forged.nonce += 1;
        assert!(matches!(
            chain.push(forged),
            Err(ChainError::InvalidBlock { index: 2 })
        ));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn from_blocks_rejects_foreign_genesis() {
        let mut blocks = chain_of(3, DIFF).blocks().to_vec();
        blocks[0].nonce = 7;
        blocks[0].hash = blocks[0].compute_hash();
        assert!(matches!(
            Chain::from_blocks(blocks, DIFF),
            Err(ChainError::BadGenesis)
        ));
        assert!(matches!(
            Chain::from_blocks(Vec::new(), DIFF),
            Err(ChainError::Empty)
        ));
    }

    #[test]
    fn stored_hashes_are_reproducible() {
        let chain = chain_of(4, DIFF);
        for block in chain.blocks() {
            assert_eq!(block.compute_hash(), block.hash);
        }
    }

    #[test]
    fn longer_valid_peer_chain_wins() {
        let local = chain_of(3, DIFF);
        let peer = chain_of(5, DIFF);
        let best = select_canonical(local, vec![("peer".to_string(), peer.blocks().to_vec())]);
        assert_eq!(best.len(), 5);
        assert_eq!(best.tip().hash, peer.tip().hash);
    }

    #[test]
    fn longer_peer_chain_with_broken_link_is_ignored() {
        let local = chain_of(3, DIFF);
        let local_tip = local.tip().hash.clone();
        let mut peer = chain_of(5, DIFF).blocks().to_vec();
        peer[3].prev_hash = "bogus".into();

        let best = select_canonical(local, vec![("peer".to_string(), peer)]);
        assert_eq!(best.len(), 3);
        assert_eq!(best.tip().hash, local_tip);
    }

    #[test]
    fn push_rejects_sealed_empty_block() {
        let mut chain = Chain::new(DIFF);
        let empty = mine_next(chain.tip(), ClaimData::new(), DIFF);
        assert!(empty.is_valid(Some(chain.tip()), DIFF));
        assert!(matches!(
            chain.push(empty),
            Err(ChainError::EmptyBlock { index: 1 })
        ));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn longer_peer_chain_padded_with_empty_blocks_is_ignored() {
        let local = chain_of(2, DIFF);
        let local_tip = local.tip().hash.clone();

        let mut peer = chain_of(3, DIFF).blocks().to_vec();
        for _ in 0..3 {
            let tip = peer.last().unwrap().clone();
            peer.push(mine_next(&tip, ClaimData::new(), DIFF));
        }
        assert!(matches!(
            Chain::from_blocks(peer.clone(), DIFF),
            Err(ChainError::EmptyBlock { index: 3 })
        ));

        let best = select_canonical(local, vec![("peer".to_string(), peer)]);
        assert_eq!(best.len(), 2);
        assert_eq!(best.tip().hash, local_tip);
    }

    #[test]
    fn equal_length_keeps_local() {
        let local = chain_of(3, DIFF);
        let local_tip = local.tip().hash.clone();
        let peer = chain_of(3, DIFF);
        let best = select_canonical(local, vec![("peer".to_string(), peer.blocks().to_vec())]);
        assert_eq!(best.tip().hash, local_tip);
    }

    #[test]
    fn blocks_from_offset() {
        let chain = chain_of(3, DIFF);
        assert_eq!(chain.blocks_from(1).len(), 2);
        assert!(chain.blocks_from(10).is_empty());
    }
}
