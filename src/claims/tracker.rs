use log::{debug, info};
use std::collections::HashSet;
use std::sync::Mutex;

use super::model::{ClaimRecord, PendingClaims};
use crate::blockchain::{Block, Chain};

/// A structured claim collided with another node's active claim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("target {target} is already claimed by node {holder}")]
pub struct ClaimConflict {
    pub target: String,
    pub holder: String,
}

/// Owner of the pending (not yet committed) claim records.
///
/// `accept_report` and `prune_on_commit` are the only ways to mutate the queue;
/// both run under one mutex guarding the whole map.
#[derive(Debug, Default)]
pub struct ClaimTracker {
    pending: Mutex<PendingClaims>,
}

impl ClaimTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `report` unless it claims a target some other node actively holds,
    /// either in `chain` or in the pending queue. Idle reports are always queued.
    ///
    /// The caller must keep `chain` stable for the duration of the call.
    pub fn accept_report(&self, report: ClaimRecord, chain: &Chain) -> Result<(), ClaimConflict> {
        let mut pending = self.pending.lock().expect("mutex poisoned");

        if let Some(target) = report.status.claimed_target() {
            if let Some(holder) = active_holder(target, &report.node, chain, &pending) {
                debug!(
                    "claim by {} on {} conflicts with {}",
                    report.node, target, holder
                );
                return Err(ClaimConflict {
                    target: target.to_string(),
                    holder,
                });
            }
        }

        let queue = pending.entry(report.node.clone()).or_default();
        queue.push(report);
        debug!("pending claims: {} node(s) queued", pending.len());
        Ok(())
    }

    /// Drop from each node's queue as many leading records as `block` embedded
    /// for that node. Nodes whose queue empties are removed.
    pub fn prune_on_commit(&self, block: &Block) {
        let mut pending = self.pending.lock().expect("mutex poisoned");
        let mut pruned = 0usize;

        for (node, embedded) in &block.data {
            let Some(queue) = pending.get_mut(node) else {
                continue;
            };
            let n = embedded.len().min(queue.len());
            queue.drain(..n);
            pruned += n;
            if queue.is_empty() {
                pending.remove(node);
            }
        }

        if pruned > 0 {
            info!(
                "block #{} committed, pruned {} pending record(s)",
                block.index, pruned
            );
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().expect("mutex poisoned").is_empty()
    }

    /// Frozen copy of the pending queue, used as candidate block data.
    pub fn snapshot(&self) -> PendingClaims {
        self.pending.lock().expect("mutex poisoned").clone()
    }
}

/// The node other than `reporter` whose latest status actively claims `target`.
///
/// A node's latest status is its newest pending record when it has one, and
/// otherwise its record in the most recent block that mentions it.
fn active_holder(
    target: &str,
    reporter: &str,
    chain: &Chain,
    pending: &PendingClaims,
) -> Option<String> {
    for (node, queue) in pending {
        if node == reporter {
            continue;
        }
        if let Some(last) = queue.last() {
            if last.status.claimed_target() == Some(target) {
                return Some(node.clone());
            }
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for block in chain.blocks().iter().rev() {
        for (node, records) in &block.data {
            if node == reporter || pending.contains_key(node) || !seen.insert(node.as_str()) {
                continue;
            }
            let latest = records.last().and_then(|r| r.status.claimed_target());
            if latest == Some(target) {
                return Some(node.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimData;
    use crate::test_support::{claim_record, idle_record, mine_next};

    const DIFF: u32 = 1;

    fn commit(chain: &mut Chain, tracker: &ClaimTracker) -> Block {
        let block = mine_next(chain.tip(), tracker.snapshot(), DIFF);
        chain.push(block.clone()).unwrap();
        tracker.prune_on_commit(&block);
        block
    }

    #[test]
    fn idle_reports_are_always_queued() {
        let chain = Chain::new(DIFF);
        let tracker = ClaimTracker::new();
        tracker.accept_report(idle_record("a"), &chain).unwrap();
        tracker.accept_report(idle_record("a"), &chain).unwrap();
        assert_eq!(tracker.snapshot()["a"].len(), 2);
    }

    #[test]
    fn pending_claim_blocks_other_node() {
        let chain = Chain::new(DIFF);
        let tracker = ClaimTracker::new();
        tracker
            .accept_report(claim_record("a", "dish-1"), &chain)
            .unwrap();

        let err = tracker
            .accept_report(claim_record("b", "dish-1"), &chain)
            .unwrap_err();
        assert_eq!(
            err,
            ClaimConflict {
                target: "dish-1".into(),
                holder: "a".into()
            }
        );
        // rejected report is not queued
        assert!(!tracker.snapshot().contains_key("b"));

        // other targets stay free
        tracker
            .accept_report(claim_record("b", "dish-2"), &chain)
            .unwrap();
    }

    #[test]
    fn node_may_repeat_its_own_claim() {
        let chain = Chain::new(DIFF);
        let tracker = ClaimTracker::new();
        tracker
            .accept_report(claim_record("a", "dish-1"), &chain)
            .unwrap();
        tracker
            .accept_report(claim_record("a", "dish-1"), &chain)
            .unwrap();
    }

    #[test]
    fn committed_claim_blocks_until_superseded_by_idle() {
        let mut chain = Chain::new(DIFF);
        let tracker = ClaimTracker::new();

        tracker
            .accept_report(claim_record("a", "dish-1"), &chain)
            .unwrap();
        commit(&mut chain, &tracker);
        assert!(tracker.snapshot().is_empty());

        // a's claim now lives only in the chain
        assert!(
            tracker
                .accept_report(claim_record("b", "dish-1"), &chain)
                .is_err()
        );

        // a goes idle and that gets committed
        tracker.accept_report(idle_record("a"), &chain).unwrap();
        commit(&mut chain, &tracker);

        tracker
            .accept_report(claim_record("b", "dish-1"), &chain)
            .unwrap();
    }

    #[test]
    fn pending_idle_releases_committed_claim() {
        let mut chain = Chain::new(DIFF);
        let tracker = ClaimTracker::new();
        tracker
            .accept_report(claim_record("a", "dish-1"), &chain)
            .unwrap();
        commit(&mut chain, &tracker);

        tracker.accept_report(idle_record("a"), &chain).unwrap();
        tracker
            .accept_report(claim_record("b", "dish-1"), &chain)
            .unwrap();
    }

    #[test]
    fn prune_trims_exactly_the_embedded_prefix() {
        let chain = Chain::new(DIFF);
        let tracker = ClaimTracker::new();
        tracker.accept_report(idle_record("x"), &chain).unwrap();
        tracker.accept_report(idle_record("x"), &chain).unwrap();
        tracker
            .accept_report(claim_record("y", "dish-1"), &chain)
            .unwrap();

        let snapshot = tracker.snapshot();

        // more reports arrive while the block is mined
        tracker.accept_report(idle_record("x"), &chain).unwrap();
        tracker
            .accept_report(claim_record("y", "dish-1"), &chain)
            .unwrap();

        let block = mine_next(chain.tip(), snapshot, DIFF);
        tracker.prune_on_commit(&block);

        let left = tracker.snapshot();
        assert_eq!(left["x"].len(), 1);
        assert_eq!(left["y"].len(), 1);

        // a block embedding everything left removes both keys
        let block = mine_next(&block, left, DIFF);
        tracker.prune_on_commit(&block);
        assert!(tracker.snapshot().is_empty());
    }

    #[test]
    fn prune_ignores_unknown_nodes() {
        let tracker = ClaimTracker::new();
        let mut data = ClaimData::new();
        data.insert("ghost".into(), vec![idle_record("ghost")]);
        let block = mine_next(&Block::genesis(), data, DIFF);
        tracker.prune_on_commit(&block);
        assert!(tracker.snapshot().is_empty());
    }
}
