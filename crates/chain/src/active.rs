//! The locally-preferred chain as a height-indexed view over the block index.

use mazad_primitives::block::BlockLocator;

use crate::index::{BlockIndex, NodeId};

/// Sentinel for freshly grown slots during a tip change; never visible once
/// `set_tip` returns.
const NO_NODE: NodeId = NodeId::MAX;

/// Height-indexed view of the best chain: the entry at index `h` has height
/// `h` and is an ancestor of (or equal to) the tip. Only `set_tip` mutates
/// the view; callers serialize it against concurrent readers.
#[derive(Default)]
pub struct ActiveChain {
    chain: Vec<NodeId>,
}

impl ActiveChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height of the tip, -1 for an empty chain.
    pub fn height(&self) -> i32 {
        self.chain.len() as i32 - 1
    }

    pub fn tip(&self) -> Option<NodeId> {
        self.chain.last().copied()
    }

    pub fn genesis(&self) -> Option<NodeId> {
        self.chain.first().copied()
    }

    pub fn at(&self, height: i32) -> Option<NodeId> {
        if height < 0 || height as usize >= self.chain.len() {
            None
        } else {
            Some(self.chain[height as usize])
        }
    }

    pub fn contains(&self, index: &BlockIndex, id: NodeId) -> bool {
        self.at(index.entry(id).height) == Some(id)
    }

    /// Successor of `id` on the active chain, if `id` is on it.
    pub fn next_after(&self, index: &BlockIndex, id: NodeId) -> Option<NodeId> {
        if self.contains(index, id) {
            self.at(index.entry(id).height + 1)
        } else {
            None
        }
    }

    /// Replace the chain with the ancestry of `tip`. The backward walk stops
    /// at the first entry that already matches, so the cost is bounded by the
    /// divergence from the previous tip, not the chain height.
    pub fn set_tip(&mut self, index: &BlockIndex, tip: Option<NodeId>) {
        let Some(tip) = tip else {
            self.chain.clear();
            return;
        };

        let tip_height = index.entry(tip).height;
        let old_height = self.height();
        self.chain.resize(tip_height as usize + 1, NO_NODE);

        let mut replaced = 0i64;
        let mut cursor = Some(tip);
        while let Some(id) = cursor {
            let height = index.entry(id).height as usize;
            if self.chain[height] == id {
                break;
            }
            self.chain[height] = id;
            replaced += 1;
            cursor = index.entry(id).prev;
        }

        mazad_log::log_debug!(
            "active chain tip set to height {tip_height} (was {old_height}, rewrote {replaced} entries)"
        );
    }

    /// Highest common ancestor between the active chain and the ancestry of
    /// `id`; `None` for `None` input or an empty chain.
    pub fn find_fork(&self, index: &BlockIndex, id: Option<NodeId>) -> Option<NodeId> {
        let mut cursor = id?;
        if index.entry(cursor).height > self.height() {
            cursor = index.get_ancestor(cursor, self.height())?;
        }
        let mut walk = Some(cursor);
        while let Some(current) = walk {
            if self.contains(index, current) {
                return Some(current);
            }
            walk = index.entry(current).prev;
        }
        None
    }

    /// Compact chain summary starting at `from` (the tip when `None`): dense
    /// for the first 10 entries, then exponentially sparser, always ending at
    /// genesis.
    pub fn locator(&self, index: &BlockIndex, from: Option<NodeId>) -> BlockLocator {
        let mut step = 1i32;
        let mut have = Vec::with_capacity(32);

        let mut cursor = from.or_else(|| self.tip());
        while let Some(id) = cursor {
            let entry = index.entry(id);
            have.push(entry.hash);
            if entry.height == 0 {
                break;
            }
            let height = (entry.height - step).max(0);
            cursor = if self.contains(index, id) {
                // O(1) lookup while we are still on the active chain.
                self.at(height)
            } else {
                index.get_ancestor(id, height)
            };
            if have.len() > 10 {
                step *= 2;
            }
        }

        BlockLocator::new(have)
    }

    /// First active-chain entry whose max-seen timestamp is at or past
    /// `time`. `time_max` is nondecreasing along the chain, which makes the
    /// binary search valid.
    pub fn find_earliest_at_least(&self, index: &BlockIndex, time: i64) -> Option<NodeId> {
        let position = self
            .chain
            .partition_point(|&id| i64::from(index.entry(id).time_max) < time);
        self.chain.get(position).copied()
    }
}
