//! In-memory block-index graph with skip-list ancestor queries.

use std::collections::HashMap;

use mazad_consensus::algo::{Algo, VERSION_AUXPOW};
use mazad_consensus::{ConsensusParams, Hash256};
use mazad_primitives::block::BlockHeader;
use primitive_types::U256;

use crate::work;

pub type NodeId = u32;

/// One node of the block tree. `prev` and `skip` are arena indices rather
/// than references; the graph is append-only, so an id stays valid for the
/// life of the index.
#[derive(Clone, Debug)]
pub struct BlockIndexEntry {
    pub hash: Hash256,
    pub prev: Option<NodeId>,
    /// Cached far-back ancestor; pure acceleration, recomputable from `prev`.
    pub skip: Option<NodeId>,
    pub height: i32,
    pub version: i32,
    pub time: u32,
    /// Maximum timestamp seen on the path from genesis to this node.
    pub time_max: u32,
    pub bits: u32,
    pub nonce: u32,
    pub merkle_root: Hash256,
    pub chain_work: U256,
}

impl BlockIndexEntry {
    pub fn algo(&self) -> Algo {
        Algo::from_version(self.version)
    }

    pub fn block_time(&self) -> i64 {
        i64::from(self.time)
    }

    pub fn is_auxpow(&self) -> bool {
        self.version & VERSION_AUXPOW != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    UnknownParent(Hash256),
    AuxHeaderUnavailable(Hash256),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::UnknownParent(hash) => {
                write!(f, "parent {} not in block index", hash_hex(hash))
            }
            IndexError::AuxHeaderUnavailable(hash) => {
                write!(f, "auxpow header for {} not available", hash_hex(hash))
            }
        }
    }
}

impl std::error::Error for IndexError {}

fn hash_hex(hash: &Hash256) -> String {
    hash.iter().rev().map(|byte| format!("{byte:02x}")).collect()
}

/// Reads the effective single-chain header of a merge-mined block from
/// external storage. The index itself stores no auxpow payload.
pub trait AuxHeaderReader {
    fn read_aux_header(&self, hash: &Hash256) -> Option<BlockHeader>;
}

fn invert_lowest_one(value: i32) -> i32 {
    value & value.saturating_sub(1)
}

/// Height the skip pointer of a node at `height` jumps back to. Any height
/// strictly below the node's own is admissible; this particular choice keeps
/// worst-case walks around 110 steps for 2^18 blocks.
fn get_skip_height(height: i32) -> i32 {
    if height < 2 {
        0
    } else if (height & 1) != 0 {
        invert_lowest_one(invert_lowest_one(height - 1)) + 1
    } else {
        invert_lowest_one(height)
    }
}

#[derive(Default)]
pub struct BlockIndex {
    entries: Vec<BlockIndexEntry>,
    by_hash: HashMap<Hash256, NodeId>,
}

impl BlockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Panics on a dangling id: handing out ids is the index's own job, so a
    /// bad one means the caller mixed up indices.
    pub fn entry(&self, id: NodeId) -> &BlockIndexEntry {
        &self.entries[id as usize]
    }

    pub fn lookup(&self, hash: &Hash256) -> Option<NodeId> {
        self.by_hash.get(hash).copied()
    }

    /// Link an accepted header into the graph. The parent must already be
    /// present (the external store feeds parents before children); a header
    /// with an all-zero previous hash starts a tree at height 0. Re-inserting
    /// a known header returns its existing id.
    pub fn insert(
        &mut self,
        header: &BlockHeader,
        params: &ConsensusParams,
    ) -> Result<NodeId, IndexError> {
        let hash = header.hash();
        if let Some(&id) = self.by_hash.get(&hash) {
            return Ok(id);
        }

        let prev = if header.prev_block == [0u8; 32] {
            None
        } else {
            Some(
                self.lookup(&header.prev_block)
                    .ok_or(IndexError::UnknownParent(header.prev_block))?,
            )
        };

        let height = prev.map_or(0, |parent| self.entry(parent).height + 1);
        let time_max = prev.map_or(header.time, |parent| {
            self.entry(parent).time_max.max(header.time)
        });
        let skip = prev.map(|parent| {
            self.ancestor_of(parent, get_skip_height(height))
                .expect("skip height below parent height")
        });

        let id = self.entries.len() as NodeId;
        self.entries.push(BlockIndexEntry {
            hash,
            prev,
            skip,
            height,
            version: header.version,
            time: header.time,
            time_max,
            bits: header.bits,
            nonce: header.nonce,
            merkle_root: header.merkle_root,
            chain_work: U256::zero(),
        });
        self.by_hash.insert(hash, id);

        let proof = work::block_proof(self, id, params);
        let parent_work = prev.map_or(U256::zero(), |parent| self.entry(parent).chain_work);
        self.entries[id as usize].chain_work = parent_work.saturating_add(proof);

        Ok(id)
    }

    /// Unique ancestor of `id` at `height`, or `None` when `height` is
    /// negative or above the node's own height.
    pub fn get_ancestor(&self, id: NodeId, height: i32) -> Option<NodeId> {
        self.ancestor_of(id, height)
    }

    fn ancestor_of(&self, id: NodeId, height: i32) -> Option<NodeId> {
        if height > self.entry(id).height || height < 0 {
            return None;
        }

        let mut walk = id;
        let mut height_walk = self.entry(id).height;
        while height_walk > height {
            let current = self.entry(walk);
            let height_skip = get_skip_height(height_walk);
            let height_skip_prev = get_skip_height(height_walk - 1);
            match current.skip {
                // Only follow the skip pointer if the parent's skip is not a
                // strictly better jump.
                Some(skip)
                    if height_skip == height
                        || (height_skip > height
                            && !(height_skip_prev < height_skip - 2
                                && height_skip_prev >= height)) =>
                {
                    walk = skip;
                    height_walk = height_skip;
                }
                _ => {
                    walk = current
                        .prev
                        .expect("block index entry above genesis missing its parent");
                    height_walk -= 1;
                }
            }
        }
        Some(walk)
    }

    /// Nearest block at or before `id` mined with `algo`.
    pub fn last_with_algo(&self, id: NodeId, algo: Algo) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.entry(current).algo() == algo {
                return Some(current);
            }
            cursor = self.entry(current).prev;
        }
        None
    }

    /// Reassemble the header for a node. A merge-mined block's displayed
    /// fields live in its foreign-chain header, which only external storage
    /// has; everything else is rebuilt from the entry and its parent link.
    pub fn block_header(
        &self,
        id: NodeId,
        reader: &dyn AuxHeaderReader,
    ) -> Result<BlockHeader, IndexError> {
        let entry = self.entry(id);
        if entry.is_auxpow() {
            return reader
                .read_aux_header(&entry.hash)
                .ok_or(IndexError::AuxHeaderUnavailable(entry.hash));
        }
        let prev_block = entry.prev.map_or([0u8; 32], |parent| self.entry(parent).hash);
        Ok(BlockHeader {
            version: entry.version,
            prev_block,
            merkle_root: entry.merkle_root,
            time: entry.time,
            bits: entry.bits,
            nonce: entry.nonce,
        })
    }
}
