//! Block-index graph, canonical-chain tracking, and the difficulty and
//! chain-work engines.
//!
//! The index and the active chain are shared mutable state under an external
//! single-writer / multi-reader discipline: callers hold a process-wide lock
//! for the duration of any traversal, exclusively for `insert` and `set_tip`.
//! The graph itself is append-only, so a read that completes without
//! observing a concurrent tip change is always consistent.

pub mod active;
pub mod difficulty;
pub mod index;
pub mod work;

pub use active::ActiveChain;
pub use difficulty::next_work_required;
pub use index::{AuxHeaderReader, BlockIndex, BlockIndexEntry, IndexError, NodeId};
pub use work::{block_proof, block_proof_equivalent_time};
