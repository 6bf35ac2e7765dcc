//! Consensus constants and per-network parameters.

pub mod algo;
pub mod params;

pub use algo::{Algo, ALL_ALGOS, NUM_ALGOS};
pub use params::{consensus_params, Checkpoint, ConsensusParams, Network};

pub type Hash256 = [u8; 32];
