use mazad_consensus::algo::Algo;
use mazad_consensus::{ConsensusParams, Hash256};
use primitive_types::U256;

use crate::difficulty::{compact_to_u256, pow_limit_value, CompactError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowError {
    Compact(CompactError),
    ZeroTarget,
    TargetAboveLimit,
    HashAboveTarget,
}

impl std::fmt::Display for PowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowError::Compact(err) => write!(f, "{err}"),
            PowError::ZeroTarget => write!(f, "pow target is zero"),
            PowError::TargetAboveLimit => write!(f, "pow target above algorithm limit"),
            PowError::HashAboveTarget => write!(f, "pow hash does not meet target"),
        }
    }
}

impl std::error::Error for PowError {}

impl From<CompactError> for PowError {
    fn from(err: CompactError) -> Self {
        PowError::Compact(err)
    }
}

/// The sole acceptance gate for mined blocks: the proof-of-work hash for the
/// header's algorithm, interpreted as a little-endian 256-bit integer, must
/// not exceed the decoded target, and the target itself must sit within the
/// algorithm's ceiling.
pub fn validate_pow(
    pow_hash: &Hash256,
    algo: Algo,
    bits: u32,
    params: &ConsensusParams,
) -> Result<(), PowError> {
    let target = compact_to_u256(bits)?;
    if target.is_zero() {
        return Err(PowError::ZeroTarget);
    }
    if target > pow_limit_value(params, algo) {
        return Err(PowError::TargetAboveLimit);
    }
    if U256::from_little_endian(pow_hash) > target {
        return Err(PowError::HashAboveTarget);
    }
    Ok(())
}

pub fn check_proof_of_work(
    pow_hash: &Hash256,
    algo: Algo,
    bits: u32,
    params: &ConsensusParams,
) -> bool {
    validate_pow(pow_hash, algo, bits, params).is_ok()
}
