//! Compact target codec and per-block work values.

use mazad_consensus::algo::Algo;
use mazad_consensus::{ConsensusParams, Hash256};
use primitive_types::U256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactError {
    Negative,
    Overflow,
}

impl std::fmt::Display for CompactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompactError::Negative => write!(f, "compact target has negative sign bit"),
            CompactError::Overflow => write!(f, "compact target overflows 256-bit range"),
        }
    }
}

impl std::error::Error for CompactError {}

/// Decode a compact ("nBits") target: exponent byte plus three mantissa
/// bytes, with the mantissa's high bit reserved as a sign flag.
pub fn compact_to_u256(bits: u32) -> Result<U256, CompactError> {
    let size = bits >> 24;
    let mut word = bits & 0x007f_ffff;

    if (bits & 0x0080_0000) != 0 && word != 0 {
        return Err(CompactError::Negative);
    }

    let value = if size <= 3 {
        let shift = 8 * (3 - size);
        word >>= shift;
        U256::from(word)
    } else {
        let shift = 8 * (size - 3);
        U256::from(word) << shift
    };

    if word != 0 {
        let overflow = size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32);
        if overflow {
            return Err(CompactError::Overflow);
        }
    }

    Ok(value)
}

/// Flag-free decode used inside retarget arithmetic, where stored bits have
/// already passed the proof-of-work gate. Mirrors the reference big-num
/// behavior of ignoring the sign and overflow indicators.
pub fn compact_to_u256_lenient(bits: u32) -> U256 {
    let size = bits >> 24;
    let word = bits & 0x007f_ffff;
    if size <= 3 {
        U256::from(word >> (8 * (3 - size)))
    } else {
        U256::from(word) << (8 * (size - 3))
    }
}

pub fn u256_to_compact(value: U256) -> u32 {
    if value.is_zero() {
        return 0;
    }

    let mut size = value.bits().div_ceil(8) as u32;
    let mut compact: u32;

    if size <= 3 {
        compact = value.low_u32() << (8 * (3 - size));
    } else {
        let shift = 8 * (size - 3);
        compact = (value >> shift).low_u32();
    }

    if (compact & 0x0080_0000) != 0 {
        compact >>= 8;
        size += 1;
    }

    (size << 24) | (compact & 0x007f_ffff)
}

pub fn target_to_compact(target: &Hash256) -> u32 {
    u256_to_compact(U256::from_little_endian(target))
}

pub fn pow_limit_value(params: &ConsensusParams, algo: Algo) -> U256 {
    U256::from_little_endian(&params.pow_limit[algo.as_usize()])
}

pub fn pow_limit_bits(params: &ConsensusParams, algo: Algo) -> u32 {
    u256_to_compact(pow_limit_value(params, algo))
}

/// Expected number of hashes represented by one block at the given target:
/// `2^256 / (target + 1)`, computed as `~target / (target + 1) + 1` to stay
/// inside 256 bits. Zero for a malformed or zero target.
pub fn block_proof_base(bits: u32) -> U256 {
    let target = match compact_to_u256(bits) {
        Ok(target) => target,
        Err(_) => return U256::zero(),
    };
    if target.is_zero() {
        return U256::zero();
    }
    let one = U256::from(1u64);
    (!target / (target + one)) + one
}
