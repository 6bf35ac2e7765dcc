//! Block header type and the multi-algo version-field codec.

use mazad_consensus::algo::{Algo, VERSION_AUXPOW};
use mazad_consensus::Hash256;

use crate::encoding::{DecodeError, Decoder, Encoder};
use crate::hash::{argon2d, blake2b_256, sha256d, skein_256};

pub const CURRENT_VERSION: i32 = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block: Hash256,
    pub merkle_root: Hash256,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn consensus_encode(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.write_i32_le(self.version);
        encoder.write_hash_le(&self.prev_block);
        encoder.write_hash_le(&self.merkle_root);
        encoder.write_u32_le(self.time);
        encoder.write_u32_le(self.bits);
        encoder.write_u32_le(self.nonce);
        encoder.into_inner()
    }

    pub fn consensus_decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut decoder = Decoder::new(bytes);
        let header = Self::consensus_decode_from(&mut decoder)?;
        if !decoder.is_empty() {
            return Err(DecodeError::TrailingBytes);
        }
        Ok(header)
    }

    pub fn consensus_decode_from(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            version: decoder.read_i32_le()?,
            prev_block: decoder.read_hash_le()?,
            merkle_root: decoder.read_hash_le()?,
            time: decoder.read_u32_le()?,
            bits: decoder.read_u32_le()?,
            nonce: decoder.read_u32_le()?,
        })
    }

    /// Identity hash: always the base double-SHA256, independent of the
    /// mining algorithm. This is what the chain graph is keyed on.
    pub fn hash(&self) -> Hash256 {
        sha256d(&self.consensus_encode())
    }

    /// Proof-of-work hash for the given algorithm slot. This, not the
    /// identity hash, must satisfy the difficulty target.
    pub fn pow_hash(&self, algo: Algo) -> Hash256 {
        let bytes = self.consensus_encode();
        match algo {
            Algo::Sha256 => sha256d(&bytes),
            Algo::Slot1 => blake2b_256(&bytes),
            Algo::Slot2 => skein_256(&bytes),
            Algo::Slot3 => argon2d(&bytes),
        }
    }

    pub fn algo(&self) -> Algo {
        Algo::from_version(self.version)
    }

    pub fn is_auxpow(&self) -> bool {
        self.version & VERSION_AUXPOW != 0
    }

    /// OR the algorithm slot into the version field. Callers must encode the
    /// slot before applying the merge-mining bit pattern.
    pub fn set_algo(&mut self, algo: Algo) {
        debug_assert!(!self.is_auxpow());
        self.version |= algo.version_bits();
    }

    pub fn block_time(&self) -> i64 {
        i64::from(self.time)
    }
}

/// Describes a place in the chain to another node: a sparse list of hashes,
/// dense near the tip and exponentially sparser toward genesis.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockLocator {
    pub have: Vec<Hash256>,
}

impl BlockLocator {
    pub fn new(have: Vec<Hash256>) -> Self {
        Self { have }
    }

    pub fn is_empty(&self) -> bool {
        self.have.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazad_consensus::ALL_ALGOS;

    fn header() -> BlockHeader {
        BlockHeader {
            version: CURRENT_VERSION,
            prev_block: [0u8; 32],
            merkle_root: [0x11; 32],
            time: 1_390_747_675,
            bits: 0x1e0ffff0,
            nonce: 2_091_390_249,
        }
    }

    #[test]
    fn encode_is_80_bytes() {
        assert_eq!(header().consensus_encode().len(), 80);
        let decoded = BlockHeader::consensus_decode(&header().consensus_encode()).expect("decode");
        assert_eq!(decoded, header());
    }

    #[test]
    fn set_algo_round_trips_through_version() {
        for algo in ALL_ALGOS {
            let mut h = header();
            h.set_algo(algo);
            assert_eq!(h.algo(), algo);
        }
    }

    #[test]
    fn identity_hash_ignores_algo() {
        let mut a = header();
        a.set_algo(Algo::Slot2);
        let mut b = header();
        b.set_algo(Algo::Slot2);
        assert_eq!(a.hash(), b.hash());
        // The identity hash stays the base hash even for alt-algo headers.
        assert_eq!(a.hash(), a.pow_hash(Algo::Sha256));
        assert_ne!(a.hash(), a.pow_hash(Algo::Slot2));
    }
}
