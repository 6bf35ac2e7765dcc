use mazad_consensus::Hash256;
use sha2::digest::consts::U32;
use sha2::{Digest, Sha256};
use skein::Skein512;

pub fn sha256(data: &[u8]) -> Hash256 {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}

pub fn blake2b_256(data: &[u8]) -> Hash256 {
    let digest = blake2b_simd::Params::new().hash_length(32).hash(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_bytes());
    out
}

pub fn skein_256(data: &[u8]) -> Hash256 {
    let digest = Skein512::<U32>::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Argon2d over the raw header bytes, salted with the same bytes. The cost
/// parameters are part of the proof-of-work definition and must not change.
pub fn argon2d(data: &[u8]) -> Hash256 {
    let params = argon2::Params::new(512, 1, 1, Some(32)).expect("static argon2 cost parameters");
    let argon = argon2::Argon2::new(argon2::Algorithm::Argon2d, argon2::Version::V0x13, params);
    let mut out = [0u8; 32];
    argon
        .hash_password_into(data, data, &mut out)
        .expect("argon2d over fixed-size header input");
    out
}
