use mazad_pow::difficulty::{compact_to_u256, target_to_compact, u256_to_compact};
use primitive_types::U256;

#[test]
fn compact_round_trip() {
    let bits = 0x1d00ffff;
    let target = compact_to_u256(bits).expect("target");
    assert_eq!(u256_to_compact(target), bits);
}

#[test]
fn compact_target_layout() {
    let target = compact_to_u256(0x207fffff).expect("target").to_little_endian();
    assert!(target[..29].iter().all(|b| *b == 0));
    assert_eq!(target[29], 0xff);
    assert_eq!(target[30], 0xff);
    assert_eq!(target[31], 0x7f);
}

#[test]
fn target_to_compact_reads_little_endian() {
    // Exactly representable in three mantissa bytes, so the encoding is
    // lossless.
    let mut limit = [0u8; 32];
    limit[31] = 0x7f;
    limit[30] = 0xff;
    let bits = target_to_compact(&limit);
    assert_eq!(
        compact_to_u256(bits).expect("target"),
        U256::from_little_endian(&limit)
    );
}
