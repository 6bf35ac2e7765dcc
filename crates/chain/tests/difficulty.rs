use mazad_chain::{next_work_required, BlockIndex, NodeId};
use mazad_consensus::{consensus_params, Algo, ConsensusParams, Network, ALL_ALGOS};
use mazad_pow::difficulty::{compact_to_u256_lenient, pow_limit_bits, u256_to_compact};
use mazad_primitives::block::{BlockHeader, CURRENT_VERSION};
use primitive_types::U256;

fn make_header(prev_block: [u8; 32], time: u32, bits: u32, nonce: u32) -> BlockHeader {
    BlockHeader {
        version: CURRENT_VERSION,
        prev_block,
        merkle_root: [0u8; 32],
        time,
        bits,
        nonce,
    }
}

fn make_algo_header(
    prev_block: [u8; 32],
    time: u32,
    bits: u32,
    nonce: u32,
    algo: Algo,
) -> BlockHeader {
    let mut header = make_header(prev_block, time, bits, nonce);
    header.set_algo(algo);
    header
}

fn insert_chain(
    index: &mut BlockIndex,
    params: &ConsensusParams,
    headers: &[BlockHeader],
) -> Vec<NodeId> {
    headers
        .iter()
        .map(|header| index.insert(header, params).expect("insert header"))
        .collect()
}

/// Legacy-era params: the multi-algo retarget never engages.
fn legacy_params() -> ConsensusParams {
    let mut params = consensus_params(Network::Regtest);
    params.multi_algo_activation_height = i32::MAX;
    params.work_decay_v2_height = i32::MAX;
    params.geometric_work_height = i32::MAX;
    params
}

/// Multi-algo-era params: every height uses the per-algorithm retarget.
fn multi_algo_params() -> ConsensusParams {
    let mut params = legacy_params();
    params.multi_algo_activation_height = 0;
    params
}

const TEST_BITS: u32 = 0x1e0ffff0;

#[test]
fn empty_index_yields_ceiling_for_every_algo() {
    let params = legacy_params();
    let index = BlockIndex::new();
    for algo in ALL_ALGOS {
        let header = make_algo_header([0u8; 32], 1_700_000_000, 0, 0, algo);
        assert_eq!(
            next_work_required(&index, None, &header, &params),
            pow_limit_bits(&params, algo)
        );
    }
}

#[test]
fn genesis_only_chain_yields_starting_difficulty() {
    let params = legacy_params();
    let mut index = BlockIndex::new();
    let genesis = make_header([0u8; 32], 1_700_000_000, TEST_BITS, 0);
    let tip = index.insert(&genesis, &params).expect("genesis");

    let starting = u256_to_compact(U256::from_little_endian(&params.starting_difficulty));
    for algo in ALL_ALGOS {
        let header = make_algo_header(genesis.hash(), 1_700_000_120, 0, 1, algo);
        assert_eq!(
            next_work_required(&index, Some(tip), &header, &params),
            starting
        );
    }
}

#[test]
fn dgw_returns_ceiling_until_24_blocks_exist() {
    // Regtest allows min-difficulty blocks, so DarkGravityWave governs from
    // height 10 on.
    let params = legacy_params();
    let mut index = BlockIndex::new();

    let mut headers = Vec::new();
    let mut prev = [0u8; 32];
    for height in 0..12u32 {
        let header = make_header(prev, 1_700_000_000 + height * 120, TEST_BITS, height);
        prev = header.hash();
        headers.push(header);
    }
    let ids = insert_chain(&mut index, &params, &headers);

    let candidate = make_header(prev, 1_700_000_000 + 12 * 120, 0, 100);
    assert_eq!(
        next_work_required(&index, Some(*ids.last().unwrap()), &candidate, &params),
        pow_limit_bits(&params, Algo::Sha256)
    );
}

#[test]
fn dgw_is_a_fixpoint_at_perfect_spacing() {
    let params = legacy_params();
    let mut index = BlockIndex::new();

    let mut headers = Vec::new();
    let mut prev = [0u8; 32];
    for height in 0..30u32 {
        let header = make_header(prev, 1_700_000_000 + height * 120, TEST_BITS, height);
        prev = header.hash();
        headers.push(header);
    }
    let ids = insert_chain(&mut index, &params, &headers);

    // 24 blocks averaged, constant difficulty, actual timespan equal to the
    // target: the retarget must hand back the same bits.
    let candidate = make_header(prev, 1_700_000_000 + 30 * 120, 0, 100);
    assert_eq!(
        next_work_required(&index, Some(*ids.last().unwrap()), &candidate, &params),
        TEST_BITS
    );
}

#[test]
fn dgw_clamps_slow_chains_to_three_x() {
    let params = legacy_params();
    let mut index = BlockIndex::new();

    // Blocks ten times slower than the target spacing.
    let mut headers = Vec::new();
    let mut prev = [0u8; 32];
    for height in 0..30u32 {
        let header = make_header(prev, 1_700_000_000 + height * 1200, TEST_BITS, height);
        prev = header.hash();
        headers.push(header);
    }
    let ids = insert_chain(&mut index, &params, &headers);

    let candidate = make_header(prev, 1_700_000_000 + 30 * 1200, 0, 100);
    let expected = {
        let average = compact_to_u256_lenient(TEST_BITS);
        let target_timespan = 24i64 * params.pow_target_spacing;
        u256_to_compact(average * U256::from((target_timespan * 3) as u64) / U256::from(target_timespan as u64))
    };
    assert_eq!(
        next_work_required(&index, Some(*ids.last().unwrap()), &candidate, &params),
        expected
    );
}

#[test]
fn legacy_windowed_path_between_retarget_boundaries() {
    // Mainnet-style flags: no min-difficulty special case, generation-1
    // window up to height 100000.
    let mut params = consensus_params(Network::Mainnet);
    params.multi_algo_activation_height = i32::MAX;
    params.work_decay_v2_height = i32::MAX;
    params.geometric_work_height = i32::MAX;

    let mut index = BlockIndex::new();
    let mut headers = Vec::new();
    let mut prev = [0u8; 32];
    for height in 0..86u32 {
        let header = make_header(prev, 1_700_000_000 + height * 120, TEST_BITS, height);
        prev = header.hash();
        headers.push(header);
    }
    let ids = insert_chain(&mut index, &params, &headers);

    // next_height = 86, not a multiple of the 4-block cadence: reuse bits.
    let candidate = make_header(prev, 1_700_000_000 + 86 * 120, 0, 100);
    assert_eq!(
        next_work_required(&index, Some(*ids.last().unwrap()), &candidate, &params),
        TEST_BITS
    );
}

#[test]
fn legacy_windowed_retarget_scales_by_actual_timespan() {
    let mut params = consensus_params(Network::Mainnet);
    params.multi_algo_activation_height = i32::MAX;
    params.work_decay_v2_height = i32::MAX;
    params.geometric_work_height = i32::MAX;

    let mut index = BlockIndex::new();
    let mut headers = Vec::new();
    let mut prev = [0u8; 32];
    for height in 0..88u32 {
        let header = make_header(prev, 1_700_000_000 + height * 120, TEST_BITS, height);
        prev = header.hash();
        headers.push(header);
    }
    let ids = insert_chain(&mut index, &params, &headers);

    // next_height = 88 is on the cadence; window start is height 8.
    let candidate = make_header(prev, 1_700_000_000 + 88 * 120, 0, 100);
    let actual = (87 - 8) * 120i64;
    let target_timespan = params.legacy_averaging_timespan();
    assert_eq!(target_timespan, 9600);
    let expected = u256_to_compact(
        compact_to_u256_lenient(TEST_BITS) * U256::from(actual as u64)
            / U256::from(target_timespan as u64),
    );
    assert_eq!(
        next_work_required(&index, Some(*ids.last().unwrap()), &candidate, &params),
        expected
    );
}

#[test]
fn min_difficulty_gap_and_walk_back() {
    // Shrink the averaging window to zero so the between-boundaries rule is
    // reachable inside the min-difficulty era.
    let mut params = legacy_params();
    params.pow_target_timespan = 60;
    params.rule_change_activation_threshold = 3;

    let limit_bits = pow_limit_bits(&params, Algo::Sha256);
    let mut index = BlockIndex::new();
    let mut headers = Vec::new();
    let mut prev = [0u8; 32];
    for height in 0..5u32 {
        // Heights 0-3 carry real difficulty, height 4 a min-difficulty block.
        let bits = if height == 4 { limit_bits } else { TEST_BITS };
        let header = make_header(prev, 1_700_000_000 + height * 120, bits, height);
        prev = header.hash();
        headers.push(header);
    }
    let ids = insert_chain(&mut index, &params, &headers);
    let tip = *ids.last().unwrap();

    // Late candidate: more than twice the spacing after the tip.
    let late = make_header(prev, 1_700_000_000 + 4 * 120 + 241, 0, 100);
    assert_eq!(next_work_required(&index, Some(tip), &late, &params), limit_bits);

    // On-time candidate walks back past min-difficulty bits.
    let on_time = make_header(prev, 1_700_000_000 + 4 * 120 + 60, 0, 101);
    assert_eq!(next_work_required(&index, Some(tip), &on_time, &params), TEST_BITS);
}

#[test]
fn multi_algo_without_same_algo_predecessor_yields_ceiling() {
    let params = multi_algo_params();
    let mut index = BlockIndex::new();
    let mut headers = Vec::new();
    let mut prev = [0u8; 32];
    for height in 0..20u32 {
        let header = make_algo_header(
            prev,
            1_700_000_000 + height * 120,
            TEST_BITS,
            height,
            Algo::Sha256,
        );
        prev = header.hash();
        headers.push(header);
    }
    let ids = insert_chain(&mut index, &params, &headers);

    let candidate = make_algo_header(prev, 1_700_000_000 + 20 * 120, 0, 100, Algo::Slot2);
    assert_eq!(
        next_work_required(&index, Some(*ids.last().unwrap()), &candidate, &params),
        pow_limit_bits(&params, Algo::Slot2)
    );
}

#[test]
fn multi_algo_short_window_yields_ceiling() {
    let params = multi_algo_params();
    let mut index = BlockIndex::new();
    let mut headers = Vec::new();
    let mut prev = [0u8; 32];
    // Only five Slot1 blocks exist; the ten-block window cannot fill.
    for height in 0..20u32 {
        let algo = if height % 4 == 1 { Algo::Slot1 } else { Algo::Sha256 };
        let header = make_algo_header(prev, 1_700_000_000 + height * 120, TEST_BITS, height, algo);
        prev = header.hash();
        headers.push(header);
    }
    let ids = insert_chain(&mut index, &params, &headers);

    let candidate = make_algo_header(prev, 1_700_000_000 + 20 * 120, 0, 100, Algo::Slot1);
    assert_eq!(
        next_work_required(&index, Some(*ids.last().unwrap()), &candidate, &params),
        pow_limit_bits(&params, Algo::Slot1)
    );
}

#[test]
fn multi_algo_retargets_from_same_algo_window() {
    let params = multi_algo_params();
    let mut index = BlockIndex::new();
    let mut headers = Vec::new();
    let mut prev = [0u8; 32];
    // Algorithms rotate every block, so same-algo blocks sit 4 heights and
    // 480 seconds apart.
    for height in 0..52u32 {
        let algo = ALL_ALGOS[(height % 4) as usize];
        let header = make_algo_header(prev, 1_700_000_000 + height * 120, TEST_BITS, height, algo);
        prev = header.hash();
        headers.push(header);
    }
    let ids = insert_chain(&mut index, &params, &headers);
    let tip = *ids.last().unwrap();

    // Candidate continues the rotation: algo of height 52 is Sha256. The
    // last Sha256 block is height 48, the window start is height 12.
    let candidate = make_algo_header(prev, 1_700_000_000 + 52 * 120, 0, 100, Algo::Sha256);
    let actual = ((48 - 12) * 120) as i64;
    let target_timespan = params.multi_algo_target_timespan();
    let expected = u256_to_compact(
        compact_to_u256_lenient(TEST_BITS) * U256::from(actual as u64)
            / U256::from(target_timespan as u64),
    );
    assert_eq!(
        next_work_required(&index, Some(tip), &candidate, &params),
        expected
    );
}

#[test]
fn multi_algo_slides_window_past_time_warp() {
    let params = multi_algo_params();
    let mut index = BlockIndex::new();
    let mut headers = Vec::new();
    let mut prev = [0u8; 32];
    // Single-algo chain, heights 0..=20, 480s apart, except height 11 is
    // timestamped before height 10.
    let mut times = Vec::new();
    for height in 0..21u32 {
        let time = if height == 11 {
            1_700_000_000 + 10 * 480 - 100
        } else {
            1_700_000_000 + height * 480
        };
        times.push(time);
        let header = make_algo_header(prev, time, TEST_BITS, height, Algo::Slot1);
        prev = header.hash();
        headers.push(header);
    }
    let ids = insert_chain(&mut index, &params, &headers);
    let tip = *ids.last().unwrap();

    // The naive window start for next height 21 is height 11, whose
    // predecessor (height 10) is newer; the boundary slides back to 10.
    let candidate = make_algo_header(prev, 1_700_000_000 + 21 * 480, 0, 100, Algo::Slot1);
    let actual = i64::from(times[20]) - i64::from(times[10]);
    let target_timespan = params.multi_algo_target_timespan();
    let clamped = actual.clamp(
        params.multi_algo_min_actual_timespan(),
        params.multi_algo_max_actual_timespan(),
    );
    let expected = u256_to_compact(
        compact_to_u256_lenient(TEST_BITS) * U256::from(clamped as u64)
            / U256::from(target_timespan as u64),
    );
    assert_eq!(
        next_work_required(&index, Some(tip), &candidate, &params),
        expected
    );
}
