//! Required-work computation across the historical retarget generations.
//!
//! Dispatch is a pure function of the candidate height and network flags.
//! Throughout, a predecessor that does not exist yet yields the algorithm's
//! proof-of-work ceiling; that fallback is itself a consensus rule.

use mazad_consensus::algo::Algo;
use mazad_consensus::ConsensusParams;
use mazad_pow::difficulty::{
    compact_to_u256_lenient, pow_limit_bits, pow_limit_value, u256_to_compact,
};
use mazad_primitives::block::BlockHeader;
use primitive_types::U256;

use crate::index::{BlockIndex, NodeId};

const LEGACY_MAX_ADJUST_UP: i64 = 15;
const LEGACY_MAX_ADJUST_DOWN: i64 = 20;
const DGW_PAST_BLOCKS: i64 = 24;

/// Height at which the legacy era switched from windowed averaging to
/// DarkGravityWave. Networks permitting minimum-difficulty blocks switched
/// almost immediately.
const LEGACY_TRANSITION_HEIGHT_MIN_DIFF: i32 = 10;
const LEGACY_TRANSITION_HEIGHT: i32 = 100_000;

/// Compact target the block after `tip` must satisfy.
pub fn next_work_required(
    index: &BlockIndex,
    tip: Option<NodeId>,
    header: &BlockHeader,
    params: &ConsensusParams,
) -> u32 {
    let algo = header.algo();
    let Some(tip) = tip else {
        return pow_limit_bits(params, algo);
    };

    let next_height = index.entry(tip).height + 1;
    if next_height < params.multi_algo_activation_height {
        return legacy_next_work_required(index, tip, header, params);
    }
    multi_algo_next_work_required(index, tip, algo, params)
}

/// Per-algorithm averaging retarget: the window covers the last N blocks of
/// the candidate's own algorithm, however far apart they sit in the chain.
fn multi_algo_next_work_required(
    index: &BlockIndex,
    tip: NodeId,
    algo: Algo,
    params: &ConsensusParams,
) -> u32 {
    let limit_bits = pow_limit_bits(params, algo);

    let Some(last) = index.last_with_algo(tip, algo) else {
        return limit_bits;
    };

    let mut first = last;
    for _ in 0..params.multi_algo_averaging_interval - 1 {
        let Some(prev) = index.entry(first).prev else {
            return limit_bits;
        };
        let Some(stepped) = index.last_with_algo(prev, algo) else {
            return limit_bits;
        };
        first = stepped;
    }

    // A window whose start is timestamped after its own same-algorithm
    // predecessor would produce a negative span; slide the boundary back
    // until it is monotonic.
    loop {
        let Some(prev) = index.entry(first).prev else {
            return limit_bits;
        };
        let Some(boundary_prev) = index.last_with_algo(prev, algo) else {
            return limit_bits;
        };
        if index.entry(boundary_prev).block_time() <= index.entry(first).block_time() {
            break;
        }
        first = boundary_prev;
    }

    let target_timespan = params.multi_algo_target_timespan();
    let actual = (index.entry(last).block_time() - index.entry(first).block_time()).clamp(
        params.multi_algo_min_actual_timespan(),
        params.multi_algo_max_actual_timespan(),
    );

    let old_target = compact_to_u256_lenient(index.entry(last).bits);
    let (scaled, _) = old_target.overflowing_mul(U256::from(actual as u64));
    let mut new_target = scaled / U256::from(target_timespan as u64);

    let limit = pow_limit_value(params, algo);
    if new_target > limit {
        new_target = limit;
    }
    u256_to_compact(new_target)
}

fn legacy_next_work_required(
    index: &BlockIndex,
    tip: NodeId,
    header: &BlockHeader,
    params: &ConsensusParams,
) -> u32 {
    let next_height = index.entry(tip).height + 1;
    let transition = if params.pow_allow_min_difficulty_blocks {
        LEGACY_TRANSITION_HEIGHT_MIN_DIFF
    } else {
        LEGACY_TRANSITION_HEIGHT
    };

    if next_height >= transition {
        dark_gravity_wave3(index, tip, header.algo(), params)
    } else {
        windowed_average_next_work(index, tip, header, params)
    }
}

/// First-generation retarget: a fixed starting difficulty until the long
/// averaging window fills, then proportional adjustment once per
/// rule-change interval with asymmetric clamping.
fn windowed_average_next_work(
    index: &BlockIndex,
    tip: NodeId,
    header: &BlockHeader,
    params: &ConsensusParams,
) -> u32 {
    let algo = header.algo();
    let limit_bits = pow_limit_bits(params, algo);
    let averaging_interval = params.legacy_averaging_interval();
    let tip_entry = index.entry(tip);
    let next_height = i64::from(tip_entry.height) + 1;

    if next_height < averaging_interval {
        return u256_to_compact(U256::from_little_endian(&params.starting_difficulty));
    }

    if next_height % params.rule_change_activation_threshold != 0 {
        if params.pow_allow_min_difficulty_blocks {
            // A block arriving more than twice the target spacing late may be
            // mined at the minimum difficulty.
            if header.block_time() > tip_entry.block_time() + params.pow_target_spacing * 2 {
                return limit_bits;
            }
            // Otherwise reuse the last bits not set by that special rule.
            let mut cursor = tip;
            loop {
                let entry = index.entry(cursor);
                let Some(prev) = entry.prev else {
                    return entry.bits;
                };
                if i64::from(entry.height) % params.rule_change_activation_threshold == 0
                    || entry.bits != limit_bits
                {
                    return entry.bits;
                }
                cursor = prev;
            }
        }
        return tip_entry.bits;
    }

    let first = index
        .get_ancestor(tip, (next_height - averaging_interval) as i32)
        .expect("averaging window start below tip height");

    let target_timespan = params.legacy_averaging_timespan();
    let min_timespan = target_timespan * (100 - LEGACY_MAX_ADJUST_UP) / 100;
    let max_timespan = target_timespan * (100 + LEGACY_MAX_ADJUST_DOWN) / 100;
    let actual = (tip_entry.block_time() - index.entry(first).block_time())
        .clamp(min_timespan, max_timespan);

    let old_target = compact_to_u256_lenient(tip_entry.bits);
    let (scaled, _) = old_target.overflowing_mul(U256::from(actual as u64));
    let mut new_target = scaled / U256::from(target_timespan as u64);

    let limit = pow_limit_value(params, algo);
    if new_target > limit {
        new_target = limit;
    }
    u256_to_compact(new_target)
}

/// Second-generation retarget: every block, from a weighted average of the
/// last 24 difficulties and the time they actually took.
fn dark_gravity_wave3(
    index: &BlockIndex,
    tip: NodeId,
    algo: Algo,
    params: &ConsensusParams,
) -> u32 {
    let limit = pow_limit_value(params, algo);
    let tip_entry = index.entry(tip);
    if tip_entry.height == 0 || i64::from(tip_entry.height) < DGW_PAST_BLOCKS {
        return u256_to_compact(limit);
    }

    let mut count: i64 = 0;
    let mut average = U256::zero();
    let mut actual_timespan: i64 = 0;
    let mut last_block_time: i64 = 0;

    // One extra step past the averaged blocks so the oldest one contributes
    // its solve time too.
    let mut cursor = Some(tip);
    for walked in 0..=DGW_PAST_BLOCKS {
        let Some(id) = cursor else {
            break;
        };
        let entry = index.entry(id);

        if walked < DGW_PAST_BLOCKS {
            count += 1;
            let target = compact_to_u256_lenient(entry.bits);
            average = if count == 1 {
                target
            } else {
                let (scaled, _) = average.overflowing_mul(U256::from(count as u64));
                let (summed, _) = scaled.overflowing_add(target);
                summed / U256::from((count + 1) as u64)
            };
        }

        if last_block_time > 0 {
            actual_timespan += last_block_time - entry.block_time();
        }
        last_block_time = entry.block_time();

        if entry.height == 0 {
            break;
        }
        cursor = entry.prev;
    }

    let target_timespan = count * params.pow_target_spacing;
    let actual = actual_timespan.clamp(target_timespan / 3, target_timespan * 3);

    let (scaled, _) = average.overflowing_mul(U256::from(actual as u64));
    let mut new_target = scaled / U256::from(target_timespan as u64);
    if new_target > limit {
        new_target = limit;
    }
    u256_to_compact(new_target)
}
