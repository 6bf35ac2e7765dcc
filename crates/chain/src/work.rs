//! Per-block proof values and cross-algorithm work normalization.
//!
//! Each algorithm retargets independently, so raw per-block work values are
//! not comparable across algorithms. A block's recorded proof therefore
//! folds in a distance-decayed estimate of what the other algorithms have
//! produced recently, under one of two height-gated combination regimes.

use mazad_consensus::algo::{Algo, ALL_ALGOS, NUM_ALGOS};
use mazad_consensus::ConsensusParams;
use mazad_pow::difficulty::{block_proof_base, pow_limit_value};
use primitive_types::U256;

use crate::index::{BlockIndex, NodeId};

const DECAY_WINDOW_V1: i32 = 32;
const DECAY_WINDOW_V3: i32 = 100;

/// Base work of the most recent `algo` block strictly behind `id`, scaled by
/// `(window - distance) / window`; `None` when no such block sits within the
/// window.
fn decayed_prev_work(index: &BlockIndex, id: NodeId, algo: Algo, window: i32) -> Option<U256> {
    let mut distance: i32 = 0;
    let mut cursor = index.entry(id).prev;
    while let Some(current) = cursor {
        if distance > window {
            return None;
        }
        let entry = index.entry(current);
        if entry.algo() == algo {
            let work = block_proof_base(entry.bits);
            let (scaled, _) = work.overflowing_mul(U256::from((window - distance) as u64));
            return Some(scaled / U256::from(window as u64));
        }
        cursor = entry.prev;
        distance += 1;
    }
    None
}

/// Earliest decay rule: 32-block window, floored at the algorithm's raw
/// ceiling value. The floor compares a work value against a target value;
/// that mismatch is the historical rule and is kept as-is.
pub fn prev_work_decay_v1(
    index: &BlockIndex,
    id: NodeId,
    algo: Algo,
    params: &ConsensusParams,
) -> U256 {
    let floor = pow_limit_value(params, algo);
    match decayed_prev_work(index, id, algo, DECAY_WINDOW_V1) {
        Some(work) if work >= floor => work,
        _ => floor,
    }
}

/// Same walk and weighting as V1, but no floor: an algorithm that has not
/// produced a block within the window contributes exactly zero.
pub fn prev_work_decay_v2(index: &BlockIndex, id: NodeId, algo: Algo) -> U256 {
    decayed_prev_work(index, id, algo, DECAY_WINDOW_V1).unwrap_or_default()
}

/// V2 with the window and weight denominator widened to 100 blocks.
pub fn prev_work_decay_v3(index: &BlockIndex, id: NodeId, algo: Algo) -> U256 {
    decayed_prev_work(index, id, algo, DECAY_WINDOW_V3).unwrap_or_default()
}

/// Combined work under the product regime: own base work multiplied by each
/// other algorithm's nonzero V3-decayed work. Despite the historical
/// "geometric mean" name, the n-th-root reduction was never enabled on the
/// network; the unreduced product is the consensus value and must stay so.
pub fn product_combined_work(index: &BlockIndex, id: NodeId) -> U256 {
    let entry = index.entry(id);
    let own = entry.algo();
    let mut work = block_proof_base(entry.bits);
    for algo in ALL_ALGOS {
        if algo == own {
            continue;
        }
        let other = prev_work_decay_v3(index, id, algo);
        if !other.is_zero() {
            let (product, _) = work.overflowing_mul(other);
            work = product;
        }
    }
    work
}

fn normalized_sum_work(index: &BlockIndex, id: NodeId, params: &ConsensusParams) -> U256 {
    let entry = index.entry(id);
    let own = entry.algo();
    let mut work = block_proof_base(entry.bits);
    for algo in ALL_ALGOS {
        if algo == own {
            continue;
        }
        let other = if entry.height >= params.work_decay_v2_height {
            prev_work_decay_v2(index, id, algo)
        } else {
            prev_work_decay_v1(index, id, algo, params)
        };
        work = work.saturating_add(other);
    }
    work / U256::from(NUM_ALGOS as u64)
}

/// Per-block proof contribution, by the regime in force at the block's
/// height. Accumulated into `chain_work` when the node is linked.
pub fn block_proof(index: &BlockIndex, id: NodeId, params: &ConsensusParams) -> U256 {
    if index.entry(id).height > params.geometric_work_height {
        product_combined_work(index, id)
    } else {
        normalized_sum_work(index, id, params)
    }
}

/// Seconds the tip chain's recent work rate would need to span the work
/// difference between `to` and `from`. Sign follows the direction of the
/// delta; saturates at the i64 range.
pub fn block_proof_equivalent_time(
    index: &BlockIndex,
    to: NodeId,
    from: NodeId,
    tip: NodeId,
    params: &ConsensusParams,
) -> i64 {
    let to_work = index.entry(to).chain_work;
    let from_work = index.entry(from).chain_work;
    let (delta, sign) = if to_work > from_work {
        (to_work - from_work, 1i64)
    } else {
        (from_work - to_work, -1i64)
    };

    let tip_proof = block_proof(index, tip, params);
    if tip_proof.is_zero() {
        return sign.saturating_mul(i64::MAX);
    }

    let (scaled, _) = delta.overflowing_mul(U256::from(params.pow_target_spacing as u64));
    let quotient = scaled / tip_proof;
    if quotient.bits() > 63 {
        return sign.saturating_mul(i64::MAX);
    }
    sign * quotient.low_u64() as i64
}
