//! Consensus parameter definitions.

use crate::algo::NUM_ALGOS;
use crate::Hash256;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Checkpoint {
    pub height: i32,
    pub hash: Hash256,
}

#[derive(Clone, Debug)]
pub struct ConsensusParams {
    pub network: Network,
    pub hash_genesis_block: Hash256,
    /// Per-algorithm proof-of-work ceiling, little-endian.
    pub pow_limit: [Hash256; NUM_ALGOS],
    /// Fixed difficulty returned until the first averaging window fills.
    pub starting_difficulty: Hash256,
    pub pow_target_timespan: i64,
    pub pow_target_spacing: i64,
    pub pow_allow_min_difficulty_blocks: bool,
    /// Legacy retarget cadence: difficulty only changes when the next height
    /// is a multiple of this.
    pub rule_change_activation_threshold: i64,
    /// First height governed by the per-algorithm averaging retarget.
    pub multi_algo_activation_height: i32,
    pub multi_algo_averaging_interval: i64,
    pub multi_algo_max_adjust_up: i64,
    pub multi_algo_max_adjust_down: i64,
    /// From this height the normalized-sum work combination switches from the
    /// floored V1 decay to the zero-default V2 decay.
    pub work_decay_v2_height: i32,
    /// Above this height block work uses the product combination.
    pub geometric_work_height: i32,
    pub minimum_chain_work: Hash256,
    pub checkpoints: Vec<Checkpoint>,
}

impl ConsensusParams {
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.pow_target_timespan / self.pow_target_spacing
    }

    pub fn legacy_averaging_interval(&self) -> i64 {
        self.difficulty_adjustment_interval() * 20
    }

    pub fn legacy_averaging_timespan(&self) -> i64 {
        self.legacy_averaging_interval() * self.pow_target_spacing
    }

    pub fn multi_algo_target_timespan(&self) -> i64 {
        self.multi_algo_averaging_interval * self.pow_target_spacing * NUM_ALGOS as i64
    }

    pub fn multi_algo_min_actual_timespan(&self) -> i64 {
        self.multi_algo_target_timespan() * (100 - self.multi_algo_max_adjust_up) / 100
    }

    pub fn multi_algo_max_actual_timespan(&self) -> i64 {
        self.multi_algo_target_timespan() * (100 + self.multi_algo_max_adjust_down) / 100
    }
}

#[derive(Debug)]
pub enum HexError {
    InvalidLength,
    InvalidHex,
}

/// Parse a display-order (big-endian) hex string into the little-endian byte
/// layout used throughout the consensus code. Short inputs are zero-padded on
/// the left, matching the behavior of the historical big-num parser.
pub fn hash256_from_hex(input: &str) -> Result<Hash256, HexError> {
    let mut hex = input.trim();
    if let Some(stripped) = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X")) {
        hex = stripped;
    }

    if hex.is_empty() || hex.len() > 64 {
        return Err(HexError::InvalidLength);
    }

    let mut padded = String::with_capacity(64);
    for _ in 0..(64 - hex.len()) {
        padded.push('0');
    }
    padded.push_str(hex);

    let mut bytes = [0u8; 32];
    for (i, byte_out) in bytes.iter_mut().enumerate() {
        let start = i * 2;
        let byte =
            u8::from_str_radix(&padded[start..start + 2], 16).map_err(|_| HexError::InvalidHex)?;
        *byte_out = byte;
    }
    bytes.reverse();

    Ok(bytes)
}

fn h(hex: &str) -> Hash256 {
    hash256_from_hex(hex).expect("valid hash literal")
}

pub fn consensus_params(network: Network) -> ConsensusParams {
    match network {
        Network::Mainnet => mainnet_consensus_params(),
        Network::Testnet => testnet_consensus_params(),
        Network::Regtest => regtest_consensus_params(),
    }
}

fn mainnet_consensus_params() -> ConsensusParams {
    let pow_limit = h("00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
    ConsensusParams {
        network: Network::Mainnet,
        hash_genesis_block: h("00000c7c73d8ce604178dae13f0fc6ec0be3275614366d44b1b4b5c6e238c60c"),
        pow_limit: [pow_limit; NUM_ALGOS],
        starting_difficulty: h("00000003ffffffffffffffffffffffffffffffffffffffffffffffffffffffff"),
        pow_target_timespan: 8 * 60,
        pow_target_spacing: 2 * 60,
        pow_allow_min_difficulty_blocks: false,
        rule_change_activation_threshold: 4,
        multi_algo_activation_height: 1_100_000,
        multi_algo_averaging_interval: 10,
        multi_algo_max_adjust_up: 20,
        multi_algo_max_adjust_down: 40,
        work_decay_v2_height: 1_141_000,
        geometric_work_height: 1_182_000,
        minimum_chain_work: h(
            "0000000000000000000000000000000000000000003f94d1ad391682fe038bf5",
        ),
        checkpoints: vec![
            Checkpoint {
                height: 0,
                hash: h("00000c7c73d8ce604178dae13f0fc6ec0be3275614366d44b1b4b5c6e238c60c"),
            },
            Checkpoint {
                height: 91_800,
                hash: h("00000000000000f35417a67ff0bb5cec6a1c64d13bb1359ae4a03d2c9d44d900"),
            },
            Checkpoint {
                height: 183_600,
                hash: h("0000000000000787f10fa4a547822f8170f1f182ca0de60ecd2de189471da885"),
            },
            Checkpoint {
                height: 700_000,
                hash: h("000000000000018674cd89025fc8190e5fc1a558dce38392e43f3603cb1cb192"),
            },
            Checkpoint {
                height: 800_000,
                hash: h("000000000000010c0245a794d16023ffb7a0e5f0fceb991e9f15706e711272de"),
            },
            Checkpoint {
                height: 870_000,
                hash: h("00000000000004386593649e6ad9a2ed3153710d94a55bf8dfa630baf53ec5ec"),
            },
        ],
    }
}

fn testnet_consensus_params() -> ConsensusParams {
    let pow_limit = h("00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
    ConsensusParams {
        network: Network::Testnet,
        hash_genesis_block: h("000003ae7f631de18a457fa4fa078e6fa8aff38e258458f8189810de5d62cede"),
        pow_limit: [pow_limit; NUM_ALGOS],
        starting_difficulty: h("00000003ffffffffffffffffffffffffffffffffffffffffffffffffffffffff"),
        pow_target_timespan: 8 * 60,
        pow_target_spacing: 2 * 60,
        pow_allow_min_difficulty_blocks: true,
        rule_change_activation_threshold: 1512,
        multi_algo_activation_height: 1400,
        multi_algo_averaging_interval: 10,
        multi_algo_max_adjust_up: 20,
        multi_algo_max_adjust_down: 40,
        work_decay_v2_height: 1500,
        geometric_work_height: 1600,
        minimum_chain_work: h(
            "00000000000000000000000000000000000000000000001f057509eba81aed91",
        ),
        checkpoints: vec![Checkpoint {
            height: 0,
            hash: h("000007717e2e2df52a9ff29b0771901c9c12f5cbb4914cdf0c8047b459bb21d8"),
        }],
    }
}

fn regtest_consensus_params() -> ConsensusParams {
    let pow_limit = h("7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
    ConsensusParams {
        network: Network::Regtest,
        hash_genesis_block: h("57939ce0a96bf42965fee5956528a456d0edfb879b8bd699bcbb4786d27b979d"),
        pow_limit: [pow_limit; NUM_ALGOS],
        starting_difficulty: h("3fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"),
        pow_target_timespan: 8 * 60,
        pow_target_spacing: 2 * 60,
        pow_allow_min_difficulty_blocks: true,
        rule_change_activation_threshold: 108,
        multi_algo_activation_height: 300,
        multi_algo_averaging_interval: 10,
        multi_algo_max_adjust_up: 20,
        multi_algo_max_adjust_down: 40,
        work_decay_v2_height: 320,
        geometric_work_height: 340,
        minimum_chain_work: h("00"),
        checkpoints: vec![Checkpoint {
            height: 0,
            hash: h("57939ce0a96bf42965fee5956528a456d0edfb879b8bd699bcbb4786d27b979d"),
        }],
    }
}
