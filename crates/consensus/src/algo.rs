//! Mining-algorithm slots and their encoding in the header version field.

/// Number of proof-of-work algorithm slots.
pub const NUM_ALGOS: usize = 4;

/// Merge-mining marker bit in the header version.
pub const VERSION_AUXPOW: i32 = 1 << 8;

/// Three-bit algorithm field, bits 9-11 of the header version.
pub const VERSION_ALGO: i32 = 7 << 9;
pub const VERSION_SLOT1: i32 = 1 << 9;
pub const VERSION_SLOT2: i32 = 2 << 9;
pub const VERSION_SLOT3: i32 = 3 << 9;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Algo {
    Sha256 = 0,
    Slot1 = 1,
    Slot2 = 2,
    Slot3 = 3,
}

pub const ALL_ALGOS: [Algo; NUM_ALGOS] = [Algo::Sha256, Algo::Slot1, Algo::Slot2, Algo::Slot3];

impl Algo {
    pub const fn as_usize(self) -> usize {
        self as usize
    }

    /// Decode the algorithm field from a header version. Encodings outside
    /// the known slots map to `Slot1`.
    pub fn from_version(version: i32) -> Self {
        match version & VERSION_ALGO {
            0 => Algo::Sha256,
            VERSION_SLOT1 => Algo::Slot1,
            VERSION_SLOT2 => Algo::Slot2,
            VERSION_SLOT3 => Algo::Slot3,
            _ => Algo::Slot1,
        }
    }

    pub fn version_bits(self) -> i32 {
        match self {
            Algo::Sha256 => 0,
            Algo::Slot1 => VERSION_SLOT1,
            Algo::Slot2 => VERSION_SLOT2,
            Algo::Slot3 => VERSION_SLOT3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Algo::Sha256 => "SHA256d",
            Algo::Slot1 => "Blake2b",
            Algo::Slot2 => "Skein",
            Algo::Slot3 => "Argon2d",
        }
    }
}
