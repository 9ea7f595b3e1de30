//! Seeded Randomness for Level Setup
//!
//! Xorshift128+ with a SplitMix64-expanded seed. The simulation never
//! draws from it; only `LevelSetup` does, before the first tick, so the
//! seed stored in a replay reproduces the initial balls exactly.

use sha2::{Digest, Sha256};

/// Xorshift128+ generator.
///
/// ```
/// use enclosure::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(2024);
/// let mut b = DeterministicRng::new(2024);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    s: [u64; 2],
}

impl DeterministicRng {
    /// Expand `seed` into a non-zero generator state.
    pub fn new(seed: u64) -> Self {
        let mut mix = seed;
        let s = [splitmix64(&mut mix), splitmix64(&mut mix)];
        Self {
            s: if s == [0, 0] { [1, 1] } else { s },
        }
    }

    /// Next raw value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let [a, mut b] = self.s;
        let out = a.wrapping_add(b);
        b ^= a;
        self.s = [a.rotate_left(24) ^ b ^ (b << 16), b.rotate_left(37)];
        out
    }

    /// Uniform-ish value in `0..bound`; `0` when `bound` is zero.
    #[inline]
    pub fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        (self.next_u64() % bound as u64) as usize
    }

    /// `-1.0` or `+1.0` from the top bit.
    #[inline]
    pub fn next_sign(&mut self) -> f64 {
        if self.next_u64() >> 63 == 0 {
            -1.0
        } else {
            1.0
        }
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            items.swap(i, self.below(i + 1));
        }
    }
}

#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for level `level` of a run, so consecutive levels draw unrelated
/// spawns from one run seed.
pub fn derive_level_seed(run_seed: u64, level: u32) -> u64 {
    let digest = Sha256::new()
        .chain_update(b"ENCLOSURE_LEVEL_SEED_V1")
        .chain_update(run_seed.to_le_bytes())
        .chain_update(level.to_le_bytes())
        .finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}
