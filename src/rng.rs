//! A reproducible, non-cryptographic PRNG seeded from arbitrary bytes.
//!
//! Bit-for-bit determinism across platforms and releases is the entire
//! point of this type: it must reproduce the exact same stream the
//! historical implementation produced, so knockout zone assignment and
//! tiebreaker seating stay stable between re-runs of an otherwise-identical
//! competition. The standard library's PRNG is unsuitable here because its
//! algorithm and seeding are not part of this crate's stable contract.

use md5::{Digest, Md5};

/// Seeded pseudo-random generator with an exactly specified bit stream.
pub struct StableRng {
    state: u32,
}

impl StableRng {
    /// Seeds from the low 32 bits of the MD5 digest of `seed`, taken as a
    /// single big-endian integer (matching `int(digest.hexdigest(), 16) &
    /// 0xffffffff`).
    pub fn seed(seed: impl AsRef<[u8]>) -> Self {
        let digest = Md5::digest(seed.as_ref());
        let state = u32::from_be_bytes([digest[12], digest[13], digest[14], digest[15]]);
        Self { state }
    }

    fn rand_bit(&mut self) -> u32 {
        let output = self.state & 1;
        let feedback = ((self.state >> 20) ^ (self.state >> 25) ^ (self.state >> 30) ^ (self.state >> 31)) & 1;
        self.state = (self.state << 1) | feedback;
        output
    }

    /// Returns `n` random bits, most significant bit first, as an integer.
    pub fn getrandbits(&mut self, n: u32) -> u64 {
        let mut value: u64 = 0;
        for _ in 0..n {
            value = (value << 1) | self.rand_bit() as u64;
        }
        value
    }

    /// A float in `[0, 1)` built from 32 random bits.
    pub fn random(&mut self) -> f64 {
        self.getrandbits(32) as f64 / (1u64 << 32) as f64
    }

    /// Shuffle, high index down: `j = floor(random() * (i+1))`, matching
    /// `stable_random.py`'s own `shuffle` exactly (not CPython's
    /// rejection-sampled `_randbelow`, which a newer snapshot of the source
    /// switched to but which does not reproduce the historical sequence).
    pub fn shuffle<T>(&mut self, seq: &mut [T]) {
        if seq.len() < 2 {
            return;
        }
        for i in (1..seq.len()).rev() {
            let j = (self.random() * (i as f64 + 1.0)) as usize;
            seq.swap(i, j);
        }
    }
}
