//! Domain hashing for OLH
//!
//! Pure functions only. The perturbation pass and the matching pass both go
//! through [`domain_hash`], so a user's report and every candidate value are
//! hashed identically.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Hash `value` under a per-user `seed` into `[0, g)`.
///
/// SHA-256 over `seed (LE) || value (LE u64)`; the first 8 digest bytes are
/// read as a little-endian u64 and reduced modulo `g`.
#[inline]
pub fn domain_hash(value: usize, seed: u64, g: usize) -> usize {
    if g == 0 {
        return 0;
    }

    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update((value as u64).to_le_bytes());
    let digest = hasher.finalize();

    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(word) % g as u64) as usize
}

/// Draw one independent uniform hash seed per user
pub fn draw_seeds<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<u64> {
    (0..n).map(|_| rng.gen::<u64>()).collect()
}
