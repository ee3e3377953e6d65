//! ISAAC-64 and KISS-64. Fast, but not suitable for key material.

use zeroize::Zeroize;

use super::{CsprngAlgorithm, Generator};
use crate::core::error::CsprngError;

const ISAAC_WORDS: usize = 256;
const GOLDEN_RATIO: u64 = 0x9e37_79b9_7f4a_7c13;

fn seed_words(seed: &[u8], words: &mut [u64]) {
    for (word, chunk) in words.iter_mut().zip(seed.chunks(8)) {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        *word ^= u64::from_le_bytes(buf);
    }
}

fn fill_from_words(out: &mut [u8], mut next: impl FnMut() -> u64) {
    for chunk in out.chunks_mut(8) {
        let word = next().to_le_bytes();
        chunk.copy_from_slice(&word[..chunk.len()]);
    }
}

/// Bob Jenkins' ISAAC-64
pub struct Isaac64 {
    rsl: [u64; ISAAC_WORDS],
    mem: [u64; ISAAC_WORDS],
    a: u64,
    b: u64,
    c: u64,
    index: usize,
}

#[inline]
fn mix(s: &mut [u64; 8]) {
    s[0] = s[0].wrapping_sub(s[4]); s[5] ^= s[7] >> 9;  s[7] = s[7].wrapping_add(s[0]);
    s[1] = s[1].wrapping_sub(s[5]); s[6] ^= s[0] << 9;  s[0] = s[0].wrapping_add(s[1]);
    s[2] = s[2].wrapping_sub(s[6]); s[7] ^= s[1] >> 23; s[1] = s[1].wrapping_add(s[2]);
    s[3] = s[3].wrapping_sub(s[7]); s[0] ^= s[2] << 15; s[2] = s[2].wrapping_add(s[3]);
    s[4] = s[4].wrapping_sub(s[0]); s[1] ^= s[3] >> 14; s[3] = s[3].wrapping_add(s[4]);
    s[5] = s[5].wrapping_sub(s[1]); s[2] ^= s[4] << 20; s[4] = s[4].wrapping_add(s[5]);
    s[6] = s[6].wrapping_sub(s[2]); s[3] ^= s[5] >> 17; s[5] = s[5].wrapping_add(s[6]);
    s[7] = s[7].wrapping_sub(s[3]); s[4] ^= s[6] << 14; s[6] = s[6].wrapping_add(s[7]);
}

impl Isaac64 {
    pub fn new(seed: &[u8]) -> Self {
        let mut isaac = Self {
            rsl: [0; ISAAC_WORDS],
            mem: [0; ISAAC_WORDS],
            a: 0,
            b: 0,
            c: 0,
            index: ISAAC_WORDS,
        };
        seed_words(seed, &mut isaac.rsl);
        isaac.init();
        isaac
    }

    fn init(&mut self) {
        let mut s = [GOLDEN_RATIO; 8];
        for _ in 0..4 {
            mix(&mut s);
        }

        // Two passes: first over the seed, then over the memory itself
        for pass in 0..2 {
            for i in (0..ISAAC_WORDS).step_by(8) {
                let src = if pass == 0 { &self.rsl } else { &self.mem };
                for (j, word) in s.iter_mut().enumerate() {
                    *word = word.wrapping_add(src[i + j]);
                }
                mix(&mut s);
                self.mem[i..i + 8].copy_from_slice(&s);
            }
        }

        self.a = 0;
        self.b = 0;
        self.c = 0;
        self.refill();
    }

    fn refill(&mut self) {
        self.c = self.c.wrapping_add(1);
        self.b = self.b.wrapping_add(self.c);

        for i in 0..ISAAC_WORDS {
            let x = self.mem[i];
            let a = self.a;
            self.a = match i % 4 {
                0 => !(a ^ (a << 21)),
                1 => a ^ (a >> 5),
                2 => a ^ (a << 12),
                _ => a ^ (a >> 33),
            };
            self.a = self.a.wrapping_add(self.mem[(i + ISAAC_WORDS / 2) % ISAAC_WORDS]);
            let y = self.mem[((x >> 3) as usize) % ISAAC_WORDS]
                .wrapping_add(self.a)
                .wrapping_add(self.b);
            self.mem[i] = y;
            self.b = self.mem[((y >> 11) as usize) % ISAAC_WORDS].wrapping_add(x);
            self.rsl[i] = self.b;
        }
        self.index = 0;
    }

    fn next_u64(&mut self) -> u64 {
        if self.index >= ISAAC_WORDS {
            self.refill();
        }
        let word = self.rsl[self.index];
        self.index += 1;
        word
    }
}

impl Generator for Isaac64 {
    fn algorithm(&self) -> CsprngAlgorithm {
        CsprngAlgorithm::Isaac
    }

    fn generate(&mut self, out: &mut [u8]) -> Result<(), CsprngError> {
        fill_from_words(out, || self.next_u64());
        Ok(())
    }

    fn reseed(&mut self, entropy: &[u8]) {
        self.rsl.copy_from_slice(&self.mem);
        seed_words(entropy, &mut self.rsl);
        self.init();
    }
}

impl Drop for Isaac64 {
    fn drop(&mut self) {
        self.rsl.zeroize();
        self.mem.zeroize();
    }
}

/// Marsaglia's 64-bit KISS
pub struct Kiss64 {
    x: u64,
    c: u64,
    y: u64,
    z: u64,
}

impl Kiss64 {
    pub fn new(seed: &[u8]) -> Self {
        let mut state = [
            1_234_567_890_987_654_321,
            123_456_123_456_123_456,
            362_436_362_436_362_436,
            1_066_149_217_761_810,
        ];
        seed_words(seed, &mut state);
        let mut kiss = Self {
            x: state[0],
            c: state[1],
            y: state[2],
            z: state[3],
        };
        // The xorshift component must never be zero
        if kiss.y == 0 {
            kiss.y = 362_436_362_436_362_436;
        }
        kiss
    }

    fn next_u64(&mut self) -> u64 {
        // Multiply-with-carry
        let t = (self.x << 58).wrapping_add(self.c);
        self.c = self.x >> 6;
        self.x = self.x.wrapping_add(t);
        self.c = self.c.wrapping_add((self.x < t) as u64);

        // Xorshift
        self.y ^= self.y << 13;
        self.y ^= self.y >> 17;
        self.y ^= self.y << 43;

        // Congruential
        self.z = self.z.wrapping_mul(6_906_969_069).wrapping_add(1_234_567);

        self.x.wrapping_add(self.y).wrapping_add(self.z)
    }
}

impl Generator for Kiss64 {
    fn algorithm(&self) -> CsprngAlgorithm {
        CsprngAlgorithm::Kiss
    }

    fn generate(&mut self, out: &mut [u8]) -> Result<(), CsprngError> {
        fill_from_words(out, || self.next_u64());
        Ok(())
    }

    fn reseed(&mut self, entropy: &[u8]) {
        let mut fresh = Kiss64::new(entropy);
        fresh.x ^= self.x;
        fresh.z ^= self.z;
        *self = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isaac_deterministic_across_refill() {
        let mut a = Isaac64::new(b"isaac seed");
        let mut b = Isaac64::new(b"isaac seed");
        let (mut x, mut y) = (vec![0u8; 3000], vec![0u8; 3000]);
        a.generate(&mut x).unwrap();
        b.generate(&mut y).unwrap();
        assert_eq!(x, y);
        assert_ne!(&x[..8], &x[2048..2056]);
    }

    #[test]
    fn test_kiss_zero_seed_still_runs() {
        let mut kiss = Kiss64::new(&[]);
        let first = kiss.next_u64();
        assert_ne!(first, kiss.next_u64());
    }

    #[test]
    fn test_reseed_diverges() {
        let mut a = Kiss64::new(b"k");
        let mut b = Kiss64::new(b"k");
        b.reseed(b"new entropy");
        assert_ne!(a.next_u64(), b.next_u64());

        let mut a = Isaac64::new(b"i");
        let mut b = Isaac64::new(b"i");
        b.reseed(b"new entropy");
        assert_ne!(a.next_u64(), b.next_u64());
    }
}
