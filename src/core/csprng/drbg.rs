/*!
SP 800-90A deterministic random bit generators.

`CtrDrbg` is CTR_DRBG over AES-256 without a derivation function; seed
material is first condensed with SHA-384 so any amount of entropy can be
fed in. `HashDrbg` is Hash_DRBG over any digest the engine can select.
*/

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use sha2::{Digest, Sha384};
use zeroize::{Zeroize, Zeroizing};

use super::{CsprngAlgorithm, Generator};
use crate::core::constants::csprng::PERSONALIZATION;
use crate::core::crypto::hash::{self, HashAlgorithm};
use crate::core::error::CsprngError;

const AES_BLOCK: usize = 16;
const CTR_SEEDLEN: usize = 48;

/// Big-endian increment modulo 2^(8 * len)
fn increment(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// Big-endian `acc += addend` modulo 2^(8 * acc.len()), addend right-aligned
fn add_into(acc: &mut [u8], addend: &[u8]) {
    let mut carry = 0u16;
    let mut a = acc.iter_mut().rev();
    let mut b = addend.iter().rev();
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) => {
                let sum = *x as u16 + *y as u16 + carry;
                *x = sum as u8;
                carry = sum >> 8;
            }
            (Some(x), None) => {
                if carry == 0 {
                    break;
                }
                let sum = *x as u16 + carry;
                *x = sum as u8;
                carry = sum >> 8;
            }
            (None, _) => break,
        }
    }
}

/// CTR_DRBG (AES-256, no derivation function)
pub struct CtrDrbg {
    key: Zeroizing<[u8; 32]>,
    v: Zeroizing<[u8; AES_BLOCK]>,
    reseed_counter: u64,
}

impl CtrDrbg {
    pub fn new(entropy: &[u8]) -> Self {
        let mut drbg = Self {
            key: Zeroizing::new([0u8; 32]),
            v: Zeroizing::new([0u8; AES_BLOCK]),
            reseed_counter: 1,
        };
        drbg.update(&Self::seed_material(entropy));
        drbg
    }

    fn seed_material(entropy: &[u8]) -> Zeroizing<[u8; CTR_SEEDLEN]> {
        let mut hasher = Sha384::new();
        hasher.update(entropy);
        hasher.update(PERSONALIZATION);
        let mut material = Zeroizing::new([0u8; CTR_SEEDLEN]);
        material.copy_from_slice(&hasher.finalize());
        material
    }

    fn cipher(&self) -> Aes256 {
        Aes256::new(GenericArray::from_slice(&self.key[..]))
    }

    fn next_block(&mut self, cipher: &Aes256) -> GenericArray<u8, aes::cipher::consts::U16> {
        increment(&mut self.v[..]);
        let mut block = GenericArray::clone_from_slice(&self.v[..]);
        cipher.encrypt_block(&mut block);
        block
    }

    fn update(&mut self, provided: &[u8; CTR_SEEDLEN]) {
        let cipher = self.cipher();
        let mut temp = [0u8; CTR_SEEDLEN];
        for chunk in temp.chunks_mut(AES_BLOCK) {
            let block = self.next_block(&cipher);
            chunk.copy_from_slice(&block);
        }
        for (t, p) in temp.iter_mut().zip(provided.iter()) {
            *t ^= p;
        }
        self.key.copy_from_slice(&temp[..32]);
        self.v.copy_from_slice(&temp[32..]);
        temp.zeroize();
    }

    /// Generate calls since the last (re)seed
    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }
}

impl Generator for CtrDrbg {
    fn algorithm(&self) -> CsprngAlgorithm {
        CsprngAlgorithm::AesCtrDrbg
    }

    fn generate(&mut self, out: &mut [u8]) -> Result<(), CsprngError> {
        let cipher = self.cipher();
        for chunk in out.chunks_mut(AES_BLOCK) {
            let block = self.next_block(&cipher);
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
        self.update(&[0u8; CTR_SEEDLEN]);
        self.reseed_counter += 1;
        Ok(())
    }

    fn reseed(&mut self, entropy: &[u8]) {
        self.update(&Self::seed_material(entropy));
        self.reseed_counter = 1;
    }
}

/// Hash_DRBG over a runtime-selected digest
pub struct HashDrbg {
    algorithm: HashAlgorithm,
    v: Zeroizing<Vec<u8>>,
    c: Zeroizing<Vec<u8>>,
    reseed_counter: u64,
}

impl HashDrbg {
    pub fn new(algorithm: HashAlgorithm, entropy: &[u8]) -> Self {
        let seedlen = Self::seedlen(algorithm);
        let v = Self::hash_df(algorithm, &[entropy, PERSONALIZATION], seedlen);
        let c = Self::hash_df(algorithm, &[&[0x00], &v[..]], seedlen);
        Self {
            algorithm,
            v,
            c,
            reseed_counter: 1,
        }
    }

    /// Seed length in bytes (440 or 888 bits)
    fn seedlen(algorithm: HashAlgorithm) -> usize {
        if algorithm.output_size() <= 32 { 55 } else { 111 }
    }

    fn hash_df(algorithm: HashAlgorithm, inputs: &[&[u8]], len: usize) -> Zeroizing<Vec<u8>> {
        let bits = ((len * 8) as u32).to_be_bytes();
        let mut out = Zeroizing::new(Vec::with_capacity(len + algorithm.output_size()));
        let mut counter = 1u8;
        while out.len() < len {
            let prefix = [counter];
            let mut parts: Vec<&[u8]> = vec![&prefix, &bits];
            parts.extend_from_slice(inputs);
            out.extend_from_slice(&hash::digest(algorithm, &parts));
            counter = counter.wrapping_add(1);
        }
        out.truncate(len);
        out
    }

    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }
}

impl Generator for HashDrbg {
    fn algorithm(&self) -> CsprngAlgorithm {
        CsprngAlgorithm::HashDrbg(self.algorithm)
    }

    fn generate(&mut self, out: &mut [u8]) -> Result<(), CsprngError> {
        let outlen = self.algorithm.output_size();

        // Hashgen
        let mut data = Zeroizing::new(self.v.to_vec());
        for chunk in out.chunks_mut(outlen) {
            let w = hash::digest(self.algorithm, &[&data[..]]);
            chunk.copy_from_slice(&w[..chunk.len()]);
            increment(&mut data[..]);
        }

        // V = V + H + C + reseed_counter
        let h = hash::digest(self.algorithm, &[&[0x03], &self.v[..]]);
        add_into(&mut self.v[..], &h);
        add_into(&mut self.v[..], &self.c[..]);
        add_into(&mut self.v[..], &self.reseed_counter.to_be_bytes());
        self.reseed_counter += 1;
        Ok(())
    }

    fn reseed(&mut self, entropy: &[u8]) {
        let seedlen = Self::seedlen(self.algorithm);
        self.v = Self::hash_df(self.algorithm, &[&[0x01], &self.v[..], entropy], seedlen);
        self.c = Self::hash_df(self.algorithm, &[&[0x00], &self.v[..]], seedlen);
        self.reseed_counter = 1;
    }
}
