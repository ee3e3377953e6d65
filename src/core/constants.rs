/*!
Constants for the PQC engine.

This module holds the bit layout of the feature flag words, the
CSPRNG seeding constants and other engine-wide limits.
*/

/// Engine version (major, minor, patch)
pub const VERSION_MAJOR: u8 = 0;
pub const VERSION_MINOR: u8 = 1;
pub const VERSION_PATCH: u8 = 0;

/// Packed engine version, `0x00MMmmpp`
pub const VERSION: u32 =
    ((VERSION_MAJOR as u32) << 16) | ((VERSION_MINOR as u32) << 8) | VERSION_PATCH as u32;

/// Maximum number of records retained by an error stack
pub const MAX_ERROR_RECORDS: usize = 32;

/// Set in any flag word when another word follows it
pub const FLAG_MORE: u32 = 0x8000_0000;

/// Number of flag words the engine understands
pub const FLAG_WORDS: usize = 3;

/// Flag word 0: entropy coding, sampling, hashing, reduction and threading
pub mod word0 {
    // Entropy coders (independent bits)
    pub const ENTROPY_BAC: u32 = 0x0000_0001;
    pub const ENTROPY_BAC_RLE: u32 = 0x0000_0002;
    pub const ENTROPY_STRONGSWAN: u32 = 0x0000_0004;
    pub const ENTROPY_HUFFMAN_STATIC: u32 = 0x0000_0008;
    pub const ENTROPY_MASK: u32 = 0x0000_000F;

    // Gaussian sample precision (3-bit field)
    pub const SAMPLE_PRECISION_MASK: u32 = 0x0000_0070;
    pub const SAMPLE_PRECISION_SHIFT: u32 = 4;

    pub const SAMPLE_BLINDING: u32 = 0x0000_0100;

    // Gaussian samplers (independent bits, priority resolved)
    pub const SAMPLE_CDF: u32 = 0x0000_0200;
    pub const SAMPLE_KNUTH_YAO: u32 = 0x0000_0400;
    pub const SAMPLE_ZIGGURAT: u32 = 0x0000_0800;
    pub const SAMPLE_BAC: u32 = 0x0000_1000;
    pub const SAMPLE_HUFFMAN: u32 = 0x0000_2000;
    pub const SAMPLE_BERNOULLI: u32 = 0x0000_4000;
    pub const SAMPLER_MASK: u32 = 0x0000_7E00;

    // Hash digest length (2-bit field)
    pub const HASH_LENGTH_MASK: u32 = 0x0003_0000;
    pub const HASH_LENGTH_SHIFT: u32 = 16;

    // Hash family (3-bit field)
    pub const HASH_FUNCTION_MASK: u32 = 0x001C_0000;
    pub const HASH_FUNCTION_SHIFT: u32 = 18;

    // Modular reduction (3-bit field)
    pub const REDUCTION_MASK: u32 = 0x00E0_0000;
    pub const REDUCTION_SHIFT: u32 = 21;

    // Threading (5-bit field, bits 29 and 30 reserved)
    pub const THREADING_KEYGEN: u32 = 0x0400_0000;
    pub const THREADING_ENC_SIGN: u32 = 0x0800_0000;
    pub const THREADING_DEC_VERIFY: u32 = 0x1000_0000;
    pub const THREADING_MASK: u32 = 0x7C00_0000;

    /// Every bit that belongs to some field of word 0
    pub const DEFINED: u32 = ENTROPY_MASK
        | SAMPLE_PRECISION_MASK
        | SAMPLE_BLINDING
        | SAMPLER_MASK
        | HASH_LENGTH_MASK
        | HASH_FUNCTION_MASK
        | REDUCTION_MASK
        | THREADING_MASK
        | super::FLAG_MORE;
}

/// Flag word 1: CSPRNG algorithm and entropy source
pub mod word1 {
    pub const AES_CTR_DRBG: u32 = 0x0000_0001;
    pub const CHACHA: u32 = 0x0000_0002;
    pub const SALSA: u32 = 0x0000_0004;
    pub const ISAAC: u32 = 0x0000_0008;
    pub const KISS: u32 = 0x0000_0010;
    pub const AES_CTR: u32 = 0x0000_0020;
    pub const HASH_DRBG_SHA3_512: u32 = 0x0000_0100;
    pub const HASH_DRBG_SHA3_256: u32 = 0x0000_0400;
    pub const HASH_DRBG_SHA2_512: u32 = 0x0000_1000;
    pub const HASH_DRBG_SHA2_256: u32 = 0x0000_4000;
    pub const HASH_DRBG_BLAKE2_512: u32 = 0x0001_0000;
    pub const HASH_DRBG_BLAKE2_256: u32 = 0x0004_0000;
    pub const HASH_DRBG_WHIRLPOOL_512: u32 = 0x0010_0000;
    pub const ALGORITHM_MASK: u32 = 0x0015_553F;

    pub const ENTROPY_DEV_RANDOM: u32 = 0x0100_0000;
    pub const ENTROPY_DEV_URANDOM: u32 = 0x0200_0000;
    pub const ENTROPY_OS: u32 = 0x0400_0000;
    pub const ENTROPY_CALLBACK: u32 = 0x0800_0000;
    pub const ENTROPY_MASK: u32 = 0x0F00_0000;

    pub const DEFINED: u32 = ALGORITHM_MASK | ENTROPY_MASK | super::FLAG_MORE;
}

/// Flag word 2: side-channel countermeasures
pub mod word2 {
    pub const DISCARD_MASK: u32 = 0x0000_0003;
    pub const CACHE_ACCESS: u32 = 0x0000_0004;
    pub const NON_CT_MASK: u32 = 0x0000_0008;
    pub const SHUFFLE: u32 = 0x0000_0010;
    pub const BLINDING: u32 = 0x0000_0020;

    /// The last word; it may not announce a successor
    pub const DEFINED: u32 = DISCARD_MASK | CACHE_ACCESS | NON_CT_MASK | SHUFFLE | BLINDING;
}

/// CSPRNG seeding constants
pub mod csprng {
    /// Bytes produced before a generator is reseeded from its entropy source
    pub const SEED_PERIOD: usize = 0x0010_0000;

    /// Entropy drawn from the source per (re)seed
    pub const SEED_BYTES: usize = 48;

    /// Personalization string mixed into every DRBG instantiation
    pub const PERSONALIZATION: &[u8] = b"pqc-engine csprng";
}

/// Key envelope constants
pub mod envelope {
    /// Key envelope format version
    pub const VERSION: u8 = 0x01;

    /// version | coding | class | scheme | param set (u32) | raw length
    pub const KEY_HEADER_SIZE: usize = 12;

    /// coding | raw length
    pub const SIGNATURE_HEADER_SIZE: usize = 5;
}

/// HKDF labels for the hybrid encryption scheme
pub const HKDF_SALT: &[u8] = b"pqc-engine kyber hybrid";
pub const HKDF_INFO_AEAD: &[u8] = b"chacha20poly1305 key";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word0_fields_are_disjoint() {
        let fields = [
            word0::ENTROPY_MASK,
            word0::SAMPLE_PRECISION_MASK,
            word0::SAMPLE_BLINDING,
            word0::SAMPLER_MASK,
            word0::HASH_LENGTH_MASK,
            word0::HASH_FUNCTION_MASK,
            word0::REDUCTION_MASK,
            word0::THREADING_MASK,
            FLAG_MORE,
        ];
        for (i, a) in fields.iter().enumerate() {
            for b in &fields[i + 1..] {
                assert_eq!(a & b, 0, "{:#x} overlaps {:#x}", a, b);
            }
        }
    }

    #[test]
    fn test_word1_algorithm_mask() {
        let all = word1::AES_CTR_DRBG
            | word1::CHACHA
            | word1::SALSA
            | word1::ISAAC
            | word1::KISS
            | word1::AES_CTR
            | word1::HASH_DRBG_SHA3_512
            | word1::HASH_DRBG_SHA3_256
            | word1::HASH_DRBG_SHA2_512
            | word1::HASH_DRBG_SHA2_256
            | word1::HASH_DRBG_BLAKE2_512
            | word1::HASH_DRBG_BLAKE2_256
            | word1::HASH_DRBG_WHIRLPOOL_512;
        assert_eq!(all, word1::ALGORITHM_MASK);
        assert_eq!(word1::ALGORITHM_MASK & word1::ENTROPY_MASK, 0);
    }

    #[test]
    fn test_version_packing() {
        assert_eq!(VERSION >> 16, VERSION_MAJOR as u32);
        assert_eq!((VERSION >> 8) & 0xff, VERSION_MINOR as u32);
    }
}
