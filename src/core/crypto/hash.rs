/*!
Runtime-selected message digests.

The hash family and digest length resolved from the feature flags are
turned into a concrete `HashAlgorithm` here. `Hasher` dispatches to the
RustCrypto implementation through `digest::DynDigest`, and `hkdf` runs
HKDF over whichever algorithm was selected.
*/

use std::fmt;

use digest::DynDigest;
use digest::consts::{U28, U32, U48};

/// Hash family selected by the flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashFamily {
    /// Whatever the scheme uses natively
    #[default]
    SchemeDefault,
    Blake2,
    Sha2,
    Sha3,
    Whirlpool,
}

/// Digest length selected by the flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestLength {
    #[default]
    Bits512,
    Bits384,
    Bits256,
    Bits224,
}

impl DigestLength {
    pub fn bytes(&self) -> usize {
        match self {
            DigestLength::Bits512 => 64,
            DigestLength::Bits384 => 48,
            DigestLength::Bits256 => 32,
            DigestLength::Bits224 => 28,
        }
    }
}

/// A concrete digest algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha2_224,
    Sha2_256,
    Sha2_384,
    Sha2_512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    Blake2b224,
    Blake2b256,
    Blake2b384,
    Blake2b512,
    Whirlpool,
}

// Expands `$body` once per algorithm with `$d` bound to the digest type.
macro_rules! with_digest {
    ($alg:expr, $d:ident => $body:expr) => {
        match $alg {
            HashAlgorithm::Sha2_224 => { type $d = sha2::Sha224; $body }
            HashAlgorithm::Sha2_256 => { type $d = sha2::Sha256; $body }
            HashAlgorithm::Sha2_384 => { type $d = sha2::Sha384; $body }
            HashAlgorithm::Sha2_512 => { type $d = sha2::Sha512; $body }
            HashAlgorithm::Sha3_224 => { type $d = sha3::Sha3_224; $body }
            HashAlgorithm::Sha3_256 => { type $d = sha3::Sha3_256; $body }
            HashAlgorithm::Sha3_384 => { type $d = sha3::Sha3_384; $body }
            HashAlgorithm::Sha3_512 => { type $d = sha3::Sha3_512; $body }
            HashAlgorithm::Blake2b224 => { type $d = blake2::Blake2b<U28>; $body }
            HashAlgorithm::Blake2b256 => { type $d = blake2::Blake2b<U32>; $body }
            HashAlgorithm::Blake2b384 => { type $d = blake2::Blake2b<U48>; $body }
            HashAlgorithm::Blake2b512 => { type $d = blake2::Blake2b512; $body }
            HashAlgorithm::Whirlpool => { type $d = whirlpool::Whirlpool; $body }
        }
    };
}

impl HashAlgorithm {
    /// Combine a family and a length.
    ///
    /// Returns `None` for the scheme-default family, which has no concrete
    /// algorithm until a scheme is chosen, and for Whirlpool at any length
    /// other than 512 bits.
    pub fn from_family(family: HashFamily, length: DigestLength) -> Option<Self> {
        use DigestLength::*;
        let alg = match (family, length) {
            (HashFamily::SchemeDefault, _) => return None,
            (HashFamily::Sha2, Bits224) => HashAlgorithm::Sha2_224,
            (HashFamily::Sha2, Bits256) => HashAlgorithm::Sha2_256,
            (HashFamily::Sha2, Bits384) => HashAlgorithm::Sha2_384,
            (HashFamily::Sha2, Bits512) => HashAlgorithm::Sha2_512,
            (HashFamily::Sha3, Bits224) => HashAlgorithm::Sha3_224,
            (HashFamily::Sha3, Bits256) => HashAlgorithm::Sha3_256,
            (HashFamily::Sha3, Bits384) => HashAlgorithm::Sha3_384,
            (HashFamily::Sha3, Bits512) => HashAlgorithm::Sha3_512,
            (HashFamily::Blake2, Bits224) => HashAlgorithm::Blake2b224,
            (HashFamily::Blake2, Bits256) => HashAlgorithm::Blake2b256,
            (HashFamily::Blake2, Bits384) => HashAlgorithm::Blake2b384,
            (HashFamily::Blake2, Bits512) => HashAlgorithm::Blake2b512,
            (HashFamily::Whirlpool, Bits512) => HashAlgorithm::Whirlpool,
            (HashFamily::Whirlpool, _) => return None,
        };
        Some(alg)
    }

    /// Digest size in bytes
    pub fn output_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha2_224 | HashAlgorithm::Sha3_224 | HashAlgorithm::Blake2b224 => 28,
            HashAlgorithm::Sha2_256 | HashAlgorithm::Sha3_256 | HashAlgorithm::Blake2b256 => 32,
            HashAlgorithm::Sha2_384 | HashAlgorithm::Sha3_384 | HashAlgorithm::Blake2b384 => 48,
            HashAlgorithm::Sha2_512
            | HashAlgorithm::Sha3_512
            | HashAlgorithm::Blake2b512
            | HashAlgorithm::Whirlpool => 64,
        }
    }

    pub fn family(&self) -> HashFamily {
        match self {
            HashAlgorithm::Sha2_224
            | HashAlgorithm::Sha2_256
            | HashAlgorithm::Sha2_384
            | HashAlgorithm::Sha2_512 => HashFamily::Sha2,
            HashAlgorithm::Sha3_224
            | HashAlgorithm::Sha3_256
            | HashAlgorithm::Sha3_384
            | HashAlgorithm::Sha3_512 => HashFamily::Sha3,
            HashAlgorithm::Blake2b224
            | HashAlgorithm::Blake2b256
            | HashAlgorithm::Blake2b384
            | HashAlgorithm::Blake2b512 => HashFamily::Blake2,
            HashAlgorithm::Whirlpool => HashFamily::Whirlpool,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha2_224 => "SHA2-224",
            HashAlgorithm::Sha2_256 => "SHA2-256",
            HashAlgorithm::Sha2_384 => "SHA2-384",
            HashAlgorithm::Sha2_512 => "SHA2-512",
            HashAlgorithm::Sha3_224 => "SHA3-224",
            HashAlgorithm::Sha3_256 => "SHA3-256",
            HashAlgorithm::Sha3_384 => "SHA3-384",
            HashAlgorithm::Sha3_512 => "SHA3-512",
            HashAlgorithm::Blake2b224 => "BLAKE2b-224",
            HashAlgorithm::Blake2b256 => "BLAKE2b-256",
            HashAlgorithm::Blake2b384 => "BLAKE2b-384",
            HashAlgorithm::Blake2b512 => "BLAKE2b-512",
            HashAlgorithm::Whirlpool => "Whirlpool-512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental hasher over a runtime-selected algorithm
pub struct Hasher {
    algorithm: HashAlgorithm,
    inner: Box<dyn DynDigest + Send>,
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let inner: Box<dyn DynDigest + Send> =
            with_digest!(algorithm, D => Box::new(D::default()));
        Self { algorithm, inner }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finish and return the digest
    pub fn finalize(self) -> Vec<u8> {
        self.inner.finalize().into_vec()
    }

    /// Return the digest and reset for reuse
    pub fn finalize_reset(&mut self) -> Vec<u8> {
        self.inner.finalize_reset().into_vec()
    }
}

/// One-shot digest over a sequence of slices
pub fn digest(algorithm: HashAlgorithm, parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Hasher::new(algorithm);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

/// HKDF extract-and-expand over the selected digest
pub fn hkdf(
    algorithm: HashAlgorithm,
    salt: &[u8],
    ikm: &[u8],
    info: &[u8],
    okm: &mut [u8],
) -> Result<(), hkdf::InvalidLength> {
    with_digest!(algorithm, D => hkdf::SimpleHkdf::<D>::new(Some(salt), ikm).expand(info, okm))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [HashAlgorithm; 13] = [
        HashAlgorithm::Sha2_224,
        HashAlgorithm::Sha2_256,
        HashAlgorithm::Sha2_384,
        HashAlgorithm::Sha2_512,
        HashAlgorithm::Sha3_224,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Sha3_384,
        HashAlgorithm::Sha3_512,
        HashAlgorithm::Blake2b224,
        HashAlgorithm::Blake2b256,
        HashAlgorithm::Blake2b384,
        HashAlgorithm::Blake2b512,
        HashAlgorithm::Whirlpool,
    ];

    fn length_of(alg: HashAlgorithm) -> DigestLength {
        match alg.output_size() {
            28 => DigestLength::Bits224,
            32 => DigestLength::Bits256,
            48 => DigestLength::Bits384,
            _ => DigestLength::Bits512,
        }
    }

    #[test]
    fn test_known_digests() {
        let sha256 = digest(HashAlgorithm::Sha2_256, &[b"abc"]);
        assert_eq!(&sha256[..4], &[0xba, 0x78, 0x16, 0xbf]);

        let sha3 = digest(HashAlgorithm::Sha3_256, &[b"abc"]);
        assert_eq!(&sha3[..4], &[0x3a, 0x98, 0x5d, 0xa7]);
    }

    #[test]
    fn test_output_sizes_match() {
        for alg in ALL {
            assert_eq!(digest(alg, &[b"x"]).len(), alg.output_size(), "{}", alg);
        }
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = Hasher::new(HashAlgorithm::Blake2b256);
        hasher.update(b"hello ");
        hasher.update(b"world");
        let reset = hasher.finalize_reset();
        assert_eq!(reset, digest(HashAlgorithm::Blake2b256, &[b"hello world"]));

        hasher.update(b"hello world");
        assert_eq!(hasher.finalize(), reset);
    }

    #[test]
    fn test_family_resolution() {
        assert_eq!(
            HashAlgorithm::from_family(HashFamily::Sha3, DigestLength::Bits384),
            Some(HashAlgorithm::Sha3_384)
        );
        assert_eq!(
            HashAlgorithm::from_family(HashFamily::SchemeDefault, DigestLength::Bits256),
            None
        );
        assert_eq!(
            HashAlgorithm::from_family(HashFamily::Whirlpool, DigestLength::Bits256),
            None
        );
        for alg in ALL {
            assert_ne!(alg.family(), HashFamily::SchemeDefault);
            assert_eq!(HashAlgorithm::from_family(alg.family(), length_of(alg)), Some(alg));
        }
    }

    #[test]
    fn test_hkdf_all_algorithms() {
        for alg in ALL {
            let mut a = [0u8; 32];
            let mut b = [0u8; 32];
            hkdf(alg, b"salt", b"secret", b"info", &mut a).unwrap();
            hkdf(alg, b"salt", b"secret", b"other", &mut b).unwrap();
            assert_ne!(a, b, "{}", alg);
        }
    }
}
