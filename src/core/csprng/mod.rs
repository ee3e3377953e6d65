/*!
CSPRNG selection and construction.

Flag word 1 names a generator algorithm and an entropy source. `select`
turns that word into a `CsprngRequest`; `Csprng::construct` seeds the
generator from the source and wraps it so that it reseeds itself after
every `SEED_PERIOD` bytes of output.
*/

mod drbg;
mod legacy;
mod stream;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use rand::TryRngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::core::constants::{csprng::SEED_BYTES, csprng::SEED_PERIOD, word1};
use crate::core::crypto::hash::HashAlgorithm;
use crate::core::error::{CsprngError, FlagError};

pub use drbg::{CtrDrbg, HashDrbg};
pub use legacy::{Isaac64, Kiss64};
pub use stream::{AesCtrGenerator, ChaChaGenerator, SalsaGenerator};

/// Generator algorithms the engine can construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CsprngAlgorithm {
    /// Operating system generator, no local state
    #[default]
    System,
    AesCtrDrbg,
    AesCtr,
    Isaac,
    Salsa20,
    ChaCha20,
    Kiss,
    HashDrbg(HashAlgorithm),
}

impl CsprngAlgorithm {
    /// ISAAC and KISS are statistical generators only
    pub fn is_cryptographic(&self) -> bool {
        !matches!(self, CsprngAlgorithm::Isaac | CsprngAlgorithm::Kiss)
    }
}

impl fmt::Display for CsprngAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsprngAlgorithm::System => write!(f, "system"),
            CsprngAlgorithm::AesCtrDrbg => write!(f, "AES-256 CTR_DRBG"),
            CsprngAlgorithm::AesCtr => write!(f, "AES-256-CTR"),
            CsprngAlgorithm::Isaac => write!(f, "ISAAC-64"),
            CsprngAlgorithm::Salsa20 => write!(f, "Salsa20"),
            CsprngAlgorithm::ChaCha20 => write!(f, "ChaCha20"),
            CsprngAlgorithm::Kiss => write!(f, "KISS-64"),
            CsprngAlgorithm::HashDrbg(alg) => write!(f, "Hash_DRBG({})", alg),
        }
    }
}

/// Where seed material comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntropySource {
    DevRandom,
    DevUrandom,
    #[default]
    Os,
    /// The process-wide callback installed with `set_entropy_callback`
    Callback,
}

/// A resolved generator construction request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsprngRequest {
    pub algorithm: CsprngAlgorithm,
    pub source: EntropySource,
    /// Output bytes between reseeds; zero disables reseeding
    pub seed_period: usize,
}

impl Default for CsprngRequest {
    fn default() -> Self {
        Self {
            algorithm: CsprngAlgorithm::default(),
            source: EntropySource::default(),
            seed_period: SEED_PERIOD,
        }
    }
}

// Highest priority first
const ALGORITHM_PRIORITY: [(u32, CsprngAlgorithm); 13] = [
    (word1::AES_CTR_DRBG, CsprngAlgorithm::AesCtrDrbg),
    (word1::AES_CTR, CsprngAlgorithm::AesCtr),
    (word1::ISAAC, CsprngAlgorithm::Isaac),
    (word1::SALSA, CsprngAlgorithm::Salsa20),
    (word1::CHACHA, CsprngAlgorithm::ChaCha20),
    (word1::KISS, CsprngAlgorithm::Kiss),
    (word1::HASH_DRBG_SHA3_512, CsprngAlgorithm::HashDrbg(HashAlgorithm::Sha3_512)),
    (word1::HASH_DRBG_SHA3_256, CsprngAlgorithm::HashDrbg(HashAlgorithm::Sha3_256)),
    (word1::HASH_DRBG_SHA2_512, CsprngAlgorithm::HashDrbg(HashAlgorithm::Sha2_512)),
    (word1::HASH_DRBG_SHA2_256, CsprngAlgorithm::HashDrbg(HashAlgorithm::Sha2_256)),
    (word1::HASH_DRBG_BLAKE2_512, CsprngAlgorithm::HashDrbg(HashAlgorithm::Blake2b512)),
    (word1::HASH_DRBG_BLAKE2_256, CsprngAlgorithm::HashDrbg(HashAlgorithm::Blake2b256)),
    (word1::HASH_DRBG_WHIRLPOOL_512, CsprngAlgorithm::HashDrbg(HashAlgorithm::Whirlpool)),
];

const SOURCE_PRIORITY: [(u32, EntropySource); 4] = [
    (word1::ENTROPY_DEV_RANDOM, EntropySource::DevRandom),
    (word1::ENTROPY_DEV_URANDOM, EntropySource::DevUrandom),
    (word1::ENTROPY_OS, EntropySource::Os),
    (word1::ENTROPY_CALLBACK, EntropySource::Callback),
];

/// Map flag word 1 to a construction request
pub fn select(word: u32) -> Result<CsprngRequest, FlagError> {
    let reserved = word & !word1::DEFINED;
    if reserved != 0 {
        return Err(FlagError::ReservedBits { word: 1, bits: reserved });
    }

    let algorithm = ALGORITHM_PRIORITY
        .iter()
        .find(|(bit, _)| word & bit != 0)
        .map(|&(_, alg)| alg)
        .unwrap_or_default();

    let source = SOURCE_PRIORITY
        .iter()
        .find(|(bit, _)| word & bit != 0)
        .map(|&(_, src)| src)
        .unwrap_or_default();

    Ok(CsprngRequest {
        algorithm,
        source,
        seed_period: SEED_PERIOD,
    })
}

/// User-supplied entropy; returns false if it could not fill the buffer
pub type EntropyCallback = Arc<dyn Fn(&mut [u8]) -> bool + Send + Sync>;

// Global entropy callback
static ENTROPY_CALLBACK: Lazy<RwLock<Option<EntropyCallback>>> = Lazy::new(|| RwLock::new(None));

/// Install the process-wide entropy callback
pub fn set_entropy_callback<F>(callback: F)
where
    F: Fn(&mut [u8]) -> bool + Send + Sync + 'static,
{
    let mut slot = ENTROPY_CALLBACK.write().unwrap_or_else(PoisonError::into_inner);
    *slot = Some(Arc::new(callback));
}

/// Remove the process-wide entropy callback
pub fn clear_entropy_callback() {
    let mut slot = ENTROPY_CALLBACK.write().unwrap_or_else(PoisonError::into_inner);
    *slot = None;
}

/// Fill `buf` from an entropy source
pub fn gather_entropy(source: EntropySource, buf: &mut [u8]) -> Result<(), CsprngError> {
    match source {
        EntropySource::DevRandom => File::open("/dev/random")?.read_exact(buf)?,
        EntropySource::DevUrandom => File::open("/dev/urandom")?.read_exact(buf)?,
        EntropySource::Os => OsRng
            .try_fill_bytes(buf)
            .map_err(|e| CsprngError::Os(e.to_string()))?,
        EntropySource::Callback => {
            let callback = ENTROPY_CALLBACK
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .ok_or(CsprngError::NoCallback)?;
            if !callback(buf) {
                return Err(CsprngError::Callback);
            }
        }
    }
    Ok(())
}

/// A seeded generator
pub trait Generator: Send {
    fn algorithm(&self) -> CsprngAlgorithm;

    /// Fill `out` with generator output
    fn generate(&mut self, out: &mut [u8]) -> Result<(), CsprngError>;

    /// Mix fresh entropy into the generator state
    fn reseed(&mut self, entropy: &[u8]);
}

/// The operating system generator
struct SystemGenerator;

impl Generator for SystemGenerator {
    fn algorithm(&self) -> CsprngAlgorithm {
        CsprngAlgorithm::System
    }

    fn generate(&mut self, out: &mut [u8]) -> Result<(), CsprngError> {
        OsRng
            .try_fill_bytes(out)
            .map_err(|e| CsprngError::Os(e.to_string()))
    }

    fn reseed(&mut self, _entropy: &[u8]) {}
}

/// A context-owned generator with periodic reseeding
pub struct Csprng {
    generator: Box<dyn Generator>,
    source: EntropySource,
    seed_period: usize,
    since_reseed: usize,
    reseeds: u64,
}

impl Csprng {
    /// Seed and build the requested generator
    pub fn construct(request: &CsprngRequest) -> Result<Self, CsprngError> {
        let mut seed = Zeroizing::new([0u8; SEED_BYTES]);
        gather_entropy(request.source, &mut seed[..])?;

        let generator: Box<dyn Generator> = match request.algorithm {
            CsprngAlgorithm::System => Box::new(SystemGenerator),
            CsprngAlgorithm::AesCtrDrbg => Box::new(CtrDrbg::new(&seed[..])),
            CsprngAlgorithm::AesCtr => Box::new(AesCtrGenerator::new(&seed[..])),
            CsprngAlgorithm::Isaac => Box::new(Isaac64::new(&seed[..])),
            CsprngAlgorithm::Salsa20 => Box::new(SalsaGenerator::new(&seed[..])),
            CsprngAlgorithm::ChaCha20 => Box::new(ChaChaGenerator::new(&seed[..])),
            CsprngAlgorithm::Kiss => Box::new(Kiss64::new(&seed[..])),
            CsprngAlgorithm::HashDrbg(alg) => Box::new(HashDrbg::new(alg, &seed[..])),
        };

        Ok(Self {
            generator,
            source: request.source,
            seed_period: if request.seed_period == 0 {
                usize::MAX
            } else {
                request.seed_period
            },
            since_reseed: 0,
            reseeds: 0,
        })
    }

    pub fn algorithm(&self) -> CsprngAlgorithm {
        self.generator.algorithm()
    }

    pub fn source(&self) -> EntropySource {
        self.source
    }

    /// Number of reseeds performed since construction
    pub fn reseed_count(&self) -> u64 {
        self.reseeds
    }

    /// Fill `out`, reseeding whenever the seed period elapses
    pub fn fill(&mut self, out: &mut [u8]) -> Result<(), CsprngError> {
        let mut offset = 0;
        while offset < out.len() {
            if self.since_reseed >= self.seed_period {
                self.reseed()?;
            }
            let take = (out.len() - offset).min(self.seed_period - self.since_reseed);
            self.generator.generate(&mut out[offset..offset + take])?;
            self.since_reseed += take;
            offset += take;
        }
        Ok(())
    }

    /// Return `n` fresh bytes
    pub fn next_bytes(&mut self, n: usize) -> Result<Vec<u8>, CsprngError> {
        let mut out = vec![0u8; n];
        self.fill(&mut out)?;
        Ok(out)
    }

    /// Draw fresh seed material from the entropy source
    pub fn reseed(&mut self) -> Result<(), CsprngError> {
        let mut seed = Zeroizing::new([0u8; SEED_BYTES]);
        gather_entropy(self.source, &mut seed[..])?;
        self.generator.reseed(&seed[..]);
        self.since_reseed = 0;
        self.reseeds += 1;
        Ok(())
    }
}

impl fmt::Debug for Csprng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Csprng")
            .field("algorithm", &self.algorithm())
            .field("source", &self.source)
            .field("reseeds", &self.reseeds)
            .finish()
    }
}

/// A `Csprng` borrowed as a `rand_core` generator.
///
/// Lattice backends draw their seeds and per-operation randomness through
/// this wrapper. `RngCore::fill_bytes` has no error channel, so the first
/// generator failure is held and handed back by `finish`; the buffer is
/// zeroed and later draws are refused.
pub struct CsprngRng<'a> {
    csprng: &'a mut Csprng,
    failure: Option<CsprngError>,
}

impl<'a> CsprngRng<'a> {
    pub fn new(csprng: &'a mut Csprng) -> Self {
        Self {
            csprng,
            failure: None,
        }
    }

    /// Report a failure raised while the wrapper was in use
    pub fn finish(self) -> Result<(), CsprngError> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn draw(&mut self, dest: &mut [u8]) -> bool {
        if self.failure.is_none() {
            match self.csprng.fill(dest) {
                Ok(()) => return true,
                Err(error) => self.failure = Some(error),
            }
        }
        dest.fill(0);
        false
    }
}

impl rand_core::RngCore for CsprngRng<'_> {
    fn next_u32(&mut self) -> u32 {
        let mut b = [0u8; 4];
        self.draw(&mut b);
        u32::from_le_bytes(b)
    }

    fn next_u64(&mut self) -> u64 {
        let mut b = [0u8; 8];
        self.draw(&mut b);
        u64::from_le_bytes(b)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draw(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        if self.draw(dest) {
            Ok(())
        } else {
            Err(rand_core::Error::new("context CSPRNG failed"))
        }
    }
}

impl rand_core::CryptoRng for CsprngRng<'_> {}
