/*!
Scheme backends.

A context drives its scheme through the `Scheme` trait. Backends only see
raw key bytes in the scheme's canonical encoding; key slots, coding and
error recording stay with the context.
*/

pub mod dilithium;
pub mod kyber;
pub mod kyber_hybrid;

use std::fmt;

use zeroize::Zeroizing;

use crate::core::crypto::hash::HashAlgorithm;
use crate::core::crypto::keys::RawKeyPair;
use crate::core::crypto::registry::{SchemeDescriptor, SchemeId};
use crate::core::csprng::{Csprng, CsprngRng};
use crate::core::error::SchemeError;
use crate::core::flags::{
    FeatureConfig, GaussianSampler, ReductionStrategy, SamplePrecision, SideChannelConfig,
    ThreadingFlags,
};

pub use dilithium::DilithiumScheme;
pub use kyber::{KyberKem, KyberVariant};
pub use kyber_hybrid::KyberHybrid;

/// Operations a context can request from a scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Keygen,
    Sign,
    Verify,
    Encrypt,
    Decrypt,
    Encapsulate,
    Decapsulate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Keygen => write!(f, "key generation"),
            Operation::Sign => write!(f, "signing"),
            Operation::Verify => write!(f, "verification"),
            Operation::Encrypt => write!(f, "encryption"),
            Operation::Decrypt => write!(f, "decryption"),
            Operation::Encapsulate => write!(f, "encapsulation"),
            Operation::Decapsulate => write!(f, "decapsulation"),
        }
    }
}

/// Settings handed to a backend at instantiation.
///
/// Fields the flags left at their defaults are filled in from the
/// scheme's descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemeConfig {
    pub param_set: u32,
    pub hash: HashAlgorithm,
    /// `None` for schemes without Gaussian sampling
    pub sampler: Option<GaussianSampler>,
    pub reduction: ReductionStrategy,
    pub sample_precision: SamplePrecision,
    pub sample_blinding: bool,
    pub threading: ThreadingFlags,
    pub side_channel: SideChannelConfig,
}

impl SchemeConfig {
    pub fn new(features: &FeatureConfig, descriptor: &SchemeDescriptor, param_set: u32) -> Self {
        Self {
            param_set,
            hash: features.hash.algorithm(descriptor.default_hash),
            sampler: features.sampler.or(descriptor.default_sampler),
            reduction: features.reduction.unwrap_or(descriptor.default_reduction),
            sample_precision: features.sample_precision,
            sample_blinding: features.sample_blinding,
            threading: features.threading,
            side_channel: features.side_channel,
        }
    }
}

/// Run a lattice backend call that draws from the context generator.
///
/// A generator failure wins over the backend's own error string, which
/// is reduced to `SchemeError::Failed`.
pub(crate) fn drive<T>(
    csprng: &mut Csprng,
    op: impl FnOnce(&mut CsprngRng<'_>) -> Result<T, &'static str>,
) -> Result<T, SchemeError> {
    let mut rng = CsprngRng::new(csprng);
    let result = op(&mut rng);
    rng.finish()?;
    result.map_err(|_| SchemeError::Failed)
}

/// A KEM ciphertext and the secret it carries
pub struct Encapsulation {
    pub ciphertext: Vec<u8>,
    pub shared_secret: Zeroizing<Vec<u8>>,
}

/// Scheme-internal state owned by a context.
///
/// Operations a scheme does not offer keep the default body and report
/// `SchemeError::Unsupported`.
pub trait Scheme: Send {
    fn id(&self) -> SchemeId;

    /// Generate a fresh key pair
    fn keygen(&mut self, rng: &mut Csprng) -> Result<RawKeyPair, SchemeError>;

    fn sign(
        &mut self,
        _rng: &mut Csprng,
        _private_key: &[u8],
        _message: &[u8],
    ) -> Result<Vec<u8>, SchemeError> {
        Err(SchemeError::Unsupported(Operation::Sign))
    }

    /// `Ok(false)` for a signature that does not verify
    fn verify(
        &mut self,
        _public_key: &[u8],
        _message: &[u8],
        _signature: &[u8],
    ) -> Result<bool, SchemeError> {
        Err(SchemeError::Unsupported(Operation::Verify))
    }

    fn encrypt(
        &mut self,
        _rng: &mut Csprng,
        _public_key: &[u8],
        _plaintext: &[u8],
    ) -> Result<Vec<u8>, SchemeError> {
        Err(SchemeError::Unsupported(Operation::Encrypt))
    }

    fn decrypt(
        &mut self,
        _private_key: &[u8],
        _ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, SchemeError> {
        Err(SchemeError::Unsupported(Operation::Decrypt))
    }

    fn encapsulate(
        &mut self,
        _rng: &mut Csprng,
        _public_key: &[u8],
    ) -> Result<Encapsulation, SchemeError> {
        Err(SchemeError::Unsupported(Operation::Encapsulate))
    }

    fn decapsulate(
        &mut self,
        _private_key: &[u8],
        _ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, SchemeError> {
        Err(SchemeError::Unsupported(Operation::Decapsulate))
    }
}
