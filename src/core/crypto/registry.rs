/*!
Registry of cryptographic schemes.

Maps a scheme identifier and parameter set index to the scheme's
descriptor (sizes, capabilities, defaults) and to the factory that
instantiates its internal state. The registry is process-wide; backends
can be installed or replaced at runtime with `register_scheme`.
*/

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::core::crypto::hash::HashAlgorithm;
use crate::core::crypto::schemes::{
    DilithiumScheme, KyberHybrid, KyberKem, Operation, Scheme, SchemeConfig, dilithium, kyber,
    kyber_hybrid,
};
use crate::core::error::{ConfigError, SchemeError};
use crate::core::flags::{GaussianSampler, ReductionStrategy};

/// Scheme identifiers, numbered as on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SchemeId {
    SigHelloWorld = 1,
    SigBliss = 2,
    SigRingTesla = 3,
    EncRlwe = 4,
    KemEns = 5,
    SigEns = 6,
    SigEnsWithRecovery = 7,
    IbeDlp = 8,
    SigDlp = 9,
    SigDlpWithRecovery = 10,
    SigDilithium = 11,
    SigDilithiumG = 12,
    KemKyber = 13,
    EncKyberCpa = 14,
    EncKyberHybrid = 15,
    DhEcdh = 16,
    SigEcdsa = 17,
}

impl SchemeId {
    pub const ALL: [SchemeId; 17] = [
        SchemeId::SigHelloWorld,
        SchemeId::SigBliss,
        SchemeId::SigRingTesla,
        SchemeId::EncRlwe,
        SchemeId::KemEns,
        SchemeId::SigEns,
        SchemeId::SigEnsWithRecovery,
        SchemeId::IbeDlp,
        SchemeId::SigDlp,
        SchemeId::SigDlpWithRecovery,
        SchemeId::SigDilithium,
        SchemeId::SigDilithiumG,
        SchemeId::KemKyber,
        SchemeId::EncKyberCpa,
        SchemeId::EncKyberHybrid,
        SchemeId::DhEcdh,
        SchemeId::SigEcdsa,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SchemeId::SigHelloWorld => "Hello World",
            SchemeId::SigBliss => "BLISS-B",
            SchemeId::SigRingTesla => "Ring-TESLA",
            SchemeId::EncRlwe => "RLWE Encryption",
            SchemeId::KemEns => "ENS KEM",
            SchemeId::SigEns => "ENS Signature",
            SchemeId::SigEnsWithRecovery => "ENS Signature with Recovery",
            SchemeId::IbeDlp => "DLP IBE",
            SchemeId::SigDlp => "DLP Signature",
            SchemeId::SigDlpWithRecovery => "DLP Signature with Recovery",
            SchemeId::SigDilithium => "Dilithium",
            SchemeId::SigDilithiumG => "Dilithium-G",
            SchemeId::KemKyber => "Kyber KEM",
            SchemeId::EncKyberCpa => "Kyber CPA Encryption",
            SchemeId::EncKyberHybrid => "Kyber Hybrid Encryption",
            SchemeId::DhEcdh => "ECDH",
            SchemeId::SigEcdsa => "ECDSA",
        }
    }

    pub fn family(&self) -> SchemeFamily {
        match self {
            SchemeId::SigHelloWorld
            | SchemeId::SigBliss
            | SchemeId::SigRingTesla
            | SchemeId::SigEns
            | SchemeId::SigEnsWithRecovery
            | SchemeId::SigDlp
            | SchemeId::SigDlpWithRecovery
            | SchemeId::SigDilithium
            | SchemeId::SigDilithiumG
            | SchemeId::SigEcdsa => SchemeFamily::Signature,
            SchemeId::EncRlwe | SchemeId::EncKyberCpa | SchemeId::EncKyberHybrid => {
                SchemeFamily::Encryption
            }
            SchemeId::KemEns | SchemeId::KemKyber => SchemeFamily::Kem,
            SchemeId::IbeDlp => SchemeFamily::IdentityBased,
            SchemeId::DhEcdh => SchemeFamily::KeyAgreement,
        }
    }
}

impl fmt::Display for SchemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for SchemeId {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SchemeId::ALL
            .iter()
            .copied()
            .find(|id| *id as u8 == value)
            .ok_or(ConfigError::UnknownScheme(value))
    }
}

/// Broad class of a scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeFamily {
    Signature,
    Encryption,
    Kem,
    IdentityBased,
    KeyAgreement,
}

/// Operations a scheme offers beyond key generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub sign: bool,
    pub verify: bool,
    pub encrypt: bool,
    pub decrypt: bool,
    pub encapsulate: bool,
    pub decapsulate: bool,
}

impl Capabilities {
    pub const SIGNATURE: Capabilities = Capabilities {
        sign: true,
        verify: true,
        encrypt: false,
        decrypt: false,
        encapsulate: false,
        decapsulate: false,
    };

    pub const ENCRYPTION: Capabilities = Capabilities {
        sign: false,
        verify: false,
        encrypt: true,
        decrypt: true,
        encapsulate: false,
        decapsulate: false,
    };

    pub const KEM: Capabilities = Capabilities {
        sign: false,
        verify: false,
        encrypt: false,
        decrypt: false,
        encapsulate: true,
        decapsulate: true,
    };

    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Keygen => true,
            Operation::Sign => self.sign,
            Operation::Verify => self.verify,
            Operation::Encrypt => self.encrypt,
            Operation::Decrypt => self.decrypt,
            Operation::Encapsulate => self.encapsulate,
            Operation::Decapsulate => self.decapsulate,
        }
    }
}

/// Sizes fixed by one parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSet {
    pub name: &'static str,
    pub public_key_bytes: usize,
    pub private_key_bytes: usize,
    /// Signature size, KEM ciphertext size, or ciphertext overhead
    pub output_bytes: usize,
}

/// Static description of a scheme backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeDescriptor {
    pub id: SchemeId,
    pub capabilities: Capabilities,
    /// Indexed by parameter set number
    pub parameter_sets: Vec<ParameterSet>,
    pub default_hash: HashAlgorithm,
    pub default_sampler: Option<GaussianSampler>,
    pub default_reduction: ReductionStrategy,
}

impl SchemeDescriptor {
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn family(&self) -> SchemeFamily {
        self.id.family()
    }

    pub fn parameter_set(&self, index: u32) -> Option<&ParameterSet> {
        self.parameter_sets.get(index as usize)
    }
}

/// Builds scheme state for a context
pub trait SchemeFactory: Send + Sync {
    fn descriptor(&self) -> SchemeDescriptor;

    fn instantiate(&self, config: &SchemeConfig) -> Result<Box<dyn Scheme>, SchemeError>;
}

/// Result of a successful lookup
#[derive(Clone)]
pub struct SchemeEntry {
    pub descriptor: SchemeDescriptor,
    pub parameter_set: ParameterSet,
    pub factory: Arc<dyn SchemeFactory>,
}

struct DilithiumFactory;

impl SchemeFactory for DilithiumFactory {
    fn descriptor(&self) -> SchemeDescriptor {
        SchemeDescriptor {
            id: SchemeId::SigDilithium,
            capabilities: Capabilities::SIGNATURE,
            parameter_sets: dilithium::parameter_sets(),
            default_hash: HashAlgorithm::Sha3_256,
            default_sampler: None,
            default_reduction: ReductionStrategy::Barrett,
        }
    }

    fn instantiate(&self, config: &SchemeConfig) -> Result<Box<dyn Scheme>, SchemeError> {
        Ok(Box::new(DilithiumScheme::new(config)?))
    }
}

struct KyberKemFactory;

impl SchemeFactory for KyberKemFactory {
    fn descriptor(&self) -> SchemeDescriptor {
        SchemeDescriptor {
            id: SchemeId::KemKyber,
            capabilities: Capabilities::KEM,
            parameter_sets: kyber::parameter_sets(),
            default_hash: HashAlgorithm::Sha3_256,
            default_sampler: None,
            default_reduction: ReductionStrategy::Barrett,
        }
    }

    fn instantiate(&self, config: &SchemeConfig) -> Result<Box<dyn Scheme>, SchemeError> {
        Ok(Box::new(KyberKem::new(config)?))
    }
}

struct KyberHybridFactory;

impl SchemeFactory for KyberHybridFactory {
    fn descriptor(&self) -> SchemeDescriptor {
        SchemeDescriptor {
            id: SchemeId::EncKyberHybrid,
            capabilities: Capabilities::ENCRYPTION,
            parameter_sets: kyber_hybrid::parameter_sets(),
            default_hash: HashAlgorithm::Sha3_256,
            default_sampler: None,
            default_reduction: ReductionStrategy::Barrett,
        }
    }

    fn instantiate(&self, config: &SchemeConfig) -> Result<Box<dyn Scheme>, SchemeError> {
        Ok(Box::new(KyberHybrid::new(config)?))
    }
}

/// Installed scheme backends
pub struct SchemeRegistry {
    schemes: HashMap<SchemeId, (SchemeDescriptor, Arc<dyn SchemeFactory>)>,
}

impl SchemeRegistry {
    /// Create a registry holding the built-in backends
    pub fn new() -> Self {
        let mut registry = Self {
            schemes: HashMap::new(),
        };

        registry.register(Arc::new(DilithiumFactory));
        registry.register(Arc::new(KyberKemFactory));
        registry.register(Arc::new(KyberHybridFactory));

        registry
    }

    /// Install a backend, returning the one it replaces
    pub fn register(&mut self, factory: Arc<dyn SchemeFactory>) -> Option<Arc<dyn SchemeFactory>> {
        let descriptor = factory.descriptor();
        self.schemes
            .insert(descriptor.id, (descriptor, factory))
            .map(|(_, previous)| previous)
    }

    pub fn lookup(&self, id: SchemeId, param_set: u32) -> Result<SchemeEntry, ConfigError> {
        let (descriptor, factory) = self
            .schemes
            .get(&id)
            .ok_or(ConfigError::SchemeUnavailable(id))?;
        let parameter_set = *descriptor
            .parameter_set(param_set)
            .ok_or(ConfigError::UnknownParameterSet { scheme: id, param_set })?;

        Ok(SchemeEntry {
            descriptor: descriptor.clone(),
            parameter_set,
            factory: Arc::clone(factory),
        })
    }

    pub fn descriptor(&self, id: SchemeId) -> Option<SchemeDescriptor> {
        self.schemes.get(&id).map(|(descriptor, _)| descriptor.clone())
    }

    pub fn is_available(&self, id: SchemeId) -> bool {
        self.schemes.contains_key(&id)
    }

    /// Available schemes, in identifier order
    pub fn list(&self) -> Vec<SchemeId> {
        let mut ids: Vec<SchemeId> = self.schemes.keys().copied().collect();
        ids.sort();
        ids
    }

    fn list_family(&self, family: SchemeFamily) -> Vec<SchemeId> {
        self.list()
            .into_iter()
            .filter(|id| id.family() == family)
            .collect()
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Global registry instance
static REGISTRY: Lazy<RwLock<SchemeRegistry>> = Lazy::new(|| RwLock::new(SchemeRegistry::new()));

fn read_registry() -> std::sync::RwLockReadGuard<'static, SchemeRegistry> {
    REGISTRY.read().unwrap_or_else(PoisonError::into_inner)
}

/// Resolve a scheme and parameter set against the global registry
pub fn lookup(id: SchemeId, param_set: u32) -> Result<SchemeEntry, ConfigError> {
    read_registry().lookup(id, param_set)
}

/// Install or replace a scheme backend in the global registry.
///
/// Returns true when an existing backend for the same identifier was
/// replaced.
pub fn register_scheme<F>(factory: F) -> bool
where
    F: SchemeFactory + 'static,
{
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    registry.register(Arc::new(factory)).is_some()
}

/// Descriptor of an available scheme
pub fn descriptor(id: SchemeId) -> Option<SchemeDescriptor> {
    read_registry().descriptor(id)
}

/// Whether a backend is installed for `id`
pub fn is_available(id: SchemeId) -> bool {
    read_registry().is_available(id)
}

/// List every available scheme
pub fn list_schemes() -> Vec<SchemeId> {
    read_registry().list()
}

/// List available signature schemes
pub fn signature_schemes() -> Vec<SchemeId> {
    read_registry().list_family(SchemeFamily::Signature)
}

/// List available public-key encryption schemes
pub fn encryption_schemes() -> Vec<SchemeId> {
    read_registry().list_family(SchemeFamily::Encryption)
}

/// List available key encapsulation schemes
pub fn kem_schemes() -> Vec<SchemeId> {
    read_registry().list_family(SchemeFamily::Kem)
}
