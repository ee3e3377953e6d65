/*!
Crypto context for the PQC engine.

A `CryptoContext` owns everything one caller needs to use a scheme: the
resolved feature configuration, a CSPRNG, the scheme's internal state,
the public and private key slots and a private error stack.

Every operation returns a `Result`. A failing operation also pushes
exactly one record onto the context's error stack, carrying the source
location where the failure was detected, so a caller can drain the
stack later for diagnostics.
*/

mod padding;
mod state;
mod stats;

use std::fmt;
use std::panic::Location;

use log::Level;
use zeroize::Zeroizing;

use crate::core::coding::{self, KeyCoding};
use crate::core::crypto::keys::{KeyClass, KeyMaterial};
use crate::core::crypto::registry::{self, ParameterSet, SchemeDescriptor, SchemeId};
use crate::core::crypto::schemes::{Operation, Scheme, SchemeConfig};
use crate::core::csprng::{Csprng, CsprngAlgorithm};
use crate::core::error::{
    ConfigError, DecodeError, Error, ErrorCode, KeyStateError, KeygenError, Result, SchemeError,
};
use crate::core::error_stack::{ErrorRecord, ErrorStack};
use crate::core::flags::{self, FeatureConfig};

pub use padding::Padding;
pub use state::ContextState;
pub use stats::Statistics;

const LOG_TARGET: &str = "pqc_engine";

/// Diagnostic verbosity; each level includes the ones before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum DebugLevel {
    #[default]
    None,
    Error,
    Warning,
    Info,
    Debug,
}

impl DebugLevel {
    /// Whether a `log` record at `level` is emitted
    pub fn enables(&self, level: Level) -> bool {
        let required = match level {
            Level::Error => DebugLevel::Error,
            Level::Warn => DebugLevel::Warning,
            Level::Info => DebugLevel::Info,
            Level::Debug | Level::Trace => DebugLevel::Debug,
        };
        *self >= required
    }
}

/// An error together with where it was detected
struct Fault {
    error: Error,
    location: &'static Location<'static>,
}

impl<E: Into<Error>> From<E> for Fault {
    #[track_caller]
    fn from(error: E) -> Self {
        Fault {
            error: error.into(),
            location: Location::caller(),
        }
    }
}

type OpResult<T> = std::result::Result<T, Fault>;

/// Map a backend failure without revealing why an operation failed
fn operation_error(scheme: SchemeId, error: SchemeError) -> Error {
    match error {
        SchemeError::Unsupported(operation) => Error::Unsupported { scheme, operation },
        _ => Error::CryptoOp,
    }
}

/// Construction parameters for a `CryptoContext`
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    scheme: SchemeId,
    param_set: u32,
    flags: Vec<u32>,
    debug_level: DebugLevel,
    key_coding: (KeyCoding, KeyCoding),
    signature_coding: Option<KeyCoding>,
}

impl ContextBuilder {
    pub fn new(scheme: SchemeId, param_set: u32) -> Self {
        Self {
            scheme,
            param_set,
            flags: Vec::new(),
            debug_level: DebugLevel::default(),
            key_coding: (KeyCoding::None, KeyCoding::None),
            signature_coding: None,
        }
    }

    /// Feature flag words; an empty set selects every default
    pub fn flags(mut self, flags: &[u32]) -> Self {
        self.flags = flags.to_vec();
        self
    }

    pub fn debug_level(mut self, level: DebugLevel) -> Self {
        self.debug_level = level;
        self
    }

    /// Initial key codings for the public and private slots
    pub fn key_coding(mut self, public: KeyCoding, private: KeyCoding) -> Self {
        self.key_coding = (public, private);
        self
    }

    /// Override the signature coding selected by the entropy flags
    pub fn signature_coding(mut self, coding: KeyCoding) -> Self {
        self.signature_coding = Some(coding);
        self
    }

    /// Resolve flags, look up the scheme, attach a CSPRNG and instantiate
    /// the scheme, in that order. Nothing is allocated on failure.
    pub fn build(self) -> Result<CryptoContext> {
        let debug_level = self.debug_level;
        self.try_build().map_err(|error| {
            if debug_level.enables(Level::Error) {
                log::error!(target: LOG_TARGET, "context creation failed: {}", error);
            }
            Error::Config(error)
        })
    }

    fn try_build(self) -> std::result::Result<CryptoContext, ConfigError> {
        let features = flags::resolve(&self.flags)?;
        let entry = registry::lookup(self.scheme, self.param_set)?;
        let scheme_config = SchemeConfig::new(&features, &entry.descriptor, self.param_set);
        let csprng = Csprng::construct(&features.csprng)?;
        let scheme = entry
            .factory
            .instantiate(&scheme_config)
            .map_err(ConfigError::Scheme)?;

        let context = CryptoContext {
            scheme_id: self.scheme,
            param_set: self.param_set,
            signature_coding: self
                .signature_coding
                .unwrap_or_else(|| features.signature_coding()),
            features,
            descriptor: entry.descriptor,
            parameter_set: entry.parameter_set,
            scheme_config,
            csprng: Some(csprng),
            scheme: Some(scheme),
            public_key: None,
            private_key: None,
            public_coding: self.key_coding.0,
            private_coding: self.key_coding.1,
            errors: ErrorStack::new(),
            debug_level: self.debug_level,
            stats: Statistics::default(),
            destroyed: false,
        };

        context.log(
            Level::Info,
            format_args!(
                "created {} context ({}), {}",
                context.scheme_id, context.parameter_set.name, context.features
            ),
        );
        let request = context.features.csprng;
        if !request.algorithm.is_cryptographic() {
            context.log(
                Level::Warn,
                format_args!(
                    "{} is a statistical generator, not a cryptographic one",
                    request.algorithm
                ),
            );
        }
        context.log(
            Level::Debug,
            format_args!(
                "constructed {} CSPRNG seeded from {:?}",
                request.algorithm, request.source
            ),
        );
        let threading = context.scheme_config.threading;
        if threading.keygen || threading.encrypt_sign || threading.decrypt_verify {
            context.log(
                Level::Debug,
                format_args!("threading requested; {} runs single-threaded", context.scheme_id),
            );
        }
        Ok(context)
    }
}

/// An owned handle to one configured scheme instance
pub struct CryptoContext {
    scheme_id: SchemeId,
    param_set: u32,
    features: FeatureConfig,
    descriptor: SchemeDescriptor,
    parameter_set: ParameterSet,
    scheme_config: SchemeConfig,
    csprng: Option<Csprng>,
    scheme: Option<Box<dyn Scheme>>,
    public_key: Option<KeyMaterial>,
    private_key: Option<KeyMaterial>,
    public_coding: KeyCoding,
    private_coding: KeyCoding,
    signature_coding: KeyCoding,
    errors: ErrorStack,
    debug_level: DebugLevel,
    stats: Statistics,
    destroyed: bool,
}

// Borrow the CSPRNG and scheme of a live context
#[track_caller]
fn live<'a>(
    csprng: &'a mut Option<Csprng>,
    scheme: &'a mut Option<Box<dyn Scheme>>,
) -> OpResult<(&'a mut Csprng, &'a mut Box<dyn Scheme>)> {
    match (csprng.as_mut(), scheme.as_mut()) {
        (Some(csprng), Some(scheme)) => Ok((csprng, scheme)),
        _ => Err(Fault::from(Error::Destroyed)),
    }
}

impl CryptoContext {
    /// Create a context with the given flag words and default settings
    pub fn create(scheme: SchemeId, param_set: u32, flags: &[u32]) -> Result<Self> {
        ContextBuilder::new(scheme, param_set).flags(flags).build()
    }

    pub fn builder(scheme: SchemeId, param_set: u32) -> ContextBuilder {
        ContextBuilder::new(scheme, param_set)
    }

    pub fn scheme(&self) -> SchemeId {
        self.scheme_id
    }

    pub fn param_set(&self) -> u32 {
        self.param_set
    }

    pub fn features(&self) -> &FeatureConfig {
        &self.features
    }

    pub fn descriptor(&self) -> &SchemeDescriptor {
        &self.descriptor
    }

    pub fn parameter_set(&self) -> &ParameterSet {
        &self.parameter_set
    }

    /// Settings the scheme was instantiated with
    pub fn scheme_config(&self) -> &SchemeConfig {
        &self.scheme_config
    }

    /// Generator algorithm, `None` once destroyed
    pub fn csprng_algorithm(&self) -> Option<CsprngAlgorithm> {
        self.csprng.as_ref().map(Csprng::algorithm)
    }

    pub fn state(&self) -> ContextState {
        ContextState::derive(
            self.destroyed,
            self.public_key.is_some() || self.private_key.is_some(),
        )
    }

    pub fn has_key(&self, class: KeyClass) -> bool {
        match class {
            KeyClass::Public => self.public_key.is_some(),
            KeyClass::Private => self.private_key.is_some(),
        }
    }

    // Diagnostics

    pub fn debug_level(&self) -> DebugLevel {
        self.debug_level
    }

    pub fn set_debug_level(&mut self, level: DebugLevel) {
        self.debug_level = level;
    }

    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.debug_level.enables(level) {
            log::log!(target: LOG_TARGET, level, "{}", args);
        }
    }

    /// Push a failure onto the error stack and hand the error back
    fn settle<T>(&mut self, operation: &str, result: OpResult<T>) -> Result<T> {
        let Fault { error, location } = match result {
            Ok(value) => return Ok(value),
            Err(fault) => fault,
        };
        self.errors.push(error.code(), location.file(), location.line());
        self.log(
            Level::Error,
            format_args!(
                "{} failed: {} ({}:{})",
                operation,
                error,
                location.file(),
                location.line()
            ),
        );
        Err(error)
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Text summary of the operations performed so far
    pub fn processing_stats(&self) -> String {
        format!("{} [{}]\n{}", self.scheme_id, self.parameter_set.name, self.stats)
    }

    // Error stack

    /// Pop the oldest error record
    pub fn get_error(&mut self) -> Option<ErrorRecord> {
        self.errors.get_error()
    }

    /// The oldest error record, left in place
    pub fn peek_error(&self) -> Option<&ErrorRecord> {
        self.errors.peek_error()
    }

    pub fn get_error_line(&mut self) -> Option<(ErrorCode, &'static str, u32)> {
        self.errors.get_error_line()
    }

    pub fn peek_error_line(&self) -> Option<(ErrorCode, &'static str, u32)> {
        self.errors.peek_error_line()
    }

    pub fn clear_error(&mut self) {
        self.errors.clear_error();
    }

    pub fn errors(&self) -> &ErrorStack {
        &self.errors
    }

    // Key coding

    /// Select the coding for each key slot; allowed in any state
    pub fn set_key_coding(&mut self, public: KeyCoding, private: KeyCoding) {
        self.public_coding = public;
        self.private_coding = private;
        self.log(
            Level::Debug,
            format_args!("key coding set to {} / {}", public, private),
        );
    }

    /// Current `(public, private)` key coding
    pub fn key_coding(&self) -> (KeyCoding, KeyCoding) {
        (self.public_coding, self.private_coding)
    }

    pub fn set_signature_coding(&mut self, coding: KeyCoding) {
        self.signature_coding = coding;
    }

    pub fn signature_coding(&self) -> KeyCoding {
        self.signature_coding
    }

    #[track_caller]
    fn ensure_live(&self) -> OpResult<()> {
        if !self.state().is_live() {
            return Err(Fault::from(Error::Destroyed));
        }
        Ok(())
    }

    #[track_caller]
    fn ensure_supported(&self, operation: Operation) -> OpResult<()> {
        if !self.descriptor.capabilities.supports(operation) {
            return Err(Fault::from(Error::Unsupported {
                scheme: self.scheme_id,
                operation,
            }));
        }
        Ok(())
    }

    // Key generation

    /// Generate a fresh key pair, replacing both slots.
    ///
    /// The CSPRNG is reseeded from its entropy source first.
    pub fn keygen(&mut self) -> Result<()> {
        let result = self.try_keygen();
        self.settle("keygen", result)
    }

    fn try_keygen(&mut self) -> OpResult<()> {
        if !self.state().can_keygen() {
            return Err(Fault::from(Error::Destroyed));
        }
        let (csprng, scheme) = live(&mut self.csprng, &mut self.scheme)?;

        csprng.reseed().map_err(KeygenError::Entropy)?;
        let mut pair = scheme.keygen(csprng).map_err(KeygenError::Scheme)?;

        let private = std::mem::take(&mut *pair.private);
        self.public_key = Some(KeyMaterial::new(
            KeyClass::Public,
            self.scheme_id,
            self.param_set,
            pair.public,
        ));
        self.private_key = Some(KeyMaterial::new(
            KeyClass::Private,
            self.scheme_id,
            self.param_set,
            private,
        ));
        self.stats.keygens += 1;
        self.log(Level::Info, format_args!("generated {} key pair", self.parameter_set.name));
        Ok(())
    }

    // Key encoding and loading

    /// Serialize the public key under the public key coding
    pub fn public_key_encode(&mut self) -> Result<Vec<u8>> {
        let result = self.try_encode(KeyClass::Public);
        self.settle("public_key_encode", result)
    }

    /// Serialize the private key under the private key coding
    pub fn private_key_encode(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let result = self.try_encode(KeyClass::Private).map(Zeroizing::new);
        self.settle("private_key_encode", result)
    }

    fn try_encode(&mut self, class: KeyClass) -> OpResult<Vec<u8>> {
        self.ensure_live()?;
        let (slot, coding) = match class {
            KeyClass::Public => (&self.public_key, self.public_coding),
            KeyClass::Private => (&self.private_key, self.private_coding),
        };
        let key = slot.as_ref().ok_or(KeyStateError::Absent(class))?;

        let encoded = coding::encode_key(key, coding);
        self.stats.record_encode(class, key.len(), encoded.len());
        Ok(encoded)
    }

    /// Replace the public key with one decoded under the public key coding
    pub fn public_key_load(&mut self, bytes: &[u8]) -> Result<()> {
        let result = self.try_load(KeyClass::Public, bytes);
        self.settle("public_key_load", result)
    }

    /// Replace the private key with one decoded under the private key coding
    pub fn private_key_load(&mut self, bytes: &[u8]) -> Result<()> {
        let result = self.try_load(KeyClass::Private, bytes);
        self.settle("private_key_load", result)
    }

    fn try_load(&mut self, class: KeyClass, bytes: &[u8]) -> OpResult<()> {
        self.ensure_live()?;
        let (coding, expected_len) = match class {
            KeyClass::Public => (self.public_coding, self.parameter_set.public_key_bytes),
            KeyClass::Private => (self.private_coding, self.parameter_set.private_key_bytes),
        };

        let key = coding::decode_key(bytes, coding, class, self.scheme_id, self.param_set)?;
        if key.len() != expected_len {
            return Err(Fault::from(DecodeError::InvalidKey));
        }

        self.stats.record_load(class, key.len(), bytes.len());
        match class {
            KeyClass::Public => self.public_key = Some(key),
            KeyClass::Private => self.private_key = Some(key),
        }
        Ok(())
    }

    // Signatures

    /// Sign `message` with the private key; the result is entropy coded
    /// with the signature coding
    pub fn sign(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        let result = self.try_sign(message);
        self.settle("sign", result)
    }

    fn try_sign(&mut self, message: &[u8]) -> OpResult<Vec<u8>> {
        self.ensure_live()?;
        self.ensure_supported(Operation::Sign)?;
        let key = self
            .private_key
            .as_ref()
            .ok_or(KeyStateError::Absent(KeyClass::Private))?;
        let (csprng, scheme) = live(&mut self.csprng, &mut self.scheme)?;

        let signature = scheme
            .sign(csprng, key.as_bytes(), message)
            .map_err(|e| operation_error(self.scheme_id, e))?;

        self.stats.signatures += 1;
        Ok(coding::encode_signature(&signature, self.signature_coding))
    }

    /// Check `signature` over `message` with the public key.
    ///
    /// An invalid or malformed signature is `Ok(false)`, not an error.
    pub fn verify(&mut self, message: &[u8], signature: &[u8]) -> Result<bool> {
        let result = self.try_verify(message, signature);
        self.settle("verify", result)
    }

    fn try_verify(&mut self, message: &[u8], signature: &[u8]) -> OpResult<bool> {
        self.ensure_live()?;
        self.ensure_supported(Operation::Verify)?;
        let key = self
            .public_key
            .as_ref()
            .ok_or(KeyStateError::Absent(KeyClass::Public))?;
        let (_, scheme) = live(&mut self.csprng, &mut self.scheme)?;

        let valid = match coding::decode_signature(signature, self.signature_coding) {
            Ok(raw) => scheme
                .verify(key.as_bytes(), message, &raw)
                .map_err(|e| operation_error(self.scheme_id, e))?,
            Err(_) => false,
        };

        if valid {
            self.stats.verified += 1;
        } else {
            self.stats.unverified += 1;
            self.log(Level::Info, format_args!("signature rejected"));
        }
        Ok(valid)
    }

    // Public-key encryption

    /// Encrypt `input` to the public key
    pub fn public_encrypt(&mut self, input: &[u8], padding: Padding) -> Result<Vec<u8>> {
        let result = self.try_encrypt(input, padding);
        self.settle("public_encrypt", result)
    }

    fn try_encrypt(&mut self, input: &[u8], padding: Padding) -> OpResult<Vec<u8>> {
        self.ensure_live()?;
        self.ensure_supported(Operation::Encrypt)?;
        let key = self
            .public_key
            .as_ref()
            .ok_or(KeyStateError::Absent(KeyClass::Public))?;
        let (csprng, scheme) = live(&mut self.csprng, &mut self.scheme)?;

        let plaintext = padding.pad(input);
        let ciphertext = scheme
            .encrypt(csprng, key.as_bytes(), &plaintext)
            .map_err(|e| operation_error(self.scheme_id, e))?;

        self.stats.encryptions += 1;
        Ok(ciphertext)
    }

    /// Decrypt `ciphertext` with the private key.
    ///
    /// Integrity, length and padding failures are all `Error::CryptoOp`.
    pub fn private_decrypt(
        &mut self,
        ciphertext: &[u8],
        padding: Padding,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let result = self.try_decrypt(ciphertext, padding);
        self.settle("private_decrypt", result)
    }

    fn try_decrypt(&mut self, ciphertext: &[u8], padding: Padding) -> OpResult<Zeroizing<Vec<u8>>> {
        self.ensure_live()?;
        self.ensure_supported(Operation::Decrypt)?;
        let key = self
            .private_key
            .as_ref()
            .ok_or(KeyStateError::Absent(KeyClass::Private))?;
        let (_, scheme) = live(&mut self.csprng, &mut self.scheme)?;

        let padded = scheme
            .decrypt(key.as_bytes(), ciphertext)
            .map_err(|e| operation_error(self.scheme_id, e))?;
        let plaintext = padding.unpad(padded).ok_or(Error::CryptoOp)?;

        self.stats.decryptions += 1;
        Ok(plaintext)
    }

    // Key encapsulation

    /// Encapsulate a fresh shared secret to the public key.
    ///
    /// Returns the ciphertext and the shared secret.
    pub fn encapsulate(&mut self) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>)> {
        let result = self.try_encapsulate();
        self.settle("encapsulate", result)
    }

    fn try_encapsulate(&mut self) -> OpResult<(Vec<u8>, Zeroizing<Vec<u8>>)> {
        self.ensure_live()?;
        self.ensure_supported(Operation::Encapsulate)?;
        let key = self
            .public_key
            .as_ref()
            .ok_or(KeyStateError::Absent(KeyClass::Public))?;
        let (csprng, scheme) = live(&mut self.csprng, &mut self.scheme)?;

        let encapsulation = scheme
            .encapsulate(csprng, key.as_bytes())
            .map_err(|e| operation_error(self.scheme_id, e))?;

        self.stats.encapsulations += 1;
        Ok((encapsulation.ciphertext, encapsulation.shared_secret))
    }

    /// Recover the shared secret carried by `ciphertext`
    pub fn decapsulate(&mut self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let result = self.try_decapsulate(ciphertext);
        self.settle("decapsulate", result)
    }

    fn try_decapsulate(&mut self, ciphertext: &[u8]) -> OpResult<Zeroizing<Vec<u8>>> {
        self.ensure_live()?;
        self.ensure_supported(Operation::Decapsulate)?;
        let key = self
            .private_key
            .as_ref()
            .ok_or(KeyStateError::Absent(KeyClass::Private))?;
        let (_, scheme) = live(&mut self.csprng, &mut self.scheme)?;

        let shared_secret = scheme
            .decapsulate(key.as_bytes(), ciphertext)
            .map_err(|e| operation_error(self.scheme_id, e))?;

        self.stats.decapsulations += 1;
        Ok(shared_secret)
    }

    // Teardown

    /// Release key material, scheme state and the CSPRNG.
    ///
    /// Calling it again is a no-op. The error stack survives so that
    /// failures after destruction can still be inspected.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.public_key = None;
        self.private_key = None;
        self.scheme = None;
        self.csprng = None;
        self.destroyed = true;
        self.log(Level::Info, format_args!("{} context destroyed", self.scheme_id));
    }
}

impl Drop for CryptoContext {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for CryptoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoContext")
            .field("scheme", &self.scheme_id)
            .field("param_set", &self.param_set)
            .field("state", &self.state())
            .field("csprng", &self.csprng)
            .field("key_coding", &self.key_coding())
            .field("errors", &self.errors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::word0;
    use crate::core::error::FlagError;

    fn dilithium() -> CryptoContext {
        CryptoContext::create(SchemeId::SigDilithium, 0, &[]).unwrap()
    }

    #[test]
    fn test_debug_level_ordering() {
        assert!(DebugLevel::Debug.enables(Level::Error));
        assert!(DebugLevel::Warning.enables(Level::Warn));
        assert!(!DebugLevel::Warning.enables(Level::Info));
        assert!(!DebugLevel::None.enables(Level::Error));
    }

    #[test]
    fn test_fault_records_detection_site() {
        fn fails() -> OpResult<()> {
            let slot: Option<&KeyMaterial> = None;
            slot.ok_or(KeyStateError::Absent(KeyClass::Public))?;
            Ok(())
        }
        let expected = line!() - 3;

        let fault = fails().unwrap_err();
        assert_eq!(fault.location.file(), file!());
        assert_eq!(fault.location.line(), expected);
        assert_eq!(fault.error.code(), ErrorCode::KeyAbsent);
    }

    #[test]
    fn test_create_rejects_bad_flags() {
        let err = CryptoContext::create(SchemeId::SigDilithium, 0, &[4 << word0::REDUCTION_SHIFT])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::Flags(FlagError::InvalidField("reduction")))
        ));
    }

    #[test]
    fn test_create_rejects_unavailable_scheme() {
        let err = CryptoContext::create(SchemeId::SigBliss, 0, &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::SchemeUnavailable(SchemeId::SigBliss))
        ));
        assert_eq!(err.code(), ErrorCode::Config);
    }

    #[test]
    fn test_state_follows_key_slots() {
        let mut ctx = dilithium();
        assert_eq!(ctx.state(), ContextState::Initialized);

        ctx.keygen().unwrap();
        assert_eq!(ctx.state(), ContextState::KeyReady);
        assert!(ctx.has_key(KeyClass::Public));
        assert!(ctx.has_key(KeyClass::Private));

        ctx.destroy();
        assert_eq!(ctx.state(), ContextState::Destroyed);
        assert_eq!(ctx.csprng_algorithm(), None);
    }

    #[test]
    fn test_failure_pushes_one_record() {
        let mut ctx = dilithium();
        assert!(ctx.sign(b"message").is_err());
        assert_eq!(ctx.errors().len(), 1);

        let (code, file, _line) = ctx.peek_error_line().unwrap();
        assert_eq!(code, ErrorCode::KeyAbsent);
        assert!(file.ends_with("mod.rs"));

        assert!(ctx.public_key_load(&[1, 2, 3]).is_err());
        assert_eq!(ctx.errors().len(), 2);
        assert_eq!(ctx.get_error().unwrap().code, ErrorCode::KeyAbsent);
        assert_eq!(ctx.get_error().unwrap().code, ErrorCode::Decode);
        assert!(ctx.get_error().is_none());
    }

    #[test]
    fn test_load_rejects_wrong_size() {
        let mut ctx = dilithium();
        let bogus = KeyMaterial::new(KeyClass::Public, SchemeId::SigDilithium, 0, vec![0u8; 12]);
        let bytes = coding::encode_key(&bogus, KeyCoding::None);

        assert!(matches!(
            ctx.public_key_load(&bytes),
            Err(Error::Decode(DecodeError::InvalidKey))
        ));
        assert!(!ctx.has_key(KeyClass::Public));
    }

    #[test]
    fn test_operations_after_destroy() {
        let mut ctx = dilithium();
        ctx.keygen().unwrap();
        ctx.destroy();
        ctx.destroy();
        assert!(!ctx.state().is_live());
        assert!(!ctx.state().can_keygen());

        assert!(matches!(ctx.keygen(), Err(Error::Destroyed)));
        assert!(matches!(ctx.public_key_encode(), Err(Error::Destroyed)));
        assert!(matches!(ctx.verify(b"m", b"s"), Err(Error::Destroyed)));
        assert_eq!(ctx.errors().len(), 3);
        assert_eq!(ctx.peek_error().unwrap().code, ErrorCode::Destroyed);
    }

    #[test]
    fn test_unsupported_operation() {
        let mut ctx = dilithium();
        ctx.keygen().unwrap();
        assert!(matches!(
            ctx.public_encrypt(b"data", Padding::None),
            Err(Error::Unsupported {
                scheme: SchemeId::SigDilithium,
                operation: Operation::Encrypt
            })
        ));
        assert!(matches!(ctx.encapsulate(), Err(Error::Unsupported { .. })));
        assert_eq!(ctx.errors().len(), 2);
    }

    #[test]
    fn test_signature_coding_follows_flags() {
        let ctx = CryptoContext::create(SchemeId::SigDilithium, 0, &[word0::ENTROPY_BAC_RLE])
            .unwrap();
        assert_eq!(ctx.signature_coding(), KeyCoding::BacRle);

        let ctx = CryptoContext::builder(SchemeId::SigDilithium, 0)
            .flags(&[word0::ENTROPY_BAC_RLE])
            .signature_coding(KeyCoding::None)
            .key_coding(KeyCoding::Bac, KeyCoding::HuffmanStatic)
            .debug_level(DebugLevel::Warning)
            .build()
            .unwrap();
        assert_eq!(ctx.signature_coding(), KeyCoding::None);
        assert_eq!(ctx.key_coding(), (KeyCoding::Bac, KeyCoding::HuffmanStatic));
        assert_eq!(ctx.debug_level(), DebugLevel::Warning);
    }

    #[test]
    fn test_statistics_track_operations() {
        let mut ctx = dilithium();
        ctx.keygen().unwrap();
        let sig = ctx.sign(b"stats").unwrap();
        assert!(ctx.verify(b"stats", &sig).unwrap());
        assert!(!ctx.verify(b"other", &sig).unwrap());
        ctx.public_key_encode().unwrap();

        let stats = ctx.statistics();
        assert_eq!(stats.keygens, 1);
        assert_eq!(stats.signatures, 1);
        assert_eq!(stats.verified, 1);
        assert_eq!(stats.unverified, 1);
        assert_eq!(stats.public_keys_encoded, 1);
        assert!(ctx.processing_stats().starts_with("Dilithium [Dilithium2]"));
    }
}
