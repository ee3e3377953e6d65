/*!
Error handling for the PQC engine.

Every public operation returns a definite `Result`. Failures on a live
context are additionally recorded on that context's error stack, so the
types here carry only as much detail as is safe to hand to a caller.
Cryptographic failures in particular are reported generically.
*/

use std::fmt;
use thiserror::Error;

use crate::core::coding::KeyCoding;
use crate::core::crypto::keys::KeyClass;
use crate::core::crypto::registry::SchemeId;
use crate::core::crypto::schemes::Operation;

/// Result type for the PQC engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the PQC engine
#[derive(Error, Debug)]
pub enum Error {
    /// Bad flags, scheme or parameter set. Fatal to context construction.
    #[error("Configuration rejected: {0}")]
    Config(#[from] ConfigError),

    /// Key generation failed; may be retried
    #[error("Key generation failed: {0}")]
    Keygen(#[from] KeygenError),

    /// A required key slot is empty
    #[error("{0}")]
    KeyState(#[from] KeyStateError),

    /// Malformed key or envelope input
    #[error("Key decoding failed: {0}")]
    Decode(#[from] DecodeError),

    /// Scheme operation failure (limited details for security)
    #[error("Cryptographic operation failed")]
    CryptoOp,

    /// The scheme does not offer this operation
    #[error("{scheme} does not support {operation}")]
    Unsupported {
        scheme: SchemeId,
        operation: Operation,
    },

    /// The context has been destroyed
    #[error("Context has been destroyed")]
    Destroyed,
}

impl Error {
    /// Stable code recorded on the error stack
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Config(_) => ErrorCode::Config,
            Error::Keygen(_) => ErrorCode::Keygen,
            Error::KeyState(_) => ErrorCode::KeyAbsent,
            Error::Decode(_) => ErrorCode::Decode,
            Error::CryptoOp => ErrorCode::CryptoOp,
            Error::Unsupported { .. } => ErrorCode::Unsupported,
            Error::Destroyed => ErrorCode::Destroyed,
        }
    }

    /// Whether retrying with fresh CSPRNG state may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Keygen(_))
    }
}

/// Context construction errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Flag resolution failed
    #[error("invalid flags: {0}")]
    Flags(#[from] FlagError),

    /// Numeric scheme identifier not recognised
    #[error("unknown scheme identifier {0}")]
    UnknownScheme(u8),

    /// The scheme is known but has no backend in this build
    #[error("{0} is not available in this build")]
    SchemeUnavailable(SchemeId),

    /// The parameter set index is out of range for the scheme
    #[error("{scheme} has no parameter set {param_set}")]
    UnknownParameterSet { scheme: SchemeId, param_set: u32 },

    /// The requested CSPRNG could not be seeded
    #[error("CSPRNG construction failed: {0}")]
    Csprng(#[from] CsprngError),

    /// The scheme backend refused to instantiate
    #[error("scheme instantiation failed: {0}")]
    Scheme(#[source] SchemeError),
}

/// Flag resolution errors, citing the offending field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// A masked field holds a reserved or undefined code
    #[error("invalid value in flag field '{0}'")]
    InvalidField(&'static str),

    /// Bits outside every defined field are set
    #[error("reserved bits {bits:#010x} set in flag word {word}")]
    ReservedBits { word: usize, bits: u32 },

    /// A word announces a successor that was not supplied
    #[error("flag word {0} announced but not supplied")]
    MissingWord(usize),

    /// Two fields are individually valid but cannot be combined
    #[error("incompatible flag combination in field '{0}'")]
    Incompatible(&'static str),
}

/// Key generation errors
#[derive(Error, Debug)]
pub enum KeygenError {
    /// The entropy source could not reseed the generator
    #[error("entropy source failed")]
    Entropy(#[source] CsprngError),

    /// The scheme backend failed to produce a key pair
    #[error("scheme key generation failed")]
    Scheme(#[source] SchemeError),
}

/// Key slot state errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStateError {
    #[error("{0} key is absent")]
    Absent(KeyClass),
}

/// Key and signature decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("input truncated")]
    Truncated,

    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    #[error("coding mismatch: expected {expected}, found tag {found}")]
    CodingMismatch { expected: KeyCoding, found: u8 },

    #[error("key class mismatch: expected {expected}")]
    KeyClassMismatch { expected: KeyClass },

    #[error("key belongs to a different scheme or parameter set")]
    SchemeMismatch,

    #[error("malformed coded data: {0}")]
    Malformed(&'static str),

    #[error("decoded length does not match header")]
    LengthMismatch,

    #[error("invalid key material")]
    InvalidKey,
}

/// CSPRNG seeding errors
#[derive(Error, Debug)]
pub enum CsprngError {
    /// Reading an entropy device failed
    #[error("entropy device unavailable: {0}")]
    Device(#[from] std::io::Error),

    /// The operating system generator failed
    #[error("operating system RNG failed: {0}")]
    Os(String),

    /// The callback source was selected but nothing is registered
    #[error("no entropy callback registered")]
    NoCallback,

    /// The registered callback reported failure
    #[error("entropy callback failed")]
    Callback,
}

/// Errors reported by scheme backends
#[derive(Error, Debug)]
pub enum SchemeError {
    #[error("{0} is not supported")]
    Unsupported(Operation),

    #[error("invalid key material")]
    InvalidKey,

    #[error("random generation failed: {0}")]
    Rng(#[from] CsprngError),

    #[error("scheme operation failed")]
    Failed,
}

/// Stable error codes stored on the error stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    Config = 1,
    Keygen = 2,
    KeyAbsent = 3,
    Decode = 4,
    CryptoOp = 5,
    Unsupported = 6,
    Destroyed = 7,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Config => "CONFIG_ERROR",
            ErrorCode::Keygen => "KEYGEN_ERROR",
            ErrorCode::KeyAbsent => "KEY_ABSENT",
            ErrorCode::Decode => "DECODE_ERROR",
            ErrorCode::CryptoOp => "CRYPTO_OP_ERROR",
            ErrorCode::Unsupported => "INVALID_FUNCTION_CALL",
            ErrorCode::Destroyed => "CONTEXT_DESTROYED",
        };
        write!(f, "{} ({})", name, *self as u16)
    }
}
