//! Core components for the PQC engine.
//!
//! This module contains the building blocks behind `CryptoContext`:
//! flag resolution, scheme registry and backends, CSPRNGs, the key codec
//! and error handling.

// Engine constants and flag layout
pub mod constants;

// Error handling
pub mod error;
pub mod error_stack;

// Feature flag resolution
pub mod flags;

// Hashing, key material, scheme registry and backends
pub mod crypto;

// Random generation
pub mod csprng;

// Key and signature coding
pub mod coding;

// Context state machine
pub mod context;

// Re-exports for convenience
pub use self::coding::KeyCoding;
pub use self::constants::VERSION;
pub use self::context::{ContextBuilder, ContextState, CryptoContext, DebugLevel, Padding, Statistics};
pub use self::error::{Error, ErrorCode, Result};
pub use self::error_stack::{ErrorRecord, ErrorStack};
pub use self::flags::FeatureConfig;
