/*!
Cryptographic components for the PQC engine.

This module holds the runtime-selected hash functions, key material,
the scheme registry and the scheme backends.
*/

// Hash dispatch over the families selectable by flags
pub mod hash;

// Key slot material
pub mod keys;

// Registry for scheme management
pub mod registry;

// Scheme backends
pub mod schemes;

// Re-export frequently used types
pub use hash::{DigestLength, HashAlgorithm, HashFamily, Hasher};
pub use keys::{KeyClass, KeyMaterial};
pub use registry::{
    Capabilities, ParameterSet, SchemeDescriptor, SchemeFactory, SchemeFamily, SchemeId,
    encryption_schemes, is_available, kem_schemes, list_schemes, register_scheme,
    signature_schemes,
};
pub use schemes::{Operation, Scheme, SchemeConfig};
