/*!
# PQC Engine

A configurable post-quantum cryptographic engine. A caller picks a scheme
and parameter set, tunes the implementation through feature flag words,
and then drives everything through one owned `CryptoContext`.

## Overview

This library provides:

- CRYSTALS-Dilithium signatures
- CRYSTALS-Kyber key encapsulation
- Kyber + ChaCha20-Poly1305 hybrid public-key encryption
- Flag-driven selection of hash, sampler, reduction and CSPRNG
- Entropy-coded key and signature serialization
- A per-context FIFO error stack with source provenance

## Example

```no_run
use pqc_engine::{CryptoContext, SchemeId};

let mut ctx = CryptoContext::create(SchemeId::SigDilithium, 0, &[])?;
ctx.keygen()?;
let signature = ctx.sign(b"message")?;
assert!(ctx.verify(b"message", &signature)?);
# Ok::<(), pqc_engine::Error>(())
```

## Security Features

- Key material lives in `Zeroizing` buffers and is wiped on drop
- Key comparison is constant-time
- Decryption failures are reported generically
*/

// Core engine components
pub mod core;

// Re-export commonly used types for convenience
pub use crate::core::coding::KeyCoding;
pub use crate::core::constants::{FLAG_MORE, VERSION, word0, word1, word2};
pub use crate::core::context::{
    ContextBuilder, ContextState, CryptoContext, DebugLevel, Padding, Statistics,
};
pub use crate::core::crypto::keys::{KeyClass, KeyMaterial};
pub use crate::core::crypto::schemes::Operation;
pub use crate::core::error::{
    ConfigError, CsprngError, DecodeError, Error, ErrorCode, FlagError, KeyStateError,
    KeygenError, Result, SchemeError,
};
pub use crate::core::error_stack::{ErrorRecord, ErrorStack};
pub use crate::core::flags::{FeatureConfig, resolve as resolve_flags};

// Re-export the scheme registry
pub use crate::core::crypto::registry::{
    SchemeDescriptor, SchemeFactory, SchemeFamily, SchemeId, encryption_schemes, is_available,
    kem_schemes, list_schemes, register_scheme, signature_schemes,
};

// Re-export the entropy callback hooks
pub use crate::core::csprng::{clear_entropy_callback, set_entropy_callback};

/// Packed engine version, `0x00MMmmpp`
pub fn version() -> u32 {
    VERSION
}

/// Engine version as `major.minor.patch`
pub fn version_string() -> String {
    use crate::core::constants::{VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH};
    format!("{}.{}.{}", VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}
