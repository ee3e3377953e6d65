/*!
Key material held in a context's key slots.

Bytes are the scheme's canonical encoding. They are wiped on drop and
compared in constant time.
*/

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::core::crypto::registry::SchemeId;

/// Which key slot a piece of material belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyClass {
    Public = 0,
    Private = 1,
}

impl fmt::Display for KeyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyClass::Public => write!(f, "public"),
            KeyClass::Private => write!(f, "private"),
        }
    }
}

/// Opaque key material for one slot
#[derive(Clone)]
pub struct KeyMaterial {
    class: KeyClass,
    scheme: SchemeId,
    param_set: u32,
    bytes: Zeroizing<Vec<u8>>,
}

impl KeyMaterial {
    pub fn new(class: KeyClass, scheme: SchemeId, param_set: u32, bytes: Vec<u8>) -> Self {
        Self {
            class,
            scheme,
            param_set,
            bytes: Zeroizing::new(bytes),
        }
    }

    pub fn class(&self) -> KeyClass {
        self.class
    }

    pub fn scheme(&self) -> SchemeId {
        self.scheme
    }

    pub fn param_set(&self) -> u32 {
        self.param_set
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
            && self.scheme == other.scheme
            && self.param_set == other.param_set
            && bool::from(self.bytes.as_slice().ct_eq(other.bytes.as_slice()))
    }
}

impl Eq for KeyMaterial {}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("class", &self.class)
            .field("scheme", &self.scheme)
            .field("param_set", &self.param_set)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Raw output of a scheme's key generation
pub struct RawKeyPair {
    pub public: Vec<u8>,
    pub private: Zeroizing<Vec<u8>>,
}
