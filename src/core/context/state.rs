/*!
Context state for the PQC engine.

The state is not stored; it is derived from what the context holds, so
it cannot drift out of step with the key slots.
*/

use std::fmt;

/// Lifecycle state of a crypto context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextState {
    /// Flags resolved, no scheme state yet (only seen during construction)
    Created,
    /// Scheme state and CSPRNG attached, no key material
    Initialized,
    /// At least one key slot is populated
    KeyReady,
    /// Resources released; every operation fails
    Destroyed,
}

impl ContextState {
    /// Derive the state of a constructed context
    pub fn derive(destroyed: bool, has_key: bool) -> Self {
        if destroyed {
            ContextState::Destroyed
        } else if has_key {
            ContextState::KeyReady
        } else {
            ContextState::Initialized
        }
    }

    /// Whether key generation is allowed
    pub fn can_keygen(&self) -> bool {
        matches!(self, ContextState::Initialized | ContextState::KeyReady)
    }

    /// Whether operations other than key coding selection are allowed
    pub fn is_live(&self) -> bool {
        *self != ContextState::Destroyed
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Created => write!(f, "Created"),
            ContextState::Initialized => write!(f, "Initialized"),
            ContextState::KeyReady => write!(f, "KeyReady"),
            ContextState::Destroyed => write!(f, "Destroyed"),
        }
    }
}
