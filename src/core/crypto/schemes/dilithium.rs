/*!
CRYSTALS-Dilithium signatures, in the form standardised as ML-DSA.

Parameter set 0 is Dilithium2 (ML-DSA-44), 1 is Dilithium3 (ML-DSA-65)
and 2 is Dilithium5 (ML-DSA-87). Key generation and signing draw their
randomness from the context CSPRNG.
*/

use fips204::traits::{KeyGen, SerDes, Signer, Verifier};
use fips204::{ml_dsa_44, ml_dsa_65, ml_dsa_87};
use zeroize::Zeroizing;

use crate::core::crypto::keys::RawKeyPair;
use crate::core::crypto::registry::{ParameterSet, SchemeId};
use crate::core::crypto::schemes::{Scheme, SchemeConfig, drive};
use crate::core::csprng::Csprng;
use crate::core::error::SchemeError;

/// Signing context string; the engine signs without one
const SIGNING_CONTEXT: &[u8] = &[];

/// Dilithium security levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DilithiumVariant {
    Dilithium2,
    Dilithium3,
    Dilithium5,
}

impl DilithiumVariant {
    pub fn from_param_set(param_set: u32) -> Option<Self> {
        match param_set {
            0 => Some(DilithiumVariant::Dilithium2),
            1 => Some(DilithiumVariant::Dilithium3),
            2 => Some(DilithiumVariant::Dilithium5),
            _ => None,
        }
    }
}

// Bind `$m` to the ML-DSA module for `$variant` and evaluate `$body`
macro_rules! with_variant {
    ($variant:expr, $m:ident => $body:expr) => {
        match $variant {
            DilithiumVariant::Dilithium2 => {
                use fips204::ml_dsa_44 as $m;
                $body
            }
            DilithiumVariant::Dilithium3 => {
                use fips204::ml_dsa_65 as $m;
                $body
            }
            DilithiumVariant::Dilithium5 => {
                use fips204::ml_dsa_87 as $m;
                $body
            }
        }
    };
}

/// Parameter sets in index order
pub fn parameter_sets() -> Vec<ParameterSet> {
    vec![
        ParameterSet {
            name: "Dilithium2",
            public_key_bytes: ml_dsa_44::PK_LEN,
            private_key_bytes: ml_dsa_44::SK_LEN,
            output_bytes: ml_dsa_44::SIG_LEN,
        },
        ParameterSet {
            name: "Dilithium3",
            public_key_bytes: ml_dsa_65::PK_LEN,
            private_key_bytes: ml_dsa_65::SK_LEN,
            output_bytes: ml_dsa_65::SIG_LEN,
        },
        ParameterSet {
            name: "Dilithium5",
            public_key_bytes: ml_dsa_87::PK_LEN,
            private_key_bytes: ml_dsa_87::SK_LEN,
            output_bytes: ml_dsa_87::SIG_LEN,
        },
    ]
}

/// Dilithium signature backend
pub struct DilithiumScheme {
    variant: DilithiumVariant,
}

impl DilithiumScheme {
    pub fn new(config: &SchemeConfig) -> Result<Self, SchemeError> {
        let variant =
            DilithiumVariant::from_param_set(config.param_set).ok_or(SchemeError::Failed)?;
        Ok(Self { variant })
    }

    pub fn variant(&self) -> DilithiumVariant {
        self.variant
    }
}

impl Scheme for DilithiumScheme {
    fn id(&self) -> SchemeId {
        SchemeId::SigDilithium
    }

    fn keygen(&mut self, rng: &mut Csprng) -> Result<RawKeyPair, SchemeError> {
        with_variant!(self.variant, m => {
            let (pk, sk) = drive(rng, |rng| m::KG::try_keygen_with_rng(rng))?;
            let sk = Zeroizing::new(sk.into_bytes());
            Ok(RawKeyPair {
                public: pk.into_bytes().to_vec(),
                private: Zeroizing::new(sk.to_vec()),
            })
        })
    }

    fn sign(
        &mut self,
        rng: &mut Csprng,
        private_key: &[u8],
        message: &[u8],
    ) -> Result<Vec<u8>, SchemeError> {
        with_variant!(self.variant, m => {
            let bytes: Zeroizing<[u8; m::SK_LEN]> =
                Zeroizing::new(private_key.try_into().map_err(|_| SchemeError::InvalidKey)?);
            let sk = m::PrivateKey::try_from_bytes(*bytes).map_err(|_| SchemeError::InvalidKey)?;
            let sig = drive(rng, |rng| sk.try_sign_with_rng(rng, message, SIGNING_CONTEXT))?;
            Ok(sig.to_vec())
        })
    }

    fn verify(
        &mut self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, SchemeError> {
        with_variant!(self.variant, m => {
            let bytes: [u8; m::PK_LEN] =
                public_key.try_into().map_err(|_| SchemeError::InvalidKey)?;
            let pk = m::PublicKey::try_from_bytes(bytes).map_err(|_| SchemeError::InvalidKey)?;
            // A signature of the wrong shape is simply not valid
            let Ok(sig) = <[u8; m::SIG_LEN]>::try_from(signature) else {
                return Ok(false);
            };
            Ok(pk.verify(message, &sig, SIGNING_CONTEXT))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::csprng::CsprngRequest;

    fn scheme(param_set: u32) -> DilithiumScheme {
        let config = SchemeConfig {
            param_set,
            ..test_config()
        };
        DilithiumScheme::new(&config).unwrap()
    }

    fn test_config() -> SchemeConfig {
        use crate::core::crypto::registry;
        use crate::core::flags::FeatureConfig;
        let entry = registry::lookup(SchemeId::SigDilithium, 0).unwrap();
        SchemeConfig::new(&FeatureConfig::default(), &entry.descriptor, 0)
    }

    #[test]
    fn test_sign_verify_every_level() {
        let mut rng = Csprng::construct(&CsprngRequest::default()).unwrap();
        for (index, params) in parameter_sets().iter().enumerate() {
            let mut dilithium = scheme(index as u32);
            let keys = dilithium.keygen(&mut rng).unwrap();
            assert_eq!(keys.public.len(), params.public_key_bytes);
            assert_eq!(keys.private.len(), params.private_key_bytes);

            let message = b"lattice signatures";
            let sig = dilithium.sign(&mut rng, &keys.private, message).unwrap();
            assert_eq!(sig.len(), params.output_bytes);
            assert!(dilithium.verify(&keys.public, message, &sig).unwrap());
            assert!(!dilithium.verify(&keys.public, b"another message", &sig).unwrap());
        }
    }

    #[test]
    fn test_malformed_inputs() {
        let mut rng = Csprng::construct(&CsprngRequest::default()).unwrap();
        let mut dilithium = scheme(0);
        let keys = dilithium.keygen(&mut rng).unwrap();

        assert!(!dilithium.verify(&keys.public, b"m", &[0u8; 10]).unwrap());
        assert!(matches!(
            dilithium.verify(&[0u8; 10], b"m", &[0u8; 10]),
            Err(SchemeError::InvalidKey)
        ));
        assert!(matches!(
            dilithium.sign(&mut rng, &[1, 2, 3], b"m"),
            Err(SchemeError::InvalidKey)
        ));
    }

    #[test]
    fn test_unknown_param_set() {
        let config = SchemeConfig {
            param_set: 3,
            ..test_config()
        };
        assert!(DilithiumScheme::new(&config).is_err());
        assert_eq!(scheme(2).variant(), DilithiumVariant::Dilithium5);
    }
}
