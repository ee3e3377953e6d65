/*!
CRYSTALS-Kyber key encapsulation, in the form standardised as ML-KEM.

Parameter set 0 is Kyber512, 1 is Kyber768 and 2 is Kyber1024. The raw
operations on `KyberVariant` are shared with the hybrid encryption scheme.
Key generation and encapsulation draw from the context CSPRNG.
*/

use fips203::traits::{Decaps, Encaps, KeyGen, SerDes};
use fips203::{ml_kem_512, ml_kem_768, ml_kem_1024};
use zeroize::Zeroizing;

use crate::core::crypto::keys::RawKeyPair;
use crate::core::crypto::registry::{ParameterSet, SchemeId};
use crate::core::crypto::schemes::{Encapsulation, Scheme, SchemeConfig, drive};
use crate::core::csprng::Csprng;
use crate::core::error::SchemeError;

/// Kyber security levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KyberVariant {
    Kyber512,
    Kyber768,
    Kyber1024,
}

macro_rules! with_variant {
    ($variant:expr, $m:ident => $body:expr) => {
        match $variant {
            KyberVariant::Kyber512 => {
                use fips203::ml_kem_512 as $m;
                $body
            }
            KyberVariant::Kyber768 => {
                use fips203::ml_kem_768 as $m;
                $body
            }
            KyberVariant::Kyber1024 => {
                use fips203::ml_kem_1024 as $m;
                $body
            }
        }
    };
}

impl KyberVariant {
    pub fn from_param_set(param_set: u32) -> Option<Self> {
        match param_set {
            0 => Some(KyberVariant::Kyber512),
            1 => Some(KyberVariant::Kyber768),
            2 => Some(KyberVariant::Kyber1024),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KyberVariant::Kyber512 => "Kyber512",
            KyberVariant::Kyber768 => "Kyber768",
            KyberVariant::Kyber1024 => "Kyber1024",
        }
    }

    pub fn ciphertext_bytes(&self) -> usize {
        with_variant!(self, m => m::CT_LEN)
    }

    pub fn keypair(&self, rng: &mut Csprng) -> Result<RawKeyPair, SchemeError> {
        with_variant!(self, m => {
            let (ek, dk) = drive(rng, |rng| m::KG::try_keygen_with_rng(rng))?;
            let dk = Zeroizing::new(dk.into_bytes());
            Ok(RawKeyPair {
                public: ek.into_bytes().to_vec(),
                private: Zeroizing::new(dk.to_vec()),
            })
        })
    }

    /// Encapsulate a fresh secret to `public_key`
    pub fn encapsulate(
        &self,
        rng: &mut Csprng,
        public_key: &[u8],
    ) -> Result<Encapsulation, SchemeError> {
        with_variant!(self, m => {
            let bytes: [u8; m::EK_LEN] =
                public_key.try_into().map_err(|_| SchemeError::InvalidKey)?;
            let ek = m::EncapsKey::try_from_bytes(bytes).map_err(|_| SchemeError::InvalidKey)?;
            let (ss, ct) = drive(rng, |rng| ek.try_encaps_with_rng(rng))?;
            let ss = Zeroizing::new(ss.into_bytes());
            Ok(Encapsulation {
                ciphertext: ct.into_bytes().to_vec(),
                shared_secret: Zeroizing::new(ss.to_vec()),
            })
        })
    }

    /// Recover the secret carried by `ciphertext`
    pub fn decapsulate(
        &self,
        private_key: &[u8],
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, SchemeError> {
        with_variant!(self, m => {
            let bytes: Zeroizing<[u8; m::DK_LEN]> =
                Zeroizing::new(private_key.try_into().map_err(|_| SchemeError::InvalidKey)?);
            let dk = m::DecapsKey::try_from_bytes(*bytes).map_err(|_| SchemeError::InvalidKey)?;
            let ct: [u8; m::CT_LEN] = ciphertext.try_into().map_err(|_| SchemeError::Failed)?;
            let ct = m::CipherText::try_from_bytes(ct).map_err(|_| SchemeError::Failed)?;
            let ss = dk.try_decaps(&ct).map_err(|_| SchemeError::Failed)?;
            let ss = Zeroizing::new(ss.into_bytes());
            Ok(Zeroizing::new(ss.to_vec()))
        })
    }
}

/// Parameter sets in index order; `output_bytes` is the KEM ciphertext
pub fn parameter_sets() -> Vec<ParameterSet> {
    vec![
        ParameterSet {
            name: "Kyber512",
            public_key_bytes: ml_kem_512::EK_LEN,
            private_key_bytes: ml_kem_512::DK_LEN,
            output_bytes: ml_kem_512::CT_LEN,
        },
        ParameterSet {
            name: "Kyber768",
            public_key_bytes: ml_kem_768::EK_LEN,
            private_key_bytes: ml_kem_768::DK_LEN,
            output_bytes: ml_kem_768::CT_LEN,
        },
        ParameterSet {
            name: "Kyber1024",
            public_key_bytes: ml_kem_1024::EK_LEN,
            private_key_bytes: ml_kem_1024::DK_LEN,
            output_bytes: ml_kem_1024::CT_LEN,
        },
    ]
}

/// Kyber KEM backend
pub struct KyberKem {
    variant: KyberVariant,
}

impl KyberKem {
    pub fn new(config: &SchemeConfig) -> Result<Self, SchemeError> {
        let variant = KyberVariant::from_param_set(config.param_set).ok_or(SchemeError::Failed)?;
        Ok(Self { variant })
    }
}

impl Scheme for KyberKem {
    fn id(&self) -> SchemeId {
        SchemeId::KemKyber
    }

    fn keygen(&mut self, rng: &mut Csprng) -> Result<RawKeyPair, SchemeError> {
        self.variant.keypair(rng)
    }

    fn encapsulate(
        &mut self,
        rng: &mut Csprng,
        public_key: &[u8],
    ) -> Result<Encapsulation, SchemeError> {
        self.variant.encapsulate(rng, public_key)
    }

    fn decapsulate(
        &mut self,
        private_key: &[u8],
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, SchemeError> {
        self.variant.decapsulate(private_key, ciphertext)
    }
}
