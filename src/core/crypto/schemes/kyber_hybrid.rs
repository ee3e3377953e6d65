/*!
Kyber hybrid public-key encryption.

A Kyber encapsulation yields a shared secret; HKDF over the context's
resolved digest turns it into a ChaCha20-Poly1305 key. The encapsulation
and the nonce both draw from the context CSPRNG. The ciphertext is

```text
kyber ciphertext | nonce (12) | AEAD ciphertext and tag
```

Every decryption failure is reported as `SchemeError::Failed`.
*/

use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use zeroize::Zeroizing;

use crate::core::constants::{HKDF_INFO_AEAD, HKDF_SALT};
use crate::core::crypto::hash::{self, HashAlgorithm};
use crate::core::crypto::keys::RawKeyPair;
use crate::core::crypto::registry::{ParameterSet, SchemeId};
use crate::core::crypto::schemes::kyber::{self, KyberVariant};
use crate::core::crypto::schemes::{Scheme, SchemeConfig};
use crate::core::csprng::Csprng;
use crate::core::error::SchemeError;

pub const NONCE_SIZE: usize = 12;
pub const KEY_SIZE: usize = 32;
pub const TAG_SIZE: usize = 16;

/// Parameter sets in index order; `output_bytes` is the ciphertext overhead
pub fn parameter_sets() -> Vec<ParameterSet> {
    kyber::parameter_sets()
        .into_iter()
        .map(|set| ParameterSet {
            output_bytes: set.output_bytes + NONCE_SIZE + TAG_SIZE,
            ..set
        })
        .collect()
}

/// Kyber + ChaCha20-Poly1305 backend
pub struct KyberHybrid {
    variant: KyberVariant,
    kdf: HashAlgorithm,
}

impl KyberHybrid {
    pub fn new(config: &SchemeConfig) -> Result<Self, SchemeError> {
        let variant = KyberVariant::from_param_set(config.param_set).ok_or(SchemeError::Failed)?;
        Ok(Self {
            variant,
            kdf: config.hash,
        })
    }

    /// Digest driving the key derivation
    pub fn kdf(&self) -> HashAlgorithm {
        self.kdf
    }

    fn cipher(
        &self,
        shared_secret: &[u8],
        kem_ciphertext: &[u8],
    ) -> Result<ChaCha20Poly1305, SchemeError> {
        let mut info = Vec::with_capacity(kem_ciphertext.len() + HKDF_INFO_AEAD.len());
        info.extend_from_slice(kem_ciphertext);
        info.extend_from_slice(HKDF_INFO_AEAD);

        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        hash::hkdf(self.kdf, HKDF_SALT, shared_secret, &info, &mut key[..])
            .map_err(|_| SchemeError::Failed)?;
        Ok(ChaCha20Poly1305::new(Key::from_slice(&key[..])))
    }
}

impl Scheme for KyberHybrid {
    fn id(&self) -> SchemeId {
        SchemeId::EncKyberHybrid
    }

    fn keygen(&mut self, rng: &mut Csprng) -> Result<RawKeyPair, SchemeError> {
        self.variant.keypair(rng)
    }

    fn encrypt(
        &mut self,
        rng: &mut Csprng,
        public_key: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, SchemeError> {
        let kem = self.variant.encapsulate(rng, public_key)?;
        let cipher = self.cipher(&kem.shared_secret, &kem.ciphertext)?;

        let mut nonce = [0u8; NONCE_SIZE];
        rng.fill(&mut nonce)?;
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| SchemeError::Failed)?;

        let mut out = Vec::with_capacity(kem.ciphertext.len() + NONCE_SIZE + sealed.len());
        out.extend_from_slice(&kem.ciphertext);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt(
        &mut self,
        private_key: &[u8],
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, SchemeError> {
        let kem_len = self.variant.ciphertext_bytes();
        if ciphertext.len() < kem_len + NONCE_SIZE + TAG_SIZE {
            return Err(SchemeError::Failed);
        }
        let (kem_ct, rest) = ciphertext.split_at(kem_len);
        let (nonce, sealed) = rest.split_at(NONCE_SIZE);

        let shared_secret = self.variant.decapsulate(private_key, kem_ct)?;
        let cipher = self.cipher(&shared_secret, kem_ct)?;
        cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map(Zeroizing::new)
            .map_err(|_| SchemeError::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::csprng::{CsprngAlgorithm, CsprngRequest};

    fn hybrid(variant: KyberVariant, kdf: HashAlgorithm) -> KyberHybrid {
        KyberHybrid { variant, kdf }
    }

    fn rng() -> Csprng {
        Csprng::construct(&CsprngRequest {
            algorithm: CsprngAlgorithm::ChaCha20,
            ..CsprngRequest::default()
        })
        .unwrap()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let mut rng = rng();
        let mut scheme = hybrid(KyberVariant::Kyber768, HashAlgorithm::Sha3_256);
        let keys = scheme.keygen(&mut rng).unwrap();

        let message = b"This is a test message";
        let ct = scheme.encrypt(&mut rng, &keys.public, message).unwrap();
        assert_eq!(
            ct.len(),
            KyberVariant::Kyber768.ciphertext_bytes() + NONCE_SIZE + message.len() + TAG_SIZE
        );

        let pt = scheme.decrypt(&keys.private, &ct).unwrap();
        assert_eq!(&pt[..], message);

        // Fresh encapsulation and nonce every time
        let ct2 = scheme.encrypt(&mut rng, &keys.public, message).unwrap();
        assert_ne!(ct, ct2);
    }

    #[test]
    fn test_tampering_fails_generically() {
        let mut rng = rng();
        let mut scheme = hybrid(KyberVariant::Kyber512, HashAlgorithm::Sha2_512);
        let keys = scheme.keygen(&mut rng).unwrap();
        let ct = scheme.encrypt(&mut rng, &keys.public, b"payload").unwrap();

        for index in [0, ct.len() - 1, KyberVariant::Kyber512.ciphertext_bytes() + 3] {
            let mut tampered = ct.clone();
            tampered[index] ^= 0x01;
            assert!(matches!(
                scheme.decrypt(&keys.private, &tampered),
                Err(SchemeError::Failed)
            ));
        }
        assert!(matches!(
            scheme.decrypt(&keys.private, &ct[..20]),
            Err(SchemeError::Failed)
        ));
    }

    #[test]
    fn test_kdf_choice_matters() {
        let mut rng = rng();
        let mut sender = hybrid(KyberVariant::Kyber512, HashAlgorithm::Sha3_256);
        let mut receiver = hybrid(KyberVariant::Kyber512, HashAlgorithm::Blake2b256);
        let keys = sender.keygen(&mut rng).unwrap();

        let ct = sender.encrypt(&mut rng, &keys.public, b"payload").unwrap();
        assert!(receiver.decrypt(&keys.private, &ct).is_err());
        assert_eq!(receiver.kdf(), HashAlgorithm::Blake2b256);
    }

    #[test]
    fn test_parameter_set_overhead() {
        let sets = parameter_sets();
        assert_eq!(sets.len(), 3);
        assert_eq!(
            sets[2].output_bytes,
            KyberVariant::Kyber1024.ciphertext_bytes() + NONCE_SIZE + TAG_SIZE
        );
    }
}
