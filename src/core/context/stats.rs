//! Per-context processing statistics.

use std::fmt;

use crate::core::crypto::keys::KeyClass;

/// Counters updated by successful context operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    pub keygens: u64,
    pub public_keys_encoded: u64,
    pub private_keys_encoded: u64,
    pub public_keys_loaded: u64,
    pub private_keys_loaded: u64,
    pub signatures: u64,
    pub verified: u64,
    pub unverified: u64,
    pub encryptions: u64,
    pub decryptions: u64,
    pub encapsulations: u64,
    pub decapsulations: u64,
    /// Raw key bytes passed through the key codec, per class
    pub public_raw_bytes: u64,
    pub private_raw_bytes: u64,
    /// Coded key bytes produced by or fed to the key codec, per class
    pub public_coded_bytes: u64,
    pub private_coded_bytes: u64,
}

impl Statistics {
    pub(crate) fn record_encode(&mut self, class: KeyClass, raw: usize, coded: usize) {
        match class {
            KeyClass::Public => {
                self.public_keys_encoded += 1;
                self.public_raw_bytes += raw as u64;
                self.public_coded_bytes += coded as u64;
            }
            KeyClass::Private => {
                self.private_keys_encoded += 1;
                self.private_raw_bytes += raw as u64;
                self.private_coded_bytes += coded as u64;
            }
        }
    }

    pub(crate) fn record_load(&mut self, class: KeyClass, raw: usize, coded: usize) {
        match class {
            KeyClass::Public => {
                self.public_keys_loaded += 1;
                self.public_raw_bytes += raw as u64;
                self.public_coded_bytes += coded as u64;
            }
            KeyClass::Private => {
                self.private_keys_loaded += 1;
                self.private_raw_bytes += raw as u64;
                self.private_coded_bytes += coded as u64;
            }
        }
    }

    /// Coded size as a percentage of raw size, if any keys went through the codec
    pub fn coding_ratio(&self, class: KeyClass) -> Option<f64> {
        let (raw, coded) = match class {
            KeyClass::Public => (self.public_raw_bytes, self.public_coded_bytes),
            KeyClass::Private => (self.private_raw_bytes, self.private_coded_bytes),
        };
        (raw > 0).then(|| 100.0 * coded as f64 / raw as f64)
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Key generation:     {}", self.keygens)?;
        writeln!(
            f,
            "Public keys:        {} encoded, {} loaded",
            self.public_keys_encoded, self.public_keys_loaded
        )?;
        writeln!(
            f,
            "Private keys:       {} encoded, {} loaded",
            self.private_keys_encoded, self.private_keys_loaded
        )?;
        for class in [KeyClass::Public, KeyClass::Private] {
            if let Some(ratio) = self.coding_ratio(class) {
                writeln!(f, "{:<8} coding:    {:.1}% of raw size", class.to_string(), ratio)?;
            }
        }
        writeln!(
            f,
            "Signatures:         {} created, {} verified, {} rejected",
            self.signatures, self.verified, self.unverified
        )?;
        writeln!(
            f,
            "Encryption:         {} encrypted, {} decrypted",
            self.encryptions, self.decryptions
        )?;
        write!(
            f,
            "Encapsulation:      {} encapsulated, {} decapsulated",
            self.encapsulations, self.decapsulations
        )
    }
}
