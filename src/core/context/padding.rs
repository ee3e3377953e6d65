//! Plaintext padding for public-key encryption.

use std::num::NonZeroUsize;

use zeroize::Zeroizing;

/// Padding applied before encryption and removed after decryption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    #[default]
    None,
    /// ISO/IEC 7816-4: a 0x80 marker then zeros up to the block size
    Iso7816(NonZeroUsize),
}

impl Padding {
    pub fn pad(&self, input: &[u8]) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(input.to_vec());
        if let Padding::Iso7816(block) = self {
            let block = block.get();
            out.push(0x80);
            let rem = out.len() % block;
            if rem != 0 {
                let len = out.len() + block - rem;
                out.resize(len, 0);
            }
        }
        out
    }

    /// Strip padding; `None` if it is malformed
    pub fn unpad(&self, mut padded: Zeroizing<Vec<u8>>) -> Option<Zeroizing<Vec<u8>>> {
        let Padding::Iso7816(block) = self else {
            return Some(padded);
        };
        let block = block.get();
        if padded.is_empty() || padded.len() % block != 0 {
            return None;
        }

        let marker = padded.iter().rposition(|&b| b != 0)?;
        if padded[marker] != 0x80 || padded.len() - marker > block {
            return None;
        }
        padded.truncate(marker);
        Some(padded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso(block: usize) -> Padding {
        Padding::Iso7816(NonZeroUsize::new(block).unwrap())
    }

    #[test]
    fn test_iso7816() {
        let padding = iso(16);

        let padded = padding.pad(b"hello");
        assert_eq!(padded.len(), 16);
        assert_eq!(padded[5], 0x80);
        assert_eq!(&padding.unpad(padded).unwrap()[..], b"hello");

        // A full block still gets a marker block
        let padded = padding.pad(&[7u8; 16]);
        assert_eq!(padded.len(), 32);
        assert_eq!(&padding.unpad(padded).unwrap()[..], &[7u8; 16]);

        assert!(padding.unpad(padding.pad(b"")).unwrap().is_empty());
    }

    #[test]
    fn test_pads_to_block_multiple() {
        for block in [1, 3, 8, 16] {
            let padding = iso(block);
            for len in 0..40 {
                let input = vec![0x11u8; len];
                let padded = padding.pad(&input);
                assert_eq!(padded.len() % block, 0);
                assert!(padded.len() > len && padded.len() <= len + block);
                assert_eq!(padding.unpad(padded).unwrap()[..], input[..]);
            }
        }
    }

    #[test]
    fn test_rejects_bad_padding() {
        let padding = iso(8);
        assert!(padding.unpad(Zeroizing::new(vec![1, 2, 3])).is_none());
        assert!(padding.unpad(Zeroizing::new(vec![0u8; 8])).is_none());
        assert!(padding.unpad(Zeroizing::new(vec![1, 2, 3, 4, 5, 6, 7, 8])).is_none());

        let mut long = vec![0u8; 16];
        long[0] = 0x80;
        assert!(padding.unpad(Zeroizing::new(long)).is_none());
    }

    #[test]
    fn test_none_is_identity() {
        let padded = Padding::None.pad(b"abc");
        assert_eq!(&padded[..], b"abc");
        assert_eq!(&Padding::None.unpad(padded).unwrap()[..], b"abc");
    }
}
