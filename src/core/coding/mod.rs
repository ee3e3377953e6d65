/*!
Key codec and entropy coders.

Keys are serialized inside a small envelope that records the format
version, the coding used, the key class, and the scheme and parameter
set the key belongs to, followed by the raw length and the coded payload.
Decoding is strict: a buffer produced under a different coding or for a
different slot is rejected before any payload is interpreted.

Signatures use a lighter envelope (coding and raw length) and are left
untouched when the signature coding is `None`.
*/

mod bac;
mod huffman;
mod rle;

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use crate::core::constants::envelope::{KEY_HEADER_SIZE, SIGNATURE_HEADER_SIZE, VERSION};
use crate::core::crypto::keys::{KeyClass, KeyMaterial};
use crate::core::crypto::registry::SchemeId;
use crate::core::error::DecodeError;

use self::huffman::{HuffmanCoder, TableFormat};

/// Largest raw length a decoder will accept from a header
pub const MAX_RAW_LEN: usize = 1 << 24;

/// Entropy coding applied to key or signature bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum KeyCoding {
    #[default]
    None = 0,
    /// Adaptive binary arithmetic coding
    Bac = 1,
    /// Run-length pre-pass followed by BAC
    BacRle = 2,
    /// Canonical Huffman with a full code-length table
    HuffmanStatic = 3,
    /// Canonical Huffman with a sparse, interoperable table
    StrongSwan = 4,
}

impl KeyCoding {
    pub const ALL: [KeyCoding; 5] = [
        KeyCoding::None,
        KeyCoding::Bac,
        KeyCoding::BacRle,
        KeyCoding::HuffmanStatic,
        KeyCoding::StrongSwan,
    ];
}

impl TryFrom<u8> for KeyCoding {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, u8> {
        KeyCoding::ALL
            .iter()
            .copied()
            .find(|c| *c as u8 == tag)
            .ok_or(tag)
    }
}

impl fmt::Display for KeyCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyCoding::None => "none",
            KeyCoding::Bac => "BAC",
            KeyCoding::BacRle => "BAC+RLE",
            KeyCoding::HuffmanStatic => "static Huffman",
            KeyCoding::StrongSwan => "interoperable Huffman",
        };
        f.write_str(name)
    }
}

/// An entropy coder family
pub trait EntropyCoder: Sync {
    fn coding(&self) -> KeyCoding;

    /// Compress `raw`
    fn encode(&self, raw: &[u8]) -> Vec<u8>;

    /// Recover exactly `raw_len` bytes from `coded`
    fn decode(&self, coded: &[u8], raw_len: usize) -> Result<Vec<u8>, DecodeError>;
}

struct RawCoder;

impl EntropyCoder for RawCoder {
    fn coding(&self) -> KeyCoding {
        KeyCoding::None
    }

    fn encode(&self, raw: &[u8]) -> Vec<u8> {
        raw.to_vec()
    }

    fn decode(&self, coded: &[u8], raw_len: usize) -> Result<Vec<u8>, DecodeError> {
        match coded.len() {
            n if n < raw_len => Err(DecodeError::Truncated),
            n if n > raw_len => Err(DecodeError::LengthMismatch),
            _ => Ok(coded.to_vec()),
        }
    }
}

struct BacCoder;

impl EntropyCoder for BacCoder {
    fn coding(&self) -> KeyCoding {
        KeyCoding::Bac
    }

    fn encode(&self, raw: &[u8]) -> Vec<u8> {
        bac::encode(raw)
    }

    fn decode(&self, coded: &[u8], raw_len: usize) -> Result<Vec<u8>, DecodeError> {
        bac::decode(coded, raw_len)
    }
}

struct BacRleCoder;

impl EntropyCoder for BacRleCoder {
    fn coding(&self) -> KeyCoding {
        KeyCoding::BacRle
    }

    fn encode(&self, raw: &[u8]) -> Vec<u8> {
        let runs = rle::encode(raw);
        let mut out = vec![0u8; 4];
        BigEndian::write_u32(&mut out, runs.len() as u32);
        out.extend_from_slice(&bac::encode(&runs));
        out
    }

    fn decode(&self, coded: &[u8], raw_len: usize) -> Result<Vec<u8>, DecodeError> {
        if coded.len() < 4 {
            return Err(DecodeError::Truncated);
        }
        let runs_len = BigEndian::read_u32(&coded[..4]) as usize;
        // Each run pair expands to at least one byte
        if runs_len > raw_len.saturating_mul(2) {
            return Err(DecodeError::Malformed("run stream longer than output"));
        }
        let runs = bac::decode(&coded[4..], runs_len)?;
        rle::decode(&runs, raw_len)
    }
}

static RAW: RawCoder = RawCoder;
static BAC: BacCoder = BacCoder;
static BAC_RLE: BacRleCoder = BacRleCoder;
static HUFFMAN_STATIC: HuffmanCoder = HuffmanCoder::new(KeyCoding::HuffmanStatic, TableFormat::Dense);
static STRONGSWAN: HuffmanCoder = HuffmanCoder::new(KeyCoding::StrongSwan, TableFormat::Sparse);

/// The coder implementing `coding`
pub fn coder(coding: KeyCoding) -> &'static dyn EntropyCoder {
    match coding {
        KeyCoding::None => &RAW,
        KeyCoding::Bac => &BAC,
        KeyCoding::BacRle => &BAC_RLE,
        KeyCoding::HuffmanStatic => &HUFFMAN_STATIC,
        KeyCoding::StrongSwan => &STRONGSWAN,
    }
}

/// Serialize key material under `coding`
pub fn encode_key(key: &KeyMaterial, coding: KeyCoding) -> Vec<u8> {
    let payload = coder(coding).encode(key.as_bytes());

    let mut out = Vec::with_capacity(KEY_HEADER_SIZE + payload.len());
    out.push(VERSION);
    out.push(coding as u8);
    out.push(key.class() as u8);
    out.push(key.scheme() as u8);
    let mut fields = [0u8; 8];
    BigEndian::write_u32(&mut fields[..4], key.param_set());
    BigEndian::write_u32(&mut fields[4..], key.len() as u32);
    out.extend_from_slice(&fields);
    out.extend_from_slice(&payload);
    out
}

/// Parse a key envelope produced by `encode_key`
pub fn decode_key(
    bytes: &[u8],
    coding: KeyCoding,
    class: KeyClass,
    scheme: SchemeId,
    param_set: u32,
) -> Result<KeyMaterial, DecodeError> {
    if bytes.len() < KEY_HEADER_SIZE {
        return Err(DecodeError::Truncated);
    }
    if bytes[0] != VERSION {
        return Err(DecodeError::UnsupportedVersion(bytes[0]));
    }
    if bytes[1] != coding as u8 {
        return Err(DecodeError::CodingMismatch {
            expected: coding,
            found: bytes[1],
        });
    }
    if bytes[2] != class as u8 {
        return Err(DecodeError::KeyClassMismatch { expected: class });
    }
    if bytes[3] != scheme as u8 || BigEndian::read_u32(&bytes[4..8]) != param_set {
        return Err(DecodeError::SchemeMismatch);
    }

    let raw_len = read_raw_len(&bytes[8..12])?;
    let raw = coder(coding).decode(&bytes[KEY_HEADER_SIZE..], raw_len)?;
    if raw.len() != raw_len {
        return Err(DecodeError::LengthMismatch);
    }

    Ok(KeyMaterial::new(class, scheme, param_set, raw))
}

/// Wrap a raw signature under `coding`
pub fn encode_signature(signature: &[u8], coding: KeyCoding) -> Vec<u8> {
    if coding == KeyCoding::None {
        return signature.to_vec();
    }

    let payload = coder(coding).encode(signature);
    let mut out = Vec::with_capacity(SIGNATURE_HEADER_SIZE + payload.len());
    out.push(coding as u8);
    let mut len = [0u8; 4];
    BigEndian::write_u32(&mut len, signature.len() as u32);
    out.extend_from_slice(&len);
    out.extend_from_slice(&payload);
    out
}

/// Recover a raw signature wrapped by `encode_signature`
pub fn decode_signature(bytes: &[u8], coding: KeyCoding) -> Result<Vec<u8>, DecodeError> {
    if coding == KeyCoding::None {
        return Ok(bytes.to_vec());
    }
    if bytes.len() < SIGNATURE_HEADER_SIZE {
        return Err(DecodeError::Truncated);
    }
    if bytes[0] != coding as u8 {
        return Err(DecodeError::CodingMismatch {
            expected: coding,
            found: bytes[0],
        });
    }

    let raw_len = read_raw_len(&bytes[1..5])?;
    coder(coding).decode(&bytes[SIGNATURE_HEADER_SIZE..], raw_len)
}

fn read_raw_len(bytes: &[u8]) -> Result<usize, DecodeError> {
    let raw_len = BigEndian::read_u32(bytes) as usize;
    if raw_len > MAX_RAW_LEN {
        return Err(DecodeError::Malformed("declared length too large"));
    }
    Ok(raw_len)
}
