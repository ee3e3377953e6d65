/*!
Two-pass canonical Huffman coding.

Code lengths are computed from the input's byte histogram and written
ahead of the bit stream, so decoding needs nothing but the coded buffer.
The dense table stores all 256 lengths; the sparse table lists only the
symbols that occur, which is the layout shared with other implementations.
*/

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use byteorder::{BigEndian, ByteOrder};

use super::{EntropyCoder, KeyCoding};
use crate::core::error::DecodeError;

/// Longest code length accepted from a table
const MAX_CODE_LEN: usize = 56;
const SYMBOLS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TableFormat {
    /// 256 length bytes
    Dense,
    /// count u16, then (symbol, length) pairs
    Sparse,
}

pub(super) struct HuffmanCoder {
    coding: KeyCoding,
    format: TableFormat,
}

impl HuffmanCoder {
    pub(super) const fn new(coding: KeyCoding, format: TableFormat) -> Self {
        Self { coding, format }
    }

    fn write_table(&self, lengths: &[u8; SYMBOLS], out: &mut Vec<u8>) {
        match self.format {
            TableFormat::Dense => out.extend_from_slice(lengths),
            TableFormat::Sparse => {
                let used: Vec<(u8, u8)> = lengths
                    .iter()
                    .enumerate()
                    .filter(|(_, len)| **len > 0)
                    .map(|(sym, len)| (sym as u8, *len))
                    .collect();
                let mut count = [0u8; 2];
                BigEndian::write_u16(&mut count, used.len() as u16);
                out.extend_from_slice(&count);
                for (sym, len) in used {
                    out.push(sym);
                    out.push(len);
                }
            }
        }
    }

    /// Parse the table, returning lengths and the offset of the bit stream
    fn read_table(&self, coded: &[u8]) -> Result<([u8; SYMBOLS], usize), DecodeError> {
        let mut lengths = [0u8; SYMBOLS];
        match self.format {
            TableFormat::Dense => {
                if coded.len() < SYMBOLS {
                    return Err(DecodeError::Truncated);
                }
                lengths.copy_from_slice(&coded[..SYMBOLS]);
                Ok((lengths, SYMBOLS))
            }
            TableFormat::Sparse => {
                if coded.len() < 2 {
                    return Err(DecodeError::Truncated);
                }
                let count = BigEndian::read_u16(&coded[..2]) as usize;
                if count > SYMBOLS {
                    return Err(DecodeError::Malformed("symbol count"));
                }
                let end = 2 + count * 2;
                if coded.len() < end {
                    return Err(DecodeError::Truncated);
                }
                for pair in coded[2..end].chunks_exact(2) {
                    let slot = &mut lengths[pair[0] as usize];
                    if *slot != 0 || pair[1] == 0 {
                        return Err(DecodeError::Malformed("duplicate or empty table entry"));
                    }
                    *slot = pair[1];
                }
                Ok((lengths, end))
            }
        }
    }
}

impl EntropyCoder for HuffmanCoder {
    fn coding(&self) -> KeyCoding {
        self.coding
    }

    fn encode(&self, raw: &[u8]) -> Vec<u8> {
        let lengths = code_lengths(raw);
        let codes = canonical_codes(&lengths);

        let mut out = Vec::new();
        self.write_table(&lengths, &mut out);

        let mut writer = BitWriter::new(out);
        for &byte in raw {
            writer.write(codes[byte as usize], lengths[byte as usize]);
        }
        writer.finish()
    }

    fn decode(&self, coded: &[u8], raw_len: usize) -> Result<Vec<u8>, DecodeError> {
        let (lengths, offset) = self.read_table(coded)?;
        let table = DecodeTable::new(&lengths)?;
        if raw_len > 0 && table.symbols.is_empty() {
            return Err(DecodeError::Malformed("empty code table"));
        }

        let mut reader = BitReader::new(&coded[offset..]);
        let mut out = Vec::with_capacity(raw_len.min(coded.len().saturating_mul(8)));
        for _ in 0..raw_len {
            out.push(table.decode_symbol(&mut reader)?);
        }
        Ok(out)
    }
}

/// Huffman code lengths from the byte histogram of `raw`
fn code_lengths(raw: &[u8]) -> [u8; SYMBOLS] {
    let mut freq = [0u64; SYMBOLS];
    for &b in raw {
        freq[b as usize] += 1;
    }
    let used: Vec<usize> = (0..SYMBOLS).filter(|&s| freq[s] > 0).collect();

    let mut lengths = [0u8; SYMBOLS];
    match used.len() {
        0 => return lengths,
        1 => {
            lengths[used[0]] = 1;
            return lengths;
        }
        _ => {}
    }

    // Leaves are 0..n, internal nodes follow; ties break on node index
    let mut parent = vec![usize::MAX; 2 * used.len() - 1];
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = used
        .iter()
        .enumerate()
        .map(|(node, &sym)| Reverse((freq[sym], node)))
        .collect();
    let mut next = used.len();
    while let (Some(Reverse((w1, a))), Some(Reverse((w2, b)))) = (heap.pop(), heap.pop()) {
        parent[a] = next;
        parent[b] = next;
        heap.push(Reverse((w1 + w2, next)));
        next += 1;
    }

    for (node, &sym) in used.iter().enumerate() {
        let mut depth = 0u8;
        let mut n = node;
        while parent[n] != usize::MAX {
            depth += 1;
            n = parent[n];
        }
        lengths[sym] = depth;
    }
    lengths
}

/// Canonical code values: shorter codes first, ties by symbol value
fn canonical_codes(lengths: &[u8; SYMBOLS]) -> [u64; SYMBOLS] {
    let mut bl_count = [0u64; MAX_CODE_LEN + 1];
    for &len in lengths.iter().filter(|&&l| l > 0) {
        bl_count[len as usize] += 1;
    }

    let mut next_code = [0u64; MAX_CODE_LEN + 1];
    let mut code = 0u64;
    for bits in 1..=MAX_CODE_LEN {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }

    let mut codes = [0u64; SYMBOLS];
    for (sym, &len) in lengths.iter().enumerate() {
        if len > 0 {
            codes[sym] = next_code[len as usize];
            next_code[len as usize] += 1;
        }
    }
    codes
}

struct DecodeTable {
    count: [i64; MAX_CODE_LEN + 1],
    /// Symbols ordered by (length, value)
    symbols: Vec<u8>,
}

impl DecodeTable {
    fn new(lengths: &[u8; SYMBOLS]) -> Result<Self, DecodeError> {
        let mut count = [0i64; MAX_CODE_LEN + 1];
        for &len in lengths.iter() {
            if len as usize > MAX_CODE_LEN {
                return Err(DecodeError::Malformed("code length"));
            }
            count[len as usize] += 1;
        }
        count[0] = 0;

        // Reject over-subscribed tables
        let mut left = 1i64;
        for &n in &count[1..] {
            left = (left << 1) - n;
            if left < 0 {
                return Err(DecodeError::Malformed("over-subscribed code table"));
            }
        }

        let mut symbols = Vec::new();
        for len in 1..=MAX_CODE_LEN {
            for (sym, &l) in lengths.iter().enumerate() {
                if l as usize == len {
                    symbols.push(sym as u8);
                }
            }
        }
        Ok(Self { count, symbols })
    }

    fn decode_symbol(&self, reader: &mut BitReader<'_>) -> Result<u8, DecodeError> {
        let (mut code, mut first, mut index) = (0i64, 0i64, 0i64);
        for len in 1..=MAX_CODE_LEN {
            code |= reader.next_bit()? as i64;
            let count = self.count[len];
            if code - first < count {
                return Ok(self.symbols[(index + code - first) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }
        Err(DecodeError::Malformed("invalid Huffman code"))
    }
}

struct BitWriter {
    out: Vec<u8>,
    acc: u8,
    bits: u8,
}

impl BitWriter {
    fn new(out: Vec<u8>) -> Self {
        Self { out, acc: 0, bits: 0 }
    }

    /// Append the low `len` bits of `code`, most significant first
    fn write(&mut self, code: u64, len: u8) {
        for shift in (0..len).rev() {
            self.acc = (self.acc << 1) | ((code >> shift) & 1) as u8;
            self.bits += 1;
            if self.bits == 8 {
                self.out.push(self.acc);
                self.acc = 0;
                self.bits = 0;
            }
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.acc << (8 - self.bits));
        }
        self.out
    }
}

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next_bit(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.data.get(self.pos / 8).ok_or(DecodeError::Truncated)?;
        let bit = (byte >> (7 - self.pos % 8)) & 1;
        self.pos += 1;
        Ok(bit)
    }
}
