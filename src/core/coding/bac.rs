/*!
Adaptive binary arithmetic coder.

A carry-propagating range coder with 11-bit adaptive probabilities. Each
byte is coded as eight binary decisions walking a 256-node bit tree, so
the model adapts to the byte distribution of the input as it goes.
*/

use crate::core::error::DecodeError;

const PROB_BITS: u32 = 11;
const PROB_ONE: u16 = 1 << PROB_BITS;
const PROB_INIT: u16 = PROB_ONE / 2;
const MOVE_BITS: u32 = 5;
const TOP: u32 = 1 << 24;

/// Bytes emitted by `RangeEncoder::finish` beyond the coded decisions
const INIT_BYTES: usize = 5;

struct RangeEncoder {
    low: u64,
    range: u32,
    cache: u8,
    cache_size: u64,
    out: Vec<u8>,
}

impl RangeEncoder {
    fn new() -> Self {
        Self {
            low: 0,
            range: u32::MAX,
            cache: 0,
            cache_size: 1,
            out: Vec::new(),
        }
    }

    fn encode_bit(&mut self, prob: &mut u16, bit: u8) {
        let bound = (self.range >> PROB_BITS) * *prob as u32;
        if bit == 0 {
            self.range = bound;
            *prob += (PROB_ONE - *prob) >> MOVE_BITS;
        } else {
            self.low += bound as u64;
            self.range -= bound;
            *prob -= *prob >> MOVE_BITS;
        }
        while self.range < TOP {
            self.range <<= 8;
            self.shift_low();
        }
    }

    fn shift_low(&mut self) {
        // Output is held back while it may still receive a carry
        if self.low < 0xFF00_0000 || self.low > 0xFFFF_FFFF {
            let carry = (self.low >> 32) as u8;
            let mut pending = self.cache;
            loop {
                self.out.push(pending.wrapping_add(carry));
                pending = 0xFF;
                self.cache_size -= 1;
                if self.cache_size == 0 {
                    break;
                }
            }
            self.cache = (self.low >> 24) as u8;
        }
        self.cache_size += 1;
        self.low = (self.low & 0x00FF_FFFF) << 8;
    }

    fn finish(mut self) -> Vec<u8> {
        for _ in 0..INIT_BYTES {
            self.shift_low();
        }
        self.out
    }
}

struct RangeDecoder<'a> {
    input: &'a [u8],
    pos: usize,
    range: u32,
    code: u32,
}

impl<'a> RangeDecoder<'a> {
    fn new(input: &'a [u8]) -> Result<Self, DecodeError> {
        if input.len() < INIT_BYTES {
            return Err(DecodeError::Truncated);
        }
        if input[0] != 0 {
            return Err(DecodeError::Malformed("range coder lead byte"));
        }
        let code = input[1..INIT_BYTES]
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32);
        Ok(Self {
            input,
            pos: INIT_BYTES,
            range: u32::MAX,
            code,
        })
    }

    fn next_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.input.get(self.pos).ok_or(DecodeError::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    fn decode_bit(&mut self, prob: &mut u16) -> Result<u8, DecodeError> {
        let bound = (self.range >> PROB_BITS) * *prob as u32;
        let bit = if self.code < bound {
            self.range = bound;
            *prob += (PROB_ONE - *prob) >> MOVE_BITS;
            0
        } else {
            self.code -= bound;
            self.range -= bound;
            *prob -= *prob >> MOVE_BITS;
            1
        };
        while self.range < TOP {
            self.range <<= 8;
            self.code = (self.code << 8) | self.next_byte()? as u32;
        }
        Ok(bit)
    }
}

pub(super) fn encode(raw: &[u8]) -> Vec<u8> {
    let mut probs = [PROB_INIT; 256];
    let mut enc = RangeEncoder::new();
    for &byte in raw {
        let mut node = 1usize;
        for shift in (0..8).rev() {
            let bit = (byte >> shift) & 1;
            enc.encode_bit(&mut probs[node], bit);
            node = (node << 1) | bit as usize;
        }
    }
    enc.finish()
}

pub(super) fn decode(coded: &[u8], raw_len: usize) -> Result<Vec<u8>, DecodeError> {
    let mut probs = [PROB_INIT; 256];
    let mut dec = RangeDecoder::new(coded)?;
    // A decision costs well under a byte, so cap the up-front reservation
    let mut out = Vec::with_capacity(raw_len.min(coded.len().saturating_mul(64)));
    for _ in 0..raw_len {
        let mut node = 1usize;
        while node < 256 {
            let bit = dec.decode_bit(&mut probs[node])?;
            node = (node << 1) | bit as usize;
        }
        out.push((node - 256) as u8);
    }
    Ok(out)
}
