//! Byte run-length coding as `(run, byte)` pairs, runs of 1..=255.

use crate::core::error::DecodeError;

pub(super) fn encode(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        let byte = raw[i];
        let mut run = 1;
        while i + run < raw.len() && raw[i + run] == byte && run < u8::MAX as usize {
            run += 1;
        }
        out.push(run as u8);
        out.push(byte);
        i += run;
    }
    out
}

pub(super) fn decode(runs: &[u8], raw_len: usize) -> Result<Vec<u8>, DecodeError> {
    if runs.len() % 2 != 0 {
        return Err(DecodeError::Malformed("odd run-length stream"));
    }

    let mut out = Vec::with_capacity(raw_len);
    for pair in runs.chunks_exact(2) {
        let (run, byte) = (pair[0] as usize, pair[1]);
        if run == 0 {
            return Err(DecodeError::Malformed("zero-length run"));
        }
        if out.len() + run > raw_len {
            return Err(DecodeError::LengthMismatch);
        }
        out.resize(out.len() + run, byte);
    }

    if out.len() != raw_len {
        return Err(DecodeError::LengthMismatch);
    }
    Ok(out)
}
