/*!
Per-context diagnostic error queue.

Despite the name the stack is drained oldest first, so the first fault
in a sequence of failures is the first one a caller sees.
*/

use std::collections::VecDeque;
use std::fmt;
use std::time::SystemTime;

use crate::core::constants::MAX_ERROR_RECORDS;
use crate::core::error::ErrorCode;

/// A single recorded failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// What went wrong
    pub code: ErrorCode,
    /// Source file where the failure was detected
    pub file: &'static str,
    /// Line where the failure was detected
    pub line: u32,
    /// Monotonic position of this record within its stack
    pub sequence: u64,
    /// Wall-clock time of the failure
    pub timestamp: SystemTime,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} (at {}:{})",
            self.sequence, self.code, self.file, self.line
        )
    }
}

/// Bounded FIFO of error records
///
/// When full, new records are discarded and counted rather than
/// evicting older ones.
#[derive(Debug, Default)]
pub struct ErrorStack {
    records: VecDeque<ErrorRecord>,
    next_sequence: u64,
    dropped: u64,
}

impl ErrorStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. Never fails.
    pub fn push(&mut self, code: ErrorCode, file: &'static str, line: u32) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        if self.records.len() >= MAX_ERROR_RECORDS {
            self.dropped += 1;
            return;
        }

        self.records.push_back(ErrorRecord {
            code,
            file,
            line,
            sequence,
            timestamp: SystemTime::now(),
        });
    }

    /// Remove and return the oldest record
    pub fn get_error(&mut self) -> Option<ErrorRecord> {
        self.records.pop_front()
    }

    /// Return the oldest record without removing it
    pub fn peek_error(&self) -> Option<&ErrorRecord> {
        self.records.front()
    }

    /// Remove the oldest record, returning its code and provenance
    pub fn get_error_line(&mut self) -> Option<(ErrorCode, &'static str, u32)> {
        self.get_error().map(|r| (r.code, r.file, r.line))
    }

    /// Return the oldest record's code and provenance without removing it
    pub fn peek_error_line(&self) -> Option<(ErrorCode, &'static str, u32)> {
        self.peek_error().map(|r| (r.code, r.file, r.line))
    }

    /// Empty the stack unconditionally
    pub fn clear_error(&mut self) {
        self.records.clear();
        self.dropped = 0;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records discarded because the stack was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Iterate oldest first
    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut stack = ErrorStack::new();
        stack.push(ErrorCode::Config, "a.rs", 1);
        stack.push(ErrorCode::Decode, "b.rs", 2);

        assert_eq!(stack.get_error().map(|r| r.code), Some(ErrorCode::Config));
        assert_eq!(stack.get_error().map(|r| r.code), Some(ErrorCode::Decode));
        assert!(stack.get_error().is_none());
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut stack = ErrorStack::new();
        stack.push(ErrorCode::KeyAbsent, file!(), line!());

        let first = stack.peek_error().cloned();
        assert_eq!(stack.peek_error().cloned(), first);
        assert_eq!(stack.len(), 1);

        let (code, file, _) = stack.peek_error_line().unwrap();
        assert_eq!(code, ErrorCode::KeyAbsent);
        assert_eq!(file, file!());
    }

    #[test]
    fn test_get_error_line() {
        let mut stack = ErrorStack::new();
        stack.push(ErrorCode::CryptoOp, "x.rs", 42);
        assert_eq!(stack.get_error_line(), Some((ErrorCode::CryptoOp, "x.rs", 42)));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_clear_then_peek_is_empty() {
        let mut stack = ErrorStack::new();
        stack.push(ErrorCode::Keygen, "k.rs", 7);
        stack.push(ErrorCode::Keygen, "k.rs", 8);
        stack.clear_error();
        assert!(stack.peek_error().is_none());
        assert!(stack.peek_error_line().is_none());
    }

    #[test]
    fn test_bounded_keeps_first_cause() {
        let mut stack = ErrorStack::new();
        stack.push(ErrorCode::Destroyed, "first.rs", 1);
        for i in 0..(MAX_ERROR_RECORDS as u32 + 5) {
            stack.push(ErrorCode::Decode, "later.rs", i);
        }

        assert_eq!(stack.len(), MAX_ERROR_RECORDS);
        assert_eq!(stack.dropped(), 6);
        assert_eq!(stack.peek_error().map(|r| r.file), Some("first.rs"));
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut stack = ErrorStack::new();
        stack.push(ErrorCode::Config, "a.rs", 1);
        stack.push(ErrorCode::Config, "a.rs", 2);
        let seqs: Vec<u64> = stack.iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![0, 1]);
        assert!(format!("{}", stack.peek_error().unwrap()).starts_with("#0 CONFIG_ERROR"));
    }
}
