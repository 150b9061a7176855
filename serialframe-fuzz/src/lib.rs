//! Fuzzing entry points for serialframe-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_separator

use bytes::Bytes;
use serialframe_core::{FramingEngine, PredicateParser, SeparatorParser, SliceSource};
use std::time::Duration;

/// Split `data` into separator-delimited messages; the first byte picks the separator
pub fn fuzz_separator(data: &[u8]) {
    let Some((&separator, stream)) = data.split_first() else {
        return;
    };

    let source = SliceSource::new(Bytes::copy_from_slice(stream)).end_of_stream_when_drained();
    let mut engine = FramingEngine::new(source).with_parser(SeparatorParser::new(separator));

    // Ends on end of stream; must never panic
    while engine.read_until_separator(Duration::ZERO).is_ok() {}
}

/// Reassemble length-prefixed messages; the first byte picks the chunk size
pub fn fuzz_predicate(data: &[u8]) {
    let Some((&chunk, stream)) = data.split_first() else {
        return;
    };

    let parser = PredicateParser::new(
        |buf| buf.first().is_some_and(|&len| buf.len() > usize::from(len)),
        |buf| buf.get(1..).map(<[u8]>::to_vec),
    );
    let source = SliceSource::new(Bytes::copy_from_slice(stream)).end_of_stream_when_drained();
    let mut engine = FramingEngine::new(source).with_parser(parser);

    let chunk = usize::from(chunk).max(1);
    while engine
        .read_until_complete(Duration::ZERO, chunk, Duration::ZERO)
        .is_ok()
    {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzz_separator_empty() {
        fuzz_separator(&[]);
    }

    #[test]
    fn test_fuzz_separator_random() {
        fuzz_separator(&[b'\n', b'a', b'\n', b'b', 0xFF]);
    }

    #[test]
    fn test_fuzz_predicate_empty() {
        fuzz_predicate(&[]);
    }

    #[test]
    fn test_fuzz_predicate_random() {
        fuzz_predicate(&[3, 2, b'h', b'i', 0, 0xFF, 0xFF]);
    }
}
