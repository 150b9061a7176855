//! Custom-predicate framing
//!
//! For variable-size or binary protocols where a message ends when a
//! caller-defined test over the accumulated bytes says so. Each read runs a
//! small state machine:
//!
//! ```text
//! Idle --setup--> Accumulating --(finished | timeout)--> Done
//!                      ^                                   |
//!                      +--------------setup----------------+
//! ```

use crate::constants::DEFAULT_SEPARATOR;
use crate::parser::FrameParser;
use bytes::{Bytes, BytesMut};
use core::fmt;

type CompletionTest = Box<dyn Fn(&[u8]) -> bool + Send>;
type Decoder<M> = Box<dyn Fn(&[u8]) -> M + Send>;

/// Parser driven by a completion test and a decode step
///
/// The finished flag is latched: once the test passes, later appends cannot
/// clear it. Decoding runs on whatever was accumulated, so the decoder must
/// cope with a short buffer after a timeout.
///
/// ```
/// use serialframe_core::parser::FrameParser;
/// use serialframe_core::predicate::PredicateParser;
///
/// let mut parser = PredicateParser::new(|buf| buf.len() >= 3, |buf| buf.to_vec());
/// parser.setup();
/// parser.append(b"AB");
/// assert!(!parser.is_finished());
/// parser.append(b"C");
/// assert!(parser.is_finished());
/// assert_eq!(parser.parsed(), b"ABC".to_vec());
/// ```
pub struct PredicateParser<M> {
    buffer: BytesMut,
    finished: bool,
    separator: u8,
    is_complete: CompletionTest,
    decode: Decoder<M>,
}

impl<M> PredicateParser<M> {
    /// Create a parser from a completion test and a decoder
    pub fn new<F, D>(is_complete: F, decode: D) -> Self
    where
        F: Fn(&[u8]) -> bool + Send + 'static,
        D: Fn(&[u8]) -> M + Send + 'static,
    {
        Self {
            buffer: BytesMut::new(),
            finished: false,
            separator: DEFAULT_SEPARATOR,
            is_complete: Box::new(is_complete),
            decode: Box::new(decode),
        }
    }

    /// Separator used if this parser is driven in separator mode
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Bytes accumulated since the last setup
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }
}

impl PredicateParser<Bytes> {
    /// Messages of exactly `len` bytes; surplus bytes of the last chunk are dropped
    pub fn fixed_length(len: usize) -> Self {
        Self::new(
            move |buf| buf.len() >= len,
            move |buf| Bytes::copy_from_slice(&buf[..buf.len().min(len)]),
        )
    }

    /// Messages ending at the first `terminator`, which is kept
    pub fn until_byte(terminator: u8) -> Self {
        Self::new(
            move |buf| buf.contains(&terminator),
            move |buf| {
                let end = buf
                    .iter()
                    .position(|&b| b == terminator)
                    .map_or(buf.len(), |i| i + 1);
                Bytes::copy_from_slice(&buf[..end])
            },
        )
        .with_separator(terminator)
    }
}

impl<M> fmt::Debug for PredicateParser<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateParser")
            .field("buffered", &self.buffer.len())
            .field("finished", &self.finished)
            .field("separator", &self.separator)
            .finish()
    }
}

impl<M> FrameParser for PredicateParser<M> {
    type Message = M;

    fn separator(&self) -> u8 {
        self.separator
    }

    fn parse(&mut self, raw: Bytes) -> M {
        (self.decode)(&raw)
    }

    fn setup(&mut self) {
        self.buffer.clear();
        self.finished = false;
    }

    fn append(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        if !self.finished {
            self.finished = (self.is_complete)(&self.buffer);
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn parsed(&mut self) -> M {
        (self.decode)(&self.buffer)
    }
}
