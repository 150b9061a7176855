//! Separator-delimited framing

use crate::constants::DEFAULT_SEPARATOR;
use crate::parser::FrameParser;
use bytes::{Bytes, BytesMut};

/// Parser ending a message at a fixed terminator byte
///
/// Messages are returned raw: separator included, nothing trimmed.
#[derive(Debug, Clone)]
pub struct SeparatorParser {
    separator: u8,
    buffer: BytesMut,
    finished: bool,
}

impl SeparatorParser {
    /// Create a parser terminating on `separator`
    pub fn new(separator: u8) -> Self {
        Self {
            separator,
            buffer: BytesMut::new(),
            finished: false,
        }
    }
}

impl Default for SeparatorParser {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl FrameParser for SeparatorParser {
    type Message = Bytes;

    fn separator(&self) -> u8 {
        self.separator
    }

    fn parse(&mut self, raw: Bytes) -> Bytes {
        raw
    }

    fn setup(&mut self) {
        self.buffer.clear();
        self.finished = false;
    }

    fn append(&mut self, chunk: &[u8]) {
        if self.finished {
            return;
        }
        self.buffer.extend_from_slice(chunk);
        self.finished = chunk.contains(&self.separator);
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn parsed(&mut self) -> Bytes {
        let mut message = self.buffer.split();
        // Bytes after the first separator belong to no message
        if let Some(end) = message.iter().position(|&b| b == self.separator) {
            message.truncate(end + 1);
        }
        message.freeze()
    }
}
