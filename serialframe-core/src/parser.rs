//! The frame parser contract shared by both read modes
//!
//! A parser serves two read operations:
//!
//! - separator mode: the engine accumulates bytes itself until
//!   [`FrameParser::separator`] arrives, then hands them to
//!   [`FrameParser::parse`]
//! - predicate mode: the parser owns accumulation through
//!   [`FrameParser::setup`], [`FrameParser::append`],
//!   [`FrameParser::is_finished`] and [`FrameParser::parsed`]
//!
//! See [`crate::separator::SeparatorParser`] and
//! [`crate::predicate::PredicateParser`] for the built-in strategies.

use bytes::Bytes;

/// Pluggable strategy deciding when a message is complete and how to decode it
pub trait FrameParser {
    /// Decoded application message
    type Message;

    /// Byte terminating a message in separator mode.
    ///
    /// Must not change over the parser's lifetime.
    fn separator(&self) -> u8;

    /// Decode the raw bytes collected in separator mode, separator included
    fn parse(&mut self, raw: Bytes) -> Self::Message;

    /// Reset per-message state before a predicate-mode read
    fn setup(&mut self);

    /// Accumulate a chunk of raw bytes.
    ///
    /// Must accept partial or malformed input; validation failures belong in
    /// [`FrameParser::parsed`].
    fn append(&mut self, chunk: &[u8]);

    /// Whether the accumulated bytes form a complete message.
    ///
    /// Once true it stays true until the next [`FrameParser::setup`].
    fn is_finished(&self) -> bool;

    /// Decode whatever has been accumulated, complete or not
    fn parsed(&mut self) -> Self::Message;
}

impl<P: FrameParser + ?Sized> FrameParser for &mut P {
    type Message = P::Message;

    fn separator(&self) -> u8 {
        (**self).separator()
    }

    fn parse(&mut self, raw: Bytes) -> Self::Message {
        (**self).parse(raw)
    }

    fn setup(&mut self) {
        (**self).setup()
    }

    fn append(&mut self, chunk: &[u8]) {
        (**self).append(chunk)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn parsed(&mut self) -> Self::Message {
        (**self).parsed()
    }
}

impl<P: FrameParser + ?Sized> FrameParser for Box<P> {
    type Message = P::Message;

    fn separator(&self) -> u8 {
        (**self).separator()
    }

    fn parse(&mut self, raw: Bytes) -> Self::Message {
        (**self).parse(raw)
    }

    fn setup(&mut self) {
        (**self).setup()
    }

    fn append(&mut self, chunk: &[u8]) {
        (**self).append(chunk)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn parsed(&mut self) -> Self::Message {
        (**self).parsed()
    }
}
