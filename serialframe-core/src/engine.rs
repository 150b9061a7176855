//! The framing engine: timeout-aware polling loops over a byte source
//!
//! Two read modes:
//!
//! - [`FramingEngine::read_until_separator`] busy-polls one byte at a time
//!   until the parser's separator arrives. Cheap for line-oriented ASCII
//!   protocols.
//! - [`FramingEngine::read_until_complete`] pulls chunks and lets the parser
//!   decide when a message is complete, optionally sleeping between empty
//!   polls. Meant for chunked binary protocols.
//!
//! In both modes the idle clock is reset on every non-empty read (per byte
//! or chunk, not per message), so a slow but steady device never times out
//! while a silent one times out deterministically. Running out of time is
//! not an error: the partially accumulated message is returned.

use crate::clock::{Clock, SystemClock};
use crate::constants::{DEFAULT_IDLE_POLL_DELAY, DEFAULT_READ_CHUNK_SIZE};
use crate::error::FramingError;
use crate::parser::FrameParser;
use crate::separator::SeparatorParser;
use crate::source::ByteSource;
use bytes::{BufMut, BytesMut};
use core::time::Duration;

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Drives a [`FrameParser`] against a [`ByteSource`]
///
/// The engine owns its source, parser and clock. Pass `&mut` references to
/// borrow them instead; every collaborator trait is implemented for mutable
/// references.
#[derive(Debug)]
pub struct FramingEngine<S, P = SeparatorParser, C = SystemClock> {
    source: S,
    parser: P,
    clock: C,
}

impl<S: ByteSource> FramingEngine<S> {
    /// Create an engine splitting newline-terminated messages
    pub fn new(source: S) -> Self {
        Self::with_parts(source, SeparatorParser::default(), SystemClock::new())
    }
}

impl<S, P, C> FramingEngine<S, P, C> {
    /// Create an engine from explicit collaborators
    pub fn with_parts(source: S, parser: P, clock: C) -> Self {
        Self {
            source,
            parser,
            clock,
        }
    }

    /// Replace the parser
    pub fn with_parser<Q>(self, parser: Q) -> FramingEngine<S, Q, C> {
        FramingEngine {
            source: self.source,
            parser,
            clock: self.clock,
        }
    }

    /// Replace the clock
    pub fn with_clock<D>(self, clock: D) -> FramingEngine<S, P, D> {
        FramingEngine {
            source: self.source,
            parser: self.parser,
            clock,
        }
    }

    /// Borrow the byte source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the byte source
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Borrow the parser
    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Mutably borrow the parser
    pub fn parser_mut(&mut self) -> &mut P {
        &mut self.parser
    }

    /// Split the engine back into its collaborators
    pub fn into_parts(self) -> (S, P, C) {
        (self.source, self.parser, self.clock)
    }
}

impl<S, P, C> FramingEngine<S, P, C>
where
    S: ByteSource,
    P: FrameParser,
    C: Clock,
{
    /// Read byte by byte until the parser's separator arrives
    ///
    /// `timeout` is the longest gap allowed between two received bytes;
    /// zero waits forever. The message handed to [`FrameParser::parse`]
    /// includes the separator. On timeout whatever arrived so far (possibly
    /// nothing) is parsed and returned.
    ///
    /// # Errors
    /// Any source failure aborts the read immediately.
    pub fn read_until_separator(&mut self, timeout: Duration) -> Result<P::Message, FramingError> {
        let separator = self.parser.separator();
        let mut buffer = BytesMut::new();
        let mut byte = [0u8; 1];
        let mut last_byte_at = self.clock.now();

        #[cfg(feature = "logging")]
        debug!(
            "Reading until separator {:#04x} (timeout {:?})",
            separator, timeout
        );

        loop {
            if self.source.try_read(&mut byte)? == 0 {
                if idle_expired(timeout, last_byte_at, self.clock.now()) {
                    #[cfg(feature = "logging")]
                    warn!(
                        "Idle timeout after {:?}, returning {} partial bytes",
                        timeout,
                        buffer.len()
                    );
                    break;
                }
                continue;
            }

            buffer.put_u8(byte[0]);
            last_byte_at = self.clock.now();

            if byte[0] == separator {
                break;
            }
        }

        #[cfg(feature = "logging")]
        debug!("Separator read finished with {} bytes", buffer.len());

        Ok(self.parser.parse(buffer.freeze()))
    }

    /// Read chunks until the parser reports a complete message
    ///
    /// Calls [`FrameParser::setup`] once, then requests up to
    /// `read_chunk_size` bytes per poll and feeds each non-empty chunk to
    /// [`FrameParser::append`]. After an empty poll the engine sleeps for
    /// `idle_poll_delay` (if non-zero) through its clock. The loop ends when
    /// [`FrameParser::is_finished`] turns true or, with a non-zero
    /// `timeout`, when no bytes arrived for longer than `timeout`.
    ///
    /// # Errors
    /// [`FramingError::InvalidArgument`] for a zero `read_chunk_size`; any
    /// source failure aborts the read immediately.
    pub fn read_until_complete(
        &mut self,
        timeout: Duration,
        read_chunk_size: usize,
        idle_poll_delay: Duration,
    ) -> Result<P::Message, FramingError> {
        if read_chunk_size == 0 {
            return Err(FramingError::InvalidArgument(
                "read chunk size must be greater than zero".into(),
            ));
        }

        let mut chunk = vec![0u8; read_chunk_size];
        let mut last_byte_at = self.clock.now();
        self.parser.setup();

        #[cfg(feature = "logging")]
        debug!(
            "Reading until complete (timeout {:?}, chunk {} bytes, poll delay {:?})",
            timeout, read_chunk_size, idle_poll_delay
        );

        loop {
            let n = self.source.try_read(&mut chunk)?;

            if n == 0 {
                if idle_expired(timeout, last_byte_at, self.clock.now()) {
                    #[cfg(feature = "logging")]
                    warn!("Idle timeout after {:?} before message completed", timeout);
                    break;
                }
                if !idle_poll_delay.is_zero() {
                    self.clock.sleep(idle_poll_delay);
                }
            } else {
                #[cfg(feature = "logging")]
                trace!("Appending {} byte chunk", n);

                self.parser.append(&chunk[..n]);
                last_byte_at = self.clock.now();
            }

            if self.parser.is_finished() {
                break;
            }
        }

        Ok(self.parser.parsed())
    }

    /// [`FramingEngine::read_until_complete`] with the default chunk size
    /// and no sleep between empty polls
    pub fn read_until_complete_with(
        &mut self,
        timeout: Duration,
    ) -> Result<P::Message, FramingError> {
        self.read_until_complete(timeout, DEFAULT_READ_CHUNK_SIZE, DEFAULT_IDLE_POLL_DELAY)
    }
}

/// Whether more than `timeout` passed since the last byte; zero never expires
fn idle_expired(timeout: Duration, last_byte_at: Duration, now: Duration) -> bool {
    !timeout.is_zero() && now.saturating_sub(last_byte_at) > timeout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::predicate::PredicateParser;
    use crate::source::SliceSource;
    use std::collections::VecDeque;

    /// One scripted poll outcome
    enum Poll {
        Data(&'static [u8]),
        Idle,
        Fail(FramingError),
    }

    /// Source replaying a script, advancing a shared clock on every poll
    struct ScriptedSource {
        script: VecDeque<Poll>,
        clock: ManualClock,
        step: Duration,
        polls: usize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Poll>, clock: ManualClock, step: Duration) -> Self {
            Self {
                script: script.into(),
                clock,
                step,
                polls: 0,
            }
        }
    }

    impl ByteSource for ScriptedSource {
        fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, FramingError> {
            self.polls += 1;
            self.clock.advance(self.step);
            match self.script.pop_front() {
                Some(Poll::Data(data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    if n < data.len() {
                        self.script.push_front(Poll::Data(&data[n..]));
                    }
                    Ok(n)
                }
                Some(Poll::Idle) | None => Ok(0),
                Some(Poll::Fail(e)) => Err(e),
            }
        }
    }

    #[test]
    fn test_idle_expired() {
        let t = Duration::from_secs;
        assert!(!idle_expired(t(0), t(0), t(100)));
        assert!(!idle_expired(t(1), t(0), t(1)));
        assert!(idle_expired(t(1), t(0), t(2)));
    }

    #[test]
    fn test_separator_stops_at_first_separator() {
        let mut engine = FramingEngine::new(SliceSource::new(&b"OK\nNEXT\n"[..]));

        let message = engine.read_until_separator(Duration::ZERO).unwrap();
        assert_eq!(&message[..], b"OK\n");
        assert_eq!(engine.source().remaining(), b"NEXT\n");

        let message = engine.read_until_separator(Duration::ZERO).unwrap();
        assert_eq!(&message[..], b"NEXT\n");
    }

    #[test]
    fn test_separator_idle_reset_per_byte() {
        let clock = ManualClock::new();
        // 900ms between bytes never exceeds a 1s idle timeout
        let script = vec![
            Poll::Idle,
            Poll::Data(b"A"),
            Poll::Idle,
            Poll::Data(b"B"),
            Poll::Idle,
            Poll::Data(b"\n"),
        ];
        let source = ScriptedSource::new(script, clock.clone(), Duration::from_millis(450));
        let mut engine =
            FramingEngine::with_parts(source, SeparatorParser::default(), clock.clone());

        let message = engine.read_until_separator(Duration::from_secs(1)).unwrap();
        assert_eq!(&message[..], b"AB\n");
    }

    #[test]
    fn test_separator_timeout_returns_partial() {
        let clock = ManualClock::new();
        let script = vec![Poll::Data(b"P"), Poll::Data(b"A")];
        let source = ScriptedSource::new(script, clock.clone(), Duration::from_millis(100));
        let mut engine =
            FramingEngine::with_parts(source, SeparatorParser::default(), clock.clone());

        let message = engine.read_until_separator(Duration::from_millis(500)).unwrap();
        assert_eq!(&message[..], b"PA");
        // Last byte at 200ms; the first poll more than 500ms later is at 800ms
        assert_eq!(clock.now(), Duration::from_millis(800));
    }

    #[test]
    fn test_separator_propagates_source_error() {
        let clock = ManualClock::new();
        let script = vec![
            Poll::Data(b"x"),
            Poll::Fail(FramingError::Io("unplugged".into())),
        ];
        let source = ScriptedSource::new(script, clock.clone(), Duration::ZERO);
        let mut engine = FramingEngine::with_parts(source, SeparatorParser::default(), clock);

        assert_eq!(
            engine.read_until_separator(Duration::ZERO),
            Err(FramingError::Io("unplugged".into()))
        );
    }

    #[test]
    fn test_complete_rejects_zero_chunk() {
        let mut engine = FramingEngine::new(SliceSource::new(&b"abc"[..]))
            .with_parser(PredicateParser::fixed_length(3));
        assert!(matches!(
            engine.read_until_complete(Duration::ZERO, 0, Duration::ZERO),
            Err(FramingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_complete_sleeps_between_empty_polls() {
        let clock = ManualClock::new();
        let script = vec![Poll::Idle, Poll::Idle, Poll::Data(b"1234")];
        let source = ScriptedSource::new(script, clock.clone(), Duration::ZERO);
        let mut engine =
            FramingEngine::with_parts(source, PredicateParser::fixed_length(4), clock.clone());

        let message = engine
            .read_until_complete(Duration::ZERO, 16, Duration::from_millis(10))
            .unwrap();
        assert_eq!(&message[..], b"1234");
        assert_eq!(clock.now(), Duration::from_millis(20));
    }

    #[test]
    fn test_complete_timeout_with_poll_delay() {
        let clock = ManualClock::new();
        let source = ScriptedSource::new(vec![Poll::Data(b"AB")], clock.clone(), Duration::ZERO);
        let mut engine =
            FramingEngine::with_parts(source, PredicateParser::fixed_length(4), clock.clone());

        let message = engine
            .read_until_complete(Duration::from_millis(30), 16, Duration::from_millis(10))
            .unwrap();
        assert_eq!(&message[..], b"AB");
        assert!(!engine.parser().is_finished());
        assert_eq!(clock.now(), Duration::from_millis(40));
    }

    #[test]
    fn test_complete_idle_reset_per_chunk() {
        let clock = ManualClock::new();
        // Chunks 1.2s apart, 2.8s overall, but never more than 800ms of silence
        let script = vec![
            Poll::Data(b"AB"),
            Poll::Idle,
            Poll::Idle,
            Poll::Data(b"CD"),
            Poll::Idle,
            Poll::Idle,
            Poll::Data(b"EF"),
        ];
        let source = ScriptedSource::new(script, clock.clone(), Duration::from_millis(400));
        let mut engine =
            FramingEngine::with_parts(source, PredicateParser::fixed_length(6), clock.clone());

        let message = engine
            .read_until_complete(Duration::from_secs(1), 16, Duration::ZERO)
            .unwrap();
        assert_eq!(&message[..], b"ABCDEF");
        assert_eq!(clock.now(), Duration::from_millis(2800));
    }

    #[test]
    fn test_complete_timeout_counts_from_last_chunk() {
        let clock = ManualClock::new();
        let script = vec![Poll::Data(b"AB"), Poll::Data(b"CD")];
        let source = ScriptedSource::new(script, clock.clone(), Duration::from_millis(400));
        let mut engine =
            FramingEngine::with_parts(source, PredicateParser::fixed_length(6), clock.clone());

        let message = engine
            .read_until_complete(Duration::from_secs(1), 16, Duration::ZERO)
            .unwrap();
        assert_eq!(&message[..], b"ABCD");
        // Last chunk at 800ms; the first poll more than 1s later is at 2s
        assert_eq!(clock.now(), Duration::from_millis(2000));
    }

    #[test]
    fn test_complete_propagates_end_of_stream() {
        let source = SliceSource::new(&b"AB"[..]).end_of_stream_when_drained();
        let mut engine =
            FramingEngine::new(source).with_parser(PredicateParser::fixed_length(4));

        assert_eq!(
            engine.read_until_complete_with(Duration::from_secs(1)),
            Err(FramingError::EndOfStream)
        );
    }

    #[test]
    fn test_complete_stops_reading_once_finished() {
        let clock = ManualClock::new();
        let script = vec![Poll::Data(b"AB"), Poll::Data(b"CD"), Poll::Data(b"EF")];
        let source = ScriptedSource::new(script, clock.clone(), Duration::ZERO);
        let mut engine =
            FramingEngine::with_parts(source, PredicateParser::fixed_length(4), clock);

        let message = engine
            .read_until_complete(Duration::ZERO, 16, Duration::ZERO)
            .unwrap();
        assert_eq!(&message[..], b"ABCD");
        assert_eq!(engine.source().polls, 2);
    }

    #[test]
    fn test_borrowed_collaborators() {
        let mut source = SliceSource::new(&b"a;b;"[..]);
        let mut parser = SeparatorParser::new(b';');
        let clock = SystemClock::new();

        for expected in [&b"a;"[..], &b"b;"[..]] {
            let mut engine = FramingEngine::with_parts(&mut source, &mut parser, &clock);
            let message = engine.read_until_separator(Duration::ZERO).unwrap();
            assert_eq!(&message[..], expected);
        }
        assert!(source.is_drained());
    }
}
