//! Concrete framing scenarios against deterministic sources and clocks

use bytes::Bytes;
use serialframe_core::{
    ByteSource, Clock, FrameParser, FramingEngine, FramingError, ManualClock, PredicateParser,
    SeparatorParser, SliceSource,
};
use std::collections::VecDeque;
use std::time::Duration;

/// Source handing out queued chunks, one per poll, then staying silent.
/// Every poll advances the shared clock by `step`.
struct ChunkSource {
    chunks: VecDeque<&'static [u8]>,
    clock: ManualClock,
    step: Duration,
    consumed: usize,
}

impl ChunkSource {
    fn new(chunks: &[&'static [u8]], clock: ManualClock, step: Duration) -> Self {
        Self {
            chunks: chunks.iter().copied().collect(),
            clock,
            step,
            consumed: 0,
        }
    }
}

impl ByteSource for ChunkSource {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, FramingError> {
        self.clock.advance(self.step);
        match self.chunks.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.chunks.push_front(&chunk[n..]);
                }
                self.consumed += 1;
                Ok(n)
            }
            None => Ok(0),
        }
    }
}

#[test]
fn test_ok_line_one_byte_at_a_time() {
    let clock = ManualClock::new();
    let source = ChunkSource::new(&[b"O", b"K", b"\n"], clock.clone(), Duration::ZERO);
    let mut engine = FramingEngine::with_parts(source, SeparatorParser::default(), clock);

    let message = engine.read_until_separator(Duration::ZERO).unwrap();
    assert_eq!(message, Bytes::from_static(b"OK\n"));
}

#[test]
fn test_silent_device_times_out_with_empty_buffer() {
    let clock = ManualClock::new();
    // Silent for two seconds' worth of polls, 10ms apart
    let source = ChunkSource::new(&[], clock.clone(), Duration::from_millis(10));
    let mut engine =
        FramingEngine::with_parts(source, SeparatorParser::default(), clock.clone());

    let message = engine.read_until_separator(Duration::from_secs(1)).unwrap();

    assert!(message.is_empty());
    let elapsed = clock.now();
    assert!(elapsed > Duration::from_secs(1));
    assert!(elapsed <= Duration::from_millis(1010));
}

#[test]
fn test_fixed_length_predicate_leaves_third_chunk() {
    let clock = ManualClock::new();
    let source = ChunkSource::new(&[b"AB", b"CD", b"EF"], clock.clone(), Duration::ZERO);
    let parser = PredicateParser::new(|buf| buf.len() >= 4, |buf| Bytes::copy_from_slice(buf));
    let mut engine = FramingEngine::with_parts(source, parser, clock);

    let message = engine
        .read_until_complete(Duration::ZERO, 2, Duration::ZERO)
        .unwrap();

    assert_eq!(message, Bytes::from_static(b"ABCD"));
    assert!(engine.parser().is_finished());
    assert_eq!(engine.source().consumed, 2);
    assert_eq!(engine.source().chunks.front(), Some(&&b"EF"[..]));
}

#[test]
fn test_finished_only_after_deciding_append() {
    let mut parser = PredicateParser::fixed_length(4);
    parser.setup();
    assert!(!parser.is_finished());

    parser.append(b"AB");
    assert!(!parser.is_finished());
    parser.append(b"CD");
    assert!(parser.is_finished());
    parser.append(b"EF");
    assert!(parser.is_finished());
}

#[test]
fn test_consecutive_predicate_reads_are_independent() {
    let source = SliceSource::new(&b"1234abcd"[..]).max_per_read(3);
    let mut engine =
        FramingEngine::new(source).with_parser(PredicateParser::fixed_length(4));

    // Chunks of three: "123", "4ab" completes the first message and
    // swallows "ab", which no message owns afterwards.
    let first = engine
        .read_until_complete(Duration::from_millis(50), 3, Duration::ZERO)
        .unwrap();
    assert_eq!(&first[..], b"1234");

    let second = engine
        .read_until_complete(Duration::from_millis(50), 3, Duration::ZERO)
        .unwrap();
    assert_eq!(&second[..], b"cd");
}

#[test]
fn test_zero_timeout_waits_for_slow_separator() {
    let clock = ManualClock::new();
    // An hour between bytes
    let source = ChunkSource::new(
        &[b"S", b"L", b"O", b"W", b"\n"],
        clock.clone(),
        Duration::from_secs(3600),
    );
    let mut engine =
        FramingEngine::with_parts(source, SeparatorParser::default(), clock.clone());

    let message = engine.read_until_separator(Duration::ZERO).unwrap();
    assert_eq!(&message[..], b"SLOW\n");
    assert_eq!(clock.now(), Duration::from_secs(5 * 3600));
}

#[test]
fn test_custom_message_type() {
    #[derive(Debug, PartialEq)]
    struct Reading {
        channel: u8,
        value: u16,
    }

    // [channel, hi, lo]
    let parser = PredicateParser::new(
        |buf| buf.len() >= 3,
        |buf| match buf {
            [channel, hi, lo, ..] => Ok(Reading {
                channel: *channel,
                value: u16::from_be_bytes([*hi, *lo]),
            }),
            _ => Err(format!("short frame: {} bytes", buf.len())),
        },
    );

    let source = SliceSource::new(vec![0x02, 0x01, 0x2C]).max_per_read(1);
    let mut engine = FramingEngine::new(source).with_parser(parser);

    let reading = engine.read_until_complete_with(Duration::from_millis(100)).unwrap();
    assert_eq!(
        reading,
        Ok(Reading {
            channel: 2,
            value: 300
        })
    );

    let timed_out = engine.read_until_complete_with(Duration::from_millis(20)).unwrap();
    assert_eq!(timed_out, Err("short frame: 0 bytes".to_string()));
}
