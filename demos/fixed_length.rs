//! Reassemble fixed-size binary records from a chunked byte stream
//!
//! Uses an in-memory source, so it runs without hardware.

use serialframe_core::{FramingEngine, PredicateParser, SliceSource};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Serialframe Fixed-Length Example\n");

    // Three 6-byte records trickling in 3 bytes at a time
    let stream: Vec<u8> = (0u8..18).collect();
    let source = SliceSource::new(stream).max_per_read(3);
    let mut engine = FramingEngine::new(source).with_parser(PredicateParser::fixed_length(6));

    for i in 1..=3 {
        let record = engine.read_until_complete(Duration::from_millis(100), 3, Duration::ZERO)?;
        println!("Record {}: {:02x?}", i, &record[..]);
    }

    println!("\nLeft unread: {} bytes", engine.source().remaining().len());

    Ok(())
}
