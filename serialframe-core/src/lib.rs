//! # Serialframe Core
//!
//! Message framing over a serial line: reassembles a raw byte stream into
//! discrete messages under a pluggable framing policy, with idle timeouts.
//!
//! ## Modules
//!
//! - `constants`: Defaults and limits
//! - `error`: Error type
//! - `clock`: Time sources for idle timeouts
//! - `source`: Byte source/sink abstraction and adapters
//! - `parser`: Frame parser contract
//! - `separator`: Separator-delimited parser
//! - `predicate`: Custom-predicate parser
//! - `engine`: Timeout-aware read loops
//! - `config`: Port configuration
//! - `configure`: Line configuration collaborator
//! - `port`: Device handle (open, read, write, close)

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod configure;
pub mod constants;
pub mod engine;
pub mod error;
pub mod parser;
pub mod port;
pub mod predicate;
pub mod separator;
pub mod source;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{PortConfig, TransportKind};
pub use engine::FramingEngine;
pub use error::FramingError;
pub use parser::FrameParser;
pub use port::SerialPort;
pub use predicate::PredicateParser;
pub use separator::SeparatorParser;
pub use source::{ByteSink, ByteSource, SliceSource, StreamTransport, Transport};

/// Result type alias for serialframe operations
pub type Result<T> = core::result::Result<T, FramingError>;
