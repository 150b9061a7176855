//! Defaults and limits shared by the framing engine and the port glue

use core::time::Duration;

/// Separator used when no parser is configured (newline-terminated lines)
pub const DEFAULT_SEPARATOR: u8 = b'\n';

/// Bytes requested per poll in predicate mode
pub const DEFAULT_READ_CHUNK_SIZE: usize = 256;

/// Sleep between empty polls in predicate mode (zero = busy-poll)
pub const DEFAULT_IDLE_POLL_DELAY: Duration = Duration::ZERO;

/// Idle timeout meaning "wait forever"
pub const NO_TIMEOUT: Duration = Duration::ZERO;

/// Default line speed, suitable for an Arduino serial connection
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default number of data bits per character
pub const DEFAULT_DATA_BITS: u8 = 8;

/// Smallest supported number of data bits
pub const MIN_DATA_BITS: u8 = 5;

/// Largest supported number of data bits
pub const MAX_DATA_BITS: u8 = 8;

/// Per-read timeout handed to the serial backend for the direct transport.
///
/// Kept short so a poll never holds the calling thread for more than an OS
/// quantum or so.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 1;
