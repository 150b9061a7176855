//! Error types for serialframe operations

/// Errors that can occur while opening, reading from or writing to a device
///
/// Running out of time while waiting for bytes is not an error: both read
/// operations return whatever was accumulated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FramingError {
    /// The device path does not exist
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The device exists but could not be opened
    #[error("Device not available: {0}")]
    DeviceNotAvailable(String),

    /// Read or write attempted on a port with no open device
    #[error("Device not opened")]
    DeviceNotOpened,

    /// The device refused the write
    #[error("Write not allowed: {0}")]
    WriteNotAllowed(String),

    /// The byte source reached end of stream
    #[error("End of stream")]
    EndOfStream,

    /// IO error while reading from the byte source
    #[error("IO error: {0}")]
    Io(String),

    /// Error reported by the serial port backend
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Invalid or unsupported port configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument passed to a read operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<std::io::Error> for FramingError {
    fn from(err: std::io::Error) -> Self {
        FramingError::Io(err.to_string())
    }
}

#[cfg(feature = "serial")]
impl From<serialport::Error> for FramingError {
    fn from(err: serialport::Error) -> Self {
        FramingError::Serial(err.to_string())
    }
}
