//! Port configuration

use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_DATA_BITS, DEFAULT_POLL_TIMEOUT_MS, MAX_DATA_BITS, MIN_DATA_BITS,
};
use crate::error::FramingError;
use serde::{Deserialize, Serialize};

/// How the device is opened and read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Device file opened non-blocking; the line is configured beforehand
    #[default]
    File,
    /// Direct device I/O through the serial backend, which also configures
    /// the line
    Direct,
}

/// Line and transport settings applied when a port is opened
///
/// Defaults suit an Arduino: 115200 baud, 8 data bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// Line speed in bits per second
    pub baud_rate: u32,

    /// Data bits per character (5-8)
    pub data_bits: u8,

    /// Transport used to talk to the device
    pub transport: TransportKind,

    /// Per-read timeout handed to the serial backend, in milliseconds
    pub poll_timeout_ms: u64,

    /// Treat a zero-length read from a device file as "no data" rather than
    /// end of stream. Needed for ttys left with `VMIN=0` by whoever
    /// configured them.
    pub zero_read_is_idle: bool,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DEFAULT_DATA_BITS,
            transport: TransportKind::default(),
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            zero_read_is_idle: false,
        }
    }
}

impl PortConfig {
    /// Set a named option; returns `false` for an unknown name
    ///
    /// Known names: `baud`, `data_bits`, `dio` (non-zero selects the direct
    /// transport), `poll_timeout_ms` and `zero_read_is_idle` (non-zero
    /// enables it). Values are not range-checked here,
    /// see [`PortConfig::validate`].
    pub fn set_option(&mut self, name: &str, value: u64) -> bool {
        match name {
            "baud" => self.baud_rate = value.min(u64::from(u32::MAX)) as u32,
            "data_bits" => self.data_bits = value.min(u64::from(u8::MAX)) as u8,
            "dio" => {
                self.transport = if value != 0 {
                    TransportKind::Direct
                } else {
                    TransportKind::File
                }
            }
            "poll_timeout_ms" => self.poll_timeout_ms = value,
            "zero_read_is_idle" => self.zero_read_is_idle = value != 0,
            _ => return false,
        }
        true
    }

    /// Read a named option, `None` for an unknown name
    pub fn option(&self, name: &str) -> Option<u64> {
        match name {
            "baud" => Some(u64::from(self.baud_rate)),
            "data_bits" => Some(u64::from(self.data_bits)),
            "dio" => Some(u64::from(self.transport == TransportKind::Direct)),
            "poll_timeout_ms" => Some(self.poll_timeout_ms),
            "zero_read_is_idle" => Some(u64::from(self.zero_read_is_idle)),
            _ => None,
        }
    }

    /// Check the settings can be applied to a line
    pub fn validate(&self) -> Result<(), FramingError> {
        if self.baud_rate == 0 {
            return Err(FramingError::Config("baud rate must be non-zero".into()));
        }

        if !(MIN_DATA_BITS..=MAX_DATA_BITS).contains(&self.data_bits) {
            return Err(FramingError::Config(format!(
                "data bits must be between {} and {}, got {}",
                MIN_DATA_BITS, MAX_DATA_BITS, self.data_bits
            )));
        }

        Ok(())
    }
}
