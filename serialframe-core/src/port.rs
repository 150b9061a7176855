//! Serial port handle: opens a device and exposes framed reads and raw writes
//!
//! The open device is held as an owned transport; a closed port simply has
//! none, and every read or write checks for it first.

use crate::clock::{Clock, SystemClock};
use crate::config::{PortConfig, TransportKind};
use crate::configure::{LineConfigurator, SttyConfigurator};
use crate::engine::FramingEngine;
use crate::error::FramingError;
use crate::parser::FrameParser;
use crate::separator::SeparatorParser;
use crate::source::{ByteSink, StreamTransport, Transport};
use core::fmt;
use core::time::Duration;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

#[cfg(feature = "logging")]
use tracing::{debug, info};

/// An opened device
struct Device {
    path: PathBuf,
    transport: Box<dyn Transport>,
}

/// Serial line with a framing policy
///
/// ```no_run
/// use core::time::Duration;
/// use serialframe_core::{PortConfig, SerialPort};
///
/// let mut port = SerialPort::new();
/// port.open("/dev/ttyACM0", &PortConfig::default())?;
/// port.write(b"PING\n")?;
/// let reply = port.read(Duration::from_secs(2))?;
/// println!("{}", String::from_utf8_lossy(&reply));
/// port.close()?;
/// # Ok::<(), serialframe_core::FramingError>(())
/// ```
pub struct SerialPort<P = SeparatorParser, C = SystemClock> {
    parser: P,
    clock: C,
    configurator: Box<dyn LineConfigurator + Send>,
    device: Option<Device>,
}

impl SerialPort {
    /// Create a closed port reading newline-terminated messages
    pub fn new() -> Self {
        Self {
            parser: SeparatorParser::default(),
            clock: SystemClock::new(),
            configurator: Box::new(SttyConfigurator),
            device: None,
        }
    }
}

impl Default for SerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, C> SerialPort<P, C> {
    /// Use `parser` for subsequent reads
    pub fn with_parser<Q>(self, parser: Q) -> SerialPort<Q, C> {
        SerialPort {
            parser,
            clock: self.clock,
            configurator: self.configurator,
            device: self.device,
        }
    }

    /// Measure idle time against `clock`
    pub fn with_clock<D>(self, clock: D) -> SerialPort<P, D> {
        SerialPort {
            parser: self.parser,
            clock,
            configurator: self.configurator,
            device: self.device,
        }
    }

    /// Replace the line configuration step run by [`SerialPort::open`]
    pub fn with_configurator(
        mut self,
        configurator: impl LineConfigurator + Send + 'static,
    ) -> Self {
        self.configurator = Box::new(configurator);
        self
    }

    /// Open `path` with `config`, closing any device already open
    ///
    /// # Errors
    /// - [`FramingError::Config`] if `config` is invalid or line
    ///   configuration fails
    /// - [`FramingError::DeviceNotFound`] if the device path does not exist
    /// - [`FramingError::DeviceNotAvailable`] if the device cannot be opened
    pub fn open(
        &mut self,
        path: impl AsRef<Path>,
        config: &PortConfig,
    ) -> Result<(), FramingError> {
        let path = path.as_ref();
        config.validate()?;

        if let Some(previous) = self.device.take() {
            #[cfg(feature = "logging")]
            debug!("Closing {} before reopening", previous.path.display());
            drop(previous);
        }

        // Windows COM names are not filesystem paths
        let must_exist = config.transport == TransportKind::File || cfg!(unix);
        if must_exist && !path.exists() {
            return Err(FramingError::DeviceNotFound(path.display().to_string()));
        }

        let transport: Box<dyn Transport> = match config.transport {
            TransportKind::File => {
                self.configurator.configure(path, config)?;
                open_file(path, config)?
            }
            TransportKind::Direct => open_direct(path, config)?,
        };

        #[cfg(feature = "logging")]
        info!(
            "Opened {} ({:?}, {} baud, {} data bits)",
            path.display(),
            config.transport,
            config.baud_rate,
            config.data_bits
        );

        self.device = Some(Device {
            path: path.to_path_buf(),
            transport,
        });

        Ok(())
    }

    /// Close the device
    ///
    /// # Errors
    /// [`FramingError::DeviceNotOpened`] if no device is open.
    pub fn close(&mut self) -> Result<(), FramingError> {
        let device = self.device.take().ok_or(FramingError::DeviceNotOpened)?;

        #[cfg(feature = "logging")]
        info!("Closed {}", device.path.display());

        drop(device);
        Ok(())
    }

    /// Whether a device is open
    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Path of the open device
    pub fn device_path(&self) -> Option<&Path> {
        self.device.as_ref().map(|d| d.path.as_path())
    }

    /// Write `data` to the device, returning the number of bytes written
    ///
    /// # Errors
    /// [`FramingError::DeviceNotOpened`] when closed,
    /// [`FramingError::WriteNotAllowed`] when the device refuses the write.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, FramingError> {
        let device = self.device.as_mut().ok_or(FramingError::DeviceNotOpened)?;
        device.transport.write(data)
    }

    /// Borrow the parser
    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Mutably borrow the parser
    pub fn parser_mut(&mut self) -> &mut P {
        &mut self.parser
    }
}

impl<P: FrameParser, C: Clock> SerialPort<P, C> {
    /// Read until the parser's separator; see
    /// [`FramingEngine::read_until_separator`]
    pub fn read(&mut self, timeout: Duration) -> Result<P::Message, FramingError> {
        let device = self.device.as_mut().ok_or(FramingError::DeviceNotOpened)?;
        FramingEngine::with_parts(&mut device.transport, &mut self.parser, &self.clock)
            .read_until_separator(timeout)
    }

    /// Read until the parser reports completion; see
    /// [`FramingEngine::read_until_complete`]
    pub fn read_until_complete(
        &mut self,
        timeout: Duration,
        read_chunk_size: usize,
        idle_poll_delay: Duration,
    ) -> Result<P::Message, FramingError> {
        let device = self.device.as_mut().ok_or(FramingError::DeviceNotOpened)?;
        FramingEngine::with_parts(&mut device.transport, &mut self.parser, &self.clock)
            .read_until_complete(timeout, read_chunk_size, idle_poll_delay)
    }
}

impl<P, C> fmt::Debug for SerialPort<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialPort")
            .field("device", &self.device_path())
            .finish_non_exhaustive()
    }
}

/// Open a device file for non-blocking reads and writes
fn open_file(path: &Path, config: &PortConfig) -> Result<Box<dyn Transport>, FramingError> {
    let mut options = OpenOptions::new();
    options.read(true).write(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY);
    }

    let file = options
        .open(path)
        .map_err(|e| FramingError::DeviceNotAvailable(format!("{}: {}", path.display(), e)))?;

    Ok(Box::new(
        StreamTransport::new(file).zero_read_is_idle(config.zero_read_is_idle),
    ))
}

#[cfg(feature = "serial")]
fn open_direct(path: &Path, config: &PortConfig) -> Result<Box<dyn Transport>, FramingError> {
    use serialport::DataBits;

    let data_bits = match config.data_bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    };

    let port = serialport::new(path.to_string_lossy(), config.baud_rate)
        .data_bits(data_bits)
        .timeout(Duration::from_millis(config.poll_timeout_ms))
        .open()
        .map_err(|e| FramingError::DeviceNotAvailable(format!("{}: {}", path.display(), e)))?;

    Ok(Box::new(StreamTransport::new(port)))
}

#[cfg(not(feature = "serial"))]
fn open_direct(_path: &Path, _config: &PortConfig) -> Result<Box<dyn Transport>, FramingError> {
    Err(FramingError::Config(
        "direct transport requires the `serial` feature".into(),
    ))
}

/// A serial port visible to the system
#[cfg(feature = "serial")]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PortInfo {
    /// Device name or path
    pub name: String,
    /// Connection kind (USB, Bluetooth, PCI, Unknown)
    pub kind: String,
}

/// Enumerate the serial ports present on this machine
#[cfg(feature = "serial")]
pub fn list_ports() -> Result<Vec<PortInfo>, FramingError> {
    let ports = serialport::available_ports()?;

    Ok(ports
        .into_iter()
        .map(|p| {
            let kind = match p.port_type {
                serialport::SerialPortType::UsbPort(_) => "USB",
                serialport::SerialPortType::BluetoothPort => "Bluetooth",
                serialport::SerialPortType::PciPort => "PCI",
                serialport::SerialPortType::Unknown => "Unknown",
            };
            PortInfo {
                name: p.port_name,
                kind: kind.to_string(),
            }
        })
        .collect())
}
