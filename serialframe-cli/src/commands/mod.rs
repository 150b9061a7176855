//! Subcommand implementations

pub mod list;
pub mod read;
pub mod write;

use crate::TransportArg;
use anyhow::{Context, Result};
use serialframe_core::configure::NoopConfigurator;
use serialframe_core::{PortConfig, SerialPort};
use std::fs;
use tracing::debug;

/// Which device to open and how
#[derive(Debug, Clone, Default)]
pub struct DeviceOptions {
    /// Device path (or COM name with the direct transport)
    pub device: String,

    /// JSON file holding a `PortConfig`
    pub config: Option<String>,

    /// Transport override
    pub transport: Option<TransportArg>,

    /// Baud rate override
    pub baud: Option<u32>,

    /// Do not run line configuration before opening
    pub skip_configure: bool,

    /// Treat zero-length device reads as idle (lines left with `VMIN=0`)
    pub zero_read_idle: bool,
}

/// Build the port configuration: file first, then command-line overrides
pub fn load_config(opts: &DeviceOptions) -> Result<PortConfig> {
    let mut config = match &opts.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        }
        None => PortConfig::default(),
    };

    if let Some(transport) = opts.transport {
        config.transport = transport.into();
    }
    if let Some(baud) = opts.baud {
        config.baud_rate = baud;
    }
    if opts.zero_read_idle {
        config.zero_read_is_idle = true;
    }

    debug!("Port configuration: {:?}", config);
    Ok(config)
}

/// Open the device described by `opts` on `port`
pub fn open_port<P>(port: SerialPort<P>, opts: &DeviceOptions) -> Result<SerialPort<P>> {
    let config = load_config(opts)?;

    let mut port = if opts.skip_configure {
        port.with_configurator(NoopConfigurator)
    } else {
        port
    };

    port.open(&opts.device, &config)
        .with_context(|| format!("Failed to open device: {}", opts.device))?;

    Ok(port)
}
