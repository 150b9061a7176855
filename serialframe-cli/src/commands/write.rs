use super::{open_port, DeviceOptions};
use crate::unescape;
use anyhow::{anyhow, Context, Result};
use serialframe_core::{FramingError, SeparatorParser, SerialPort};
use std::time::Duration;
use tracing::{info, warn};

/// Options for the `write` command
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub device: DeviceOptions,
    /// Payload, with escapes, or hex when `hex` is set
    pub data: String,
    pub hex: bool,
    /// Read one reply terminated by `separator` after writing
    pub reply: bool,
    pub separator: u8,
    pub timeout_ms: u64,
}

/// Decode the payload given on the command line
pub fn decode_data(data: &str, is_hex: bool) -> Result<Vec<u8>> {
    if is_hex {
        let compact: String = data.split_whitespace().collect();
        hex::decode(&compact).with_context(|| format!("Invalid hex payload: {}", data))
    } else {
        unescape(data).map_err(|e| anyhow!("Invalid payload {:?}: {}", data, e))
    }
}

pub fn execute(opts: &WriteOptions) -> Result<()> {
    let payload = decode_data(&opts.data, opts.hex)?;

    let port = SerialPort::new().with_parser(SeparatorParser::new(opts.separator));
    let mut port = open_port(port, &opts.device)?;

    let written = port
        .write(&payload)
        .with_context(|| format!("Failed to write to {}", opts.device.device))?;
    info!("Wrote {} of {} bytes", written, payload.len());

    if written < payload.len() {
        warn!("Short write: {} bytes not accepted", payload.len() - written);
    }

    if opts.reply {
        match port.read(Duration::from_millis(opts.timeout_ms)) {
            Ok(reply) if reply.is_empty() => println!("(no reply)"),
            Ok(reply) => println!("{}", String::from_utf8_lossy(&reply).trim_end()),
            Err(FramingError::EndOfStream) => println!("(no reply)"),
            Err(e) => return Err(e).context("Failed to read reply"),
        }
    }

    port.close()?;
    Ok(())
}
