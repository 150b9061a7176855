use super::{open_port, DeviceOptions};
use crate::OutputFormat;
use anyhow::{Context, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serialframe_core::{FramingError, PredicateParser, SeparatorParser, SerialPort};
use std::fs;
use std::time::Duration;
use tracing::{info, warn};

/// How messages are delimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Messages end at this byte
    Separator(u8),
    /// Messages are exactly this many bytes
    Length(usize),
}

/// Options for the `read` command
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub device: DeviceOptions,
    pub framing: Framing,
    pub timeout_ms: u64,
    pub count: usize,
    pub chunk_size: usize,
    pub poll_delay_ms: u64,
    pub format: OutputFormat,
    pub output: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub index: usize,
    pub len: usize,
    pub complete: bool,
    pub text: String,
    pub hex: String,
}

pub fn execute(opts: &ReadOptions) -> Result<()> {
    info!("Reading {} messages from {}", opts.count, opts.device.device);

    let timeout = Duration::from_millis(opts.timeout_ms);
    let messages = match opts.framing {
        Framing::Separator(separator) => {
            let port = SerialPort::new().with_parser(SeparatorParser::new(separator));
            let mut port = open_port(port, &opts.device)?;
            collect(
                opts.count,
                || port.read(timeout),
                |m| m.last() == Some(&separator),
            )?
        }
        Framing::Length(len) => {
            let port = SerialPort::new().with_parser(PredicateParser::fixed_length(len));
            let mut port = open_port(port, &opts.device)?;
            let delay = Duration::from_millis(opts.poll_delay_ms);
            collect(
                opts.count,
                || port.read_until_complete(timeout, opts.chunk_size, delay),
                |m| m.len() == len,
            )?
        }
    };

    info!("Received {} messages", messages.len());

    let rendered = render(&messages, opts.format)?;
    match &opts.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write output file: {}", path))?;
            info!("Messages written to: {}", path);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Read up to `count` messages, stopping early on a silent device or end of stream
fn collect(
    count: usize,
    mut next: impl FnMut() -> Result<Bytes, FramingError>,
    is_complete: impl Fn(&[u8]) -> bool,
) -> Result<Vec<ReceivedMessage>> {
    let mut messages = Vec::with_capacity(count);

    for index in 0..count {
        let message = match next() {
            Ok(message) => message,
            Err(FramingError::EndOfStream) => {
                info!("End of stream after {} messages", index);
                break;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read message {}", index)),
        };

        if message.is_empty() {
            warn!("Device silent, stopping after {} messages", index);
            break;
        }

        let complete = is_complete(&message);
        if !complete {
            warn!("Message {} timed out with {} partial bytes", index, message.len());
        }

        messages.push(ReceivedMessage {
            index,
            len: message.len(),
            complete,
            text: String::from_utf8_lossy(&message).into_owned(),
            hex: hex::encode(&message),
        });
    }

    Ok(messages)
}

fn render(messages: &[ReceivedMessage], format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(messages)
                .with_context(|| "Failed to serialize messages")?;
            json.push('\n');
            json
        }
        OutputFormat::Text => messages
            .iter()
            .map(|m| format!("{}\n", m.text.trim_end_matches(['\r', '\n'])))
            .collect(),
        OutputFormat::Hex => messages.iter().map(|m| format!("{}\n", m.hex)).collect(),
    };
    Ok(rendered)
}
