//! Library entry for serialframe-cli used by integration tests and embedding.

pub mod commands;

// Re-export commands for convenience
pub use commands::*;

use serialframe_core::TransportKind;

/// Transport selection on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum TransportArg {
    /// Device file opened non-blocking, line configured with stty
    File,
    /// Direct device I/O through the serial backend
    Direct,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::File => TransportKind::File,
            TransportArg::Direct => TransportKind::Direct,
        }
    }
}

/// How received messages are printed
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// UTF-8 text, invalid sequences replaced
    Text,
    /// Lowercase hex
    Hex,
    /// JSON array of message records
    Json,
}

/// Parse a single byte: a character, an escape (`\n`, `\r`, `\t`, `\0`) or hex (`0x0d`)
pub fn parse_byte(s: &str) -> Result<u8, String> {
    match s {
        "\\n" => return Ok(b'\n'),
        "\\r" => return Ok(b'\r'),
        "\\t" => return Ok(b'\t'),
        "\\0" => return Ok(0),
        _ => {}
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u8::from_str_radix(hex, 16).map_err(|e| format!("invalid hex byte {}: {}", s, e));
    }

    match s.as_bytes() {
        [b] => Ok(*b),
        _ => Err(format!("expected a single byte, got {:?}", s)),
    }
}

/// Expand `\n`, `\r`, `\t`, `\0`, `\\` and `\xNN` escapes in `s`
pub fn unescape(s: &str) -> Result<Vec<u8>, String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        match bytes.get(i + 1) {
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(b't') => out.push(b'\t'),
            Some(b'0') => out.push(0),
            Some(b'\\') => out.push(b'\\'),
            Some(b'x') => {
                let hex = bytes
                    .get(i + 2..i + 4)
                    .ok_or_else(|| format!("truncated \\x escape at offset {}", i))?;
                let hex = std::str::from_utf8(hex).map_err(|e| e.to_string())?;
                let value = u8::from_str_radix(hex, 16)
                    .map_err(|e| format!("invalid \\x escape at offset {}: {}", i, e))?;
                out.push(value);
                i += 4;
                continue;
            }
            Some(other) => return Err(format!("unknown escape \\{}", *other as char)),
            None => return Err("trailing backslash".to_string()),
        }
        i += 2;
    }

    Ok(out)
}
