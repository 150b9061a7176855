//! Read newline-terminated lines from a serial device
//!
//! Usage: cargo run --example line_reader -- /dev/ttyACM0

use serialframe_core::{PortConfig, SerialPort};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let device = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyACM0".to_string());

    println!("Serialframe Line Reader\n");

    let mut port = SerialPort::new();
    port.open(&device, &PortConfig::default())?;

    for _ in 0..10 {
        let line = port.read(Duration::from_secs(2))?;
        if line.is_empty() {
            println!("(no data within 2s)");
            continue;
        }
        println!("{}", String::from_utf8_lossy(&line).trim_end());
    }

    port.close()?;
    Ok(())
}
