use anyhow::{Context, Result};
use serialframe_core::port::list_ports;
use tracing::info;

pub fn execute(json: bool) -> Result<()> {
    let ports = list_ports().context("Failed to enumerate serial ports")?;
    info!("Found {} serial ports", ports.len());

    if json {
        let rendered = serde_json::to_string_pretty(&ports)
            .with_context(|| "Failed to serialize port list")?;
        println!("{}", rendered);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in &ports {
        println!("{:<24} {}", port.name, port.kind);
    }

    Ok(())
}
