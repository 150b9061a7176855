//! Line configuration applied to a device before it is opened
//!
//! Only used for [`TransportKind::File`](crate::config::TransportKind::File):
//! the direct transport configures speed and data bits itself.

use crate::config::PortConfig;
use crate::error::FramingError;
use std::path::Path;
use std::process::Command;

#[cfg(feature = "logging")]
use tracing::debug;

/// Applies OS-level line settings (speed, data bits, raw mode) to a device
pub trait LineConfigurator {
    /// Configure `device` according to `config`
    fn configure(&self, device: &Path, config: &PortConfig) -> Result<(), FramingError>;
}

/// Leaves the device untouched, for lines configured out of band
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopConfigurator;

impl LineConfigurator for NoopConfigurator {
    fn configure(&self, _device: &Path, _config: &PortConfig) -> Result<(), FramingError> {
        Ok(())
    }
}

/// Configures the line with `stty` (unix) or `mode` (Windows)
///
/// The unix flags put the tty in raw mode: no echo, no canonical line
/// editing, no CR/NL translation and no software or hardware flow control.
/// Reads wait for at least one byte (`min 1 time 0`), so an idle
/// non-blocking line reports `EAGAIN` instead of a zero-length read.
#[derive(Debug, Clone, Copy, Default)]
pub struct SttyConfigurator;

/// Raw-mode flags passed to stty after speed and character size
const STTY_RAW_FLAGS: &[&str] = &[
    "-brkint", "-icrnl", "-imaxbel", "-opost", "-onlcr", "-isig", "-icanon", "-iexten", "-echo",
    "-echoe", "-echok", "-echoctl", "-echoke", "-ixon", "-crtscts", "ignbrk", "noflsh", "min", "1",
    "time", "0",
];

impl SttyConfigurator {
    /// Build the command that would configure `device`
    pub fn command(&self, device: &Path, config: &PortConfig) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("mode");
            cmd.arg(device)
                .arg(format!("BAUD={}", config.baud_rate))
                .arg(format!("DATA={}", config.data_bits))
                .args(["PARITY=n", "STOP=1", "xon=off", "rts=off"]);
            cmd
        } else {
            let mut cmd = Command::new("stty");
            cmd.arg("-F")
                .arg(device)
                .arg(config.baud_rate.to_string())
                .arg(format!("cs{}", config.data_bits))
                .args(STTY_RAW_FLAGS);
            cmd
        }
    }
}

impl LineConfigurator for SttyConfigurator {
    fn configure(&self, device: &Path, config: &PortConfig) -> Result<(), FramingError> {
        config.validate()?;

        let mut cmd = self.command(device, config);

        #[cfg(feature = "logging")]
        debug!("Configuring {}: {:?}", device.display(), cmd);

        let status = cmd
            .status()
            .map_err(|e| FramingError::Config(format!("failed to run line configuration: {}", e)))?;

        if !status.success() {
            return Err(FramingError::Config(format!(
                "line configuration of {} failed with {}",
                device.display(),
                status
            )));
        }

        Ok(())
    }
}
