use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use serialframe_cli::commands::{
    self,
    read::{Framing, ReadOptions},
    write::WriteOptions,
    DeviceOptions,
};
use serialframe_cli::{parse_byte, OutputFormat, TransportArg};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "serialframe")]
#[command(about = "Serialframe - Framed message I/O over serial lines", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DeviceArgs {
    /// Device path, e.g. /dev/ttyACM0
    #[arg(short, long)]
    device: String,

    /// JSON port configuration file
    #[arg(long)]
    config: Option<String>,

    /// Transport used to talk to the device
    #[arg(long, value_enum)]
    transport: Option<TransportArg>,

    /// Baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Skip line configuration (device already configured)
    #[arg(long)]
    skip_configure: bool,

    /// Treat zero-length reads as "no data" (line left with VMIN=0)
    #[arg(long)]
    zero_read_idle: bool,
}

impl From<DeviceArgs> for DeviceOptions {
    fn from(args: DeviceArgs) -> Self {
        DeviceOptions {
            device: args.device,
            config: args.config,
            transport: args.transport,
            baud: args.baud,
            skip_configure: args.skip_configure,
            zero_read_idle: args.zero_read_idle,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List serial ports present on this machine
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read framed messages from a device
    Read {
        #[command(flatten)]
        device: DeviceArgs,

        /// Message separator: character, escape (\n, \r) or hex (0x0d)
        #[arg(long, value_parser = parse_byte, default_value = "\\n")]
        separator: u8,

        /// Read fixed-length messages of this many bytes instead
        #[arg(long)]
        length: Option<usize>,

        /// Idle timeout in milliseconds (0 waits forever)
        #[arg(long, default_value = "1000")]
        timeout_ms: u64,

        /// Number of messages to read
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Bytes requested per poll in fixed-length mode
        #[arg(long, default_value = "256")]
        chunk_size: usize,

        /// Sleep between empty polls in fixed-length mode, in milliseconds
        #[arg(long, default_value = "0")]
        poll_delay_ms: u64,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write messages to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Write bytes to a device
    Write {
        #[command(flatten)]
        device: DeviceArgs,

        /// Payload; supports \n, \r, \t, \0, \\ and \xNN escapes
        #[arg(long)]
        data: String,

        /// Interpret the payload as hex
        #[arg(long)]
        hex: bool,

        /// Read one reply line after writing
        #[arg(long)]
        reply: bool,

        /// Reply separator
        #[arg(long, value_parser = parse_byte, default_value = "\\n")]
        separator: u8,

        /// Reply idle timeout in milliseconds
        #[arg(long, default_value = "1000")]
        timeout_ms: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::List { json } => commands::list::execute(json),

        Commands::Read {
            device,
            separator,
            length,
            timeout_ms,
            count,
            chunk_size,
            poll_delay_ms,
            format,
            output,
        } => {
            let framing = match length {
                Some(0) => bail!("--length must be greater than zero"),
                Some(len) => Framing::Length(len),
                None => Framing::Separator(separator),
            };

            commands::read::execute(&ReadOptions {
                device: device.into(),
                framing,
                timeout_ms,
                count,
                chunk_size,
                poll_delay_ms,
                format,
                output,
            })
        }

        Commands::Write {
            device,
            data,
            hex,
            reply,
            separator,
            timeout_ms,
        } => commands::write::execute(&WriteOptions {
            device: device.into(),
            data,
            hex,
            reply,
            separator,
            timeout_ms,
        }),
    }
}
