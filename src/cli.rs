//! CLI argument parsing

use clap::{Parser, Subcommand};
use spimux_core::Variant;
use std::path::PathBuf;

/// Parse a controller variant name
fn parse_variant(s: &str) -> Result<Variant, String> {
    s.parse().map_err(|_| {
        let names: Vec<_> = Variant::ALL.iter().map(|v| v.name()).collect();
        format!("Unknown variant: {} [available: {}]", s, names.join(", "))
    })
}

/// What the simulated bus answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResponderKind {
    /// MISO wired to MOSI
    Loopback,
    /// All ones
    Ones,
    /// All zeros
    Zeros,
}

#[derive(Parser)]
#[command(name = "spimux")]
#[command(author, version, about = "AT91 SPI device multiplexing exerciser", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List controller variants and their chip-select routes
    List,

    /// Show how a chip-select pin would be driven on a channel
    Resolve {
        /// Controller variant
        #[arg(long, default_value = "sam7s", value_parser = parse_variant)]
        variant: Variant,

        /// Channel (0-3)
        #[arg(short, long)]
        channel: u8,

        /// Chip-select pin, e.g. PA10
        #[arg(long)]
        cs: String,
    },

    /// Run one transfer against the simulated controller
    Xfer {
        /// Controller variant
        #[arg(long, default_value = "sam7s", value_parser = parse_variant)]
        variant: Variant,

        /// Device options, e.g. "ch=2,cs=PA10,bits=8,framing=toggle"
        #[arg(short, long, default_value = "")]
        device: String,

        /// Bytes to send, in hex
        #[arg(short = 'x', long)]
        hex: String,

        /// Leave chip select asserted after the last word
        #[arg(long)]
        no_terminate: bool,

        /// Simulated bus response
        #[arg(long, value_enum, default_value_t = ResponderKind::Loopback)]
        responder: ResponderKind,
    },

    /// Create the devices of a bus file and run its transfers
    Run {
        /// Bus description (TOML format)
        file: PathBuf,
    },
}
