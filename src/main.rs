//! spimux - AT91 SPI device multiplexing exerciser
//!
//! Drives the `spimux-core` bus against the simulated controller from
//! `spimux-sim`, so device settings, chip-select resolution and framing can
//! be checked without hardware.
//!
//! # Commands
//!
//! - `list` - controller variants and the pins wired to each NPCS output
//! - `resolve` - whether a pin gets automatic or bit-banged chip select
//! - `xfer` - one transfer on one device, with a chip-select trace
//! - `run` - devices and transfers described in a TOML bus file

mod cli;
mod commands;
mod error;
mod options;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let result = match cli.command {
        Commands::List => {
            commands::list_variants();
            Ok(())
        }
        Commands::Resolve {
            variant,
            channel,
            cs,
        } => commands::resolve::run(variant, channel, &cs),
        Commands::Xfer {
            variant,
            device,
            hex,
            no_terminate,
            responder,
        } => commands::xfer::run(variant, &device, &hex, !no_terminate, responder),
        Commands::Run { file } => commands::script::run(&file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
