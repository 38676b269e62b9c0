//! # Cleanroom command-line entry point
//!
//! ```bash
//! cleanroom actions
//! cleanroom diagnose --input data.csv
//! cleanroom run --input data.csv --steps steps.json --preview 20
//! ```
//!
//! Set `RUST_LOG=debug` to see per-step logs on the console; the log file in
//! the platform data directory always records them.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    cleanroom::logging::init()?;

    let cli = cli::Cli::parse();
    cli::run_command(cli)
}
