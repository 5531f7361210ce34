//! CLI tool for sgar archive operations.

mod commands;
mod exit_codes;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SGA scene archive inspector
#[derive(Parser)]
#[command(name = "sgar")]
#[command(author, version, about = "SGA scene archive inspector", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show archive information (alias: i)
    #[command(alias = "i")]
    Info {
        /// Archive file to inspect
        archive: PathBuf,
    },

    /// Print the full structural report (alias: d)
    #[command(alias = "d")]
    Dump {
        /// Archive file to report on
        archive: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Info { archive } => commands::info(&archive),
        Commands::Dump { archive } => commands::dump(&archive),
    };

    std::process::exit(exit_code.code());
}
