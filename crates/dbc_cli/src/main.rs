//! DBC CLI
//!
//! Command-line tools for DBC files.
//!
//! # Commands
//!
//! - `inspect` - Display header fields and id statistics
//! - `get` - Print one record
//! - `verify` - Load a file completely and report the first problem

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line tools for DBC record files.
#[derive(Parser)]
#[command(name = "dbc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display header fields and id statistics
    Inspect {
        /// Path to the DBC file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print every field of one record
    Get {
        /// Path to the DBC file
        file: PathBuf,

        /// Record layout, one character per field (e.g. `nisf`)
        #[arg(short, long)]
        layout: String,

        /// Record id
        #[arg(short, long)]
        id: u32,

        /// Read only the requested record instead of the whole file
        #[arg(short, long)]
        stream: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Load the whole file and check every invariant
    Verify {
        /// Path to the DBC file
        file: PathBuf,

        /// Record layout, one character per field (e.g. `nisf`)
        #[arg(short, long)]
        layout: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { file, format } => {
            commands::inspect::run(&file, format)?;
        }
        Commands::Get {
            file,
            layout,
            id,
            stream,
            format,
        } => {
            commands::get::run(&file, &layout, id, stream, format)?;
        }
        Commands::Verify { file, layout } => {
            commands::verify::run(&file, &layout)?;
        }
        Commands::Version => {
            println!("dbc CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("dbc_core v{}", dbc_core::VERSION);
        }
    }

    Ok(())
}
