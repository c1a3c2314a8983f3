//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod extract;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "readaloud")]
#[command(about = "OCR text extraction service that reads the result aloud")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address: PORT, HOST, or HOST:PORT (default from config, then 127.0.0.1:5000)
        bind: Option<String>,
    },

    /// Extract text from a local PDF or image file
    Extract {
        /// File to read
        file: PathBuf,
        /// Client language code (en, hi, mr)
        #[arg(short, long, default_value = "en")]
        language: String,
        /// Read the result aloud and wait for playback to finish
        #[arg(short, long)]
        speak: bool,
    },

    /// Check availability of OCR and speech tools
    Check,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let settings = load_settings_with_options(options).await;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::Extract {
            file,
            language,
            speak,
        } => extract::cmd_extract(&settings, &file, &language, speak).await,
        Commands::Check => check::cmd_check(&settings),
    }
}
