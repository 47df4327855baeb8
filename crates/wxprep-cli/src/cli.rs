//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wxprep_core::config::DEFAULT_CONFIG_FILE;

/// Preprocess ECMWF reanalysis downloads and DPIRD station exports
#[derive(Parser, Debug)]
#[command(name = "wxprep", author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (overridden by RUST_LOG)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract `*single*.nc` ZIP archives in place
    Unzip {
        /// Configuration file
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Run the ECMWF clean pipeline
    Clean {
        /// Configuration file
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Exit non-zero when any month fails
        #[arg(long)]
        strict: bool,
    },
    /// DPIRD station commands
    Dpird {
        /// DPIRD action
        #[command(subcommand)]
        action: DpirdAction,
    },
    /// Configuration helpers
    Config {
        /// Config action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `wxprep dpird ...`
#[derive(Subcommand, Debug)]
pub enum DpirdAction {
    /// Stack station CSVs and write one dataset
    Combine {
        /// Configuration file
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// List stations that are missing from the metadata table
    Check {
        /// Configuration file
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Month folder to check (default: newest under raw_dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

/// `wxprep config ...`
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a template configuration
    Init {
        /// Where to write it
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the resolved configuration as YAML
    Show {
        /// Configuration file
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}
