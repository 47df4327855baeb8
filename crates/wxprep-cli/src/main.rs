//! wxprep CLI
//!
//! Preprocessing for ECMWF reanalysis downloads and DPIRD station exports.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use wxprep_cli::{Cli, dispatch, logging};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_level.as_deref())?;
    dispatch(cli.command)
}
