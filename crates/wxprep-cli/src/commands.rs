//! Command handlers.
//!
//! Each handler loads its configuration, runs the library call and prints a
//! short summary on stdout. Logs go to stderr through `tracing`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use wxprep_core::{Config, default_store};

use crate::cli::{Command, ConfigAction, DpirdAction};

/// Runs one parsed command.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Unzip { config } => cmd_unzip(&config),
        Command::Clean { config, strict } => cmd_clean(&config, strict),
        Command::Dpird { action } => match action {
            DpirdAction::Combine { config } => cmd_dpird_combine(&config),
            DpirdAction::Check { config, dir } => cmd_dpird_check(&config, dir.as_deref()),
        },
        Command::Config { action } => match action {
            ConfigAction::Init { path, force } => cmd_config_init(&path, force),
            ConfigAction::Show { config } => cmd_config_show(&config),
        },
    }
}

fn load(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("cannot load config {}", path.display()))
}

/// Extracts ZIP archives under `untar_ecmwf_dir`.
pub fn cmd_unzip(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    let report = wxprep_ecmwf::unzip_all(config.untar_dir()?, config.remove_zip)?;
    println!(
        "Scanned {} folders: {} extracted archives, {} marked, {} already done, {} failed",
        report.folders_scanned,
        report.archives_extracted,
        report.folders_marked,
        report.folders_skipped,
        report.failed.len()
    );
    for (dir, reason) in &report.failed {
        println!("  failed: {}: {reason}", dir.display());
    }
    Ok(())
}

/// Runs the ECMWF clean pipeline.
pub fn cmd_clean(config_path: &Path, strict: bool) -> Result<()> {
    let config = load(config_path)?;
    let store = default_store()?;
    let report = wxprep_ecmwf::run(&config, &*store)?;
    println!(
        "Processed {}/{} months, wrote {} daily files",
        report.processed.len(),
        report.months_found,
        report.days_written
    );
    for (dir, reason) in &report.failed {
        println!("  failed: {}: {reason}", dir.display());
    }
    if strict && !report.is_success() {
        bail!("{} month(s) failed", report.failed.len());
    }
    Ok(())
}

/// Stacks all station CSVs into one dataset.
pub fn cmd_dpird_combine(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    let store = default_store()?;
    let out = wxprep_dpird::combine(&config, &*store)?;
    println!("Wrote {}", out.display());
    Ok(())
}

/// Lists stations with data but no metadata.
pub fn cmd_dpird_check(config_path: &Path, dir: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let missing = wxprep_dpird::check(&config, dir)?;
    if missing.is_empty() {
        println!("All stations are present in the metadata");
    } else {
        println!("Stations missing from metadata:");
        for station in &missing {
            println!("  {station}");
        }
    }
    Ok(())
}

/// Writes the template configuration to `path`.
pub fn cmd_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(path, Config::template())
        .with_context(|| format!("cannot write {}", path.display()))?;
    println!("Config file created at {}", path.display());
    Ok(())
}

/// Prints the resolved configuration, defaults filled in.
pub fn cmd_config_show(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    print!("{}", config.to_yaml_string()?);
    Ok(())
}
