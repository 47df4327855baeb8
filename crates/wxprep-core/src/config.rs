//! YAML configuration shared by every wxprep command.
//!
//! ```yaml
//! preprocess: true
//! untar_ecmwf_dir: data/ecmwf_untar
//! processed_data_dir: data/processed
//! destination_folder: ecmwf
//! timezone_shift_hours: 8
//! sources:
//!   ecmwf:
//!     vars: [t2m, d2m, u10, v10, tp, r850]
//! ```
//!
//! Keys that only some commands need are optional here and checked by the
//! accessor that needs them, so one file can drive unzip, clean and the
//! DPIRD commands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config_ecmwf_main.yaml";

const TEMPLATE: &str = r#"# wxprep configuration
preprocess: true

# Raw ECMWF downloads laid out as YYYY/MM/*.nc
untar_ecmwf_dir: data/ecmwf_untar
# Daily files land in <processed_data_dir>/<destination_folder>/YYYY/MM/YYYYMMDD.nc
processed_data_dir: data/processed
destination_folder: ecmwf

# Hours added to valid_time (8 = AWST)
timezone_shift_hours: 8
pressure_levels: [1000, 850, 500]
jobs: 1
remove_zip: true

sources:
  ecmwf:
    vars: [t2m, d2m, u10, v10, sp, tp, r1000, r850, r500, q850, w500]
  dpird:
    raw_dir: data/dpird
    metadata_csv: data/dpird/stations_metadata.csv
    excluded_stations: []
    output_file: dpird/stations.nc
"#;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master switch for the clean pipeline
    pub preprocess: bool,
    /// Root of the raw `YYYY/MM` ECMWF folders
    pub untar_ecmwf_dir: Option<PathBuf>,
    /// Root of all processed output
    pub processed_data_dir: Option<PathBuf>,
    /// Subfolder of `processed_data_dir` for daily ECMWF files
    pub destination_folder: String,
    /// Hours added to `valid_time`
    pub timezone_shift_hours: i64,
    /// Pressure levels (hPa) flattened into single-level variables
    pub pressure_levels: Vec<i64>,
    /// Month folders processed concurrently
    pub jobs: usize,
    /// Delete ZIP archives after extraction
    pub remove_zip: bool,
    /// Per-source settings
    pub sources: Sources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preprocess: false,
            untar_ecmwf_dir: None,
            processed_data_dir: None,
            destination_folder: "ecmwf".to_string(),
            timezone_shift_hours: 0,
            pressure_levels: vec![1000, 850, 500],
            jobs: 1,
            remove_zip: true,
            sources: Sources::default(),
        }
    }
}

/// Per-source settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sources {
    /// ECMWF reanalysis
    pub ecmwf: Option<EcmwfSource>,
    /// DPIRD weather stations
    pub dpird: Option<DpirdSource>,
}

/// ECMWF source settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EcmwfSource {
    /// Variables kept in the daily output
    #[serde(default)]
    pub vars: Vec<String>,
}

/// DPIRD station source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DpirdSource {
    /// Root holding `<month>/<station>.csv`
    pub raw_dir: PathBuf,
    /// Station metadata table (id, lat, lon)
    pub metadata_csv: PathBuf,
    /// Stations skipped entirely
    #[serde(default)]
    pub excluded_stations: Vec<String>,
    /// Combined output, relative to `processed_data_dir`
    #[serde(default = "default_dpird_output")]
    pub output_file: PathBuf,
}

fn default_dpird_output() -> PathBuf {
    PathBuf::from("dpird/stations.nc")
}

impl Config {
    /// Reads and validates a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses and validates YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that no command can work around.
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(Error::config("jobs must be at least 1"));
        }
        if self.pressure_levels.is_empty() {
            return Err(Error::config("pressure_levels must not be empty"));
        }
        if self.destination_folder.trim().is_empty() {
            return Err(Error::config("destination_folder must not be empty"));
        }
        Ok(())
    }

    /// Serializes the resolved configuration back to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::config(e.to_string()))
    }

    /// A commented sample configuration.
    pub fn template() -> &'static str {
        TEMPLATE
    }

    /// `untar_ecmwf_dir`, required by the ECMWF commands.
    pub fn untar_dir(&self) -> Result<&Path> {
        self.untar_ecmwf_dir
            .as_deref()
            .ok_or_else(|| Error::config("untar_ecmwf_dir is required"))
    }

    /// `processed_data_dir`, required by commands that write output.
    pub fn processed_dir(&self) -> Result<&Path> {
        self.processed_data_dir
            .as_deref()
            .ok_or_else(|| Error::config("processed_data_dir is required"))
    }

    /// `sources.ecmwf.vars`, required by the clean pipeline.
    pub fn ecmwf_vars(&self) -> Result<&[String]> {
        match &self.sources.ecmwf {
            Some(src) if !src.vars.is_empty() => Ok(&src.vars),
            _ => Err(Error::config("sources.ecmwf.vars must list at least one variable")),
        }
    }

    /// `sources.dpird`, required by the DPIRD commands.
    pub fn dpird(&self) -> Result<&DpirdSource> {
        self.sources
            .dpird
            .as_ref()
            .ok_or_else(|| Error::config("sources.dpird is required"))
    }
}
