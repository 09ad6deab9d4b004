//! Run configuration.
//!
//! A run is described by a single TOML document. Every section is optional and falls back to
//! the values used for the Nord Stream leak experiment, so a minimal file only needs to point
//! at the input data:
//!
//! ```toml
//! output_dir = "out"
//! max_configs = 100
//!
//! [inputs]
//! calibration = "data/calibrated_constrained_parameters.csv"
//! emissions = "data/ssp_emissions.csv"
//! historical_forcing = "data/natural_forcing.csv"
//!
//! [experiment]
//! pulse_magnitude = 0.25
//! ```

use crate::errors::{InputError, InputResult};
use ch4pulse_core::errors::PulseError;
use ch4pulse_core::forcing::ForcingSettings;
use ch4pulse_core::scenario::PulseExperiment;
use ch4pulse_core::species::standard_species_names;
use ch4pulse_core::time::{TimeAxis, TimePoint};
use ch4pulse_core::FloatValue;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locations of the input files and the tags selecting the baseline pathway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub calibration: PathBuf,
    pub emissions: PathBuf,
    pub historical_forcing: PathBuf,
    /// Scenario tag of the baseline pathway in the emissions archive
    pub baseline_scenario: String,
    /// Configuration tag of the baseline pathway in the emissions archive
    pub baseline_config: String,
    pub calibration_id_column: String,
    pub forcing_columns: HistoricalColumns,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            calibration: PathBuf::from("data/calibrated_constrained_parameters.csv"),
            emissions: PathBuf::from("data/ssp_emissions.csv"),
            historical_forcing: PathBuf::from("data/natural_forcing.csv"),
            baseline_scenario: "ssp245".to_string(),
            baseline_config: "unspecified".to_string(),
            calibration_id_column: "config".to_string(),
            forcing_columns: HistoricalColumns::default(),
        }
    }
}

/// Column names of the historical natural forcing table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalColumns {
    pub year: String,
    pub volcanic: String,
    pub solar: String,
}

impl Default for HistoricalColumns {
    fn default() -> Self {
        Self {
            year: "year".to_string(),
            volcanic: "volcanic".to_string(),
            solar: "solar".to_string(),
        }
    }
}

/// Simulated period in whole years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    pub start_year: i32,
    pub end_year: i32,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            start_year: 1750,
            end_year: 2100,
        }
    }
}

impl HorizonConfig {
    /// Mid-year time points on which emissions are defined
    pub fn emissions_axis(&self) -> InputResult<TimeAxis> {
        Ok(TimeAxis::annual_midpoints(self.start_year, self.end_year)?)
    }

    /// Year-start time bounds on which forcing and temperature are defined
    pub fn bounds_axis(&self) -> InputResult<TimeAxis> {
        Ok(TimeAxis::annual_bounds(self.start_year, self.end_year)?)
    }
}

/// Post-processing of the simulator output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// First year of the period temperatures are expressed relative to
    pub reference_start: i32,
    /// Last year (inclusive) of the reference period
    pub reference_end: i32,
    pub percentiles: Vec<FloatValue>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reference_start: 1850,
            reference_end: 1900,
            percentiles: vec![5.0, 16.0, 50.0, 84.0, 95.0],
        }
    }
}

impl AnalysisConfig {
    pub fn reference_period(&self) -> (TimePoint, TimePoint) {
        (
            TimePoint::year_start(self.reference_start),
            TimePoint::year_start(self.reference_end),
        )
    }
}

/// Complete description of a pulse experiment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub inputs: InputPaths,
    pub horizon: HorizonConfig,
    /// Species carried in the emissions series, in order
    pub species: Vec<String>,
    pub experiment: PulseExperiment,
    pub forcing: ForcingSettings,
    pub analysis: AnalysisConfig,
    /// Only use the first `max_configs` members of the calibrated ensemble
    pub max_configs: Option<usize>,
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            inputs: InputPaths::default(),
            horizon: HorizonConfig::default(),
            species: standard_species_names(),
            experiment: PulseExperiment::default(),
            forcing: ForcingSettings::default(),
            analysis: AnalysisConfig::default(),
            max_configs: None,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl RunConfig {
    /// Parse and validate a configuration document
    pub fn from_toml_str(contents: &str) -> InputResult<Self> {
        let config: RunConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file.
    ///
    /// Relative paths in the file are resolved against the directory containing it.
    pub fn from_path(path: impl AsRef<Path>) -> InputResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        debug!(path = %path.display(), base = %base.display(), "Loaded run configuration");
        Ok(config.relative_to(base))
    }

    /// Resolve relative paths against `base`
    pub fn relative_to(mut self, base: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.inputs.calibration);
        resolve(&mut self.inputs.emissions);
        resolve(&mut self.inputs.historical_forcing);
        resolve(&mut self.output_dir);
        self
    }

    /// Check the settings that can be checked without reading any data
    pub fn validate(&self) -> InputResult<()> {
        self.experiment.validate()?;
        if self.horizon.start_year >= self.horizon.end_year {
            return Err(PulseError::EmptyAxis(format!(
                "horizon {}-{}",
                self.horizon.start_year, self.horizon.end_year
            ))
            .into());
        }
        if self.species.is_empty() {
            return Err(PulseError::EmptyAxis("species".to_string()).into());
        }
        for species in [
            &self.experiment.pulse_species,
            &self.experiment.equivalent_species,
        ] {
            if !self.species.contains(species) {
                return Err(PulseError::UnknownSpecies(species.clone()).into());
            }
        }
        if self.analysis.reference_start > self.analysis.reference_end {
            return Err(PulseError::EmptyAxis(format!(
                "reference period {}-{}",
                self.analysis.reference_start, self.analysis.reference_end
            ))
            .into());
        }
        if let Some(q) = self
            .analysis
            .percentiles
            .iter()
            .find(|q| !(0.0..=100.0).contains(*q))
        {
            return Err(PulseError::InvalidPercentile(*q).into());
        }
        if self.max_configs == Some(0) {
            return Err(PulseError::EmptyAxis("config".to_string()).into());
        }
        Ok(())
    }
}
