//! Emissions archives.
//!
//! Both the baseline archive and the emissions hand-off file use the same long format:
//!
//! ```text
//! scenario,config,species,timepoint,value
//! ssp245,unspecified,CH4,2022.5,381.2
//! ```

use crate::errors::{InputError, InputResult};
use crate::{csv_error, malformed, parse_time};
use ch4pulse_core::emissions::{BaselinePathway, EmissionsSeries};
use ch4pulse_core::time::{TimeAxis, TimePoint};
use ch4pulse_core::FloatValue;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

/// One row of a long-format emissions table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsRecord {
    pub scenario: String,
    pub config: String,
    pub species: String,
    pub timepoint: FloatValue,
    pub value: FloatValue,
}

/// Read the baseline pathway tagged `scenario` and `config` from an emissions archive.
///
/// Rows with other tags are skipped. Every selected species must have exactly one value at
/// every selected time point.
pub fn read_baseline_archive(
    path: impl AsRef<Path>,
    scenario: &str,
    config: &str,
) -> InputResult<BaselinePathway> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(csv_error(path))?;

    let mut species: Vec<String> = Vec::new();
    let mut times = BTreeSet::new();
    let mut cells: HashMap<(TimePoint, usize), FloatValue> = HashMap::new();
    let mut skipped = 0usize;

    for (row, record) in reader.deserialize::<EmissionsRecord>().enumerate() {
        let record = record.map_err(csv_error(path))?;
        if record.scenario != scenario || record.config != config {
            skipped += 1;
            continue;
        }
        let time = parse_time(path, "timepoint", row, record.timepoint)?;
        let s = match species.iter().position(|name| *name == record.species) {
            Some(s) => s,
            None => {
                species.push(record.species.clone());
                species.len() - 1
            }
        };
        if cells.insert((time, s), record.value).is_some() {
            return Err(malformed(
                path,
                format!("duplicate value for {} at {}", record.species, time),
            ));
        }
        times.insert(time);
    }

    if cells.is_empty() {
        return Err(malformed(
            path,
            format!("no rows for scenario '{}' and config '{}'", scenario, config),
        ));
    }
    debug!(skipped, "Skipped archive rows with other scenario or config tags");

    let time_axis = TimeAxis::new(times.into_iter().collect())?;
    let mut values = Array2::zeros((time_axis.len(), species.len()));
    for (t, time) in time_axis.iter().enumerate() {
        for (s, name) in species.iter().enumerate() {
            values[[t, s]] = *cells.get(&(*time, s)).ok_or_else(|| {
                malformed(path, format!("missing value for {} at {}", name, time))
            })?;
        }
    }

    let missing = values.iter().filter(|v| v.is_nan()).count();
    if missing > 0 {
        warn!(
            path = %path.display(),
            count = missing,
            "Baseline archive contains NaN values"
        );
    }
    info!(
        path = %path.display(),
        scenario,
        config,
        species = species.len(),
        time_points = time_axis.len(),
        "Read baseline pathway"
    );
    Ok(BaselinePathway::new(
        scenario, config, time_axis, species, values,
    )?)
}

/// Write every cell of an emissions series in the long format.
///
/// Rows are ordered by scenario, then configuration, then species, then time.
pub fn write_emissions(series: &EmissionsSeries, path: impl AsRef<Path>) -> InputResult<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path).map_err(csv_error(path))?;
    let values = series.values();

    for (k, scenario) in series.scenarios().iter().enumerate() {
        for (c, config) in series.configs().iter().enumerate() {
            for (s, species) in series.species().iter().enumerate() {
                for (t, time) in series.time_axis().iter().enumerate() {
                    writer
                        .serialize(EmissionsRecord {
                            scenario: scenario.clone(),
                            config: config.clone(),
                            species: species.clone(),
                            timepoint: time.year(),
                            value: values[[t, s, k, c]],
                        })
                        .map_err(csv_error(path))?;
                }
            }
        }
    }
    writer.flush().map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Wrote emissions");
    Ok(())
}
