//! Simulator output and ensemble summaries.
//!
//! Temperature produced by an external simulator is exchanged in long format:
//!
//! ```text
//! scenario,config,timebound,value
//! leak,1299,2030.0,1.402
//! ```
//!
//! Summaries are written wide, one column per percentile.

use crate::errors::{InputError, InputResult};
use crate::{csv_error, malformed, parse_time};
use ch4pulse_core::analysis::EnsembleSummary;
use ch4pulse_core::simulator::SimulationOutput;
use ch4pulse_core::time::{TimeAxis, TimePoint};
use ch4pulse_core::FloatValue;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::info;

/// One row of a long-format temperature table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    pub scenario: String,
    pub config: String,
    pub timebound: FloatValue,
    pub value: FloatValue,
}

fn label_index(labels: &mut Vec<String>, label: &str) -> usize {
    match labels.iter().position(|l| l == label) {
        Some(index) => index,
        None => {
            labels.push(label.to_string());
            labels.len() - 1
        }
    }
}

/// Read simulator temperature output.
///
/// Scenarios and configurations keep the order in which they first appear. Every
/// combination of scenario, configuration and time bound must be present exactly once.
pub fn read_temperature_output(path: impl AsRef<Path>) -> InputResult<SimulationOutput> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(csv_error(path))?;

    let mut scenarios = Vec::new();
    let mut configs = Vec::new();
    let mut times = BTreeSet::new();
    let mut cells: HashMap<(TimePoint, usize, usize), FloatValue> = HashMap::new();

    for (row, record) in reader.deserialize::<TemperatureRecord>().enumerate() {
        let record = record.map_err(csv_error(path))?;
        let time = parse_time(path, "timebound", row, record.timebound)?;
        let k = label_index(&mut scenarios, &record.scenario);
        let c = label_index(&mut configs, &record.config);
        if cells.insert((time, k, c), record.value).is_some() {
            return Err(malformed(
                path,
                format!(
                    "duplicate value for {} / {} at {}",
                    record.scenario, record.config, time
                ),
            ));
        }
        times.insert(time);
    }
    if cells.is_empty() {
        return Err(malformed(path, "no temperature rows"));
    }

    let time_axis = TimeAxis::new(times.into_iter().collect())?;
    let mut temperature = Array3::zeros((time_axis.len(), scenarios.len(), configs.len()));
    for (t, time) in time_axis.iter().enumerate() {
        for (k, scenario) in scenarios.iter().enumerate() {
            for (c, config) in configs.iter().enumerate() {
                temperature[[t, k, c]] = *cells.get(&(*time, k, c)).ok_or_else(|| {
                    malformed(
                        path,
                        format!("missing value for {} / {} at {}", scenario, config, time),
                    )
                })?;
            }
        }
    }

    info!(
        path = %path.display(),
        scenarios = scenarios.len(),
        configs = configs.len(),
        time_points = time_axis.len(),
        "Read simulator output"
    );
    Ok(SimulationOutput::new(
        time_axis,
        scenarios,
        configs,
        temperature,
    )?)
}

/// Write temperature in the long format read by [`read_temperature_output`]
pub fn write_temperature_output(
    output: &SimulationOutput,
    path: impl AsRef<Path>,
) -> InputResult<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path).map_err(csv_error(path))?;
    let temperature = output.temperature();

    for (k, scenario) in output.scenarios().iter().enumerate() {
        for (c, config) in output.configs().iter().enumerate() {
            for (t, time) in output.time_axis().iter().enumerate() {
                writer
                    .serialize(TemperatureRecord {
                        scenario: scenario.clone(),
                        config: config.clone(),
                        timebound: time.year(),
                        value: temperature[[t, k, c]],
                    })
                    .map_err(csv_error(path))?;
            }
        }
    }
    writer.flush().map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write an ensemble summary with one row per time point and one column per percentile
pub fn write_summary(summary: &EnsembleSummary, path: impl AsRef<Path>) -> InputResult<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path).map_err(csv_error(path))?;

    let mut header = vec!["timebound".to_string()];
    header.extend(summary.percentiles.iter().map(|q| format!("p{}", q)));
    writer.write_record(&header).map_err(csv_error(path))?;

    for (time, row) in summary.time_axis.iter().zip(summary.values.outer_iter()) {
        let mut record = vec![time.to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        writer.write_record(&record).map_err(csv_error(path))?;
    }
    writer.flush().map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), label = %summary.label, "Wrote summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn read_long_temperature() {
        let file = write(
            "scenario,config,timebound,value\n\
             counterfactual,1,2000.0,0.1\n\
             leak,1,2000.0,0.2\n\
             counterfactual,1,2001.0,0.3\n\
             leak,1,2001.0,0.4\n",
        );
        let output = read_temperature_output(file.path()).unwrap();
        assert_eq!(
            output.scenarios(),
            &["counterfactual".to_string(), "leak".to_string()]
        );
        assert_eq!(output.configs(), &["1".to_string()]);
        assert_eq!(
            output.time_axis(),
            &TimeAxis::annual_bounds(2000, 2001).unwrap()
        );
        assert_eq!(output.temperature()[[1, 1, 0]], 0.4);
    }

    #[test]
    fn incomplete_temperature() {
        let file = write(
            "scenario,config,timebound,value\n\
             a,1,2000.0,0.1\n\
             b,1,2001.0,0.2\n",
        );
        let err = read_temperature_output(file.path()).unwrap_err();
        assert!(err.to_string().contains("missing value for b / 1 at 2000.0"));
    }

    #[test]
    fn temperature_written_and_read_back() {
        let output = SimulationOutput::new(
            TimeAxis::annual_bounds(2000, 2002).unwrap(),
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string(), "2".to_string()],
            Array3::from_shape_fn((3, 2, 2), |(t, k, c)| (t * 4 + k * 2 + c) as f64 * 0.25),
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("temperature.csv");
        write_temperature_output(&output, &out).unwrap();
        assert_eq!(read_temperature_output(&out).unwrap(), output);
    }

    #[test]
    fn summary_columns() {
        let summary = EnsembleSummary {
            label: "leak".to_string(),
            time_axis: TimeAxis::annual_bounds(2000, 2001).unwrap(),
            percentiles: vec![5.0, 50.0, 97.5],
            values: ndarray::array![[0.0, 1.0, 2.0], [f64::NAN, 1.5, 2.5]],
        };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("summary.csv");
        write_summary(&summary, &out).unwrap();

        let contents = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            contents,
            "timebound,p5,p50,p97.5\n2000.0,0,1,2\n2001.0,NaN,1.5,2.5\n"
        );
    }
}
