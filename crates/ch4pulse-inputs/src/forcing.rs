//! Natural forcing tables.

use crate::config::HistoricalColumns;
use crate::errors::{InputError, InputResult};
use crate::{csv_error, parse_time, parse_value};
use ch4pulse_core::forcing::{ForcingEnsemble, HistoricalForcing};
use ch4pulse_core::time::TimeAxis;
use ch4pulse_core::FloatValue;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One row of the forcing hand-off file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcingRecord {
    pub config: String,
    pub timebound: FloatValue,
    pub volcanic: FloatValue,
    pub solar: FloatValue,
}

/// Read the reconstructed volcanic and solar forcing record.
///
/// Other columns in the file are ignored. Years must be increasing.
pub fn read_historical_forcing(
    path: impl AsRef<Path>,
    columns: &HistoricalColumns,
) -> InputResult<HistoricalForcing> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(csv_error(path))?;
    let headers = reader.headers().map_err(csv_error(path))?.clone();
    let index_of = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| InputError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let year_index = index_of(columns.year.as_str())?;
    let volcanic_index = index_of(columns.volcanic.as_str())?;
    let solar_index = index_of(columns.solar.as_str())?;

    let mut times = Vec::new();
    let mut volcanic = Vec::new();
    let mut solar = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error(path))?;
        let year = parse_value(path, &columns.year, row, &record[year_index])?;
        times.push(parse_time(path, &columns.year, row, year)?);
        volcanic.push(parse_value(
            path,
            &columns.volcanic,
            row,
            &record[volcanic_index],
        )?);
        solar.push(parse_value(path, &columns.solar, row, &record[solar_index])?);
    }

    let time_axis = TimeAxis::new(times)?;
    info!(
        path = %path.display(),
        start = %time_axis.first(),
        end = %time_axis.last(),
        "Read historical natural forcing"
    );
    Ok(HistoricalForcing::new(
        time_axis,
        volcanic.into(),
        solar.into(),
    )?)
}

/// Write the per-configuration forcing, ordered by configuration then time.
pub fn write_forcing(forcing: &ForcingEnsemble, path: impl AsRef<Path>) -> InputResult<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path).map_err(csv_error(path))?;
    let volcanic = forcing.volcanic();
    let solar = forcing.solar();

    for (c, config) in forcing.configs().iter().enumerate() {
        for (t, time) in forcing.time_axis().iter().enumerate() {
            writer
                .serialize(ForcingRecord {
                    config: config.clone(),
                    timebound: time.year(),
                    volcanic: volcanic[[t, c]],
                    solar: solar[[t, c]],
                })
                .map_err(csv_error(path))?;
        }
    }
    writer.flush().map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Wrote forcing");
    Ok(())
}
