//! Reading and writing the files of a methane pulse experiment.
//!
//! - `config`: the TOML run configuration
//! - `calibration`: the calibrated parameter ensemble
//! - `emissions`: the baseline emissions archive and the emissions hand-off file
//! - `forcing`: the historical natural forcing record and the forcing hand-off file
//! - `output`: simulator temperature output and ensemble summaries
//!
//! All tables are CSV. Long-format tables carry one value per row keyed by label columns.

pub mod calibration;
pub mod config;
pub mod emissions;
pub mod errors;
pub mod forcing;
pub mod output;

use crate::errors::InputError;
use ch4pulse_core::time::TimePoint;
use ch4pulse_core::FloatValue;
use std::path::{Path, PathBuf};

pub(crate) fn csv_error(path: &Path) -> impl Fn(csv::Error) -> InputError + '_ {
    move |source| InputError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Line of the `row`th data record in its file, counting the header as line 1
fn data_line(row: usize) -> usize {
    row + 2
}

pub(crate) fn parse_value(
    path: &Path,
    column: &str,
    row: usize,
    field: &str,
) -> Result<FloatValue, InputError> {
    field
        .trim()
        .parse::<FloatValue>()
        .map_err(|_| InputError::InvalidValue {
            path: path.to_path_buf(),
            column: column.to_string(),
            line: data_line(row),
            value: field.to_string(),
        })
}

pub(crate) fn parse_time(
    path: &Path,
    column: &str,
    row: usize,
    value: FloatValue,
) -> Result<TimePoint, InputError> {
    TimePoint::from_year(value).map_err(|_| InputError::InvalidValue {
        path: path.to_path_buf(),
        column: column.to_string(),
        line: data_line(row),
        value: value.to_string(),
    })
}

pub(crate) fn malformed(path: &Path, message: impl Into<String>) -> InputError {
    InputError::Malformed {
        path: PathBuf::from(path),
        message: message.into(),
    }
}
