//! Calibrated parameter ensemble stored as CSV.
//!
//! One row per configuration: an id column followed by numeric parameter columns.

use crate::errors::{InputError, InputResult};
use crate::{csv_error, malformed, parse_value};
use ch4pulse_core::calibration::CalibrationTable;
use ch4pulse_core::FloatValue;
use indexmap::IndexMap;
use std::path::Path;
use tracing::info;

/// Read a calibration table, using `id_column` as the configuration id.
///
/// Ids that parse as whole numbers are normalised (`"1299.0"` becomes `"1299"`) so that
/// they match the labels written by tools which store ids as floats.
pub fn read_calibration_table(
    path: impl AsRef<Path>,
    id_column: &str,
) -> InputResult<CalibrationTable> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(csv_error(path))?;
    let headers = reader.headers().map_err(csv_error(path))?.clone();

    let id_index = headers
        .iter()
        .position(|h| h == id_column)
        .ok_or_else(|| InputError::MissingColumn {
            path: path.to_path_buf(),
            column: id_column.to_string(),
        })?;

    let mut values: IndexMap<String, Vec<FloatValue>> = IndexMap::new();
    for (i, name) in headers.iter().enumerate() {
        if values.contains_key(name) || (i != id_index && name == id_column) {
            return Err(malformed(path, format!("duplicate column '{}'", name)));
        }
        if i != id_index {
            values.insert(name.to_string(), Vec::new());
        }
    }

    let mut ids = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error(path))?;
        for (i, field) in record.iter().enumerate() {
            if i == id_index {
                ids.push(normalise_id(field));
            } else if let Some(column) = values.get_mut(&headers[i]) {
                column.push(parse_value(path, &headers[i], row, field)?);
            }
        }
    }

    info!(
        path = %path.display(),
        configs = ids.len(),
        parameters = values.len(),
        "Read calibration table"
    );
    let columns = values
        .into_iter()
        .map(|(name, column)| (name, column.into()))
        .collect();
    Ok(CalibrationTable::new(ids, columns)?)
}

fn normalise_id(field: &str) -> String {
    let field = field.trim();
    match field.parse::<FloatValue>() {
        Ok(value) if value.fract() == 0.0 && value.abs() < 1e15 => format!("{}", value as i64),
        _ => field.to_string(),
    }
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
    fn read_table() {
        let file = write(
            "config,c1,fscale_solar_amplitude,fscale_solar_trend\n\
             1299,7.5,1.1,0.01\n\
             1300.0,8.0,0.9,-0.02\n",
        );
        let table = read_calibration_table(file.path(), "config").unwrap();
        assert_eq!(table.ids(), &["1299".to_string(), "1300".to_string()]);
        assert_eq!(
            table.column_names().cloned().collect::<Vec<_>>(),
            vec!["c1", "fscale_solar_amplitude", "fscale_solar_trend"]
        );
        assert_eq!(table.get("1300", "fscale_solar_trend").unwrap(), -0.02);
    }

    #[test]
    fn id_column_need_not_be_first() {
        let file = write("c1,id\n1.0,a\n2.0,b\n");
        let table = read_calibration_table(file.path(), "id").unwrap();
        assert_eq!(table.ids(), &["a".to_string(), "b".to_string()]);
        assert_eq!(table.get("b", "c1").unwrap(), 2.0);
    }

    #[test]
    fn missing_id_column() {
        let file = write("c1,c2\n1.0,2.0\n");
        assert!(matches!(
            read_calibration_table(file.path(), "config"),
            Err(InputError::MissingColumn { column, .. }) if column == "config"
        ));
    }

    #[test]
    fn repeated_column_name() {
        let file = write(
            "config,c1,c1,fscale_solar_amplitude\n\
             1,7.5,8.0,1.1\n\
             2,6.5,9.0,0.9\n",
        );
        let err = read_calibration_table(file.path(), "config").unwrap_err();
        assert!(matches!(err, InputError::Malformed { .. }));
        assert!(err.to_string().contains("duplicate column 'c1'"));
    }

    #[test]
    fn repeated_id_column() {
        let file = write("config,c1,config\n1,7.5,2\n");
        assert!(matches!(
            read_calibration_table(file.path(), "config"),
            Err(InputError::Malformed { .. })
        ));
    }

    #[test]
    fn non_numeric_value() {
        let file = write("config,c1\n1,oops\n");
        assert!(matches!(
            read_calibration_table(file.path(), "config"),
            Err(InputError::InvalidValue { line: 2, column, .. }) if column == "c1"
        ));
    }

    #[test]
    fn duplicate_ids() {
        let file = write("config,c1\n1,1.0\n1.0,2.0\n");
        assert!(matches!(
            read_calibration_table(file.path(), "config"),
            Err(InputError::Pulse(_))
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            read_calibration_table("/nonexistent/calibration.csv", "config"),
            Err(InputError::Csv { .. })
        ));
    }
}
