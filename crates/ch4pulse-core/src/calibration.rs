//! Calibrated parameter ensemble.
//!
//! Each row of the calibration table is one ensemble configuration, identified by its
//! configuration id. Columns hold parameters such as heat capacities, carbon-cycle
//! response parameters and per-species forcing scale factors. The table is only read
//! here; interpreting most columns is the simulator's business.

use crate::emissions::validate_labels;
use crate::errors::{PulseError, PulseResult};
use crate::FloatValue;
use indexmap::IndexMap;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    ids: Vec<String>,
    columns: IndexMap<String, Array1<FloatValue>>,
}

impl CalibrationTable {
    /// Create a table from configuration ids and named parameter columns.
    ///
    /// Every column must have one value per configuration id.
    pub fn new(ids: Vec<String>, columns: IndexMap<String, Array1<FloatValue>>) -> PulseResult<Self> {
        validate_labels("config", &ids)?;
        if let Some((name, column)) = columns.iter().find(|(_, c)| c.len() != ids.len()) {
            return Err(PulseError::InconsistentInputs(format!(
                "calibration column '{}' has {} values for {} configurations",
                name,
                column.len(),
                ids.len()
            )));
        }
        Ok(Self { ids, columns })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &String> {
        self.columns.keys()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Values of a parameter for every configuration, in id order
    pub fn column(&self, name: &str) -> PulseResult<ArrayView1<FloatValue>> {
        self.columns
            .get(name)
            .map(|c| c.view())
            .ok_or_else(|| PulseError::MissingColumn(name.to_string()))
    }

    /// Value of a parameter for one configuration
    pub fn get(&self, id: &str, name: &str) -> PulseResult<FloatValue> {
        let index = self
            .ids
            .iter()
            .position(|i| i == id)
            .ok_or_else(|| PulseError::ShapeMismatch {
                axis: "config".to_string(),
                label: id.to_string(),
            })?;
        Ok(self.column(name)?[index])
    }

    /// Keep only the first `n` configurations
    pub fn truncate(&self, n: usize) -> Self {
        let n = n.min(self.len());
        Self {
            ids: self.ids[..n].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(name, c)| (name.clone(), c.slice(ndarray::s![..n]).to_owned()))
                .collect(),
        }
    }

    /// Restrict the table to the given configuration ids, in that order
    pub fn select(&self, ids: &[String]) -> PulseResult<Self> {
        let indices = ids
            .iter()
            .map(|id| {
                self.ids
                    .iter()
                    .position(|i| i == id)
                    .ok_or_else(|| PulseError::ShapeMismatch {
                        axis: "config".to_string(),
                        label: id.clone(),
                    })
            })
            .collect::<PulseResult<Vec<_>>>()?;

        let columns = self
            .columns
            .iter()
            .map(|(name, c)| (name.clone(), indices.iter().map(|i| c[*i]).collect()))
            .collect();
        Self::new(ids.to_vec(), columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn table() -> CalibrationTable {
        let mut columns = IndexMap::new();
        columns.insert("c1".to_string(), array![7.5, 8.0, 6.9]);
        columns.insert("fscale_solar_amplitude".to_string(), array![1.1, 0.9, 1.0]);
        CalibrationTable::new(
            vec!["1299".to_string(), "1300".to_string(), "1301".to_string()],
            columns,
        )
        .unwrap()
    }

    #[test]
    fn lookup() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("1300", "c1").unwrap(), 8.0);
        assert_eq!(
            table.column("fscale_solar_amplitude").unwrap(),
            array![1.1, 0.9, 1.0]
        );
        assert_eq!(
            table.column("kappa1"),
            Err(PulseError::MissingColumn("kappa1".to_string()))
        );
        assert!(table.get("42", "c1").is_err());
    }

    #[test]
    fn column_length_is_validated() {
        let mut columns = IndexMap::new();
        columns.insert("c1".to_string(), array![7.5]);
        let result = CalibrationTable::new(vec!["1".to_string(), "2".to_string()], columns);
        assert!(matches!(result, Err(PulseError::InconsistentInputs(_))));
    }

    #[test]
    fn select_and_truncate() {
        let table = table();
        let selected = table
            .select(&["1301".to_string(), "1299".to_string()])
            .unwrap();
        assert_eq!(selected.ids(), &["1301".to_string(), "1299".to_string()]);
        assert_eq!(selected.column("c1").unwrap(), array![6.9, 7.5]);

        let truncated = table.truncate(2);
        assert_eq!(truncated.ids().len(), 2);
        assert_eq!(truncated.column("c1").unwrap(), array![7.5, 8.0]);
        assert_eq!(table.truncate(10), table);
    }
}
