//! Natural forcing series for the ensemble.
//!
//! Volcanic and solar effective radiative forcing are prescribed from a historical
//! reconstruction. Beyond the end of the record:
//!
//! - volcanic forcing ramps linearly from its last observed value to zero over
//!   `ramp_steps` time bounds and stays at zero afterwards
//! - solar forcing is zero, while a linear trend shape, rising from 0 to 1 over the
//!   record, stays at 1
//!
//! Each configuration then scales these shapes with its own calibrated factors:
//!
//! $$ F_{solar}(t, c) = S(t) \cdot a_c + \tau(t) \cdot b_c $$
//!
//! Where:
//! - $S$ is the solar forcing shape and $\tau$ the trend shape
//! - $a_c$ and $b_c$ are the configuration's solar amplitude and trend parameters

use crate::calibration::CalibrationTable;
use crate::errors::{PulseError, PulseResult};
use crate::time::TimeAxis;
use crate::FloatValue;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reconstructed natural forcing (W / m^2), keyed by time bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalForcing {
    time_axis: TimeAxis,
    volcanic: Array1<FloatValue>,
    solar: Array1<FloatValue>,
}

impl HistoricalForcing {
    pub fn new(
        time_axis: TimeAxis,
        volcanic: Array1<FloatValue>,
        solar: Array1<FloatValue>,
    ) -> PulseResult<Self> {
        for series in [&volcanic, &solar] {
            if series.len() != time_axis.len() {
                return Err(PulseError::InvalidShape {
                    expected: vec![time_axis.len()],
                    found: vec![series.len()],
                });
            }
        }
        Ok(Self {
            time_axis,
            volcanic,
            solar,
        })
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn volcanic(&self) -> ArrayView1<FloatValue> {
        self.volcanic.view()
    }

    pub fn solar(&self) -> ArrayView1<FloatValue> {
        self.solar.view()
    }

    /// Indices into the record for the leading points of `axis` covered by the record.
    ///
    /// The first axis point must be part of the record. Coverage ends at the first axis
    /// point the record does not contain.
    fn overlap(&self, axis: &TimeAxis) -> PulseResult<Vec<usize>> {
        let indices: Vec<usize> = axis
            .iter()
            .map_while(|t| self.time_axis.index_of(*t))
            .collect();
        if indices.is_empty() {
            return Err(PulseError::ShapeMismatch {
                axis: "historical forcing".to_string(),
                label: axis.first().to_string(),
            });
        }
        Ok(indices)
    }
}

/// `linspace(start, end, n)[k]` with numpy's convention for `n == 1`
fn linspace_at(start: FloatValue, end: FloatValue, n: usize, k: usize) -> FloatValue {
    if n <= 1 {
        start
    } else {
        start + (end - start) * k as FloatValue / (n - 1) as FloatValue
    }
}

/// Volcanic forcing on `axis`, ramped down to zero after the historical record.
pub fn volcanic_forcing(
    historical: &HistoricalForcing,
    axis: &TimeAxis,
    ramp_steps: usize,
) -> PulseResult<Array1<FloatValue>> {
    let overlap = historical.overlap(axis)?;
    let n_historical = overlap.len();
    let mut forcing = Array1::zeros(axis.len());

    for (i, index) in overlap.iter().enumerate() {
        forcing[i] = historical.volcanic[*index];
    }

    let last = forcing[n_historical - 1];
    for k in 0..ramp_steps {
        let i = n_historical + k;
        if i >= axis.len() {
            break;
        }
        forcing[i] = linspace_at(1.0, 0.0, ramp_steps, k) * last;
    }

    debug!(
        n_historical,
        ramp_steps,
        last_observed = last,
        "Built volcanic forcing"
    );
    Ok(forcing)
}

/// Solar forcing and solar trend shape on `axis`.
///
/// Returns `(solar, trend_shape)`. Solar forcing is zero after the historical record; the
/// trend shape rises linearly from 0 to 1 across the record and is 1 afterwards.
pub fn solar_forcing(
    historical: &HistoricalForcing,
    axis: &TimeAxis,
) -> PulseResult<(Array1<FloatValue>, Array1<FloatValue>)> {
    let overlap = historical.overlap(axis)?;
    let n_historical = overlap.len();
    let mut solar = Array1::zeros(axis.len());
    let mut trend = Array1::ones(axis.len());

    for (i, index) in overlap.iter().enumerate() {
        solar[i] = historical.solar[*index];
        trend[i] = linspace_at(0.0, 1.0, n_historical, i);
    }

    Ok((solar, trend))
}

/// Names of the calibration columns and ramp length used to build the forcing ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcingSettings {
    /// Number of time bounds over which volcanic forcing returns to zero
    pub ramp_steps: usize,
    pub solar_amplitude_column: String,
    pub solar_trend_column: String,
    /// Optional per-configuration volcanic scale factor. Unscaled if `None`.
    pub volcanic_scale_column: Option<String>,
}

impl Default for ForcingSettings {
    fn default() -> Self {
        Self {
            ramp_steps: 10,
            solar_amplitude_column: "fscale_solar_amplitude".to_string(),
            solar_trend_column: "fscale_solar_trend".to_string(),
            volcanic_scale_column: None,
        }
    }
}

/// Volcanic and solar forcing for every ensemble configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcingEnsemble {
    time_axis: TimeAxis,
    configs: Vec<String>,
    /// Shape (time, config)
    volcanic: Array2<FloatValue>,
    /// Shape (time, config)
    solar: Array2<FloatValue>,
}

impl ForcingEnsemble {
    pub fn build(
        historical: &HistoricalForcing,
        axis: &TimeAxis,
        calibration: &CalibrationTable,
        settings: &ForcingSettings,
    ) -> PulseResult<Self> {
        let volcanic_shape = volcanic_forcing(historical, axis, settings.ramp_steps)?;
        let (solar_shape, trend_shape) = solar_forcing(historical, axis)?;

        let volcanic_scale = match &settings.volcanic_scale_column {
            Some(column) => calibration.column(column)?.to_owned(),
            None => Array1::ones(calibration.len()),
        };
        let amplitude = calibration.column(&settings.solar_amplitude_column)?;
        let trend = calibration.column(&settings.solar_trend_column)?;

        let volcanic = outer(volcanic_shape.view(), volcanic_scale.view());
        let solar = outer(solar_shape.view(), amplitude) + outer(trend_shape.view(), trend);

        Ok(Self {
            time_axis: axis.clone(),
            configs: calibration.ids().to_vec(),
            volcanic,
            solar,
        })
    }

    /// Assemble an ensemble from precomputed arrays of shape (time, config)
    pub fn from_arrays(
        time_axis: TimeAxis,
        configs: Vec<String>,
        volcanic: Array2<FloatValue>,
        solar: Array2<FloatValue>,
    ) -> PulseResult<Self> {
        let expected = vec![time_axis.len(), configs.len()];
        for array in [&volcanic, &solar] {
            if array.shape() != expected.as_slice() {
                return Err(PulseError::InvalidShape {
                    expected,
                    found: array.shape().to_vec(),
                });
            }
        }
        Ok(Self {
            time_axis,
            configs,
            volcanic,
            solar,
        })
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn configs(&self) -> &[String] {
        &self.configs
    }

    pub fn volcanic(&self) -> ArrayView2<FloatValue> {
        self.volcanic.view()
    }

    pub fn solar(&self) -> ArrayView2<FloatValue> {
        self.solar.view()
    }
}

/// `a[t] * b[c]` with shape (time, config)
fn outer(a: ArrayView1<FloatValue>, b: ArrayView1<FloatValue>) -> Array2<FloatValue> {
    let column = a.insert_axis(Axis(1));
    let row = b.insert_axis(Axis(0));
    &column * &row
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use indexmap::IndexMap;
    use ndarray::array;

    fn historical() -> HistoricalForcing {
        HistoricalForcing::new(
            TimeAxis::annual_bounds(2000, 2004).unwrap(),
            array![-0.1, -0.5, -0.2, -0.3, -0.4],
            array![0.05, 0.1, 0.0, -0.05, 0.02],
        )
        .unwrap()
    }

    #[test]
    fn lengths_are_validated() {
        let result = HistoricalForcing::new(
            TimeAxis::annual_bounds(2000, 2001).unwrap(),
            array![0.0, 0.0],
            array![0.0],
        );
        assert!(matches!(result, Err(PulseError::InvalidShape { .. })));
    }

    #[test]
    fn volcanic_ramps_to_zero() {
        let axis = TimeAxis::annual_bounds(2000, 2012).unwrap();
        let forcing = volcanic_forcing(&historical(), &axis, 5).unwrap();

        assert_eq!(forcing.slice(ndarray::s![..5]), array![-0.1, -0.5, -0.2, -0.3, -0.4]);
        // linspace(1, 0, 5) * last
        let expected_ramp = [1.0, 0.75, 0.5, 0.25, 0.0].map(|f| f * -0.4);
        for (k, expected) in expected_ramp.iter().enumerate() {
            assert_relative_eq!(forcing[5 + k], *expected);
        }
        assert!(forcing.slice(ndarray::s![10..]).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn volcanic_ramp_truncated_by_axis() {
        let axis = TimeAxis::annual_bounds(2000, 2006).unwrap();
        let forcing = volcanic_forcing(&historical(), &axis, 10).unwrap();
        assert_eq!(forcing.len(), 7);
        assert_relative_eq!(forcing[5], -0.4);
        assert_relative_eq!(forcing[6], -0.4 * (1.0 - 1.0 / 9.0));
    }

    #[test]
    fn axis_inside_record() {
        let axis = TimeAxis::annual_bounds(2001, 2003).unwrap();
        let forcing = volcanic_forcing(&historical(), &axis, 10).unwrap();
        assert_eq!(forcing, array![-0.5, -0.2, -0.3]);
    }

    #[test]
    fn axis_starting_before_record() {
        let axis = TimeAxis::annual_bounds(1990, 2010).unwrap();
        assert_eq!(
            volcanic_forcing(&historical(), &axis, 10),
            Err(PulseError::ShapeMismatch {
                axis: "historical forcing".to_string(),
                label: "1990.0".to_string()
            })
        );
    }

    #[test]
    fn solar_and_trend_shape() {
        let axis = TimeAxis::annual_bounds(2000, 2007).unwrap();
        let (solar, trend) = solar_forcing(&historical(), &axis).unwrap();

        assert_eq!(solar, array![0.05, 0.1, 0.0, -0.05, 0.02, 0.0, 0.0, 0.0]);
        assert_eq!(trend, array![0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn ensemble_scaling() {
        let axis = TimeAxis::annual_bounds(2000, 2006).unwrap();
        let mut columns = IndexMap::new();
        columns.insert("fscale_solar_amplitude".to_string(), array![1.0, 2.0]);
        columns.insert("fscale_solar_trend".to_string(), array![0.0, 0.1]);
        columns.insert("fscale_Volcanic".to_string(), array![1.0, 0.5]);
        let calibration =
            CalibrationTable::new(vec!["a".to_string(), "b".to_string()], columns).unwrap();

        let settings = ForcingSettings {
            volcanic_scale_column: Some("fscale_Volcanic".to_string()),
            ..Default::default()
        };
        let ensemble = ForcingEnsemble::build(&historical(), &axis, &calibration, &settings).unwrap();

        assert_eq!(ensemble.solar().shape(), &[7, 2]);
        assert_eq!(ensemble.configs(), &["a".to_string(), "b".to_string()]);

        // Configuration "a" has unit amplitude and no trend
        assert_eq!(
            ensemble.solar().column(0),
            array![0.05, 0.1, 0.0, -0.05, 0.02, 0.0, 0.0]
        );
        // Configuration "b": 2 * solar + 0.1 * trend
        assert_relative_eq!(ensemble.solar()[[1, 1]], 2.0 * 0.1 + 0.1 * 0.25);
        assert_relative_eq!(ensemble.solar()[[6, 1]], 0.1);

        assert_relative_eq!(ensemble.volcanic()[[1, 0]], -0.5);
        assert_relative_eq!(ensemble.volcanic()[[1, 1]], -0.25);
    }

    #[test]
    fn ensemble_missing_column() {
        let axis = TimeAxis::annual_bounds(2000, 2006).unwrap();
        let calibration =
            CalibrationTable::new(vec!["a".to_string()], IndexMap::new()).unwrap();
        let result = ForcingEnsemble::build(
            &historical(),
            &axis,
            &calibration,
            &ForcingSettings::default(),
        );
        assert_eq!(
            result,
            Err(PulseError::MissingColumn("fscale_solar_amplitude".to_string()))
        );
    }
}
