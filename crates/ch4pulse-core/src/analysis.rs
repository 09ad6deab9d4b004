//! Post-processing of ensemble temperature output.
//!
//! The impact of a pulse is small compared with the spread of the ensemble, so results
//! are summarised per time point as percentiles across configurations, either of the
//! temperature anomaly of each scenario or of the difference between a perturbed scenario
//! and the counterfactual within each configuration.

use crate::errors::{PulseError, PulseResult};
use crate::simulator::SimulationOutput;
use crate::time::{TimeAxis, TimePoint};
use crate::FloatValue;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Express temperatures relative to their mean over a reference period.
///
/// The mean is taken per scenario and configuration over the time bounds within the
/// inclusive interval `[start, end]`.
pub fn relative_to_period(
    output: &SimulationOutput,
    start: TimePoint,
    end: TimePoint,
) -> PulseResult<SimulationOutput> {
    let range = output.time_axis().range_between(start, end);
    if range.is_empty() {
        return Err(PulseError::TimePointNotFound(format!("{}-{}", start, end)));
    }
    let temperature = output.temperature();
    let reference = temperature
        .slice(s![range, .., ..])
        .mean_axis(Axis(0))
        .ok_or_else(|| PulseError::TimePointNotFound(format!("{}-{}", start, end)))?;

    let anomaly = &temperature - &reference.insert_axis(Axis(0));
    SimulationOutput::new(
        output.time_axis().clone(),
        output.scenarios().to_vec(),
        output.configs().to_vec(),
        anomaly,
    )
}

/// Per-configuration difference `scenario - reference` with shape (time, config)
pub fn scenario_difference(
    output: &SimulationOutput,
    scenario: &str,
    reference: &str,
) -> PulseResult<Array2<FloatValue>> {
    let perturbed = output.scenario_temperature(scenario)?;
    let baseline = output.scenario_temperature(reference)?;
    Ok(&perturbed - &baseline)
}

/// Percentile of a set of values using linear interpolation between order statistics.
///
/// NaN values are ignored. Returns NaN if no finite values remain.
pub fn percentile(values: ArrayView1<FloatValue>, q: FloatValue) -> PulseResult<FloatValue> {
    if !(0.0..=100.0).contains(&q) {
        return Err(PulseError::InvalidPercentile(q));
    }
    let mut sorted: Vec<FloatValue> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Ok(FloatValue::NAN);
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q / 100.0 * (sorted.len() - 1) as FloatValue;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as FloatValue;
    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Percentiles across configurations for each time point.
///
/// `data` has shape (time, config); the result has shape (time, percentile).
pub fn percentile_bands(
    data: ArrayView2<FloatValue>,
    percentiles: &[FloatValue],
) -> PulseResult<Array2<FloatValue>> {
    let mut bands = Array2::zeros((data.nrows(), percentiles.len()));
    for (t, row) in data.outer_iter().enumerate() {
        for (p, q) in percentiles.iter().enumerate() {
            bands[[t, p]] = percentile(row, *q)?;
        }
    }
    Ok(bands)
}

/// Ensemble percentiles of a quantity over time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub label: String,
    pub time_axis: TimeAxis,
    pub percentiles: Vec<FloatValue>,
    /// Shape (time, percentile)
    pub values: Array2<FloatValue>,
}

impl EnsembleSummary {
    /// Summarise `data` with shape (time, config)
    pub fn from_ensemble(
        label: impl Into<String>,
        time_axis: &TimeAxis,
        data: ArrayView2<FloatValue>,
        percentiles: &[FloatValue],
    ) -> PulseResult<Self> {
        if data.nrows() != time_axis.len() {
            return Err(PulseError::InvalidShape {
                expected: vec![time_axis.len(), data.ncols()],
                found: data.shape().to_vec(),
            });
        }
        Ok(Self {
            label: label.into(),
            time_axis: time_axis.clone(),
            percentiles: percentiles.to_vec(),
            values: percentile_bands(data, percentiles)?,
        })
    }

    /// The series for one percentile, if it was computed
    pub fn band(&self, q: FloatValue) -> Option<ArrayView1<FloatValue>> {
        self.percentiles
            .iter()
            .position(|p| *p == q)
            .map(|i| self.values.column(i))
    }

    /// Value of a percentile at a time point
    pub fn at(&self, q: FloatValue, time: TimePoint) -> Option<FloatValue> {
        let index = self.time_axis.index_of(time)?;
        self.band(q).map(|band| band[index])
    }

    /// The largest median value and when it occurs
    pub fn peak_median(&self) -> Option<(TimePoint, FloatValue)> {
        let median: Array1<FloatValue> = self.band(50.0)?.to_owned();
        median
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .and_then(|(i, v)| self.time_axis.get(i).map(|t| (t, *v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use is_close::is_close;
    use ndarray::{array, Array3};

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn output() -> SimulationOutput {
        // 4 time bounds, 2 scenarios, 3 configurations
        let temperature = Array3::from_shape_fn((4, 2, 3), |(t, s, c)| {
            t as f64 * 0.1 + s as f64 * 0.01 * t as f64 + c as f64
        });
        SimulationOutput::new(
            TimeAxis::annual_bounds(2000, 2003).unwrap(),
            labels(&["counterfactual", "leak"]),
            labels(&["1", "2", "3"]),
            temperature,
        )
        .unwrap()
    }

    #[test]
    fn percentile_matches_linear_interpolation() {
        let values = array![3.0, 1.0, 4.0, 2.0, 5.0];
        assert_eq!(percentile(values.view(), 0.0).unwrap(), 1.0);
        assert_eq!(percentile(values.view(), 50.0).unwrap(), 3.0);
        assert_eq!(percentile(values.view(), 100.0).unwrap(), 5.0);
        assert!(is_close!(percentile(values.view(), 5.0).unwrap(), 1.2));
        assert!(is_close!(percentile(values.view(), 84.0).unwrap(), 4.36));
    }

    #[test]
    fn percentile_ignores_nan() {
        let values = array![f64::NAN, 1.0, 3.0];
        assert_eq!(percentile(values.view(), 50.0).unwrap(), 2.0);

        let all_nan = array![f64::NAN];
        assert!(percentile(all_nan.view(), 50.0).unwrap().is_nan());
    }

    #[test]
    fn percentile_out_of_range() {
        let values = array![1.0];
        assert_eq!(
            percentile(values.view(), 101.0),
            Err(PulseError::InvalidPercentile(101.0))
        );
        assert!(percentile(values.view(), -1.0).is_err());
    }

    #[test]
    fn bands_per_time_point() {
        let data = array![[0.0, 1.0, 2.0], [10.0, 20.0, 30.0]];
        let bands = percentile_bands(data.view(), &[0.0, 50.0, 100.0]).unwrap();
        assert_eq!(bands, array![[0.0, 1.0, 2.0], [10.0, 20.0, 30.0]]);
    }

    #[test]
    fn anomaly_relative_to_period() {
        let output = output();
        let anomaly = relative_to_period(
            &output,
            TimePoint::year_start(2000),
            TimePoint::year_start(2001),
        )
        .unwrap();

        // Mean of the first two time bounds is removed for every scenario and config
        let t = anomaly.temperature();
        for s in 0..2 {
            for c in 0..3 {
                assert_relative_eq!(t[[0, s, c]] + t[[1, s, c]], 0.0, epsilon = 1e-12);
            }
        }
        assert_relative_eq!(t[[3, 0, 2]], 0.3 - 0.05, epsilon = 1e-12);
    }

    #[test]
    fn anomaly_period_outside_axis() {
        let result = relative_to_period(
            &output(),
            TimePoint::year_start(1850),
            TimePoint::year_start(1900),
        );
        assert_eq!(
            result,
            Err(PulseError::TimePointNotFound("1850.0-1900.0".to_string()))
        );
    }

    #[test]
    fn difference_between_scenarios() {
        let difference = scenario_difference(&output(), "leak", "counterfactual").unwrap();
        assert_eq!(difference.shape(), &[4, 3]);
        for c in 0..3 {
            assert_relative_eq!(difference[[3, c]], 0.03, epsilon = 1e-12);
            assert_eq!(difference[[0, c]], 0.0);
        }
        assert!(scenario_difference(&output(), "burned", "counterfactual").is_err());
    }

    #[test]
    fn summary() {
        let output = output();
        let difference = scenario_difference(&output, "leak", "counterfactual").unwrap();
        let summary = EnsembleSummary::from_ensemble(
            "leak - counterfactual",
            output.time_axis(),
            difference.view(),
            &[5.0, 50.0, 95.0],
        )
        .unwrap();

        assert_eq!(summary.values.shape(), &[4, 3]);
        assert!(summary.band(16.0).is_none());
        assert_relative_eq!(
            summary.at(50.0, TimePoint::year_start(2002)).unwrap(),
            0.02,
            epsilon = 1e-12
        );
        let (when, peak) = summary.peak_median().unwrap();
        assert_eq!(when, TimePoint::year_start(2003));
        assert_relative_eq!(peak, 0.03, epsilon = 1e-12);
    }

    #[test]
    fn summary_shape_mismatch() {
        let data = Array2::zeros((3, 2));
        let result = EnsembleSummary::from_ensemble(
            "x",
            &TimeAxis::annual_bounds(2000, 2003).unwrap(),
            data.view(),
            &[50.0],
        );
        assert!(matches!(result, Err(PulseError::InvalidShape { .. })));
    }
}
