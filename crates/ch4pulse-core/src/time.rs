//! Exact time points and time axes.
//!
//! Emissions are reported at annual midpoints (`1750.5 ... 2099.5`) while forcing and
//! temperature are reported at annual bounds (`1750.0 ... 2100.0`). Both sit on a half-year
//! grid, so a [`TimePoint`] stores the number of half years since year zero as an integer.
//! Lookups on a [`TimeAxis`] are therefore exact integer comparisons and a time point that
//! was regenerated with slightly different floating-point rounding still matches.
//!
//! Floating-point years are only used at the boundary:
//!
//! ```
//! use ch4pulse_core::time::{TimeAxis, TimePoint};
//!
//! let axis = TimeAxis::annual_midpoints(1750, 2100).unwrap();
//! assert_eq!(axis.len(), 350);
//!
//! let leak = TimePoint::from_year(2022.5).unwrap();
//! assert_eq!(axis.index_of(leak), Some(272));
//! assert_eq!(leak.year(), 2022.5);
//! ```

use crate::errors::{PulseError, PulseResult};
use crate::FloatValue;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Maximum distance (in half years) a year may sit from the half-year grid
const GRID_TOLERANCE: FloatValue = 1e-6;

/// A point in time on a half-year grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TimePoint(i64);

impl TimePoint {
    /// Create a time point from a (possibly fractional) year.
    ///
    /// Fails if the year is not finite or is not a whole or half year.
    pub fn from_year(year: FloatValue) -> PulseResult<Self> {
        if !year.is_finite() {
            return Err(PulseError::InvalidTimePoint(year));
        }
        let half_years = year * 2.0;
        let rounded = half_years.round();
        if (half_years - rounded).abs() > GRID_TOLERANCE {
            return Err(PulseError::InvalidTimePoint(year));
        }
        Ok(Self(rounded as i64))
    }

    /// The start of a calendar year
    pub fn year_start(year: i32) -> Self {
        Self(i64::from(year) * 2)
    }

    /// The midpoint of a calendar year
    pub fn mid_year(year: i32) -> Self {
        Self(i64::from(year) * 2 + 1)
    }

    pub fn from_half_years(half_years: i64) -> Self {
        Self(half_years)
    }

    pub fn half_years(&self) -> i64 {
        self.0
    }

    /// The time point expressed as a fractional year
    pub fn year(&self) -> FloatValue {
        self.0 as FloatValue / 2.0
    }
}

impl TryFrom<f64> for TimePoint {
    type Error = PulseError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_year(value)
    }
}

impl From<TimePoint> for f64 {
    fn from(value: TimePoint) -> Self {
        value.year()
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{:.1}", self.year())
        } else {
            write!(f, "{}", self.year())
        }
    }
}

/// A non-empty, strictly increasing sequence of time points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TimePoint>", into = "Vec<TimePoint>")]
pub struct TimeAxis {
    points: Vec<TimePoint>,
}

impl TimeAxis {
    pub fn new(points: Vec<TimePoint>) -> PulseResult<Self> {
        if points.is_empty() {
            return Err(PulseError::EmptyAxis("time".to_string()));
        }
        if let Some(pair) = points.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PulseError::UnsortedTimeAxis {
                previous: pair[0].to_string(),
                next: pair[1].to_string(),
            });
        }
        Ok(Self { points })
    }

    /// Build an axis from fractional years.
    pub fn from_years(years: &[FloatValue]) -> PulseResult<Self> {
        let points = years
            .iter()
            .map(|year| TimePoint::from_year(*year))
            .collect::<PulseResult<Vec<_>>>()?;
        Self::new(points)
    }

    /// Annual midpoints covering the years `[start, end)`.
    ///
    /// `annual_midpoints(1750, 2100)` yields `1750.5, 1751.5, ..., 2099.5`.
    pub fn annual_midpoints(start: i32, end: i32) -> PulseResult<Self> {
        Self::new((start..end).map(TimePoint::mid_year).collect())
    }

    /// Annual bounds covering the years `[start, end]`.
    ///
    /// `annual_bounds(1750, 2100)` yields `1750.0, 1751.0, ..., 2100.0`.
    pub fn annual_bounds(start: i32, end: i32) -> PulseResult<Self> {
        if end < start {
            return Err(PulseError::EmptyAxis("time".to_string()));
        }
        Self::new((start..=end).map(TimePoint::year_start).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimePoint> {
        self.points.iter()
    }

    pub fn get(&self, index: usize) -> Option<TimePoint> {
        self.points.get(index).copied()
    }

    pub fn first(&self) -> TimePoint {
        self.points[0]
    }

    pub fn last(&self) -> TimePoint {
        self.points[self.points.len() - 1]
    }

    /// Exact lookup of a time point.
    ///
    /// There is no nearest-neighbour fallback: a time point that is not on the axis
    /// returns `None`.
    pub fn index_of(&self, time: TimePoint) -> Option<usize> {
        self.points.binary_search(&time).ok()
    }

    /// Exact lookup that reports the missing time point as an error
    pub fn require_index(&self, time: TimePoint) -> PulseResult<usize> {
        self.index_of(time)
            .ok_or_else(|| PulseError::TimePointNotFound(time.to_string()))
    }

    pub fn contains(&self, time: TimePoint) -> bool {
        self.index_of(time).is_some()
    }

    /// Indices of the points within the inclusive interval `[start, end]`
    pub fn range_between(&self, start: TimePoint, end: TimePoint) -> Range<usize> {
        let lower = self.points.partition_point(|t| *t < start);
        let upper = self.points.partition_point(|t| *t <= end);
        lower..upper.max(lower)
    }

    /// The axis as fractional years
    pub fn years(&self) -> Array1<FloatValue> {
        self.points.iter().map(TimePoint::year).collect()
    }
}

impl TryFrom<Vec<TimePoint>> for TimeAxis {
    type Error = PulseError;

    fn try_from(value: Vec<TimePoint>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TimeAxis> for Vec<TimePoint> {
    fn from(value: TimeAxis) -> Self {
        value.points
    }
}
