//! Baseline pathways and multi-scenario emissions series.
//!
//! An [`EmissionsSeries`] holds emissions indexed by
//! `(time point, species, scenario, configuration)`. It is created by copying a single
//! [`BaselinePathway`] into every scenario and configuration slot and then perturbed
//! in place, once per scenario, before being handed to a simulator.

use crate::errors::{PulseError, PulseResult};
use crate::time::{TimeAxis, TimePoint};
use crate::FloatValue;
use ndarray::{s, Array2, Array4, ArrayView2, ArrayView3, Axis, NewAxis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fails if `labels` is empty or contains the same label twice
pub(crate) fn validate_labels(axis: &str, labels: &[String]) -> PulseResult<()> {
    if labels.is_empty() {
        return Err(PulseError::EmptyAxis(axis.to_string()));
    }
    for (i, label) in labels.iter().enumerate() {
        if labels[..i].contains(label) {
            return Err(PulseError::DuplicateLabel {
                axis: axis.to_string(),
                label: label.clone(),
            });
        }
    }
    Ok(())
}

/// Reference emissions for a single source scenario and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselinePathway {
    scenario_tag: String,
    config_tag: String,
    time_axis: TimeAxis,
    species: Vec<String>,
    /// Emissions with shape (time, species)
    values: Array2<FloatValue>,
}

impl BaselinePathway {
    pub fn new(
        scenario_tag: impl Into<String>,
        config_tag: impl Into<String>,
        time_axis: TimeAxis,
        species: Vec<String>,
        values: Array2<FloatValue>,
    ) -> PulseResult<Self> {
        validate_labels("species", &species)?;
        let expected = vec![time_axis.len(), species.len()];
        if values.shape() != expected.as_slice() {
            return Err(PulseError::InvalidShape {
                expected,
                found: values.shape().to_vec(),
            });
        }
        Ok(Self {
            scenario_tag: scenario_tag.into(),
            config_tag: config_tag.into(),
            time_axis,
            species,
            values,
        })
    }

    pub fn scenario_tag(&self) -> &str {
        &self.scenario_tag
    }

    pub fn config_tag(&self) -> &str {
        &self.config_tag
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn values(&self) -> ArrayView2<FloatValue> {
        self.values.view()
    }

    pub fn species_index(&self, species: &str) -> Option<usize> {
        self.species.iter().position(|s| s == species)
    }

    /// Value at a given time point and species
    pub fn value(&self, species: &str, time: TimePoint) -> PulseResult<FloatValue> {
        let species_index = self
            .species_index(species)
            .ok_or_else(|| PulseError::UnknownSpecies(species.to_string()))?;
        let time_index = self.time_axis.require_index(time)?;
        Ok(self.values[[time_index, species_index]])
    }

    /// Extract the (time, species) block matching the requested axes.
    ///
    /// Fails with [`PulseError::ShapeMismatch`] naming the first time point or species
    /// that the baseline does not cover.
    fn select(&self, horizon: &TimeAxis, species: &[String]) -> PulseResult<Array2<FloatValue>> {
        let time_indices = horizon
            .iter()
            .map(|t| {
                self.time_axis
                    .index_of(*t)
                    .ok_or_else(|| PulseError::ShapeMismatch {
                        axis: "time".to_string(),
                        label: t.to_string(),
                    })
            })
            .collect::<PulseResult<Vec<_>>>()?;
        let species_indices = species
            .iter()
            .map(|name| {
                self.species_index(name)
                    .ok_or_else(|| PulseError::ShapeMismatch {
                        axis: "species".to_string(),
                        label: name.clone(),
                    })
            })
            .collect::<PulseResult<Vec<_>>>()?;

        Ok(self
            .values
            .select(Axis(0), &time_indices)
            .select(Axis(1), &species_indices))
    }
}

/// An additive adjustment to one species at one time point of one scenario.
///
/// `delta` is expressed in the species' native emissions unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perturbation {
    pub species: String,
    pub time_point: TimePoint,
    pub scenario: String,
    pub delta: FloatValue,
}

/// Emissions for several scenarios across an ensemble of configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsSeries {
    time_axis: TimeAxis,
    species: Vec<String>,
    scenarios: Vec<String>,
    configs: Vec<String>,
    /// Emissions with shape (time, species, scenario, config)
    values: Array4<FloatValue>,
}

impl EmissionsSeries {
    /// Copy a baseline pathway into every scenario and configuration slot.
    ///
    /// The baseline's single configuration is broadcast across `configs`. The result owns
    /// its data so perturbing one scenario never affects another scenario or the baseline.
    ///
    /// # Errors
    ///
    /// - [`PulseError::ShapeMismatch`] if the baseline does not cover `horizon` or `species`
    /// - [`PulseError::EmptyAxis`] / [`PulseError::DuplicateLabel`] for invalid labels
    pub fn initialize_scenarios(
        baseline: &BaselinePathway,
        horizon: &TimeAxis,
        species: &[String],
        scenario_names: &[String],
        configs: &[String],
    ) -> PulseResult<Self> {
        validate_labels("species", species)?;
        validate_labels("scenario", scenario_names)?;
        validate_labels("config", configs)?;

        let block = baseline.select(horizon, species)?;
        let shape = (
            horizon.len(),
            species.len(),
            scenario_names.len(),
            configs.len(),
        );
        let values = block
            .slice(s![.., .., NewAxis, NewAxis])
            .broadcast(shape)
            .ok_or_else(|| PulseError::InvalidShape {
                expected: vec![shape.0, shape.1, shape.2, shape.3],
                found: block.shape().to_vec(),
            })?
            .to_owned();

        debug!(
            scenarios = scenario_names.len(),
            configs = configs.len(),
            species = species.len(),
            time_points = horizon.len(),
            baseline = baseline.scenario_tag(),
            "Initialised scenarios from baseline"
        );

        Ok(Self {
            time_axis: horizon.clone(),
            species: species.to_vec(),
            scenarios: scenario_names.to_vec(),
            configs: configs.to_vec(),
            values,
        })
    }

    /// Add `delta` to one (species, time point) cell of a scenario, for every configuration.
    ///
    /// The series is mutated in place. Pulses accumulate, so when two calls target the same
    /// cell the result is the sum of both deltas.
    ///
    /// All lookups are validated before anything is written; on error the series is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - [`PulseError::UnknownSpecies`] / [`PulseError::UnknownScenario`] if a label is absent
    /// - [`PulseError::TimePointNotFound`] if `time_point` is not exactly on the time axis
    /// - [`PulseError::NonFiniteValue`] if `delta` is NaN or infinite
    pub fn apply_pulse(
        &mut self,
        species: &str,
        time_point: TimePoint,
        scenario: &str,
        delta: FloatValue,
    ) -> PulseResult<()> {
        let species_index = self.species_index(species)?;
        let scenario_index = self.scenario_index(scenario)?;
        let time_index = self.time_axis.require_index(time_point)?;
        if !delta.is_finite() {
            return Err(PulseError::NonFiniteValue(format!(
                "pulse of {} at {} in scenario {}",
                species, time_point, scenario
            )));
        }

        self.values
            .slice_mut(s![time_index, species_index, scenario_index, ..])
            .mapv_inplace(|v| v + delta);

        debug!(
            species,
            scenario,
            time = %time_point,
            delta,
            "Applied emissions pulse"
        );
        Ok(())
    }

    /// Apply a [`Perturbation`] in place. See [`EmissionsSeries::apply_pulse`].
    pub fn apply(&mut self, perturbation: &Perturbation) -> PulseResult<()> {
        self.apply_pulse(
            &perturbation.species,
            perturbation.time_point,
            &perturbation.scenario,
            perturbation.delta,
        )
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn scenarios(&self) -> &[String] {
        &self.scenarios
    }

    pub fn configs(&self) -> &[String] {
        &self.configs
    }

    /// Emissions with shape (time, species, scenario, config)
    pub fn values(&self) -> &Array4<FloatValue> {
        &self.values
    }

    pub fn species_index(&self, species: &str) -> PulseResult<usize> {
        self.species
            .iter()
            .position(|s| s == species)
            .ok_or_else(|| PulseError::UnknownSpecies(species.to_string()))
    }

    pub fn scenario_index(&self, scenario: &str) -> PulseResult<usize> {
        self.scenarios
            .iter()
            .position(|s| s == scenario)
            .ok_or_else(|| PulseError::UnknownScenario(scenario.to_string()))
    }

    fn config_index(&self, config: &str) -> PulseResult<usize> {
        self.configs
            .iter()
            .position(|c| c == config)
            .ok_or_else(|| PulseError::ShapeMismatch {
                axis: "config".to_string(),
                label: config.to_string(),
            })
    }

    /// A single cell of the series
    pub fn value(
        &self,
        species: &str,
        time_point: TimePoint,
        scenario: &str,
        config: &str,
    ) -> PulseResult<FloatValue> {
        Ok(self.values[[
            self.time_axis.require_index(time_point)?,
            self.species_index(species)?,
            self.scenario_index(scenario)?,
            self.config_index(config)?,
        ]])
    }

    /// All emissions of a scenario with shape (time, species, config)
    pub fn scenario_values(&self, scenario: &str) -> PulseResult<ArrayView3<FloatValue>> {
        let index = self.scenario_index(scenario)?;
        Ok(self.values.index_axis(Axis(2), index))
    }
}
