//! Scenario construction for a methane pulse experiment.
//!
//! Three scenarios are derived from one baseline pathway:
//!
//! - the counterfactual, which is the unperturbed baseline
//! - the pulse scenario, which adds a one-off release of the pulse species (methane)
//! - the equivalent-release scenario, which instead adds the mass of the target species
//!   (CO2) produced by completely burning the same amount of the pulse species
//!
//! ```
//! use ch4pulse_core::emissions::BaselinePathway;
//! use ch4pulse_core::scenario::{assemble_scenarios, PulseExperiment};
//! use ch4pulse_core::time::{TimeAxis, TimePoint};
//! use ndarray::array;
//!
//! let horizon = TimeAxis::annual_midpoints(2021, 2024).unwrap();
//! let species = vec!["CO2 FFI".to_string(), "CH4".to_string()];
//! let baseline = BaselinePathway::new(
//!     "ssp245",
//!     "unspecified",
//!     horizon.clone(),
//!     species.clone(),
//!     array![[36.0, 380.0], [37.0, 384.0], [38.0, 386.0]],
//! )
//! .unwrap();
//!
//! let experiment = PulseExperiment::default();
//! let series = assemble_scenarios(&baseline, &horizon, &species, &["1".to_string()], &experiment)
//!     .unwrap();
//!
//! let t = TimePoint::mid_year(2022);
//! assert_eq!(series.value("CH4", t, "leak", "1").unwrap(), 384.25);
//! assert_eq!(series.value("CH4", t, "burned", "1").unwrap(), 384.0);
//! ```

use crate::emissions::{validate_labels, BaselinePathway, EmissionsSeries, Perturbation};
use crate::errors::{PulseError, PulseResult};
use crate::time::{TimeAxis, TimePoint};
use crate::units::{convert_mass, MOLAR_MASS_CH4, MOLAR_MASS_CO2};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Build an [`EmissionsSeries`] from a baseline.
///
/// The builder collects the axes of the output series; [`ScenarioBuilder::build`] then
/// copies the baseline into every scenario and configuration.
#[derive(Debug, Clone, Default)]
pub struct ScenarioBuilder {
    horizon: Option<TimeAxis>,
    species: Vec<String>,
    scenarios: Vec<String>,
    configs: Vec<String>,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time points of the output series.
    ///
    /// Defaults to the baseline's own time axis.
    pub fn with_horizon(&mut self, horizon: TimeAxis) -> &mut Self {
        self.horizon = Some(horizon);
        self
    }

    /// Species of the output series.
    ///
    /// Defaults to all of the baseline's species.
    pub fn with_species(&mut self, species: &[String]) -> &mut Self {
        self.species = species.to_vec();
        self
    }

    /// Register a scenario. Scenarios keep the order in which they are added.
    pub fn with_scenario(&mut self, name: &str) -> &mut Self {
        self.scenarios.push(name.to_string());
        self
    }

    /// Ensemble configurations the baseline is broadcast across.
    pub fn with_configs(&mut self, configs: &[String]) -> &mut Self {
        self.configs = configs.to_vec();
        self
    }

    pub fn build(&self, baseline: &BaselinePathway) -> PulseResult<EmissionsSeries> {
        let horizon = self.horizon.as_ref().unwrap_or(baseline.time_axis());
        let species: &[String] = if self.species.is_empty() {
            baseline.species()
        } else {
            &self.species
        };
        EmissionsSeries::initialize_scenarios(
            baseline,
            horizon,
            species,
            &self.scenarios,
            &self.configs,
        )
    }
}

/// Definition of the three-scenario pulse experiment.
///
/// The defaults describe a 0.25 MtCH4 release at mid-2022, compared with burning the
/// same methane to CO2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseExperiment {
    /// Scenario left equal to the baseline
    pub counterfactual_scenario: String,
    /// Scenario receiving the pulse of `pulse_species`
    pub pulse_scenario: String,
    /// Scenario receiving the combustion-equivalent pulse of `equivalent_species`
    pub equivalent_scenario: String,
    pub pulse_species: String,
    pub equivalent_species: String,
    /// Time point of both pulses
    pub pulse_time: TimePoint,
    /// Size of the pulse in the native unit of `pulse_species`
    pub pulse_magnitude: FloatValue,
    /// Molar mass of the pulse species (g / mol)
    pub molar_mass_source: FloatValue,
    /// Molar mass of the equivalent species (g / mol)
    pub molar_mass_target: FloatValue,
    /// Factor from the pulse species' unit scale to the equivalent species' scale
    pub unit_scale: FloatValue,
}

impl Default for PulseExperiment {
    fn default() -> Self {
        Self {
            counterfactual_scenario: "counterfactual".to_string(),
            pulse_scenario: "leak".to_string(),
            equivalent_scenario: "burned".to_string(),
            pulse_species: "CH4".to_string(),
            equivalent_species: "CO2 FFI".to_string(),
            pulse_time: TimePoint::mid_year(2022),
            pulse_magnitude: 0.25,
            molar_mass_source: MOLAR_MASS_CH4,
            molar_mass_target: MOLAR_MASS_CO2,
            // MtCH4 -> GtCO2
            unit_scale: 1e-3,
        }
    }
}

impl PulseExperiment {
    /// Scenario names in the order they appear on the scenario axis
    pub fn scenario_names(&self) -> Vec<String> {
        vec![
            self.counterfactual_scenario.clone(),
            self.pulse_scenario.clone(),
            self.equivalent_scenario.clone(),
        ]
    }

    pub fn validate(&self) -> PulseResult<()> {
        validate_labels("scenario", &self.scenario_names())
            .map_err(|e| PulseError::InvalidExperiment(e.to_string()))?;
        if self.pulse_species == self.equivalent_species {
            return Err(PulseError::InvalidExperiment(format!(
                "pulse and equivalent species must differ, both are '{}'",
                self.pulse_species
            )));
        }
        if !self.pulse_magnitude.is_finite() {
            return Err(PulseError::InvalidExperiment(format!(
                "pulse magnitude must be finite, got {}",
                self.pulse_magnitude
            )));
        }
        for (name, value) in [
            ("molar_mass_source", self.molar_mass_source),
            ("molar_mass_target", self.molar_mass_target),
            ("unit_scale", self.unit_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(PulseError::InvalidExperiment(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Mass of the equivalent species released by burning the pulse
    pub fn equivalent_delta(&self) -> FloatValue {
        convert_mass(
            self.pulse_magnitude,
            self.molar_mass_source,
            self.molar_mass_target,
            self.unit_scale,
        )
    }

    /// The perturbations applied on top of the baseline
    pub fn perturbations(&self) -> [Perturbation; 2] {
        [
            Perturbation {
                species: self.pulse_species.clone(),
                time_point: self.pulse_time,
                scenario: self.pulse_scenario.clone(),
                delta: self.pulse_magnitude,
            },
            Perturbation {
                species: self.equivalent_species.clone(),
                time_point: self.pulse_time,
                scenario: self.equivalent_scenario.clone(),
                delta: self.equivalent_delta(),
            },
        ]
    }
}

/// Build the counterfactual, pulse and equivalent-release scenarios.
///
/// Either all three scenarios are produced consistently or an error is returned; no
/// partially perturbed series escapes.
pub fn assemble_scenarios(
    baseline: &BaselinePathway,
    horizon: &TimeAxis,
    species: &[String],
    configs: &[String],
    experiment: &PulseExperiment,
) -> PulseResult<EmissionsSeries> {
    experiment.validate()?;

    let mut series = EmissionsSeries::initialize_scenarios(
        baseline,
        horizon,
        species,
        &experiment.scenario_names(),
        configs,
    )?;

    for perturbation in experiment.perturbations().iter() {
        series.apply(perturbation)?;
        info!(
            scenario = %perturbation.scenario,
            species = %perturbation.species,
            time = %perturbation.time_point,
            delta = perturbation.delta,
            "Perturbed scenario"
        );
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn baseline() -> BaselinePathway {
        let horizon = TimeAxis::annual_midpoints(2015, 2030).unwrap();
        let species = labels(&["CO2 FFI", "CH4", "Sulfur"]);
        let values = Array2::from_shape_fn((horizon.len(), species.len()), |(t, s)| {
            (s as f64 + 1.0) * 10.0 + t as f64 * 0.1
        });
        BaselinePathway::new("ssp245", "unspecified", horizon, species, values).unwrap()
    }

    #[test]
    fn builder_defaults_to_baseline_axes() {
        let baseline = baseline();
        let series = ScenarioBuilder::new()
            .with_scenario("counterfactual")
            .with_scenario("leak")
            .with_configs(&labels(&["a", "b"]))
            .build(&baseline)
            .unwrap();

        assert_eq!(series.time_axis(), baseline.time_axis());
        assert_eq!(series.species(), baseline.species());
        assert_eq!(series.scenarios(), &labels(&["counterfactual", "leak"]));
    }

    #[test]
    fn builder_without_configs_fails() {
        let result = ScenarioBuilder::new()
            .with_scenario("counterfactual")
            .build(&baseline());
        assert_eq!(result, Err(PulseError::EmptyAxis("config".to_string())));
    }

    #[test]
    fn default_experiment_is_valid() {
        let experiment = PulseExperiment::default();
        experiment.validate().unwrap();
        assert_eq!(
            experiment.scenario_names(),
            labels(&["counterfactual", "leak", "burned"])
        );
    }

    #[test]
    fn equivalent_delta() {
        let experiment = PulseExperiment::default();
        assert_eq!(
            experiment.equivalent_delta(),
            0.25 * 1e-3 * (44.009 / 16.043)
        );
    }

    #[test]
    fn invalid_experiments() {
        let duplicate = PulseExperiment {
            equivalent_scenario: "leak".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            duplicate.validate(),
            Err(PulseError::InvalidExperiment(_))
        ));

        let same_species = PulseExperiment {
            equivalent_species: "CH4".to_string(),
            ..Default::default()
        };
        assert!(same_species.validate().is_err());

        let bad_mass = PulseExperiment {
            molar_mass_source: 0.0,
            ..Default::default()
        };
        assert!(bad_mass.validate().is_err());

        let bad_magnitude = PulseExperiment {
            pulse_magnitude: f64::INFINITY,
            ..Default::default()
        };
        assert!(bad_magnitude.validate().is_err());
    }

    #[test]
    fn assemble_missing_pulse_time_fails_without_series() {
        let baseline = baseline();
        let experiment = PulseExperiment {
            pulse_time: TimePoint::mid_year(2040),
            ..Default::default()
        };
        let result = assemble_scenarios(
            &baseline,
            baseline.time_axis(),
            baseline.species(),
            &labels(&["1"]),
            &experiment,
        );
        assert_eq!(
            result,
            Err(PulseError::TimePointNotFound("2040.5".to_string()))
        );
    }

    #[test]
    fn assemble_unknown_equivalent_species() {
        let baseline = baseline();
        let experiment = PulseExperiment {
            equivalent_species: "CO2".to_string(),
            ..Default::default()
        };
        let result = assemble_scenarios(
            &baseline,
            baseline.time_axis(),
            baseline.species(),
            &labels(&["1"]),
            &experiment,
        );
        assert_eq!(result, Err(PulseError::UnknownSpecies("CO2".to_string())));
    }

    #[test]
    fn experiment_from_json_uses_defaults() {
        let experiment: PulseExperiment =
            serde_json::from_str(r#"{"pulse_magnitude": 0.5, "pulse_time": 2023.5}"#).unwrap();
        assert_eq!(experiment.pulse_magnitude, 0.5);
        assert_eq!(experiment.pulse_time, TimePoint::mid_year(2023));
        assert_eq!(experiment.pulse_species, "CH4");
    }
}
