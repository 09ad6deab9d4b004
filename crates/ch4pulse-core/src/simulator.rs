//! Hand-off to an external climate simulator.
//!
//! The climate response (carbon cycle, forcing and energy balance) is computed by an
//! external simulator. Everything it needs is assembled once into an immutable
//! [`SimulationInputs`] bundle which is passed to [`ClimateSimulator::simulate`]. There are
//! no setters: a simulator cannot change the inputs of another run, and no configuration is
//! shared between runs.

use crate::calibration::CalibrationTable;
use crate::emissions::{validate_labels, EmissionsSeries};
use crate::errors::{PulseError, PulseResult};
use crate::forcing::ForcingEnsemble;
use crate::time::TimeAxis;
use crate::FloatValue;
use ndarray::{Array3, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Inputs for one simulator invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    emissions: EmissionsSeries,
    forcing: ForcingEnsemble,
    calibration: CalibrationTable,
}

impl SimulationInputs {
    /// Bundle the inputs, checking that they describe the same ensemble.
    ///
    /// The configuration labels of the emissions and forcing must equal the calibration
    /// ids, in the same order.
    pub fn new(
        emissions: EmissionsSeries,
        forcing: ForcingEnsemble,
        calibration: CalibrationTable,
    ) -> PulseResult<Self> {
        if emissions.configs() != calibration.ids() {
            return Err(PulseError::InconsistentInputs(
                "emissions configurations do not match the calibration ids".to_string(),
            ));
        }
        if forcing.configs() != calibration.ids() {
            return Err(PulseError::InconsistentInputs(
                "forcing configurations do not match the calibration ids".to_string(),
            ));
        }
        Ok(Self {
            emissions,
            forcing,
            calibration,
        })
    }

    pub fn emissions(&self) -> &EmissionsSeries {
        &self.emissions
    }

    pub fn forcing(&self) -> &ForcingEnsemble {
        &self.forcing
    }

    pub fn calibration(&self) -> &CalibrationTable {
        &self.calibration
    }

    pub fn scenarios(&self) -> &[String] {
        self.emissions.scenarios()
    }

    pub fn configs(&self) -> &[String] {
        self.calibration.ids()
    }

    /// Time bounds on which the simulator reports its output
    pub fn output_time_axis(&self) -> &TimeAxis {
        self.forcing.time_axis()
    }
}

/// Global-mean temperature produced by a simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    time_axis: TimeAxis,
    scenarios: Vec<String>,
    configs: Vec<String>,
    /// Temperature anomaly (K) with shape (time, scenario, config)
    temperature: Array3<FloatValue>,
}

impl SimulationOutput {
    pub fn new(
        time_axis: TimeAxis,
        scenarios: Vec<String>,
        configs: Vec<String>,
        temperature: Array3<FloatValue>,
    ) -> PulseResult<Self> {
        validate_labels("scenario", &scenarios)?;
        validate_labels("config", &configs)?;
        let expected = vec![time_axis.len(), scenarios.len(), configs.len()];
        if temperature.shape() != expected.as_slice() {
            return Err(PulseError::InvalidShape {
                expected,
                found: temperature.shape().to_vec(),
            });
        }
        Ok(Self {
            time_axis,
            scenarios,
            configs,
            temperature,
        })
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn scenarios(&self) -> &[String] {
        &self.scenarios
    }

    pub fn configs(&self) -> &[String] {
        &self.configs
    }

    /// Temperature with shape (time, scenario, config)
    pub fn temperature(&self) -> ArrayView3<FloatValue> {
        self.temperature.view()
    }

    pub fn scenario_index(&self, scenario: &str) -> PulseResult<usize> {
        self.scenarios
            .iter()
            .position(|s| s == scenario)
            .ok_or_else(|| PulseError::UnknownScenario(scenario.to_string()))
    }

    /// Temperature of one scenario with shape (time, config)
    pub fn scenario_temperature(&self, scenario: &str) -> PulseResult<ArrayView2<FloatValue>> {
        let index = self.scenario_index(scenario)?;
        Ok(self.temperature.index_axis(Axis(1), index))
    }
}

/// A deterministic climate-response simulator.
///
/// Implementations are free to parallelise internally, for example across configurations.
pub trait ClimateSimulator: Debug {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Run every scenario and configuration in `inputs`.
    ///
    /// The output must cover `inputs.output_time_axis()`, `inputs.scenarios()` and
    /// `inputs.configs()`.
    fn simulate(&self, inputs: &SimulationInputs) -> PulseResult<SimulationOutput>;
}

/// Check that a simulator's output matches the inputs it was given
pub fn check_output(inputs: &SimulationInputs, output: &SimulationOutput) -> PulseResult<()> {
    if output.time_axis() != inputs.output_time_axis() {
        return Err(PulseError::InconsistentInputs(
            "simulator output does not use the forcing time axis".to_string(),
        ));
    }
    if output.scenarios() != inputs.scenarios() {
        return Err(PulseError::InconsistentInputs(
            "simulator output scenarios do not match the emissions scenarios".to_string(),
        ));
    }
    if output.configs() != inputs.configs() {
        return Err(PulseError::InconsistentInputs(
            "simulator output configurations do not match the calibration ids".to_string(),
        ));
    }
    Ok(())
}
