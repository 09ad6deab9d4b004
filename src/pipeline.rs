//! The stages of a pulse experiment run.
//!
//! A run reads the input files named in a [`RunConfig`], assembles the emissions scenarios
//! and forcing into a [`SimulationInputs`] bundle, hands that bundle to a simulator and
//! summarises the resulting temperatures. Any failure aborts the run.

use ch4pulse_core::analysis::{relative_to_period, scenario_difference, EnsembleSummary};
use ch4pulse_core::errors::PulseError;
use ch4pulse_core::forcing::ForcingEnsemble;
use ch4pulse_core::scenario::assemble_scenarios;
use ch4pulse_core::simulator::{check_output, ClimateSimulator, SimulationInputs, SimulationOutput};
use ch4pulse_inputs::calibration::read_calibration_table;
use ch4pulse_inputs::config::RunConfig;
use ch4pulse_inputs::emissions::{read_baseline_archive, write_emissions};
use ch4pulse_inputs::errors::InputError;
use ch4pulse_inputs::forcing::{read_historical_forcing, write_forcing};
use ch4pulse_inputs::output::write_summary;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const EMISSIONS_FILE: &str = "emissions.csv";
pub const FORCING_FILE: &str = "forcing.csv";

/// Error type for a pipeline run
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Pulse(#[from] PulseError),
    #[error("Summaries '{first}' and '{second}' would both be written to {path}")]
    SummaryNameClash {
        first: String,
        second: String,
        path: PathBuf,
    },
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type RunResult<T> = Result<T, RunError>;

/// Everything produced by a complete run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub inputs: SimulationInputs,
    pub output: SimulationOutput,
    pub summaries: Vec<EnsembleSummary>,
}

impl RunReport {
    pub fn summary(&self, label: &str) -> Option<&EnsembleSummary> {
        self.summaries.iter().find(|s| s.label == label)
    }
}

/// Read the input files and build the emissions scenarios and forcing ensemble
pub fn prepare_inputs(config: &RunConfig) -> RunResult<SimulationInputs> {
    config.validate()?;

    let mut calibration =
        read_calibration_table(&config.inputs.calibration, &config.inputs.calibration_id_column)?;
    if let Some(max_configs) = config.max_configs {
        if max_configs < calibration.len() {
            warn!(
                available = calibration.len(),
                used = max_configs,
                "Using a subset of the calibrated ensemble"
            );
            calibration = calibration.truncate(max_configs);
        }
    }

    let baseline = read_baseline_archive(
        &config.inputs.emissions,
        &config.inputs.baseline_scenario,
        &config.inputs.baseline_config,
    )?;
    let emissions = assemble_scenarios(
        &baseline,
        &config.horizon.emissions_axis()?,
        &config.species,
        calibration.ids(),
        &config.experiment,
    )?;

    let historical =
        read_historical_forcing(&config.inputs.historical_forcing, &config.inputs.forcing_columns)?;
    let forcing = ForcingEnsemble::build(
        &historical,
        &config.horizon.bounds_axis()?,
        &calibration,
        &config.forcing,
    )?;

    info!(
        scenarios = emissions.scenarios().len(),
        configs = calibration.len(),
        species = emissions.species().len(),
        "Prepared simulator inputs"
    );
    Ok(SimulationInputs::new(emissions, forcing, calibration)?)
}

/// Write the emissions and forcing hand-off files into `dir`
pub fn write_inputs(inputs: &SimulationInputs, dir: &Path) -> RunResult<Vec<PathBuf>> {
    create_dir(dir)?;
    let emissions = dir.join(EMISSIONS_FILE);
    let forcing = dir.join(FORCING_FILE);
    write_emissions(inputs.emissions(), &emissions)?;
    write_forcing(inputs.forcing(), &forcing)?;
    Ok(vec![emissions, forcing])
}

/// Summarise simulated temperatures.
///
/// Produces one anomaly summary per experiment scenario, labelled with the scenario name,
/// followed by the difference from the counterfactual for the pulse and equivalent-release
/// scenarios, labelled `"<scenario> - <counterfactual>"`.
pub fn summarise(config: &RunConfig, output: &SimulationOutput) -> RunResult<Vec<EnsembleSummary>> {
    let experiment = &config.experiment;
    let percentiles = &config.analysis.percentiles;
    let (start, end) = config.analysis.reference_period();
    let anomaly = relative_to_period(output, start, end)?;

    let mut summaries = Vec::new();
    for scenario in experiment.scenario_names() {
        summaries.push(EnsembleSummary::from_ensemble(
            scenario.as_str(),
            anomaly.time_axis(),
            anomaly.scenario_temperature(&scenario)?,
            percentiles,
        )?);
    }

    for scenario in [&experiment.pulse_scenario, &experiment.equivalent_scenario] {
        let difference =
            scenario_difference(output, scenario, &experiment.counterfactual_scenario)?;
        let summary = EnsembleSummary::from_ensemble(
            format!("{} - {}", scenario, experiment.counterfactual_scenario),
            output.time_axis(),
            difference.view(),
            percentiles,
        )?;
        if let Some((time, peak)) = summary.peak_median() {
            info!(label = %summary.label, %time, peak, "Peak median temperature difference");
        }
        summaries.push(summary);
    }
    Ok(summaries)
}

/// Write each summary to `dir` as `temperature_<label>.csv`.
///
/// Fails before writing anything if two labels map to the same file name.
pub fn write_summaries(summaries: &[EnsembleSummary], dir: &Path) -> RunResult<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = Vec::with_capacity(summaries.len());
    for (i, summary) in summaries.iter().enumerate() {
        let path = dir.join(format!("temperature_{}.csv", file_stem(&summary.label)));
        if let Some(j) = paths.iter().position(|p| *p == path) {
            return Err(RunError::SummaryNameClash {
                first: summaries[j].label.clone(),
                second: summaries[i].label.clone(),
                path,
            });
        }
        paths.push(path);
    }

    create_dir(dir)?;
    for (summary, path) in summaries.iter().zip(&paths) {
        write_summary(summary, path)?;
    }
    Ok(paths)
}

/// Prepare inputs, run the simulator and summarise its output
pub fn run_with_simulator(
    config: &RunConfig,
    simulator: &dyn ClimateSimulator,
) -> RunResult<RunReport> {
    let inputs = prepare_inputs(config)?;

    info!(simulator = simulator.name(), "Running simulator");
    let output = simulator.simulate(&inputs)?;
    check_output(&inputs, &output)?;

    let summaries = summarise(config, &output)?;
    Ok(RunReport {
        inputs,
        output,
        summaries,
    })
}

fn create_dir(dir: &Path) -> RunResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| RunError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn file_stem(label: &str) -> String {
    label
        .replace(" - ", "_minus_")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
