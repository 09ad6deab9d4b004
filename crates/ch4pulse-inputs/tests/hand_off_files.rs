//! The emissions hand-off file only differs from the baseline archive where pulses were applied.

use approx::assert_relative_eq;
use ch4pulse_core::scenario::{assemble_scenarios, PulseExperiment};
use ch4pulse_inputs::config::RunConfig;
use ch4pulse_inputs::emissions::{read_baseline_archive, write_emissions, EmissionsRecord};
use std::collections::HashMap;
use std::fs;

#[test]
fn hand_off_differs_only_at_pulses() {
    let dir = tempfile::tempdir().unwrap();

    let mut archive = String::from("scenario,config,species,timepoint,value\n");
    for year in 2015..2030 {
        for (species, value) in [("CO2 FFI", 36.0), ("CH4", 380.0), ("N2O", 8.5)] {
            archive.push_str(&format!(
                "ssp245,unspecified,{},{}.5,{}\n",
                species,
                year,
                value + (year - 2015) as f64
            ));
        }
    }
    fs::write(dir.path().join("archive.csv"), archive).unwrap();
    fs::write(
        dir.path().join("run.toml"),
        "species = [\"CO2 FFI\", \"CH4\", \"N2O\"]\n\n[inputs]\nemissions = \"archive.csv\"\n\n[horizon]\nstart_year = 2015\nend_year = 2030\n",
    )
    .unwrap();

    let config = RunConfig::from_path(dir.path().join("run.toml")).unwrap();
    let baseline = read_baseline_archive(
        &config.inputs.emissions,
        &config.inputs.baseline_scenario,
        &config.inputs.baseline_config,
    )
    .unwrap();
    let configs = vec!["1299".to_string(), "1300".to_string()];
    let series = assemble_scenarios(
        &baseline,
        &config.horizon.emissions_axis().unwrap(),
        &config.species,
        &configs,
        &config.experiment,
    )
    .unwrap();

    let out = dir.path().join("emissions.csv");
    write_emissions(&series, &out).unwrap();

    let baseline_values: HashMap<(String, String), f64> = {
        let mut reader = csv::Reader::from_path(dir.path().join("archive.csv")).unwrap();
        reader
            .deserialize::<EmissionsRecord>()
            .map(|r| r.unwrap())
            .map(|r| ((r.species, r.timepoint.to_string()), r.value))
            .collect()
    };

    let experiment = PulseExperiment::default();
    let mut reader = csv::Reader::from_path(&out).unwrap();
    let mut differing = Vec::new();
    let mut deltas = Vec::new();
    for record in reader.deserialize::<EmissionsRecord>() {
        let record = record.unwrap();
        let expected = baseline_values[&(record.species.clone(), record.timepoint.to_string())];
        if record.value != expected {
            deltas.push(record.value - expected);
            differing.push((record.scenario, record.species, record.timepoint, record.config));
        }
    }

    assert_eq!(
        differing,
        vec![
            (
                "leak".to_string(),
                "CH4".to_string(),
                2022.5,
                "1299".to_string()
            ),
            (
                "leak".to_string(),
                "CH4".to_string(),
                2022.5,
                "1300".to_string()
            ),
            (
                "burned".to_string(),
                "CO2 FFI".to_string(),
                2022.5,
                "1299".to_string()
            ),
            (
                "burned".to_string(),
                "CO2 FFI".to_string(),
                2022.5,
                "1300".to_string()
            ),
        ]
    );
    for delta in &deltas[..2] {
        assert_relative_eq!(*delta, experiment.pulse_magnitude, max_relative = 1e-9);
    }
    for delta in &deltas[2..] {
        assert_relative_eq!(*delta, experiment.equivalent_delta(), max_relative = 1e-6);
    }
    assert_eq!(experiment.scenario_names(), series.scenarios());
}
