//! Scenario construction for methane pulse experiments with simple climate models.
//!
//! # Module Organisation
//!
//! - `time`: exact half-year time points and time axes
//! - `species`: standard emitted species and their units
//! - `units`: molar masses and mass conversion between species
//! - `emissions`: baseline pathways and the multi-scenario emissions series
//! - `scenario`: the counterfactual / pulse / equivalent-release experiment
//! - `calibration`: the calibrated parameter ensemble
//! - `forcing`: volcanic and solar forcing for each configuration
//! - `simulator`: the hand-off to an external climate simulator
//! - `analysis`: anomalies, scenario differences and ensemble percentiles

pub mod analysis;
pub mod calibration;
pub mod emissions;
pub mod forcing;
pub mod scenario;
pub mod simulator;
pub mod species;
pub mod time;
pub mod units;

pub mod errors;

pub type FloatValue = f64;
