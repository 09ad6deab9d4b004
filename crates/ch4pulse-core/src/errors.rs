use thiserror::Error;

/// Error type for invalid scenario and ensemble operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PulseError {
    #[error("Baseline does not cover the requested {axis} axis: missing {label}")]
    ShapeMismatch { axis: String, label: String },
    #[error("Unknown species '{0}'")]
    UnknownSpecies(String),
    #[error("Unknown scenario '{0}'")]
    UnknownScenario(String),
    #[error("Time point {0} not found on the time axis")]
    TimePointNotFound(String),
    #[error("Invalid time point {0}: values must lie on the half-year grid")]
    InvalidTimePoint(f64),
    #[error("Time axis must be strictly increasing. {previous} is followed by {next}")]
    UnsortedTimeAxis { previous: String, next: String },
    #[error("The {0} axis must not be empty")]
    EmptyAxis(String),
    #[error("Duplicate label '{label}' on the {axis} axis")]
    DuplicateLabel { axis: String, label: String },
    #[error("Array shape {found:?} does not match the axes {expected:?}")]
    InvalidShape {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("Non-finite value for {0}")]
    NonFiniteValue(String),
    #[error("Invalid experiment: {0}")]
    InvalidExperiment(String),
    #[error("Calibration column '{0}' not found")]
    MissingColumn(String),
    #[error("Percentile {0} is outside of [0, 100]")]
    InvalidPercentile(f64),
    #[error("Simulation inputs are inconsistent: {0}")]
    InconsistentInputs(String),
    #[error("Simulator '{simulator}' failed: {reason}")]
    SimulatorFailed { simulator: String, reason: String },
}

/// Convenience type for `Result<T, PulseError>`.
pub type PulseResult<T> = Result<T, PulseError>;
