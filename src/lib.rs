//! Methane pulse experiments with simple climate models.
//!
//! This crate ties together [`ch4pulse_core`], which builds the emissions scenarios, forcing
//! and summaries, and [`ch4pulse_inputs`], which reads and writes the files of a run.
//! The [`pipeline`] module runs the stages in order for a [`RunConfig`].

pub mod pipeline;

pub use ch4pulse_inputs::config::RunConfig;
pub use pipeline::{
    prepare_inputs, run_with_simulator, summarise, write_inputs, write_summaries, RunError,
    RunReport, RunResult,
};
