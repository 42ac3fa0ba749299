//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - assembles the bundled observation channels
//! - runs the calibration loop with a printing progress sink
//! - prints the final summary

use crate::error::CalError;
use crate::report::{format_run_summary, PrintSink};

pub mod pipeline;

/// Entry point for the `gcal` binary.
pub fn run() -> Result<(), CalError> {
    let config = pipeline::CalibConfig::default();

    println!("Calibrating: {} trials, target E = {}", config.budget, config.target_score);

    let mut sink = PrintSink { every: 200 };
    let result = pipeline::run_calibration(&config, &mut sink)?;

    println!();
    println!("{}", format_run_summary(&result));
    Ok(())
}
