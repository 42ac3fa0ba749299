//! Domain types used throughout the calibration pipeline.
//!
//! This module defines:
//!
//! - the typed parameter space (`ParamSpec`, `ParamSpace`, `ParameterVector`)
//! - observation records shared read-only across trials (`Observation`)
//! - optimizer bookkeeping (`Trial`, `TrialHistory`, `BestSoFar`)
//! - run outcomes (`TerminationReason`)

pub mod types;

pub use types::*;
