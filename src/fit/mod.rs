//! Objective evaluation.
//!
//! Responsibilities:
//!
//! - calibrate the amplitude nuisance by grid search (`amplitude`)
//! - score individual observation channels by weighted residuals (`channel`)
//! - aggregate channels into one scalar with failure containment (`objective`)

pub mod amplitude;
pub mod channel;
pub mod objective;

pub use amplitude::*;
pub use channel::*;
pub use objective::*;
