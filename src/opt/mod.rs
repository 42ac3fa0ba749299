//! Black-box optimization.
//!
//! Responsibilities:
//!
//! - propose candidate vectors from trial history (`sampler`)
//! - run the propose → evaluate → record loop with early stopping (`driver`)

pub mod driver;
pub mod sampler;

pub use driver::*;
pub use sampler::*;
