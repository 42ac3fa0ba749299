//! Physical model evaluation.
//!
//! The calibration engine treats predictions as opaque, but the shipped
//! channel set needs a concrete model:
//!
//! - a flat ΛCDM background (`background`)
//! - a modified coupling `μ(a, k)` built from three suppression factors
//!   (`coupling`)
//! - the growth-factor ODE solve and the `f·σ8(z)` observable (`growth`)

pub mod background;
pub mod coupling;
pub mod growth;

pub use background::*;
pub use coupling::*;
pub use growth::*;
