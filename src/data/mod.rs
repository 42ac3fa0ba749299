//! Observation data: bundled survey compilations and synthetic generation.
//!
//! The calibration core performs no parsing or file I/O; channels receive
//! pre-loaded in-memory observation arrays. This module provides the two
//! sources used by the demo binary and the tests.

pub mod observed;
pub mod synthetic;

pub use observed::*;
pub use synthetic::*;
