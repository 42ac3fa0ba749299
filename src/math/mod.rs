//! Mathematical utilities: fixed-step ODE integration.

pub mod rk4;

pub use rk4::*;
