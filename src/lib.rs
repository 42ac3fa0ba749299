//! `growth-calib` library crate.
//!
//! The binary (`gcal`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., future daemon, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod models;
pub mod opt;
pub mod report;
