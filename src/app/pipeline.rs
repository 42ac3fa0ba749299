//! Shared calibration pipeline used by the binary and the end-to-end tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! parameter space -> channels -> sampler -> driver run
//!
//! The binary then focuses on presentation (printing progress and the final
//! summary).

use std::sync::Arc;
use std::time::Duration;

use crate::data::{growth_observations, micro_observations, muon_observation};
use crate::domain::{vector_in, ParamSpace, ParamSpec, ParameterVector};
use crate::error::CalError;
use crate::fit::{AmplitudeGrid, GrowthChannel, MicroChannel, MuonMomentChannel, Objective};
use crate::models::Cosmology;
use crate::opt::{
    CalibrationDriver, DriverConfig, EliteSampler, EliteSamplerConfig, ProgressSink, RunResult,
};

/// Settings for one calibration run.
#[derive(Debug, Clone)]
pub struct CalibConfig {
    pub seed: u64,
    pub budget: usize,
    pub target_score: f64,
    pub batch_size: usize,
    pub max_wall_time: Option<Duration>,
    /// RK4 step count per growth solve.
    pub n_steps: usize,
    /// Effective wavenumber of the growth compilation, in h/Mpc.
    pub k_eff: f64,
}

impl Default for CalibConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            budget: 2000,
            target_score: 20.0,
            batch_size: 1,
            max_wall_time: None,
            n_steps: 600,
            k_eff: 0.02,
        }
    }
}

/// The 8-dimensional calibration space.
///
/// `rho_screen`, `g_mu` and `m_zp_gev` span orders of magnitude and sample
/// log-uniformly with value-relative perturbation; the bounded fractions use
/// additive noise at their natural scale.
pub fn param_space() -> Result<Arc<ParamSpace>, CalError> {
    ParamSpace::new(vec![
        ParamSpec::linear("eps_mass", 0.1, 1.0, 0.05),
        ParamSpec::linear("eps_0", 0.0, 1.0, 0.1),
        ParamSpec::linear("transition_a", 0.1, 0.9, 0.1),
        ParamSpec::linear("sharpness", 0.5, 30.0, 0.5),
        ParamSpec::linear("k_star", 0.005, 0.7, 0.02),
        ParamSpec::log("rho_screen", 1e2, 1e4, 0.2),
        ParamSpec::log("g_mu", 1e-5, 1e-3, 0.3),
        ParamSpec::log("m_zp_gev", 1e-3, 1e-1, 0.3),
    ])
}

/// Best configuration from earlier runs, used as the warm start.
pub fn reference_vector(space: &Arc<ParamSpace>) -> Result<ParameterVector, CalError> {
    vector_in(
        space,
        vec![0.355, 0.580, 0.520, 12.22, 0.436, 130.2, 3.36e-4, 0.067],
    )
}

/// Assemble the bundled three-channel objective.
pub fn standard_objective(config: &CalibConfig) -> Result<Objective, CalError> {
    let amplitude = AmplitudeGrid::linspace(0.5, 0.9, 10, true)?;
    let growth = GrowthChannel::new(
        "growth",
        growth_observations(),
        Cosmology::PLANCK,
        config.k_eff,
        config.n_steps,
        amplitude,
    )?;
    let micro = MicroChannel::new("micro", micro_observations())?;
    let muon = MuonMomentChannel::new("muon_g2", muon_observation())?;
    Objective::new(vec![Box::new(growth), Box::new(micro), Box::new(muon)])
}

/// Execute a full calibration against the bundled observation set.
pub fn run_calibration(
    config: &CalibConfig,
    sink: &mut dyn ProgressSink,
) -> Result<RunResult, CalError> {
    let space = param_space()?;
    let warm = reference_vector(&space)?;

    let objective = standard_objective(config)?;
    let driver = CalibrationDriver::new(
        objective,
        DriverConfig {
            budget: config.budget,
            target_score: config.target_score,
            seed: config.seed,
            batch_size: config.batch_size,
            max_wall_time: config.max_wall_time,
        },
    )?;
    let mut sampler = EliteSampler::new(space, EliteSamplerConfig::default())?;

    driver.run(&mut sampler, &[warm], sink)
}
