//! Candidate proposal strategies.
//!
//! `EliteSampler` is a simplified Tree-structured Parzen Estimator: instead
//! of building explicit good/bad densities it perturbs samples drawn from the
//! best fraction of the history (exploitation) and occasionally draws fresh
//! uniform/log-uniform candidates over the full bounds (exploration). The
//! `Proposer` trait keeps the strategy swappable — a library-grade Bayesian
//! optimizer could replace it without touching the driver or evaluator.

use std::sync::Arc;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{
    NoiseScale, ParamSpace, ParameterVector, SampleScale, Trial, TrialHistory,
};
use crate::error::CalError;

/// A proposal strategy: history snapshot in, fresh candidate out.
pub trait Proposer {
    fn propose(&mut self, history: &TrialHistory, rng: &mut StdRng) -> ParameterVector;
}

/// Tunables for `EliteSampler`.
///
/// The source variants disagreed on these constants, so they are
/// configuration, not load-bearing values.
#[derive(Debug, Clone, Copy)]
pub struct EliteSamplerConfig {
    /// Fraction of history (by score, ascending) treated as elite.
    pub elite_fraction: f64,
    /// Probability of perturbing an elite trial instead of exploring.
    pub exploit_probability: f64,
}

impl Default for EliteSamplerConfig {
    fn default() -> Self {
        Self {
            elite_fraction: 0.2,
            exploit_probability: 0.8,
        }
    }
}

/// Perturb-the-elite proposer.
pub struct EliteSampler {
    space: Arc<ParamSpace>,
    config: EliteSamplerConfig,
}

impl EliteSampler {
    pub fn new(space: Arc<ParamSpace>, config: EliteSamplerConfig) -> Result<Self, CalError> {
        if !(config.elite_fraction.is_finite()
            && config.elite_fraction > 0.0
            && config.elite_fraction <= 1.0)
        {
            return Err(CalError::config(format!(
                "Elite fraction must be in (0, 1], got {}.",
                config.elite_fraction
            )));
        }
        if !(config.exploit_probability.is_finite()
            && (0.0..=1.0).contains(&config.exploit_probability))
        {
            return Err(CalError::config(format!(
                "Exploit probability must be in [0, 1], got {}.",
                config.exploit_probability
            )));
        }
        Ok(Self { space, config })
    }

    /// Uniform (or log-uniform) draw over the full declared bounds.
    fn explore(&self, rng: &mut StdRng) -> ParameterVector {
        let values = self
            .space
            .specs()
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let v = match s.scale {
                    SampleScale::Linear => rng.gen_range(s.lo..=s.hi),
                    // exp() can land a rounding ulp outside the bound.
                    SampleScale::Log => rng.gen_range(s.lo.ln()..=s.hi.ln()).exp(),
                };
                self.space.clamp(i, v)
            })
            .collect();
        ParameterVector::from_clamped(Arc::clone(&self.space), values)
    }

    /// Gaussian perturbation of one elite trial, clamped back into bounds.
    fn exploit(&self, base: &Trial, rng: &mut StdRng) -> ParameterVector {
        let values = self
            .space
            .specs()
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let current = base.params.values()[i];
                let sigma = match s.noise {
                    NoiseScale::Absolute(v) => v,
                    NoiseScale::Relative(f) => f * current.abs(),
                };
                // A relative sigma collapses at zero; keep a small floor so
                // the coordinate can still move.
                let sigma = if sigma > 0.0 {
                    sigma
                } else {
                    1e-3 * (s.hi - s.lo)
                };
                // Sigma is finite and positive here, so the distribution is valid.
                let noise = match Normal::new(0.0, sigma) {
                    Ok(n) => n.sample(rng),
                    Err(_) => 0.0,
                };
                self.space.clamp(i, current + noise)
            })
            .collect();
        ParameterVector::from_clamped(Arc::clone(&self.space), values)
    }

    /// Elite pool size for a history of `n` trials: `⌈p·n⌉`, at least 1.
    fn elite_count(&self, n: usize) -> usize {
        ((self.config.elite_fraction * n as f64).ceil() as usize).clamp(1, n)
    }
}

impl Proposer for EliteSampler {
    fn propose(&mut self, history: &TrialHistory, rng: &mut StdRng) -> ParameterVector {
        // No history yet: pure exploration until at least one trial exists.
        if history.is_empty() || rng.gen_range(0.0..1.0) >= self.config.exploit_probability {
            return self.explore(rng);
        }

        // Rank a snapshot by score; history order itself is never touched.
        let mut ranked: Vec<&Trial> = history.as_slice().iter().collect();
        ranked.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal));
        let elite = &ranked[..self.elite_count(ranked.len())];

        let base = elite[rng.gen_range(0..elite.len())];
        self.exploit(base, rng)
    }
}
