//! Amplitude nuisance calibration by grid search.
//!
//! The overall normalization (σ8-style amplitude) enters the prediction
//! linearly and is well understood, so we do not make the outer optimizer
//! learn it. Instead each trial runs a small deterministic grid search over
//! amplitude candidates and keeps the best channel chi-squared.
//!
//! Why grid search?
//! - It avoids local minima issues common in nonlinear optimization.
//! - It is deterministic given the same inputs.
//! - With one nuisance dimension, a modest grid is fast enough to sit inside
//!   the per-trial hot loop.

use rayon::prelude::*;

use crate::domain::Observation;
use crate::error::CalError;
use crate::fit::channel::{chi_squared, ChannelFailure};

/// Finite candidate grid for one amplitude nuisance parameter.
#[derive(Debug, Clone)]
pub struct AmplitudeGrid {
    candidates: Vec<f64>,
    /// Reject candidates whose predictions are not strictly positive.
    require_positive: bool,
}

/// Winning candidate of one grid search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeFit {
    pub amplitude: f64,
    pub chi_squared: f64,
}

impl AmplitudeGrid {
    /// Evenly spaced grid from `lo` to `hi` (inclusive).
    pub fn linspace(
        lo: f64,
        hi: f64,
        steps: usize,
        require_positive: bool,
    ) -> Result<Self, CalError> {
        if !(lo.is_finite() && hi.is_finite() && hi > lo) {
            return Err(CalError::config(format!(
                "Invalid amplitude range: lo={lo}, hi={hi} (must be finite and hi > lo)."
            )));
        }
        if steps < 2 {
            return Err(CalError::config("Amplitude grid steps must be >= 2."));
        }
        let step = (hi - lo) / (steps as f64 - 1.0);
        let candidates = (0..steps).map(|i| lo + step * i as f64).collect();
        Ok(Self {
            candidates,
            require_positive,
        })
    }

    pub fn candidates(&self) -> &[f64] {
        &self.candidates
    }

    /// Spacing between adjacent candidates (for tolerance checks).
    pub fn spacing(&self) -> f64 {
        self.candidates[1] - self.candidates[0]
    }

    /// Evaluate every candidate and return the one with minimal chi-squared.
    ///
    /// `predict(amplitude, obs)` produces the model value for one observation.
    /// A candidate is skipped (not scored) if any of its predictions is
    /// non-finite, or non-positive when positivity is required. If every
    /// candidate is skipped the whole grid search fails with
    /// `NoViableAmplitude` and the caller must treat the channel as failed.
    ///
    /// Tie-break: the first minimal value in candidate order.
    pub fn calibrate<F>(
        &self,
        channel_id: &str,
        obs: &[Observation],
        predict: F,
    ) -> Result<AmplitudeFit, ChannelFailure>
    where
        F: Fn(f64, &Observation) -> f64 + Sync,
    {
        // Candidates are independent; evaluate in parallel, select
        // deterministically by grid index afterwards.
        let scored: Vec<(usize, AmplitudeFit)> = self
            .candidates
            .par_iter()
            .enumerate()
            .filter_map(|(idx, &amp)| {
                let mut preds = Vec::with_capacity(obs.len());
                for o in obs {
                    let p = predict(amp, o);
                    if !p.is_finite() || (self.require_positive && p <= 0.0) {
                        return None;
                    }
                    preds.push(p);
                }
                let chi2 = chi_squared(obs, &preds);
                if !chi2.is_finite() {
                    return None;
                }
                Some((
                    idx,
                    AmplitudeFit {
                        amplitude: amp,
                        chi_squared: chi2,
                    },
                ))
            })
            .collect();

        // Minimum chi-squared; ties resolve to the lowest grid index.
        let mut best: Option<(usize, AmplitudeFit)> = None;
        for (idx, fit) in scored {
            let replace = match &best {
                None => true,
                Some((bi, bf)) => {
                    fit.chi_squared < bf.chi_squared
                        || (fit.chi_squared == bf.chi_squared && idx < *bi)
                }
            };
            if replace {
                best = Some((idx, fit));
            }
        }

        best.map(|(_, fit)| fit).ok_or_else(|| ChannelFailure::NoViableAmplitude {
            channel: channel_id.to_string(),
        })
    }
}
