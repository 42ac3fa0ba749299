//! Observation channels and their chi-squared scores.
//!
//! A channel owns an immutable observation set and knows how to turn a trial
//! vector into predictions at each observation point. Channels are pluggable:
//! the aggregator only sees the `Channel` trait, so a run can combine the
//! growth channel with any number of auxiliary channels.
//!
//! Failures are values, not panics: anything that would have been a thrown
//! exception in a notebook (missing parameter, non-finite solve, unusable
//! amplitude grid) comes back as a `ChannelFailure` so the aggregator can
//! apply its penalty policy and the cause stays inspectable in tests.

use crate::domain::{check_observations, Observation, ParameterVector};
use crate::error::CalError;
use crate::fit::amplitude::AmplitudeGrid;
use crate::models::{f_sigma8, Cosmology, CouplingParams};

/// Muon mass in GeV.
const M_MU_GEV: f64 = 0.105_658_375_5;

/// Why a channel could not score a trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelFailure {
    /// A prediction or the resulting chi-squared was `NaN`/`Inf`.
    NonFinite { channel: String },
    /// The amplitude grid search found no usable candidate.
    NoViableAmplitude { channel: String },
    /// The trial's parameter space does not declare a name the channel needs.
    MissingParameter { channel: String, name: String },
}

impl std::fmt::Display for ChannelFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite { channel } => {
                write!(f, "channel '{channel}': non-finite prediction")
            }
            Self::NoViableAmplitude { channel } => {
                write!(f, "channel '{channel}': no viable amplitude candidate")
            }
            Self::MissingParameter { channel, name } => {
                write!(f, "channel '{channel}': parameter '{name}' not declared")
            }
        }
    }
}

/// One channel's contribution to the objective.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelScore {
    pub channel: String,
    pub chi_squared: f64,
}

/// A pluggable observation channel.
///
/// `Send + Sync` so the driver can evaluate a batch of trials in parallel.
pub trait Channel: Send + Sync {
    fn id(&self) -> &str;

    /// Score one trial. Must not panic for any in-bounds vector.
    fn evaluate(&self, params: &ParameterVector) -> Result<ChannelScore, ChannelFailure>;
}

/// Standard weighted residual: `Σ ((pred − target) / σ)²`.
///
/// # Panics
/// Panics if the slices have different lengths. Callers build predictions
/// from the same observation slice, so the lengths always agree.
pub fn chi_squared(obs: &[Observation], preds: &[f64]) -> f64 {
    assert_eq!(obs.len(), preds.len());
    obs.iter()
        .zip(preds)
        .map(|(o, &p)| {
            let r = (p - o.target) / o.sigma;
            r * r
        })
        .sum()
}

fn missing(channel: &str, name: &str) -> ChannelFailure {
    ChannelFailure::MissingParameter {
        channel: channel.to_string(),
        name: name.to_string(),
    }
}

/// Structure-growth channel: `f·σ8(z)` observations.
///
/// Each evaluation runs the growth ODE per observation redshift and fits the
/// σ8 amplitude by grid search, so this is the expensive channel of the set.
pub struct GrowthChannel {
    id: String,
    obs: Vec<Observation>,
    cosmo: Cosmology,
    /// Effective wavenumber of the survey, in h/Mpc.
    k_eff: f64,
    /// RK4 step count per solve.
    n_steps: usize,
    amplitude: AmplitudeGrid,
}

impl GrowthChannel {
    pub fn new(
        id: impl Into<String>,
        obs: Vec<Observation>,
        cosmo: Cosmology,
        k_eff: f64,
        n_steps: usize,
        amplitude: AmplitudeGrid,
    ) -> Result<Self, CalError> {
        let id = id.into();
        check_observations(&id, &obs)?;
        if !(k_eff.is_finite() && k_eff > 0.0) {
            return Err(CalError::config(format!("Channel '{id}': invalid k_eff {k_eff}.")));
        }
        if n_steps == 0 {
            return Err(CalError::config(format!("Channel '{id}': n_steps must be > 0.")));
        }
        Ok(Self {
            id,
            obs,
            cosmo,
            k_eff,
            n_steps,
            amplitude,
        })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.obs
    }
}

impl Channel for GrowthChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn evaluate(&self, params: &ParameterVector) -> Result<ChannelScore, ChannelFailure> {
        let coupling =
            CouplingParams::from_vector(params).ok_or_else(|| missing(&self.id, "eps_mass"))?;

        let fit = self.amplitude.calibrate(&self.id, &self.obs, |sigma8_0, o| {
            f_sigma8(&self.cosmo, &coupling, self.k_eff, o.x, sigma8_0, self.n_steps)
        })?;

        Ok(ChannelScore {
            channel: self.id.clone(),
            chi_squared: fit.chi_squared,
        })
    }
}

/// Muon anomalous-moment channel: one observation of `Δa_μ`.
///
/// Prediction: `Δa_μ = g² / (12π²) · (m_μ / m_Z')²`.
pub struct MuonMomentChannel {
    id: String,
    obs: Observation,
}

impl MuonMomentChannel {
    pub fn new(id: impl Into<String>, obs: Observation) -> Result<Self, CalError> {
        let id = id.into();
        check_observations(&id, std::slice::from_ref(&obs))?;
        Ok(Self { id, obs })
    }
}

impl Channel for MuonMomentChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn evaluate(&self, params: &ParameterVector) -> Result<ChannelScore, ChannelFailure> {
        let g_mu = params.get("g_mu").ok_or_else(|| missing(&self.id, "g_mu"))?;
        let m_zp = params
            .get("m_zp_gev")
            .ok_or_else(|| missing(&self.id, "m_zp_gev"))?;

        let pref = g_mu * g_mu / (12.0 * std::f64::consts::PI * std::f64::consts::PI);
        let ratio = (M_MU_GEV * M_MU_GEV) / (m_zp * m_zp);
        let pred = pref * ratio;
        if !pred.is_finite() {
            return Err(ChannelFailure::NonFinite {
                channel: self.id.clone(),
            });
        }

        Ok(ChannelScore {
            channel: self.id.clone(),
            chi_squared: chi_squared(std::slice::from_ref(&self.obs), &[pred]),
        })
    }
}

/// Laboratory-consistency channel.
///
/// Tabletop observables (decoherence rates, thermal noise, lifetimes) are
/// normalized to 1 and respond weakly and linearly to the mass-coupling
/// strength around its fiducial value.
pub struct MicroChannel {
    id: String,
    obs: Vec<Observation>,
    /// Fiducial strength at which all predictions equal 1.
    fiducial_eps: f64,
    /// Linear response of the normalized observables to `eps_mass`.
    response: f64,
}

impl MicroChannel {
    pub fn new(id: impl Into<String>, obs: Vec<Observation>) -> Result<Self, CalError> {
        let id = id.into();
        check_observations(&id, &obs)?;
        Ok(Self {
            id,
            obs,
            fiducial_eps: 0.37,
            response: 0.1,
        })
    }
}

impl Channel for MicroChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn evaluate(&self, params: &ParameterVector) -> Result<ChannelScore, ChannelFailure> {
        let eps_mass = params
            .get("eps_mass")
            .ok_or_else(|| missing(&self.id, "eps_mass"))?;
        let pred = 1.0 + self.response * (eps_mass - self.fiducial_eps);
        if !pred.is_finite() {
            return Err(ChannelFailure::NonFinite {
                channel: self.id.clone(),
            });
        }
        let preds = vec![pred; self.obs.len()];
        Ok(ChannelScore {
            channel: self.id.clone(),
            chi_squared: chi_squared(&self.obs, &preds),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{vector_in, ParamSpace, ParamSpec};
    use std::sync::Arc;

    fn zp_space() -> Arc<ParamSpace> {
        ParamSpace::new(vec![
            ParamSpec::log("g_mu", 1e-5, 1e-3, 0.3),
            ParamSpec::log("m_zp_gev", 1e-3, 1e-1, 0.3),
        ])
        .unwrap()
    }

    #[test]
    fn chi_squared_sums_weighted_residuals() {
        let obs = vec![
            Observation { x: 0.0, target: 1.0, sigma: 0.5 },
            Observation { x: 1.0, target: 2.0, sigma: 1.0 },
        ];
        let chi2 = chi_squared(&obs, &[1.5, 3.0]);
        assert!((chi2 - (1.0 + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn muon_channel_scores_the_anomaly_formula() {
        let space = zp_space();
        let obs = Observation {
            x: 0.0,
            target: 25.1e-10,
            sigma: 4.8e-10,
        };
        let ch = MuonMomentChannel::new("muon", obs).unwrap();

        let pv = vector_in(&space, vec![5.0e-4, 0.05]).unwrap();
        let score = ch.evaluate(&pv).unwrap();

        let pred = (5.0e-4_f64).powi(2) / (12.0 * std::f64::consts::PI.powi(2))
            * (M_MU_GEV / 0.05).powi(2);
        let expected = ((pred - obs.target) / obs.sigma).powi(2);
        assert!((score.chi_squared - expected).abs() < 1e-9 * expected.max(1.0));
    }

    #[test]
    fn missing_parameter_is_reported_not_panicked() {
        let space = zp_space();
        let pv = vector_in(&space, vec![5.0e-4, 0.05]).unwrap();
        let ch = MicroChannel::new(
            "micro",
            vec![Observation { x: 0.0, target: 1.0, sigma: 0.1 }],
        )
        .unwrap();
        let err = ch.evaluate(&pv).unwrap_err();
        assert!(matches!(err, ChannelFailure::MissingParameter { .. }));
    }

    #[test]
    fn micro_channel_is_zero_at_fiducial_strength() {
        let space = ParamSpace::new(vec![ParamSpec::linear("eps_mass", 0.1, 1.0, 0.05)]).unwrap();
        let pv = vector_in(&space, vec![0.37]).unwrap();
        let ch = MicroChannel::new(
            "micro",
            vec![
                Observation { x: 0.0, target: 1.0, sigma: 0.1 },
                Observation { x: 0.0, target: 1.0, sigma: 0.15 },
            ],
        )
        .unwrap();
        let score = ch.evaluate(&pv).unwrap();
        assert!(score.chi_squared.abs() < 1e-20);
    }

    #[test]
    fn channels_reject_bad_observations_up_front() {
        let bad = vec![Observation { x: 0.0, target: 1.0, sigma: 0.0 }];
        assert!(MicroChannel::new("micro", bad).is_err());
        assert!(MicroChannel::new("micro", Vec::new()).is_err());
    }
}
