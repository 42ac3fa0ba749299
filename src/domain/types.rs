//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during calibration
//! - exported later for comparisons across runs
//!
//! The parameter space is validated **once**, at construction. Every
//! `ParameterVector` is created through its `ParamSpace`, so a vector that
//! exists is always in-bounds and finite. Vectors are never mutated after
//! creation; the sampler copies and perturbs instead.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CalError;

/// How a parameter is drawn during pure exploration.
///
/// `Log` is for parameters whose natural range spans orders of magnitude
/// (e.g., a screening density of 1e2–1e4): the draw is uniform in `ln(x)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleScale {
    Linear,
    Log,
}

/// Perturbation width used when a proposal is derived from an elite trial.
///
/// `Absolute` is a fixed sigma in parameter units (bounded fractions like a
/// transition epoch). `Relative` scales with the current value (coupling
/// strengths whose plausible magnitude follows the value itself).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseScale {
    Absolute(f64),
    Relative(f64),
}

/// Declaration of a single calibration parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    /// Inclusive lower bound.
    pub lo: f64,
    /// Inclusive upper bound.
    pub hi: f64,
    pub scale: SampleScale,
    pub noise: NoiseScale,
}

impl ParamSpec {
    /// Linearly sampled parameter with a fixed perturbation sigma.
    pub fn linear(name: impl Into<String>, lo: f64, hi: f64, sigma: f64) -> Self {
        Self {
            name: name.into(),
            lo,
            hi,
            scale: SampleScale::Linear,
            noise: NoiseScale::Absolute(sigma),
        }
    }

    /// Log-uniformly sampled parameter with a value-relative perturbation sigma.
    pub fn log(name: impl Into<String>, lo: f64, hi: f64, rel_sigma: f64) -> Self {
        Self {
            name: name.into(),
            lo,
            hi,
            scale: SampleScale::Log,
            noise: NoiseScale::Relative(rel_sigma),
        }
    }
}

/// Validated, immutable set of parameter declarations.
///
/// Shared via `Arc` by every `ParameterVector`, so bound lookups and name
/// resolution never require a copy of the specs.
#[derive(Debug)]
pub struct ParamSpace {
    specs: Vec<ParamSpec>,
}

impl ParamSpace {
    /// Validate and freeze a parameter space.
    ///
    /// Malformed bounds are a configuration error and fail here, at run
    /// setup, never at first use inside the optimizer loop.
    pub fn new(specs: Vec<ParamSpec>) -> Result<Arc<Self>, CalError> {
        if specs.is_empty() {
            return Err(CalError::config("Parameter space must not be empty."));
        }
        for (i, s) in specs.iter().enumerate() {
            if s.name.is_empty() {
                return Err(CalError::config(format!("Parameter {i} has an empty name.")));
            }
            if !(s.lo.is_finite() && s.hi.is_finite() && s.lo < s.hi) {
                return Err(CalError::config(format!(
                    "Invalid bound for '{}': [{}, {}] (must be finite and lo < hi).",
                    s.name, s.lo, s.hi
                )));
            }
            if s.scale == SampleScale::Log && s.lo <= 0.0 {
                return Err(CalError::config(format!(
                    "Log-sampled parameter '{}' requires lo > 0 (got {}).",
                    s.name, s.lo
                )));
            }
            let sigma = match s.noise {
                NoiseScale::Absolute(v) | NoiseScale::Relative(v) => v,
            };
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(CalError::config(format!(
                    "Invalid noise sigma for '{}': {sigma}.",
                    s.name
                )));
            }
            if specs[..i].iter().any(|other| other.name == s.name) {
                return Err(CalError::config(format!("Duplicate parameter name '{}'.", s.name)));
            }
        }
        Ok(Arc::new(Self { specs }))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    /// Clamp a raw value back into the declared bound of parameter `idx`.
    pub fn clamp(&self, idx: usize, value: f64) -> f64 {
        let s = &self.specs[idx];
        value.clamp(s.lo, s.hi)
    }
}

/// Build a `ParameterVector` from explicit values, checking every bound.
///
/// This is the only way vectors enter the system from outside the sampler
/// (warm starts, reference configurations).
pub fn vector_in(space: &Arc<ParamSpace>, values: Vec<f64>) -> Result<ParameterVector, CalError> {
    if values.len() != space.len() {
        return Err(CalError::config(format!(
            "Parameter vector has {} values but the space declares {}.",
            values.len(),
            space.len()
        )));
    }
    for (v, s) in values.iter().zip(space.specs()) {
        if !v.is_finite() || *v < s.lo || *v > s.hi {
            return Err(CalError::config(format!(
                "Value {v} for '{}' is outside [{}, {}].",
                s.name, s.lo, s.hi
            )));
        }
    }
    Ok(ParameterVector {
        space: Arc::clone(space),
        values,
    })
}

/// One point in the calibration space.
///
/// Immutable after creation. The sampler produces fresh vectors for every
/// trial (copy-on-perturb) so trials never alias each other's parameters.
#[derive(Debug, Clone)]
pub struct ParameterVector {
    space: Arc<ParamSpace>,
    values: Vec<f64>,
}

impl ParameterVector {
    /// Internal constructor for the sampler: values are already clamped.
    pub(crate) fn from_clamped(space: Arc<ParamSpace>, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), space.len());
        Self { space, values }
    }

    pub fn space(&self) -> &Arc<ParamSpace> {
        &self.space
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Look up a value by parameter name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.space.index_of(name).map(|i| self.values[i])
    }
}

/// One observation record: `(x, target, sigma)` with `sigma > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Independent variable (e.g., redshift).
    pub x: f64,
    pub target: f64,
    pub sigma: f64,
}

/// Validate a shared observation set once, at channel construction.
pub fn check_observations(id: &str, obs: &[Observation]) -> Result<(), CalError> {
    if obs.is_empty() {
        return Err(CalError::data(format!("Channel '{id}' has no observations.")));
    }
    for (i, o) in obs.iter().enumerate() {
        if !(o.x.is_finite() && o.target.is_finite()) {
            return Err(CalError::data(format!("Channel '{id}' observation {i} is non-finite.")));
        }
        if !(o.sigma.is_finite() && o.sigma > 0.0) {
            return Err(CalError::data(format!(
                "Channel '{id}' observation {i} has sigma {} (must be > 0).",
                o.sigma
            )));
        }
    }
    Ok(())
}

/// One evaluated candidate: the parameters and the total objective score.
#[derive(Debug, Clone)]
pub struct Trial {
    pub params: ParameterVector,
    pub score: f64,
}

/// Append-only record of every evaluated trial, in evaluation order.
///
/// Ranking for elite selection happens on a snapshot copy, never in place,
/// so the insertion order is preserved for the lifetime of a run.
#[derive(Debug, Default)]
pub struct TrialHistory {
    trials: Vec<Trial>,
}

impl TrialHistory {
    pub fn new() -> Self {
        Self { trials: Vec::new() }
    }

    pub fn push(&mut self, trial: Trial) {
        self.trials.push(trial);
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn as_slice(&self) -> &[Trial] {
        &self.trials
    }
}

/// Minimal-score trial observed so far in one run.
///
/// Owned by the driver; updated monotonically (the score only decreases).
#[derive(Debug, Default)]
pub struct BestSoFar {
    best: Option<Trial>,
}

impl BestSoFar {
    pub fn new() -> Self {
        Self { best: None }
    }

    /// Accept `trial` if it improves on the current best. Returns whether it did.
    pub fn offer(&mut self, trial: &Trial) -> bool {
        let improved = match &self.best {
            None => true,
            Some(b) => trial.score < b.score,
        };
        if improved {
            self.best = Some(trial.clone());
        }
        improved
    }

    pub fn get(&self) -> Option<&Trial> {
        self.best.as_ref()
    }

    pub fn score(&self) -> f64 {
        self.best.as_ref().map_or(f64::INFINITY, |t| t.score)
    }
}

/// Why a calibration run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Best score reached the target threshold.
    Converged,
    /// Trial budget spent without reaching the target.
    BudgetExhausted,
    /// Optional wall-clock cap expired.
    TimedOut,
}
