//! Objective aggregation with failure containment.
//!
//! The aggregator evaluates every registered channel against the same trial
//! vector, in registration order, and sums the chi-squared scores. If any
//! channel fails — a non-finite solve, an unusable amplitude grid, a missing
//! parameter — the *entire trial* scores the fixed penalty and evaluation
//! stops there. The optimizer always receives a finite, comparably ordered
//! number; a multi-thousand-trial run must never die to one inadmissible
//! parameter region.

use crate::domain::ParameterVector;
use crate::error::CalError;
use crate::fit::channel::{Channel, ChannelFailure, ChannelScore};

/// Score substituted for the whole trial when any channel fails.
pub const TRIAL_PENALTY: f64 = 1e10;

/// How a trial's total score came to be.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    /// Every channel scored; total is the exact sum of these.
    Scored(Vec<ChannelScore>),
    /// A channel failed; total is `TRIAL_PENALTY` and no partial sum leaks.
    Failed(ChannelFailure),
}

/// One trial's evaluation: the scalar the optimizer sees plus the breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub total: f64,
    pub outcome: EvalOutcome,
}

impl Evaluation {
    pub fn is_penalty(&self) -> bool {
        matches!(self.outcome, EvalOutcome::Failed(_))
    }
}

/// Registered channel set forming one scalar objective.
pub struct Objective {
    channels: Vec<Box<dyn Channel>>,
}

impl Objective {
    pub fn new(channels: Vec<Box<dyn Channel>>) -> Result<Self, CalError> {
        if channels.is_empty() {
            return Err(CalError::config("Objective requires at least one channel."));
        }
        Ok(Self { channels })
    }

    pub fn channel_ids(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.id()).collect()
    }

    /// Evaluate one trial. Total is finite for every in-bounds vector.
    pub fn evaluate(&self, params: &ParameterVector) -> Evaluation {
        let mut scores = Vec::with_capacity(self.channels.len());
        let mut total = 0.0;

        for channel in &self.channels {
            match channel.evaluate(params) {
                Ok(score) if score.chi_squared.is_finite() => {
                    total += score.chi_squared;
                    scores.push(score);
                }
                Ok(score) => {
                    return Evaluation {
                        total: TRIAL_PENALTY,
                        outcome: EvalOutcome::Failed(ChannelFailure::NonFinite {
                            channel: score.channel,
                        }),
                    };
                }
                Err(failure) => {
                    return Evaluation {
                        total: TRIAL_PENALTY,
                        outcome: EvalOutcome::Failed(failure),
                    };
                }
            }
        }

        Evaluation {
            total,
            outcome: EvalOutcome::Scored(scores),
        }
    }
}
