//! The calibration loop.
//!
//! One run is a simple state machine: `RUNNING` until either the best score
//! reaches the target (`Converged`), the trial budget is spent
//! (`BudgetExhausted`), or the optional wall-clock cap expires (`TimedOut`).
//!
//! Warm starts are evaluated before any proposal, so a run seeded with a
//! previously found configuration can never end worse than that baseline.
//!
//! Per-trial failures are already contained by the objective (they score the
//! fixed penalty); the only errors this module returns are configuration
//! problems caught before the loop starts.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::domain::{BestSoFar, ParameterVector, TerminationReason, Trial, TrialHistory};
use crate::error::CalError;
use crate::fit::Objective;
use crate::opt::sampler::Proposer;

/// Run-level settings.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Number of proposed trials (warm starts are extra).
    pub budget: usize,
    /// Stop early once the best score is at or below this.
    pub target_score: f64,
    /// RNG seed; same seed + same budget reproduces the run exactly.
    pub seed: u64,
    /// Proposals drawn per generation and evaluated in parallel.
    ///
    /// 1 reproduces the strictly sequential propose → evaluate → record
    /// semantics. Larger batches draw all proposals from the same history
    /// snapshot before evaluating, and fold results back in draw order, so
    /// determinism and best-score monotonicity hold for any value.
    pub batch_size: usize,
    /// Optional wall-clock cap, checked between generations only.
    pub max_wall_time: Option<Duration>,
}

impl DriverConfig {
    fn validate(&self) -> Result<(), CalError> {
        if self.budget == 0 {
            return Err(CalError::config("Trial budget must be >= 1."));
        }
        if self.batch_size == 0 {
            return Err(CalError::config("Batch size must be >= 1."));
        }
        if !self.target_score.is_finite() {
            return Err(CalError::config("Target score must be finite."));
        }
        Ok(())
    }
}

/// Per-trial progress record handed to the sink.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReport<'a> {
    /// 1-based index over all evaluated trials (warm starts included).
    pub iteration: usize,
    pub trial: &'a Trial,
    pub best_score: f64,
    pub improved: bool,
}

/// Receives progress; formatting lives in `report`.
pub trait ProgressSink {
    fn on_trial(&mut self, report: &ProgressReport<'_>);
}

/// Default sink: no output.
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn on_trial(&mut self, _: &ProgressReport<'_>) {}
}

/// Terminal output of one run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub best: Trial,
    /// Every evaluation counted, warm starts included.
    pub trials_run: usize,
    pub reason: TerminationReason,
}

/// Runs the loop. All per-run state (history, best-so-far, RNG) is local to
/// `run`, so there is no hidden global and two drivers can run side by side.
pub struct CalibrationDriver {
    objective: Objective,
    config: DriverConfig,
}

impl CalibrationDriver {
    pub fn new(objective: Objective, config: DriverConfig) -> Result<Self, CalError> {
        config.validate()?;
        Ok(Self { objective, config })
    }

    /// Execute one calibration run.
    pub fn run<P: Proposer>(
        &self,
        proposer: &mut P,
        warm_starts: &[ParameterVector],
        sink: &mut dyn ProgressSink,
    ) -> Result<RunResult, CalError> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut history = TrialHistory::new();
        let mut best = BestSoFar::new();
        let started = Instant::now();

        // Known-good configurations are scored first so the run never
        // regresses below its baseline.
        for params in warm_starts {
            let eval = self.objective.evaluate(params);
            let trial = Trial {
                params: params.clone(),
                score: eval.total,
            };
            let improved = best.offer(&trial);
            sink.on_trial(&ProgressReport {
                iteration: history.len() + 1,
                trial: &trial,
                best_score: best.score(),
                improved,
            });
            history.push(trial);
            if best.score() <= self.config.target_score {
                return self.finish(history, best, TerminationReason::Converged);
            }
        }

        let mut proposed = 0usize;
        while proposed < self.config.budget {
            if let Some(cap) = self.config.max_wall_time {
                if started.elapsed() >= cap {
                    return self.finish(history, best, TerminationReason::TimedOut);
                }
            }

            // Draw the whole generation from the current snapshot first;
            // evaluation order then cannot influence the proposal stream.
            let want = self.config.batch_size.min(self.config.budget - proposed);
            let proposals: Vec<ParameterVector> =
                (0..want).map(|_| proposer.propose(&history, &mut rng)).collect();

            let evals: Vec<f64> = proposals
                .par_iter()
                .map(|p| self.objective.evaluate(p).total)
                .collect();

            for (params, score) in proposals.into_iter().zip(evals) {
                proposed += 1;
                let trial = Trial { params, score };
                let improved = best.offer(&trial);
                sink.on_trial(&ProgressReport {
                    iteration: history.len() + 1,
                    trial: &trial,
                    best_score: best.score(),
                    improved,
                });
                history.push(trial);
                if best.score() <= self.config.target_score {
                    return self.finish(history, best, TerminationReason::Converged);
                }
            }
        }

        self.finish(history, best, TerminationReason::BudgetExhausted)
    }

    fn finish(
        &self,
        history: TrialHistory,
        best: BestSoFar,
        reason: TerminationReason,
    ) -> Result<RunResult, CalError> {
        let best = best
            .get()
            .cloned()
            .ok_or_else(|| CalError::data("No trials were evaluated."))?;
        Ok(RunResult {
            best,
            trials_run: history.len(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{vector_in, ParamSpace, ParamSpec, ParameterVector};
    use crate::fit::channel::{Channel, ChannelFailure, ChannelScore};
    use crate::opt::sampler::{EliteSampler, EliteSamplerConfig};
    use std::sync::Arc;

    /// Quadratic bowl with minimum at u = 0.25: chi2 = ((u - 0.25) / 0.05)².
    struct BowlChannel;

    impl Channel for BowlChannel {
        fn id(&self) -> &str {
            "bowl"
        }
        fn evaluate(&self, pv: &ParameterVector) -> Result<ChannelScore, ChannelFailure> {
            let u = pv.get("u").ok_or_else(|| ChannelFailure::MissingParameter {
                channel: "bowl".into(),
                name: "u".into(),
            })?;
            let r = (u - 0.25) / 0.05;
            Ok(ChannelScore {
                channel: "bowl".into(),
                chi_squared: r * r,
            })
        }
    }

    fn space() -> Arc<ParamSpace> {
        ParamSpace::new(vec![ParamSpec::linear("u", 0.0, 1.0, 0.05)]).unwrap()
    }

    fn driver(budget: usize, target: f64, seed: u64, batch: usize) -> CalibrationDriver {
        CalibrationDriver::new(
            Objective::new(vec![Box::new(BowlChannel)]).unwrap(),
            DriverConfig {
                budget,
                target_score: target,
                seed,
                batch_size: batch,
                max_wall_time: None,
            },
        )
        .unwrap()
    }

    struct Recorder {
        best_scores: Vec<f64>,
        trial_scores: Vec<f64>,
    }

    impl ProgressSink for Recorder {
        fn on_trial(&mut self, r: &ProgressReport<'_>) {
            self.best_scores.push(r.best_score);
            self.trial_scores.push(r.trial.score);
        }
    }

    fn run_once(seed: u64, budget: usize, target: f64) -> (RunResult, Recorder) {
        let s = space();
        let d = driver(budget, target, seed, 1);
        let mut sampler = EliteSampler::new(Arc::clone(&s), EliteSamplerConfig::default()).unwrap();
        let mut rec = Recorder {
            best_scores: Vec::new(),
            trial_scores: Vec::new(),
        };
        let result = d.run(&mut sampler, &[], &mut rec).unwrap();
        (result, rec)
    }

    #[test]
    fn identical_seeds_give_identical_runs() {
        let (r1, rec1) = run_once(42, 150, -1.0);
        let (r2, rec2) = run_once(42, 150, -1.0);
        assert_eq!(rec1.trial_scores, rec2.trial_scores);
        assert_eq!(r1.best.score, r2.best.score);
        assert_eq!(r1.best.params.values(), r2.best.params.values());
        assert_eq!(r1.trials_run, r2.trials_run);
    }

    #[test]
    fn best_score_is_monotone_nonincreasing() {
        let (_, rec) = run_once(9, 200, -1.0);
        for w in rec.best_scores.windows(2) {
            assert!(w[1] <= w[0]);
        }
    }

    #[test]
    fn budget_exhaustion_reports_every_trial() {
        // Unreachable target: the budget is the only exit.
        let (r, rec) = run_once(5, 64, -1.0);
        assert_eq!(r.reason, TerminationReason::BudgetExhausted);
        assert_eq!(r.trials_run, 64);
        assert_eq!(rec.trial_scores.len(), 64);
    }

    #[test]
    fn loose_target_converges_quickly() {
        let (r, _) = run_once(5, 500, 50.0);
        assert_eq!(r.reason, TerminationReason::Converged);
        assert!(r.best.score <= 50.0);
        assert!(r.trials_run <= 500);
    }

    #[test]
    fn warm_start_is_evaluated_first_and_never_regressed() {
        let s = space();
        let d = driver(50, -1.0, 0, 1);
        let mut sampler = EliteSampler::new(Arc::clone(&s), EliteSamplerConfig::default()).unwrap();
        let warm = vector_in(&s, vec![0.3]).unwrap();
        let warm_score = ((0.3 - 0.25_f64) / 0.05).powi(2);

        let mut rec = Recorder {
            best_scores: Vec::new(),
            trial_scores: Vec::new(),
        };
        let r = d.run(&mut sampler, &[warm], &mut rec).unwrap();
        assert_eq!(r.trials_run, 51);
        assert!((rec.trial_scores[0] - warm_score).abs() < 1e-12);
        assert!(r.best.score <= warm_score);
    }

    #[test]
    fn warm_start_alone_can_converge() {
        let s = space();
        let d = driver(1000, 2.0, 0, 1);
        let mut sampler = EliteSampler::new(Arc::clone(&s), EliteSamplerConfig::default()).unwrap();
        let warm = vector_in(&s, vec![0.25]).unwrap();
        let r = d.run(&mut sampler, &[warm], &mut SilentSink).unwrap();
        assert_eq!(r.reason, TerminationReason::Converged);
        assert_eq!(r.trials_run, 1);
    }

    #[test]
    fn batched_run_matches_monotone_and_budget_contracts() {
        let s = space();
        let d = driver(60, -1.0, 21, 8);
        let mut sampler = EliteSampler::new(Arc::clone(&s), EliteSamplerConfig::default()).unwrap();
        let mut rec = Recorder {
            best_scores: Vec::new(),
            trial_scores: Vec::new(),
        };
        let r = d.run(&mut sampler, &[], &mut rec).unwrap();
        assert_eq!(r.trials_run, 60);
        for w in rec.best_scores.windows(2) {
            assert!(w[1] <= w[0]);
        }
    }

    #[test]
    fn sampler_driven_search_beats_random_baseline() {
        // Exploitation should find the bowl minimum well within the budget.
        let (r, _) = run_once(1, 300, -1.0);
        assert!(
            r.best.score < 1.0,
            "expected near-minimum after 300 trials, best = {}",
            r.best.score
        );
        assert!((r.best.params.get("u").unwrap() - 0.25).abs() < 0.1);
    }

    #[test]
    fn zero_budget_is_a_config_error() {
        let built = CalibrationDriver::new(
            Objective::new(vec![Box::new(BowlChannel)]).unwrap(),
            DriverConfig {
                budget: 0,
                target_score: 1.0,
                seed: 0,
                batch_size: 1,
                max_wall_time: None,
            },
        );
        match built {
            Ok(_) => panic!("a zero trial budget must be rejected"),
            Err(err) => assert_eq!(err.exit_code(), 2),
        }
    }

    #[test]
    fn wall_clock_cap_terminates_with_timed_out() {
        let s = space();
        let d = CalibrationDriver::new(
            Objective::new(vec![Box::new(BowlChannel)]).unwrap(),
            DriverConfig {
                budget: 1_000_000,
                target_score: -1.0,
                seed: 0,
                batch_size: 1,
                max_wall_time: Some(Duration::from_millis(50)),
            },
        )
        .unwrap();
        let mut sampler = EliteSampler::new(Arc::clone(&s), EliteSamplerConfig::default()).unwrap();
        let r = d.run(&mut sampler, &[], &mut SilentSink).unwrap();
        assert_eq!(r.reason, TerminationReason::TimedOut);
        assert!(r.trials_run < 1_000_000);
    }
}
