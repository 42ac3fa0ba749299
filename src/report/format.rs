//! Terminal formatting for calibration runs.

use crate::domain::{TerminationReason, Trial};
use crate::opt::{ProgressReport, ProgressSink, RunResult};

/// One progress line: iteration, current score, best score, and the trial's
/// parameter values.
pub fn format_progress(report: &ProgressReport<'_>) -> String {
    let marker = if report.improved { "  <- improved" } else { "" };
    let params = report
        .trial
        .params
        .space()
        .specs()
        .iter()
        .zip(report.trial.params.values())
        .map(|(spec, value)| format!("{}={value:.3e}", spec.name))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "iter {:>6}  E = {:>12.4e}  best = {:>12.4e}  [{params}]{marker}",
        report.iteration, report.trial.score, report.best_score
    )
}

/// Parameter values of a trial, one line each.
pub fn format_params(trial: &Trial) -> String {
    let mut out = String::new();
    for (spec, value) in trial.params.space().specs().iter().zip(trial.params.values()) {
        out.push_str(&format!("  {:<14} = {:.6e}\n", spec.name, value));
    }
    out
}

/// Final run summary: termination reason, trial count, best parameters.
pub fn format_run_summary(result: &RunResult) -> String {
    let reason = match result.reason {
        TerminationReason::Converged => "converged (target reached)",
        TerminationReason::BudgetExhausted => "budget exhausted",
        TerminationReason::TimedOut => "wall-clock cap expired",
    };

    let mut out = String::new();
    out.push_str("=== gcal - growth calibration ===\n");
    out.push_str(&format!("Termination: {reason}\n"));
    out.push_str(&format!("Trials run:  {}\n", result.trials_run));
    out.push_str(&format!("Best score:  {:.4}\n", result.best.score));
    out.push_str("Best parameters:\n");
    out.push_str(&format_params(&result.best));
    out
}

/// Progress sink that prints improvements (and every `every`-th iteration).
///
/// `every = 0` prints improvements only.
pub struct PrintSink {
    pub every: usize,
}

impl ProgressSink for PrintSink {
    fn on_trial(&mut self, report: &ProgressReport<'_>) {
        let periodic = self.every > 0 && report.iteration % self.every == 0;
        if report.improved || periodic {
            println!("{}", format_progress(report));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{vector_in, ParamSpace, ParamSpec, TerminationReason};

    fn trial() -> Trial {
        let space = ParamSpace::new(vec![
            ParamSpec::linear("eps_mass", 0.1, 1.0, 0.05),
            ParamSpec::log("rho_screen", 1e2, 1e4, 0.2),
        ])
        .unwrap();
        Trial {
            params: vector_in(&space, vec![0.355, 130.2]).unwrap(),
            score: 9.93,
        }
    }

    #[test]
    fn progress_line_contains_scores_and_marker() {
        let t = trial();
        let line = format_progress(&ProgressReport {
            iteration: 12,
            trial: &t,
            best_score: 9.93,
            improved: true,
        });
        assert!(line.contains("iter"));
        assert!(line.contains("12"));
        assert!(line.contains("improved"));
    }

    #[test]
    fn progress_line_carries_parameter_values() {
        let t = trial();
        let line = format_progress(&ProgressReport {
            iteration: 3,
            trial: &t,
            best_score: 9.93,
            improved: false,
        });
        assert!(line.contains("eps_mass=3.550e-1"), "{line}");
        assert!(line.contains("rho_screen=1.302e2"), "{line}");
    }

    #[test]
    fn summary_names_every_parameter() {
        let summary = format_run_summary(&RunResult {
            best: trial(),
            trials_run: 200,
            reason: TerminationReason::Converged,
        });
        assert!(summary.contains("converged"));
        assert!(summary.contains("eps_mass"));
        assert!(summary.contains("rho_screen"));
        assert!(summary.contains("200"));
    }
}
