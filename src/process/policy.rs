// src/process/policy.rs

//! Exit classification and the restart decision.

use std::process::ExitStatus;
use std::time::Duration;

use crate::config::ProgramSpec;
use crate::types::{RestartMode, RetryBudget};

/// Result of one spawn attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exited with one of the expected exit codes.
    Ok,
    /// Exited any other way on its own.
    Crash,
    /// The binary could not be executed, or exited before `starttime`.
    UnableToStart,
    /// Terminated because the supervisor asked it to stop.
    Killed,
    /// The spawn could not be prepared (redirects, working directory).
    ConfigError,
}

impl ExitOutcome {
    pub fn counts_as_crash(&self) -> bool {
        matches!(self, ExitOutcome::Crash | ExitOutcome::UnableToStart)
    }
}

/// What the run loop should do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    Retry,
    Stop,
}

/// Per-record restart state: the program's mode plus what is left of its
/// retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    mode: RestartMode,
    budget: RetryBudget,
}

impl RestartPolicy {
    pub fn new(mode: RestartMode, budget: RetryBudget) -> Self {
        Self { mode, budget }
    }

    pub fn for_spec(spec: &ProgramSpec) -> Self {
        Self::new(spec.autorestart, spec.startretries)
    }

    pub fn remaining(&self) -> RetryBudget {
        self.budget
    }

    /// Decide whether to relaunch after `outcome`, consuming one retry from
    /// the budget when the answer is `Retry`.
    pub fn decide(&mut self, outcome: ExitOutcome) -> RestartDecision {
        if matches!(outcome, ExitOutcome::Killed | ExitOutcome::ConfigError) {
            return RestartDecision::Stop;
        }
        if self.budget.is_exhausted() {
            return RestartDecision::Stop;
        }

        let wants_restart = match self.mode {
            RestartMode::Always => true,
            RestartMode::Sometimes => outcome == ExitOutcome::UnableToStart,
            RestartMode::Never => false,
        };

        if wants_restart {
            self.budget.consume();
            RestartDecision::Retry
        } else {
            RestartDecision::Stop
        }
    }
}

/// Classify a child that exited on its own after running for `uptime`.
pub fn classify_exit(status: ExitStatus, spec: &ProgramSpec, uptime: Duration) -> ExitOutcome {
    if uptime < spec.starttime {
        return ExitOutcome::UnableToStart;
    }
    match status.code() {
        Some(code) if spec.is_expected_exit(code) => ExitOutcome::Ok,
        // Non-expected codes and signals we did not send.
        _ => ExitOutcome::Crash,
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use super::*;
    use crate::config::RawProgramConfig;

    fn spec_with(exitcodes: Vec<i32>, starttime: u64) -> ProgramSpec {
        let raw = RawProgramConfig {
            cmd: Some("/bin/true".to_string()),
            exitcodes: Some(exitcodes),
            starttime: Some(starttime),
            ..Default::default()
        };
        ProgramSpec::from_raw("p", raw).unwrap()
    }

    fn exited(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    #[test]
    fn killed_and_config_errors_never_retry() {
        let mut policy = RestartPolicy::new(RestartMode::Always, RetryBudget::Unlimited);
        assert_eq!(policy.decide(ExitOutcome::Killed), RestartDecision::Stop);
        assert_eq!(policy.decide(ExitOutcome::ConfigError), RestartDecision::Stop);
    }

    #[test]
    fn never_mode_never_retries() {
        let mut policy = RestartPolicy::new(RestartMode::Never, RetryBudget::Unlimited);
        for outcome in [ExitOutcome::Ok, ExitOutcome::Crash, ExitOutcome::UnableToStart] {
            assert_eq!(policy.decide(outcome), RestartDecision::Stop);
        }
    }

    #[test]
    fn sometimes_only_retries_failed_starts() {
        let mut policy = RestartPolicy::new(RestartMode::Sometimes, RetryBudget::Limited(5));
        assert_eq!(policy.decide(ExitOutcome::Crash), RestartDecision::Stop);
        assert_eq!(policy.decide(ExitOutcome::Ok), RestartDecision::Stop);
        assert_eq!(policy.decide(ExitOutcome::UnableToStart), RestartDecision::Retry);
        assert_eq!(policy.remaining(), RetryBudget::Limited(4));
    }

    #[test]
    fn always_is_bounded_by_budget() {
        let mut policy = RestartPolicy::new(RestartMode::Always, RetryBudget::Limited(2));
        assert_eq!(policy.decide(ExitOutcome::Ok), RestartDecision::Retry);
        assert_eq!(policy.decide(ExitOutcome::Crash), RestartDecision::Retry);
        assert_eq!(policy.decide(ExitOutcome::Crash), RestartDecision::Stop);
    }

    #[test]
    fn zero_budget_never_retries() {
        let mut policy = RestartPolicy::new(RestartMode::Always, RetryBudget::Limited(0));
        assert_eq!(policy.decide(ExitOutcome::Crash), RestartDecision::Stop);
    }

    #[test]
    fn unlimited_budget_keeps_retrying() {
        let mut policy = RestartPolicy::new(RestartMode::Always, RetryBudget::Unlimited);
        for _ in 0..1000 {
            assert_eq!(policy.decide(ExitOutcome::Crash), RestartDecision::Retry);
        }
    }

    #[test]
    fn expected_codes_are_ok_others_crash() {
        let spec = spec_with(vec![0, 2], 0);
        assert_eq!(classify_exit(exited(0), &spec, Duration::ZERO), ExitOutcome::Ok);
        assert_eq!(classify_exit(exited(2), &spec, Duration::ZERO), ExitOutcome::Ok);
        assert_eq!(classify_exit(exited(1), &spec, Duration::ZERO), ExitOutcome::Crash);
    }

    #[test]
    fn foreign_signal_is_a_crash() {
        let spec = spec_with(vec![0], 0);
        // Raw wait status for "terminated by SIGSEGV".
        let status = ExitStatus::from_raw(11);
        assert_eq!(classify_exit(status, &spec, Duration::ZERO), ExitOutcome::Crash);
    }

    #[test]
    fn early_exit_is_unable_to_start() {
        let spec = spec_with(vec![0], 2);
        assert_eq!(
            classify_exit(exited(0), &spec, Duration::from_millis(500)),
            ExitOutcome::UnableToStart
        );
        assert_eq!(
            classify_exit(exited(0), &spec, Duration::from_secs(3)),
            ExitOutcome::Ok
        );
    }
}
