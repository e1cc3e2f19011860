use std::fmt;
use std::str::FromStr;

/// When a process should be relaunched after it exits.
///
/// - `Never`: run once; whatever happens, the record stays down (default).
/// - `Always`: relaunch after every exit, bounded by `startretries`.
/// - `Sometimes`: relaunch only when the process could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartMode {
    #[default]
    Never,
    Always,
    Sometimes,
}

impl FromStr for RestartMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" => Ok(RestartMode::Never),
            "always" => Ok(RestartMode::Always),
            "sometimes" => Ok(RestartMode::Sometimes),
            other => Err(format!(
                "invalid autorestart: {other} (expected \"never\", \"always\" or \"sometimes\")"
            )),
        }
    }
}

impl fmt::Display for RestartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RestartMode::Never => "never",
            RestartMode::Always => "always",
            RestartMode::Sometimes => "sometimes",
        };
        f.write_str(s)
    }
}

/// How many times a process may be relaunched.
///
/// Configured as `startretries`: `-1` means unlimited, `0` means no retries,
/// any positive `N` allows `N` relaunches over the life of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBudget {
    Unlimited,
    Limited(u32),
}

impl RetryBudget {
    /// Build a budget from the raw config value. Values below `-1` are rejected.
    pub fn from_raw(raw: i64) -> Result<Self, String> {
        match raw {
            -1 => Ok(RetryBudget::Unlimited),
            n if n >= 0 => u32::try_from(n)
                .map(RetryBudget::Limited)
                .map_err(|_| format!("startretries too large: {n}")),
            n => Err(format!(
                "invalid startretries: {n} (expected -1 for unlimited, or >= 0)"
            )),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryBudget::Limited(0))
    }

    /// Consume one retry. Unlimited budgets never shrink.
    pub fn consume(&mut self) {
        if let RetryBudget::Limited(n) = self {
            *n = n.saturating_sub(1);
        }
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        RetryBudget::Limited(0)
    }
}

impl fmt::Display for RetryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryBudget::Unlimited => f.write_str("-1"),
            RetryBudget::Limited(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_mode_parses_case_insensitively() {
        assert_eq!("Always".parse::<RestartMode>(), Ok(RestartMode::Always));
        assert_eq!(" never ".parse::<RestartMode>(), Ok(RestartMode::Never));
        assert!("maybe".parse::<RestartMode>().is_err());
    }

    #[test]
    fn retry_budget_from_raw() {
        assert_eq!(RetryBudget::from_raw(-1), Ok(RetryBudget::Unlimited));
        assert_eq!(RetryBudget::from_raw(0), Ok(RetryBudget::Limited(0)));
        assert_eq!(RetryBudget::from_raw(3), Ok(RetryBudget::Limited(3)));
        assert!(RetryBudget::from_raw(-2).is_err());
    }

    #[test]
    fn unlimited_budget_never_shrinks() {
        let mut budget = RetryBudget::Unlimited;
        for _ in 0..100 {
            budget.consume();
        }
        assert_eq!(budget, RetryBudget::Unlimited);
        assert!(!budget.is_exhausted());
    }

    #[test]
    fn limited_budget_counts_down_to_exhaustion() {
        let mut budget = RetryBudget::Limited(2);
        budget.consume();
        assert!(!budget.is_exhausted());
        budget.consume();
        assert!(budget.is_exhausted());
        budget.consume();
        assert_eq!(budget, RetryBudget::Limited(0));
    }
}
