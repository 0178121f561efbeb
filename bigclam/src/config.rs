//! Tuning parameters for the ascent loop and the membership threshold.

use crate::error::{ClamError, Result};
use std::time::Duration;

/// Convergence tolerance ε. Default: 1e-8
pub const DEFAULT_EPSILON: f64 = 1e-8;
/// Learning rate η. Default: 0.01
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
/// L2 regularization coefficient λ. Default: 0.1
pub const DEFAULT_LAMBDA: f64 = 0.1;
/// Probability floor δ. Default: 1e-8
pub const DEFAULT_PROB_FLOOR: f64 = 1e-8;
/// Info-level progress line every this many sweeps. Default: 100
pub const DEFAULT_LOG_EVERY: usize = 100;

/// How a sweep applies its updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateSchedule {
    /// Sequential, in place: later (node, community) pairs observe the
    /// updates made earlier in the same sweep.
    #[default]
    GaussSeidel,
    /// Every gradient of a sweep reads the matrix as it was at the start
    /// of the sweep; rows are computed in parallel and swapped in at the
    /// end. Gives different trajectories than `GaussSeidel`.
    Jacobi,
}

/// Options for BigClam fitting.
#[derive(Debug, Clone)]
pub struct ClamConfig {
    /// Convergence tolerance ε on |gradient|. Must lie in (0, 1).
    pub epsilon: f64,
    /// Learning rate η (> 0)
    pub learning_rate: f64,
    /// Regularization coefficient λ (>= 0)
    pub lambda: f64,
    /// Membership threshold τ. `None` derives √(1 − ln(1 − ε)).
    pub threshold: Option<f64>,
    /// Floor δ applied to edge / non-edge probabilities, in (0, 0.5)
    pub prob_floor: f64,
    /// Stop with `NonConvergence` after this many sweeps
    pub max_sweeps: Option<usize>,
    /// Stop with `NonConvergence` once this much wall-clock time elapsed
    pub max_duration: Option<Duration>,
    pub schedule: UpdateSchedule,
    /// Seed for the factor initialization; `None` uses the thread-local
    /// generator
    pub seed: Option<u64>,
    pub log_every: usize,
    pub show_progress: bool,
}

impl Default for ClamConfig {
    fn default() -> Self {
        ClamConfig {
            epsilon: DEFAULT_EPSILON,
            learning_rate: DEFAULT_LEARNING_RATE,
            lambda: DEFAULT_LAMBDA,
            threshold: None,
            prob_floor: DEFAULT_PROB_FLOOR,
            max_sweeps: None,
            max_duration: None,
            schedule: UpdateSchedule::GaussSeidel,
            seed: None,
            log_every: DEFAULT_LOG_EVERY,
            show_progress: false,
        }
    }
}

impl ClamConfig {
    /// τ = √(1 − ln(1 − ε)) unless overridden
    pub fn membership_threshold(&self) -> f64 {
        self.threshold
            .unwrap_or_else(|| (1.0 - (1.0 - self.epsilon).ln()).sqrt())
    }

    /// Reject parameter combinations that make the model degenerate.
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(ClamError::InvalidConfiguration(msg));

        if !(self.epsilon > 0.0 && self.epsilon < 1.0) {
            return bad(format!("epsilon must lie in (0, 1), got {}", self.epsilon));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return bad(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            ));
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return bad(format!("lambda must be nonnegative, got {}", self.lambda));
        }
        if !(self.prob_floor > 0.0 && self.prob_floor < 0.5) {
            return bad(format!(
                "probability floor must lie in (0, 0.5), got {}",
                self.prob_floor
            ));
        }
        if let Some(tau) = self.threshold {
            if !(tau.is_finite() && tau >= 0.0) {
                return bad(format!("threshold must be finite and >= 0, got {}", tau));
            }
        }
        if self.max_sweeps == Some(0) {
            return bad("max sweeps must be at least 1".into());
        }
        if self.max_duration == Some(Duration::ZERO) {
            return bad("max duration must be positive".into());
        }
        if self.log_every == 0 {
            return bad("log_every must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_is_valid() {
        assert!(ClamConfig::default().validate().is_ok());
    }

    #[test]
    fn derived_threshold_matches_formula() {
        let config = ClamConfig {
            epsilon: 0.5,
            ..Default::default()
        };
        let expected = (1.0 - 0.5_f64.ln()).sqrt();
        assert_abs_diff_eq!(config.membership_threshold(), expected, epsilon = 1e-12);

        // tiny ε puts τ just above 1
        let tau = ClamConfig::default().membership_threshold();
        assert!(tau > 1.0 && tau < 1.0 + 1e-7);
    }

    #[test]
    fn explicit_threshold_wins() {
        let config = ClamConfig {
            threshold: Some(0.25),
            ..Default::default()
        };
        assert_eq!(config.membership_threshold(), 0.25);
    }

    #[test]
    fn degenerate_settings_rejected() {
        let cases = vec![
            ClamConfig {
                epsilon: 1.0,
                ..Default::default()
            },
            ClamConfig {
                epsilon: 0.0,
                ..Default::default()
            },
            ClamConfig {
                learning_rate: 0.0,
                ..Default::default()
            },
            ClamConfig {
                learning_rate: -0.1,
                ..Default::default()
            },
            ClamConfig {
                lambda: f64::NAN,
                ..Default::default()
            },
            ClamConfig {
                prob_floor: 0.0,
                ..Default::default()
            },
            ClamConfig {
                threshold: Some(f64::INFINITY),
                ..Default::default()
            },
            ClamConfig {
                max_sweeps: Some(0),
                ..Default::default()
            },
            ClamConfig {
                log_every: 0,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ClamError::InvalidConfiguration(_))),
                "{:?} should be rejected",
                config
            );
        }
    }
}
