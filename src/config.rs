//! Hyperparameters for the A2C update and training loop.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Regression loss between returns and critic values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CriticLoss {
    /// Mean squared error.
    #[default]
    Mse,
    /// Huber loss with unit threshold.
    SmoothL1,
}

impl CriticLoss {
    /// Evaluates the loss over paired returns and values.
    ///
    /// Returns 0.0 on empty input.
    pub fn evaluate(&self, returns: &[f64], values: &[f64]) -> f64 {
        assert_eq!(returns.len(), values.len());
        if returns.is_empty() {
            return 0.0;
        }
        let total: f64 = returns
            .iter()
            .zip(values)
            .map(|(r, v)| {
                let diff = r - v;
                match self {
                    CriticLoss::Mse => diff * diff,
                    CriticLoss::SmoothL1 => {
                        if diff.abs() < 1.0 {
                            0.5 * diff * diff
                        } else {
                            diff.abs() - 0.5
                        }
                    }
                }
            })
            .sum();
        total / returns.len() as f64
    }
}

/// Learning-rate schedule driven by the fraction of training remaining.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LrSchedule {
    /// The optimizer keeps its initial learning rate.
    #[default]
    Constant,
    /// `lr = initial * progress_remaining`, annealing to zero at the end.
    Linear,
    /// `lr = final + (initial - final) * progress_remaining`.
    LinearTo { final_lr: f64 },
}

impl LrSchedule {
    /// Whether the schedule changes the learning rate at all.
    pub fn is_active(&self) -> bool {
        !matches!(self, LrSchedule::Constant)
    }

    /// Learning rate for the given progress fraction (clamped to [0, 1]).
    pub fn learning_rate(&self, initial: f64, progress_remaining: f64) -> f64 {
        let p = progress_remaining.clamp(0.0, 1.0);
        match *self {
            LrSchedule::Constant => initial,
            LrSchedule::Linear => initial * p,
            LrSchedule::LinearTo { final_lr } => final_lr + (initial - final_lr) * p,
        }
    }
}

/// A2C hyperparameters.
///
/// Optimizer settings (learning rate, RMSprop constants) belong to the
/// policy, which owns its parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct A2cConfig {
    /// Rollout horizon per update.
    pub n_steps: usize,
    /// Discount factor γ.
    pub gamma: f64,
    /// Global gradient-norm clip.
    pub max_grad_norm: f64,
    /// Weight of the critic loss.
    pub value_loss_coef: f64,
    /// Weight of the entropy bonus.
    pub entropy_coef: f64,
    /// Progress summary period, in updates.
    pub log_interval: u64,
    /// Rescale advantages to zero mean, unit std before the actor loss.
    pub normalize_advantage: bool,
    /// Added to the advantage std when normalizing.
    pub advantage_eps: f64,
    /// Critic regression loss.
    pub critic_loss: CriticLoss,
    /// Learning-rate schedule.
    pub lr_schedule: LrSchedule,
}

impl Default for A2cConfig {
    fn default() -> Self {
        Self {
            n_steps: 5,
            gamma: 0.99,
            max_grad_norm: 0.5,
            value_loss_coef: 0.5,
            entropy_coef: 0.01,
            log_interval: 10,
            normalize_advantage: false,
            advantage_eps: 1e-8,
            critic_loss: CriticLoss::Mse,
            lr_schedule: LrSchedule::Constant,
        }
    }
}

impl A2cConfig {
    /// Checks every hyperparameter, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        if self.log_interval == 0 {
            return Err(ConfigError::ZeroLogInterval);
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::InvalidGamma(self.gamma));
        }
        for (name, value) in [
            ("value_loss_coef", self.value_loss_coef),
            ("entropy_coef", self.entropy_coef),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeCoefficient { name, value });
            }
        }
        if !(self.max_grad_norm > 0.0) {
            return Err(ConfigError::InvalidGradNorm(self.max_grad_norm));
        }
        if !(self.advantage_eps > 0.0) {
            return Err(ConfigError::InvalidEpsilon(self.advantage_eps));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = A2cConfig::default();
        assert_eq!(config.n_steps, 5);
        assert_eq!(config.gamma, 0.99);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_steps() {
        let config = A2cConfig {
            n_steps: 0,
            ..A2cConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSteps));
    }

    #[test]
    fn rejects_gamma_out_of_range() {
        let config = A2cConfig {
            gamma: 1.5,
            ..A2cConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidGamma(1.5)));
    }

    #[test]
    fn rejects_negative_entropy_coef() {
        let config = A2cConfig {
            entropy_coef: -0.1,
            ..A2cConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeCoefficient {
                name: "entropy_coef",
                ..
            })
        ));
    }

    #[test]
    fn rejects_nan_grad_norm() {
        let config = A2cConfig {
            max_grad_norm: f64::NAN,
            ..A2cConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidGradNorm(_))
        ));
    }

    #[test]
    fn mse_matches_hand_computation() {
        let loss = CriticLoss::Mse.evaluate(&[1.0, 3.0], &[0.0, 1.0]);
        // (1 + 4) / 2
        assert!((loss - 2.5).abs() < 1e-12);
    }

    #[test]
    fn smooth_l1_is_quadratic_then_linear() {
        let small = CriticLoss::SmoothL1.evaluate(&[0.5], &[0.0]);
        let large = CriticLoss::SmoothL1.evaluate(&[3.0], &[0.0]);
        assert!((small - 0.125).abs() < 1e-12);
        assert!((large - 2.5).abs() < 1e-12);
    }

    #[test]
    fn linear_schedule_anneals() {
        let s = LrSchedule::Linear;
        assert!(s.is_active());
        assert!((s.learning_rate(1e-3, 1.0) - 1e-3).abs() < 1e-15);
        assert!((s.learning_rate(1e-3, 0.25) - 2.5e-4).abs() < 1e-15);
        assert_eq!(s.learning_rate(1e-3, -1.0), 0.0);
    }

    #[test]
    fn linear_to_schedule_floors_at_final() {
        let s = LrSchedule::LinearTo { final_lr: 1e-4 };
        assert!((s.learning_rate(1e-3, 0.0) - 1e-4).abs() < 1e-15);
        assert!((s.learning_rate(1e-3, 0.5) - 5.5e-4).abs() < 1e-15);
    }

    #[test]
    fn constant_schedule_is_inactive() {
        let s = LrSchedule::Constant;
        assert!(!s.is_active());
        assert_eq!(s.learning_rate(7e-4, 0.1), 7e-4);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_json_round_trip() {
        let config = A2cConfig {
            normalize_advantage: true,
            lr_schedule: LrSchedule::LinearTo { final_lr: 1e-5 },
            ..A2cConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let restored: A2cConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_partial_json_uses_defaults() {
        let restored: A2cConfig =
            serde_json::from_str(r#"{ "n_steps": 16, "critic_loss": "smooth_l1" }"#).unwrap();
        assert_eq!(restored.n_steps, 16);
        assert_eq!(restored.critic_loss, CriticLoss::SmoothL1);
        assert_eq!(restored.gamma, 0.99);
    }
}
