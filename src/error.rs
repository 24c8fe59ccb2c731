use thiserror::Error;

/// Invalid hyperparameters or training setup, detected before any rollout.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("n_steps must be at least 1")]
    ZeroSteps,

    #[error("log_interval must be at least 1")]
    ZeroLogInterval,

    #[error("gamma must lie in [0, 1], got {0}")]
    InvalidGamma(f64),

    #[error("{name} must be finite and non-negative, got {value}")]
    NegativeCoefficient { name: &'static str, value: f64 },

    #[error("max_grad_norm must be positive, got {0}")]
    InvalidGradNorm(f64),

    #[error("advantage_eps must be positive, got {0}")]
    InvalidEpsilon(f64),

    #[error("Environment batch is empty")]
    NoEnvironments,

    #[error("Action space bounds have mismatched lengths: low={low}, high={high}")]
    BoundsLength { low: usize, high: usize },

    #[error("Action space bound {index} is inverted: low={low} > high={high}")]
    InvertedBounds { index: usize, low: f64, high: f64 },

    #[error("Action space bound {index} has zero width: low = high = {value}")]
    ZeroWidthBounds { index: usize, value: f64 },

    #[error("Action space bound {index} is not finite: low={low}, high={high}")]
    NonFiniteBounds { index: usize, low: f64, high: f64 },

    #[error("Discrete action space needs at least one action")]
    EmptyActionSpace,

    #[error("Training budget needs a frame target, a stop time, or both")]
    UnboundedBudget,
}

/// Errors raised while collecting rollouts or applying updates.
///
/// Shape and action errors are contract violations between the policy and the
/// environment; they abort the run. Nothing here is retried.
#[derive(Debug, Error)]
pub enum A2cError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid action for environment {env}: {reason}")]
    InvalidAction { env: usize, reason: String },

    #[error("Environment failed: {0}")]
    Environment(String),

    #[error("Reporter '{name}' failed: {message}")]
    Reporter { name: String, message: String },

    #[error("Operation not supported by this policy: {0}")]
    Unsupported(&'static str),

    #[cfg(feature = "nn")]
    #[error(transparent)]
    Torch(#[from] tch::TchError),
}

impl A2cError {
    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        A2cError::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }
}
