//! a2c-core - synchronous advantage actor-critic.
//!
//! Drives a policy against a batch of vectorized environments for a fixed
//! horizon, turns the rollout into bootstrapped n-step returns, and applies
//! the entropy-regularized actor/critic update. The training loop stops on a
//! wall-clock or frame budget and reports episodic fitness to observers.
//!
//! The policy, the vectorized environment and the observers are traits. A
//! concrete MLP policy backed by libtorch is available with the `nn` feature.

pub mod config;
pub mod env;
pub mod error;
pub mod policy;
pub mod reporter;
pub mod space;
pub mod training;

#[cfg(feature = "nn")]
pub mod network;

pub use config::{A2cConfig, CriticLoss, LrSchedule};
pub use env::{ObservationBatch, VecEnv, VecStep};
pub use error::{A2cError, ConfigError};
pub use policy::{Objective, Policy, PolicyOutput};
pub use reporter::{HistoryReporter, Reporter, UpdateEvent};
pub use space::{ActionBatch, ActionSpace, EnvActions};
pub use training::{A2CTrainer, StopReason, TrainingBudget, TrainingSummary, UpdateOutcome};

#[cfg(feature = "nn")]
pub use network::{MlpPolicy, MlpPolicyConfig};

/// Identifier type used for training runs.
pub type Id = String;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
