//! A2C training: rollout collection, returns, the update step and the loop.

pub mod buffer;
pub mod fitness;
pub mod progress;
pub mod returns;
pub mod rollout;
pub mod stats;
pub mod trainer;
pub mod update;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::RolloutBuffer;
pub use fitness::{mean_fitness, FitnessTracker};
pub use progress::{TrainingBudget, TrainingProgress};
pub use returns::compute_returns;
pub use rollout::{collect_rollout, Rollout};
pub use stats::{explained_variance, normalize_advantages};
pub use trainer::{A2CTrainer, StopReason, TrainingSummary};
pub use update::{Losses, UpdateOutcome, UpdateStep};
