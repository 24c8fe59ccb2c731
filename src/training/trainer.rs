//! Training loop: repeated updates under wall-clock and frame budgets.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::buffer::RolloutBuffer;
use super::fitness::{mean_fitness, FitnessTracker};
use super::progress::{TrainingBudget, TrainingProgress};
use super::stats::explained_variance;
use super::update::{UpdateOutcome, UpdateStep};
use crate::config::A2cConfig;
use crate::env::{ObservationBatch, VecEnv};
use crate::error::{A2cError, ConfigError};
use crate::policy::Policy;
use crate::reporter::{Reporter, UpdateEvent};
use crate::{generate_id, Id};

/// Why a training run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop time elapsed.
    WallClock,
    /// The frame target was reached.
    FrameBudget,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::WallClock => write!(f, "wall-clock"),
            StopReason::FrameBudget => write!(f, "frame budget"),
        }
    }
}

/// Final state of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Completed updates.
    pub updates: u64,
    /// Environment frames processed.
    pub frames: u64,
    /// Last reported fitness.
    pub fitness: f64,
    pub elapsed: Duration,
    pub stop_reason: StopReason,
}

/// Synchronous A2C trainer over an externally supplied policy and
/// vectorized environment.
///
/// # Lifecycle
///
/// 1. [`A2CTrainer::new`] validates the configuration.
/// 2. Optionally register observers with [`A2CTrainer::add_reporter`].
/// 3. [`A2CTrainer::train`] resets the environment and runs updates until
///    the budget is exhausted.
pub struct A2CTrainer<P, E> {
    policy: P,
    env: E,
    config: A2cConfig,
    reporters: Vec<Box<dyn Reporter>>,
    fitness: FitnessTracker,
    buffer: RolloutBuffer,
    initial_lr: f64,
    run_id: Id,
}

impl<P: Policy, E: VecEnv> A2CTrainer<P, E> {
    /// Creates a trainer. The policy's current learning rate is the one the
    /// schedule anneals from.
    pub fn new(policy: P, env: E, config: A2cConfig) -> Result<Self, A2cError> {
        config.validate()?;
        let n_envs = env.num_envs();
        if n_envs == 0 {
            return Err(ConfigError::NoEnvironments.into());
        }

        Ok(Self {
            initial_lr: policy.learning_rate(),
            fitness: FitnessTracker::new(n_envs),
            buffer: RolloutBuffer::new(config.n_steps, n_envs),
            policy,
            env,
            config,
            reporters: Vec::new(),
            run_id: generate_id(),
        })
    }

    /// Registers an observer. Observers run in registration order.
    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn config(&self) -> &A2cConfig {
        &self.config
    }

    /// Unique identifier of this trainer, attached to its log span.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Environment frames consumed by one update (`n_steps * n_envs`).
    pub fn frames_per_update(&self) -> u64 {
        (self.config.n_steps * self.env.num_envs()) as u64
    }

    /// Consumes the trainer, returning the trained policy.
    pub fn into_policy(self) -> P {
        self.policy
    }

    /// Persists the policy through its own save hook.
    pub fn save_policy(&self, path: &Path) -> Result<(), A2cError> {
        self.policy.save(path)
    }

    /// Resets the environment and the per-slot fitness accumulators.
    pub fn reset(&mut self) -> Result<ObservationBatch, A2cError> {
        self.fitness.reset();
        self.env.reset()
    }

    /// Runs a single update from `observations`.
    ///
    /// `progress_remaining` drives the learning-rate schedule, if any.
    pub fn update(
        &mut self,
        observations: ObservationBatch,
        progress_remaining: f64,
    ) -> Result<UpdateOutcome, A2cError> {
        let step = UpdateStep {
            config: &self.config,
            initial_lr: self.initial_lr,
        };
        step.run(
            &mut self.policy,
            &mut self.env,
            &mut self.fitness,
            &mut self.buffer,
            observations,
            progress_remaining,
        )
    }

    /// Trains until the wall-clock or frame budget runs out.
    ///
    /// Both bounds are checked once per update, before it starts; an update
    /// in progress always runs to completion. Environment, policy and
    /// reporter errors abort the run.
    pub fn train(&mut self, budget: TrainingBudget) -> Result<TrainingSummary, A2cError> {
        budget.validate()?;

        let span = tracing::info_span!("a2c_train", run_id = %self.run_id);
        let _guard = span.enter();

        let start = Instant::now();
        let frames_per_update = self.frames_per_update();
        let mut progress = TrainingProgress::new(budget.total_frames);
        let mut fitness = 0.0;
        let mut update: u64 = 0;

        info!(
            policy = self.policy.name(),
            n_envs = self.env.num_envs(),
            n_steps = self.config.n_steps,
            total_frames = ?budget.total_frames,
            stop_time = ?budget.stop_time,
            "Starting A2C training"
        );

        let mut observations = self.reset()?;

        let stop_reason = loop {
            if budget.stop_time.is_some_and(|stop| start.elapsed() >= stop) {
                break StopReason::WallClock;
            }
            if budget
                .total_frames
                .is_some_and(|total| progress.frames() >= total)
            {
                break StopReason::FrameBudget;
            }

            update += 1;
            let update_start = Instant::now();
            let outcome = self.update(observations, progress.remaining())?;

            progress.add_frames(frames_per_update);
            if let Some(stop) = budget.stop_time {
                progress.estimate_total(frames_per_update, update_start.elapsed(), stop);
            }
            progress.refresh_remaining();

            if let Some(mean) = mean_fitness(&outcome.completed_fitness) {
                fitness = mean;
            }

            let event = UpdateEvent {
                iteration: update,
                fitness,
                entropy: outcome.entropy,
                actor_loss: outcome.actor_loss,
                critic_loss: outcome.critic_loss,
                loss: outcome.loss,
                frames: progress.frames(),
            };
            for reporter in &mut self.reporters {
                reporter
                    .on_update_end(&event)
                    .map_err(|err| match err {
                        A2cError::Reporter { .. } => err,
                        other => A2cError::Reporter {
                            name: reporter.name(),
                            message: other.to_string(),
                        },
                    })?;
            }

            debug!(
                update,
                loss = outcome.loss,
                actor_loss = outcome.actor_loss,
                critic_loss = outcome.critic_loss,
                episodes = outcome.completed_fitness.len(),
                progress_remaining = progress.remaining(),
                "Update complete"
            );

            if update % self.config.log_interval == 0 || update == 1 {
                let ev = explained_variance(&outcome.values, &outcome.returns);
                let seconds = start.elapsed().as_secs_f64();
                let fps = if seconds > 0.0 {
                    (progress.frames() as f64 / seconds) as u64
                } else {
                    0
                };
                info!(
                    "Updates: {}, total env steps: {}, fps: {} | entropy: {:.4}, policy loss: {:.4}, explained variance: {:.4}, fitness: {:.3}, lr: {:.2e}",
                    update,
                    progress.frames(),
                    fps,
                    outcome.entropy,
                    outcome.loss,
                    ev,
                    fitness,
                    self.policy.learning_rate()
                );
            }

            observations = outcome.next_observations;
        };

        let summary = TrainingSummary {
            updates: update,
            frames: progress.frames(),
            fitness,
            elapsed: start.elapsed(),
            stop_reason,
        };
        info!(
            updates = summary.updates,
            frames = summary.frames,
            fitness = summary.fitness,
            "Training stopped ({})",
            summary.stop_reason
        );
        Ok(summary)
    }
}
