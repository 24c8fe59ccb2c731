//! One synchronous A2C update: rollout, returns, losses, optimizer step.

use super::buffer::RolloutBuffer;
use super::fitness::FitnessTracker;
use super::returns::compute_returns;
use super::rollout::collect_rollout;
use super::stats::{mean, normalize_advantages};
use crate::config::A2cConfig;
use crate::env::{ObservationBatch, VecEnv};
use crate::error::A2cError;
use crate::policy::{Objective, Policy};

/// Scalar loss components of one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Losses {
    pub actor: f64,
    pub critic: f64,
    /// Mean policy entropy over the rollout.
    pub entropy: f64,
    /// `actor + value_loss_coef * critic - entropy_coef * entropy`.
    pub total: f64,
}

impl Losses {
    /// Computes every component from flattened rollout data.
    ///
    /// `advantages` are the (possibly normalized) weights of the actor loss;
    /// the critic loss compares `returns` against `values` directly.
    pub fn compute(
        log_probs: &[f64],
        advantages: &[f64],
        returns: &[f64],
        values: &[f64],
        mean_entropy: f64,
        config: &A2cConfig,
    ) -> Self {
        assert_eq!(log_probs.len(), advantages.len());
        let weighted: Vec<f64> = log_probs
            .iter()
            .zip(advantages)
            .map(|(lp, adv)| lp * adv)
            .collect();
        let actor = -mean(&weighted);
        let critic = config.critic_loss.evaluate(returns, values);
        let total =
            actor + config.value_loss_coef * critic - config.entropy_coef * mean_entropy;

        Self {
            actor,
            critic,
            entropy: mean_entropy,
            total,
        }
    }
}

/// Everything an update produces.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub entropy: f64,
    pub actor_loss: f64,
    pub critic_loss: f64,
    /// Combined loss that was minimized.
    pub loss: f64,
    /// Fitness of every episode that ended during the rollout.
    pub completed_fitness: Vec<f64>,
    /// Critic values, flattened row-major (`step * n_envs + env`).
    pub values: Vec<f64>,
    /// Bootstrapped returns, aligned with `values`.
    pub returns: Vec<f64>,
    /// Observations to start the next rollout from.
    pub next_observations: ObservationBatch,
}

/// Update parameters shared by every update of a run.
#[derive(Debug, Clone, Copy)]
pub struct UpdateStep<'a> {
    pub config: &'a A2cConfig,
    /// Learning rate the schedule anneals from.
    pub initial_lr: f64,
}

impl UpdateStep<'_> {
    /// Performs one A2C update.
    ///
    /// 1. Collect `n_steps` of experience.
    /// 2. Bootstrap from the critic's value of the final observations.
    /// 3. Compute returns and advantages (normalized if configured).
    /// 4. Let the policy minimize the combined objective.
    /// 5. Step the learning-rate schedule with `progress_remaining`.
    pub fn run<P, E>(
        &self,
        policy: &mut P,
        env: &mut E,
        fitness: &mut FitnessTracker,
        buffer: &mut RolloutBuffer,
        observations: ObservationBatch,
        progress_remaining: f64,
    ) -> Result<UpdateOutcome, A2cError>
    where
        P: Policy + ?Sized,
        E: VecEnv + ?Sized,
    {
        let config = self.config;
        let rollout = collect_rollout(policy, env, fitness, buffer, observations)?;

        let bootstrap = policy.value(&rollout.next_observations)?;
        if bootstrap.len() != buffer.n_envs() {
            return Err(A2cError::shape("bootstrap values", buffer.n_envs(), bootstrap.len()));
        }

        let returns = compute_returns(&bootstrap, buffer.rewards(), buffer.masks(), config.gamma);
        let values = buffer.values().to_vec();
        let log_probs = buffer.log_probs();

        let mut advantages: Vec<f64> = returns.iter().zip(&values).map(|(r, v)| r - v).collect();
        if config.normalize_advantage {
            normalize_advantages(&mut advantages, config.advantage_eps);
        }

        let losses = Losses::compute(
            log_probs,
            &advantages,
            &returns,
            &values,
            rollout.mean_entropy,
            config,
        );

        policy.apply_gradients(&Objective {
            advantages: &advantages,
            returns: &returns,
            value_loss_coef: config.value_loss_coef,
            entropy_coef: config.entropy_coef,
            critic_loss: config.critic_loss,
            max_grad_norm: config.max_grad_norm,
        })?;

        if config.lr_schedule.is_active() {
            let lr = config
                .lr_schedule
                .learning_rate(self.initial_lr, progress_remaining);
            policy.set_learning_rate(lr);
        }

        Ok(UpdateOutcome {
            entropy: losses.entropy,
            actor_loss: losses.actor,
            critic_loss: losses.critic,
            loss: losses.total,
            completed_fitness: rollout.completed_fitness,
            values,
            returns,
            next_observations: rollout.next_observations,
        })
    }
}
