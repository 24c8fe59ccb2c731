//! Fixed-horizon trajectory collection over a vectorized environment.

use super::buffer::RolloutBuffer;
use super::fitness::FitnessTracker;
use crate::env::{ObservationBatch, VecEnv};
use crate::error::A2cError;
use crate::policy::Policy;

/// What a rollout hands to the update, besides the filled buffer.
#[derive(Debug, Clone)]
pub struct Rollout {
    /// Observations after the last step; seeds the next rollout.
    pub next_observations: ObservationBatch,
    /// Mean entropy over every step and environment.
    pub mean_entropy: f64,
    /// Fitness of every episode that ended during the rollout.
    pub completed_fitness: Vec<f64>,
}

/// Runs the policy for `buffer.n_steps()` vectorized steps.
///
/// Clears and fills `buffer`, and feeds every step to `fitness`. The policy
/// is told a rollout starts before its first `act`. Actions are
/// converted at the environment boundary (clipped or flattened); the policy's
/// log-probabilities refer to the raw actions it sampled. This is the only
/// place the environment is stepped.
pub fn collect_rollout<P, E>(
    policy: &mut P,
    env: &mut E,
    fitness: &mut FitnessTracker,
    buffer: &mut RolloutBuffer,
    observations: ObservationBatch,
) -> Result<Rollout, A2cError>
where
    P: Policy + ?Sized,
    E: VecEnv + ?Sized,
{
    let n_envs = buffer.n_envs();
    if observations.n_envs() != n_envs {
        return Err(A2cError::shape("observations", n_envs, observations.n_envs()));
    }

    buffer.clear();
    policy.start_rollout();
    let mut obs = observations;
    let mut entropy_sum = 0.0;
    let mut entropy_terms = 0usize;
    let mut completed_fitness = Vec::new();

    for _ in 0..buffer.n_steps() {
        let output = policy.act(&obs)?;
        if output.actions.n_envs() != n_envs {
            return Err(A2cError::shape("actions", n_envs, output.actions.n_envs()));
        }
        if output.entropy.len() != n_envs {
            return Err(A2cError::shape("entropy", n_envs, output.entropy.len()));
        }

        let env_actions = env.action_space().to_env_actions(&output.actions)?;
        let step = env.step(&env_actions)?;
        if step.observations.n_envs() != n_envs {
            return Err(A2cError::shape(
                "next observations",
                n_envs,
                step.observations.n_envs(),
            ));
        }

        entropy_sum += output.entropy.iter().sum::<f64>();
        entropy_terms += output.entropy.len();

        fitness.observe(&step.rewards, &step.dones, &mut completed_fitness)?;
        buffer.push(&output.log_probs, &output.values, &step.rewards, &step.dones)?;

        obs = step.observations;
    }

    let mean_entropy = if entropy_terms == 0 {
        0.0
    } else {
        entropy_sum / entropy_terms as f64
    };

    Ok(Rollout {
        next_observations: obs,
        mean_entropy,
        completed_fitness,
    })
}
