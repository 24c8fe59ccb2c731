//! Random policy for testing and baselines.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::trait_::{Objective, Policy, PolicyOutput};
use crate::env::ObservationBatch;
use crate::error::A2cError;
use crate::space::{ActionBatch, ActionSpace};

/// Uniformly random actions with a zero critic.
///
/// Has no parameters, so gradient application is a no-op. Useful as a
/// lower-bound baseline and for exercising environments.
pub struct RandomPolicy {
    space: ActionSpace,
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a random policy over `space`, seeded for reproducibility.
    pub fn new(space: ActionSpace, seed: u64) -> Self {
        Self {
            space,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Log-density of a uniform sample, identical for every action.
    fn log_prob(&self) -> f64 {
        match &self.space {
            ActionSpace::Discrete { n } => -(*n as f64).ln(),
            ActionSpace::Continuous { low, high } => {
                -low.iter().zip(high).map(|(l, h)| (h - l).ln()).sum::<f64>()
            }
        }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, observations: &ObservationBatch) -> Result<PolicyOutput, A2cError> {
        let n_envs = observations.n_envs();
        let actions = match &self.space {
            ActionSpace::Discrete { n } => {
                let indices: Vec<usize> =
                    (0..n_envs).map(|_| self.rng.gen_range(0..*n)).collect();
                ActionBatch::from_indices(&indices)
            }
            ActionSpace::Continuous { low, high } => {
                let mut values = Vec::with_capacity(n_envs * low.len());
                for _ in 0..n_envs {
                    for (&l, &h) in low.iter().zip(high) {
                        values.push(self.rng.gen_range(l..=h));
                    }
                }
                ActionBatch::new(values, n_envs, low.len())?
            }
        };
        let log_prob = self.log_prob();

        Ok(PolicyOutput {
            actions,
            values: vec![0.0; n_envs],
            log_probs: vec![log_prob; n_envs],
            entropy: vec![-log_prob; n_envs],
        })
    }

    fn value(&mut self, observations: &ObservationBatch) -> Result<Vec<f64>, A2cError> {
        Ok(vec![0.0; observations.n_envs()])
    }

    fn apply_gradients(&mut self, _objective: &Objective<'_>) -> Result<(), A2cError> {
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        0.0
    }

    fn set_learning_rate(&mut self, _lr: f64) {}

    fn name(&self) -> &str {
        "random"
    }
}
