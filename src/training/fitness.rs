//! Episodic reward accumulation across a vectorized batch.
//!
//! Environments in the batch terminate independently. Each slot accumulates
//! its own episode reward; when a slot terminates the accumulated value is
//! emitted as that episode's fitness and the slot starts again from zero.

use crate::error::A2cError;

/// Per-environment running episode reward.
#[derive(Debug, Clone)]
pub struct FitnessTracker {
    accumulators: Vec<f64>,
}

impl FitnessTracker {
    /// Creates a tracker with one zeroed slot per environment.
    pub fn new(n_envs: usize) -> Self {
        Self {
            accumulators: vec![0.0; n_envs],
        }
    }

    /// Number of environment slots.
    pub fn n_envs(&self) -> usize {
        self.accumulators.len()
    }

    /// Current running reward of every slot.
    pub fn accumulators(&self) -> &[f64] {
        &self.accumulators
    }

    /// Records one vectorized step.
    ///
    /// Each slot adds its reward. Slots that terminated push their episode
    /// total (including this step's reward) onto `completed`, in slot order,
    /// and reset to zero.
    pub fn observe(
        &mut self,
        rewards: &[f64],
        dones: &[bool],
        completed: &mut Vec<f64>,
    ) -> Result<(), A2cError> {
        let n = self.accumulators.len();
        if rewards.len() != n {
            return Err(A2cError::shape("fitness rewards", n, rewards.len()));
        }
        if dones.len() != n {
            return Err(A2cError::shape("fitness dones", n, dones.len()));
        }

        for ((acc, &reward), &done) in self.accumulators.iter_mut().zip(rewards).zip(dones) {
            *acc += reward;
            if done {
                completed.push(*acc);
                *acc = 0.0;
            }
        }
        Ok(())
    }

    /// Zeroes every slot, e.g. after the environments were reset externally.
    pub fn reset(&mut self) {
        self.accumulators.iter_mut().for_each(|a| *a = 0.0);
    }
}

/// Mean of the completed episodes, or `None` if no episode ended.
pub fn mean_fitness(completed: &[f64]) -> Option<f64> {
    if completed.is_empty() {
        None
    } else {
        Some(completed.iter().sum::<f64>() / completed.len() as f64)
    }
}
