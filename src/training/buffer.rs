//! Rollout buffer for one fixed-horizon collection.

use crate::error::A2cError;

/// Structure-of-arrays storage for `n_steps` rows of `n_envs` entries.
///
/// Each field is one row-major sequence (`step * n_envs + env`) allocated
/// once for the full horizon and cleared at the start of every update, so
/// the hot loop never reallocates.
#[derive(Debug, Clone)]
pub struct RolloutBuffer {
    n_steps: usize,
    n_envs: usize,
    log_probs: Vec<f64>,
    values: Vec<f64>,
    rewards: Vec<f64>,
    masks: Vec<f64>,
}

impl RolloutBuffer {
    /// Creates an empty buffer sized for `n_steps` × `n_envs`.
    pub fn new(n_steps: usize, n_envs: usize) -> Self {
        let capacity = n_steps * n_envs;
        Self {
            n_steps,
            n_envs,
            log_probs: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            rewards: Vec::with_capacity(capacity),
            masks: Vec::with_capacity(capacity),
        }
    }

    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    pub fn n_envs(&self) -> usize {
        self.n_envs
    }

    /// Appends one step. Every slice must be `n_envs` wide.
    pub fn push(
        &mut self,
        log_probs: &[f64],
        values: &[f64],
        rewards: &[f64],
        dones: &[bool],
    ) -> Result<(), A2cError> {
        if self.is_full() {
            return Err(A2cError::shape("rollout steps", self.n_steps, self.len() + 1));
        }
        for (what, len) in [
            ("log_probs", log_probs.len()),
            ("values", values.len()),
            ("rewards", rewards.len()),
            ("dones", dones.len()),
        ] {
            if len != self.n_envs {
                return Err(A2cError::shape(what, self.n_envs, len));
            }
        }

        self.log_probs.extend_from_slice(log_probs);
        self.values.extend_from_slice(values);
        self.rewards.extend_from_slice(rewards);
        self.masks
            .extend(dones.iter().map(|&d| if d { 0.0 } else { 1.0 }));
        Ok(())
    }

    /// Clears all stored steps, keeping the allocation.
    pub fn clear(&mut self) {
        self.log_probs.clear();
        self.values.clear();
        self.rewards.clear();
        self.masks.clear();
    }

    /// Number of stored steps.
    pub fn len(&self) -> usize {
        if self.n_envs == 0 {
            0
        } else {
            self.rewards.len() / self.n_envs
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.n_steps
    }

    /// Log-probabilities of the sampled (unclipped) actions.
    pub fn log_probs(&self) -> &[f64] {
        &self.log_probs
    }

    /// Critic estimates at each step.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Rewards received after each step.
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// 1.0 while the episode continues, 0.0 on the step it terminated.
    pub fn masks(&self) -> &[f64] {
        &self.masks
    }

    /// Mask row of one step.
    pub fn mask_row(&self, step: usize) -> &[f64] {
        &self.masks[step * self.n_envs..(step + 1) * self.n_envs]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_push_and_clear() {
        let mut buf = RolloutBuffer::new(2, 2);
        assert!(buf.is_empty());

        buf.push(&[-0.5, -0.6], &[1.0, 2.0], &[1.0, 0.0], &[false, true])
            .unwrap();
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.mask_row(0), &[1.0, 0.0]);

        buf.push(&[-0.1, -0.2], &[3.0, 4.0], &[0.0, 0.0], &[false, false])
            .unwrap();
        assert!(buf.is_full());
        assert_eq!(buf.values(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buf.log_probs(), &[-0.5, -0.6, -0.1, -0.2]);

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.n_steps(), 2);
    }

    #[test]
    fn refill_keeps_allocation() {
        let mut buf = RolloutBuffer::new(3, 2);
        let capacity = buf.rewards.capacity();
        assert!(capacity >= 6);

        for _ in 0..2 {
            buf.clear();
            for _ in 0..3 {
                buf.push(&[0.0; 2], &[0.0; 2], &[1.0; 2], &[false; 2]).unwrap();
            }
        }
        assert_eq!(buf.rewards.capacity(), capacity);
        assert_eq!(buf.masks.capacity(), capacity);
    }

    #[test]
    fn rejects_wrong_width() {
        let mut buf = RolloutBuffer::new(3, 2);
        let err = buf
            .push(&[0.0, 0.0], &[0.0], &[0.0, 0.0], &[false, false])
            .unwrap_err();
        assert!(matches!(
            err,
            A2cError::ShapeMismatch {
                what: "values",
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn rejects_overflow() {
        let mut buf = RolloutBuffer::new(1, 1);
        buf.push(&[0.0], &[0.0], &[0.0], &[false]).unwrap();
        assert!(buf.push(&[0.0], &[0.0], &[0.0], &[false]).is_err());
    }
}
