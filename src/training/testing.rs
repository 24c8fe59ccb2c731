//! Deterministic stand-ins for the policy and the environment.

use std::collections::HashMap;

use crate::env::{ObservationBatch, VecEnv, VecStep};
use crate::error::A2cError;
use crate::policy::{Objective, Policy, PolicyOutput};
use crate::space::{ActionBatch, ActionSpace, EnvActions};

/// Every environment pays `reward` per step and terminates every
/// `episode_len` steps, then auto-resets. The observation is the step count
/// within the current episode.
pub struct StubEnv {
    space: ActionSpace,
    reward: f64,
    episode_len: usize,
    counters: Vec<usize>,
    received: Vec<EnvActions>,
    fail_after: Option<usize>,
}

impl StubEnv {
    pub fn new(n_envs: usize, reward: f64, episode_len: usize, space: ActionSpace) -> Self {
        Self {
            space,
            reward,
            episode_len,
            counters: vec![0; n_envs],
            received: Vec::new(),
            fail_after: None,
        }
    }

    /// Starts environment `i` at step `offsets[i]` of its episode.
    pub fn with_offsets(mut self, offsets: &[usize]) -> Self {
        self.counters = offsets.to_vec();
        self
    }

    /// Makes `step` fail once `steps` steps were taken.
    pub fn failing_after(mut self, steps: usize) -> Self {
        self.fail_after = Some(steps);
        self
    }

    pub fn received(&self) -> &[EnvActions] {
        &self.received
    }

    pub fn steps_taken(&self) -> usize {
        self.received.len()
    }

    fn observations(&self) -> ObservationBatch {
        let values = self.counters.iter().map(|&c| c as f64).collect();
        ObservationBatch::new(values, self.counters.len(), 1)
            .expect("one value per environment")
    }
}

impl VecEnv for StubEnv {
    fn num_envs(&self) -> usize {
        self.counters.len()
    }

    fn action_space(&self) -> &ActionSpace {
        &self.space
    }

    fn reset(&mut self) -> Result<ObservationBatch, A2cError> {
        Ok(self.observations())
    }

    fn step(&mut self, actions: &EnvActions) -> Result<VecStep, A2cError> {
        if self.fail_after.is_some_and(|n| self.received.len() >= n) {
            return Err(A2cError::Environment("stub failure".to_string()));
        }
        self.received.push(actions.clone());

        let mut dones = Vec::with_capacity(self.counters.len());
        for counter in &mut self.counters {
            *counter += 1;
            let done = *counter >= self.episode_len;
            if done {
                *counter = 0;
            }
            dones.push(done);
        }

        Ok(VecStep {
            observations: self.observations(),
            rewards: vec![self.reward; self.counters.len()],
            dones,
            infos: vec![HashMap::new(); self.counters.len()],
        })
    }
}

/// Always emits the same raw actions and critic value.
///
/// The log-probability of each environment's action is the sum of its raw
/// action row, so tests can tell whether bookkeeping saw clipped values.
pub struct ScriptedPolicy {
    actions: ActionBatch,
    value: f64,
    entropy: Vec<Vec<f64>>,
    calls: usize,
    sampled: Vec<ActionBatch>,
    lr: f64,
    pending: usize,
    pub rollouts_started: usize,
    pub lr_history: Vec<f64>,
    pub gradient_calls: usize,
    pub last_advantages: Vec<f64>,
    pub last_returns: Vec<f64>,
}

impl ScriptedPolicy {
    pub fn new(actions: ActionBatch, value: f64) -> Self {
        Self {
            actions,
            value,
            entropy: Vec::new(),
            calls: 0,
            sampled: Vec::new(),
            lr: 7e-4,
            pending: 0,
            rollouts_started: 0,
            lr_history: Vec::new(),
            gradient_calls: 0,
            last_advantages: Vec::new(),
            last_returns: Vec::new(),
        }
    }

    /// Per-call entropy rows, cycled. Defaults to 0.5 everywhere.
    pub fn with_entropy(mut self, entropy: Vec<Vec<f64>>) -> Self {
        self.entropy = entropy;
        self
    }

    pub fn sampled(&self) -> &[ActionBatch] {
        &self.sampled
    }

    /// `act` calls since the last rollout start or gradient step.
    pub fn pending_steps(&self) -> usize {
        self.pending
    }
}

impl Policy for ScriptedPolicy {
    fn act(&mut self, observations: &ObservationBatch) -> Result<PolicyOutput, A2cError> {
        let n = observations.n_envs();
        let entropy = if self.entropy.is_empty() {
            vec![0.5; n]
        } else {
            self.entropy[self.calls % self.entropy.len()].clone()
        };
        self.calls += 1;
        self.pending += 1;
        self.sampled.push(self.actions.clone());

        Ok(PolicyOutput {
            actions: self.actions.clone(),
            values: vec![self.value; n],
            log_probs: self.actions.rows().map(|row| row.iter().sum()).collect(),
            entropy,
        })
    }

    fn value(&mut self, observations: &ObservationBatch) -> Result<Vec<f64>, A2cError> {
        Ok(vec![self.value; observations.n_envs()])
    }

    fn start_rollout(&mut self) {
        self.rollouts_started += 1;
        self.pending = 0;
    }

    fn apply_gradients(&mut self, objective: &Objective<'_>) -> Result<(), A2cError> {
        self.pending = 0;
        self.gradient_calls += 1;
        self.last_advantages = objective.advantages.to_vec();
        self.last_returns = objective.returns.to_vec();
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
        self.lr_history.push(lr);
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
