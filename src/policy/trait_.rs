//! Policy trait consumed by the rollout collector and the update step.

use std::path::Path;

use crate::config::CriticLoss;
use crate::env::ObservationBatch;
use crate::error::A2cError;
use crate::space::ActionBatch;

/// Output of one policy query over an observation batch.
///
/// All per-environment vectors have length N. `log_probs` and `entropy` refer
/// to the raw `actions`, before any clipping at the environment boundary.
#[derive(Debug, Clone)]
pub struct PolicyOutput {
    pub actions: ActionBatch,
    pub values: Vec<f64>,
    pub log_probs: Vec<f64>,
    pub entropy: Vec<f64>,
}

/// The A2C objective for one rollout, handed to the policy's optimizer.
///
/// Vectors are flattened row-major (`step * n_envs + env`) in the order the
/// policy produced them through [`Policy::act`]. `advantages` are detached
/// and already normalized when normalization is enabled.
///
/// The policy minimizes
/// `-mean(log_prob * advantage) + value_loss_coef * critic_loss(returns, values)
/// - entropy_coef * mean(entropy)`.
#[derive(Debug, Clone, Copy)]
pub struct Objective<'a> {
    pub advantages: &'a [f64],
    pub returns: &'a [f64],
    pub value_loss_coef: f64,
    pub entropy_coef: f64,
    pub critic_loss: CriticLoss,
    pub max_grad_norm: f64,
}

/// A differentiable actor-critic policy.
///
/// Between two calls to [`Policy::apply_gradients`] the policy keeps whatever
/// it needs (e.g. an autograd graph) for every [`Policy::act`] call, and
/// releases it when the gradients are applied.
pub trait Policy {
    /// Samples actions and returns values, log-probabilities and entropies.
    fn act(&mut self, observations: &ObservationBatch) -> Result<PolicyOutput, A2cError>;

    /// Called before the first `act` of every rollout. Anything recorded by
    /// an earlier rollout that never reached [`Policy::apply_gradients`] is
    /// dropped.
    fn start_rollout(&mut self) {}

    /// Critic estimate only, without recording anything for the update.
    fn value(&mut self, observations: &ObservationBatch) -> Result<Vec<f64>, A2cError>;

    /// Zeroes gradients, back-propagates the objective over everything
    /// recorded since the last call, clips the gradient norm and takes one
    /// optimizer step.
    fn apply_gradients(&mut self, objective: &Objective<'_>) -> Result<(), A2cError>;

    /// Current optimizer learning rate.
    fn learning_rate(&self) -> f64;

    /// Sets the optimizer learning rate.
    fn set_learning_rate(&mut self, lr: f64);

    /// Persists the policy parameters. The format is up to the policy.
    fn save(&self, _path: &Path) -> Result<(), A2cError> {
        Err(A2cError::Unsupported("save"))
    }

    /// Human-readable name.
    fn name(&self) -> &str;
}
