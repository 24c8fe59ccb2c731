//! MLP actor-critic policy using tch-rs (PyTorch bindings).
//!
//! The distribution head is chosen once from the [`ActionSpace`]: a
//! categorical head over logits for discrete spaces, a diagonal Gaussian with
//! a state-independent learned log-std for continuous ones. Parameters are
//! optimized with RMSprop. This module is only available with the `nn`
//! feature.

use std::path::Path;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tch::{nn, nn::Module, nn::OptimizerConfig, Device, Kind, Reduction, Tensor};

use crate::config::CriticLoss;
use crate::env::ObservationBatch;
use crate::error::A2cError;
use crate::policy::{Objective, Policy, PolicyOutput};
use crate::space::{ActionBatch, ActionSpace};

/// ln(2π)
const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// Network and optimizer settings.
#[derive(Debug, Clone)]
pub struct MlpPolicyConfig {
    /// Hidden layer widths of each trunk.
    pub hidden: Vec<i64>,
    /// Actor and critic share one trunk instead of having their own.
    pub shared_trunk: bool,
    /// Initial RMSprop learning rate.
    pub learning_rate: f64,
    /// RMSprop smoothing constant.
    pub rms_alpha: f64,
    /// RMSprop denominator epsilon.
    pub rms_eps: f64,
    /// Initial log standard deviation of the Gaussian head.
    pub init_log_std: f64,
    /// Seeds action sampling and parameter initialization.
    pub seed: u64,
}

impl Default for MlpPolicyConfig {
    fn default() -> Self {
        Self {
            hidden: vec![64, 64],
            shared_trunk: false,
            learning_rate: 7e-4,
            rms_alpha: 0.99,
            rms_eps: 1e-5,
            init_log_std: 0.0,
            seed: 0,
        }
    }
}

enum Head {
    Categorical { logits: nn::Linear },
    Gaussian { mean: nn::Linear, log_std: Tensor },
}

/// Differentiable outputs recorded since the last gradient step.
#[derive(Default)]
struct Trace {
    log_probs: Vec<Tensor>,
    values: Vec<Tensor>,
    entropy: Vec<Tensor>,
}

/// MLP actor-critic.
///
/// Architecture: `obs_dim → hidden… → head` with tanh activations, plus a
/// linear value head on the critic trunk (or on the shared trunk).
pub struct MlpPolicy {
    vs: nn::VarStore,
    actor_trunk: nn::Sequential,
    critic_trunk: Option<nn::Sequential>,
    value_head: nn::Linear,
    head: Head,
    space: ActionSpace,
    obs_dim: usize,
    optimizer: nn::Optimizer,
    lr: f64,
    rng: StdRng,
    trace: Trace,
    device: Device,
}

/// Builds `input → hidden[0] → … ` with tanh after every layer.
fn trunk(p: &nn::Path, input: i64, hidden: &[i64]) -> (nn::Sequential, i64) {
    let mut seq = nn::seq();
    let mut width = input;
    for (i, &h) in hidden.iter().enumerate() {
        seq = seq
            .add(nn::linear(p / format!("l{}", i), width, h, Default::default()))
            .add_fn(|x| x.tanh());
        width = h;
    }
    (seq, width)
}

fn to_vec(t: &Tensor) -> Result<Vec<f64>, A2cError> {
    let flat = t.detach().to_kind(Kind::Double).flatten(0, -1);
    Ok(Vec::<f64>::try_from(&flat)?)
}

impl MlpPolicy {
    /// Creates a policy for observations of width `obs_dim`.
    pub fn new(
        obs_dim: usize,
        space: ActionSpace,
        config: &MlpPolicyConfig,
        device: Device,
    ) -> Result<Self, A2cError> {
        tch::manual_seed(config.seed as i64);

        let vs = nn::VarStore::new(device);
        let root = vs.root();
        let (actor_trunk, actor_width) = trunk(&(&root / "actor"), obs_dim as i64, &config.hidden);
        let (critic_trunk, critic_width) = if config.shared_trunk {
            (None, actor_width)
        } else {
            let (t, w) = trunk(&(&root / "critic"), obs_dim as i64, &config.hidden);
            (Some(t), w)
        };
        let value_head = nn::linear(&root / "value", critic_width, 1, Default::default());

        let head_dim = space.head_dim() as i64;
        let head = match &space {
            ActionSpace::Discrete { .. } => Head::Categorical {
                logits: nn::linear(&root / "logits", actor_width, head_dim, Default::default()),
            },
            ActionSpace::Continuous { .. } => Head::Gaussian {
                mean: nn::linear(&root / "mean", actor_width, head_dim, Default::default()),
                log_std: root.var("log_std", &[head_dim], nn::Init::Const(config.init_log_std)),
            },
        };

        let optimizer = nn::RmsProp {
            alpha: config.rms_alpha,
            eps: config.rms_eps,
            wd: 0.0,
            momentum: 0.0,
            centered: false,
        }
        .build(&vs, config.learning_rate)?;

        Ok(Self {
            vs,
            actor_trunk,
            critic_trunk,
            value_head,
            head,
            space,
            obs_dim,
            optimizer,
            lr: config.learning_rate,
            rng: StdRng::seed_from_u64(config.seed),
            trace: Trace::default(),
            device,
        })
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.space
    }

    /// Returns a reference to the variable store.
    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    /// Restores parameters written by [`Policy::save`].
    pub fn load(&mut self, path: &Path) -> Result<(), A2cError> {
        self.vs.load(path)?;
        Ok(())
    }

    fn float_tensor(&self, values: &[f64]) -> Tensor {
        Tensor::from_slice(values)
            .to_kind(Kind::Float)
            .to_device(self.device)
    }

    fn observation_tensor(&self, obs: &ObservationBatch) -> Result<Tensor, A2cError> {
        if obs.obs_dim() != self.obs_dim {
            return Err(A2cError::shape("observation width", self.obs_dim, obs.obs_dim()));
        }
        Ok(self
            .float_tensor(obs.as_slice())
            .view([obs.n_envs() as i64, self.obs_dim as i64]))
    }

    /// Actor features and critic values `[N]`.
    fn forward(&self, obs: &Tensor) -> (Tensor, Tensor) {
        let features = self.actor_trunk.forward(obs);
        let critic_features = match &self.critic_trunk {
            Some(critic) => critic.forward(obs),
            None => features.shallow_clone(),
        };
        let values = self.value_head.forward(&critic_features).squeeze_dim(-1);
        (features, values)
    }
}

impl MlpPolicy {
    /// Samples actions, returning the outputs together with the tensors the
    /// update differentiates through (`log_probs`, `values`, `entropy`).
    fn sample(
        &mut self,
        observations: &ObservationBatch,
    ) -> Result<(PolicyOutput, [Tensor; 3]), A2cError> {
        let n = observations.n_envs();
        let obs = self.observation_tensor(observations)?;
        let (features, values) = self.forward(&obs);

        let (actions, log_probs, entropy) = match &self.head {
            Head::Categorical { logits } => {
                let log_p = logits.forward(&features).log_softmax(-1, Kind::Float);
                let probs = to_vec(&log_p.exp())?;

                let mut indices = Vec::with_capacity(n);
                for (env, row) in probs.chunks_exact(self.space.head_dim()).enumerate() {
                    let dist = WeightedIndex::new(row).map_err(|e| A2cError::InvalidAction {
                        env,
                        reason: e.to_string(),
                    })?;
                    indices.push(dist.sample(&mut self.rng));
                }

                let index_tensor = Tensor::from_slice(
                    &indices.iter().map(|&i| i as i64).collect::<Vec<_>>(),
                )
                .to_device(self.device);
                let log_probs = log_p
                    .gather(-1, &index_tensor.unsqueeze(-1), false)
                    .squeeze_dim(-1);
                let entropy =
                    -(log_p.exp() * &log_p).sum_dim_intlist(&[-1i64][..], false, Kind::Float);
                (ActionBatch::from_indices(&indices), log_probs, entropy)
            }
            Head::Gaussian { mean, log_std } => {
                let dim = self.space.head_dim();
                let mu = mean.forward(&features);
                let noise: Vec<f32> = (&mut self.rng)
                    .sample_iter(StandardNormal)
                    .take(n * dim)
                    .collect();
                let noise = Tensor::from_slice(&noise)
                    .view([n as i64, dim as i64])
                    .to_device(self.device);
                let sample = (&mu + log_std.exp() * &noise).detach();

                let var = (log_std * 2.0).exp();
                let log_probs = (-(&sample - &mu).pow_tensor_scalar(2) / (var * 2.0)
                    - log_std
                    - 0.5 * LN_2PI)
                    .sum_dim_intlist(&[-1i64][..], false, Kind::Float);
                let entropy = (log_std + 0.5 * (1.0 + LN_2PI)).sum(Kind::Float)
                    * Tensor::ones([n as i64], (Kind::Float, self.device));

                let actions = ActionBatch::new(to_vec(&sample)?, n, dim)?;
                (actions, log_probs, entropy)
            }
        };

        let output = PolicyOutput {
            actions,
            values: to_vec(&values)?,
            log_probs: to_vec(&log_probs)?,
            entropy: to_vec(&entropy)?,
        };
        Ok((output, [log_probs, values, entropy]))
    }

    /// Samples actions without recording anything for the update, e.g. to
    /// evaluate a trained policy. Runs without autograd.
    pub fn predict(&mut self, observations: &ObservationBatch) -> Result<PolicyOutput, A2cError> {
        tch::no_grad(|| self.sample(observations)).map(|(output, _)| output)
    }
}

impl Policy for MlpPolicy {
    fn act(&mut self, observations: &ObservationBatch) -> Result<PolicyOutput, A2cError> {
        let (output, [log_probs, values, entropy]) = self.sample(observations)?;
        self.trace.log_probs.push(log_probs);
        self.trace.values.push(values);
        self.trace.entropy.push(entropy);
        Ok(output)
    }

    fn start_rollout(&mut self) {
        self.trace = Trace::default();
    }


    fn value(&mut self, observations: &ObservationBatch) -> Result<Vec<f64>, A2cError> {
        let obs = self.observation_tensor(observations)?;
        let values = tch::no_grad(|| self.forward(&obs).1);
        to_vec(&values)
    }

    fn apply_gradients(&mut self, objective: &Objective<'_>) -> Result<(), A2cError> {
        let trace = std::mem::take(&mut self.trace);
        if trace.log_probs.is_empty() {
            return Err(A2cError::shape("recorded steps", 1, 0));
        }

        let log_probs = Tensor::cat(&trace.log_probs, 0);
        let values = Tensor::cat(&trace.values, 0);
        let entropy = Tensor::cat(&trace.entropy, 0).mean(Kind::Float);

        let recorded = log_probs.size()[0] as usize;
        if objective.advantages.len() != recorded {
            return Err(A2cError::shape("advantages", recorded, objective.advantages.len()));
        }
        if objective.returns.len() != recorded {
            return Err(A2cError::shape("returns", recorded, objective.returns.len()));
        }

        let advantages = self.float_tensor(objective.advantages);
        let returns = self.float_tensor(objective.returns);

        let actor_loss = -(&log_probs * &advantages).mean(Kind::Float);
        let critic_loss = match objective.critic_loss {
            CriticLoss::Mse => values.mse_loss(&returns, Reduction::Mean),
            CriticLoss::SmoothL1 => values.smooth_l1_loss(&returns, Reduction::Mean, 1.0),
        };
        let loss = actor_loss + objective.value_loss_coef * critic_loss
            - objective.entropy_coef * entropy;

        self.optimizer.zero_grad();
        loss.backward();
        self.optimizer.clip_grad_norm(objective.max_grad_norm);
        self.optimizer.step();
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.optimizer.set_lr(lr);
        self.lr = lr;
    }

    fn save(&self, path: &Path) -> Result<(), A2cError> {
        self.vs.save(path)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "mlp"
    }
}
