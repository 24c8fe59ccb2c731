// Demonstration: train an MLP policy on a batch of one-dimensional corridors.
//
// Run from the repo root:
//   cargo run --features nn --example corridor -- --envs 8 --seconds 20 --seed 7

use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::rc::Rc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tch::Device;

use a2c_core::{
    A2CTrainer, A2cConfig, A2cError, ActionSpace, EnvActions, HistoryReporter, MlpPolicy,
    MlpPolicyConfig, ObservationBatch, TrainingBudget, VecEnv, VecStep,
};

const LENGTH: usize = 10;
const MAX_STEPS: usize = 50;

/// Walk left (0) or right (1); reaching the right end pays 1, every step
/// costs 0.01. Episodes also end after `MAX_STEPS`.
struct Corridors {
    space: ActionSpace,
    positions: Vec<usize>,
    steps: Vec<usize>,
    rng: StdRng,
}

impl Corridors {
    fn new(n_envs: usize, seed: u64) -> Result<Self, A2cError> {
        Ok(Self {
            space: ActionSpace::discrete(2)?,
            positions: vec![0; n_envs],
            steps: vec![0; n_envs],
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn start(&mut self) -> usize {
        self.rng.gen_range(0..LENGTH / 2)
    }

    fn observations(&self) -> Result<ObservationBatch, A2cError> {
        let values = self
            .positions
            .iter()
            .map(|&p| p as f64 / (LENGTH - 1) as f64)
            .collect();
        ObservationBatch::new(values, self.positions.len(), 1)
    }
}

impl VecEnv for Corridors {
    fn num_envs(&self) -> usize {
        self.positions.len()
    }

    fn action_space(&self) -> &ActionSpace {
        &self.space
    }

    fn reset(&mut self) -> Result<ObservationBatch, A2cError> {
        for i in 0..self.positions.len() {
            self.positions[i] = self.start();
            self.steps[i] = 0;
        }
        self.observations()
    }

    fn step(&mut self, actions: &EnvActions) -> Result<VecStep, A2cError> {
        let EnvActions::Discrete(moves) = actions else {
            return Err(A2cError::Environment("expected discrete actions".to_string()));
        };

        let n = self.positions.len();
        let mut rewards = Vec::with_capacity(n);
        let mut dones = Vec::with_capacity(n);
        for (i, &action) in moves.iter().enumerate() {
            let pos = &mut self.positions[i];
            *pos = match action {
                0 => pos.saturating_sub(1),
                _ => (*pos + 1).min(LENGTH - 1),
            };
            self.steps[i] += 1;

            let reached = *pos == LENGTH - 1;
            rewards.push(if reached { 1.0 } else { -0.01 });
            let done = reached || self.steps[i] >= MAX_STEPS;
            if done {
                self.positions[i] = self.start();
                self.steps[i] = 0;
            }
            dones.push(done);
        }

        Ok(VecStep {
            observations: self.observations()?,
            rewards,
            dones,
            infos: vec![HashMap::new(); n],
        })
    }
}

fn main() -> Result<(), A2cError> {
    tracing_subscriber::fmt().init();

    let args: Vec<String> = env::args().collect();
    let n_envs: usize = arg_value(&args, "--envs")
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    let seconds: u64 = arg_value(&args, "--seconds")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);

    let env = Corridors::new(n_envs, seed)?;
    let policy = MlpPolicy::new(
        1,
        env.action_space().clone(),
        &MlpPolicyConfig {
            hidden: vec![32, 32],
            seed,
            ..MlpPolicyConfig::default()
        },
        Device::Cpu,
    )?;
    let config = A2cConfig {
        log_interval: 100,
        ..A2cConfig::default()
    };

    let history = Rc::new(RefCell::new(HistoryReporter::new()));
    let mut trainer = A2CTrainer::new(policy, env, config)?;
    trainer.add_reporter(Box::new(history.clone()));

    let summary = trainer.train(TrainingBudget::duration(Duration::from_secs(seconds)))?;
    println!(
        "{} updates, {} frames, fitness {:.3} ({})",
        summary.updates, summary.frames, summary.fitness, summary.stop_reason
    );

    let curve = history.borrow().learning_curve();
    for (iteration, fitness) in curve.iter().step_by((curve.len() / 10).max(1)) {
        println!("update {:>6}  fitness {:>7.3}", iteration, fitness);
    }
    Ok(())
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
