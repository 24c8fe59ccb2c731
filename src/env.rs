//! Vectorized environment interface.
//!
//! A [`VecEnv`] steps N environments together in one blocking call. It is a
//! data-parallel batch, not concurrent execution: the trainer treats it as a
//! single synchronous collaborator.

use std::collections::HashMap;

use crate::error::A2cError;
use crate::space::{ActionSpace, EnvActions};

/// Observations for a batch of environments, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationBatch {
    values: Vec<f64>,
    n_envs: usize,
    obs_dim: usize,
}

impl ObservationBatch {
    /// Builds a batch from row-major values.
    pub fn new(values: Vec<f64>, n_envs: usize, obs_dim: usize) -> Result<Self, A2cError> {
        if values.len() != n_envs * obs_dim {
            return Err(A2cError::shape(
                "observation batch",
                n_envs * obs_dim,
                values.len(),
            ));
        }
        Ok(Self {
            values,
            n_envs,
            obs_dim,
        })
    }

    /// Builds a batch from per-environment rows of equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, A2cError> {
        let obs_dim = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * obs_dim);
        for row in rows {
            if row.len() != obs_dim {
                return Err(A2cError::shape("observation row", obs_dim, row.len()));
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            values,
            n_envs: rows.len(),
            obs_dim,
        })
    }

    pub fn n_envs(&self) -> usize {
        self.n_envs
    }

    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Observation of environment `index`.
    pub fn row(&self, index: usize) -> &[f64] {
        &self.values[index * self.obs_dim..(index + 1) * self.obs_dim]
    }
}

/// Result of stepping every environment once.
#[derive(Debug, Clone)]
pub struct VecStep {
    /// Next observations. Environments that terminated are already reset.
    pub observations: ObservationBatch,
    /// Per-environment rewards.
    pub rewards: Vec<f64>,
    /// Per-environment termination flags.
    pub dones: Vec<bool>,
    /// Auxiliary per-environment info. Not read by the trainer.
    pub infos: Vec<HashMap<String, f64>>,
}

/// A batch of N environments stepped together.
///
/// Environments auto-reset: when `dones[i]` is set, `observations` row `i`
/// is the first observation of the next episode.
pub trait VecEnv {
    /// Number of environments N.
    fn num_envs(&self) -> usize;

    /// Action space shared by all environments.
    fn action_space(&self) -> &ActionSpace;

    /// Resets every environment and returns the initial observations.
    fn reset(&mut self) -> Result<ObservationBatch, A2cError>;

    /// Steps every environment with one action each.
    fn step(&mut self, actions: &EnvActions) -> Result<VecStep, A2cError>;
}
