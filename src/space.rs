//! Action spaces and the policy/environment action boundary.
//!
//! The policy emits raw actions as an [`ActionBatch`]. Before stepping the
//! environment they are converted to [`EnvActions`]: continuous actions are
//! clipped to the declared bounds, discrete actions are flattened to one index
//! per environment. The raw batch is what the policy's log-probability and
//! entropy bookkeeping refers to.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{A2cError, ConfigError};

/// Action space of every environment in a vectorized batch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActionSpace {
    /// `n` mutually exclusive actions, indexed `0..n`.
    Discrete { n: usize },
    /// Real vectors with per-dimension bounds `low[i] <= a[i] <= high[i]`.
    Continuous { low: Vec<f64>, high: Vec<f64> },
}

impl ActionSpace {
    /// Creates a discrete space with `n` actions.
    pub fn discrete(n: usize) -> Result<Self, ConfigError> {
        if n == 0 {
            return Err(ConfigError::EmptyActionSpace);
        }
        Ok(ActionSpace::Discrete { n })
    }

    /// Creates a continuous space from per-dimension bounds.
    ///
    /// Every dimension must be finite with `low < high`, so the uniform
    /// density over the box is well defined.
    pub fn continuous(low: Vec<f64>, high: Vec<f64>) -> Result<Self, ConfigError> {
        if low.len() != high.len() {
            return Err(ConfigError::BoundsLength {
                low: low.len(),
                high: high.len(),
            });
        }
        if low.is_empty() {
            return Err(ConfigError::EmptyActionSpace);
        }
        for (index, (&l, &h)) in low.iter().zip(&high).enumerate() {
            if !l.is_finite() || !h.is_finite() {
                return Err(ConfigError::NonFiniteBounds {
                    index,
                    low: l,
                    high: h,
                });
            }
            if l > h {
                return Err(ConfigError::InvertedBounds {
                    index,
                    low: l,
                    high: h,
                });
            }
            if l == h {
                return Err(ConfigError::ZeroWidthBounds { index, value: l });
            }
        }
        Ok(ActionSpace::Continuous { low, high })
    }

    /// Creates a continuous space bounded by `[-bound, bound]` in every dimension.
    pub fn symmetric(dim: usize, bound: f64) -> Result<Self, ConfigError> {
        Self::continuous(vec![-bound; dim], vec![bound; dim])
    }

    /// Number of values the policy emits per environment.
    ///
    /// Discrete policies emit a single index.
    pub fn action_width(&self) -> usize {
        match self {
            ActionSpace::Discrete { .. } => 1,
            ActionSpace::Continuous { low, .. } => low.len(),
        }
    }

    /// Size of the distribution head the policy needs for this space.
    pub fn head_dim(&self) -> usize {
        match self {
            ActionSpace::Discrete { n } => *n,
            ActionSpace::Continuous { low, .. } => low.len(),
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, ActionSpace::Discrete { .. })
    }

    /// Converts raw policy actions into actions the environment accepts.
    ///
    /// Continuous actions are clipped element-wise to the bounds. Discrete
    /// actions are flattened to one index per environment; indices that are
    /// out of range or not integral are rejected.
    pub fn to_env_actions(&self, batch: &ActionBatch) -> Result<EnvActions, A2cError> {
        let width = self.action_width();
        if batch.width() != width {
            return Err(A2cError::shape("action width", width, batch.width()));
        }

        match self {
            ActionSpace::Discrete { n } => {
                let mut indices = Vec::with_capacity(batch.n_envs());
                for (env, row) in batch.rows().enumerate() {
                    let raw = row[0];
                    if raw.fract() != 0.0 || raw < 0.0 || raw >= *n as f64 {
                        return Err(A2cError::InvalidAction {
                            env,
                            reason: format!("index {} outside 0..{}", raw, n),
                        });
                    }
                    indices.push(raw as usize);
                }
                Ok(EnvActions::Discrete(indices))
            }
            ActionSpace::Continuous { low, high } => {
                let clipped = batch
                    .rows()
                    .map(|row| {
                        row.iter()
                            .zip(low.iter().zip(high))
                            .map(|(&a, (&l, &h))| a.clamp(l, h))
                            .collect()
                    })
                    .collect();
                Ok(EnvActions::Continuous(clipped))
            }
        }
    }
}

/// Raw actions produced by a policy: `n_envs` rows of `width` values.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionBatch {
    values: Vec<f64>,
    n_envs: usize,
    width: usize,
}

impl ActionBatch {
    /// Builds a batch from row-major values.
    pub fn new(values: Vec<f64>, n_envs: usize, width: usize) -> Result<Self, A2cError> {
        if values.len() != n_envs * width {
            return Err(A2cError::shape("action batch", n_envs * width, values.len()));
        }
        Ok(Self {
            values,
            n_envs,
            width,
        })
    }

    /// One discrete index per environment.
    pub fn from_indices(indices: &[usize]) -> Self {
        Self {
            values: indices.iter().map(|&i| i as f64).collect(),
            n_envs: indices.len(),
            width: 1,
        }
    }

    /// One continuous vector per environment. All rows must share a length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, A2cError> {
        let width = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(A2cError::shape("action row", width, row.len()));
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            values,
            n_envs: rows.len(),
            width,
        })
    }

    pub fn n_envs(&self) -> usize {
        self.n_envs
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Iterates over per-environment rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // width 0 would make chunks_exact panic
        self.values.chunks_exact(self.width.max(1))
    }
}

/// Actions in the form the vectorized environment consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvActions {
    Discrete(Vec<usize>),
    Continuous(Vec<Vec<f64>>),
}

impl EnvActions {
    pub fn len(&self) -> usize {
        match self {
            EnvActions::Discrete(a) => a.len(),
            EnvActions::Continuous(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_actions_are_clipped() {
        let space = ActionSpace::symmetric(2, 1.0).unwrap();
        let batch = ActionBatch::from_rows(&[vec![1.5, -0.25], vec![-3.0, 0.999]]).unwrap();
        let env_actions = space.to_env_actions(&batch).unwrap();

        assert_eq!(
            env_actions,
            EnvActions::Continuous(vec![vec![1.0, -0.25], vec![-1.0, 0.999]])
        );
        // The raw batch is untouched.
        assert_eq!(batch.as_slice()[0], 1.5);
    }

    #[test]
    fn asymmetric_bounds_clip_per_dimension() {
        let space = ActionSpace::continuous(vec![0.0, -2.0], vec![1.0, 2.0]).unwrap();
        let batch = ActionBatch::from_rows(&[vec![-0.5, 2.5]]).unwrap();
        let env_actions = space.to_env_actions(&batch).unwrap();
        assert_eq!(env_actions, EnvActions::Continuous(vec![vec![0.0, 2.0]]));
    }

    #[test]
    fn discrete_actions_are_flattened() {
        let space = ActionSpace::discrete(3).unwrap();
        let batch = ActionBatch::from_indices(&[2, 0, 1]);
        let env_actions = space.to_env_actions(&batch).unwrap();
        assert_eq!(env_actions, EnvActions::Discrete(vec![2, 0, 1]));
        assert_eq!(env_actions.len(), 3);
    }

    #[test]
    fn discrete_out_of_range_is_rejected() {
        let space = ActionSpace::discrete(2).unwrap();
        let batch = ActionBatch::from_indices(&[0, 2]);
        let err = space.to_env_actions(&batch).unwrap_err();
        assert!(matches!(err, A2cError::InvalidAction { env: 1, .. }));
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let space = ActionSpace::symmetric(3, 1.0).unwrap();
        let batch = ActionBatch::from_rows(&[vec![0.0, 0.0]]).unwrap();
        assert!(matches!(
            space.to_env_actions(&batch),
            Err(A2cError::ShapeMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        assert_eq!(
            ActionSpace::continuous(vec![0.0], vec![1.0, 2.0]),
            Err(ConfigError::BoundsLength { low: 1, high: 2 })
        );
        assert!(matches!(
            ActionSpace::continuous(vec![1.0], vec![0.0]),
            Err(ConfigError::InvertedBounds { index: 0, .. })
        ));
        assert_eq!(
            ActionSpace::continuous(vec![-1.0, 0.5], vec![1.0, 0.5]),
            Err(ConfigError::ZeroWidthBounds { index: 1, value: 0.5 })
        );
        assert!(ActionSpace::symmetric(2, 0.0).is_err());
        assert!(matches!(
            ActionSpace::continuous(vec![f64::NEG_INFINITY], vec![0.0]),
            Err(ConfigError::NonFiniteBounds { index: 0, .. })
        ));
        assert!(matches!(
            ActionSpace::continuous(vec![f64::NAN], vec![0.0]),
            Err(ConfigError::NonFiniteBounds { index: 0, .. })
        ));
        assert_eq!(
            ActionSpace::discrete(0),
            Err(ConfigError::EmptyActionSpace)
        );
    }

    #[test]
    fn head_dim_and_width() {
        let d = ActionSpace::discrete(4).unwrap();
        assert_eq!(d.head_dim(), 4);
        assert_eq!(d.action_width(), 1);
        let c = ActionSpace::symmetric(3, 2.0).unwrap();
        assert_eq!(c.head_dim(), 3);
        assert_eq!(c.action_width(), 3);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(ActionBatch::from_rows(&[vec![0.0, 1.0], vec![0.0]]).is_err());
        assert!(ActionBatch::new(vec![0.0; 5], 2, 2).is_err());
    }
}
