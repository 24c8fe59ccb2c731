//! Bootstrapped n-step discounted returns.
//!
//! Computes returns for a fixed-horizon rollout over a batch of environments,
//! bootstrapping from the critic's estimate of the state after the rollout.

/// Computes discounted returns backward in time.
///
/// `return[t] = reward[t] + gamma * next * mask[t]`, where `next` is
/// `return[t + 1]` and, for the last step, `bootstrap`.
///
/// # Arguments
///
/// * `bootstrap` - Value estimate per environment for the state after the rollout
/// * `rewards` - Rewards, row-major (`step * n_envs + env`)
/// * `masks` - Continuation masks, same layout (0.0 where the episode ended)
/// * `gamma` - Discount factor
///
/// # Returns
///
/// Returns in the same row-major layout as `rewards`.
///
/// # Panics
///
/// If `rewards` and `masks` differ in length, or their length is not a
/// multiple of `bootstrap.len()`.
pub fn compute_returns(bootstrap: &[f64], rewards: &[f64], masks: &[f64], gamma: f64) -> Vec<f64> {
    let n_envs = bootstrap.len();
    assert_eq!(masks.len(), rewards.len());
    if rewards.is_empty() {
        return Vec::new();
    }
    assert!(n_envs > 0 && rewards.len() % n_envs == 0);

    let mut returns = vec![0.0; rewards.len()];
    let mut running = bootstrap.to_vec();

    for t in (0..rewards.len() / n_envs).rev() {
        let row = t * n_envs;
        for (env, r) in running.iter_mut().enumerate() {
            *r = rewards[row + env] + gamma * *r * masks[row + env];
            returns[row + env] = *r;
        }
    }

    returns
}
