//! Batch statistics used by the update and its diagnostics.

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population variance, 0.0 for an empty slice.
fn variance(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

/// Unbiased sample standard deviation; 0.0 below two samples.
pub fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let ss: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (xs.len() - 1) as f64).sqrt()
}

/// Rescales advantages to zero mean and unit sample std.
///
/// The denominator is `std + eps`, so a constant batch maps to zeros instead
/// of dividing by zero.
pub fn normalize_advantages(advantages: &mut [f64], eps: f64) {
    if advantages.is_empty() {
        return;
    }
    let m = mean(advantages);
    let denom = sample_std(advantages) + eps;
    for a in advantages.iter_mut() {
        *a = (*a - m) / denom;
    }
}

/// Fraction of the return variance explained by the critic.
///
/// `1 - Var(returns - values) / Var(returns)`. 1.0 is a perfect critic, 0.0
/// or below is no better than predicting a constant. NaN when the returns
/// have zero variance.
pub fn explained_variance(values: &[f64], returns: &[f64]) -> f64 {
    assert_eq!(values.len(), returns.len());
    let var_returns = variance(returns);
    if var_returns == 0.0 {
        return f64::NAN;
    }
    let residuals: Vec<f64> = returns.iter().zip(values).map(|(r, v)| r - v).collect();
    1.0 - variance(&residuals) / var_returns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_advantages_have_unit_stats() {
        let mut adv = vec![0.3, -1.2, 4.0, 2.5, 0.0, -0.7, 1.1];
        normalize_advantages(&mut adv, 1e-8);

        assert!(mean(&adv).abs() < 1e-9);
        assert!((sample_std(&adv) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn constant_advantages_normalize_to_zero() {
        let mut adv = vec![2.0; 4];
        normalize_advantages(&mut adv, 1e-8);
        assert!(adv.iter().all(|a| a.abs() < 1e-12));
    }

    #[test]
    fn single_advantage_normalizes_to_zero() {
        let mut adv = vec![5.0];
        normalize_advantages(&mut adv, 1e-8);
        assert_eq!(adv, vec![0.0]);
    }

    #[test]
    fn sample_std_uses_bessel_correction() {
        // mean 2, squared deviations 1 + 0 + 1, / (3 - 1)
        assert!((sample_std(&[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), 0.0);
    }

    #[test]
    fn explained_variance_perfect_critic() {
        let returns = [1.0, 2.0, 3.0];
        assert!((explained_variance(&returns, &returns) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn explained_variance_constant_critic() {
        let returns = [1.0, 2.0, 3.0];
        let values = [2.0, 2.0, 2.0];
        assert!(explained_variance(&values, &returns).abs() < 1e-12);
    }

    #[test]
    fn explained_variance_flat_returns_is_nan() {
        assert!(explained_variance(&[0.0, 1.0], &[1.0, 1.0]).is_nan());
    }
}
