//! Price indicators over plain `f64` slices.

/// Simple moving average of the last `window` values.
pub fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// Recursive exponential moving average with `alpha = 2 / (span + 1)`,
/// seeded with the first value.
pub fn ema(values: &[f64], span: usize) -> Option<f64> {
    let (first, rest) = values.split_first()?;
    if span == 0 {
        return None;
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    Some(rest.iter().fold(*first, |acc, v| alpha * v + (1.0 - alpha) * acc))
}

/// Day-over-day fractional changes. Pairs with a zero or non-finite base are
/// skipped.
pub fn pct_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter_map(|w| {
            let r = (w[1] - w[0]) / w[0];
            r.is_finite().then_some(r)
        })
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1). `None` below two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_uses_tail() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&values, 2), Some(4.5));
        assert_eq!(sma(&values, 5), Some(3.0));
        assert_eq!(sma(&values, 6), None);
    }

    #[test]
    fn test_ema_recursive() {
        // span 3 => alpha 0.5
        let values = [10.0, 20.0, 30.0];
        // 10 -> 15 -> 22.5
        assert!((ema(&values, 3).unwrap() - 22.5).abs() < 1e-12);
        assert_eq!(ema(&[], 3), None);
        assert_eq!(ema(&[7.0], 5), Some(7.0));
    }

    #[test]
    fn test_pct_returns_skip_zero_base() {
        let r = pct_returns(&[0.0, 10.0, 11.0]);
        assert_eq!(r.len(), 1);
        assert!((r[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // population std is 2, sample variance is 32 / 7
        let std = sample_std(&values).unwrap();
        assert!((std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), None);
    }
}
