//! Trailing-window arithmetic mean.

/// Mean of each trailing window of `window` values ending at index i.
///
/// `None` for i < window - 1. Each mean is summed from its own window, so a
/// value depends on nothing outside that window.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if window == 0 || n < window {
        return result;
    }

    for (i, w) in values.windows(window).enumerate() {
        let sum: f64 = w.iter().sum();
        result[i + window - 1] = Some(sum / window as f64);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_is_none() {
        let r = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(r, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn short_input_is_all_none() {
        assert!(rolling_mean(&[1.0, 2.0], 3).iter().all(Option::is_none));
        assert!(rolling_mean(&[], 3).is_empty());
    }

    #[test]
    fn zero_window_is_all_none() {
        assert!(rolling_mean(&[1.0, 2.0], 0).iter().all(Option::is_none));
    }
}
