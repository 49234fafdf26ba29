//! Numeric helpers shared by the grouping stages
//!
//! Small sample statistics and Otsu's threshold selection.

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation of `values`.
///
/// With `normalize`, the deviation is divided by the mean (coefficient of
/// variation). An empty slice, and a normalized deviation whose mean is zero,
/// both yield 0.0: such samples carry no spread information.
pub fn standard_dev(values: &[f64], normalize: bool) -> f64 {
    let Some(avg) = mean(values) else {
        return 0.0;
    };

    let sum: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    let stdev = (sum / values.len() as f64).sqrt();

    if !normalize {
        stdev
    } else if avg == 0.0 {
        0.0
    } else {
        stdev / avg
    }
}

/// Otsu's threshold for a 256-bin histogram.
///
/// Returns the level `t` maximizing the between-class variance of
/// `[0, t]` versus `(t, 255]`. An empty or single-valued histogram returns 0.
pub fn otsu_threshold(histogram: &[u32; 256]) -> u8 {
    let total: f64 = histogram.iter().map(|&c| f64::from(c)).sum();
    if total == 0.0 {
        return 0;
    }

    let sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * f64::from(c))
        .sum();

    let mut sum_b = 0.0;
    let mut weight_b = 0.0;
    let mut max_variance = 0.0;
    let mut threshold = 0u8;

    for (i, &count) in histogram.iter().enumerate() {
        weight_b += f64::from(count);
        if weight_b == 0.0 {
            continue;
        }
        let weight_f = total - weight_b;
        if weight_f == 0.0 {
            break;
        }

        sum_b += i as f64 * f64::from(count);
        let mean_b = sum_b / weight_b;
        let mean_f = (sum - sum_b) / weight_f;
        let variance = weight_b * weight_f * (mean_b - mean_f).powi(2);

        if variance > max_variance {
            max_variance = variance;
            threshold = i as u8;
        }
    }

    threshold
}
