//! Blink rate and blink-interval entropy

use time_window::BlinkEvent;

/// Entropy value reported when too few blinks are available
pub const ENTROPY_UNDEFINED: f64 = -1.0;

/// Blinks per minute over the effective window, clamped to `[0, cap]`.
///
/// `effective_window_ms` should already be the lesser of the nominal horizon
/// and the time actually covered by the frame window.
pub fn blink_rate(blink_count: usize, effective_window_ms: u64, cap: f64) -> f64 {
    let window_ms = effective_window_ms.max(1) as f64;
    (blink_count as f64 * 60_000.0 / window_ms).clamp(0.0, cap)
}

/// Shannon entropy (bits) of inter-blink intervals bucketed by their ratio
/// to the mean interval.
///
/// Returns [`ENTROPY_UNDEFINED`] with fewer than `min_blinks` blinks. Perfectly
/// regular blinking lands in a single bucket and scores 0.
pub fn blink_entropy<'a, I>(blinks: I, min_blinks: usize, bins: usize, bin_width: f64) -> f64
where
    I: IntoIterator<Item = &'a BlinkEvent>,
{
    let stamps: Vec<u64> = blinks.into_iter().map(|b| b.timestamp_ms).collect();
    if stamps.len() < min_blinks.max(2) || bins == 0 {
        return ENTROPY_UNDEFINED;
    }

    let intervals: Vec<f64> = stamps
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]) as f64)
        .collect();
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }

    let mut histogram = vec![0usize; bins];
    for interval in &intervals {
        let ratio = interval / mean;
        let bin = ((ratio / bin_width) as usize).min(bins - 1);
        histogram[bin] += 1;
    }

    let n = intervals.len() as f64;
    histogram
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum::<f64>()
        .max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(stamps: &[u64]) -> Vec<BlinkEvent> {
        stamps.iter().map(|&timestamp_ms| BlinkEvent { timestamp_ms }).collect()
    }

    #[test]
    fn test_rate_over_full_window() {
        // 5 blinks in 20 s = 15 per minute
        assert!((blink_rate(5, 20_000, 60.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_over_short_window() {
        // 2 blinks in the first 10 s of a stream = 12 per minute
        assert!((blink_rate(2, 10_000, 60.0) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_is_capped() {
        assert_eq!(blink_rate(3, 100, 60.0), 60.0);
        assert_eq!(blink_rate(1, 0, 60.0), 60.0);
        assert_eq!(blink_rate(0, 0, 60.0), 0.0);
    }

    #[test]
    fn test_entropy_undefined_with_few_blinks() {
        let e = events(&[0, 1_000, 2_000]);
        assert_eq!(blink_entropy(&e, 4, 5, 0.4), ENTROPY_UNDEFINED);
    }

    #[test]
    fn test_regular_blinks_have_zero_entropy() {
        let e = events(&[0, 3_000, 6_000, 9_000, 12_000]);
        assert_eq!(blink_entropy(&e, 4, 5, 0.4), 0.0);
    }

    #[test]
    fn test_irregular_blinks_have_positive_entropy() {
        // intervals 500, 4000, 1500, 2000 -> mean 2000, ratios 0.25, 2.0, 0.75, 1.0
        let e = events(&[0, 500, 4_500, 6_000, 8_000]);
        let entropy = blink_entropy(&e, 4, 5, 0.4);
        // bins 0, 4, 1, 2 are all distinct -> log2(4)
        assert!((entropy - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_simultaneous_blinks() {
        let e = events(&[100, 100, 100, 100]);
        assert_eq!(blink_entropy(&e, 4, 5, 0.4), 0.0);
    }
}
