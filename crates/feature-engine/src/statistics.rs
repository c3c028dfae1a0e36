//! Signal Statistics Computation

use time_window::FrameSample;

/// Summary statistics for a signal
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalStatistics {
    /// Number of samples
    pub count: usize,
    /// Mean value
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl SignalStatistics {
    /// Compute statistics from an iterator of values
    pub fn compute<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: Clone,
    {
        let values = values.into_iter();

        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for v in values.clone() {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            return Self::default();
        }

        let n = count as f64;
        let mean = sum / n;

        // Two-pass variance keeps precision for values clustered near 1.0
        let m2: f64 = values.map(|v| (v - mean) * (v - mean)).sum();
        let variance = m2 / n;

        Self {
            count,
            mean,
            variance,
            std_dev: variance.sqrt(),
            min,
            max,
        }
    }

    /// Statistics of the normalized EAR over a set of frames
    pub fn of_normalized_ear<'a, I>(frames: I) -> Self
    where
        I: IntoIterator<Item = &'a FrameSample>,
        I::IntoIter: Clone,
    {
        Self::compute(frames.into_iter().map(|f| f.normalized_ear))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_computation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = SignalStatistics::compute(values.iter().copied());
        assert!((stats.mean - 3.0).abs() < 0.001);
        assert_eq!(stats.count, 5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_std_dev_computation() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = SignalStatistics::compute(values.iter().copied());
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
        assert!((stats.variance - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_signal_has_zero_variance() {
        let stats = SignalStatistics::compute(std::iter::repeat(0.93).take(50));
        assert!(stats.variance.abs() < 1e-12);
    }

    #[test]
    fn test_empty_values() {
        let stats = SignalStatistics::compute(std::iter::empty());
        assert_eq!(stats, SignalStatistics::default());
    }

    #[test]
    fn test_of_normalized_ear() {
        let frames = [
            FrameSample { timestamp_ms: 0, normalized_ear: 0.8, eye_closed: false },
            FrameSample { timestamp_ms: 33, normalized_ear: 1.2, eye_closed: false },
        ];
        let stats = SignalStatistics::of_normalized_ear(frames.iter());
        assert!((stats.mean - 1.0).abs() < 1e-9);
        assert!((stats.variance - 0.04).abs() < 1e-9);
    }
}
