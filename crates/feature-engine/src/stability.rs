//! EAR signal stability score

/// Map a normalized-EAR variance onto a trust multiplier in `[floor, 1]`.
///
/// Fewer than `min_samples` samples are treated as stable. Between the two
/// variance thresholds the score falls linearly from 1 to `floor`.
pub fn stability_score(
    variance: f64,
    samples: usize,
    min_samples: usize,
    stable_variance: f64,
    unstable_variance: f64,
    floor: f64,
) -> f64 {
    if samples < min_samples || variance <= stable_variance {
        return 1.0;
    }
    if variance >= unstable_variance {
        return floor;
    }

    let t = (variance - stable_variance) / (unstable_variance - stable_variance);
    (1.0 - t * (1.0 - floor)).clamp(floor, 1.0)
}
