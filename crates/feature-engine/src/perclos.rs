//! PERCLOS (percentage of eye closure)

use time_window::FrameSample;

/// Fraction of closed frames, or 0 while fewer than `min_frames` are present.
pub fn perclos<'a, I>(frames: I, min_frames: usize) -> f64
where
    I: IntoIterator<Item = &'a FrameSample>,
{
    let (total, closed) = frames
        .into_iter()
        .fold((0usize, 0usize), |(total, closed), f| {
            (total + 1, closed + usize::from(f.eye_closed))
        });

    if total == 0 || total < min_frames {
        return 0.0;
    }
    closed as f64 / total as f64
}
