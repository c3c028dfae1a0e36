//! Eye geometry: landmarks and eye-aspect-ratio

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Normalized 2D landmark position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// Landmarks for a single face, as produced by the external detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Point2>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<Point2> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = Point2>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Six landmark positions of one eye contour.
///
/// Order: outer corner, two upper lid, inner corner, two lower lid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EyeIndices(pub [usize; 6]);

impl EyeIndices {
    /// Left eye in the 468-point face mesh
    pub const FACE_MESH_LEFT: Self = Self([33, 160, 158, 133, 153, 144]);

    /// Right eye in the 468-point face mesh
    pub const FACE_MESH_RIGHT: Self = Self([362, 385, 387, 263, 373, 380]);

    /// Fewest landmarks a set needs for these indices
    pub fn required_len(&self) -> usize {
        self.0.iter().max().map_or(0, |&i| i + 1)
    }

    /// Pick the six contour points out of a landmark set
    pub fn gather(&self, landmarks: &LandmarkSet) -> Result<[Point2; 6], DmsError> {
        let points = landmarks.points();
        let mut out = [Point2::default(); 6];
        for (slot, &index) in out.iter_mut().zip(self.0.iter()) {
            *slot = *points.get(index).ok_or_else(|| DmsError::KeypointsMissing {
                required: self.required_len(),
                available: points.len(),
            })?;
        }
        Ok(out)
    }
}

/// Eye-aspect-ratio of one eye contour.
///
/// `(|p2-p6| + |p3-p5|) / (2 |p1-p4|)`, or 0 when the eye has no width.
pub fn eye_aspect_ratio(p: &[Point2; 6]) -> f64 {
    let horizontal = p[0].distance(&p[3]);
    if horizontal <= 0.0 {
        return 0.0;
    }
    let vertical = p[1].distance(&p[5]) + p[2].distance(&p[4]);
    vertical / (2.0 * horizontal)
}

/// Per-frame eye measurements
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EyeMetrics {
    pub left_ear: f64,
    pub right_ear: f64,
    pub avg_ear: f64,
}

impl EyeMetrics {
    pub fn from_ears(left_ear: f64, right_ear: f64) -> Self {
        Self {
            left_ear,
            right_ear,
            avg_ear: (left_ear + right_ear) / 2.0,
        }
    }

    /// Both eyes with the same EAR
    pub fn symmetric(ear: f64) -> Self {
        Self::from_ears(ear, ear)
    }

    /// Measure both eyes from a landmark set
    pub fn from_landmarks(
        landmarks: &LandmarkSet,
        left: &EyeIndices,
        right: &EyeIndices,
    ) -> Result<Self, DmsError> {
        let left_ear = eye_aspect_ratio(&left.gather(landmarks)?);
        let right_ear = eye_aspect_ratio(&right.gather(landmarks)?);
        Ok(Self::from_ears(left_ear, right_ear))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Eye contour of width 0.1 and lid gap `2 * half_height`
    fn eye(cx: f64, half_height: f64) -> [Point2; 6] {
        [
            Point2::new(cx - 0.05, 0.5),
            Point2::new(cx - 0.02, 0.5 - half_height),
            Point2::new(cx + 0.02, 0.5 - half_height),
            Point2::new(cx + 0.05, 0.5),
            Point2::new(cx + 0.02, 0.5 + half_height),
            Point2::new(cx - 0.02, 0.5 + half_height),
        ]
    }

    #[test]
    fn test_ear_of_open_eye() {
        // vertical 0.03 + 0.03, horizontal 0.1 -> 0.06 / 0.2
        let ear = eye_aspect_ratio(&eye(0.3, 0.015));
        assert!((ear - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_ear_of_closed_eye() {
        assert!(eye_aspect_ratio(&eye(0.3, 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_eye_returns_zero() {
        let p = [Point2::new(0.4, 0.4); 6];
        assert_eq!(eye_aspect_ratio(&p), 0.0);
    }

    #[test]
    fn test_metrics_from_landmarks() {
        let left = EyeIndices([0, 1, 2, 3, 4, 5]);
        let right = EyeIndices([6, 7, 8, 9, 10, 11]);
        let set: LandmarkSet = eye(0.3, 0.015)
            .into_iter()
            .chain(eye(0.7, 0.005))
            .collect();

        let metrics = EyeMetrics::from_landmarks(&set, &left, &right).unwrap();
        assert!((metrics.left_ear - 0.3).abs() < 1e-9);
        assert!((metrics.right_ear - 0.1).abs() < 1e-9);
        assert!((metrics.avg_ear - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_short_landmark_set_is_rejected() {
        let set = LandmarkSet::new(vec![Point2::default(); 100]);
        let err = EyeMetrics::from_landmarks(&set, &EyeIndices::FACE_MESH_LEFT, &EyeIndices::FACE_MESH_RIGHT)
            .unwrap_err();
        assert!(matches!(
            err,
            DmsError::KeypointsMissing { required: 161, available: 100 }
        ));
    }

    #[test]
    fn test_face_mesh_requirements() {
        assert_eq!(EyeIndices::FACE_MESH_RIGHT.required_len(), 388);
    }
}
