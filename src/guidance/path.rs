//! Navigation polyline and segment projection.

use nalgebra::Vector3;

use crate::geometry::SE3;

/// Projection of a point onto a line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Parametric position along the segment, in [0, 1].
    pub t: f64,
    /// Closest point on the segment.
    pub point: Vector3<f64>,
    /// Squared distance from the query point to `point`.
    pub distance_sq: f64,
}

/// Project `p` onto segment `a → b`.
///
/// ```text
/// t = clamp01(dot(p - a, b - a) / |b - a|²)
/// q = a + t (b - a)
/// ```
///
/// Returns `None` for segments with squared length below `min_length_sq`.
pub fn project_onto_segment(
    p: &Vector3<f64>,
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    min_length_sq: f64,
) -> Option<SegmentProjection> {
    let dir = b - a;
    let len_sq = dir.norm_squared();
    if len_sq < min_length_sq {
        return None;
    }
    let t = ((p - a).dot(&dir) / len_sq).clamp(0.0, 1.0);
    let point = a + dir * t;
    Some(SegmentProjection {
        t,
        point,
        distance_sq: (p - point).norm_squared(),
    })
}

/// Ordered path corners, as produced by the path planner.
///
/// Segment `i` runs from corner `i` to corner `i + 1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuidePath {
    corners: Vec<Vector3<f64>>,
}

impl GuidePath {
    pub fn new(corners: Vec<Vector3<f64>>) -> Self {
        Self { corners }
    }

    pub fn corners(&self) -> &[Vector3<f64>] {
        &self.corners
    }

    pub fn len(&self) -> usize {
        self.corners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// At least one segment exists.
    pub fn is_navigable(&self) -> bool {
        self.corners.len() >= 2
    }

    pub fn segment_count(&self) -> usize {
        self.corners.len().saturating_sub(1)
    }

    pub fn last(&self) -> Option<&Vector3<f64>> {
        self.corners.last()
    }

    fn is_degenerate(&self, segment: usize, min_length_sq: f64) -> bool {
        (self.corners[segment + 1] - self.corners[segment]).norm_squared() < min_length_sq
    }

    /// Index of the segment the observer is currently on.
    ///
    /// Picks the non-degenerate segment whose closest point is nearest to
    /// `observer`. If the observer is already within `min_distance_to_next_node`
    /// of that segment's end corner and a later non-degenerate segment exists,
    /// the later one is chosen instead, so guidance never sticks to a segment
    /// the observer has effectively passed.
    ///
    /// Returns `None` for paths with fewer than two corners or with only
    /// degenerate segments.
    pub fn closest_segment(
        &self,
        observer: &Vector3<f64>,
        min_distance_to_next_node: f64,
        min_length_sq: f64,
    ) -> Option<usize> {
        if !self.is_navigable() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, pair) in self.corners.windows(2).enumerate() {
            let Some(proj) = project_onto_segment(observer, &pair[0], &pair[1], min_length_sq)
            else {
                continue;
            };
            if best.is_none_or(|(_, d)| proj.distance_sq < d) {
                best = Some((i, proj.distance_sq));
            }
        }

        let (index, _) = best?;
        let end = &self.corners[index + 1];
        if (observer - end).norm() < min_distance_to_next_node {
            let next = (index + 1..self.segment_count()).find(|&j| !self.is_degenerate(j, min_length_sq));
            if let Some(next) = next {
                return Some(next);
            }
        }
        Some(index)
    }

    /// Corner the observer should head toward.
    ///
    /// The end corner of `segment`, or the final corner when no segment is
    /// selected. `None` only for an empty path.
    pub fn target_point(&self, segment: Option<usize>) -> Option<Vector3<f64>> {
        match segment {
            Some(i) if i + 1 < self.corners.len() => Some(self.corners[i + 1]),
            _ => self.corners.last().copied(),
        }
    }

    /// Along-path distance from the observer's projection on `segment` to the final corner.
    ///
    /// Falls back to straight-line distance to the final corner when no
    /// segment is selected.
    pub fn remaining_distance(
        &self,
        observer: &Vector3<f64>,
        segment: Option<usize>,
        min_length_sq: f64,
    ) -> f64 {
        let Some(last) = self.corners.last() else {
            return 0.0;
        };
        let Some(i) = segment.filter(|&i| i + 1 < self.corners.len()) else {
            return (observer - last).norm();
        };

        let start = project_onto_segment(observer, &self.corners[i], &self.corners[i + 1], min_length_sq)
            .map(|p| p.point)
            .unwrap_or(self.corners[i]);
        let mut total = (self.corners[i + 1] - start).norm();
        for pair in self.corners[i + 1..].windows(2) {
            total += (pair[1] - pair[0]).norm();
        }
        total
    }

    /// Total polyline length.
    pub fn length(&self) -> f64 {
        self.corners.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Corners raised by `dy` along the vertical axis, for drawing.
    pub fn lifted(&self, dy: f64) -> Vec<Vector3<f64>> {
        self.corners
            .iter()
            .map(|c| Vector3::new(c.x, c.y + dy, c.z))
            .collect()
    }

    /// Same path expressed in another frame.
    pub fn transformed(&self, pose: &SE3) -> Self {
        Self {
            corners: pose.transform_points(&self.corners),
        }
    }
}

impl From<Vec<Vector3<f64>>> for GuidePath {
    fn from(corners: Vec<Vector3<f64>>) -> Self {
        Self::new(corners)
    }
}
