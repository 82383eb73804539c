//! Matching utilities for centroid tracking.

use std::cmp::Ordering;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::tracker::category::Category;
use crate::tracker::point::Point;

/// Detection input for the tracker, with its category already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Bounding-box centroid in pixels
    pub position: Point,
    pub category: Category,
}

impl Detection {
    pub fn new(x: i32, y: i32, category: Category) -> Self {
        Self {
            position: Point::new(x, y),
            category,
        }
    }
}

/// Detection as it arrives from a detector, category still a free-form label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDetection {
    pub position: Point,
    #[serde(rename = "category")]
    pub label: String,
}

impl RawDetection {
    pub fn new(x: i32, y: i32, label: impl Into<String>) -> Self {
        Self {
            position: Point::new(x, y),
            label: label.into(),
        }
    }
}

impl TryFrom<RawDetection> for Detection {
    type Error = TrackError;

    fn try_from(raw: RawDetection) -> Result<Self, Self::Error> {
        Ok(Self {
            position: raw.position,
            category: raw.label.parse()?,
        })
    }
}

/// Compute the Euclidean distance matrix between object and detection centroids.
pub fn distance_matrix(objects: &[Point], detections: &[Point]) -> Array2<f64> {
    let mut dists = Array2::zeros((objects.len(), detections.len()));
    for (i, o) in objects.iter().enumerate() {
        for (j, d) in detections.iter().enumerate() {
            dists[[i, j]] = o.distance(d);
        }
    }
    dists
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// (row, column) pairs in the order they were committed
    pub matches: Vec<(usize, usize)>,
    pub unmatched_rows: Vec<usize>,
    pub unmatched_cols: Vec<usize>,
}

/// Greedy nearest-neighbour assignment.
///
/// Each row only ever considers its single nearest column. Rows are visited
/// in ascending order of that nearest distance (ties keep row order); a row is
/// skipped when it or its column is already taken, when the distance exceeds
/// `max_distance`, or when `compatible(row, col)` is false. A skipped row is
/// not retried against any other column.
pub fn greedy_assignment<F>(dists: &Array2<f64>, max_distance: f64, compatible: F) -> AssignmentResult
where
    F: Fn(usize, usize) -> bool,
{
    let (num_rows, num_cols) = dists.dim();

    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_rows: (0..num_rows).collect(),
            unmatched_cols: (0..num_cols).collect(),
        };
    }

    let mut nearest: Vec<(usize, usize, f64)> = dists
        .outer_iter()
        .enumerate()
        .map(|(row, costs)| {
            let (col, dist) = costs.iter().enumerate().fold(
                (0, f64::INFINITY),
                |best, (col, &d)| if d < best.1 { (col, d) } else { best },
            );
            (row, col, dist)
        })
        .collect();
    nearest.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));

    let mut used_rows = vec![false; num_rows];
    let mut used_cols = vec![false; num_cols];
    let mut matches = Vec::new();

    for (row, col, dist) in nearest {
        if used_rows[row] || used_cols[col] {
            continue;
        }
        if dist > max_distance {
            continue;
        }
        if !compatible(row, col) {
            continue;
        }
        used_rows[row] = true;
        used_cols[col] = true;
        matches.push((row, col));
    }

    AssignmentResult {
        matches,
        unmatched_rows: (0..num_rows).filter(|&r| !used_rows[r]).collect(),
        unmatched_cols: (0..num_cols).filter(|&c| !used_cols[c]).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&c| Point::from(c)).collect()
    }

    #[test]
    fn test_distance_matrix_shape() {
        let d = distance_matrix(&pts(&[(0, 0), (10, 0)]), &pts(&[(0, 3), (6, 8), (10, 0)]));
        assert_eq!(d.dim(), (2, 3));
        assert!((d[[0, 1]] - 10.0).abs() < 1e-12);
        assert_eq!(d[[1, 2]], 0.0);
    }

    #[test]
    fn test_raw_detection_conversion() {
        let det = Detection::try_from(RawDetection::new(3, 4, "Parcel")).unwrap();
        assert_eq!(det, Detection::new(3, 4, Category::Parcel));
        assert!(Detection::try_from(RawDetection::new(3, 4, "Spoon")).is_err());
    }

    #[test]
    fn test_closest_row_goes_first() {
        // Both rows prefer column 0; row 1 is closer and wins it.
        let d = distance_matrix(&pts(&[(0, 0), (18, 0)]), &pts(&[(20, 0), (40, 0)]));
        let result = greedy_assignment(&d, 100.0, |_, _| true);
        assert_eq!(result.matches, vec![(1, 0)]);
        // Row 0 is not retried against column 1.
        assert_eq!(result.unmatched_rows, vec![0]);
        assert_eq!(result.unmatched_cols, vec![1]);
    }

    #[test]
    fn test_ties_keep_row_order() {
        let d = distance_matrix(&pts(&[(0, 0), (20, 0)]), &pts(&[(10, 0)]));
        let result = greedy_assignment(&d, 100.0, |_, _| true);
        assert_eq!(result.matches, vec![(0, 0)]);
    }

    #[test]
    fn test_distance_cutoff() {
        let d = distance_matrix(&pts(&[(0, 0)]), &pts(&[(60, 0)]));
        assert!(greedy_assignment(&d, 50.0, |_, _| true).matches.is_empty());
        assert_eq!(greedy_assignment(&d, 60.0, |_, _| true).matches, vec![(0, 0)]);
    }

    #[test]
    fn test_incompatible_pair_is_skipped() {
        let d = distance_matrix(&pts(&[(0, 0)]), &pts(&[(1, 0), (5, 0)]));
        let result = greedy_assignment(&d, 100.0, |_, col| col != 0);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_cols, vec![0, 1]);
    }

    #[test]
    fn test_empty_inputs() {
        let d = distance_matrix(&[], &pts(&[(1, 1)]));
        let result = greedy_assignment(&d, 10.0, |_, _| true);
        assert_eq!(result.unmatched_cols, vec![0]);
        assert!(result.unmatched_rows.is_empty());
    }
}
