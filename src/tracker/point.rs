use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Integer pixel coordinate, used for centroids and polygon vertices.
///
/// Serializes as a two-element array `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Centre of a TLBR box, truncated towards zero.
    #[inline]
    pub fn centroid_of_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let x1 = x1 as i32;
        let y1 = y1 as i32;
        let x2 = x2 as i32;
        let y2 = y2 as i32;
        Self {
            x: ((x1 as f64 + x2 as f64) / 2.0) as i32,
            y: ((y1 as f64 + y2 as f64) / 2.0) as i32,
        }
    }

    #[inline]
    pub fn to_na(self) -> Point2<f64> {
        Point2::new(self.x as f64, self.y as f64)
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        nalgebra::distance(&self.to_na(), &other.to_na())
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_truncates() {
        // (10 + 25) / 2 = 17.5 -> 17
        assert_eq!(
            Point::centroid_of_tlbr(10.0, 20.0, 25.0, 41.0),
            Point::new(17, 30)
        );
        assert_eq!(
            Point::centroid_of_tlbr(10.9, 20.0, 30.2, 40.0),
            Point::new(20, 30)
        );
    }

    #[test]
    fn test_serde_as_pair() {
        let p: Point = serde_json::from_str("[368, 518]").unwrap();
        assert_eq!(p, Point::new(368, 518));
        assert_eq!(serde_json::to_string(&p).unwrap(), "[368,518]");
    }
}
