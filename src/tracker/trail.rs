use std::collections::VecDeque;

use crate::tracker::point::Point;

/// Bounded position history, most recent last.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<Point>,
    capacity: usize,
}

impl Trail {
    /// Capacity is clamped to at least one entry.
    pub fn new(capacity: usize, seed: Point) -> Self {
        let capacity = capacity.max(1);
        let mut points = VecDeque::with_capacity(capacity);
        points.push_back(seed);
        Self { points, capacity }
    }

    pub fn push(&mut self, point: Point) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<Point> {
        self.points.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<Point> {
        self.points.iter().copied().collect()
    }

    /// Mean per-step displacement over the stored history, in pixels per
    /// matched frame. `None` until two points are stored.
    pub fn velocity(&self) -> Option<(f64, f64)> {
        if self.points.len() < 2 {
            return None;
        }
        let first = self.points.front()?;
        let last = self.points.back()?;
        let steps = (self.points.len() - 1) as f64;
        Some((
            (last.x - first.x) as f64 / steps,
            (last.y - first.y) as f64 / steps,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_with_initial_position() {
        let trail = Trail::new(3, Point::new(1, 1));
        assert_eq!(trail.to_vec(), vec![Point::new(1, 1)]);
        assert_eq!(trail.velocity(), None);
    }

    #[test]
    fn test_evicts_oldest() {
        let mut trail = Trail::new(3, Point::new(0, 0));
        for i in 1..=4 {
            trail.push(Point::new(i, 0));
        }
        assert_eq!(trail.len(), 3);
        assert_eq!(
            trail.to_vec(),
            vec![Point::new(2, 0), Point::new(3, 0), Point::new(4, 0)]
        );
        assert_eq!(trail.latest(), Some(Point::new(4, 0)));
    }

    #[test]
    fn test_velocity() {
        let mut trail = Trail::new(10, Point::new(0, 0));
        trail.push(Point::new(4, -2));
        trail.push(Point::new(8, -4));
        assert_eq!(trail.velocity(), Some((4.0, -2.0)));
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut trail = Trail::new(0, Point::new(0, 0));
        trail.push(Point::new(5, 5));
        assert_eq!(trail.capacity(), 1);
        assert_eq!(trail.to_vec(), vec![Point::new(5, 5)]);
    }
}
