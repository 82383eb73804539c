//! Kitchen polygon geometry and the per-object zone state machine.

use nalgebra::Vector2;
use serde::Serialize;

use crate::error::{PolygonDefect, TrackError};
use crate::tracker::point::Point;

/// Where a tracked object stands relative to the kitchen zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ZoneState {
    /// First seen outside the polygon and never inside since.
    #[default]
    Outside,
    /// Inside the polygon, or outside but within the exit margin.
    InKitchen,
    /// Left the kitchen past the exit margin and has not come back.
    Delivered,
}

/// Result of evaluating one new position against the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneTransition {
    None,
    Entered,
    Delivered,
    Returned,
}

/// Immutable simple polygon marking the kitchen side of the pass.
#[derive(Debug, Clone)]
pub struct KitchenZone {
    vertices: Vec<Point>,
    exit_margin: f64,
}

impl KitchenZone {
    /// Validate the polygon. Fewer than three vertices, zero area and
    /// crossing edges are all rejected.
    pub fn new(vertices: Vec<Point>, exit_margin: f64) -> Result<Self, TrackError> {
        if vertices.len() < 3 {
            return Err(TrackError::MalformedPolygon(PolygonDefect::TooFewVertices {
                count: vertices.len(),
            }));
        }
        if !exit_margin.is_finite() || exit_margin < 0.0 {
            return Err(TrackError::config(format!(
                "exit margin must be a non-negative number, got {}",
                exit_margin
            )));
        }

        let zone = Self {
            vertices,
            exit_margin,
        };
        if let Some(edge) = zone.edges().position(|(a, b)| a == b) {
            return Err(TrackError::MalformedPolygon(PolygonDefect::DegenerateEdge {
                edge,
            }));
        }
        if zone.twice_area() == 0 {
            return Err(TrackError::MalformedPolygon(PolygonDefect::ZeroArea));
        }
        if let Some((first_edge, second_edge)) = zone.first_crossing() {
            return Err(TrackError::MalformedPolygon(
                PolygonDefect::SelfIntersecting {
                    first_edge,
                    second_edge,
                },
            ));
        }
        Ok(zone)
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn exit_margin(&self) -> f64 {
        self.exit_margin
    }

    fn edge(&self, i: usize) -> (Point, Point) {
        let n = self.vertices.len();
        (self.vertices[i], self.vertices[(i + 1) % n])
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..self.vertices.len()).map(|i| self.edge(i))
    }

    fn twice_area(&self) -> i64 {
        self.edges()
            .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
            .sum::<i64>()
            .abs()
    }

    fn first_crossing(&self) -> Option<(usize, usize)> {
        let n = self.vertices.len();
        for i in 0..n {
            for j in (i + 2)..n {
                // Edges 0 and n-1 share vertex 0.
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (a, b) = self.edge(i);
                let (c, d) = self.edge(j);
                if segments_intersect(a, b, c, d) {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// Point-in-polygon test. Points on the boundary count as inside.
    pub fn contains(&self, p: Point) -> bool {
        if self.edges().any(|(a, b)| on_segment(a, b, p)) {
            return true;
        }

        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x as f64
                    + (p.y - a.y) as f64 * (b.x - a.x) as f64 / (b.y - a.y) as f64;
                if (p.x as f64) < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Distance to the nearest edge, positive inside and negative outside.
    pub fn signed_distance(&self, p: Point) -> f64 {
        let distance = self
            .edges()
            .map(|(a, b)| segment_distance(a, b, p))
            .fold(f64::INFINITY, f64::min);
        if self.contains(p) { distance } else { -distance }
    }

    /// Advance `state` given a new position.
    ///
    /// Exits need to clear the margin; re-entries only need the plain inside test.
    pub fn step(&self, state: ZoneState, p: Point) -> (ZoneState, ZoneTransition) {
        let inside = self.contains(p);
        match state {
            ZoneState::Outside if inside => (ZoneState::InKitchen, ZoneTransition::Entered),
            ZoneState::InKitchen if !inside && self.signed_distance(p) < -self.exit_margin => {
                (ZoneState::Delivered, ZoneTransition::Delivered)
            }
            ZoneState::Delivered if inside => (ZoneState::InKitchen, ZoneTransition::Returned),
            _ => (state, ZoneTransition::None),
        }
    }

    /// Zone state for a freshly registered object.
    pub fn initial_state(&self, p: Point) -> ZoneState {
        if self.contains(p) {
            ZoneState::InKitchen
        } else {
            ZoneState::Outside
        }
    }
}

fn orientation(a: Point, b: Point, c: Point) -> i64 {
    (b.x as i64 - a.x as i64) * (c.y as i64 - a.y as i64)
        - (b.y as i64 - a.y as i64) * (c.x as i64 - a.x as i64)
}

fn within_box(a: Point, b: Point, p: Point) -> bool {
    a.x.min(b.x) <= p.x && p.x <= a.x.max(b.x) && a.y.min(b.y) <= p.y && p.y <= a.y.max(b.y)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    orientation(a, b, p) == 0 && within_box(a, b, p)
}

fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let d1 = orientation(c, d, a).signum();
    let d2 = orientation(c, d, b).signum();
    let d3 = orientation(a, b, c).signum();
    let d4 = orientation(a, b, d).signum();

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }
    (d1 == 0 && within_box(c, d, a))
        || (d2 == 0 && within_box(c, d, b))
        || (d3 == 0 && within_box(a, b, c))
        || (d4 == 0 && within_box(a, b, d))
}

fn segment_distance(a: Point, b: Point, p: Point) -> f64 {
    let a = a.to_na();
    let ab: Vector2<f64> = b.to_na() - a;
    let ap: Vector2<f64> = p.to_na() - a;
    let len2 = ab.norm_squared();
    let t = if len2 > 0.0 {
        (ap.dot(&ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (ap - ab * t).norm()
}
