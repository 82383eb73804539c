//! Single tracked object for centroid tracking.

use serde::Serialize;

use crate::tracker::category::Category;
use crate::tracker::point::Point;
use crate::tracker::trail::Trail;
use crate::tracker::zone::ZoneState;

/// Object identifier, assigned per tracker and never reused.
pub type ObjectId = u64;

/// Single tracked object.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    id: ObjectId,
    category: Category,
    position: Point,
    /// Consecutive frames without a match
    disappearance_count: u32,
    zone_state: ZoneState,
    trail: Trail,
}

impl TrackedObject {
    pub(crate) fn new(
        id: ObjectId,
        position: Point,
        category: Category,
        zone_state: ZoneState,
        trail_length: usize,
    ) -> Self {
        Self {
            id,
            category,
            position,
            disappearance_count: 0,
            zone_state,
            trail: Trail::new(trail_length, position),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn disappearance_count(&self) -> u32 {
        self.disappearance_count
    }

    pub fn zone_state(&self) -> ZoneState {
        self.zone_state
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Apply a matched detection.
    pub(crate) fn update(&mut self, position: Point) {
        self.position = position;
        self.disappearance_count = 0;
        self.trail.push(position);
    }

    /// Count one more unmatched frame and return the new count.
    pub(crate) fn mark_missed(&mut self) -> u32 {
        self.disappearance_count += 1;
        self.disappearance_count
    }

    pub(crate) fn set_zone_state(&mut self, state: ZoneState) {
        self.zone_state = state;
    }

    pub fn snapshot(&self) -> ObjectSnapshot {
        ObjectSnapshot {
            id: self.id,
            category: self.category,
            position: self.position,
            zone_state: self.zone_state,
            trail: self.trail.to_vec(),
        }
    }
}

/// Owned view of a tracked object for overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub category: Category,
    pub position: Point,
    pub zone_state: ZoneState,
    pub trail: Vec<Point>,
}
