//! Main centroid tracker: frame-to-frame association and delivery bookkeeping.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::tracker::category::{Category, CategoryCounts};
use crate::tracker::ledger::{DeliveryEvent, DeliveryLedger, RoiCounts, TrackerEvent};
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::point::Point;
use crate::tracker::tracked_object::{ObjectId, ObjectSnapshot, TrackedObject};
use crate::tracker::zone::{KitchenZone, ZoneState};

/// Configuration for the CentroidTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub kitchen_roi: Vec<Point>,
    pub max_disappeared: u32,
    pub max_distance: f64,
    pub trail_length: usize,
    pub exit_margin_px: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            kitchen_roi: [
                [368, 518],
                [709, 245],
                [865, 317],
                [1222, 30],
                [1502, 114],
                [1345, 726],
                [1558, 822],
                [1471, 1074],
                [811, 1070],
                [372, 1068],
                [324, 1036],
                [602, 668],
            ]
            .into_iter()
            .map(Point::from)
            .collect(),
            max_disappeared: 10,
            max_distance: 100.0,
            trail_length: 30,
            exit_margin_px: 5.0,
        }
    }
}

impl TrackerConfig {
    /// Check tuning values and build the kitchen zone.
    pub fn build_zone(&self) -> Result<KitchenZone, TrackError> {
        if !self.max_distance.is_finite() || self.max_distance <= 0.0 {
            return Err(TrackError::config(format!(
                "max_distance must be positive, got {}",
                self.max_distance
            )));
        }
        if self.trail_length == 0 {
            return Err(TrackError::config("trail_length must be at least 1"));
        }
        KitchenZone::new(self.kitchen_roi.clone(), self.exit_margin_px)
    }
}

/// Result of one `update` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameUpdate {
    /// Current id -> position mapping
    pub positions: BTreeMap<ObjectId, Point>,
    pub events: Vec<TrackerEvent>,
}

impl FrameUpdate {
    pub fn deliveries(&self) -> impl Iterator<Item = &DeliveryEvent> {
        self.events.iter().filter_map(TrackerEvent::as_delivery)
    }
}

pub struct CentroidTracker {
    objects: BTreeMap<ObjectId, TrackedObject>,
    next_id: ObjectId,
    zone: KitchenZone,
    ledger: DeliveryLedger,
    config: TrackerConfig,
}

impl CentroidTracker {
    /// Fails on a malformed kitchen polygon or invalid tuning values.
    pub fn new(config: TrackerConfig) -> Result<Self, TrackError> {
        let zone = config.build_zone()?;
        Ok(Self {
            objects: BTreeMap::new(),
            next_id: 0,
            zone,
            ledger: DeliveryLedger::new(),
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn zone(&self) -> &KitchenZone {
        &self.zone
    }

    pub fn ledger(&self) -> &DeliveryLedger {
        &self.ledger
    }

    /// Mutable ledger access for operator corrections
    /// ([`DeliveryLedger::retract`]) between frames.
    pub fn ledger_mut(&mut self) -> &mut DeliveryLedger {
        &mut self.ledger
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&TrackedObject> {
        self.objects.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.values()
    }

    /// Register a new object and return its id.
    pub fn register(&mut self, position: Point, category: Category) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        let state = self.zone.initial_state(position);
        self.objects.insert(
            id,
            TrackedObject::new(id, position, category, state, self.config.trail_length),
        );
        log::debug!(
            "Registered object {} ({}) at ({}, {}), {:?}",
            id,
            category,
            position.x,
            position.y,
            state
        );
        id
    }

    fn deregister(&mut self, id: ObjectId, timestamp: DateTime<Utc>, events: &mut Vec<TrackerEvent>) {
        let Some(object) = self.objects.remove(&id) else {
            return;
        };
        log::debug!("Deregistered object {} ({})", id, object.category());
        if object.zone_state() == ZoneState::Delivered {
            self.ledger.finalize(object.category());
            log::info!("Object {} ({}) delivery finalized", id, object.category());
            events.push(TrackerEvent::Finalized {
                object_id: id,
                category: object.category(),
                timestamp,
            });
        }
    }

    fn mark_missed(&mut self, id: ObjectId, timestamp: DateTime<Utc>, events: &mut Vec<TrackerEvent>) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        if object.mark_missed() > self.config.max_disappeared {
            self.deregister(id, timestamp, events);
        }
    }

    fn apply_match(
        &mut self,
        id: ObjectId,
        position: Point,
        timestamp: DateTime<Utc>,
        events: &mut Vec<TrackerEvent>,
    ) {
        let Some(object) = self.objects.get_mut(&id) else {
            return;
        };
        object.update(position);
        let (state, transition) = self.zone.step(object.zone_state(), position);
        object.set_zone_state(state);
        if let Some(event) = self
            .ledger
            .record(id, object.category(), transition, timestamp)
        {
            events.push(TrackerEvent::Delivery(event));
        }
    }

    /// Advance the tracker by one frame.
    pub fn update(&mut self, detections: &[Detection], timestamp: DateTime<Utc>) -> FrameUpdate {
        let mut events = Vec::new();

        if detections.is_empty() {
            let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
            for id in ids {
                self.mark_missed(id, timestamp, &mut events);
            }
            return self.frame_update(events);
        }

        if self.objects.is_empty() {
            for det in detections {
                self.register(det.position, det.category);
            }
            return self.frame_update(events);
        }

        let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        let object_points: Vec<Point> = self.objects.values().map(|o| o.position()).collect();
        let object_categories: Vec<Category> =
            self.objects.values().map(|o| o.category()).collect();
        let det_points: Vec<Point> = detections.iter().map(|d| d.position).collect();

        let dists = matching::distance_matrix(&object_points, &det_points);
        let AssignmentResult {
            matches,
            unmatched_rows,
            unmatched_cols,
        } = matching::greedy_assignment(&dists, self.config.max_distance, |row, col| {
            object_categories[row] == detections[col].category
        });

        for (row, col) in matches {
            self.apply_match(ids[row], detections[col].position, timestamp, &mut events);
        }

        // Only one side of the unmatched set is handled, depending on which
        // side is larger.
        if ids.len() >= detections.len() {
            for row in unmatched_rows {
                self.mark_missed(ids[row], timestamp, &mut events);
            }
            if !unmatched_cols.is_empty() {
                log::debug!("Discarding {} unmatched detections", unmatched_cols.len());
            }
        } else {
            for col in unmatched_cols {
                self.register(detections[col].position, detections[col].category);
            }
        }

        self.frame_update(events)
    }

    fn frame_update(&self, events: Vec<TrackerEvent>) -> FrameUpdate {
        FrameUpdate {
            positions: self.positions(),
            events,
        }
    }

    pub fn positions(&self) -> BTreeMap<ObjectId, Point> {
        self.objects
            .iter()
            .map(|(&id, object)| (id, object.position()))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<ObjectSnapshot> {
        self.objects.values().map(TrackedObject::snapshot).collect()
    }

    /// Live in-kitchen counts, and delivered totals including live delivered objects.
    pub fn counts_by_roi(&self) -> RoiCounts {
        let mut in_kitchen = CategoryCounts::default();
        let mut delivered = self.ledger.permanent();
        for object in self.objects.values() {
            match object.zone_state() {
                ZoneState::InKitchen => in_kitchen.increment(object.category()),
                ZoneState::Delivered => delivered.increment(object.category()),
                ZoneState::Outside => {}
            }
        }
        RoiCounts {
            in_kitchen,
            delivered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 28, 16, 33, 22).unwrap()
    }

    fn tracker() -> CentroidTracker {
        CentroidTracker::new(TrackerConfig {
            kitchen_roi: vec![
                Point::new(0, 0),
                Point::new(100, 0),
                Point::new(100, 100),
                Point::new(0, 100),
            ],
            max_disappeared: 2,
            max_distance: 50.0,
            trail_length: 4,
            exit_margin_px: 5.0,
        })
        .unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        let tracker = CentroidTracker::new(TrackerConfig::default()).unwrap();
        assert_eq!(tracker.zone().vertices().len(), 12);
    }

    #[test]
    fn test_rejects_bad_tuning() {
        let config = TrackerConfig {
            max_distance: 0.0,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            CentroidTracker::new(config),
            Err(TrackError::InvalidConfig(_))
        ));

        let config = TrackerConfig {
            kitchen_roi: vec![Point::new(0, 0)],
            ..TrackerConfig::default()
        };
        assert!(matches!(
            CentroidTracker::new(config),
            Err(TrackError::MalformedPolygon(_))
        ));
    }

    #[test]
    fn test_registration_sets_initial_zone() {
        let mut t = tracker();
        let inside = t.register(Point::new(50, 50), Category::Food);
        let outside = t.register(Point::new(300, 300), Category::Food);
        assert_eq!(t.get(inside).unwrap().zone_state(), ZoneState::InKitchen);
        assert_eq!(t.get(outside).unwrap().zone_state(), ZoneState::Outside);
    }

    #[test]
    fn test_fewer_detections_discards_unmatched() {
        let mut t = tracker();
        t.update(
            &[
                Detection::new(10, 10, Category::Food),
                Detection::new(80, 80, Category::Food),
            ],
            ts(),
        );
        // Two objects, two detections: one matches, the other is a different
        // category and far away. No new object is created.
        let update = t.update(
            &[
                Detection::new(12, 10, Category::Food),
                Detection::new(400, 400, Category::Drink),
            ],
            ts(),
        );
        assert_eq!(update.positions.len(), 2);
        assert_eq!(t.get(0).unwrap().position(), Point::new(12, 10));
        assert_eq!(t.get(1).unwrap().disappearance_count(), 1);
    }

    #[test]
    fn test_more_detections_registers_and_spares_rows() {
        let mut t = tracker();
        t.update(&[Detection::new(10, 10, Category::Food)], ts());
        // The only object's nearest detection is a Drink, so it stays unmatched,
        // but with more detections than objects it is not aged.
        let update = t.update(
            &[
                Detection::new(11, 10, Category::Drink),
                Detection::new(90, 90, Category::Parcel),
            ],
            ts(),
        );
        assert_eq!(update.positions.len(), 3);
        assert_eq!(t.get(0).unwrap().disappearance_count(), 0);
        assert_eq!(t.get(1).unwrap().category(), Category::Drink);
        assert_eq!(t.get(2).unwrap().category(), Category::Parcel);
    }

    #[test]
    fn test_counts_by_roi_combines_live_and_permanent() {
        let mut t = tracker();
        t.update(
            &[
                Detection::new(50, 10, Category::Drink),
                Detection::new(90, 90, Category::Parcel),
            ],
            ts(),
        );
        let update = t.update(
            &[
                Detection::new(50, -10, Category::Drink),
                Detection::new(90, 92, Category::Parcel),
            ],
            ts(),
        );
        assert_eq!(update.deliveries().count(), 1);

        let counts = t.counts_by_roi();
        assert_eq!(counts.delivered.drinks, 1);
        assert_eq!(counts.in_kitchen.parcels, 1);
        assert_eq!(counts.in_kitchen.drinks, 0);
        assert_eq!(t.ledger().permanent().drinks, 0);
    }

    #[test]
    fn test_trail_follows_matches() {
        let mut t = tracker();
        for x in 0..6 {
            t.update(&[Detection::new(10 + x, 10, Category::Food)], ts());
        }
        let snap = t.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(
            snap[0].trail,
            vec![
                Point::new(12, 10),
                Point::new(13, 10),
                Point::new(14, 10),
                Point::new(15, 10)
            ]
        );
    }
}
