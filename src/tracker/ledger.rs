//! Delivery events and the permanent per-category delivery totals.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::tracker::category::{Category, CategoryCounts};
use crate::tracker::tracked_object::ObjectId;
use crate::tracker::zone::ZoneTransition;

/// Direction of a delivery event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "i32")]
pub enum Delta {
    /// Left the kitchen (+1)
    Delivered,
    /// Came back into the kitchen (-1)
    Returned,
}

impl Delta {
    pub fn value(self) -> i32 {
        match self {
            Delta::Delivered => 1,
            Delta::Returned => -1,
        }
    }
}

impl From<Delta> for i32 {
    fn from(delta: Delta) -> Self {
        delta.value()
    }
}

/// `(category, ±1, timestamp)` notification handed to the event sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryEvent {
    pub object_id: ObjectId,
    pub category: Category,
    pub delta: Delta,
    pub timestamp: DateTime<Utc>,
    /// Clip or stream the event was observed in
    pub source: Option<String>,
}

impl DeliveryEvent {
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }
}

/// Everything the tracker reports about one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// A delivery or a return correction, forwarded to the sink.
    Delivery(DeliveryEvent),
    /// A delivered object was deregistered and its delivery became permanent.
    Finalized {
        object_id: ObjectId,
        category: Category,
        timestamp: DateTime<Utc>,
    },
}

impl TrackerEvent {
    pub fn as_delivery(&self) -> Option<&DeliveryEvent> {
        match self {
            TrackerEvent::Delivery(event) => Some(event),
            TrackerEvent::Finalized { .. } => None,
        }
    }
}

/// Live and total counts per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RoiCounts {
    /// Live objects currently in the kitchen
    pub in_kitchen: CategoryCounts,
    /// Permanent deliveries plus live delivered objects
    pub delivered: CategoryCounts,
}

/// Permanent delivery totals for objects already deregistered while delivered.
///
/// Live delivered objects are tracked through their zone state and only
/// reach these counters when they are deregistered.
#[derive(Debug, Clone, Default)]
pub struct DeliveryLedger {
    permanent: CategoryCounts,
}

impl DeliveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permanent(&self) -> CategoryCounts {
        self.permanent
    }

    /// Turn a zone transition into the event to emit, if any.
    pub fn record(
        &self,
        object_id: ObjectId,
        category: Category,
        transition: ZoneTransition,
        timestamp: DateTime<Utc>,
    ) -> Option<DeliveryEvent> {
        let delta = match transition {
            ZoneTransition::Delivered => Delta::Delivered,
            ZoneTransition::Returned => Delta::Returned,
            ZoneTransition::None | ZoneTransition::Entered => return None,
        };
        match delta {
            Delta::Delivered => log::info!("Object {} ({}) delivered", object_id, category),
            Delta::Returned => {
                log::info!("Object {} ({}) re-entered the kitchen", object_id, category)
            }
        }
        Some(DeliveryEvent {
            object_id,
            category,
            delta,
            timestamp,
            source: None,
        })
    }

    /// Make the delivery of a deregistered object permanent.
    pub fn finalize(&mut self, category: Category) {
        self.permanent.increment(category);
    }

    /// Operator correction for a delivery that was already finalized, e.g. an
    /// item miscounted after its object left the frame. The tracker never calls
    /// this itself; returns before deregistration are handled by the zone
    /// machine. Clamps at zero.
    pub fn retract(&mut self, category: Category) {
        self.permanent.saturating_decrement(category);
    }
}
