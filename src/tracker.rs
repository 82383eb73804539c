mod category;
mod centroid_tracker;
mod ledger;
mod matching;
mod point;
mod tracked_object;
mod trail;
mod zone;

pub use category::{Category, CategoryCounts};
pub use centroid_tracker::{CentroidTracker, FrameUpdate, TrackerConfig};
pub use ledger::{Delta, DeliveryEvent, DeliveryLedger, RoiCounts, TrackerEvent};
pub use matching::{AssignmentResult, Detection, RawDetection, distance_matrix, greedy_assignment};
pub use point::Point;
pub use tracked_object::{ObjectId, ObjectSnapshot, TrackedObject};
pub use trail::Trail;
pub use zone::{KitchenZone, ZoneState, ZoneTransition};
