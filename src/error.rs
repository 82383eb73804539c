//! Error types for the tracker and the event sink.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackError>;

/// Why a kitchen polygon was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolygonDefect {
    TooFewVertices { count: usize },
    /// Edge `edge` joins a vertex to an identical copy of itself
    DegenerateEdge { edge: usize },
    ZeroArea,
    SelfIntersecting { first_edge: usize, second_edge: usize },
}

impl std::fmt::Display for PolygonDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewVertices { count } => {
                write!(f, "need at least 3 vertices, got {}", count)
            }
            Self::DegenerateEdge { edge } => {
                write!(f, "edge {} has zero length (repeated vertex)", edge)
            }
            Self::ZeroArea => write!(f, "polygon has zero area"),
            Self::SelfIntersecting {
                first_edge,
                second_edge,
            } => write!(f, "edges {} and {} intersect", first_edge, second_edge),
        }
    }
}

/// Errors raised by the tracker, its configuration and detection parsing.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Unknown detection category: {0:?}")]
    InvalidCategory(String),

    #[error("Malformed kitchen polygon: {0}")]
    MalformedPolygon(PolygonDefect),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Errors reported by an event sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Sink call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Sink rejected event: {0}")]
    Rejected(String),

    #[error("Sink IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sink writer is closed")]
    Closed,
}

impl SinkError {
    /// Whether retrying the same event may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SinkError::Timeout(Duration::from_millis(5)).is_transient());
        assert!(SinkError::Unavailable("down".into()).is_transient());
        assert!(!SinkError::Rejected("bad row".into()).is_transient());
        assert!(!SinkError::Closed.is_transient());
    }

    #[test]
    fn test_polygon_defect_message() {
        let err = TrackError::MalformedPolygon(PolygonDefect::TooFewVertices { count: 2 });
        assert_eq!(
            err.to_string(),
            "Malformed kitchen polygon: need at least 3 vertices, got 2"
        );

        let err = TrackError::MalformedPolygon(PolygonDefect::DegenerateEdge { edge: 3 });
        assert_eq!(
            err.to_string(),
            "Malformed kitchen polygon: edge 3 has zero length (repeated vertex)"
        );
    }
}
