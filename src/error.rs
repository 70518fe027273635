use ulid::Ulid;

use crate::model::Ms;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Call-sequence misuse. Fix the caller; never retried.
    InvalidOperation(&'static str),
    OutOfRangeTime(Ms),
    SchedulingConflict {
        booking_id: Ulid,
        /// Locally detected conflicting intervals. Empty when the gateway reported it.
        conflicting: Vec<Ulid>,
    },
    MutationFailed(String),
    InvalidAxis(&'static str),
    InvalidSnapshot(String),
    OverlapOnSettle {
        resource_id: Ulid,
        first: Option<Ulid>,
        second: Option<Ulid>,
    },
    FetchFailed(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidOperation(msg) => write!(f, "invalid operation: {msg}"),
            EngineError::OutOfRangeTime(t) => write!(f, "time {t} outside visible hours"),
            EngineError::SchedulingConflict {
                booking_id,
                conflicting,
            } => {
                if conflicting.is_empty() {
                    write!(f, "scheduling conflict moving booking {booking_id}")
                } else {
                    write!(
                        f,
                        "scheduling conflict moving booking {booking_id}; overlaps: {conflicting:?}"
                    )
                }
            }
            EngineError::MutationFailed(e) => write!(f, "move failed: {e}"),
            EngineError::InvalidAxis(msg) => write!(f, "invalid axis parameters: {msg}"),
            EngineError::InvalidSnapshot(msg) => write!(f, "invalid snapshot: {msg}"),
            EngineError::OverlapOnSettle {
                resource_id,
                first,
                second,
            } => write!(
                f,
                "overlapping intervals on resource {resource_id}: {} and {}",
                fmt_opt_id(first),
                fmt_opt_id(second)
            ),
            EngineError::FetchFailed(e) => write!(f, "fetching day failed: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

fn fmt_opt_id(id: &Option<Ulid>) -> String {
    id.map_or_else(|| "<unnamed block>".to_string(), |id| id.to_string())
}
