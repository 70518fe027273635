use async_trait::async_trait;
use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::{DaySnapshot, MoveRequest};

/// Acknowledgement of a committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveAck {
    pub booking_id: Ulid,
}

/// Why the gateway refused a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveRejection {
    /// The destination is occupied in server state.
    Conflict(String),
    /// Network, validation or any other failure.
    Failed(String),
}

impl std::fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveRejection::Conflict(msg) => write!(f, "conflict: {msg}"),
            MoveRejection::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

impl std::error::Error for MoveRejection {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError(pub String);

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ProviderError {}

/// Source of day snapshots. One request per call, no retries here.
#[async_trait]
pub trait CalendarDataProvider: Send + Sync {
    async fn fetch_day(&self, date: NaiveDate) -> Result<DaySnapshot, ProviderError>;
}

/// Authoritative store for moves. Recomputes the end time from the booking's duration.
#[async_trait]
pub trait SchedulingMutationGateway: Send + Sync {
    async fn move_booking(&self, request: MoveRequest) -> Result<MoveAck, MoveRejection>;
}
