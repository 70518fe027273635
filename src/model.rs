use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds of wall-clock time. The only time type.
pub type Ms = i64;

pub const MINUTE_MS: Ms = 60_000;
pub const HOUR_MS: Ms = 60 * MINUTE_MS;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// Midnight of `date` as wall-clock milliseconds.
pub fn midnight_ms(date: NaiveDate) -> Ms {
    date.and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
}

// ── Booking status ───────────────────────────────────────────────

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

/// Coarse visual category for a status. The view maps these to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Pending,
    Active,
    Done,
    Inactive,
}

impl BookingStatus {
    /// Completed, cancelled and no-show bookings are settled history.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    pub fn is_draggable(self) -> bool {
        !self.is_terminal()
    }

    pub fn tone(self) -> StatusTone {
        match self {
            BookingStatus::Pending => StatusTone::Pending,
            BookingStatus::Confirmed | BookingStatus::CheckedIn | BookingStatus::InProgress => {
                StatusTone::Active
            }
            BookingStatus::Completed => StatusTone::Done,
            BookingStatus::Cancelled | BookingStatus::NoShow => StatusTone::Inactive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }
}

// ── Snapshot entities ────────────────────────────────────────────

/// A professional; one lane on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Ulid,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Ulid,
    pub resource_id: Ulid,
    pub start_at: Ms,
    pub end_at: Ms,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
    #[serde(default)]
    pub item_summaries: Vec<String>,
}

impl Booking {
    pub fn span(&self) -> Span {
        Span::new(self.start_at, self.end_at)
    }

    pub fn duration_ms(&self) -> Ms {
        self.end_at - self.start_at
    }
}

/// Occupied time that is not an appointment (break, personal time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusyBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Ulid>,
    pub resource_id: Ulid,
    pub start_at: Ms,
    pub end_at: Ms,
    #[serde(default)]
    pub reason: String,
}

impl BusyBlock {
    pub fn span(&self) -> Span {
        Span::new(self.start_at, self.end_at)
    }
}

/// Everything the provider knows about one day. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub blocks: Vec<BusyBlock>,
}

impl DaySnapshot {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            resources: Vec::new(),
            bookings: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn booking(&self, id: &Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == *id)
    }

    /// A new snapshot with one booking moved. `self` is left untouched.
    pub fn with_move(&self, proposal: &MoveProposal) -> DaySnapshot {
        let mut next = self.clone();
        if let Some(b) = next.bookings.iter_mut().find(|b| b.id == proposal.booking_id) {
            b.resource_id = proposal.to_resource_id;
            b.start_at = proposal.to_start;
            b.end_at = proposal.to_end;
        }
        next
    }
}

// ── Moves ────────────────────────────────────────────────────────

/// A dropped, not yet committed, move of one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveProposal {
    pub booking_id: Ulid,
    pub from_resource_id: Ulid,
    pub to_resource_id: Ulid,
    pub from_start: Ms,
    pub to_start: Ms,
    pub to_end: Ms,
    /// Destination overlaps another interval. Set by the workflow.
    pub conflict: bool,
}

impl MoveProposal {
    pub fn to_span(&self) -> Span {
        Span::new(self.to_start, self.to_end)
    }

    pub fn is_noop(&self) -> bool {
        self.from_resource_id == self.to_resource_id && self.from_start == self.to_start
    }

    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            booking_id: self.booking_id,
            new_resource_id: self.to_resource_id,
            new_start: self.to_start,
        }
    }
}

/// What the mutation gateway receives. End time is derived server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub booking_id: Ulid,
    pub new_resource_id: Ulid,
    pub new_start: Ms,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
    }

    fn booking(resource_id: Ulid, start: Ms, end: Ms) -> Booking {
        Booking {
            id: Ulid::new(),
            resource_id,
            start_at: start,
            end_at: end,
            status: BookingStatus::Confirmed,
            client_ref: None,
            item_summaries: Vec::new(),
        }
    }

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
    }

    #[test]
    fn midnight_is_day_aligned() {
        let m = midnight_ms(day());
        assert_eq!(m % (24 * HOUR_MS), 0);
        let next = midnight_ms(day().succ_opt().unwrap());
        assert_eq!(next - m, 24 * HOUR_MS);
    }

    #[test]
    fn terminal_statuses() {
        use BookingStatus::*;
        for s in [Completed, Cancelled, NoShow] {
            assert!(s.is_terminal());
            assert!(!s.is_draggable());
        }
        for s in [Pending, Confirmed, CheckedIn, InProgress] {
            assert!(!s.is_terminal());
            assert!(s.is_draggable());
        }
    }

    #[test]
    fn status_tones() {
        assert_eq!(BookingStatus::Pending.tone(), StatusTone::Pending);
        assert_eq!(BookingStatus::InProgress.tone(), StatusTone::Active);
        assert_eq!(BookingStatus::Completed.tone(), StatusTone::Done);
        assert_eq!(BookingStatus::NoShow.tone(), StatusTone::Inactive);
    }

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_string(&BookingStatus::CheckedIn).unwrap();
        assert_eq!(json, "\"checked_in\"");
        assert_eq!(BookingStatus::CheckedIn.as_str(), "checked_in");
        let unknown: Result<BookingStatus, _> = serde_json::from_str("\"tentative\"");
        assert!(unknown.is_err());
    }

    #[test]
    fn snapshot_deserializes_camel_case() {
        let r = Ulid::new();
        let b = Ulid::new();
        let json = format!(
            r#"{{
                "date": "2024-03-11",
                "resources": [{{ "id": "{r}", "displayName": "Ana" }}],
                "bookings": [{{
                    "id": "{b}", "resourceId": "{r}",
                    "startAt": 1000, "endAt": 2000, "status": "in_progress",
                    "itemSummaries": ["Cut"]
                }}],
                "blocks": [{{ "resourceId": "{r}", "startAt": 3000, "endAt": 4000, "reason": "lunch" }}]
            }}"#
        );
        let snap: DaySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap.date, day());
        assert_eq!(snap.resources[0].display_name, "Ana");
        assert_eq!(snap.bookings[0].status, BookingStatus::InProgress);
        assert_eq!(snap.bookings[0].item_summaries, vec!["Cut".to_string()]);
        assert_eq!(snap.blocks[0].id, None);
        assert_eq!(snap.blocks[0].reason, "lunch");
    }

    #[test]
    fn with_move_leaves_original_untouched() {
        let r1 = Ulid::new();
        let r2 = Ulid::new();
        let mut snap = DaySnapshot::empty(day());
        let b = booking(r1, 9 * HOUR_MS, 9 * HOUR_MS + 30 * MINUTE_MS);
        let id = b.id;
        snap.bookings.push(b);

        let proposal = MoveProposal {
            booking_id: id,
            from_resource_id: r1,
            to_resource_id: r2,
            from_start: 9 * HOUR_MS,
            to_start: 10 * HOUR_MS,
            to_end: 10 * HOUR_MS + 30 * MINUTE_MS,
            conflict: false,
        };
        let moved = snap.with_move(&proposal);

        assert_eq!(snap.booking(&id).unwrap().resource_id, r1);
        assert_eq!(snap.booking(&id).unwrap().start_at, 9 * HOUR_MS);
        let nb = moved.booking(&id).unwrap();
        assert_eq!(nb.resource_id, r2);
        assert_eq!(nb.span(), Span::new(10 * HOUR_MS, 10 * HOUR_MS + 30 * MINUTE_MS));
    }

    #[test]
    fn proposal_request_drops_end() {
        let p = MoveProposal {
            booking_id: Ulid::new(),
            from_resource_id: Ulid::new(),
            to_resource_id: Ulid::new(),
            from_start: 0,
            to_start: HOUR_MS,
            to_end: 2 * HOUR_MS,
            conflict: true,
        };
        let req = p.request();
        assert_eq!(req.booking_id, p.booking_id);
        assert_eq!(req.new_resource_id, p.to_resource_id);
        assert_eq!(req.new_start, HOUR_MS);
        assert!(!p.is_noop());
    }
}
