//! Drag-and-drop of bookings across lanes.
//!
//! `Idle -> Dragging -> Idle`. A drop becomes a [`MoveProposal`]; whether the
//! destination is free is decided later by the confirmation workflow.

use serde::Serialize;
use tracing::debug;
use ulid::Ulid;

use crate::error::EngineError;
use crate::grid::GridLayout;
use crate::model::*;

/// The booking being dragged, captured at drag start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragContext {
    pub booking_id: Ulid,
    pub from_resource_id: Ulid,
    pub original_start: Ms,
    pub original_end: Ms,
}

impl DragContext {
    pub fn duration_ms(&self) -> Ms {
        self.original_end - self.original_start
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragContext),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragStart {
    Started(DragContext),
    /// Busy blocks are not drag sources; nothing happened.
    Ignored,
}

/// Where the booking would land if dropped at the hovered point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropPreview {
    pub resource_id: Ulid,
    pub start: Ms,
    pub end: Ms,
    pub conflict: bool,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn active(&self) -> Option<&DragContext> {
        match &self.state {
            DragState::Dragging(ctx) => Some(ctx),
            DragState::Idle => None,
        }
    }

    pub fn begin_drag(&mut self, grid: &GridLayout, id: Ulid) -> Result<DragStart, EngineError> {
        if self.is_dragging() {
            return Err(EngineError::InvalidOperation("a drag is already in progress"));
        }
        if grid.find_block(&id).is_some() {
            return Ok(DragStart::Ignored);
        }
        let booking = grid
            .find_booking(&id)
            .ok_or(EngineError::InvalidOperation("booking is not on this grid"))?;
        if !booking.status.is_draggable() {
            debug!("booking {id} is {} and stays put", booking.status.as_str());
            return Err(EngineError::InvalidOperation("booking status does not allow moving"));
        }

        let ctx = DragContext {
            booking_id: booking.id,
            from_resource_id: booking.resource_id,
            original_start: booking.start_at,
            original_end: booking.end_at,
        };
        self.state = DragState::Dragging(ctx);
        debug!("drag started for booking {id}");
        Ok(DragStart::Started(ctx))
    }

    /// Preview a drop without ending the drag.
    pub fn hover(&self, grid: &GridLayout, resource_id: Ulid, raw: Ms) -> Result<DropPreview, EngineError> {
        let ctx = self
            .active()
            .ok_or(EngineError::InvalidOperation("no drag in progress"))?;
        let (start, end) = landing(ctx, grid, resource_id, raw)?;
        let conflict = grid
            .lane(&resource_id)
            .is_some_and(|lane| lane.overlaps(start, end, Some(ctx.booking_id)));
        Ok(DropPreview {
            resource_id,
            start,
            end,
            conflict,
        })
    }

    /// Finish the drag at `raw` on `resource_id`. The drag ends whether or not
    /// the drop is valid.
    pub fn resolve_drop(&mut self, grid: &GridLayout, resource_id: Ulid, raw: Ms) -> Result<MoveProposal, EngineError> {
        let DragState::Dragging(ctx) = self.state else {
            return Err(EngineError::InvalidOperation("no drag in progress"));
        };
        self.state = DragState::Idle;

        let (to_start, to_end) = landing(&ctx, grid, resource_id, raw)?;
        debug!("booking {} dropped on {resource_id} at {to_start}", ctx.booking_id);
        Ok(MoveProposal {
            booking_id: ctx.booking_id,
            from_resource_id: ctx.from_resource_id,
            to_resource_id: resource_id,
            from_start: ctx.original_start,
            to_start,
            to_end,
            conflict: false,
        })
    }

    /// Abandon the drag. Returns what was being dragged, if anything.
    pub fn cancel_drag(&mut self) -> Option<DragContext> {
        let previous = std::mem::take(&mut self.state);
        match previous {
            DragState::Dragging(ctx) => {
                debug!("drag cancelled for booking {}", ctx.booking_id);
                Some(ctx)
            }
            DragState::Idle => None,
        }
    }
}

/// Snapped start (floor to slot) and duration-preserving end on the target lane.
fn landing(ctx: &DragContext, grid: &GridLayout, resource_id: Ulid, raw: Ms) -> Result<(Ms, Ms), EngineError> {
    if !grid.contains_resource(&resource_id) {
        return Err(EngineError::InvalidOperation("drop target is not a lane on this grid"));
    }
    let start = grid.time_axis().snap(raw)?;
    Ok((start, start + ctx.duration_ms()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::config::GridConfig;
    use crate::grid::assemble_grid;

    const H: Ms = HOUR_MS;
    const M: Ms = MINUTE_MS;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
    }

    fn at(h: i64, m: i64) -> Ms {
        midnight_ms(day()) + h * H + m * M
    }

    struct Fixture {
        grid: GridLayout,
        r1: Ulid,
        r2: Ulid,
        b1: Ulid,
        b2: Ulid,
        done: Ulid,
        lunch: Ulid,
    }

    fn booking(resource_id: Ulid, start: Ms, end: Ms, status: BookingStatus) -> Booking {
        Booking {
            id: Ulid::new(),
            resource_id,
            start_at: start,
            end_at: end,
            status,
            client_ref: None,
            item_summaries: Vec::new(),
        }
    }

    fn fixture() -> Fixture {
        let r1 = Ulid::new();
        let r2 = Ulid::new();
        let b1 = booking(r1, at(9, 0), at(9, 30), BookingStatus::Confirmed);
        let b2 = booking(r1, at(10, 0), at(10, 30), BookingStatus::Pending);
        let done = booking(r2, at(8, 0), at(8, 45), BookingStatus::Completed);
        let lunch = BusyBlock {
            id: Some(Ulid::new()),
            resource_id: r2,
            start_at: at(12, 0),
            end_at: at(13, 0),
            reason: "lunch".into(),
        };
        let snap = DaySnapshot {
            date: day(),
            resources: vec![
                Resource { id: r1, display_name: "R1".into(), avatar_ref: None },
                Resource { id: r2, display_name: "R2".into(), avatar_ref: None },
            ],
            bookings: vec![b1.clone(), b2.clone(), done.clone()],
            blocks: vec![lunch.clone()],
        };
        Fixture {
            grid: assemble_grid(&snap, &GridConfig::default()).unwrap(),
            r1,
            r2,
            b1: b1.id,
            b2: b2.id,
            done: done.id,
            lunch: lunch.id.unwrap(),
        }
    }

    #[test]
    fn drop_snaps_down_and_preserves_duration() {
        let f = fixture();
        let mut drag = DragController::new();
        assert!(matches!(drag.begin_drag(&f.grid, f.b1), Ok(DragStart::Started(_))));

        let p = drag.resolve_drop(&f.grid, f.r1, at(10, 7)).unwrap();
        assert_eq!(p.to_start, at(10, 0));
        assert_eq!(p.to_end, at(10, 30));
        assert_eq!(p.to_end - p.to_start, 30 * M);
        assert_eq!(p.from_start, at(9, 0));
        assert_eq!(p.from_resource_id, f.r1);
        assert!(!p.conflict);
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn cross_resource_drop() {
        let f = fixture();
        let mut drag = DragController::new();
        drag.begin_drag(&f.grid, f.b1).unwrap();
        let p = drag.resolve_drop(&f.grid, f.r2, at(9, 0)).unwrap();
        assert_eq!(p.to_resource_id, f.r2);
        assert_eq!(p.to_start, at(9, 0));
        assert_eq!(p.to_end, at(9, 30));
    }

    #[test]
    fn out_of_range_drop_is_rejected_and_ends_drag() {
        let f = fixture();
        let mut drag = DragController::new();
        drag.begin_drag(&f.grid, f.b1).unwrap();
        let result = drag.resolve_drop(&f.grid, f.r1, at(23, 0));
        assert_eq!(result, Err(EngineError::OutOfRangeTime(at(23, 0))));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn drop_before_opening_is_rejected() {
        let f = fixture();
        let mut drag = DragController::new();
        drag.begin_drag(&f.grid, f.b1).unwrap();
        assert!(matches!(
            drag.resolve_drop(&f.grid, f.r1, at(6, 59)),
            Err(EngineError::OutOfRangeTime(_))
        ));
    }

    #[test]
    fn drop_at_extreme_timestamps_is_out_of_range() {
        let f = fixture();
        let mut drag = DragController::new();
        for raw in [Ms::MIN, Ms::MAX] {
            drag.begin_drag(&f.grid, f.b1).unwrap();
            assert_eq!(
                drag.hover(&f.grid, f.r1, raw),
                Err(EngineError::OutOfRangeTime(raw))
            );
            assert_eq!(
                drag.resolve_drop(&f.grid, f.r1, raw),
                Err(EngineError::OutOfRangeTime(raw))
            );
            assert!(!drag.is_dragging());
        }
    }

    #[test]
    fn drop_on_unknown_lane_is_invalid() {
        let f = fixture();
        let mut drag = DragController::new();
        drag.begin_drag(&f.grid, f.b1).unwrap();
        assert!(matches!(
            drag.resolve_drop(&f.grid, Ulid::new(), at(9, 0)),
            Err(EngineError::InvalidOperation(_))
        ));
    }

    #[test]
    fn second_drag_is_rejected_and_first_kept() {
        let f = fixture();
        let mut drag = DragController::new();
        drag.begin_drag(&f.grid, f.b1).unwrap();
        let result = drag.begin_drag(&f.grid, f.b2);
        assert!(matches!(result, Err(EngineError::InvalidOperation(_))));
        assert_eq!(drag.active().unwrap().booking_id, f.b1);
    }

    #[test]
    fn terminal_and_missing_bookings_not_draggable() {
        let f = fixture();
        let mut drag = DragController::new();
        assert!(matches!(drag.begin_drag(&f.grid, f.done), Err(EngineError::InvalidOperation(_))));
        assert!(matches!(drag.begin_drag(&f.grid, Ulid::new()), Err(EngineError::InvalidOperation(_))));
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn dragging_a_block_is_a_noop() {
        let f = fixture();
        let mut drag = DragController::new();
        assert_eq!(drag.begin_drag(&f.grid, f.lunch), Ok(DragStart::Ignored));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn drop_without_drag_is_invalid() {
        let f = fixture();
        let mut drag = DragController::new();
        assert!(matches!(
            drag.resolve_drop(&f.grid, f.r1, at(9, 0)),
            Err(EngineError::InvalidOperation(_))
        ));
    }

    #[test]
    fn cancel_returns_to_idle() {
        let f = fixture();
        let mut drag = DragController::new();
        assert!(drag.cancel_drag().is_none());
        drag.begin_drag(&f.grid, f.b1).unwrap();
        let ctx = drag.cancel_drag().unwrap();
        assert_eq!(ctx.booking_id, f.b1);
        assert_eq!(drag.state(), DragState::Idle);
        // a fresh drag is allowed afterwards
        assert!(drag.begin_drag(&f.grid, f.b2).is_ok());
    }

    #[test]
    fn hover_flags_conflicts_and_keeps_dragging() {
        let f = fixture();
        let mut drag = DragController::new();
        drag.begin_drag(&f.grid, f.b1).unwrap();

        let over_b2 = drag.hover(&f.grid, f.r1, at(10, 10)).unwrap();
        assert_eq!(over_b2.start, at(10, 0));
        assert!(over_b2.conflict);

        let over_self = drag.hover(&f.grid, f.r1, at(9, 14)).unwrap();
        assert!(!over_self.conflict);

        let over_lunch = drag.hover(&f.grid, f.r2, at(11, 45)).unwrap();
        assert!(over_lunch.conflict);

        assert!(drag.is_dragging());
    }
}
