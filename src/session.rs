use chrono::NaiveDate;
use tracing::{info, warn};
use ulid::Ulid;

use crate::config::GridConfig;
use crate::drag::{DragContext, DragController, DragStart, DragState, DropPreview};
use crate::error::EngineError;
use crate::gateway::{CalendarDataProvider, SchedulingMutationGateway};
use crate::grid::{assemble_grid, GridLayout};
use crate::model::{DaySnapshot, MoveProposal, Ms};
use crate::observability::SNAPSHOT_FETCHES_TOTAL;
use crate::workflow::MoveWorkflow;

/// Result of a confirmed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub proposal: MoveProposal,
    /// False when the post-commit re-fetch failed; the old snapshot is still shown
    /// and the caller should `refresh`.
    pub refreshed: bool,
}

/// One day's schedule for one tenant: the settled snapshot, its grid, and the
/// drag/confirm state layered on top.
#[derive(Debug)]
pub struct Scheduler {
    config: GridConfig,
    snapshot: DaySnapshot,
    grid: GridLayout,
    drag: DragController,
    workflow: MoveWorkflow,
}

impl Scheduler {
    pub fn new(snapshot: DaySnapshot, config: GridConfig) -> Result<Self, EngineError> {
        let grid = assemble_grid(&snapshot, &config)?;
        Ok(Self {
            config,
            snapshot,
            grid,
            drag: DragController::new(),
            workflow: MoveWorkflow::new(config.overlap_policy),
        })
    }

    pub async fn load<P>(provider: &P, date: NaiveDate, config: GridConfig) -> Result<Self, EngineError>
    where
        P: CalendarDataProvider + ?Sized,
    {
        let snapshot = fetch(provider, date).await?;
        Self::new(snapshot, config)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &DaySnapshot {
        &self.snapshot
    }

    pub fn grid(&self) -> &GridLayout {
        &self.grid
    }

    pub fn date(&self) -> NaiveDate {
        self.snapshot.date
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn pending(&self) -> Option<&MoveProposal> {
        self.workflow.pending()
    }

    /// Adopt a new snapshot. Any drag or pending move refers to the old one and is dropped.
    /// On failure nothing changes.
    pub fn replace_snapshot(&mut self, snapshot: DaySnapshot) -> Result<(), EngineError> {
        let grid = assemble_grid(&snapshot, &self.config)?;
        let dragging = self.drag.cancel_drag().is_some();
        let pending = self.workflow.cancel().is_some();
        if dragging || pending {
            info!("snapshot for {} replaced; in-progress move discarded", snapshot.date);
        }
        self.snapshot = snapshot;
        self.grid = grid;
        Ok(())
    }

    pub async fn refresh<P>(&mut self, provider: &P) -> Result<(), EngineError>
    where
        P: CalendarDataProvider + ?Sized,
    {
        let snapshot = fetch(provider, self.snapshot.date).await?;
        self.replace_snapshot(snapshot)
    }

    pub fn begin_drag(&mut self, id: Ulid) -> Result<DragStart, EngineError> {
        if self.workflow.has_pending() {
            return Err(EngineError::InvalidOperation("a move is already awaiting confirmation"));
        }
        self.drag.begin_drag(&self.grid, id)
    }

    pub fn hover(&self, resource_id: Ulid, raw: Ms) -> Result<DropPreview, EngineError> {
        self.drag.hover(&self.grid, resource_id, raw)
    }

    /// Drop the dragged booking. `None` when it landed where it started.
    pub fn drop_on(&mut self, resource_id: Ulid, raw: Ms) -> Result<Option<MoveProposal>, EngineError> {
        let proposal = self.drag.resolve_drop(&self.grid, resource_id, raw)?;
        if proposal.is_noop() {
            return Ok(None);
        }
        self.workflow.propose(&self.grid, proposal).map(Some)
    }

    pub fn cancel_drag(&mut self) -> Option<DragContext> {
        self.drag.cancel_drag()
    }

    pub fn cancel_move(&mut self) -> Option<MoveProposal> {
        self.workflow.cancel()
    }

    /// The grid as it would look after the pending move. For display only; the
    /// settled snapshot is untouched.
    pub fn preview_pending(&self) -> Result<Option<GridLayout>, EngineError> {
        self.workflow
            .pending()
            .map(|p| assemble_grid(&self.snapshot.with_move(p), &self.config))
            .transpose()
    }

    /// Commit the pending move, then re-fetch the day from the provider.
    pub async fn confirm_move<G, P>(&mut self, gateway: &G, provider: &P) -> Result<MoveOutcome, EngineError>
    where
        G: SchedulingMutationGateway + ?Sized,
        P: CalendarDataProvider + ?Sized,
    {
        let committed = self.workflow.confirm(gateway).await?;
        let refreshed = match self.refresh(provider).await {
            Ok(()) => true,
            Err(e) => {
                warn!("move of booking {} committed but refresh failed: {e}", committed.proposal.booking_id);
                false
            }
        };
        Ok(MoveOutcome {
            proposal: committed.proposal,
            refreshed,
        })
    }
}

async fn fetch<P>(provider: &P, date: NaiveDate) -> Result<DaySnapshot, EngineError>
where
    P: CalendarDataProvider + ?Sized,
{
    match provider.fetch_day(date).await {
        Ok(snapshot) => {
            metrics::counter!(SNAPSHOT_FETCHES_TOTAL, "status" => "ok").increment(1);
            Ok(snapshot)
        }
        Err(e) => {
            metrics::counter!(SNAPSHOT_FETCHES_TOTAL, "status" => "error").increment(1);
            warn!("fetching {date} failed: {e}");
            Err(EngineError::FetchFailed(e.to_string()))
        }
    }
}
