//! Two-phase move commit: propose, then confirm against the mutation gateway.
//!
//! The in-memory snapshot is never patched here. A committed move tells the
//! caller to re-fetch; a failed one leaves the pre-drag layout in place.

use std::time::Instant;

use tracing::{info, warn};

use crate::config::OverlapPolicy;
use crate::error::EngineError;
use crate::gateway::{MoveAck, MoveRejection, SchedulingMutationGateway};
use crate::grid::GridLayout;
use crate::model::MoveProposal;
use crate::observability::*;

/// A move the gateway accepted. The caller must refresh the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedMove {
    pub proposal: MoveProposal,
    pub ack: MoveAck,
}

#[derive(Debug, Default)]
pub struct MoveWorkflow {
    policy: OverlapPolicy,
    pending: Option<MoveProposal>,
}

impl MoveWorkflow {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            policy,
            pending: None,
        }
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    pub fn pending(&self) -> Option<&MoveProposal> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Evaluate a dropped move against its destination lane and hold it for confirmation.
    pub fn propose(&mut self, grid: &GridLayout, mut proposal: MoveProposal) -> Result<MoveProposal, EngineError> {
        if self.pending.is_some() {
            return Err(EngineError::InvalidOperation("a move is already awaiting confirmation"));
        }
        let lane = grid
            .lane(&proposal.to_resource_id)
            .ok_or(EngineError::InvalidOperation("destination lane is not on this grid"))?;

        let span = proposal.to_span();
        let exclude = Some(proposal.booking_id);
        proposal.conflict = lane.overlaps(span.start, span.end, exclude);

        if proposal.conflict && self.policy == OverlapPolicy::Strict {
            metrics::counter!(MOVES_REJECTED_TOTAL, "reason" => "local_conflict").increment(1);
            return Err(EngineError::SchedulingConflict {
                booking_id: proposal.booking_id,
                conflicting: lane.conflicts_with(span.start, span.end, exclude),
            });
        }

        metrics::counter!(
            MOVES_PROPOSED_TOTAL,
            "conflict" => if proposal.conflict { "true" } else { "false" }
        )
        .increment(1);
        if proposal.conflict {
            warn!(
                "move of booking {} to {} at {} overlaps existing intervals",
                proposal.booking_id, proposal.to_resource_id, proposal.to_start
            );
        } else {
            info!(
                "move of booking {} to {} at {} awaiting confirmation",
                proposal.booking_id, proposal.to_resource_id, proposal.to_start
            );
        }
        self.pending = Some(proposal);
        Ok(proposal)
    }

    /// Send the pending move to the gateway. The proposal is consumed either way;
    /// rejections are surfaced, never retried.
    pub async fn confirm<G>(&mut self, gateway: &G) -> Result<CommittedMove, EngineError>
    where
        G: SchedulingMutationGateway + ?Sized,
    {
        let proposal = self
            .pending
            .take()
            .ok_or(EngineError::InvalidOperation("no move awaiting confirmation"))?;

        let started = Instant::now();
        let result = gateway.move_booking(proposal.request()).await;
        metrics::histogram!(MOVE_GATEWAY_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        match result {
            Ok(ack) => {
                metrics::counter!(MOVES_COMMITTED_TOTAL).increment(1);
                info!(
                    "booking {} moved to {} at {}",
                    proposal.booking_id, proposal.to_resource_id, proposal.to_start
                );
                Ok(CommittedMove { proposal, ack })
            }
            Err(MoveRejection::Conflict(msg)) => {
                metrics::counter!(MOVES_REJECTED_TOTAL, "reason" => "conflict").increment(1);
                warn!("gateway rejected move of booking {}: {msg}", proposal.booking_id);
                Err(EngineError::SchedulingConflict {
                    booking_id: proposal.booking_id,
                    conflicting: Vec::new(),
                })
            }
            Err(MoveRejection::Failed(msg)) => {
                metrics::counter!(MOVES_REJECTED_TOTAL, "reason" => "error").increment(1);
                warn!("move of booking {} failed: {msg}", proposal.booking_id);
                Err(EngineError::MutationFailed(msg))
            }
        }
    }

    /// Drop the pending move without contacting the gateway.
    pub fn cancel(&mut self) -> Option<MoveProposal> {
        let cancelled = self.pending.take();
        if let Some(p) = &cancelled {
            metrics::counter!(MOVES_CANCELLED_TOTAL).increment(1);
            info!("move of booking {} cancelled", p.booking_id);
        }
        cancelled
    }
}
