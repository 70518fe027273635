// ── Move workflow ───────────────────────────────────────────────

/// Counter: proposals raised. Labels: conflict ("true"/"false").
pub const MOVES_PROPOSED_TOTAL: &str = "slotgrid_moves_proposed_total";

/// Counter: moves acknowledged by the mutation gateway.
pub const MOVES_COMMITTED_TOTAL: &str = "slotgrid_moves_committed_total";

/// Counter: moves that did not commit. Labels: reason.
pub const MOVES_REJECTED_TOTAL: &str = "slotgrid_moves_rejected_total";

/// Counter: pending proposals abandoned by the user.
pub const MOVES_CANCELLED_TOTAL: &str = "slotgrid_moves_cancelled_total";

/// Histogram: gateway round trip in seconds.
pub const MOVE_GATEWAY_DURATION_SECONDS: &str = "slotgrid_move_gateway_duration_seconds";

// ── Grid ────────────────────────────────────────────────────────

/// Histogram: grid assembly time in seconds.
pub const GRID_ASSEMBLY_DURATION_SECONDS: &str = "slotgrid_grid_assembly_duration_seconds";

/// Counter: snapshot fetches. Labels: status.
pub const SNAPSHOT_FETCHES_TOTAL: &str = "slotgrid_snapshot_fetches_total";

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`).
/// Hosts that already own a subscriber should skip this.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
