use serde::{Deserialize, Serialize};

use crate::axis::AxisParams;
use crate::error::EngineError;

/// How a move into occupied time is treated before it reaches the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Overlap is flagged on the proposal; the user may still confirm (overbooking).
    #[default]
    Advisory,
    /// Overlap rejects the proposal, and an overlapping snapshot fails to assemble.
    Strict,
}

impl OverlapPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advisory" => Some(OverlapPolicy::Advisory),
            "strict" => Some(OverlapPolicy::Strict),
            _ => None,
        }
    }
}

/// Caller-owned view settings handed to every assembly. No ambient state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub axis: AxisParams,
    pub overlap_policy: OverlapPolicy,
}

impl GridConfig {
    pub fn new(axis: AxisParams, overlap_policy: OverlapPolicy) -> Self {
        Self {
            axis,
            overlap_policy,
        }
    }

    /// Read `SLOTGRID_SLOT_MINUTES`, `SLOTGRID_START_HOUR`, `SLOTGRID_END_HOUR` and
    /// `SLOTGRID_OVERLAP_POLICY`. Unset or unparsable values fall back to defaults.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EngineError> {
        let defaults = AxisParams::default();
        let num = |key: &str, default: u32| -> u32 {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };
        let axis = AxisParams::new(
            num("SLOTGRID_SLOT_MINUTES", defaults.slot_minutes),
            num("SLOTGRID_START_HOUR", defaults.start_hour),
            num("SLOTGRID_END_HOUR", defaults.end_hour),
        )?;
        let overlap_policy = match lookup("SLOTGRID_OVERLAP_POLICY") {
            Some(raw) => OverlapPolicy::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("unknown SLOTGRID_OVERLAP_POLICY {raw:?}, using advisory");
                OverlapPolicy::Advisory
            }),
            None => OverlapPolicy::Advisory,
        };
        Ok(Self {
            axis,
            overlap_policy,
        })
    }
}
