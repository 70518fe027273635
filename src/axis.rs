//! Time axis: wall-clock instants ↔ slot indices for one day.
//!
//! Slot `n` starts at `start_hour:00 + n * slot_minutes` on the axis date.
//! Valid slots are `[0, total_slots)`. Nothing here clamps: instants outside the
//! visible hours produce out-of-range indices and callers decide what to do.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{midnight_ms, Ms, Span, MINUTE_MS};

/// Discretization of the visible day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisParams {
    pub slot_minutes: u32,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for AxisParams {
    fn default() -> Self {
        Self {
            slot_minutes: 15,
            start_hour: 7,
            end_hour: 22,
        }
    }
}

impl AxisParams {
    pub fn new(slot_minutes: u32, start_hour: u32, end_hour: u32) -> Result<Self, EngineError> {
        let params = Self {
            slot_minutes,
            start_hour,
            end_hour,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.slot_minutes == 0 || 60 % self.slot_minutes != 0 {
            return Err(EngineError::InvalidAxis("slot minutes must divide 60"));
        }
        if self.start_hour >= self.end_hour {
            return Err(EngineError::InvalidAxis("start hour must be before end hour"));
        }
        if self.end_hour > 24 {
            return Err(EngineError::InvalidAxis("end hour past midnight"));
        }
        Ok(())
    }

    pub fn total_slots(&self) -> i64 {
        ((self.end_hour - self.start_hour) * 60 / self.slot_minutes) as i64
    }
}

/// Axis parameters anchored to a concrete day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    params: AxisParams,
    date: NaiveDate,
    midnight: Ms,
}

/// Placement of an interval in slot units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub offset: i64,
    pub extent: f64,
}

impl TimeAxis {
    pub fn new(date: NaiveDate, params: AxisParams) -> Result<Self, EngineError> {
        params.validate()?;
        Ok(Self {
            params,
            date,
            midnight: midnight_ms(date),
        })
    }

    pub fn params(&self) -> &AxisParams {
        &self.params
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn total_slots(&self) -> i64 {
        self.params.total_slots()
    }

    fn slot_ms(&self) -> Ms {
        self.params.slot_minutes as Ms * MINUTE_MS
    }

    /// Whole minutes since the axis date's midnight. Negative before it.
    /// Saturates at the ends of `Ms`, which are out of range either way.
    pub fn minutes_since_midnight(&self, t: Ms) -> i64 {
        t.saturating_sub(self.midnight).div_euclid(MINUTE_MS)
    }

    pub fn slot_index_of(&self, t: Ms) -> i64 {
        let minutes = self.minutes_since_midnight(t) - self.params.start_hour as i64 * 60;
        minutes.div_euclid(self.params.slot_minutes as i64)
    }

    pub fn is_visible_slot(&self, n: i64) -> bool {
        (0..self.total_slots()).contains(&n)
    }

    /// True iff `t` is within `[start_hour, end_hour)` on the axis date.
    pub fn contains(&self, t: Ms) -> bool {
        self.visible_span().contains_instant(t)
    }

    pub fn position_of(&self, start: Ms, end: Ms) -> Position {
        let minutes = self.minutes_since_midnight(end) - self.minutes_since_midnight(start);
        Position {
            offset: self.slot_index_of(start),
            extent: minutes as f64 / self.params.slot_minutes as f64,
        }
    }

    pub fn time_at_slot(&self, n: i64) -> Ms {
        self.midnight + self.params.start_hour as Ms * 60 * MINUTE_MS + n * self.slot_ms()
    }

    /// Floor `t` to its slot boundary; out-of-range instants are rejected, not clamped.
    pub fn snap(&self, t: Ms) -> Result<Ms, EngineError> {
        let n = self.slot_index_of(t);
        if !self.is_visible_slot(n) {
            return Err(EngineError::OutOfRangeTime(t));
        }
        Ok(self.time_at_slot(n))
    }

    /// One boundary per slot start, covering `[start_hour, end_hour)`.
    pub fn enumerate_slots(&self) -> Vec<Ms> {
        (0..self.total_slots()).map(|n| self.time_at_slot(n)).collect()
    }

    pub fn visible_span(&self) -> Span {
        Span::new(self.time_at_slot(0), self.time_at_slot(self.total_slots()))
    }
}
