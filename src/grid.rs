use std::collections::HashSet;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::axis::TimeAxis;
use crate::config::{GridConfig, OverlapPolicy};
use crate::error::EngineError;
use crate::lane::{build_lane, Lane, LaneItem};
use crate::model::*;

/// One lane item placed on the axis, in slot units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedItem {
    pub id: Option<Ulid>,
    pub item: LaneItem,
    pub offset: i64,
    pub extent: f64,
    /// Sub-column within an overlap cluster; `(0, 1)` on a settled lane.
    pub column: usize,
    pub columns: usize,
    /// Intersects the visible hours. Invisible items are still present.
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceLayout {
    pub resource: Resource,
    pub lane: Lane,
    pub items: Vec<PlacedItem>,
}

/// The only structure handed to the view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLayout {
    pub date: NaiveDate,
    pub config: GridConfig,
    /// Slot boundaries for the time gutter.
    pub axis: Vec<Ms>,
    /// In snapshot order.
    pub resources: Vec<ResourceLayout>,
    /// Items whose resource is not in the snapshot.
    pub unassigned: Vec<LaneItem>,
    #[serde(skip)]
    time_axis: TimeAxis,
}

/// Reject data no layout can represent: duplicate ids (bookings and blocks
/// together) and empty or inverted intervals.
pub fn validate_snapshot(snapshot: &DaySnapshot) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for r in &snapshot.resources {
        if !seen.insert(r.id) {
            return Err(EngineError::InvalidSnapshot(format!("duplicate resource {}", r.id)));
        }
    }
    seen.clear();
    for b in &snapshot.bookings {
        if !seen.insert(b.id) {
            return Err(EngineError::InvalidSnapshot(format!("duplicate booking {}", b.id)));
        }
        if b.end_at <= b.start_at {
            return Err(EngineError::InvalidSnapshot(format!(
                "booking {} ends at or before its start",
                b.id
            )));
        }
    }
    // bookings and blocks share one id space
    for bl in &snapshot.blocks {
        if let Some(id) = bl.id
            && !seen.insert(id)
        {
            return Err(EngineError::InvalidSnapshot(format!("duplicate item id {id}")));
        }
        if bl.end_at <= bl.start_at {
            return Err(EngineError::InvalidSnapshot(format!(
                "block on resource {} ends at or before its start",
                bl.resource_id
            )));
        }
    }
    Ok(())
}

/// Lay out one day. Pure function of its inputs.
pub fn assemble_grid(snapshot: &DaySnapshot, config: &GridConfig) -> Result<GridLayout, EngineError> {
    let started = Instant::now();
    validate_snapshot(snapshot)?;
    let axis = TimeAxis::new(snapshot.date, config.axis)?;
    let window = axis.visible_span();

    let mut resources = Vec::with_capacity(snapshot.resources.len());
    for resource in &snapshot.resources {
        let lane = build_lane(resource.id, &snapshot.bookings, &snapshot.blocks);

        let pairs = lane.overlapping_pairs();
        if let Some(&(first, second)) = pairs.first() {
            match config.overlap_policy {
                OverlapPolicy::Strict => {
                    return Err(EngineError::OverlapOnSettle {
                        resource_id: resource.id,
                        first,
                        second,
                    });
                }
                OverlapPolicy::Advisory => warn!(
                    "resource {} has {} overlapping interval pair(s) on {}",
                    resource.id,
                    pairs.len(),
                    snapshot.date
                ),
            }
        }

        let items = lane
            .intervals
            .iter()
            .zip(lane.pack_columns())
            .map(|(interval, (column, columns))| {
                let pos = axis.position_of(interval.span.start, interval.span.end);
                PlacedItem {
                    id: interval.id,
                    item: interval.item.clone(),
                    offset: pos.offset,
                    extent: pos.extent,
                    column,
                    columns,
                    visible: interval.span.overlaps(&window),
                }
            })
            .collect();

        resources.push(ResourceLayout {
            resource: resource.clone(),
            lane,
            items,
        });
    }

    let known: HashSet<Ulid> = snapshot.resources.iter().map(|r| r.id).collect();
    let mut unassigned: Vec<LaneItem> = snapshot
        .bookings
        .iter()
        .filter(|b| !known.contains(&b.resource_id))
        .map(|b| LaneItem::Booking(b.clone()))
        .collect();
    unassigned.extend(
        snapshot
            .blocks
            .iter()
            .filter(|bl| !known.contains(&bl.resource_id))
            .map(|bl| LaneItem::Block(bl.clone())),
    );
    if !unassigned.is_empty() {
        warn!(
            "{} item(s) on {} reference resources missing from the snapshot",
            unassigned.len(),
            snapshot.date
        );
    }

    metrics::histogram!(crate::observability::GRID_ASSEMBLY_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());
    debug!(
        "assembled grid for {}: {} lanes, {} slots",
        snapshot.date,
        resources.len(),
        axis.total_slots()
    );

    Ok(GridLayout {
        date: snapshot.date,
        config: *config,
        axis: axis.enumerate_slots(),
        resources,
        unassigned,
        time_axis: axis,
    })
}

impl GridLayout {
    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn resource_layout(&self, resource_id: &Ulid) -> Option<&ResourceLayout> {
        self.resources.iter().find(|r| r.resource.id == *resource_id)
    }

    pub fn lane(&self, resource_id: &Ulid) -> Option<&Lane> {
        self.resource_layout(resource_id).map(|r| &r.lane)
    }

    pub fn contains_resource(&self, resource_id: &Ulid) -> bool {
        self.resource_layout(resource_id).is_some()
    }

    /// A booking placed on one of the lanes.
    pub fn find_booking(&self, id: &Ulid) -> Option<&Booking> {
        self.resources.iter().find_map(|r| r.lane.booking(id))
    }

    pub fn find_block(&self, id: &Ulid) -> Option<&BusyBlock> {
        self.resources.iter().find_map(|r| r.lane.block(id))
    }

    /// `(resource, first, second)` for every overlapping pair on every lane.
    pub fn settle_violations(&self) -> Vec<(Ulid, Option<Ulid>, Option<Ulid>)> {
        self.resources
            .iter()
            .flat_map(|r| {
                r.lane
                    .overlapping_pairs()
                    .into_iter()
                    .map(move |(a, b)| (r.resource.id, a, b))
            })
            .collect()
    }

    /// Open time on a lane within the visible hours.
    pub fn free_spans(&self, resource_id: &Ulid) -> Option<Vec<Span>> {
        self.lane(resource_id)
            .map(|lane| lane.free_spans(self.time_axis.visible_span()))
    }
}
