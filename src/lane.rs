use serde::Serialize;
use ulid::Ulid;

use crate::model::*;

/// What occupies a stretch of a lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LaneItem {
    Booking(Booking),
    Block(BusyBlock),
}

impl LaneItem {
    pub fn is_booking(&self) -> bool {
        matches!(self, LaneItem::Booking(_))
    }

    pub fn as_booking(&self) -> Option<&Booking> {
        match self {
            LaneItem::Booking(b) => Some(b),
            LaneItem::Block(_) => None,
        }
    }
}

/// A single occupied interval. Bookings and busy blocks are both just intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaneInterval {
    /// `None` for busy blocks the provider did not name.
    pub id: Option<Ulid>,
    pub span: Span,
    pub item: LaneItem,
}

impl LaneInterval {
    fn is_booking_with(&self, id: Option<Ulid>) -> bool {
        self.item.is_booking() && id.is_some() && self.id == id
    }
}

/// One resource's column for a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lane {
    pub resource_id: Ulid,
    /// All intervals, sorted by `span.start`.
    pub intervals: Vec<LaneInterval>,
}

/// Filter a day's bookings and blocks down to one resource. Inputs are only read.
///
/// Equal starts keep bookings ahead of blocks, each in input order.
pub fn build_lane(resource_id: Ulid, bookings: &[Booking], blocks: &[BusyBlock]) -> Lane {
    let mut intervals: Vec<LaneInterval> = bookings
        .iter()
        .filter(|b| b.resource_id == resource_id)
        .map(|b| LaneInterval {
            id: Some(b.id),
            span: b.span(),
            item: LaneItem::Booking(b.clone()),
        })
        .collect();
    intervals.extend(
        blocks
            .iter()
            .filter(|bl| bl.resource_id == resource_id)
            .map(|bl| LaneInterval {
                id: bl.id,
                span: bl.span(),
                item: LaneItem::Block(bl.clone()),
            }),
    );
    intervals.sort_by_key(|i| i.span.start);
    Lane {
        resource_id,
        intervals,
    }
}

impl Lane {
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn booking(&self, id: &Ulid) -> Option<&Booking> {
        self.intervals
            .iter()
            .filter_map(|i| i.item.as_booking())
            .find(|b| b.id == *id)
    }

    pub fn block(&self, id: &Ulid) -> Option<&BusyBlock> {
        self.intervals.iter().find_map(|i| match &i.item {
            LaneItem::Block(bl) if bl.id.as_ref() == Some(id) => Some(bl),
            _ => None,
        })
    }

    /// Intervals whose span overlaps `[start, end)`.
    /// Uses binary search to skip intervals starting at or after `end`.
    pub fn overlapping(&self, start: Ms, end: Ms) -> impl Iterator<Item = &LaneInterval> {
        let right_bound = self.intervals.partition_point(|i| i.span.start < end);
        self.intervals[..right_bound]
            .iter()
            .filter(move |i| i.span.end > start)
    }

    /// The conflict primitive: does `[start, end)` hit anything other than the
    /// booking `exclude`? Blocks are never excluded.
    pub fn overlaps(&self, start: Ms, end: Ms, exclude: Option<Ulid>) -> bool {
        self.overlapping(start, end)
            .any(|i| !i.is_booking_with(exclude))
    }

    /// Ids of the named intervals `[start, end)` would collide with.
    pub fn conflicts_with(&self, start: Ms, end: Ms, exclude: Option<Ulid>) -> Vec<Ulid> {
        self.overlapping(start, end)
            .filter(|i| !i.is_booking_with(exclude))
            .filter_map(|i| i.id)
            .collect()
    }

    /// Every pair of intervals that overlap each other. Empty when the lane is settled.
    pub fn overlapping_pairs(&self) -> Vec<(Option<Ulid>, Option<Ulid>)> {
        let mut pairs = Vec::new();
        for (i, a) in self.intervals.iter().enumerate() {
            for b in self.intervals[i + 1..]
                .iter()
                .take_while(|b| b.span.start < a.span.end)
            {
                pairs.push((a.id, b.id));
            }
        }
        pairs
    }

    pub fn is_settled(&self) -> bool {
        self.overlapping_pairs().is_empty()
    }

    /// Unoccupied parts of `window`.
    pub fn free_spans(&self, window: Span) -> Vec<Span> {
        let occupied: Vec<Span> = self
            .overlapping(window.start, window.end)
            .map(|i| Span::new(i.span.start.max(window.start), i.span.end.min(window.end)))
            .collect();
        subtract_intervals(&[window], &merge_overlapping(&occupied))
    }

    /// Side-by-side placement for overlapping intervals.
    ///
    /// Returns `(column, columns)` per interval, index-aligned with `intervals`.
    /// `columns` is the width of the overlap cluster the interval belongs to, so a
    /// settled lane is all `(0, 1)`.
    pub fn pack_columns(&self) -> Vec<(usize, usize)> {
        let mut placement = vec![(0usize, 1usize); self.intervals.len()];
        let mut column_ends: Vec<Ms> = Vec::new();
        let mut cluster: Vec<usize> = Vec::new();
        let mut cluster_end: Ms = Ms::MIN;

        for (idx, interval) in self.intervals.iter().enumerate() {
            let span = interval.span;
            if !cluster.is_empty() && span.start >= cluster_end {
                close_cluster(&mut placement, &cluster, column_ends.len());
                cluster.clear();
                column_ends.clear();
            }
            let column = match column_ends.iter().position(|&end| end <= span.start) {
                Some(c) => {
                    column_ends[c] = span.end;
                    c
                }
                None => {
                    column_ends.push(span.end);
                    column_ends.len() - 1
                }
            };
            placement[idx].0 = column;
            cluster.push(idx);
            cluster_end = if cluster.len() == 1 {
                span.end
            } else {
                cluster_end.max(span.end)
            };
        }
        close_cluster(&mut placement, &cluster, column_ends.len());
        placement
    }
}

fn close_cluster(placement: &mut [(usize, usize)], cluster: &[usize], width: usize) {
    for &idx in cluster {
        placement[idx].1 = width.max(1);
    }
}

/// Merge sorted overlapping/adjacent intervals into disjoint intervals.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        merged.push(span);
    }
    merged
}

/// `base` minus `to_remove`. Both sorted and disjoint.
pub fn subtract_intervals(base: &[Span], to_remove: &[Span]) -> Vec<Span> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut current_start = b.start;
        let current_end = b.end;

        while ri < to_remove.len() && to_remove[ri].end <= current_start {
            ri += 1;
        }

        let mut j = ri;
        while j < to_remove.len() && to_remove[j].start < current_end {
            let r = &to_remove[j];
            if r.start > current_start {
                result.push(Span::new(current_start, r.start));
            }
            current_start = current_start.max(r.end);
            j += 1;
        }

        if current_start < current_end {
            result.push(Span::new(current_start, current_end));
        }
    }

    result
}
