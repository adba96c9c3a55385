//! Placement rows, tracked as sorted lists of free intervals ("subrows").
//!
//! Every row starts out as a single subrow covering all of its sites. As obstacles, taller rows
//! and legalized cells are carved out of it, subrows get truncated, split, deleted or lowered. The
//! height of a subrow is how much vertical room there is above it before something else starts,
//! which is what lets [`RowSet::continuous_and_empty`] stack a multi-row cell on top of several
//! rows.

use std::collections::HashSet;

use approx::abs_diff_eq;
use itertools::Itertools;
use nalgebra::Point2;

use crate::placement_cell::{Footprint, Rect, GEOMETRY_EPSILON};

pub mod coverage;
pub mod slicing;


/// A maximal free horizontal interval of a row.
#[derive(Clone, Debug, PartialEq)]
pub struct Subrow {
    pub start_x: f64,
    pub end_x: f64,
    /// Free vertical extent above this interval
    pub height: f64,
}

impl Subrow {
    pub fn width(&self) -> f64 {
        self.end_x - self.start_x
    }
}

#[derive(Clone, Debug)]
pub struct Row {
    origin: Point2<f64>,
    site_width: f64,
    num_sites: u32,
    /// Usable height, starts at the die top and may be capped by the row slicing.
    height: f64,
    subrows: Vec<Subrow>,
    /// Footprints that found no site anywhere in this row. Occupancy only ever grows, so a
    /// footprint rejected once never needs to be tried here again.
    rejected: HashSet<Footprint>,
}

impl Row {
    pub fn new(origin: Point2<f64>, site_width: f64, num_sites: u32, height: f64) -> Self {
        let end_x = origin.x + site_width * num_sites as f64;
        Self {
            origin,
            site_width,
            num_sites,
            height,
            subrows: vec![Subrow {
                start_x: origin.x,
                end_x,
                height,
            }],
            rejected: HashSet::new(),
        }
    }

    pub fn origin(&self) -> Point2<f64> {
        self.origin
    }

    pub fn y(&self) -> f64 {
        self.origin.y
    }

    pub fn start_x(&self) -> f64 {
        self.origin.x
    }

    pub fn end_x(&self) -> f64 {
        self.origin.x + self.span()
    }

    /// Total width covered by the sites of this row
    pub fn span(&self) -> f64 {
        self.site_width * self.num_sites as f64
    }

    pub fn site_width(&self) -> f64 {
        self.site_width
    }

    pub fn num_sites(&self) -> u32 {
        self.num_sites
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn subrows(&self) -> &[Subrow] {
        &self.subrows
    }

    /// Sum of the free subrow widths
    pub fn free_width(&self) -> f64 {
        self.subrows.iter().map(Subrow::width).sum()
    }

    /// Row geometry as a rectangle, using the current usable height.
    pub fn rect(&self) -> Rect {
        Rect::new(self.origin, self.span(), self.height)
    }

    /// X coordinate of site `index`
    pub fn site_x(&self, index: u32) -> f64 {
        self.origin.x + self.site_width * index as f64
    }

    /// Index of the first site at or after `x`.
    pub fn first_site_at_or_after(&self, x: f64) -> u32 {
        let sites = ((x - self.origin.x) / self.site_width - GEOMETRY_EPSILON).ceil();
        if sites <= 0.0 {
            0
        } else {
            sites as u32
        }
    }

    /// True if `x` sits on a site boundary of this row (the row end counts).
    pub fn is_site_aligned(&self, x: f64) -> bool {
        let sites = (x - self.origin.x) / self.site_width;
        abs_diff_eq!(sites, sites.round(), epsilon = GEOMETRY_EPSILON)
    }

    /// True if `[x0, x1]` lies inside the span of this row
    pub fn contains_span(&self, x0: f64, x1: f64) -> bool {
        x0 >= self.start_x() - GEOMETRY_EPSILON && x1 <= self.end_x() + GEOMETRY_EPSILON
    }

    pub fn has_rejected(&self, footprint: Footprint) -> bool {
        self.rejected.contains(&footprint)
    }

    pub fn add_rejected(&mut self, footprint: Footprint) {
        self.rejected.insert(footprint);
    }

    /// Lower the usable height of the row, and every subrow with it.
    pub fn cap_height(&mut self, height: f64) {
        self.height = self.height.min(height);
        for subrow in self.subrows.iter_mut() {
            subrow.height = subrow.height.min(height);
        }
    }

    /// Remove `rect` from the free space of this row.
    ///
    /// If the rectangle covers the bottom edge of the row, its x range is no longer free at all.
    /// If it starts somewhere above the bottom edge the x range stays free, but only up to the
    /// bottom of the rectangle. Rectangles entirely below the row don't affect it.
    pub fn carve(&mut self, rect: &Rect) {
        if rect.x1() <= self.start_x() + GEOMETRY_EPSILON
            || rect.x0() >= self.end_x() - GEOMETRY_EPSILON
            || rect.y1() <= self.y() + GEOMETRY_EPSILON
        {
            return;
        }

        if rect.y0() <= self.y() + GEOMETRY_EPSILON {
            self.occupy(rect.x0(), rect.x1());
        } else {
            self.limit_height(rect.x0(), rect.x1(), rect.y0() - self.y());
        }

        debug_assert!(self.check_subrows().is_ok(), "{:?}", self.check_subrows());
    }

    fn occupy(&mut self, x0: f64, x1: f64) {
        let mut subrows = Vec::with_capacity(self.subrows.len() + 1);
        for subrow in self.subrows.drain(..) {
            if subrow.end_x <= x0 + GEOMETRY_EPSILON || subrow.start_x >= x1 - GEOMETRY_EPSILON {
                subrows.push(subrow);
                continue;
            }
            if subrow.start_x < x0 - GEOMETRY_EPSILON {
                subrows.push(Subrow {
                    start_x: subrow.start_x,
                    end_x: x0,
                    height: subrow.height,
                });
            }
            if subrow.end_x > x1 + GEOMETRY_EPSILON {
                subrows.push(Subrow {
                    start_x: x1,
                    end_x: subrow.end_x,
                    height: subrow.height,
                });
            }
        }
        self.subrows = subrows;
    }

    fn limit_height(&mut self, x0: f64, x1: f64, height: f64) {
        let mut subrows = Vec::with_capacity(self.subrows.len() + 2);
        for subrow in self.subrows.drain(..) {
            if subrow.height <= height
                || subrow.end_x <= x0 + GEOMETRY_EPSILON
                || subrow.start_x >= x1 - GEOMETRY_EPSILON
            {
                subrows.push(subrow);
                continue;
            }

            let mid_start = subrow.start_x.max(x0);
            let mid_end = subrow.end_x.min(x1);
            if subrow.start_x < mid_start - GEOMETRY_EPSILON {
                subrows.push(Subrow {
                    start_x: subrow.start_x,
                    end_x: mid_start,
                    height: subrow.height,
                });
            }
            subrows.push(Subrow {
                start_x: mid_start,
                end_x: mid_end,
                height,
            });
            if subrow.end_x > mid_end + GEOMETRY_EPSILON {
                subrows.push(Subrow {
                    start_x: mid_end,
                    end_x: subrow.end_x,
                    height: subrow.height,
                });
            }
        }

        // Merge neighbours that touch and ended up with the same height
        self.subrows = subrows
            .into_iter()
            .coalesce(|a, b| {
                if abs_diff_eq!(a.end_x, b.start_x, epsilon = GEOMETRY_EPSILON)
                    && abs_diff_eq!(a.height, b.height, epsilon = GEOMETRY_EPSILON)
                {
                    Ok(Subrow {
                        start_x: a.start_x,
                        end_x: b.end_x,
                        height: a.height,
                    })
                } else {
                    Err((a, b))
                }
            })
            .collect();
    }

    /// Checks whether `[x0, x1]` is free, possibly across several touching subrows. Returns the
    /// height available over the whole range.
    pub fn can_place(&self, x0: f64, x1: f64) -> Option<f64> {
        if !self.contains_span(x0, x1) {
            return None;
        }

        let mut cursor = x0;
        let mut height = f64::INFINITY;
        for subrow in self.subrows.iter() {
            if subrow.end_x <= cursor + GEOMETRY_EPSILON {
                continue;
            }
            if subrow.start_x > cursor + GEOMETRY_EPSILON {
                // Gap between the last free space and this subrow
                return None;
            }
            height = height.min(subrow.height);
            cursor = subrow.end_x;
            if cursor >= x1 - GEOMETRY_EPSILON {
                return Some(height);
            }
        }

        None
    }

    /// Validate the subrow list: sorted, disjoint, non-empty intervals inside the row.
    pub fn check_subrows(&self) -> Result<(), String> {
        for subrow in self.subrows.iter() {
            if subrow.width() <= 0.0 {
                return Err(format!("Empty subrow {:?}", subrow));
            }
            if !self.contains_span(subrow.start_x, subrow.end_x) {
                return Err(format!(
                    "Subrow {:?} outside of row [{}, {}]",
                    subrow,
                    self.start_x(),
                    self.end_x()
                ));
            }
        }
        for (a, b) in self.subrows.iter().tuple_windows() {
            if a.end_x > b.start_x + GEOMETRY_EPSILON {
                return Err(format!("Subrows {:?} and {:?} overlap or are unsorted", a, b));
            }
        }
        Ok(())
    }
}

/// All rows of the design, sorted by start y and then start x.
#[derive(Clone, Debug, Default)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new(mut rows: Vec<Row>) -> Self {
        rows.sort_by(|a, b| {
            a.y()
                .total_cmp(&b.y())
                .then_with(|| a.start_x().total_cmp(&b.start_x()))
        });
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn row(&self, idx: usize) -> &Row {
        &self.rows[idx]
    }

    pub fn row_mut(&mut self, idx: usize) -> &mut Row {
        &mut self.rows[idx]
    }

    /// Index of the row whose start y is closest to `y`. Ties go to the lower index.
    pub fn closest_row(&self, y: f64) -> Option<usize> {
        let above = self.rows.partition_point(|row| row.y() < y);
        let below_y = above.checked_sub(1).map(|i| self.rows[i].y());
        let above_y = self.rows.get(above).map(Row::y);

        let best_y = match (below_y, above_y) {
            (Some(b), Some(a)) => {
                if (y - b).abs() <= (a - y).abs() {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };

        // First row at that y, there may be several side by side
        Some(self.rows.partition_point(|row| row.y() < best_y))
    }

    /// Carve `rect` out of every row it touches. Rows entirely above the rectangle are skipped,
    /// rows below it get their height limited.
    pub fn carve(&mut self, rect: &Rect) {
        for row in self.rows.iter_mut() {
            if row.y() > rect.y1() + GEOMETRY_EPSILON {
                break;
            }
            row.carve(rect);
        }
    }

    /// Is there an unbroken stack of free space `width` wide and `height` tall starting at `x` on
    /// the row `row_idx`?
    ///
    /// Walks up the rows starting at `row_idx`, hopping from one row to the row that starts
    /// exactly where the free space of the previous one ends.
    pub fn continuous_and_empty(&self, x: f64, width: f64, height: f64, row_idx: usize) -> bool {
        let Some(start) = self.rows.get(row_idx) else {
            return false;
        };
        let end_y = start.y() + height;
        let mut current_y = start.y();

        for row in self.rows[row_idx..].iter() {
            if row.y() > current_y + GEOMETRY_EPSILON {
                // Nothing starts where the stack currently ends
                return false;
            }
            if row.y() < current_y - GEOMETRY_EPSILON || !row.contains_span(x, x + width) {
                continue;
            }
            if let Some(available) = row.can_place(x, x + width) {
                current_y += available;
                if current_y >= end_y - GEOMETRY_EPSILON {
                    return true;
                }
            }
        }

        false
    }
}
