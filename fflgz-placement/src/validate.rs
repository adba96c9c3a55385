//! Independent legality check of a finished placement. Doesn't trust the subrow bookkeeping, only
//! the row geometry and the final cell positions.

use std::fmt::Display;

use itertools::Itertools;

use crate::{
    placement_cell::{PlacementCell, Rect, GEOMETRY_EPSILON},
    rows::{Row, RowSet},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    /// Two placed cells (or a cell and an obstacle) overlap
    Overlap(String, String),
    /// The cell's y isn't the start of any row covering its x range
    OffRow(String),
    /// The cell sits on a row but between two sites
    OffSite(String),
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overlap(a, b) => write!(f, "{} overlaps {}", a, b),
            Self::OffRow(c) => write!(f, "{} is not on a placement row", c),
            Self::OffSite(c) => write!(f, "{} is not aligned to a site", c),
        }
    }
}

/// Check every placed movable cell for row and site alignment, and every pair of placed cells for
/// overlap. Overlaps between two obstacles are not reported, those come from the input.
pub fn check_placement(rows: &RowSet, cells: &[PlacementCell]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for cell in cells.iter().filter(|c| c.is_movable()) {
        let Some(rect) = cell.placed_rect() else {
            continue;
        };
        let on_row = |row: &&Row| {
            (row.y() - rect.y0()).abs() <= GEOMETRY_EPSILON && row.contains_span(rect.x0(), rect.x1())
        };
        match rows.iter().find(on_row) {
            None => violations.push(Violation::OffRow(cell.name.clone())),
            Some(row) if !row.is_site_aligned(rect.x0()) => {
                violations.push(Violation::OffSite(cell.name.clone()))
            }
            Some(_) => {}
        }
    }

    // Sweep along x: once a rectangle starts past the end of the current one, nothing later
    // can overlap it either.
    let placed: Vec<(&PlacementCell, Rect)> = cells
        .iter()
        .filter_map(|c| c.placed_rect().map(|r| (c, r)))
        .sorted_by(|(_, a), (_, b)| a.x0().total_cmp(&b.x0()))
        .collect();
    for (i, (a, ra)) in placed.iter().enumerate() {
        for (b, rb) in placed[i + 1..].iter() {
            if rb.x0() >= ra.x1() - GEOMETRY_EPSILON {
                break;
            }
            if (a.is_movable() || b.is_movable()) && ra.overlaps(rb) {
                violations.push(Violation::Overlap(a.name.clone(), b.name.clone()));
            }
        }
    }

    violations
}
