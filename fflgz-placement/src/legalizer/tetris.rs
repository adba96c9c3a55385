//! Implementation of the TETRIS legalizer, first described in "Method and system for high speed
//! detailed placement of cells within an integrated circuit design" (USPTO patent 6370673),
//! extended with subrow occupancy, multi-row cells and a widening retry search.

use std::time::Instant;

use anyhow::Result;
use itertools::Itertools;
use nalgebra::Point2;

use crate::{
    placement_cell::{PlacementCell, Rect},
    rows::RowSet,
};

use super::{LegalizeError, LegalizeReport, Legalizer};

pub struct TetrisLegalizer {
    /// How many rows above and below its closest row a cell may be moved. `None` searches the
    /// whole row set.
    max_stride: Option<usize>,
    /// Turn cells left without a site into a hard error instead of reporting them.
    fail_on_unplaced: bool,
}

impl TetrisLegalizer {
    pub fn new(max_stride: Option<usize>, fail_on_unplaced: bool) -> Self {
        TetrisLegalizer {
            max_stride,
            fail_on_unplaced,
        }
    }
}

impl Default for TetrisLegalizer {
    fn default() -> Self {
        Self::new(None, false)
    }
}

/// Best legal site found for a cell in a single row
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Site {
    pub position: Point2<f64>,
    pub displacement: f64,
}

/// A cell that didn't fit in its closest row, waiting for the retry passes.
struct Deferred {
    cell: usize,
    closest_row: usize,
}

impl Legalizer for TetrisLegalizer {
    fn legalize(&self, rows: &mut RowSet, cells: &mut [PlacementCell]) -> Result<LegalizeReport> {
        let _span = tracing::info_span!("tetris_legalize").entered();
        let start = Instant::now();
        let mut report = LegalizeReport::default();

        // Only movable, not yet placed cells are ours to deal with
        let pending = (0..cells.len())
            .filter(|&i| cells[i].is_movable() && !cells[i].is_placed())
            .collect_vec();
        if pending.is_empty() {
            return Ok(report);
        }
        if rows.is_empty() {
            Err(LegalizeError::NoRows)?
        }

        // Stage 1: snap every cell to the row closest to its global y. Rows are non-empty so
        // there is always an answer.
        let closest_row = |cell: &PlacementCell| rows.closest_row(cell.global.y).unwrap_or(0);

        // Stage 2: biggest cells first, they are the hardest to fit once the rows fill up. Cells
        // of equal area go in order of decreasing weight. The sort is stable so ties keep the
        // input order and reruns are reproducible.
        let order = pending
            .into_iter()
            .map(|i| (i, closest_row(&cells[i])))
            .sorted_by(|&(a, _), &(b, _)| {
                let a = &cells[a];
                let b = &cells[b];
                b.area()
                    .total_cmp(&a.area())
                    .then_with(|| b.weight().total_cmp(&a.weight()))
            })
            .collect_vec();

        // Stage 3: try every cell in its closest row
        let mut deferred = Vec::new();
        for (cell_i, row_i) in order {
            match find_site(rows, &cells[cell_i], row_i) {
                Some(site) => {
                    commit(rows, &mut cells[cell_i], site);
                    report.record(site.displacement);
                    report.placed_first_pass += 1;
                }
                None => {
                    rows.row_mut(row_i).add_rejected(cells[cell_i].footprint());
                    deferred.push(Deferred {
                        cell: cell_i,
                        closest_row: row_i,
                    });
                }
            }
        }
        log::info!(
            "First pass placed {} cells, {} deferred",
            report.placed_first_pass,
            deferred.len()
        );

        // Stage 4: widen the search one row up and down at a time. Past rows.len() neither
        // direction has any rows left to offer.
        let max_stride = self
            .max_stride
            .map_or(rows.len(), |s| s.min(rows.len()));
        let mut stride = 0;
        while !deferred.is_empty() && stride < max_stride {
            stride += 1;
            let before = deferred.len();

            deferred.retain(|d| {
                let cell = &cells[d.cell];
                let footprint = cell.footprint();
                let up_row = Some(d.closest_row + stride).filter(|&r| r < rows.len());
                let down_row = d.closest_row.checked_sub(stride);

                let up = up_row.and_then(|r| retry_site(rows, cell, r));
                let down = down_row.and_then(|r| retry_site(rows, cell, r));

                let best = match (up, down) {
                    (Some(up), Some(down)) => {
                        if up.displacement > down.displacement {
                            down
                        } else {
                            up
                        }
                    }
                    (Some(site), None) | (None, Some(site)) => site,
                    (None, None) => {
                        for r in up_row.into_iter().chain(down_row) {
                            rows.row_mut(r).add_rejected(footprint);
                        }
                        return true;
                    }
                };

                commit(rows, &mut cells[d.cell], best);
                report.record(best.displacement);
                false
            });

            let placed = before - deferred.len();
            report.placed_on_retry += placed;
            log::debug!(
                "Stride {}: placed {}, still deferred {}",
                stride,
                placed,
                deferred.len()
            );
        }
        report.strides = stride;

        report.unplaced = deferred.iter().map(|d| d.cell).sorted().collect();
        for &i in report.unplaced.iter() {
            log::warn!("No legal site found for {}", cells[i].name);
        }

        log::info!(
            "Legalized {} cells ({} unplaced) in {:?}, {} strides, displacement total {:.3} max {:.3}",
            report.placed(),
            report.unplaced.len(),
            start.elapsed(),
            report.strides,
            report.total_displacement,
            report.max_displacement,
        );

        if self.fail_on_unplaced && !report.unplaced.is_empty() {
            Err(LegalizeError::Infeasible {
                unplaced: report.unplaced.len(),
                stride,
            })?
        }

        Ok(report)
    }
}

/// Place the cell at `site` and remove its footprint from the rows.
fn commit(rows: &mut RowSet, cell: &mut PlacementCell, site: Site) {
    rows.carve(&Rect::new(site.position, cell.width, cell.height));
    cell.place_at(site.position);
}

/// [`find_site`], unless the row already failed to host a cell of the same footprint.
fn retry_site(rows: &RowSet, cell: &PlacementCell, row_idx: usize) -> Option<Site> {
    if rows.row(row_idx).has_rejected(cell.footprint()) {
        None
    } else {
        find_site(rows, cell, row_idx)
    }
}

/// Find the site of row `row_idx` with the least displacement for `cell`.
///
/// Scans every subrow from left to right, stepping over site aligned x positions. A subrow is
/// abandoned as soon as none of its remaining positions can beat the best displacement so far.
/// Candidates that would improve on the best are checked for a free stack of rows above them
/// with [`RowSet::continuous_and_empty`].
pub fn find_site(rows: &RowSet, cell: &PlacementCell, row_idx: usize) -> Option<Site> {
    let row = rows.row(row_idx);
    let y = row.y();
    let mut best: Option<Site> = None;

    for subrow in row.subrows() {
        let mut site = row.first_site_at_or_after(subrow.start_x);
        while site <= row.num_sites() {
            let x = row.site_x(site);
            // Sites only move right from here, so once the cell sticks out of this row none of
            // them can fit. A row beside this one at the same y has its own site grid.
            if x > subrow.end_x || !row.contains_span(x, x + cell.width) {
                break;
            }
            site += 1;

            let best_displacement = best.map_or(f64::INFINITY, |b| b.displacement);
            let displacement = cell.displacement_to(Point2::new(x, y));
            if displacement >= best_displacement {
                // The closest the rest of this subrow can get is at the cell's own x, or at the
                // end of the subrow if it's further right than that.
                let nearest_x = cell.global.x.clamp(x, subrow.end_x);
                if cell.displacement_to(Point2::new(nearest_x, y)) >= best_displacement {
                    break;
                }
                continue;
            }

            if rows.continuous_and_empty(x, cell.width, cell.height, row_idx) {
                best = Some(Site {
                    position: Point2::new(x, y),
                    displacement,
                });
            }
        }
    }

    best
}
