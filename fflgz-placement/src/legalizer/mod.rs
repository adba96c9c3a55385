use std::fmt::Display;

use anyhow::Result;

use crate::{placement_cell::PlacementCell, rows::RowSet};

pub mod tetris;


/// Abstract interface over legalizers. Takes the prepared rows and the movable cells, and commits
/// a legal position to every cell it manages to place.
pub trait Legalizer {
    /// Legalize the provided cells. `rows` is consumed as occupancy: every placed cell is carved
    /// out of it.
    fn legalize(&self, rows: &mut RowSet, cells: &mut [PlacementCell]) -> Result<LegalizeReport>;
}

/// Summary of a legalization run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LegalizeReport {
    /// Cells placed in their closest row
    pub placed_first_pass: usize,
    /// Cells placed while widening the search
    pub placed_on_retry: usize,
    /// Indices (into the legalized cell slice) of cells that never found a site
    pub unplaced: Vec<usize>,
    /// Largest row offset that was tried
    pub strides: usize,
    pub total_displacement: f64,
    pub max_displacement: f64,
}

impl LegalizeReport {
    pub fn placed(&self) -> usize {
        self.placed_first_pass + self.placed_on_retry
    }

    pub(crate) fn record(&mut self, displacement: f64) {
        self.total_displacement += displacement;
        self.max_displacement = self.max_displacement.max(displacement);
    }
}

#[derive(Debug, PartialEq)]
pub enum LegalizeError {
    /// Cells were left without a site after searching up to `stride` rows away from their
    /// closest row.
    Infeasible { unplaced: usize, stride: usize },
    /// There are cells to place but no rows to put them in
    NoRows,
}

impl std::error::Error for LegalizeError {}

impl Display for LegalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Infeasible { unplaced, stride } => write!(
                f,
                "legalization infeasible, {} cells unplaced after stride {}",
                unplaced, stride
            ),
            Self::NoRows => write!(f, "no placement rows"),
        }
    }
}
