use std::fmt::Display;

use anyhow::{anyhow, Context, Result};
use fflgz_common::{
    design::{Coord, Design, LegalizedDesign, PlacedCell},
    UNPLACED_SENTINEL,
};

use crate::{
    legalizer::{LegalizeReport, Legalizer},
    placement_cell::{to_coord, to_point, PlacementCell},
    rows::{
        slicing::{slice_by_gates, slice_by_rows},
        Row, RowSet,
    },
};


/// Malformed input geometry, detected while loading the design.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadError {
    /// The design has no placement rows at all
    NoRows,
    /// Row `index` (in database order) has zero sites
    EmptyRow { index: usize },
    /// Row `index` has a non-positive or non-finite site width
    BadSitePitch { index: usize, site_width: f64 },
    /// Row `index` starts at or above the top of the die, leaving it no height
    RowAboveDie { index: usize, y: f64, die_top: f64 },
    /// A cell or obstacle with a non-positive or non-finite size
    BadCellGeometry { name: String, width: f64, height: f64 },
    /// A weight that can't be ordered
    BadWeight { name: String, weight: f64 },
    /// A movable cell that can't fit in the die vertically, no matter which row it goes to
    CellTallerThanDie { name: String, height: f64, die_height: f64 },
    /// NaN or infinite coordinate on the die, a row origin or a cell position
    NonFiniteCoordinate { name: String },
}

impl std::error::Error for LoadError {}

impl Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRows => write!(f, "design has no placement rows"),
            Self::EmptyRow { index } => write!(f, "row {} has no sites", index),
            Self::BadSitePitch { index, site_width } => {
                write!(f, "row {} has invalid site width {}", index, site_width)
            }
            Self::RowAboveDie { index, y, die_top } => write!(
                f,
                "row {} starts at y = {}, at or above the die top {}",
                index, y, die_top
            ),
            Self::BadCellGeometry {
                name,
                width,
                height,
            } => write!(f, "{} has invalid size {} x {}", name, width, height),
            Self::BadWeight { name, weight } => {
                write!(f, "{} has invalid weight {}", name, weight)
            }
            Self::CellTallerThanDie {
                name,
                height,
                die_height,
            } => write!(
                f,
                "{} is {} high, taller than the die ({})",
                name, height, die_height
            ),
            Self::NonFiniteCoordinate { name } => {
                write!(f, "{} has a non-finite coordinate", name)
            }
        }
    }
}

pub(crate) fn check_coord(name: &str, c: Coord) -> Result<()> {
    if !(c.x.is_finite() && c.y.is_finite()) {
        Err(LoadError::NonFiniteCoordinate {
            name: name.to_owned(),
        })?
    }
    Ok(())
}

/// The legalizer's view of a design: the rows and every cell, movable and fixed.
pub struct Floorplan {
    pub rows: RowSet,
    /// The first [`Floorplan::movable_cell_count`] cells are the movable ones, in database
    /// order, followed by the obstacles.
    pub cells: Vec<PlacementCell>,
    pub movable_cell_count: usize,
    sliced: bool,
}

impl Floorplan {
    /// Load rows, cells and obstacles from the design database, validating the geometry.
    pub fn from_design(design: &Design) -> Result<Self> {
        design.check()?;
        check_coord("die", design.die.lower_left)?;
        check_coord("die", design.die.upper_right)?;

        let die_top = design.die.upper_right.y;
        let die_height = design.die.height();

        if design.rows.is_empty() {
            Err(LoadError::NoRows)?
        }

        let mut rows = Vec::with_capacity(design.rows.len());
        for (index, row) in design.rows.iter().enumerate() {
            check_coord(&format!("row {}", index), row.origin)?;
            if row.num_sites == 0 {
                Err(LoadError::EmptyRow { index })?
            }
            if !(row.site_width.is_finite() && row.site_width > 0.0) {
                Err(LoadError::BadSitePitch {
                    index,
                    site_width: row.site_width,
                })?
            }
            if row.origin.y >= die_top {
                Err(LoadError::RowAboveDie {
                    index,
                    y: row.origin.y,
                    die_top,
                })?
            }
            rows.push(Row::new(
                to_point(row.origin),
                row.site_width,
                row.num_sites,
                die_top - row.origin.y,
            ));
        }

        let mut cells = Vec::with_capacity(design.cells.len() + design.gates.len());
        for cell in design.cells.iter() {
            let cell = PlacementCell::from_design_cell(cell)
                .with_context(|| anyhow!("Loading cell {:?}", cell.name))?;
            if cell.height > die_height {
                Err(LoadError::CellTallerThanDie {
                    name: cell.name.clone(),
                    height: cell.height,
                    die_height,
                })?
            }
            cells.push(cell);
        }
        let movable_cell_count = cells.len();

        for gate in design.gates.iter() {
            cells.push(
                PlacementCell::from_design_gate(gate)
                    .with_context(|| anyhow!("Loading gate {:?}", gate.name))?,
            );
        }

        log::info!(
            "Loaded {} rows, {} cells, {} obstacles",
            rows.len(),
            movable_cell_count,
            cells.len() - movable_cell_count
        );

        Ok(Self {
            rows: RowSet::new(rows),
            cells,
            movable_cell_count,
            sliced: false,
        })
    }

    pub fn movable_cells(&self) -> &[PlacementCell] {
        &self.cells[..self.movable_cell_count]
    }

    pub fn fixed_cells(&self) -> &[PlacementCell] {
        &self.cells[self.movable_cell_count..]
    }

    /// Prepare the rows: cap them under taller rows, then carve out the obstacles. Only has an
    /// effect the first time it is called.
    pub fn slice_rows(&mut self) {
        if self.sliced {
            return;
        }
        slice_by_rows(&mut self.rows);
        slice_by_gates(&mut self.rows, self.cells[self.movable_cell_count..].iter());
        self.sliced = true;
    }

    /// Slice the rows if needed, then run `legalizer` over the movable cells.
    pub fn legalize(&mut self, legalizer: &impl Legalizer) -> Result<LegalizeReport> {
        self.slice_rows();
        legalizer.legalize(&mut self.rows, &mut self.cells[..self.movable_cell_count])
    }

    /// Write the final position of every movable cell back in database form. Cells that were
    /// never placed get [`UNPLACED_SENTINEL`].
    pub fn build_output(&self, creator: &str) -> LegalizedDesign {
        LegalizedDesign {
            creator: format!(
                "Legalized by fflgz {}, input: {}",
                env!("CARGO_PKG_VERSION"),
                creator,
            ),
            cells: self
                .movable_cells()
                .iter()
                .map(|cell| {
                    let position = cell.final_position();
                    PlacedCell {
                        name: cell.name.clone(),
                        position: position.map_or(UNPLACED_SENTINEL, to_coord),
                        placed: position.is_some(),
                    }
                })
                .collect(),
        }
    }
}
