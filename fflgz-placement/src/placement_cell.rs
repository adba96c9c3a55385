use anyhow::Result;
use fflgz_common::design::{Coord, DesignCell, DesignGate};
use nalgebra::Point2;

use crate::core::{check_coord, LoadError};

/// Slack used for every geometric comparison. Coordinates come out of an analytical placer as
/// doubles so exact equality on row starts and site positions is not something we can rely on.
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// Axis aligned rectangle, `origin` is the bottom left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub origin: Point2<f64>,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(origin: Point2<f64>, width: f64, height: f64) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    pub fn x0(&self) -> f64 {
        self.origin.x
    }

    pub fn x1(&self) -> f64 {
        self.origin.x + self.width
    }

    pub fn y0(&self) -> f64 {
        self.origin.y
    }

    pub fn y1(&self) -> f64 {
        self.origin.y + self.height
    }

    /// True if the interiors intersect. Rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x0() < other.x1() - GEOMETRY_EPSILON
            && other.x0() < self.x1() - GEOMETRY_EPSILON
            && self.y0() < other.y1() - GEOMETRY_EPSILON
            && other.y0() < self.y1() - GEOMETRY_EPSILON
    }
}

/// Key used by rows to remember what they could not host. Two cells with the same footprint are
/// interchangeable as far as feasibility of a whole row goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Footprint {
    width: u64,
    height: u64,
}

impl Footprint {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.to_bits(),
            height: height.to_bits(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellKind {
    /// A flip-flop the legalizer is free to move.
    Movable {
        /// Tie-breaker between cells of equal area, larger is placed first.
        weight: f64,
        /// Legal bottom-left corner, `None` until the legalizer commits a site.
        legal: Option<Point2<f64>>,
    },
    /// An obstacle. Its global position is its final position.
    Fixed,
}

/// Cell representation inside the legalizer, decoupled from the design database types.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementCell {
    pub name: String,
    /// Position at the input of legalization (bottom left corner)
    pub global: Point2<f64>,
    pub width: f64,
    pub height: f64,
    pub kind: CellKind,
}

impl PlacementCell {
    pub fn movable(name: impl Into<String>, global: Point2<f64>, size: (f64, f64), weight: f64) -> Self {
        Self {
            name: name.into(),
            global,
            width: size.0,
            height: size.1,
            kind: CellKind::Movable {
                weight,
                legal: None,
            },
        }
    }

    pub fn fixed(name: impl Into<String>, global: Point2<f64>, size: (f64, f64)) -> Self {
        Self {
            name: name.into(),
            global,
            width: size.0,
            height: size.1,
            kind: CellKind::Fixed,
        }
    }

    pub fn from_design_cell(cell: &DesignCell) -> Result<Self> {
        check_size(&cell.name, cell.width, cell.height)?;
        check_coord(&cell.name, cell.position)?;
        if !cell.weight.is_finite() {
            Err(LoadError::BadWeight {
                name: cell.name.clone(),
                weight: cell.weight,
            })?
        }
        Ok(Self::movable(
            cell.name.clone(),
            to_point(cell.position),
            (cell.width, cell.height),
            cell.weight,
        ))
    }

    pub fn from_design_gate(gate: &DesignGate) -> Result<Self> {
        check_size(&gate.name, gate.width, gate.height)?;
        check_coord(&gate.name, gate.position)?;
        Ok(Self::fixed(
            gate.name.clone(),
            to_point(gate.position),
            (gate.width, gate.height),
        ))
    }

    pub fn is_movable(&self) -> bool {
        matches!(self.kind, CellKind::Movable { .. })
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Placement weight, zero for obstacles
    pub fn weight(&self) -> f64 {
        match self.kind {
            CellKind::Movable { weight, .. } => weight,
            CellKind::Fixed => 0.0,
        }
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.width, self.height)
    }

    /// Where the cell ends up: the committed site for movable cells, the global position for
    /// obstacles, `None` for movable cells that were never placed.
    pub fn final_position(&self) -> Option<Point2<f64>> {
        match self.kind {
            CellKind::Movable { legal, .. } => legal,
            CellKind::Fixed => Some(self.global),
        }
    }

    pub fn is_placed(&self) -> bool {
        self.final_position().is_some()
    }

    /// Footprint at the final position, if there is one.
    pub fn placed_rect(&self) -> Option<Rect> {
        self.final_position()
            .map(|origin| Rect::new(origin, self.width, self.height))
    }

    /// Euclidean distance between the global position and `candidate`
    pub fn displacement_to(&self, candidate: Point2<f64>) -> f64 {
        (candidate - self.global).norm()
    }

    /// Commit a legal position. Only movable cells can be placed, and only once.
    pub(crate) fn place_at(&mut self, position: Point2<f64>) {
        match &mut self.kind {
            CellKind::Movable { legal, .. } => {
                debug_assert!(legal.is_none(), "{} legalized twice", self.name);
                *legal = Some(position);
            }
            // Legalizers filter on `is_movable` before searching for a site
            CellKind::Fixed => unreachable!("fixed cell {} has no site to commit", self.name),
        }
    }
}

pub(crate) fn to_point(c: Coord) -> Point2<f64> {
    Point2::new(c.x, c.y)
}

pub(crate) fn to_coord(p: Point2<f64>) -> Coord {
    Coord::new(p.x, p.y)
}

fn check_size(name: &str, width: f64, height: f64) -> Result<()> {
    let ok = |v: f64| v.is_finite() && v > 0.0;
    if !(ok(width) && ok(height)) {
        Err(LoadError::BadCellGeometry {
            name: name.to_owned(),
            width,
            height,
        })?
    }
    Ok(())
}
