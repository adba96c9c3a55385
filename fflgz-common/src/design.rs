//! Interchange format for the design database consumed by the legalizer, and for the legalized
//! result written back to it.

use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::DesignFileError;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box of the placeable area
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Die {
    pub lower_left: Coord,
    pub upper_right: Coord,
}

impl Die {
    pub fn width(&self) -> f64 {
        self.upper_right.x - self.lower_left.x
    }

    pub fn height(&self) -> f64 {
        self.upper_right.y - self.lower_left.y
    }
}

/// A placement row as described by the database: `num_sites` sites of `site_width` each,
/// starting at `origin`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DesignRow {
    pub origin: Coord,
    pub site_width: f64,
    pub num_sites: u32,
}

/// A movable cell, positioned at the output of global placement / clustering.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DesignCell {
    pub name: String,
    /// Bottom left corner
    pub position: Coord,
    pub width: f64,
    pub height: f64,
    /// Timing derived weight. Only used to order equally sized cells, larger goes first.
    #[serde(default)]
    pub weight: f64,
}

/// A fixed obstacle (combinational gate, macro, ...). Never moved.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DesignGate {
    pub name: String,
    pub position: Coord,
    pub width: f64,
    pub height: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Design {
    pub die: Die,
    pub rows: Vec<DesignRow>,
    pub cells: Vec<DesignCell>,
    #[serde(default)]
    pub gates: Vec<DesignGate>,
}

impl Design {
    /// Parse a design from its JSON representation, checking the invariants that don't depend on
    /// placement semantics.
    pub fn from_json(text: &str) -> Result<Self> {
        let design: Design = serde_json::from_str(text).context("Parse design JSON")?;
        design.check()?;
        Ok(design)
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open design file {:?} for reading", path))?;
        Self::from_json(&text).with_context(|| format!("Failed to load design {:?}", path))
    }

    /// Die and naming sanity checks, run on every parsed design.
    pub fn check(&self) -> Result<()> {
        if !(self.die.width() > 0.0 && self.die.height() > 0.0) {
            Err(DesignFileError::DegenerateDie {
                width: self.die.width(),
                height: self.die.height(),
            })?
        }

        let mut seen = HashSet::with_capacity(self.cells.len());
        for cell in self.cells.iter() {
            if !seen.insert(cell.name.as_str()) {
                Err(DesignFileError::DuplicateCell(cell.name.clone()))?
            }
        }

        Ok(())
    }
}

/// Final position of a movable cell.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlacedCell {
    pub name: String,
    /// Legal position, or [`crate::UNPLACED_SENTINEL`] if `placed` is false
    pub position: Coord,
    pub placed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LegalizedDesign {
    pub creator: String,
    pub cells: Vec<PlacedCell>,
}

impl LegalizedDesign {
    pub fn unplaced(&self) -> impl Iterator<Item = &PlacedCell> {
        self.cells.iter().filter(|c| !c.placed)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serialize legalized design")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let text = self.to_json()?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write legalized design to {:?}", path))
    }
}
