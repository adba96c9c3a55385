pub mod design;

pub use serde_json;

use std::fmt::{Display, Formatter};

/// Coordinate written back for cells the legalizer could not place. Downstream tools must check
/// [`design::PlacedCell::placed`] rather than trusting this position.
pub const UNPLACED_SENTINEL: design::Coord = design::Coord { x: 0.0, y: 0.0 };

/// Error generated when a design file is internally inconsistent in a way serde can't catch
#[derive(Debug)]
pub enum DesignFileError {
    /// The die box has a non-positive extent along at least one axis
    DegenerateDie { width: f64, height: f64 },
    /// A name appears more than once among the movable cells
    DuplicateCell(String),
}

impl Display for DesignFileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::DegenerateDie { width, height } => {
                write!(f, "DesignFileError::DegenerateDie({} x {})", width, height)
            }
            Self::DuplicateCell(name) => write!(f, "DesignFileError::DuplicateCell({:?})", name),
        }
    }
}

impl std::error::Error for DesignFileError {}
