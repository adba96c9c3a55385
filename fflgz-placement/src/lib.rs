//! Row based legalization of flip-flops: snaps every movable cell to a free, site aligned spot
//! on the placement rows while keeping it as close as possible to where global placement put it.

#[cfg(test)]
mod test_util;

pub mod config;
pub mod core;
pub mod legalizer;
pub mod placement_cell;
pub mod rows;
pub mod validate;

use anyhow::{bail, Result};
use fflgz_common::design::{Design, LegalizedDesign};

use crate::{config::LegalizerConfig, core::Floorplan, legalizer::LegalizeReport};

/// Run the whole flow on a design: load, slice the rows, legalize and write back.
pub fn run(
    design: &Design,
    creator: &str,
    config: &LegalizerConfig,
) -> Result<(LegalizedDesign, LegalizeReport)> {
    let _span = tracing::info_span!("legalize_design").entered();

    let mut floorplan = Floorplan::from_design(design)?;
    let report = floorplan.legalize(&config.build())?;

    if config.verify {
        let violations = validate::check_placement(&floorplan.rows, &floorplan.cells);
        for v in violations.iter() {
            log::error!("{}", v);
        }
        if !violations.is_empty() {
            bail!("Legalized placement has {} violations", violations.len());
        }
    }

    Ok((floorplan.build_output(creator), report))
}
