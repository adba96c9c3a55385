use anyhow::Result;
use fflgz_common::design::{Coord, Design, DesignCell, DesignGate, DesignRow, Die};

use crate::{core::Floorplan, legalizer::LegalizeReport, legalizer::Legalizer, validate};

pub fn make_design<'a>(
    die: (f64, f64, f64, f64),
    rows: impl Iterator<Item = &'a ((f64, f64), u32, f64)>,
    cells: impl Iterator<Item = &'a (&'static str, (f64, f64), (f64, f64), f64)>,
    gates: impl Iterator<Item = &'a (&'static str, (f64, f64), (f64, f64))>,
) -> Design {
    Design {
        die: Die {
            lower_left: Coord::new(die.0, die.1),
            upper_right: Coord::new(die.2, die.3),
        },
        rows: rows
            .map(|&((x, y), num_sites, site_width)| DesignRow {
                origin: Coord::new(x, y),
                site_width,
                num_sites,
            })
            .collect(),
        cells: cells
            .map(|&(name, (x, y), (width, height), weight)| DesignCell {
                name: name.to_owned(),
                position: Coord::new(x, y),
                width,
                height,
                weight,
            })
            .collect(),
        gates: gates
            .map(|&(name, (x, y), (width, height))| DesignGate {
                name: name.to_owned(),
                position: Coord::new(x, y),
                width,
                height,
            })
            .collect(),
    }
}

macro_rules! design {
    (
        die : ($x0:expr, $y0:expr, $x1:expr, $y1:expr),
        rows : [
            $(($r_x:expr, $r_y:expr), $sites:expr, $pitch:expr;)*
        ],
        cells : [
            $($name:ident => ($x:expr, $y:expr), ($w:expr, $h:expr), $weight:expr;)*
        ],
        gates : [
            $($g_name:ident => ($g_x:expr, $g_y:expr), ($g_w:expr, $g_h:expr);)*
        ]
    ) => {{
        let rows: &[((f64, f64), u32, f64)] = &[
            $( (($r_x as f64, $r_y as f64), $sites, $pitch as f64) ),*
        ];
        let cells: &[(&'static str, (f64, f64), (f64, f64), f64)] = &[
            $( (stringify!($name), ($x as f64, $y as f64), ($w as f64, $h as f64), $weight as f64) ),*
        ];
        let gates: &[(&'static str, (f64, f64), (f64, f64))] = &[
            $( (stringify!($g_name), ($g_x as f64, $g_y as f64), ($g_w as f64, $g_h as f64)) ),*
        ];

        $crate::test_util::make_design(
            ($x0 as f64, $y0 as f64, $x1 as f64, $y1 as f64),
            rows.into_iter(),
            cells.into_iter(),
            gates.into_iter(),
        )
    }};
}

pub(crate) use design;

/// Load `design`, legalize it and check the result is legal.
pub fn legalize_checked(
    design: &Design,
    legalizer: &impl Legalizer,
) -> Result<(Floorplan, LegalizeReport)> {
    let _ = tracing_subscriber::fmt::try_init();

    let mut floorplan = Floorplan::from_design(design)?;
    let report = floorplan.legalize(legalizer)?;

    let violations = validate::check_placement(&floorplan.rows, &floorplan.cells);
    assert!(violations.is_empty(), "Illegal placement: {:?}", violations);

    Ok((floorplan, report))
}

/// Legal position of the movable cell called `name`
pub fn position_of(floorplan: &Floorplan, name: &str) -> Option<(f64, f64)> {
    floorplan
        .movable_cells()
        .iter()
        .find(|c| c.name == name)
        .and_then(|c| c.final_position())
        .map(|p| (p.x, p.y))
}
