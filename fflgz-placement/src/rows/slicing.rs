//! One-time preparation of the rows before any movable cell is placed.

use crate::placement_cell::{PlacementCell, GEOMETRY_EPSILON};

use super::{coverage::CoverageList, RowSet};

/// Limit how tall cells placed on each row can be, based on the rows above it.
///
/// For every row we walk up through the higher rows that overlap it horizontally. Each of those
/// lowers the subrows underneath it to the gap between the two rows. Once the union of the higher
/// rows covers the whole span of the row, the row itself is capped at the gap to the row that
/// completed the cover and we stop looking.
pub fn slice_by_rows(rows: &mut RowSet) {
    let _span = tracing::info_span!("slice_by_rows").entered();
    let mut capped = 0;

    for i in 0..rows.len() {
        let (y, start_x, end_x) = {
            let row = rows.row(i);
            (row.y(), row.start_x(), row.end_x())
        };
        let mut coverage = CoverageList::new();

        for j in (i + 1)..rows.len() {
            let upper = rows.row(j).rect();
            if upper.y0() <= y + GEOMETRY_EPSILON
                || upper.x1() <= start_x + GEOMETRY_EPSILON
                || upper.x0() >= end_x - GEOMETRY_EPSILON
            {
                continue;
            }

            rows.row_mut(i).carve(&upper);
            coverage.insert(upper.x0(), upper.x1());

            if coverage.covers(start_x, end_x) {
                rows.row_mut(i).cap_height(upper.y0() - y);
                capped += 1;
                break;
            }
        }
    }

    log::info!("Capped the height of {} of {} rows", capped, rows.len());
}

/// Carve every fixed obstacle out of the rows it touches.
pub fn slice_by_gates<'a>(rows: &mut RowSet, gates: impl Iterator<Item = &'a PlacementCell>) {
    let _span = tracing::info_span!("slice_by_gates").entered();
    let mut count = 0;

    for gate in gates {
        debug_assert!(!gate.is_movable(), "{} is not an obstacle", gate.name);
        if let Some(rect) = gate.placed_rect() {
            rows.carve(&rect);
            count += 1;
        }
    }

    log::info!("Carved {} obstacles out of the placement rows", count);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rows::{Row, Subrow};
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    const DIE_TOP: f64 = 100.0;

    fn row(x: f64, y: f64, sites: u32) -> Row {
        Row::new(Point2::new(x, y), 1.0, sites, DIE_TOP - y)
    }

    #[test]
    fn fully_covered_row_is_capped() {
        let mut rows = RowSet::new(vec![row(0.0, 0.0, 10), row(0.0, 10.0, 10), row(0.0, 20.0, 10)]);
        slice_by_rows(&mut rows);

        assert_relative_eq!(rows.row(0).height(), 10.0);
        assert_relative_eq!(rows.row(1).height(), 10.0);
        // Top row has nothing above it
        assert_relative_eq!(rows.row(2).height(), 80.0);
        assert_eq!(
            rows.row(0).subrows(),
            &[Subrow {
                start_x: 0.0,
                end_x: 10.0,
                height: 10.0
            }]
        );
    }

    #[test]
    fn partial_cover_only_lowers_the_covered_part() {
        // Upper row only covers the right half of the lower one
        let mut rows = RowSet::new(vec![row(0.0, 0.0, 10), row(5.0, 8.0, 5)]);
        slice_by_rows(&mut rows);

        assert_relative_eq!(rows.row(0).height(), 100.0);
        assert_eq!(
            rows.row(0).subrows(),
            &[
                Subrow {
                    start_x: 0.0,
                    end_x: 5.0,
                    height: 100.0
                },
                Subrow {
                    start_x: 5.0,
                    end_x: 10.0,
                    height: 8.0
                },
            ]
        );
    }

    #[test]
    fn cover_assembled_from_several_rows() {
        let mut rows = RowSet::new(vec![
            row(0.0, 0.0, 10),
            row(0.0, 8.0, 4),
            row(4.0, 8.0, 6),
            row(0.0, 16.0, 10),
        ]);
        slice_by_rows(&mut rows);

        assert_relative_eq!(rows.row(0).height(), 8.0);
        assert_eq!(rows.row(0).subrows().len(), 1);
        assert_relative_eq!(rows.row(0).subrows()[0].height, 8.0);
    }

    #[test]
    fn gates_are_carved_from_every_spanned_row() {
        let mut rows = RowSet::new(vec![row(0.0, 0.0, 10), row(0.0, 10.0, 10), row(0.0, 20.0, 10)]);
        slice_by_rows(&mut rows);

        let gates = [PlacementCell::fixed("g0", Point2::new(2.0, 0.0), (3.0, 15.0))];
        slice_by_gates(&mut rows, gates.iter());

        for r in 0..2 {
            let subrows = rows.row(r).subrows();
            assert_eq!(subrows.len(), 2, "row {}", r);
            assert_relative_eq!(subrows[0].end_x, 2.0);
            assert_relative_eq!(subrows[1].start_x, 5.0);
        }
        assert_eq!(rows.row(2).subrows().len(), 1);
    }
}
