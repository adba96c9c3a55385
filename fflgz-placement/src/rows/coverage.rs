//! Union of horizontal spans, used by the row slicing to find out when the rows above a given row
//! cover all of it.

use crate::placement_cell::GEOMETRY_EPSILON;

/// Sorted list of disjoint closed intervals. Touching intervals are merged on insert.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoverageList {
    spans: Vec<(f64, f64)>,
}

impl CoverageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> &[(f64, f64)] {
        &self.spans
    }

    /// Add `[start, end]` to the union, erasing every span it overlaps or touches and replacing
    /// them with a single merged span.
    pub fn insert(&mut self, start: f64, end: f64) {
        // First span that ends at or after our start
        let first = self
            .spans
            .partition_point(|&(_, e)| e < start - GEOMETRY_EPSILON);
        // One past the last span that starts at or before our end
        let last = self
            .spans
            .partition_point(|&(s, _)| s <= end + GEOMETRY_EPSILON);

        let (mut merged_start, mut merged_end) = (start, end);
        if first < last {
            merged_start = merged_start.min(self.spans[first].0);
            merged_end = merged_end.max(self.spans[last - 1].1);
        }

        self.spans.drain(first..last);
        self.spans.insert(first, (merged_start, merged_end));
    }

    /// True if a single span covers all of `[start, end]`
    pub fn covers(&self, start: f64, end: f64) -> bool {
        let idx = self
            .spans
            .partition_point(|&(_, e)| e < end - GEOMETRY_EPSILON);
        self.spans
            .get(idx)
            .map_or(false, |&(s, _)| s <= start + GEOMETRY_EPSILON)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn disjoint_spans_stay_sorted() {
        let mut list = CoverageList::new();
        list.insert(10.0, 20.0);
        list.insert(0.0, 5.0);
        list.insert(30.0, 40.0);

        assert_eq!(list.spans(), &[(0.0, 5.0), (10.0, 20.0), (30.0, 40.0)]);
        assert!(!list.covers(0.0, 20.0));
        assert!(list.covers(12.0, 18.0));
    }

    #[test]
    fn bridging_span_merges_neighbours() {
        let mut list = CoverageList::new();
        list.insert(0.0, 5.0);
        list.insert(10.0, 20.0);
        list.insert(30.0, 40.0);
        list.insert(4.0, 31.0);

        assert_eq!(list.spans(), &[(0.0, 40.0)]);
        assert!(list.covers(0.0, 40.0));
    }

    #[test]
    fn touching_spans_merge() {
        let mut list = CoverageList::new();
        list.insert(0.0, 10.0);
        list.insert(10.0, 20.0);

        assert_eq!(list.spans(), &[(0.0, 20.0)]);
    }

    #[test]
    fn contained_span_is_absorbed() {
        let mut list = CoverageList::new();
        list.insert(0.0, 100.0);
        list.insert(20.0, 30.0);

        assert_eq!(list.spans(), &[(0.0, 100.0)]);
        assert!(!list.covers(-1.0, 50.0));
    }
}
