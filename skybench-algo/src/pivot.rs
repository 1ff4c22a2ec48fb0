// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pivot selection for the lattice-tree engines.
//!
//! Chooses a pivot minimizing the spread between its largest and
//! smallest normalized coordinate within the current bounding box. The
//! chosen pivot ends up in `data[0]` and is a skyline point of the
//! buffer handed in; as a side effect, points dominated by the running
//! pivot are removed by swap-with-tail.

use skybench_core::{dominance, dominated_left, norm_range, Coordinates, Dominance};

/// One pivot-selection pass over a buffer, scoped to an axis-aligned
/// bounding box.
pub struct PivotSelection<'a> {
    min_list: &'a [f32],
    max_list: &'a [f32],
}

impl<'a> PivotSelection<'a> {
    pub fn new(min_list: &'a [f32], max_list: &'a [f32]) -> Self {
        Self { min_list, max_list }
    }

    /// Select the pivot into `data[0]`, pruning points dominated by the
    /// running head.
    ///
    /// On a right-dominance swap the cursor resets to 1, re-testing
    /// already-seen points against the new head. This conservative
    /// behavior is carried over unchanged from the reference
    /// implementation.
    pub fn execute<T: Coordinates>(&self, data: &mut Vec<T>) {
        if data.len() <= 1 {
            return;
        }

        let range_list = self.range_list();
        let mut min_dist = norm_range(data[0].coords(), self.min_list, &range_list);

        let mut cur = 1usize;
        while cur < data.len() {
            match dominance(data[0].coords(), data[cur].coords()) {
                Dominance::Left => {
                    data.swap_remove(cur);
                }
                Dominance::Right => {
                    // The old head is dominated by the new one; swapping
                    // it into the removed slot discards it.
                    data.swap(0, cur);
                    data.swap_remove(cur);
                    min_dist = norm_range(data[0].coords(), self.min_list, &range_list);
                    cur = 1;
                }
                Dominance::Incomparable => {
                    let cur_dist = norm_range(data[cur].coords(), self.min_list, &range_list);
                    if cur_dist < min_dist {
                        if Self::evaluate_point(cur, data) {
                            data.swap(0, cur);
                            min_dist = cur_dist;
                            cur += 1;
                        } else {
                            data.swap_remove(cur);
                        }
                    } else {
                        cur += 1;
                    }
                }
            }
        }
    }

    fn range_list(&self) -> Vec<f32> {
        self.min_list
            .iter()
            .zip(self.max_list.iter())
            .map(|(lo, hi)| hi - lo)
            .collect()
    }

    /// Whether `data[pos]` survives against every point before it.
    fn evaluate_point<T: Coordinates>(pos: usize, data: &[T]) -> bool {
        let cur = data[pos].coords();
        !data[..pos]
            .iter()
            .any(|prev| dominated_left(cur, prev.coords()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybench_core::{dominate_left, Point};

    fn points(rows: &[&[f32]]) -> Vec<Point> {
        Point::from_rows(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>())
    }

    fn unit_box(dims: usize) -> (Vec<f32>, Vec<f32>) {
        (vec![0.0; dims], vec![1.0; dims])
    }

    /// The pivot must be a skyline point of the original buffer, and no
    /// survivor may be dominated by it.
    fn check_pivot_invariants(original: &[Point], selected: &[Point]) {
        let pivot = &selected[0];
        for p in original {
            assert!(
                !dominate_left(&p.elems, &pivot.elems),
                "pivot {} dominated by {}",
                pivot.pid,
                p.pid
            );
        }
        for p in &selected[1..] {
            assert!(
                !dominate_left(&pivot.elems, &p.elems),
                "survivor {} dominated by pivot {}",
                p.pid,
                pivot.pid
            );
        }
    }

    #[test]
    fn test_pivot_is_skyline_point() {
        let mut data = points(&[
            &[0.9, 0.9],
            &[0.1, 0.8],
            &[0.5, 0.4],
            &[0.8, 0.1],
            &[0.6, 0.7],
        ]);
        let original = data.clone();
        let (lo, hi) = unit_box(2);
        PivotSelection::new(&lo, &hi).execute(&mut data);
        check_pivot_invariants(&original, &data);
    }

    #[test]
    fn test_balanced_point_wins() {
        // (0.5, 0.4) has the smallest normalized spread among the
        // incomparable candidates.
        let mut data = points(&[&[0.1, 0.8], &[0.5, 0.4], &[0.8, 0.1]]);
        let (lo, hi) = unit_box(2);
        PivotSelection::new(&lo, &hi).execute(&mut data);
        assert_eq!(data[0].pid, 1);
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_dominating_point_takes_head_and_prunes() {
        let mut data = points(&[&[0.5, 0.5], &[0.2, 0.2], &[0.6, 0.6], &[0.1, 0.9]]);
        let (lo, hi) = unit_box(2);
        PivotSelection::new(&lo, &hi).execute(&mut data);
        // (0.2, 0.2) dominates (0.5, 0.5) and (0.6, 0.6) but not the
        // incomparable (0.1, 0.9).
        assert_eq!(data[0].pid, 1);
        let pids: Vec<u32> = data.iter().map(|p| p.pid).collect();
        assert!(pids.contains(&3));
        assert!(!pids.contains(&0));
        assert!(!pids.contains(&2));
    }

    #[test]
    fn test_duplicates_survive_selection() {
        let mut data = points(&[&[0.4, 0.4], &[0.4, 0.4], &[0.9, 0.9]]);
        let (lo, hi) = unit_box(2);
        PivotSelection::new(&lo, &hi).execute(&mut data);
        // Equal points are incomparable with equal spread: neither
        // removes the other.
        let pids: Vec<u32> = data.iter().map(|p| p.pid).collect();
        assert!(pids.contains(&0));
        assert!(pids.contains(&1));
    }

    #[test]
    fn test_single_and_empty_buffers() {
        let (lo, hi) = unit_box(2);
        let mut empty: Vec<Point> = vec![];
        PivotSelection::new(&lo, &hi).execute(&mut empty);
        assert!(empty.is_empty());

        let mut one = points(&[&[0.3, 0.3]]);
        PivotSelection::new(&lo, &hi).execute(&mut one);
        assert_eq!(one.len(), 1);
    }
}
