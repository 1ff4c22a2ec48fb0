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

//! SkyTree: sequential recursive skyline engine.
//!
//! Each recursion level selects a skyline-resident pivot, partitions the
//! remaining points by their d-bit lattice code against the pivot, and
//! recurses per non-empty subregion. A point with the all-ones code is
//! dominated by the pivot and dropped on the spot; a point
//! coordinate-equal to the pivot joins the equivalence list `eqm` and is
//! re-appended to the final output.
//!
//! Between sibling subregions only *partial dominance* is possible: a
//! bucket with code `c` can contain dominated points only relative to
//! siblings whose code is a sub-mask of `c`. Children are kept in
//! ascending code order so both the sibling filter and the recursive
//! [`filter_point`] walk can break early.
//!
//! Two filtering strategies:
//!
//! - default: each new bucket is filtered against the already-built
//!   sibling subtrees *before* recursing into it;
//! - `use_dnc`: every bucket recurses first, then sibling subtrees are
//!   compared pairwise, flagging dominated points in a side table and
//!   unlinking childless dominated nodes.

use skybench_core::{all_ones, bitmap_dvc, dominate_left, equal, Point};
use std::collections::BTreeMap;

use crate::pivot::PivotSelection;
use crate::{RunStats, SkylineSolver};

/// One node of the lattice tree: a pivot point, its code relative to the
/// parent pivot, and children in ascending code order.
struct Node {
    point: Point,
    lattice: u32,
    children: Vec<Node>,
}

fn count_nodes(node: &Node) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

/// Sequential recursive skyline engine.
pub struct SkyTree {
    dims: usize,
    data: Vec<Point>,
    use_dnc: bool,
    /// Per-pid flags for the divide-and-conquer variant.
    dominated: Vec<bool>,
    skyline: Vec<u32>,
    eqm: Vec<u32>,
    stats: RunStats,
}

impl SkyTree {
    pub fn new(dims: usize, rows: &[Vec<f32>], use_dnc: bool) -> Self {
        let data = Point::from_rows(rows);
        let dominated = if use_dnc {
            vec![false; data.len()]
        } else {
            Vec::new()
        };
        Self {
            dims,
            data,
            use_dnc,
            dominated,
            skyline: Vec::with_capacity(1024),
            eqm: Vec::with_capacity(1024),
            stats: RunStats::default(),
        }
    }

    fn compute_skytree(
        &mut self,
        min_list: Vec<f32>,
        max_list: Vec<f32>,
        mut data: Vec<Point>,
        lattice: u32,
    ) -> Node {
        PivotSelection::new(&min_list, &max_list).execute(&mut data);

        let pivot = data[0].clone();
        let buckets = self.map_points_to_regions(&pivot, data);

        let mut node = Node {
            point: pivot,
            lattice,
            children: Vec::new(),
        };

        for (code, mut bucket) in buckets {
            if !self.use_dnc && !node.children.is_empty() {
                Self::partial_dominance(code, &mut bucket, &node);
            }
            if bucket.is_empty() {
                continue;
            }

            let mut min2 = vec![0.0f32; self.dims];
            let mut max2 = vec![0.0f32; self.dims];
            for d in 0..self.dims {
                if code & (1 << d) != 0 {
                    min2[d] = node.point.elems[d];
                    max2[d] = max_list[d];
                } else {
                    min2[d] = min_list[d];
                    max2[d] = node.point.elems[d];
                }
            }

            let mut child = self.compute_skytree(min2, max2, bucket, code);

            if self.use_dnc && !node.children.is_empty() {
                Self::partial_dominance_with_trees(
                    code,
                    &node.children,
                    &mut child,
                    &mut self.dominated,
                );
            }
            node.children.push(child);
        }

        node
    }

    /// Partition every point after the pivot into per-lattice buckets,
    /// dropping pivot-dominated points and diverting pivot-equal points
    /// to `eqm`. The returned map iterates in ascending code order.
    fn map_points_to_regions(
        &mut self,
        pivot: &Point,
        data: Vec<Point>,
    ) -> BTreeMap<u32, Vec<Point>> {
        let pruned = all_ones(self.dims);
        let mut buckets: BTreeMap<u32, Vec<Point>> = BTreeMap::new();

        for t in data.into_iter().skip(1) {
            if equal(&pivot.elems, &t.elems) {
                self.eqm.push(t.pid);
                continue;
            }
            let lattice = bitmap_dvc(&t.elems, &pivot.elems);
            if lattice < pruned {
                debug_assert!(!dominate_left(&pivot.elems, &t.elems));
                buckets.entry(lattice).or_default().push(t);
            }
        }
        buckets
    }

    /// Filter a new bucket against the subtrees of older siblings whose
    /// lattice code is a sub-mask of the bucket's.
    fn partial_dominance(lattice: u32, bucket: &mut Vec<Point>, parent: &Node) {
        for child in &parent.children {
            if child.lattice > lattice {
                break;
            }
            if child.lattice & lattice == child.lattice {
                bucket.retain(|t| !Self::filter_point(t, child));
                if bucket.is_empty() {
                    break;
                }
            }
        }
    }

    /// Whether `cur` is dominated by the subtree's pivot or by any
    /// applicable descendant. Children are visited in ascending code
    /// order so the walk can stop at the first code above `cur`'s.
    fn filter_point(cur: &Point, subtree: &Node) -> bool {
        let pruned = all_ones(cur.elems.len());
        let lattice = bitmap_dvc(&cur.elems, &subtree.point.elems);

        if lattice < pruned {
            for child in &subtree.children {
                if child.lattice > lattice {
                    break;
                }
                if child.lattice & lattice == child.lattice && Self::filter_point(cur, child) {
                    return true;
                }
            }
            false
        } else {
            debug_assert!(
                dominate_left(&subtree.point.elems, &cur.elems)
                    || equal(&subtree.point.elems, &cur.elems)
            );
            true
        }
    }

    /// Divide-and-conquer sibling filtering: walk the freshly built
    /// subtree and flag every node dominated by an older sibling whose
    /// code sub-masks `lattice`; childless dominated nodes are unlinked.
    ///
    /// Returns whether the subtree's own pivot is dominated.
    fn partial_dominance_with_trees(
        lattice: u32,
        siblings: &[Node],
        right: &mut Node,
        dominated: &mut [bool],
    ) -> bool {
        right.children.retain_mut(|child| {
            let dom = Self::partial_dominance_with_trees(lattice, siblings, child, dominated);
            !(dom && child.children.is_empty())
        });

        for left in siblings {
            if left.lattice > lattice {
                break;
            }
            if left.lattice & lattice == left.lattice && Self::filter_point(&right.point, left) {
                dominated[right.point.pid as usize] = true;
                return true;
            }
        }
        false
    }

    /// Pre-order emission; the DnC side table suppresses flagged pids.
    fn traverse(&mut self, node: &Node) {
        if !self.use_dnc || !self.dominated[node.point.pid as usize] {
            self.skyline.push(node.point.pid);
        }
        for child in &node.children {
            self.traverse(child);
        }
    }
}

impl SkylineSolver for SkyTree {
    fn execute(&mut self) -> Vec<u32> {
        self.skyline.clear();
        self.eqm.clear();
        if self.data.is_empty() {
            return Vec::new();
        }

        let min_list = vec![0.0f32; self.dims];
        let max_list = vec![1.0f32; self.dims];
        let data = self.data.clone();

        let root = self.compute_skytree(min_list, max_list, data, 0);
        self.traverse(&root);

        if self.use_dnc {
            tracing::debug!(
                tree_size = count_nodes(&root),
                skyline_size = self.skyline.len(),
                "skytree built"
            );
        }

        self.skyline.extend_from_slice(&self.eqm);
        self.stats.skyline_size = self.skyline.len();
        self.skyline.clone()
    }

    fn stats(&self) -> RunStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(rows: &[Vec<f32>], use_dnc: bool) -> Vec<u32> {
        let dims = rows.first().map_or(0, |r| r.len());
        let mut tree = SkyTree::new(dims, rows, use_dnc);
        let mut out = tree.execute();
        out.sort_unstable();
        out
    }

    #[test]
    fn test_mixed_skyline() {
        let rows = vec![
            vec![1.0, 2.0],
            vec![2.0, 1.0],
            vec![3.0, 3.0],
            vec![0.5, 5.0],
            vec![5.0, 0.5],
        ];
        assert_eq!(run(&rows, false), vec![0, 1, 3, 4]);
        assert_eq!(run(&rows, true), vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_chain_leaves_single_point() {
        let rows = vec![vec![1.0, 2.0], vec![2.0, 3.0], vec![3.0, 4.0]];
        assert_eq!(run(&rows, false), vec![0]);
        assert_eq!(run(&rows, true), vec![0]);
    }

    #[test]
    fn test_antichain_keeps_everything() {
        let rows = vec![
            vec![1.0, 4.0],
            vec![2.0, 3.0],
            vec![3.0, 2.0],
            vec![4.0, 1.0],
        ];
        assert_eq!(run(&rows, false), vec![0, 1, 2, 3]);
        assert_eq!(run(&rows, true), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_duplicates_all_survive_via_eqm() {
        let rows = vec![vec![1.0, 1.0, 1.0]; 5];
        assert_eq!(run(&rows, false), vec![0, 1, 2, 3, 4]);
        assert_eq!(run(&rows, true), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_equal_on_one_dim() {
        let rows = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]];
        assert_eq!(run(&rows, false), vec![0]);
        assert_eq!(run(&rows, true), vec![0]);
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(run(&[], false), Vec::<u32>::new());
        assert_eq!(run(&[vec![0.4, 0.2]], false), vec![0]);
    }
}
