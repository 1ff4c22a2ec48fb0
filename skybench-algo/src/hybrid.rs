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

//! Hybrid: two-level partitioned, score-sorted parallel skyline engine.
//!
//! Initialization runs the priority-queue pre-filter, assigns every
//! point to one of 2^d orthants around the per-dimension medians, and
//! sorts by the packed (level | mask) word with a Manhattan-norm
//! tiebreak. Because a dominator always has a sub-mask (hence an equal
//! or lower level) and a smaller norm than its victim, a point can only
//! ever be dominated by points sorted before it.
//!
//! Execution sweeps the buffer in alpha-sized blocks:
//!
//! - **Phase I** (parallel): test each block point against the confirmed
//!   skyline prefix, walking the partition map and skipping every
//!   partition holding a bit the point lacks. Within a partition, one
//!   bitmap against the partition head prunes or pre-screens the rest
//!   via each member's secondary mask.
//! - **Phase II** (parallel): test the surviving block points against
//!   their earlier peers, level by level, partition by partition,
//!   stopping at equal norms (an equal Manhattan norm means equal or
//!   incomparable).
//! - Sequential compression between and after the phases re-sorts the
//!   block (pruned points carry the maximal word and sink to its end),
//!   appends survivors to the prefix, and extends the partition map,
//!   assigning each non-head member its secondary mask relative to the
//!   head of its run.

use rayon::prelude::*;
use skybench_core::{
    all_ones, bitmap_dvc, bitmap_ndvc, dominate_left, dominate_left_dvc, equal, EncodedPoint,
    Result, SkybenchError, MAX_ENCODED_DIMS,
};
use std::time::Instant;

use crate::pq_filter::PqFilter;
use crate::{AlgoParams, RunStats, SkylineSolver};

/// Partition map entry: (lattice mask, start index of the run in the
/// confirmed prefix). The last entry is a sentinel marking the end of
/// the prefix.
type PartEntry = (u32, usize);

pub struct Hybrid {
    dims: usize,
    num_threads: usize,
    alpha: usize,
    pq_size: usize,
    data: Vec<EncodedPoint>,
    part_map: Vec<PartEntry>,
    skyline: Vec<u32>,
    stats: RunStats,
}

impl Hybrid {
    /// Errors when `dims` exceeds the packed partition-word width; the
    /// level field would silently shift off the top of the word and
    /// corrupt the encoded sort order.
    pub fn new(
        dims: usize,
        rows: &[Vec<f32>],
        num_threads: usize,
        params: &AlgoParams,
    ) -> Result<Self> {
        if dims > MAX_ENCODED_DIMS {
            return Err(SkybenchError::Dimensionality {
                got: dims,
                max: MAX_ENCODED_DIMS,
            });
        }
        Ok(Self {
            dims,
            num_threads,
            alpha: params.alpha,
            pq_size: params.pq_size,
            data: EncodedPoint::from_rows(rows),
            part_map: Vec::with_capacity(1024),
            skyline: Vec::with_capacity(1024),
            stats: RunStats::default(),
        })
    }

    /// Partition by the median value of every dimension and sort by the
    /// encoded partition word.
    fn partition(&mut self) {
        let n = self.data.len();
        let dims = self.dims;

        let medians: Vec<f32> = (0..dims)
            .into_par_iter()
            .map(|d| {
                let mut column: Vec<f32> = self.data.iter().map(|t| t.elems[d]).collect();
                column.sort_unstable_by(f32::total_cmp);
                column[n / 2]
            })
            .collect();

        self.data.par_iter_mut().for_each(|t| {
            let mask = bitmap_ndvc(&t.elems, &medians);
            t.set_partition(mask, dims);
        });

        self.data
            .par_sort_unstable_by(|a, b| a.encoded_order(b));
    }

    /// Phase I: is `t` dominated by a confirmed skyline point? Walks the
    /// partition map over the prefix; `t` is marked pruned in place.
    fn compare_to_skyline_points(
        dims: usize,
        t: &mut EncodedPoint,
        prefix: &[EncodedPoint],
        part_map: &[PartEntry],
    ) {
        let full = all_ones(dims);

        for window in part_map.windows(2) {
            let (code, begin) = window[0];
            let end = window[1].1;
            if begin >= end || t.can_skip_partition(code, dims) {
                continue;
            }

            // One bitmap against the partition head decides the head and
            // pre-screens the members.
            let head = &prefix[begin];
            let bitmap = bitmap_dvc(&t.elems, &head.elems);
            if bitmap == full && !equal(&t.elems, &head.elems) {
                t.mark_pruned();
                return;
            }

            for member in &prefix[begin + 1..end] {
                // A member with a secondary bit t's bitmap lacks sits
                // strictly above the head on a dimension where t sits
                // below it: it cannot dominate t.
                if (!bitmap & member.partition) != 0 && member.partition != 0 {
                    continue;
                }
                if dominate_left(&member.elems, &t.elems) {
                    t.mark_pruned();
                    return;
                }
            }
        }
    }

    /// Phase II: is `block[me]` dominated by an earlier peer in the same
    /// block? The block is sorted, so only peers before `me` qualify.
    fn peers_dominate(dims: usize, block: &[EncodedPoint], me: usize) -> bool {
        let t = &block[me];
        let my_level = t.level(dims);
        let my_mask = t.mask(dims);
        let mut j = 0;

        // Partitions on lower levels, distinct-value condition assumed.
        while j < me {
            let peer = &block[j];
            if peer.level(dims) == my_level {
                break;
            }
            if !t.can_skip_partition(peer.mask(dims), dims)
                && dominate_left_dvc(&peer.elems, &t.elems)
            {
                return true;
            }
            j += 1;
        }

        // Same-level partitions with a different mask cannot dominate.
        while j < me && block[j].mask(dims) < my_mask {
            j += 1;
        }

        // Same partition, strictly smaller norm; an equal norm means
        // equal or incomparable, neither of which dominates.
        while j < me && block[j].score < t.score {
            if dominate_left_dvc(&block[j].elems, &t.elems) {
                return true;
            }
            j += 1;
        }
        false
    }

    /// Extend the partition map over the freshly confirmed range
    /// `[start, end)`: a new mask opens a new run; every other point
    /// gets its secondary mask relative to the head of its run.
    fn update_partition_map(&mut self, start: usize, end: usize) {
        let dims = self.dims;
        self.part_map.pop(); // sentinel

        let &(mut last_mask, run_start) = self
            .part_map
            .last()
            .expect("partition map holds at least the initial entry");
        let mut head_elems = self.data[run_start].elems.clone();

        for i in start..end {
            let mask = self.data[i].mask(dims);
            if mask != last_mask {
                last_mask = mask;
                head_elems = self.data[i].elems.clone();
                self.part_map.push((mask, i));
            } else {
                // Fine-grained second-level mask; this point is never
                // sorted again, so the raw bitcode can overwrite the
                // encoded word.
                let bitcode = bitmap_dvc(&self.data[i].elems, &head_elems);
                self.data[i].partition = bitcode;
            }
        }

        self.part_map.push((0, end)); // sentinel
    }

    /// Block-pipelined sweep; returns the number of skyline points
    /// compacted to the front of the buffer.
    fn skyline_pass(&mut self) -> usize {
        let n = self.data.len();
        let dims = self.dims;
        let alpha = self.alpha.max(1);

        let mut head = 0usize;
        let mut start = 0usize;

        // Initial map covers an empty prefix; the first block is fully
        // resolved by Phase II.
        self.part_map.clear();
        let first_mask = self.data[0].mask(dims);
        self.part_map.push((first_mask, 0));
        self.part_map.push((first_mask, 0)); // sentinel

        while start < n {
            let mut stop = (start + alpha).min(n);

            // Phase I (parallel): block vs confirmed skyline.
            let t0 = Instant::now();
            {
                let (prefix, tail) = self.data.split_at_mut(start);
                let prefix = &*prefix;
                let part_map = &self.part_map;
                tail[..stop - start]
                    .par_iter_mut()
                    .for_each(|t| Self::compare_to_skyline_points(dims, t, prefix, part_map));
            }
            self.stats.add_phase1(t0.elapsed());

            // Compression: pruned points sort past the live ones.
            let t0 = Instant::now();
            self.data[start..stop].sort_unstable_by(|a, b| a.encoded_order(b));
            while stop > start && self.data[stop - 1].is_pruned() {
                stop -= 1;
            }
            self.stats.add_compress(t0.elapsed());

            // Phase II (parallel): survivors vs earlier peers.
            let t0 = Instant::now();
            let verdicts: Vec<bool> = {
                let block = &self.data[start..stop];
                (0..block.len())
                    .into_par_iter()
                    .map(|me| Self::peers_dominate(dims, block, me))
                    .collect()
            };
            self.stats.add_phase2(t0.elapsed());

            let t0 = Instant::now();
            for (off, dead) in verdicts.into_iter().enumerate() {
                if dead {
                    self.data[start + off].mark_pruned();
                }
            }
            self.data[start..stop].sort_unstable_by(|a, b| a.encoded_order(b));

            // Append survivors to the confirmed prefix and index them.
            let head_old = head;
            let mut i = start;
            while i < stop && !self.data[i].is_pruned() {
                self.data.swap(head, i);
                head += 1;
                i += 1;
            }
            self.update_partition_map(head_old, head);
            self.stats.add_compress(t0.elapsed());

            start += alpha;
        }
        head
    }
}

impl SkylineSolver for Hybrid {
    fn init(&mut self) {
        if self.data.is_empty() {
            return;
        }
        let n0 = self.data.len();
        let pruned_to = PqFilter::execute(&mut self.data, self.pq_size, self.num_threads);
        self.stats.prefilter_pruned = n0 - pruned_to;
        self.partition();
    }

    fn execute(&mut self) -> Vec<u32> {
        if self.data.is_empty() {
            return Vec::new();
        }

        let head = self.skyline_pass();
        self.data.truncate(head);
        self.skyline = self.data.iter().map(|t| t.pid).collect();
        self.stats.skyline_size = head;
        self.skyline.clone()
    }

    fn stats(&self) -> RunStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use skybench_core::dominate_left;

    fn run(rows: &[Vec<f32>], threads: usize, params: &AlgoParams) -> Vec<u32> {
        let dims = rows.first().map_or(0, |r| r.len());
        let mut solver =
            Hybrid::new(dims, rows, threads, &params.clamp_for(rows.len())).expect("valid dims");
        solver.init();
        let mut out = solver.execute();
        out.sort_unstable();
        out
    }

    fn naive_skyline(rows: &[Vec<f32>]) -> Vec<u32> {
        (0..rows.len())
            .filter(|&i| {
                !rows
                    .iter()
                    .enumerate()
                    .any(|(j, q)| j != i && dominate_left(q, &rows[i]))
            })
            .map(|i| i as u32)
            .collect()
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
        assert_eq!(run(&rows, 2, &AlgoParams::default()), vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_duplicates_survive() {
        let rows = vec![vec![1.0, 1.0, 1.0]; 5];
        assert_eq!(run(&rows, 2, &AlgoParams::default()), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_matches_naive_on_random_with_small_blocks() {
        // A small alpha forces many pipeline rounds, exercising the
        // partition map and the secondary masks.
        let mut rng = StdRng::seed_from_u64(99);
        let rows: Vec<Vec<f32>> = (0..400)
            .map(|_| (0..3).map(|_| rng.gen_range(0.0..1.0)).collect())
            .collect();
        let expected = naive_skyline(&rows);

        let params = AlgoParams {
            alpha: 16,
            pq_size: 4,
        };
        assert_eq!(run(&rows, 3, &params), expected);
    }

    #[test]
    fn test_secondary_mask_never_skips_a_dominator() {
        // Clustered points landing in the same median orthant, so the
        // second-level masks are what decides the Phase I member scans.
        let mut rng = StdRng::seed_from_u64(5);
        let mut rows: Vec<Vec<f32>> = (0..200)
            .map(|_| (0..3).map(|_| rng.gen_range(0.4..0.6)).collect())
            .collect();
        // Chains inside the cluster guarantee prefix-vs-block prunes.
        for i in 0..50 {
            let base = rows[i].clone();
            rows.push(base.iter().map(|v| v + 0.01).collect());
        }
        let expected = naive_skyline(&rows);

        let params = AlgoParams {
            alpha: 8,
            pq_size: 2,
        };
        assert_eq!(run(&rows, 2, &params), expected);
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(run(&[], 2, &AlgoParams::default()), Vec::<u32>::new());
        assert_eq!(run(&[vec![0.5, 0.5]], 2, &AlgoParams::default()), vec![0]);
    }

    #[test]
    fn test_rejects_unencodable_width() {
        // 28 lattice bits leave no room for the level field.
        let rows = vec![vec![0.5; 28]];
        assert!(matches!(
            Hybrid::new(28, &rows, 2, &AlgoParams::default()),
            Err(SkybenchError::Dimensionality { got: 28, max }) if max == MAX_ENCODED_DIMS
        ));
        let rows = vec![vec![0.5; MAX_ENCODED_DIMS]];
        assert!(Hybrid::new(MAX_ENCODED_DIMS, &rows, 2, &AlgoParams::default()).is_ok());
    }
}
