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

//! ParallelBSkyTree: the SkyTree inner loop, parallelized.
//!
//! One pivot-selection pass and one flat lattice partitioning (the code
//! is stored per point rather than in a recursive tree), then a
//! block-pipelined sweep: a window of "temporal heads" scans the rest
//! of the buffer in parallel, exploiting region-level incomparability —
//! two partitions can interact only if one code is a sub-mask of the
//! other. The parallel phase records kills in a per-index dead-flag
//! array (no compaction while threads run); a sequential phase then
//! resolves the heads among themselves and compacts the buffer with a
//! two-pointer pass.
//!
//! A head that is dominated adopts its dominator in place, so two heads
//! can race to adopt the same point; the sequential phase removes the
//! resulting pid duplicates.

use rayon::prelude::*;
use skybench_core::{
    all_ones, bitmap_dvc, dominance_dvc, dominate_left, equal, Dominance, EncodedPoint,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::pivot::PivotSelection;
use crate::{RunStats, SkylineSolver, BSKYTREE_ACCUM};

pub struct ParallelBSkyTree {
    dims: usize,
    data: Vec<EncodedPoint>,
    skyline: Vec<u32>,
    eqm: Vec<u32>,
    stats: RunStats,
}

impl ParallelBSkyTree {
    pub fn new(dims: usize, rows: &[Vec<f32>]) -> Self {
        Self {
            dims,
            data: EncodedPoint::from_rows(rows),
            skyline: Vec::with_capacity(1024),
            eqm: Vec::with_capacity(1024),
            stats: RunStats::default(),
        }
    }

    /// Assign each point its lattice code against the pivot in
    /// `data[0]`, dropping pivot-dominated points and diverting
    /// pivot-equal points to `eqm`.
    fn do_partitioning(&mut self) {
        let pruned = all_ones(self.dims);
        let pivot_elems = self.data[0].elems.clone();

        let mut i = 1;
        while i < self.data.len() {
            if equal(&pivot_elems, &self.data[i].elems) {
                self.eqm.push(self.data[i].pid);
                self.data.swap_remove(i);
                continue;
            }
            let lattice = bitmap_dvc(&self.data[i].elems, &pivot_elems);
            if lattice < pruned {
                debug_assert!(!dominate_left(&pivot_elems, &self.data[i].elems));
                self.data[i].partition = lattice;
                i += 1;
            } else {
                self.data.swap_remove(i);
            }
        }
    }

    fn sweep(&mut self) -> usize {
        let n = self.data.len();
        let dead: Vec<AtomicBool> = (0..n).map(|_| AtomicBool::new(false)).collect();

        let mut head = 1usize; // first slot after the confirmed heads
        let mut tail = n - 1; // last active slot

        while head < tail {
            let htail = (head + BSKYTREE_ACCUM - 1).min(tail);

            // Parallel: every temporal head scans the active region
            // beyond the window. Kills are flagged, never compacted; a
            // dominated head adopts its dominator in place.
            let t0 = Instant::now();
            {
                let (window, beyond) = self.data.split_at_mut(htail + 1);
                let heads = &mut window[head..];
                let active = &beyond[..tail - htail];
                let active_dead = &dead[htail + 1..=tail];

                heads.par_iter_mut().for_each(|th| {
                    let mut cur = 0usize;
                    while cur < active.len() {
                        if active_dead[cur].load(Ordering::Relaxed) {
                            cur += 1;
                            continue;
                        }
                        let other = &active[cur];
                        let meet = th.partition & other.partition;
                        if meet == th.partition || meet == other.partition {
                            match dominance_dvc(&th.elems, &other.elems) {
                                Dominance::Left => {
                                    active_dead[cur].store(true, Ordering::Relaxed);
                                    cur += 1;
                                }
                                Dominance::Right => {
                                    active_dead[cur].store(true, Ordering::Relaxed);
                                    *th = other.clone();
                                    cur = 0;
                                }
                                Dominance::Incomparable => cur += 1,
                            }
                        } else {
                            cur += 1; // region-level incomparability
                        }
                    }
                });
            }
            self.stats.add_phase1(t0.elapsed());

            // Sequential: resolve the window heads among themselves,
            // removing pid duplicates left by racing adoptions.
            let t0 = Instant::now();
            let mut htail_m = htail;
            let mut th = head;
            while th <= htail_m {
                let mut c = th + 1;
                while c <= htail_m {
                    if self.data[th].pid == self.data[c].pid {
                        dead[htail_m].store(true, Ordering::Relaxed);
                        self.data.swap(c, htail_m);
                        htail_m -= 1;
                    } else {
                        match dominance_dvc(&self.data[th].elems, &self.data[c].elems) {
                            Dominance::Left => {
                                dead[htail_m].store(true, Ordering::Relaxed);
                                self.data.swap(c, htail_m);
                                htail_m -= 1;
                            }
                            Dominance::Right => {
                                self.data.swap(th, c);
                                dead[htail_m].store(true, Ordering::Relaxed);
                                self.data.swap(c, htail_m);
                                htail_m -= 1;
                                c = th + 1;
                            }
                            Dominance::Incomparable => c += 1,
                        }
                    }
                }
                th += 1;
            }
            head = htail_m + 1;

            // Compact: pull alive tail points into dead slots.
            let mut first_dead = head;
            let mut last_alive = tail;
            while first_dead < last_alive {
                while !dead[first_dead].load(Ordering::Relaxed) && first_dead < last_alive {
                    first_dead += 1;
                }
                while dead[last_alive].load(Ordering::Relaxed) {
                    last_alive -= 1;
                }
                if last_alive > first_dead {
                    dead[first_dead].store(false, Ordering::Relaxed);
                    dead[last_alive].store(true, Ordering::Relaxed);
                    self.data.swap(first_dead, last_alive);
                    first_dead += 1;
                    last_alive -= 1;
                }
            }
            tail = last_alive;
            while dead[tail].load(Ordering::Relaxed) {
                tail -= 1;
            }
            self.stats.add_compress(t0.elapsed());
        }
        tail + 1
    }
}

impl SkylineSolver for ParallelBSkyTree {
    fn execute(&mut self) -> Vec<u32> {
        if self.data.is_empty() {
            return Vec::new();
        }

        let min_list = vec![0.0f32; self.dims];
        let max_list = vec![1.0f32; self.dims];
        PivotSelection::new(&min_list, &max_list).execute(&mut self.data);
        self.do_partitioning();

        let survived = self.sweep();
        self.skyline = self.data[..survived].iter().map(|t| t.pid).collect();
        self.skyline.extend_from_slice(&self.eqm);
        self.stats.skyline_size = self.skyline.len();
        self.skyline.clone()
    }

    fn stats(&self) -> RunStats {
        self.stats
    }
}
