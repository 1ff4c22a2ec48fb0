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

//! PSkyline: parallel map + sequential reduce of simple skylines.
//!
//! The buffer splits into one contiguous range per thread (the last
//! range absorbs the remainder). **PMap** runs a classic
//! block-nested-loop skyline on each range in parallel, compacting the
//! local skyline to its front. **SReduce** then folds the ranges
//! together with **PMerge**: the right block shifts down to be
//! contiguous with the left, and every left point is checked in
//! parallel against the right block over a shared flag array, killing
//! right points it dominates and dying itself if dominated. A
//! sequential compaction by flag closes each merge.
//!
//! The flag array is the only cross-thread write surface; relaxed
//! atomics suffice because every phase ends at a barrier and the
//! sequential compaction re-reads everything.

use rayon::prelude::*;
use skybench_core::{dominance, Dominance, Point};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::{RunStats, SkylineSolver};

/// A contiguous range of the buffer holding a local skyline in its
/// first `size` slots.
#[derive(Debug, Clone, Copy)]
struct Block {
    start: usize,
    size: usize,
}

pub struct PSkyline {
    num_threads: usize,
    data: Vec<Point>,
    skyline: Vec<u32>,
    stats: RunStats,
}

impl PSkyline {
    pub fn new(_dims: usize, rows: &[Vec<f32>], num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
            data: Point::from_rows(rows),
            skyline: Vec::with_capacity(1024),
            stats: RunStats::default(),
        }
    }

    /// Classic sequential BNL over one range, compacting survivors to
    /// the front; returns the local skyline size.
    fn sskyline(d: &mut [Point]) -> usize {
        let mut head = 0usize;
        let mut tail = d.len() - 1;

        while head < tail {
            let mut i = head + 1;
            while i <= tail {
                match dominance(&d[head].elems, &d[i].elems) {
                    Dominance::Left => {
                        d.swap(i, tail);
                        tail -= 1;
                    }
                    Dominance::Right => {
                        // New head; the old one is dominated and leaves
                        // through the tail.
                        d.swap(head, i);
                        d.swap(i, tail);
                        tail -= 1;
                        i = head + 1;
                    }
                    Dominance::Incomparable => i += 1,
                }
            }
            head += 1;
        }
        tail + 1
    }

    /// Does `x` survive against the right block? Kills right points it
    /// dominates on the way through.
    fn check_survival(x: &Point, right: &[Point], right_flags: &[AtomicBool]) -> bool {
        for (j, s) in right.iter().enumerate() {
            if right_flags[j].load(Ordering::Relaxed) {
                continue;
            }
            match dominance(&x.elems, &s.elems) {
                Dominance::Left => right_flags[j].store(true, Ordering::Relaxed),
                Dominance::Right => return false,
                Dominance::Incomparable => {}
            }
        }
        true
    }

    /// Merge two adjacent local skylines into one, in place.
    fn pmerge(&mut self, left: Block, right: Block, flags: &[AtomicBool]) -> Block {
        // Shift the right block down so the two skylines are contiguous.
        let dst = left.start + left.size;
        if dst != right.start {
            for k in 0..right.size {
                self.data.swap(dst + k, right.start + k);
            }
        }

        let joint = left.size + right.size;
        for f in &flags[left.start..left.start + joint] {
            f.store(false, Ordering::Relaxed);
        }

        {
            let left_points = &self.data[left.start..dst];
            let right_points = &self.data[dst..dst + right.size];
            let left_flags = &flags[left.start..dst];
            let right_flags = &flags[dst..dst + right.size];

            left_points.par_iter().enumerate().for_each(|(i, x)| {
                if !Self::check_survival(x, right_points, right_flags) {
                    left_flags[i].store(true, Ordering::Relaxed);
                }
            });
        }

        // Compact both ranges by flag.
        let mut count = 0usize;
        for i in 0..joint {
            if !flags[left.start + i].load(Ordering::Relaxed) {
                self.data.swap(left.start + count, left.start + i);
                count += 1;
            }
        }

        Block {
            start: left.start,
            size: count,
        }
    }
}

impl SkylineSolver for PSkyline {
    fn execute(&mut self) -> Vec<u32> {
        let n = self.data.len();
        if n == 0 {
            return Vec::new();
        }
        let threads = self.num_threads.min(n);
        let range_len = n / threads;

        // PMap: one sskyline per disjoint range.
        let t0 = Instant::now();
        let mut blocks: Vec<Block> = Vec::with_capacity(threads);
        {
            let mut slices: Vec<&mut [Point]> = Vec::with_capacity(threads);
            let mut rest: &mut [Point] = &mut self.data;
            let mut offset = 0usize;
            for i in 0..threads {
                let take = if i + 1 == threads {
                    rest.len()
                } else {
                    range_len
                };
                let (range, tail) = std::mem::take(&mut rest).split_at_mut(take);
                slices.push(range);
                rest = tail;
                blocks.push(Block {
                    start: offset,
                    size: 0,
                });
                offset += take;
            }

            let sizes: Vec<usize> = slices
                .into_par_iter()
                .map(|range| Self::sskyline(range))
                .collect();
            for (block, size) in blocks.iter_mut().zip(sizes) {
                block.size = size;
            }
        }
        self.stats.add_phase1(t0.elapsed());

        // SReduce: fold the local skylines left to right.
        let t0 = Instant::now();
        let flags: Vec<AtomicBool> = (0..n).map(|_| AtomicBool::new(false)).collect();
        let mut result = blocks[0];
        for &right in &blocks[1..] {
            result = self.pmerge(result, right, &flags);
        }
        self.stats.add_phase2(t0.elapsed());

        self.skyline = self.data[..result.size].iter().map(|t| t.pid).collect();
        self.stats.skyline_size = result.size;
        self.skyline.clone()
    }

    fn stats(&self) -> RunStats {
        self.stats
    }
}
