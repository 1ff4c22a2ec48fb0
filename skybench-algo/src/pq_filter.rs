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

//! Priority-queue pre-filter.
//!
//! Points with a small Manhattan norm are strong pruners: a handful of
//! them typically dominates a large share of the input. The filter
//! keeps, per parallel worker, the K lowest-norm points seen (max-heap
//! keyed by score, so the heap top is the worst of the best), merges the
//! worker heaps into one pruner set of at most workers x K points, and
//! then drops every point dominated by some pruner.
//!
//! Side effect: the Manhattan norm of every point is computed and stored
//! in its `score` field, which the downstream sort phases rely on.

use rayon::prelude::*;
use skybench_core::{dominate_left, manhattan, EncodedPoint};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry ordered by score; the heap top is the *largest* score
/// among the K best so far.
struct HeapEntry {
    score: f32,
    index: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score.total_cmp(&other.score) == Ordering::Equal
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score)
    }
}

pub struct PqFilter;

impl PqFilter {
    /// Run the pre-filter over `data` with per-worker queue capacity
    /// `pq_size`, splitting the scan across `num_threads` chunks.
    /// Pruned points are removed by swap-with-tail; returns the new
    /// size.
    pub fn execute(data: &mut Vec<EncodedPoint>, pq_size: usize, num_threads: usize) -> usize {
        let n = data.len();
        if n == 0 {
            return 0;
        }
        let k = pq_size.clamp(1, n);

        // Score everything up front; every queue is seeded from the
        // first k points.
        data.par_iter_mut()
            .for_each(|t| t.score = manhattan(&t.elems));

        let seed: Vec<HeapEntry> = data[..k]
            .iter()
            .enumerate()
            .map(|(i, t)| HeapEntry {
                score: t.score,
                index: i,
            })
            .collect();

        let chunk_len = n.div_ceil(num_threads.max(1));
        let pruner_idx: Vec<usize> = data
            .par_chunks(chunk_len)
            .enumerate()
            .flat_map_iter(|(chunk_no, chunk)| {
                let base = chunk_no * chunk_len;
                let mut heap: BinaryHeap<HeapEntry> = seed
                    .iter()
                    .map(|e| HeapEntry {
                        score: e.score,
                        index: e.index,
                    })
                    .collect();
                for (off, t) in chunk.iter().enumerate() {
                    if heap.peek().map_or(false, |w| w.score > t.score) {
                        heap.pop();
                        heap.push(HeapEntry {
                            score: t.score,
                            index: base + off,
                        });
                    }
                }
                heap.into_iter().map(|e| e.index).collect::<Vec<_>>()
            })
            .collect();

        // Pruner coordinates are snapshotted so the marking pass can
        // mutate the buffer it reads them from.
        let pruners: Vec<Vec<f32>> = pruner_idx.iter().map(|&i| data[i].elems.clone()).collect();

        data.par_iter_mut().for_each(|t| {
            for p in &pruners {
                if dominate_left(p, &t.elems) {
                    t.mark_pruned();
                    break;
                }
            }
        });

        let mut i = 0;
        while i < data.len() {
            if data[i].is_pruned() {
                data.swap_remove(i);
            } else {
                i += 1;
            }
        }

        tracing::debug!(
            pruned = n - data.len(),
            total = n,
            pruners = pruners.len(),
            "pq-filter done"
        );
        data.len()
    }
}
