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

//! QFlow: sort by Manhattan norm, then sweep in parallel alpha-blocks.
//!
//! After the score sort, a point can only be dominated by points sorted
//! before it (a dominator has a strictly smaller norm), so a single
//! left-to-right pass suffices. Each block is tested in parallel
//! against the confirmed skyline (Phase I), compacted, tested against
//! its own earlier candidates (Phase II), and the confirmed survivors
//! are appended to the prefix.

use rayon::prelude::*;
use skybench_core::{dominate_left, manhattan, ScoredPoint};
use std::time::Instant;

use crate::{AlgoParams, RunStats, SkylineSolver};

pub struct QFlow {
    alpha: usize,
    data: Vec<ScoredPoint>,
    skyline: Vec<u32>,
    stats: RunStats,
}

impl QFlow {
    pub fn new(_dims: usize, rows: &[Vec<f32>], params: &AlgoParams) -> Self {
        Self {
            alpha: params.alpha.max(1),
            data: ScoredPoint::from_rows(rows),
            skyline: Vec::with_capacity(1024),
            stats: RunStats::default(),
        }
    }

    /// Sweep the sorted buffer; returns the skyline size, with the
    /// skyline compacted to the front.
    fn skyline_pass(&mut self) -> usize {
        let n = self.data.len();
        let alpha = self.alpha;

        // data[0] has the minimal norm: nothing can dominate it.
        let mut head = 0usize;
        let mut start = 1usize;

        while start < n {
            let stop = (start + alpha).min(n);

            // Phase I (parallel): block vs confirmed skyline.
            let t0 = Instant::now();
            let survivors: Vec<bool> = {
                let confirmed = &self.data[..=head];
                let block = &self.data[start..stop];
                block
                    .par_iter()
                    .map(|t| !confirmed.iter().any(|s| dominate_left(&s.elems, &t.elems)))
                    .collect()
            };
            self.stats.add_phase1(t0.elapsed());

            // Compact candidates onto the prefix.
            let t0 = Instant::now();
            let mut cand_end = head;
            for (off, keep) in survivors.into_iter().enumerate() {
                if keep {
                    cand_end += 1;
                    self.data.swap(cand_end, start + off);
                }
            }
            self.stats.add_compress(t0.elapsed());

            // Phase II (parallel): candidates vs earlier candidates.
            let t0 = Instant::now();
            let confirmed: Vec<bool> = {
                let candidates = &self.data[head + 1..=cand_end];
                (0..candidates.len())
                    .into_par_iter()
                    .map(|i| {
                        !candidates[..i]
                            .iter()
                            .any(|s| dominate_left(&s.elems, &candidates[i].elems))
                    })
                    .collect()
            };
            self.stats.add_phase2(t0.elapsed());

            let t0 = Instant::now();
            let first_cand = head + 1;
            for (off, keep) in confirmed.into_iter().enumerate() {
                if keep {
                    head += 1;
                    self.data.swap(head, first_cand + off);
                }
            }
            self.stats.add_compress(t0.elapsed());

            start = stop;
        }
        head + 1
    }
}

impl SkylineSolver for QFlow {
    fn init(&mut self) {
        if self.data.is_empty() {
            return;
        }
        self.data
            .par_iter_mut()
            .for_each(|t| t.score = manhattan(&t.elems));
        self.data.par_sort_unstable_by(|a, b| a.score_order(b));
    }

    fn execute(&mut self) -> Vec<u32> {
        if self.data.is_empty() {
            return Vec::new();
        }

        let survived = self.skyline_pass();
        self.skyline = self.data[..survived].iter().map(|t| t.pid).collect();
        self.stats.skyline_size = survived;
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

    fn run(rows: &[Vec<f32>], alpha: usize) -> Vec<u32> {
        let dims = rows.first().map_or(0, |r| r.len());
        let params = AlgoParams {
            alpha,
            ..AlgoParams::default()
        };
        let mut solver = QFlow::new(dims, rows, &params);
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
        assert_eq!(run(&rows, 2), vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_duplicates_survive() {
        let rows = vec![vec![1.0, 1.0, 1.0]; 5];
        assert_eq!(run(&rows, 2), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_chain_and_antichain() {
        let chain = vec![vec![1.0, 2.0], vec![2.0, 3.0], vec![3.0, 4.0]];
        assert_eq!(run(&chain, 1), vec![0]);

        let anti = vec![
            vec![1.0, 4.0],
            vec![2.0, 3.0],
            vec![3.0, 2.0],
            vec![4.0, 1.0],
        ];
        assert_eq!(run(&anti, 2), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_matches_naive_on_random() {
        let mut rng = StdRng::seed_from_u64(33);
        let rows: Vec<Vec<f32>> = (0..300)
            .map(|_| (0..3).map(|_| rng.gen_range(0.0..1.0)).collect())
            .collect();
        let expected = naive_skyline(&rows);
        for alpha in [7, 64, 1024] {
            assert_eq!(run(&rows, alpha), expected, "alpha={alpha}");
        }
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(run(&[], 4), Vec::<u32>::new());
        assert_eq!(run(&[vec![0.1, 0.9]], 4), vec![0]);
    }
}
