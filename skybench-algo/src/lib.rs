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

//! SkyBench Algorithms
//!
//! Five skyline engines sharing the dominance primitives of
//! `skybench-core`:
//!
//! - **SkyTree** (`skytree`): sequential divide-and-conquer over a
//!   recursive lattice-partitioning tree with partial-dominance pruning.
//! - **ParallelBSkyTree** (`pbskytree`): parallelized SkyTree inner loop
//!   over a flat lattice partitioning.
//! - **PSkyline** (`pskyline`): block-per-thread simple skylines merged
//!   by a sequential reduction of parallel merges.
//! - **QFlow** (`qflow`): Manhattan-norm sort plus a pipelined
//!   alpha-block sweep.
//! - **Hybrid** (`hybrid`): priority-queue pre-filter, median
//!   partitioning, and a two-level partition map driving the same
//!   alpha-block pipeline.
//!
//! Every engine owns its point buffer for the lifetime of one
//! `init` + `execute` pair and emits the skyline as a list of input pids.
//! The output is a *set*: no ordering is guaranteed, and for a
//! multi-threaded engine the set does not depend on the thread count.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod hybrid;
pub mod pbskytree;
pub mod pivot;
pub mod pq_filter;
pub mod pskyline;
pub mod qflow;
pub mod skytree;

pub use hybrid::Hybrid;
pub use pbskytree::ParallelBSkyTree;
pub use pskyline::PSkyline;
pub use qflow::QFlow;
pub use skytree::SkyTree;

/// Default block size for the pipelined engines.
pub const DEFAULT_ALPHA: usize = 1024;

/// Default per-thread priority-queue capacity for the Hybrid pre-filter.
pub const DEFAULT_PQ_SIZE: usize = 8;

/// Block size of the ParallelBSkyTree temporal-head sweep.
pub const BSKYTREE_ACCUM: usize = 256;

/// Tunables shared by the pipelined engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgoParams {
    /// Block size alpha of the Hybrid / QFlow pipelines.
    pub alpha: usize,
    /// Per-thread priority-queue capacity of the Hybrid pre-filter.
    pub pq_size: usize,
}

impl Default for AlgoParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            pq_size: DEFAULT_PQ_SIZE,
        }
    }
}

impl AlgoParams {
    /// Clamp the tunables against the input size: a block larger than the
    /// input degrades to half of it, and a queue larger than the input
    /// degrades to a single slot. These are silent adjustments, not
    /// errors.
    pub fn clamp_for(&self, n: usize) -> AlgoParams {
        let mut out = self.clone();
        if n < out.alpha {
            out.alpha = (n / 2).max(1);
            tracing::warn!(n, alpha = out.alpha, "alpha clamped to half the input size");
        }
        if n < out.pq_size {
            out.pq_size = 1;
            tracing::warn!(n, "pq_size clamped to 1");
        }
        out
    }
}

/// Per-run statistics reported alongside the skyline.
///
/// Fields an engine does not have stay zero (SkyTree has no parallel
/// phases; PSkyline has no pre-filter).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Points removed by the pre-filter, if the engine runs one.
    pub prefilter_pruned: usize,
    /// Time spent in parallel Phase I regions, microseconds.
    pub phase1_us: u64,
    /// Time spent in parallel Phase II regions, microseconds.
    pub phase2_us: u64,
    /// Time spent in sequential compression / sorting, microseconds.
    pub compress_us: u64,
    /// Size of the emitted skyline.
    pub skyline_size: usize,
}

impl RunStats {
    #[inline]
    pub(crate) fn add_phase1(&mut self, d: Duration) {
        self.phase1_us += d.as_micros() as u64;
    }

    #[inline]
    pub(crate) fn add_phase2(&mut self, d: Duration) {
        self.phase2_us += d.as_micros() as u64;
    }

    #[inline]
    pub(crate) fn add_compress(&mut self, d: Duration) {
        self.compress_us += d.as_micros() as u64;
    }
}

/// Common surface of the five engines.
///
/// `init` runs the pre-passes that the harness charges to initialization
/// (scoring, pre-filtering, partitioning, sorting); `execute` computes
/// the skyline proper. Both mutate the engine's owned buffer, so an
/// engine instance is single-shot: build a fresh one to re-run.
pub trait SkylineSolver {
    /// Pre-passes over the owned buffer. Default: nothing to do.
    fn init(&mut self) {}

    /// Compute the skyline and return the surviving pids.
    fn execute(&mut self) -> Vec<u32>;

    /// Statistics from the last `execute` call.
    fn stats(&self) -> RunStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_clamping() {
        let p = AlgoParams::default();
        let c = p.clamp_for(100);
        assert_eq!(c.alpha, 50);
        assert_eq!(c.pq_size, 8);

        let c = p.clamp_for(5);
        assert_eq!(c.alpha, 2);
        assert_eq!(c.pq_size, 1);

        let c = p.clamp_for(1);
        assert_eq!(c.alpha, 1);
        assert_eq!(c.pq_size, 1);

        let c = p.clamp_for(100_000);
        assert_eq!(c.alpha, DEFAULT_ALPHA);
        assert_eq!(c.pq_size, DEFAULT_PQ_SIZE);
    }
}
