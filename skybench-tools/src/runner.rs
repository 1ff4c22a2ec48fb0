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

//! Benchmark runner.
//!
//! Dispatches the requested algorithms across the requested thread
//! counts, timing initialization and execution separately. Each
//! multi-threaded run gets its own scoped rayon pool so the thread
//! count is a real run parameter, not an ambient global. After all
//! runs, skylines are compared pairwise against the first run as *sets*
//! (output order is unspecified).

use rayon::ThreadPoolBuilder;
use serde::Serialize;
use skybench_algo::{
    AlgoParams, Hybrid, PSkyline, ParallelBSkyTree, QFlow, RunStats, SkyTree, SkylineSolver,
};
use skybench_core::{Result, SkybenchError};
use std::collections::BTreeSet;
use std::time::Instant;

use crate::io::Dataset;

pub const ALG_BSKYTREE: &str = "bskytree";
pub const ALG_PBSKYTREE: &str = "pbskytree";
pub const ALG_PSKYLINE: &str = "pskyline";
pub const ALG_QFLOW: &str = "qflow";
pub const ALG_HYBRID: &str = "hybrid";

/// All algorithms, in default execution order.
pub const ALG_ALL: [&str; 5] = [
    ALG_BSKYTREE,
    ALG_PBSKYTREE,
    ALG_PSKYLINE,
    ALG_QFLOW,
    ALG_HYBRID,
];

/// Whether an algorithm honors the thread-count parameter.
pub fn is_multithreaded(name: &str) -> bool {
    name != ALG_BSKYTREE
}

/// One benchmark invocation.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub algorithms: Vec<String>,
    pub threads: Vec<usize>,
    pub params: AlgoParams,
}

impl BenchConfig {
    /// Reject unknown algorithm names and degenerate thread counts up
    /// front, before any work is timed.
    pub fn validate(&self) -> Result<()> {
        for name in &self.algorithms {
            if !ALG_ALL.contains(&name.as_str()) {
                return Err(SkybenchError::InvalidArgument(format!(
                    "unknown algorithm '{name}' (supported: {})",
                    ALG_ALL.join(" ")
                )));
            }
        }
        if self.threads.is_empty() || self.threads.contains(&0) {
            return Err(SkybenchError::InvalidArgument(
                "thread counts must be positive integers".into(),
            ));
        }
        Ok(())
    }
}

/// Timing and result of a single (algorithm, thread-count) run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub algorithm: String,
    pub threads: usize,
    pub init_ms: u64,
    pub total_ms: u64,
    pub stats: RunStats,
    #[serde(skip)]
    pub skyline: Vec<u32>,
}

fn build_solver(
    name: &str,
    dataset: &Dataset,
    threads: usize,
    params: &AlgoParams,
) -> Result<Box<dyn SkylineSolver>> {
    Ok(match name {
        ALG_BSKYTREE => Box::new(SkyTree::new(dataset.dims, &dataset.rows, false)),
        ALG_PBSKYTREE => Box::new(ParallelBSkyTree::new(dataset.dims, &dataset.rows)),
        ALG_PSKYLINE => Box::new(PSkyline::new(dataset.dims, &dataset.rows, threads)),
        ALG_QFLOW => Box::new(QFlow::new(dataset.dims, &dataset.rows, params)),
        ALG_HYBRID => Box::new(Hybrid::new(dataset.dims, &dataset.rows, threads, params)?),
        other => unreachable!("unvalidated algorithm name '{other}'"),
    })
}

fn run_one(name: &str, dataset: &Dataset, threads: usize, params: &AlgoParams) -> Result<RunReport> {
    let mut solver = build_solver(name, dataset, threads, params)?;

    let started = Instant::now();
    solver.init();
    let init_ms = started.elapsed().as_millis() as u64;

    let skyline = solver.execute();
    let total_ms = started.elapsed().as_millis() as u64;

    tracing::debug!(
        algorithm = name,
        threads,
        init_ms,
        total_ms,
        skyline = skyline.len(),
        "run finished"
    );

    Ok(RunReport {
        algorithm: name.to_string(),
        threads,
        init_ms,
        total_ms,
        stats: solver.stats(),
        skyline,
    })
}

/// Run every requested (algorithm, thread-count) combination.
pub fn run_benchmark(dataset: &Dataset, cfg: &BenchConfig) -> Result<Vec<RunReport>> {
    cfg.validate()?;
    let params = cfg.params.clamp_for(dataset.len());

    let mut reports = Vec::new();
    for name in &cfg.algorithms {
        if is_multithreaded(name) {
            for &threads in &cfg.threads {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| SkybenchError::InvalidArgument(e.to_string()))?;
                let report = pool.install(|| run_one(name, dataset, threads, &params))?;
                reports.push(report);
            }
        } else {
            reports.push(run_one(name, dataset, 1, &params)?);
        }
    }
    Ok(reports)
}

/// A disagreement between run 0 and a later run.
#[derive(Debug, Clone, Serialize)]
pub struct Mismatch {
    pub left_run: usize,
    pub right_run: usize,
    pub left_size: usize,
    pub right_size: usize,
    /// Pids present in exactly one of the two skylines.
    pub symmetric_difference: Vec<u32>,
}

/// Compare every run against the first as sets.
pub fn verify_reports(reports: &[RunReport]) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    if reports.len() < 2 {
        return mismatches;
    }

    let first: BTreeSet<u32> = reports[0].skyline.iter().copied().collect();
    for (i, report) in reports.iter().enumerate().skip(1) {
        let other: BTreeSet<u32> = report.skyline.iter().copied().collect();
        if first != other {
            let symmetric_difference: Vec<u32> =
                first.symmetric_difference(&other).copied().collect();
            mismatches.push(Mismatch {
                left_run: 0,
                right_run: i,
                left_size: reports[0].skyline.len(),
                right_size: report.skyline.len(),
                symmetric_difference,
            });
        }
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset {
            dims: 2,
            rows: vec![
                vec![1.0, 2.0],
                vec![2.0, 1.0],
                vec![3.0, 3.0],
                vec![0.5, 5.0],
                vec![5.0, 0.5],
            ],
        }
    }

    #[test]
    fn test_all_algorithms_agree() {
        let cfg = BenchConfig {
            algorithms: ALG_ALL.iter().map(|s| s.to_string()).collect(),
            threads: vec![1, 2],
            params: AlgoParams::default(),
        };
        let reports = run_benchmark(&dataset(), &cfg).unwrap();
        // bskytree once, four multi-threaded engines twice each.
        assert_eq!(reports.len(), 9);
        assert!(verify_reports(&reports).is_empty());

        let mut sky = reports[0].skyline.clone();
        sky.sort_unstable();
        assert_eq!(sky, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let cfg = BenchConfig {
            algorithms: vec!["voronoi".into()],
            threads: vec![1],
            params: AlgoParams::default(),
        };
        assert!(run_benchmark(&dataset(), &cfg).is_err());
    }

    #[test]
    fn test_zero_threads_is_rejected() {
        let cfg = BenchConfig {
            algorithms: vec![ALG_QFLOW.into()],
            threads: vec![0],
            params: AlgoParams::default(),
        };
        assert!(run_benchmark(&dataset(), &cfg).is_err());
    }

    #[test]
    fn test_hybrid_rejects_unencodable_width() {
        // 28 lattice bits leave no room for hybrid's packed level
        // field; the flat-mask engines still accept the workload.
        let wide = Dataset {
            dims: 28,
            rows: vec![vec![0.5; 28]; 3],
        };
        let mut cfg = BenchConfig {
            algorithms: vec![ALG_HYBRID.into()],
            threads: vec![1],
            params: AlgoParams::default(),
        };
        assert!(run_benchmark(&wide, &cfg).is_err());

        cfg.algorithms = vec![ALG_QFLOW.into(), ALG_PBSKYTREE.into()];
        assert!(run_benchmark(&wide, &cfg).is_ok());
    }

    #[test]
    fn test_verify_flags_symmetric_difference() {
        let mk = |skyline: Vec<u32>| RunReport {
            algorithm: "qflow".into(),
            threads: 1,
            init_ms: 0,
            total_ms: 0,
            stats: RunStats::default(),
            skyline,
        };
        let reports = vec![mk(vec![0, 1, 3]), mk(vec![3, 1, 0]), mk(vec![0, 2])];
        let mismatches = verify_reports(&reports);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].right_run, 2);
        assert_eq!(mismatches[0].symmetric_difference, vec![1, 2, 3]);
    }
}
