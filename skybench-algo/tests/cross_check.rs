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

//! Cross-algorithm correctness checks.
//!
//! Every engine must produce exactly the set of non-dominated pids, for
//! any thread count, with coordinate-equal rows treated as mutually
//! non-dominating.

use rand::prelude::*;
use skybench_algo::{
    AlgoParams, Hybrid, PSkyline, ParallelBSkyTree, QFlow, SkyTree, SkylineSolver,
};
use skybench_core::dominate_left;

/// Quadratic reference oracle.
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

fn solvers(rows: &[Vec<f32>], threads: usize, params: &AlgoParams) -> Vec<(&'static str, Box<dyn SkylineSolver>)> {
    let dims = rows.first().map_or(0, |r| r.len());
    let params = params.clamp_for(rows.len());
    vec![
        ("bskytree", Box::new(SkyTree::new(dims, rows, false)) as Box<dyn SkylineSolver>),
        ("bskytree-dnc", Box::new(SkyTree::new(dims, rows, true))),
        ("pbskytree", Box::new(ParallelBSkyTree::new(dims, rows))),
        ("pskyline", Box::new(PSkyline::new(dims, rows, threads))),
        ("qflow", Box::new(QFlow::new(dims, rows, &params))),
        (
            "hybrid",
            Box::new(Hybrid::new(dims, rows, threads, &params).expect("encodable width")),
        ),
    ]
}

fn run_all(rows: &[Vec<f32>], threads: usize, params: &AlgoParams) -> Vec<(&'static str, Vec<u32>)> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .expect("thread pool");
    pool.install(|| {
        solvers(rows, threads, params)
            .into_iter()
            .map(|(name, mut solver)| {
                solver.init();
                let mut out = solver.execute();
                out.sort_unstable();
                (name, out)
            })
            .collect()
    })
}

fn assert_all_equal(rows: &[Vec<f32>], threads: usize, params: &AlgoParams, expected: &[u32]) {
    for (name, sky) in run_all(rows, threads, params) {
        assert_eq!(sky, expected, "{name} with t={threads}");
    }
}

#[test]
fn scenario_mixed_skyline() {
    let rows = vec![
        vec![1.0, 2.0],
        vec![2.0, 1.0],
        vec![3.0, 3.0],
        vec![0.5, 5.0],
        vec![5.0, 0.5],
    ];
    assert_all_equal(&rows, 2, &AlgoParams::default(), &[0, 1, 3, 4]);
}

#[test]
fn scenario_all_duplicates() {
    let rows = vec![vec![1.0, 1.0, 1.0]; 5];
    assert_all_equal(&rows, 2, &AlgoParams::default(), &[0, 1, 2, 3, 4]);
}

#[test]
fn scenario_chain() {
    let rows = vec![vec![1.0, 2.0], vec![2.0, 3.0], vec![3.0, 4.0]];
    assert_all_equal(&rows, 2, &AlgoParams::default(), &[0]);
}

#[test]
fn scenario_antichain() {
    let rows = vec![
        vec![1.0, 4.0],
        vec![2.0, 3.0],
        vec![3.0, 2.0],
        vec![4.0, 1.0],
    ];
    assert_all_equal(&rows, 2, &AlgoParams::default(), &[0, 1, 2, 3]);
}

#[test]
fn scenario_equal_on_one_dim() {
    let rows = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]];
    assert_all_equal(&rows, 2, &AlgoParams::default(), &[0]);
}

fn uniform_rows(n: usize, dims: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dims).map(|_| rng.gen_range(0.0..1.0)).collect())
        .collect()
}

#[test]
fn scenario_random_1000x4_all_engines_agree() {
    let rows = uniform_rows(1000, 4, 42);
    let expected = naive_skyline(&rows);
    assert!(
        expected.len() >= 20 && expected.len() <= 300,
        "unexpected skyline size {}",
        expected.len()
    );
    assert_all_equal(&rows, 4, &AlgoParams::default(), &expected);
}

#[test]
fn thread_invariance() {
    let rows = uniform_rows(800, 3, 7);
    let expected = naive_skyline(&rows);
    for threads in [1, 2, 4, 8] {
        assert_all_equal(&rows, threads, &AlgoParams::default(), &expected);
    }
}

#[test]
fn small_alpha_and_pq_still_agree() {
    let rows = uniform_rows(500, 5, 11);
    let expected = naive_skyline(&rows);
    let params = AlgoParams {
        alpha: 8,
        pq_size: 2,
    };
    assert_all_equal(&rows, 3, &params, &expected);
}

#[test]
fn rerun_yields_the_same_set() {
    let rows = uniform_rows(300, 3, 19);
    let first = run_all(&rows, 2, &AlgoParams::default());
    let second = run_all(&rows, 2, &AlgoParams::default());
    assert_eq!(first, second);
}

#[test]
fn adding_a_dominated_row_changes_nothing() {
    let mut rows = uniform_rows(200, 3, 23);
    let expected = naive_skyline(&rows);

    // A point strictly worse than row 0 on every dimension.
    let worse: Vec<f32> = rows[0].iter().map(|v| v + 0.5).collect();
    rows.push(worse);

    assert_all_equal(&rows, 2, &AlgoParams::default(), &expected);
}

#[test]
fn duplicated_skyline_rows_both_appear() {
    let mut rows = vec![
        vec![0.1, 0.9, 0.5],
        vec![0.9, 0.1, 0.5],
        vec![0.5, 0.5, 0.9],
    ];
    // Duplicate a skyline row.
    rows.push(rows[0].clone());
    let expected = naive_skyline(&rows);
    assert!(expected.contains(&0) && expected.contains(&3));
    assert_all_equal(&rows, 2, &AlgoParams::default(), &expected);
}

#[test]
fn clustered_duplicates_heavy_workload() {
    // A workload full of coordinate collisions: values snapped to a
    // coarse grid, so the distinct-value condition is badly violated.
    let mut rng = StdRng::seed_from_u64(31);
    let rows: Vec<Vec<f32>> = (0..600)
        .map(|_| {
            (0..3)
                .map(|_| (rng.gen_range(0u32..8) as f32) / 8.0)
                .collect()
        })
        .collect();
    let expected = naive_skyline(&rows);
    assert_all_equal(&rows, 4, &AlgoParams::default(), &expected);
}
