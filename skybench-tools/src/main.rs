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

//! SkyBench - a benchmark for skyline algorithms
//!
//! Runs the selected skyline engines over a CSV workload, once per
//! requested thread count, and cross-checks that every run produced the
//! same skyline as a set.
//!
//! ## Usage
//!
//! ```bash
//! # All algorithms, 4 threads
//! skybench -f workloads/house.csv
//!
//! # Two engines across three thread counts, verbose report
//! skybench -f workloads/house.csv -s "bskytree hybrid" -t "1 2 4" -v
//! ```
//!
//! Non-verbose output is one elapsed-milliseconds token per run on a
//! single line, for scripting. Verbose mode prints per-run reports and
//! a final PASSED/FAILED verdict of the cross-algorithm comparison.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skybench_algo::AlgoParams;
use skybench_core::simd::simd_level;
use skybench_tools::runner::{is_multithreaded, run_benchmark, verify_reports, BenchConfig, ALG_ALL};
use skybench_tools::{io, RunReport};

/// SkyBench - a benchmark for skyline algorithms
#[derive(Parser, Debug)]
#[command(name = "skybench")]
#[command(about = "Benchmark skyline algorithms across thread counts")]
#[command(version)]
struct Cli {
    /// Input CSV file, one point per line
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Algorithms to run, whitespace-separated
    /// (bskytree pbskytree pskyline qflow hybrid)
    #[arg(short = 's', long = "algorithms")]
    algorithms: Option<String>,

    /// Thread counts to run, whitespace-separated, e.g. "1 2 4";
    /// ignored by single-threaded algorithms
    #[arg(short = 't', long = "threads", default_value = "4")]
    threads: String,

    /// Alpha block size for the pipelined algorithms
    #[arg(short = 'a', long = "alpha", default_value_t = skybench_algo::DEFAULT_ALPHA)]
    alpha: usize,

    /// Per-thread priority-queue capacity of the hybrid pre-filter
    #[arg(short = 'q', long = "pq-size", default_value_t = skybench_algo::DEFAULT_PQ_SIZE)]
    pq_size: usize,

    /// Verbose mode: human-readable timings plus the cross-algorithm
    /// comparison (don't use for performance experiments)
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Rescale every column to [0, 1] before running
    #[arg(short = 'n', long)]
    normalize: bool,

    /// Ignore a leading line-number column
    #[arg(short = 'l', long = "line-numbers")]
    line_numbers: bool,
}

fn main() -> ExitCode {
    // Exit 1 on malformed arguments, per the harness contract.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("skybench: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let algorithms: Vec<String> = cli
        .algorithms
        .as_deref()
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_else(|| ALG_ALL.iter().map(|s| s.to_string()).collect());

    let mut threads = Vec::new();
    for token in cli.threads.split_whitespace() {
        let t: usize = token
            .parse()
            .with_context(|| format!("invalid thread count '{token}'"))?;
        if t == 0 {
            bail!("thread counts must be positive");
        }
        threads.push(t);
    }
    if threads.is_empty() {
        bail!("no thread counts given");
    }

    if cli.verbose {
        println!("Running in verbose (-v) mode");
        println!("Input reading ({})", cli.file.display());
    }
    let started = std::time::Instant::now();
    let dataset = io::read_data(&cli.file, cli.line_numbers, cli.normalize)
        .with_context(|| format!("reading input '{}'", cli.file.display()))?;
    if cli.verbose {
        println!(" d={}; n={}", dataset.dims, dataset.len());
        println!(" duration: {} msec", started.elapsed().as_millis());
        println!(" simd: {}", simd_level());
    }

    let cfg = BenchConfig {
        algorithms,
        threads,
        params: AlgoParams {
            alpha: cli.alpha,
            pq_size: cli.pq_size,
        },
    };

    let reports = run_benchmark(&dataset, &cfg).context("running benchmark")?;

    if cli.verbose {
        print_verbose(&reports, dataset.len());
    } else {
        let tokens: Vec<String> = reports.iter().map(|r| r.total_ms.to_string()).collect();
        println!(" {}", tokens.join(" "));
        for m in verify_reports(&reports) {
            eprintln!(
                "ERROR: Skylines of run #{} (|sky|={}) and #{} (|sky|={}) do not match!",
                m.left_run, m.left_size, m.right_run, m.right_size
            );
        }
    }

    Ok(())
}

fn print_verbose(reports: &[RunReport], n: usize) {
    for (i, r) in reports.iter().enumerate() {
        if is_multithreaded(&r.algorithm) {
            println!("#{i}: {} (t={})", r.algorithm, r.threads);
        } else {
            println!("#{i}: {}", r.algorithm);
        }
        println!(" init: {} msec", r.init_ms);
        println!(" runtime: {} msec", r.total_ms);
    }

    let mismatches = verify_reports(reports);
    for m in &mismatches {
        eprintln!(
            "ERROR: Skylines of run #{} (|sky|={}) and #{} (|sky|={}) do not match!",
            m.left_run, m.left_size, m.right_run, m.right_size
        );
        let diff: Vec<String> = m
            .symmetric_difference
            .iter()
            .map(u32::to_string)
            .collect();
        eprintln!(" symmetric difference: {}", diff.join(" "));
    }
    if reports.len() > 1 {
        if mismatches.is_empty() {
            println!("Comparison tests: PASSED!");
        } else {
            println!("Comparison tests: FAILED!");
        }
    }

    if let Some(first) = reports.first() {
        let size = first.skyline.len();
        println!(
            " |skyline| = {} ({:.2} %)",
            size,
            size as f64 * 100.0 / n as f64
        );
    }
}
