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

//! SkyBench Tools
//!
//! Everything around the algorithms: CSV input, the benchmark runner
//! that times each engine across thread counts, and set-equality
//! verification between runs. The `skybench` binary in this crate is
//! the user-facing surface.

pub mod io;
pub mod runner;

pub use io::{read_data, Dataset};
pub use runner::{run_benchmark, verify_reports, BenchConfig, Mismatch, RunReport, ALG_ALL};
