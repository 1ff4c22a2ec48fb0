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

//! SkyBench Core
//!
//! Data model and dominance primitives for skyline computation.
//!
//! A *skyline* query over n points in d-dimensional space returns the
//! subset of points not dominated by any other point, where p dominates q
//! iff p is no worse than q on every dimension and strictly better on at
//! least one (minimization convention: smaller is better).
//!
//! This crate provides:
//!
//! - **Point model** (`point`): plain points, score-augmented points, and
//!   encoded partition points carrying a packed (level | lattice-mask)
//!   word with a one-comparison "pruned" sentinel.
//! - **Dominance primitives** (`dominance`): two-way and one-way
//!   dominance tests, bitmap lattice codes against a pivot, and
//!   equality — the hot inner loops every skyline engine is built on.
//! - **SIMD paths** (`simd`): AVX2 / SSE4.1 implementations of the four
//!   most frequent primitives. The scalar path is the normative
//!   reference; SIMD must agree bit-for-bit.
//!
//! All primitives treat a NaN comparison as weakening a dominance claim,
//! so a NaN coordinate never causes a point to be pruned.

pub mod dominance;
pub mod error;
pub mod point;
pub mod simd;

pub use dominance::{
    bitmap_dvc, bitmap_ndvc, dominance, dominance_dvc, dominate_left, dominate_left_dvc,
    dominated_left, equal, norm_range, Dominance,
};
pub use error::{Result, SkybenchError};
pub use point::{
    all_ones, manhattan, Coordinates, EncodedPoint, Point, ScoredPoint, MAX_DIMS,
    MAX_ENCODED_DIMS,
};
