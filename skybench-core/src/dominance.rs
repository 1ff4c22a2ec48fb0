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

//! Dominance primitives.
//!
//! Every skyline engine reduces to tight loops over these tests:
//!
//! - [`dominance`]: full two-way test (`Left` / `Right` / `Incomparable`).
//! - [`dominate_left`] / [`dominate_left_dvc`] / [`dominated_left`]:
//!   one-way tests, with and without the distinct-value condition (DVC).
//! - [`bitmap_dvc`] / [`bitmap_ndvc`]: the d-bit lattice code of a point
//!   against a pivot; by far the most frequent test in the lattice-tree
//!   engines.
//!
//! Minimization convention throughout: smaller is better. Under DVC no
//! two points share a value on any dimension, which lets the `_dvc`
//! variants treat `<=` as `<`; callers that cannot guarantee DVC must
//! use the strict variants or handle coordinate-equal points themselves.
//!
//! The four hot primitives dispatch to the SIMD module when the target
//! enables AVX2 or SSE4.1; the scalar implementations below are the
//! normative reference and the SIMD paths must agree exactly. NaN
//! comparisons are written in the `!(a <= b)` form so a NaN coordinate
//! always reads as "not better", never as a reason to prune.

/// Outcome of a two-way dominance test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// The left point dominates the right.
    Left,
    /// The right point dominates the left.
    Right,
    /// Neither dominates (includes coordinate-equal points).
    Incomparable,
}

/// Two-way dominance test with no distinct-value assumption.
///
/// Coordinate-equal points are `Incomparable`. A NaN on any dimension
/// makes the pair `Incomparable`.
#[inline]
pub fn dominance(left: &[f32], right: &[f32]) -> Dominance {
    let mut left_better = false;
    let mut right_better = false;

    for (a, b) in left.iter().zip(right.iter()) {
        if a < b {
            left_better = true;
        } else if a > b {
            right_better = true;
        } else if a != b {
            // NaN on either side: refuse to order the pair.
            return Dominance::Incomparable;
        }
        if left_better && right_better {
            return Dominance::Incomparable;
        }
    }
    if left_better && !right_better {
        Dominance::Left
    } else if right_better && !left_better {
        Dominance::Right
    } else {
        Dominance::Incomparable
    }
}

/// Two-way dominance test assuming the distinct-value condition.
///
/// Under DVC no pair is coordinate-equal, so the equality outcome cannot
/// occur; if it does (duplicated inputs), the pair reads `Incomparable`,
/// which is the safe answer.
#[inline]
pub fn dominance_dvc(left: &[f32], right: &[f32]) -> Dominance {
    let mut left_better = false;
    let mut right_better = false;

    for (a, b) in left.iter().zip(right.iter()) {
        left_better = a < b || left_better;
        right_better = a > b || right_better;
        if left_better && right_better {
            return Dominance::Incomparable;
        }
    }
    if left_better {
        Dominance::Left
    } else if right_better {
        Dominance::Right
    } else {
        Dominance::Incomparable
    }
}

/// One-way dominance test, no distinct-value assumption.
///
/// True iff `left` is no worse anywhere and strictly better somewhere;
/// coordinate-equal points return false.
#[inline]
pub fn dominate_left(left: &[f32], right: &[f32]) -> bool {
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { crate::simd::dominate_left_avx2(left, right) }
    }

    #[cfg(all(
        target_arch = "x86_64",
        not(target_feature = "avx2"),
        target_feature = "sse4.1"
    ))]
    {
        unsafe { crate::simd::dominate_left_sse(left, right) }
    }

    #[cfg(not(any(
        all(target_arch = "x86_64", target_feature = "avx2"),
        all(target_arch = "x86_64", target_feature = "sse4.1")
    )))]
    {
        dominate_left_scalar(left, right)
    }
}

/// Scalar reference for [`dominate_left`].
#[inline]
pub fn dominate_left_scalar(left: &[f32], right: &[f32]) -> bool {
    for (a, b) in left.iter().zip(right.iter()) {
        if !(a <= b) {
            return false; // worse somewhere, or NaN
        }
    }
    for (a, b) in left.iter().zip(right.iter()) {
        if a < b {
            return true;
        }
    }
    false // coordinate-equal
}

/// One-way dominance test assuming the distinct-value condition:
/// true iff `left <= right` on every dimension.
///
/// Applying this to coordinate-equal points returns true; callers must
/// guarantee the two are not the same point.
#[inline]
pub fn dominate_left_dvc(left: &[f32], right: &[f32]) -> bool {
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { crate::simd::dominate_left_dvc_avx2(left, right) }
    }

    #[cfg(all(
        target_arch = "x86_64",
        not(target_feature = "avx2"),
        target_feature = "sse4.1"
    ))]
    {
        unsafe { crate::simd::dominate_left_dvc_sse(left, right) }
    }

    #[cfg(not(any(
        all(target_arch = "x86_64", target_feature = "avx2"),
        all(target_arch = "x86_64", target_feature = "sse4.1")
    )))]
    {
        dominate_left_dvc_scalar(left, right)
    }
}

/// Scalar reference for [`dominate_left_dvc`].
#[inline]
pub fn dominate_left_dvc_scalar(left: &[f32], right: &[f32]) -> bool {
    for (a, b) in left.iter().zip(right.iter()) {
        if !(a <= b) {
            return false;
        }
    }
    true
}

/// True iff `cur` is dominated by `prev` under the distinct-value
/// condition: `prev <= cur` on every dimension.
#[inline]
pub fn dominated_left(cur: &[f32], prev: &[f32]) -> bool {
    for (a, b) in cur.iter().zip(prev.iter()) {
        if !(a >= b) {
            return false;
        }
    }
    true
}

/// Lattice code of `cur` against the pivot `sky`, assuming the
/// distinct-value condition: bit i is set iff `sky[i] <= cur[i]`.
///
/// Under DVC: all-ones means `sky` dominates `cur`, zero means `cur`
/// dominates `sky`, anything else is incomparable.
#[inline]
pub fn bitmap_dvc(cur: &[f32], sky: &[f32]) -> u32 {
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { crate::simd::bitmap_dvc_avx2(cur, sky) }
    }

    #[cfg(all(
        target_arch = "x86_64",
        not(target_feature = "avx2"),
        target_feature = "sse4.1"
    ))]
    {
        unsafe { crate::simd::bitmap_dvc_sse(cur, sky) }
    }

    #[cfg(not(any(
        all(target_arch = "x86_64", target_feature = "avx2"),
        all(target_arch = "x86_64", target_feature = "sse4.1")
    )))]
    {
        bitmap_dvc_scalar(cur, sky)
    }
}

/// Scalar reference for [`bitmap_dvc`].
#[inline]
pub fn bitmap_dvc_scalar(cur: &[f32], sky: &[f32]) -> u32 {
    let mut lattice = 0u32;
    for (dim, (c, s)) in cur.iter().zip(sky.iter()).enumerate() {
        if s <= c {
            lattice |= 1 << dim;
        }
    }
    lattice
}

/// Lattice code without the distinct-value assumption: bit i is set iff
/// `sky[i] < cur[i]` (strict).
#[inline]
pub fn bitmap_ndvc(cur: &[f32], sky: &[f32]) -> u32 {
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { crate::simd::bitmap_ndvc_avx2(cur, sky) }
    }

    #[cfg(all(
        target_arch = "x86_64",
        not(target_feature = "avx2"),
        target_feature = "sse4.1"
    ))]
    {
        unsafe { crate::simd::bitmap_ndvc_sse(cur, sky) }
    }

    #[cfg(not(any(
        all(target_arch = "x86_64", target_feature = "avx2"),
        all(target_arch = "x86_64", target_feature = "sse4.1")
    )))]
    {
        bitmap_ndvc_scalar(cur, sky)
    }
}

/// Scalar reference for [`bitmap_ndvc`].
#[inline]
pub fn bitmap_ndvc_scalar(cur: &[f32], sky: &[f32]) -> u32 {
    let mut lattice = 0u32;
    for (dim, (c, s)) in cur.iter().zip(sky.iter()).enumerate() {
        if s < c {
            lattice |= 1 << dim;
        }
    }
    lattice
}

/// Elementwise float equality. NaN is never equal to anything, so rows
/// containing NaN are never treated as duplicates.
#[inline]
pub fn equal(t1: &[f32], t2: &[f32]) -> bool {
    t1.iter().zip(t2.iter()).all(|(a, b)| a == b)
}

/// Spread between the largest and smallest normalized coordinate of a
/// point within the box described by `min_list` / `range_list`.
///
/// Normalization is required even for pre-normalized data because it
/// spreads the values within each recursed partition, where all
/// coordinates sit inside a sub-box. A collapsed box dimension
/// (non-positive range) contributes 0.
#[inline]
pub fn norm_range(value: &[f32], min_list: &[f32], range_list: &[f32]) -> f32 {
    let norm = |d: usize| {
        if range_list[d] > 0.0 {
            (value[d] - min_list[d]) / range_list[d]
        } else {
            0.0
        }
    };

    let mut min_d = norm(0);
    let mut max_d = min_d;
    for d in 1..value.len() {
        let v = norm(d);
        if min_d > v {
            min_d = v;
        } else if max_d < v {
            max_d = v;
        }
    }
    max_d - min_d
}
