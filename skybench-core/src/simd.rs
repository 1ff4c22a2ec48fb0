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

//! SIMD-Optimized Dominance Tests
//!
//! AVX2 (8-wide) and SSE4.1 (4-wide) implementations of the hot
//! dominance primitives. A lane compare plus `movemask` turns eight
//! per-dimension comparisons into one instruction pair, which is exactly
//! the shape of the lattice-code tests that dominate skyline runtime.
//!
//! The scalar implementations in [`crate::dominance`] are the normative
//! reference; every function here must return identical results,
//! including for NaN inputs (ordered-quiet compares report false for
//! NaN lanes, matching the scalar `!(a <= b)` guards).

#[cfg(all(target_arch = "x86_64", target_feature = "sse4.1"))]
use std::arch::x86_64::{_mm_cmple_ps, _mm_cmplt_ps, _mm_loadu_ps, _mm_movemask_ps};

#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
use std::arch::x86_64::{
    _mm256_cmp_ps, _mm256_loadu_ps, _mm256_movemask_ps, _CMP_LE_OQ, _CMP_LT_OQ,
};

/// Lattice code with the distinct-value assumption (`sky <= cur` per
/// lane), 8 dimensions per iteration.
#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
#[target_feature(enable = "avx2")]
pub unsafe fn bitmap_dvc_avx2(cur: &[f32], sky: &[f32]) -> u32 {
    debug_assert_eq!(cur.len(), sky.len());
    let len = cur.len();
    let chunks = len / 8;

    let mut lattice = 0u32;
    for i in 0..chunks {
        let idx = i * 8;
        let c = _mm256_loadu_ps(cur.as_ptr().add(idx));
        let s = _mm256_loadu_ps(sky.as_ptr().add(idx));
        let le = _mm256_cmp_ps::<_CMP_LE_OQ>(s, c);
        lattice |= (_mm256_movemask_ps(le) as u32) << idx;
    }
    for dim in (chunks * 8)..len {
        if sky[dim] <= cur[dim] {
            lattice |= 1 << dim;
        }
    }
    lattice
}

/// SSE4.1 variant of [`bitmap_dvc_avx2`], 4 dimensions per iteration.
#[cfg(all(target_arch = "x86_64", target_feature = "sse4.1"))]
#[target_feature(enable = "sse4.1")]
pub unsafe fn bitmap_dvc_sse(cur: &[f32], sky: &[f32]) -> u32 {
    debug_assert_eq!(cur.len(), sky.len());
    let len = cur.len();
    let chunks = len / 4;

    let mut lattice = 0u32;
    for i in 0..chunks {
        let idx = i * 4;
        let c = _mm_loadu_ps(cur.as_ptr().add(idx));
        let s = _mm_loadu_ps(sky.as_ptr().add(idx));
        let le = _mm_cmple_ps(s, c);
        lattice |= (_mm_movemask_ps(le) as u32) << idx;
    }
    for dim in (chunks * 4)..len {
        if sky[dim] <= cur[dim] {
            lattice |= 1 << dim;
        }
    }
    lattice
}

/// Lattice code without the distinct-value assumption (`sky < cur`,
/// strict).
#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
#[target_feature(enable = "avx2")]
pub unsafe fn bitmap_ndvc_avx2(cur: &[f32], sky: &[f32]) -> u32 {
    debug_assert_eq!(cur.len(), sky.len());
    let len = cur.len();
    let chunks = len / 8;

    let mut lattice = 0u32;
    for i in 0..chunks {
        let idx = i * 8;
        let c = _mm256_loadu_ps(cur.as_ptr().add(idx));
        let s = _mm256_loadu_ps(sky.as_ptr().add(idx));
        let lt = _mm256_cmp_ps::<_CMP_LT_OQ>(s, c);
        lattice |= (_mm256_movemask_ps(lt) as u32) << idx;
    }
    for dim in (chunks * 8)..len {
        if sky[dim] < cur[dim] {
            lattice |= 1 << dim;
        }
    }
    lattice
}

/// SSE4.1 variant of [`bitmap_ndvc_avx2`].
#[cfg(all(target_arch = "x86_64", target_feature = "sse4.1"))]
#[target_feature(enable = "sse4.1")]
pub unsafe fn bitmap_ndvc_sse(cur: &[f32], sky: &[f32]) -> u32 {
    debug_assert_eq!(cur.len(), sky.len());
    let len = cur.len();
    let chunks = len / 4;

    let mut lattice = 0u32;
    for i in 0..chunks {
        let idx = i * 4;
        let c = _mm_loadu_ps(cur.as_ptr().add(idx));
        let s = _mm_loadu_ps(sky.as_ptr().add(idx));
        let lt = _mm_cmplt_ps(s, c);
        lattice |= (_mm_movemask_ps(lt) as u32) << idx;
    }
    for dim in (chunks * 4)..len {
        if sky[dim] < cur[dim] {
            lattice |= 1 << dim;
        }
    }
    lattice
}

/// Strict one-way dominance: `left` no worse on every lane, strictly
/// better on at least one. Early-exits on the first chunk with a worse
/// (or NaN) lane.
#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
#[target_feature(enable = "avx2")]
pub unsafe fn dominate_left_avx2(left: &[f32], right: &[f32]) -> bool {
    debug_assert_eq!(left.len(), right.len());
    let len = left.len();
    let chunks = len / 8;

    let mut strict = false;
    for i in 0..chunks {
        let idx = i * 8;
        let l = _mm256_loadu_ps(left.as_ptr().add(idx));
        let r = _mm256_loadu_ps(right.as_ptr().add(idx));
        let le = _mm256_cmp_ps::<_CMP_LE_OQ>(l, r);
        if _mm256_movemask_ps(le) != 0xFF {
            return false;
        }
        let lt = _mm256_cmp_ps::<_CMP_LT_OQ>(l, r);
        if _mm256_movemask_ps(lt) != 0 {
            strict = true;
        }
    }
    for dim in (chunks * 8)..len {
        if !(left[dim] <= right[dim]) {
            return false;
        }
        if left[dim] < right[dim] {
            strict = true;
        }
    }
    strict
}

/// SSE4.1 variant of [`dominate_left_avx2`].
#[cfg(all(target_arch = "x86_64", target_feature = "sse4.1"))]
#[target_feature(enable = "sse4.1")]
pub unsafe fn dominate_left_sse(left: &[f32], right: &[f32]) -> bool {
    debug_assert_eq!(left.len(), right.len());
    let len = left.len();
    let chunks = len / 4;

    let mut strict = false;
    for i in 0..chunks {
        let idx = i * 4;
        let l = _mm_loadu_ps(left.as_ptr().add(idx));
        let r = _mm_loadu_ps(right.as_ptr().add(idx));
        if _mm_movemask_ps(_mm_cmple_ps(l, r)) != 0xF {
            return false;
        }
        if _mm_movemask_ps(_mm_cmplt_ps(l, r)) != 0 {
            strict = true;
        }
    }
    for dim in (chunks * 4)..len {
        if !(left[dim] <= right[dim]) {
            return false;
        }
        if left[dim] < right[dim] {
            strict = true;
        }
    }
    strict
}

/// One-way dominance with the distinct-value assumption: `left <= right`
/// on every lane.
#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
#[target_feature(enable = "avx2")]
pub unsafe fn dominate_left_dvc_avx2(left: &[f32], right: &[f32]) -> bool {
    debug_assert_eq!(left.len(), right.len());
    let len = left.len();
    let chunks = len / 8;

    for i in 0..chunks {
        let idx = i * 8;
        let l = _mm256_loadu_ps(left.as_ptr().add(idx));
        let r = _mm256_loadu_ps(right.as_ptr().add(idx));
        let le = _mm256_cmp_ps::<_CMP_LE_OQ>(l, r);
        if _mm256_movemask_ps(le) != 0xFF {
            return false;
        }
    }
    for dim in (chunks * 8)..len {
        if !(left[dim] <= right[dim]) {
            return false;
        }
    }
    true
}

/// SSE4.1 variant of [`dominate_left_dvc_avx2`].
#[cfg(all(target_arch = "x86_64", target_feature = "sse4.1"))]
#[target_feature(enable = "sse4.1")]
pub unsafe fn dominate_left_dvc_sse(left: &[f32], right: &[f32]) -> bool {
    debug_assert_eq!(left.len(), right.len());
    let len = left.len();
    let chunks = len / 4;

    for i in 0..chunks {
        let idx = i * 4;
        let l = _mm_loadu_ps(left.as_ptr().add(idx));
        let r = _mm_loadu_ps(right.as_ptr().add(idx));
        if _mm_movemask_ps(_mm_cmple_ps(l, r)) != 0xF {
            return false;
        }
    }
    for dim in (chunks * 4)..len {
        if !(left[dim] <= right[dim]) {
            return false;
        }
    }
    true
}

// =============================================================================
// Runtime dispatch helpers
// =============================================================================

/// Check if AVX2 is available at runtime
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn has_avx2() -> bool {
    is_x86_feature_detected!("avx2")
}

/// Check if SSE4.1 is available at runtime
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn has_sse41() -> bool {
    is_x86_feature_detected!("sse4.1")
}

/// Get the best SIMD instruction set this build dispatches to
pub fn simd_level() -> &'static str {
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        return "AVX2";
    }

    #[cfg(all(
        target_arch = "x86_64",
        not(target_feature = "avx2"),
        target_feature = "sse4.1"
    ))]
    {
        return "SSE4.1";
    }

    #[cfg(not(any(
        all(target_arch = "x86_64", target_feature = "avx2"),
        all(target_arch = "x86_64", target_feature = "sse4.1")
    )))]
    {
        "Scalar"
    }
}

#[cfg(test)]
mod tests {
    use crate::dominance::{
        bitmap_dvc, bitmap_dvc_scalar, bitmap_ndvc, bitmap_ndvc_scalar, dominate_left,
        dominate_left_dvc, dominate_left_dvc_scalar, dominate_left_scalar,
    };
    use rand::prelude::*;

    fn random_pairs(dims: usize, count: usize, seed: u64) -> Vec<(Vec<f32>, Vec<f32>)> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let a: Vec<f32> = (0..dims).map(|_| rng.gen_range(0.0..1.0)).collect();
                // Bias some pairs toward domination so both outcomes are hit.
                let b: Vec<f32> = if rng.gen_bool(0.3) {
                    a.iter().map(|v| v + rng.gen_range(0.0..0.1)).collect()
                } else {
                    (0..dims).map(|_| rng.gen_range(0.0..1.0)).collect()
                };
                (a, b)
            })
            .collect()
    }

    #[test]
    fn test_dispatch_matches_scalar() {
        for dims in [1, 2, 3, 4, 7, 8, 9, 12, 16, 31] {
            for (a, b) in random_pairs(dims, 200, 42 + dims as u64) {
                assert_eq!(bitmap_dvc(&a, &b), bitmap_dvc_scalar(&a, &b), "d={dims}");
                assert_eq!(bitmap_ndvc(&a, &b), bitmap_ndvc_scalar(&a, &b), "d={dims}");
                assert_eq!(
                    dominate_left(&a, &b),
                    dominate_left_scalar(&a, &b),
                    "d={dims}"
                );
                assert_eq!(
                    dominate_left_dvc(&a, &b),
                    dominate_left_dvc_scalar(&a, &b),
                    "d={dims}"
                );
            }
        }
    }

    #[test]
    fn test_dispatch_matches_scalar_with_ties_and_nan() {
        let a = vec![1.0, 2.0, 2.0, f32::NAN, 5.0, 6.0, 7.0, 8.0, 9.0];
        let b = vec![1.0, 2.5, 1.5, 4.0, 5.0, 6.5, 7.0, 8.5, 9.0];
        assert_eq!(bitmap_dvc(&a, &b), bitmap_dvc_scalar(&a, &b));
        assert_eq!(bitmap_ndvc(&a, &b), bitmap_ndvc_scalar(&a, &b));
        assert_eq!(dominate_left(&a, &b), dominate_left_scalar(&a, &b));
        assert_eq!(dominate_left_dvc(&a, &b), dominate_left_dvc_scalar(&a, &b));
    }

    #[test]
    fn test_simd_level_nonempty() {
        assert!(!super::simd_level().is_empty());
    }
}
