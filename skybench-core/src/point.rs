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

//! Point model for skyline computation.
//!
//! Three layers, from bare to fully annotated:
//!
//! - [`Point`]: a d-dimensional f32 vector plus its original input index
//!   (`pid`). Output identity is carried by the pid.
//! - [`ScoredPoint`]: a point plus its Manhattan norm, used by the
//!   sort-based engines.
//! - [`EncodedPoint`]: a scored point plus a packed partition word:
//!   low d bits = lattice mask against a pivot, upper bits = level
//!   (popcount of the mask). A dedicated `PRUNED` sentinel occupies the
//!   maximal word so pruned points sort strictly after every live point
//!   and are detectable in one comparison.

use std::cmp::Ordering;

/// Maximum supported dimensionality: one lattice bit per dimension must
/// fit a 32-bit word.
pub const MAX_DIMS: usize = 31;

/// Maximum dimensionality of the packed (level | mask) encoding: the
/// level value (up to d, 5 bits at this width) must fit above the
/// d-bit mask. Engines that keep raw lattice masks go up to
/// [`MAX_DIMS`]; anything packing levels is bounded by this.
pub const MAX_ENCODED_DIMS: usize = 27;

/// Sentinel partition word marking a point as pruned.
///
/// Strictly greater than any valid encoding `(level << dims) | mask`, so
/// a sort by partition word pushes pruned points past every live one.
pub const PRUNED: u32 = u32::MAX;

/// Mask with one bit per dimension.
#[inline]
pub fn all_ones(dims: usize) -> u32 {
    (1u32 << dims) - 1
}

/// Manhattan norm: the sum of all coordinates.
#[inline]
pub fn manhattan(elems: &[f32]) -> f32 {
    elems.iter().sum()
}

/// Access to a point's coordinate vector, the seam shared by every
/// point flavor so passes like pivot selection can run on any of them.
pub trait Coordinates {
    fn coords(&self) -> &[f32];
}

/// A d-dimensional point with its original input index.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub pid: u32,
    pub elems: Vec<f32>,
}

impl Point {
    /// Copy input rows into an owned point buffer, assigning pids densely
    /// in input order.
    pub fn from_rows(rows: &[Vec<f32>]) -> Vec<Point> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| Point {
                pid: i as u32,
                elems: row.clone(),
            })
            .collect()
    }
}

impl Coordinates for Point {
    #[inline]
    fn coords(&self) -> &[f32] {
        &self.elems
    }
}

/// A point carrying its Manhattan norm.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub pid: u32,
    pub score: f32,
    pub elems: Vec<f32>,
}

impl ScoredPoint {
    pub fn from_rows(rows: &[Vec<f32>]) -> Vec<ScoredPoint> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| ScoredPoint {
                pid: i as u32,
                score: 0.0,
                elems: row.clone(),
            })
            .collect()
    }

    /// Total order by score. The Manhattan-norm tiebreak of the original
    /// sort-based engines is degenerate here (the score *is* the
    /// Manhattan norm), so a total float compare suffices.
    #[inline]
    pub fn score_order(&self, other: &ScoredPoint) -> Ordering {
        self.score.total_cmp(&other.score)
    }
}

impl Coordinates for ScoredPoint {
    #[inline]
    fn coords(&self) -> &[f32] {
        &self.elems
    }
}

/// A scored point carrying a packed partition word.
///
/// Live encoding: `(popcount(mask) << dims) | mask`. Natural order is
/// (level, mask, score), which the packed word plus a score tiebreak
/// yields directly.
#[derive(Debug, Clone)]
pub struct EncodedPoint {
    pub pid: u32,
    pub score: f32,
    pub partition: u32,
    pub elems: Vec<f32>,
}

impl EncodedPoint {
    pub fn from_rows(rows: &[Vec<f32>]) -> Vec<EncodedPoint> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| EncodedPoint {
                pid: i as u32,
                score: 0.0,
                partition: 0,
                elems: row.clone(),
            })
            .collect()
    }

    /// Encode a lattice mask into the packed (level | mask) word.
    ///
    /// The level field must fit above the mask, bounding this encoding
    /// to [`MAX_ENCODED_DIMS`]; callers validate their width up front.
    #[inline]
    pub fn encode(mask: u32, dims: usize) -> u32 {
        debug_assert!(dims <= MAX_ENCODED_DIMS);
        (mask.count_ones() << dims) | mask
    }

    #[inline]
    pub fn set_partition(&mut self, mask: u32, dims: usize) {
        self.partition = Self::encode(mask, dims);
    }

    #[inline]
    pub fn level(&self, dims: usize) -> u32 {
        self.partition >> dims
    }

    #[inline]
    pub fn mask(&self, dims: usize) -> u32 {
        self.partition & all_ones(dims)
    }

    #[inline]
    pub fn mark_pruned(&mut self) {
        self.partition = PRUNED;
    }

    #[inline]
    pub fn is_pruned(&self) -> bool {
        self.partition == PRUNED
    }

    /// A partition with a bit this point does not have cannot contain a
    /// dominating point, so the whole partition can be skipped.
    #[inline]
    pub fn can_skip_partition(&self, other_mask: u32, dims: usize) -> bool {
        (self.mask(dims) ^ other_mask) & other_mask != 0
    }

    /// Natural order: packed partition word ascending, then score.
    /// Pruned points (maximal word) sort last.
    #[inline]
    pub fn encoded_order(&self, other: &EncodedPoint) -> Ordering {
        self.partition
            .cmp(&other.partition)
            .then_with(|| self.score.total_cmp(&other.score))
    }
}

impl Coordinates for EncodedPoint {
    #[inline]
    fn coords(&self) -> &[f32] {
        &self.elems
    }
}
