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

//! Workload input.
//!
//! One point per line, comma-separated decimal values, no header. An
//! optional leading line-number column can be skipped, and each column
//! can optionally be rescaled to [0, 1] using its min/max. Duplicate
//! rows are legal; the reader enforces nothing about value
//! distinctness.

use skybench_core::{Result, SkybenchError, MAX_DIMS};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A parsed workload: `rows.len()` points of `dims` values each.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub dims: usize,
    pub rows: Vec<Vec<f32>>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read a CSV workload.
///
/// `has_line_numbers` skips the first column of every row; `normalize`
/// rescales each column to [0, 1] by its min/max (a constant column
/// maps to 0).
pub fn read_data(path: &Path, has_line_numbers: bool, normalize: bool) -> Result<Dataset> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut rows: Vec<Vec<f32>> = Vec::new();
    let mut dims = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let skip = usize::from(has_line_numbers);
        let mut values = Vec::with_capacity(dims.max(4));
        for token in trimmed.split(',').skip(skip) {
            let v: f32 = token.trim().parse().map_err(|_| SkybenchError::Parse {
                line: idx + 1,
                message: format!("invalid value {:?}", token.trim()),
            })?;
            values.push(v);
        }

        if rows.is_empty() {
            dims = values.len();
            if dims == 0 || dims > MAX_DIMS {
                return Err(SkybenchError::Dimensionality {
                    got: dims,
                    max: MAX_DIMS,
                });
            }
        } else if values.len() != dims {
            return Err(SkybenchError::Parse {
                line: idx + 1,
                message: format!("expected {} values, found {}", dims, values.len()),
            });
        }
        rows.push(values);
    }

    if rows.is_empty() {
        return Err(SkybenchError::InvalidArgument(format!(
            "input '{}' contains no rows",
            path.display()
        )));
    }

    if normalize {
        normalize_columns(&mut rows, dims);
    }

    Ok(Dataset { dims, rows })
}

fn normalize_columns(rows: &mut [Vec<f32>], dims: usize) {
    let mut mins = vec![f32::INFINITY; dims];
    let mut maxs = vec![f32::NEG_INFINITY; dims];
    for row in rows.iter() {
        for d in 0..dims {
            mins[d] = mins[d].min(row[d]);
            maxs[d] = maxs[d].max(row[d]);
        }
    }
    for row in rows.iter_mut() {
        for d in 0..dims {
            let range = maxs[d] - mins[d];
            row[d] = if range > 0.0 {
                (row[d] - mins[d]) / range
            } else {
                0.0
            };
        }
    }
}
