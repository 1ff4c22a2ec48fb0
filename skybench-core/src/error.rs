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

//! Error types for SkyBench

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkybenchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported dimensionality {got}: must be between 1 and {max}")]
    Dimensionality { got: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, SkybenchError>;
