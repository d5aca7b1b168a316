// BSD 3-Clause License
//
// Copyright (c) 2025, Propval Contributors
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Required column '{0}' is missing from the dataset")]
    MissingColumn(String),
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("Failed to open file: {0}")]
    FileOpen(#[from] std::io::Error),

    #[error("CSV file is empty")]
    EmptyFile,

    #[error("Schema violation: {0}")]
    Schema(#[from] SchemaError),

    #[error("Malformed record: {0}")]
    Record(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum SpatialError {
    #[error(
        "Invalid bounding box: north {north} must exceed south {south} and east {east} must exceed west {west}"
    )]
    InvalidBox { north: f64, south: f64, west: f64, east: f64 },

    #[error("Invalid date range: lower bound {lower} must precede upper bound {upper}")]
    InvalidDateRange { lower: NaiveDate, upper: NaiveDate },

    #[error("Invalid window dimensions: height {height} and width {width} must be positive and finite")]
    InvalidDimensions { height: f64, width: f64 },
}

#[derive(Error, Debug)]
pub enum WindowError {
    #[error(
        "Exceeded {limit} window expansions: {rows_found} rows inside {height}° x {width}° box, threshold {threshold}"
    )]
    MaxExpansionExceeded { limit: u32, threshold: usize, rows_found: usize, height: f64, width: f64 },

    #[error("Spatial error: {0}")]
    Spatial(#[from] SpatialError),
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Insufficient training data: {rows} rows, need at least {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("Singular design matrix: no independent variation at column {column}")]
    SingularMatrix { column: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Non-finite value in features or target")]
    NonFiniteValue,

    #[error("Invalid train fraction {fraction}: must lie strictly between 0 and 1")]
    InvalidTrainFraction { fraction: f64 },

    #[error("Empty input")]
    EmptyInput,

    #[error("Model has not been fitted")]
    NotFitted,
}

#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("Enrichment row count {actual} does not match subset row count {expected}")]
    RowMismatch { expected: usize, actual: usize },

    #[error("Enrichment query features {actual} do not match enrichment columns {expected}")]
    ColumnMismatch { expected: usize, actual: usize },

    #[error("Failed to shape enrichment data: {0}")]
    ArrayShape(#[from] ndarray::ShapeError),
}

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Window search failed: {0}")]
    Window(#[from] WindowError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),
}
