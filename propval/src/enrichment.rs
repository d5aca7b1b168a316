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
use ndarray::{concatenate, Array1, Array2, Axis};

use crate::data::{PropertyType, Sale};
use crate::errors::EnrichmentError;
use crate::spatial::{BoundingBox, DateRange};

/// Extension seam for augmenting a learning set with features from an
/// external source, such as points of interest or amenity counts around
/// each sale.
///
/// Implementations contribute extra feature columns that the regression
/// pipeline appends to the base design matrix by row position, and the
/// matching values for the query point so the fitted model can be evaluated
/// there. `subset_features` must return one row per sale in the subset, in
/// the same order, and `query_features` one value per column of
/// `subset_features`; mismatches are rejected with a typed error before the
/// fit. An implementation that returns zero columns leaves the fit
/// untouched; [`NoEnrichment`] does exactly that and is the default.
pub trait Enrichment {
    /// Extra feature columns for a filtered subset.
    ///
    /// # Parameters
    /// - `subset`: The sales the window search selected, in filter order.
    /// - `area`: The bounding box the subset was drawn from.
    /// - `period`: The transfer-date window of the subset.
    /// - `kind`: The property type the subset was filtered to.
    ///
    /// # Returns
    /// An `Array2<f64>` of shape `(subset.len(), columns)`. Zero columns
    /// means no enrichment.
    fn subset_features(
        &self,
        subset: &[Sale],
        area: &BoundingBox,
        period: &DateRange,
        kind: PropertyType,
    ) -> Result<Array2<f64>, EnrichmentError>;

    /// Extra feature values for the query point, in the same column order
    /// as `subset_features`.
    fn query_features(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
        kind: PropertyType,
    ) -> Result<Array1<f64>, EnrichmentError>;
}

/// The shipped default: contributes no columns, so the pipeline fits on
/// location and date alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnrichment;

impl Enrichment for NoEnrichment {
    fn subset_features(
        &self,
        subset: &[Sale],
        _area: &BoundingBox,
        _period: &DateRange,
        _kind: PropertyType,
    ) -> Result<Array2<f64>, EnrichmentError> {
        Ok(Array2::zeros((subset.len(), 0)))
    }

    fn query_features(
        &self,
        _latitude: f64,
        _longitude: f64,
        _date: NaiveDate,
        _kind: PropertyType,
    ) -> Result<Array1<f64>, EnrichmentError> {
        Ok(Array1::zeros(0))
    }
}

/// Appends enrichment columns to a base feature matrix by row position.
/// Zero extra columns passes the base through unchanged.
pub fn augment_features(
    base: &Array2<f64>,
    extra: &Array2<f64>,
) -> Result<Array2<f64>, EnrichmentError> {
    if extra.ncols() == 0 {
        return Ok(base.clone());
    }
    if extra.nrows() != base.nrows() {
        return Err(EnrichmentError::RowMismatch {
            expected: base.nrows(),
            actual: extra.nrows(),
        });
    }
    Ok(concatenate(Axis(1), &[base.view(), extra.view()])?)
}

/// Appends the query point's enrichment values to its feature row.
/// `expected` is the column count the subset enrichment produced; the query
/// values must line up with it.
pub fn augment_query(
    base: &Array2<f64>,
    extra: &Array1<f64>,
    expected: usize,
) -> Result<Array2<f64>, EnrichmentError> {
    if extra.len() != expected {
        return Err(EnrichmentError::ColumnMismatch { expected, actual: extra.len() });
    }
    if expected == 0 {
        return Ok(base.clone());
    }
    let extra_row = extra.view().insert_axis(Axis(0));
    Ok(concatenate(Axis(1), &[base.view(), extra_row])?)
}
