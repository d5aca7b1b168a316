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

//! Localized property price estimation over a flat transaction table.
//!
//! Given a table of past sales with coordinates, a query location, a date
//! and a property type, the crate grows a bounding box around the query
//! point until enough comparable sales fall inside, fits an ordinary
//! least squares model on (latitude, longitude, day-offset) over that
//! subset, reports the fit quality on held-out rows and evaluates the
//! model at the query point. Every prediction trains its own model; there
//! is no shared or persisted state between calls.
//!
//! ```no_run
//! use propval::chrono::NaiveDate;
//! use propval::{predict_price, CsvProvider, DatasetProvider, PropertyType};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = CsvProvider::new("prices_coordinates_data.csv").provide()?;
//!     let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!     let valuation = predict_price(&dataset, 51.4, -0.3, date, PropertyType::Terraced)?;
//!     println!(
//!         "estimated price {:.0} with R2 {:.4} from {}",
//!         valuation.predicted_price, valuation.r_squared, valuation.bounding_box
//!     );
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod enrichment;
pub mod errors;
pub mod model;
pub mod predictor;
pub mod spatial;
pub mod window;

pub use chrono;
pub use ndarray;

pub use data::{
    CsvConfig, CsvProvider, Dataset, DatasetProvider, PropertyType, Sale, TransactionRecord,
};
pub use enrichment::{Enrichment, NoEnrichment};
pub use errors::{
    CsvError, EnrichmentError, ModelError, PredictionError, SchemaError, SpatialError, WindowError,
};
pub use model::{OlsRegression, SplitConfig};
pub use predictor::{predict_price, Predictor, PredictorBuilder, Valuation};
pub use spatial::{BoundingBox, DateRange};
pub use window::WindowConfig;
