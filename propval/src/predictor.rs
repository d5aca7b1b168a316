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
use log::{debug, info};

use crate::data::{Dataset, PropertyType};
use crate::enrichment::{augment_features, augment_query, Enrichment, NoEnrichment};
use crate::errors::PredictionError;
use crate::model::{design_matrix, query_features, split_rows, OlsRegression, SplitConfig};
use crate::spatial::{filter_sales, BoundingBox, DateRange};
use crate::window::{expand_to_threshold, WindowConfig};

/// Outcome of one prediction: the fit quality on held-out rows, the
/// estimated sale price at the query point, and the search window the
/// learning set was drawn from.
#[derive(Debug, Clone, Copy)]
pub struct Valuation {
    pub r_squared: f64,
    pub predicted_price: f64,
    pub bounding_box: BoundingBox,
}

pub struct PredictorBuilder {
    window: WindowConfig,
    split: SplitConfig,
    enrichment: Box<dyn Enrichment>,
}

impl PredictorBuilder {
    pub fn window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    pub fn enrichment(mut self, enrichment: impl Enrichment + 'static) -> Self {
        self.enrichment = Box::new(enrichment);
        self
    }

    pub fn build(self) -> Predictor {
        Predictor { window: self.window, split: self.split, enrichment: self.enrichment }
    }
}

/// Localized price estimator over a flat transaction table. Each call
/// selects its own learning set around the query point and fits a fresh
/// model; nothing is cached or persisted between calls.
pub struct Predictor {
    window: WindowConfig,
    split: SplitConfig,
    enrichment: Box<dyn Enrichment>,
}

impl Predictor {
    /// Starts a builder with the default window, the default positional
    /// split, and no enrichment.
    pub fn new() -> PredictorBuilder {
        PredictorBuilder {
            window: WindowConfig::default(),
            split: SplitConfig::default(),
            enrichment: Box::new(NoEnrichment),
        }
    }

    /// Estimates the sale price of a property of the given type at the
    /// given location and date.
    ///
    /// The labelled rows are searched with an expanding window around the
    /// query point until enough sales of the requested type fall inside,
    /// the captured subset is split into training and validation
    /// partitions, a linear model over (latitude, longitude, day-offset)
    /// plus any enrichment columns is fitted on the training rows, and the
    /// model is scored on the validation rows and evaluated at the query
    /// point. Every failure surfaces as a typed [`PredictionError`]; there
    /// is no fallback estimate.
    pub fn predict(
        &self,
        dataset: &Dataset,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
        property_type: PropertyType,
    ) -> Result<Valuation, PredictionError> {
        let sales = dataset.labelled()?;
        let period = DateRange::around(date);
        let area = expand_to_threshold(
            &sales,
            latitude,
            longitude,
            &period,
            property_type,
            &self.window,
        )?;
        // The search hands back only the box; the subset is re-filtered
        // from scratch here.
        let subset = filter_sales(&sales, &area, &period, property_type);
        debug!(
            "learning set: {} rows of type {} inside {} over {}",
            subset.len(),
            property_type,
            area,
            period
        );

        let (features, targets) = design_matrix(&subset);
        let extra = self.enrichment.subset_features(&subset, &area, &period, property_type)?;
        let enrichment_columns = extra.ncols();
        let features = augment_features(&features, &extra)?;

        let split = split_rows(&features, &targets, &self.split)?;
        let mut model = OlsRegression::new();
        model.fit(&split.train_features, &split.train_targets)?;
        let r_squared = model.r_squared(&split.validation_features, &split.validation_targets)?;
        debug!(
            "validation R2 {:.6} on {} held-out rows",
            r_squared,
            split.validation_targets.len()
        );

        let query = query_features(latitude, longitude, date);
        let query_extra = self.enrichment.query_features(latitude, longitude, date, property_type)?;
        let query = augment_query(&query, &query_extra, enrichment_columns)?;
        let predicted_price = model.predict(&query)?[0];

        info!(
            "predicted {:.0} for type {} at ({:.4}, {:.4}) on {}: R2 {:.4} from {} rows",
            predicted_price,
            property_type,
            latitude,
            longitude,
            date,
            r_squared,
            subset.len()
        );
        Ok(Valuation { r_squared, predicted_price, bounding_box: area })
    }
}

/// Single-shot prediction with the default configuration. Equivalent to
/// `Predictor::new().build().predict(..)`.
pub fn predict_price(
    dataset: &Dataset,
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
    property_type: PropertyType,
) -> Result<Valuation, PredictionError> {
    Predictor::new().build().predict(dataset, latitude, longitude, date, property_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Sale, TransactionRecord};
    use crate::errors::{EnrichmentError, ModelError, SchemaError, WindowError};
    use crate::model::day_offset;
    use chrono::Duration;
    use ndarray::{array, Array1, Array2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(price: u32, latitude: f64, longitude: f64, d: NaiveDate) -> TransactionRecord {
        TransactionRecord {
            price,
            date_of_transfer: d,
            postcode: "SW19 8AB".to_string(),
            property_type: PropertyType::Terraced,
            new_build_flag: 'N',
            tenure_type: 'F',
            locality: String::new(),
            town_city: "LONDON".to_string(),
            district: "MERTON".to_string(),
            county: "GREATER LONDON".to_string(),
            country: "England".to_string(),
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// 15 x 15 grid around (51.4, -0.3) with prices exactly linear in
    /// (latitude, longitude, day-offset). Dates vary non-linearly across
    /// the grid so the day column is independent of the coordinates.
    fn exact_linear_grid() -> Dataset {
        let base = date(2021, 1, 1);
        let mut records = Vec::new();
        for i in 0..15i64 {
            for j in 0..15i64 {
                let k = (i * j) % 17;
                let price = 250_000 + 3_000 * (i - 7) + 2_000 * (j - 7) + 40 * k;
                records.push(record(
                    price as u32,
                    51.4 + (i - 7) as f64 * 1e-3,
                    -0.3 + (j - 7) as f64 * 1e-3,
                    base + Duration::days(k),
                ));
            }
        }
        Dataset::new(records)
    }

    #[test]
    fn recovers_exact_linear_prices() {
        let dataset = exact_linear_grid();
        let config = WindowConfig { threshold: 225, ..WindowConfig::default() };
        let predictor = Predictor::new().window(config).build();

        let valuation = predictor
            .predict(&dataset, 51.4, -0.3, date(2021, 1, 1), PropertyType::Terraced)
            .unwrap();

        assert!((valuation.r_squared - 1.0).abs() < 1e-9, "R2 = {}", valuation.r_squared);
        assert!(
            (valuation.predicted_price - 250_000.0).abs() < 0.01,
            "predicted {}",
            valuation.predicted_price
        );
        assert!(valuation.bounding_box.height() >= 0.01);
        assert!(valuation.bounding_box.height() < 0.05);
    }

    #[test]
    fn end_to_end_scattered_city() {
        // 20,000 terraced sales uniformly scattered over a 1 x 1 degree
        // box around (51.4, -0.3), prices linear in the day-offset.
        let mut rng = StdRng::seed_from_u64(7);
        let first_day = day_offset(date(2017, 1, 1));
        let last_day = day_offset(date(2025, 12, 31));
        let epoch = date(1970, 1, 1);
        let records: Vec<TransactionRecord> = (0..20_000)
            .map(|_| {
                let latitude = rng.gen_range(50.9..51.9);
                let longitude = rng.gen_range(-0.8..0.2);
                let day = rng.gen_range(first_day..=last_day);
                let price = 150_000 + 12 * (day - first_day);
                record(price as u32, latitude, longitude, epoch + Duration::days(day))
            })
            .collect();
        let dataset = Dataset::new(records);

        let query_date = date(2021, 6, 15);
        let valuation =
            predict_price(&dataset, 51.4, -0.3, query_date, PropertyType::Terraced).unwrap();

        assert!(valuation.r_squared > 0.99, "R2 = {}", valuation.r_squared);
        let expected = 150_000.0 + 12.0 * (day_offset(query_date) - first_day) as f64;
        assert!(
            (valuation.predicted_price - expected).abs() < 1.0,
            "predicted {} expected {}",
            valuation.predicted_price,
            expected
        );

        // The returned box meets the threshold, and one doubling earlier
        // it did not.
        let sales = dataset.labelled().unwrap();
        let period = DateRange::around(query_date);
        let area = valuation.bounding_box;
        let matched = filter_sales(&sales, &area, &period, PropertyType::Terraced).len();
        assert!(matched >= 10_000, "final box holds {} rows", matched);
        let previous =
            BoundingBox::centered(51.4, -0.3, area.height() / 2.0, area.width() / 2.0).unwrap();
        let matched_before =
            filter_sales(&sales, &previous, &period, PropertyType::Terraced).len();
        assert!(matched_before < 10_000, "previous box already held {} rows", matched_before);
        assert!(area.height() < 1.29);
    }

    #[test]
    fn threshold_unreachable_is_reported() {
        let records: Vec<TransactionRecord> = (0..10)
            .map(|i| record(200_000, 51.4 + i as f64 * 1e-4, -0.3, date(2021, 3, 1)))
            .collect();
        let dataset = Dataset::new(records);

        let result = predict_price(&dataset, 51.4, -0.3, date(2021, 6, 15), PropertyType::Terraced);

        match result {
            Err(PredictionError::Window(WindowError::MaxExpansionExceeded {
                limit,
                threshold,
                rows_found,
                ..
            })) => {
                assert_eq!(limit, 32);
                assert_eq!(threshold, 10_000);
                assert_eq!(rows_found, 10);
            }
            other => panic!("expected MaxExpansionExceeded, got {:?}", other),
        }
    }

    #[test]
    fn missing_column_is_reported() {
        let columns = vec![
            "price".to_string(),
            "latitude".to_string(),
            "longitude".to_string(),
            "date_of_transfer".to_string(),
        ];
        let dataset = Dataset::with_columns(columns, vec![]);

        let result = predict_price(&dataset, 51.4, -0.3, date(2021, 6, 15), PropertyType::Terraced);

        assert!(matches!(
            result,
            Err(PredictionError::Schema(SchemaError::MissingColumn(column)))
                if column == "property_type"
        ));
    }

    #[test]
    fn insufficient_training_rows_are_reported() {
        let dataset = Dataset::new(vec![
            record(200_000, 51.401, -0.301, date(2021, 3, 1)),
            record(210_000, 51.399, -0.299, date(2021, 5, 1)),
        ]);
        let config = WindowConfig { threshold: 2, ..WindowConfig::default() };
        let predictor = Predictor::new().window(config).build();

        let result =
            predictor.predict(&dataset, 51.4, -0.3, date(2021, 6, 15), PropertyType::Terraced);

        assert!(matches!(
            result,
            Err(PredictionError::Model(ModelError::InsufficientData { rows: 1, required: 2 }))
        ));
    }

    #[test]
    fn identical_points_are_singular() {
        let records: Vec<TransactionRecord> = (0..12)
            .map(|i| record(150_000 + i * 1_000, 51.4, -0.3, date(2021, 3, 1)))
            .collect();
        let dataset = Dataset::new(records);
        let config = WindowConfig { threshold: 12, ..WindowConfig::default() };
        let predictor = Predictor::new().window(config).build();

        let result =
            predictor.predict(&dataset, 51.4, -0.3, date(2021, 6, 15), PropertyType::Terraced);

        assert!(matches!(
            result,
            Err(PredictionError::Model(ModelError::SingularMatrix { column: 0 }))
        ));
    }

    /// Contributes the squared latitude offset from the query point, a
    /// column the base design matrix cannot express.
    struct SquaredLatitude;

    impl Enrichment for SquaredLatitude {
        fn subset_features(
            &self,
            subset: &[Sale],
            _area: &BoundingBox,
            _period: &DateRange,
            _kind: PropertyType,
        ) -> Result<Array2<f64>, EnrichmentError> {
            let mut extra = Array2::zeros((subset.len(), 1));
            for (i, sale) in subset.iter().enumerate() {
                extra[[i, 0]] = (sale.latitude - 51.4).powi(2);
            }
            Ok(extra)
        }

        fn query_features(
            &self,
            latitude: f64,
            _longitude: f64,
            _date: NaiveDate,
            _kind: PropertyType,
        ) -> Result<Array1<f64>, EnrichmentError> {
            Ok(array![(latitude - 51.4).powi(2)])
        }
    }

    /// 21 x 21 grid whose prices carry a quadratic latitude term on top of
    /// linear longitude and date terms.
    fn quadratic_grid() -> Dataset {
        let base = date(2021, 1, 1);
        let mut records = Vec::new();
        for i in 0..21i64 {
            for j in 0..21i64 {
                let k = (i + 2 * j) % 13;
                let price = 100_000 + 50 * (i - 10) * (i - 10) + 30 * (j - 10) + 40 * k;
                records.push(record(
                    price as u32,
                    51.4 + (i - 10) as f64 * 9e-4,
                    -0.3 + (j - 10) as f64 * 9e-4,
                    base + Duration::days(k),
                ));
            }
        }
        Dataset::new(records)
    }

    #[test]
    fn enrichment_columns_flow_through_the_fit() {
        let dataset = quadratic_grid();
        let config = WindowConfig { threshold: 441, ..WindowConfig::default() };

        // Without the quadratic column the linear model cannot follow the
        // prices.
        let plain = Predictor::new().window(config.clone()).build();
        let valuation = plain
            .predict(&dataset, 51.4, -0.3, date(2021, 1, 1), PropertyType::Terraced)
            .unwrap();
        assert!(valuation.r_squared < 0.9, "R2 = {}", valuation.r_squared);

        // With it the fit is exact.
        let enriched = Predictor::new().window(config).enrichment(SquaredLatitude).build();
        let valuation = enriched
            .predict(&dataset, 51.4, -0.3, date(2021, 1, 1), PropertyType::Terraced)
            .unwrap();
        assert!((valuation.r_squared - 1.0).abs() < 1e-6, "R2 = {}", valuation.r_squared);
        assert!(
            (valuation.predicted_price - 100_000.0).abs() < 0.1,
            "predicted {}",
            valuation.predicted_price
        );
    }

    struct FixedRows(usize);

    impl Enrichment for FixedRows {
        fn subset_features(
            &self,
            _subset: &[Sale],
            _area: &BoundingBox,
            _period: &DateRange,
            _kind: PropertyType,
        ) -> Result<Array2<f64>, EnrichmentError> {
            Ok(Array2::zeros((self.0, 1)))
        }

        fn query_features(
            &self,
            _latitude: f64,
            _longitude: f64,
            _date: NaiveDate,
            _kind: PropertyType,
        ) -> Result<Array1<f64>, EnrichmentError> {
            Ok(Array1::zeros(1))
        }
    }

    struct OversizedQuery;

    impl Enrichment for OversizedQuery {
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
            Ok(array![1.0])
        }
    }

    fn small_grid() -> Dataset {
        let base = date(2021, 1, 1);
        let mut records = Vec::new();
        for i in 0..5i64 {
            for j in 0..5i64 {
                let k = (i + 2 * j) % 7;
                let price = 200_000 + 1_000 * i + 500 * j + 10 * k;
                records.push(record(
                    price as u32,
                    51.4 + (i - 2) as f64 * 1e-3,
                    -0.3 + (j - 2) as f64 * 1e-3,
                    base + Duration::days(k),
                ));
            }
        }
        Dataset::new(records)
    }

    #[test]
    fn enrichment_row_mismatch_is_reported() {
        let dataset = small_grid();
        let config = WindowConfig { threshold: 25, ..WindowConfig::default() };
        let predictor = Predictor::new().window(config).enrichment(FixedRows(3)).build();

        let result =
            predictor.predict(&dataset, 51.4, -0.3, date(2021, 1, 1), PropertyType::Terraced);

        assert!(matches!(
            result,
            Err(PredictionError::Enrichment(EnrichmentError::RowMismatch {
                expected: 25,
                actual: 3
            }))
        ));
    }

    #[test]
    fn enrichment_query_mismatch_is_reported() {
        let dataset = small_grid();
        let config = WindowConfig { threshold: 25, ..WindowConfig::default() };
        let predictor = Predictor::new().window(config).enrichment(OversizedQuery).build();

        let result =
            predictor.predict(&dataset, 51.4, -0.3, date(2021, 1, 1), PropertyType::Terraced);

        assert!(matches!(
            result,
            Err(PredictionError::Enrichment(EnrichmentError::ColumnMismatch {
                expected: 0,
                actual: 1
            }))
        ));
    }

    #[test]
    fn shuffled_split_is_seed_deterministic() {
        let dataset = exact_linear_grid();
        let window = WindowConfig { threshold: 225, ..WindowConfig::default() };
        let split = SplitConfig { shuffle: true, seed: Some(11), ..SplitConfig::default() };

        let predictor = Predictor::new().window(window.clone()).split(split.clone()).build();
        let first = predictor
            .predict(&dataset, 51.4, -0.3, date(2021, 1, 1), PropertyType::Terraced)
            .unwrap();
        let predictor = Predictor::new().window(window).split(split).build();
        let second = predictor
            .predict(&dataset, 51.4, -0.3, date(2021, 1, 1), PropertyType::Terraced)
            .unwrap();

        assert_eq!(first.r_squared, second.r_squared);
        assert_eq!(first.predicted_price, second.predicted_price);
        // An exactly linear surface stays exact under any permutation.
        assert!((first.r_squared - 1.0).abs() < 1e-9);
    }
}
