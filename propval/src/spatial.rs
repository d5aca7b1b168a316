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

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::data::{PropertyType, Sale};
use crate::errors::SpatialError;

/// Axis-aligned search window in decimal degrees. North/south bound the
/// latitude, west/east the longitude; north > south and east > west always
/// hold for a constructed box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    north: f64,
    south: f64,
    west: f64,
    east: f64,
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, west: f64, east: f64) -> Result<Self, SpatialError> {
        let finite =
            north.is_finite() && south.is_finite() && west.is_finite() && east.is_finite();
        if !finite || north <= south || east <= west {
            return Err(SpatialError::InvalidBox { north, south, west, east });
        }
        Ok(BoundingBox { north, south, west, east })
    }

    /// A box of the given height and width centered on a point.
    pub fn centered(
        latitude: f64,
        longitude: f64,
        height: f64,
        width: f64,
    ) -> Result<Self, SpatialError> {
        if !(height > 0.0) || !(width > 0.0) || !height.is_finite() || !width.is_finite() {
            return Err(SpatialError::InvalidDimensions { height, width });
        }
        BoundingBox::new(
            latitude + height / 2.0,
            latitude - height / 2.0,
            longitude - width / 2.0,
            longitude + width / 2.0,
        )
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Strict containment; a point exactly on an edge is outside.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.north > latitude
            && latitude > self.south
            && self.east > longitude
            && longitude > self.west
    }

    /// True when `other` lies strictly inside this box on every side.
    pub fn strictly_contains(&self, other: &BoundingBox) -> bool {
        self.north > other.north
            && other.south > self.south
            && self.east > other.east
            && other.west > self.west
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "north {:.4}, south {:.4}, west {:.4}, east {:.4}",
            self.north, self.south, self.west, self.east
        )
    }
}

/// Transfer-date window. The filter treats both endpoints as excluded, so
/// the effective window is open on both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    lower: NaiveDate,
    upper: NaiveDate,
}

impl DateRange {
    pub fn new(lower: NaiveDate, upper: NaiveDate) -> Result<Self, SpatialError> {
        if lower >= upper {
            return Err(SpatialError::InvalidDateRange { lower, upper });
        }
        Ok(DateRange { lower, upper })
    }

    /// The window used for one prediction: 1 January five calendar years
    /// before the query date through 31 December five years after.
    pub fn around(date: NaiveDate) -> Self {
        let lower = NaiveDate::from_ymd_opt(date.year() - 5, 1, 1).expect("valid calendar date");
        let upper = NaiveDate::from_ymd_opt(date.year() + 5, 12, 31).expect("valid calendar date");
        DateRange { lower, upper }
    }

    pub fn lower(&self) -> NaiveDate {
        self.lower
    }

    pub fn upper(&self) -> NaiveDate {
        self.upper
    }

    /// Strict containment; dates equal to either bound are outside.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.upper > date && date > self.lower
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lower, self.upper)
    }
}

/// Rows strictly inside the box, strictly inside the date range, and of the
/// requested property type. Pure: preserves input order, never fails, and
/// returns an empty vector when nothing matches.
pub fn filter_sales(
    sales: &[Sale],
    area: &BoundingBox,
    period: &DateRange,
    kind: PropertyType,
) -> Vec<Sale> {
    sales
        .iter()
        .filter(|sale| {
            area.contains(sale.latitude, sale.longitude)
                && period.contains(sale.date_of_transfer)
                && sale.property_type == kind
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(latitude: f64, longitude: f64, d: NaiveDate, kind: PropertyType) -> Sale {
        Sale { price: 100_000, latitude, longitude, date_of_transfer: d, property_type: kind }
    }

    #[test]
    fn bounding_box_rejects_inverted_bounds() {
        let result = BoundingBox::new(51.0, 51.5, -0.3, -0.2);
        assert!(matches!(result, Err(SpatialError::InvalidBox { .. })));

        let result = BoundingBox::new(51.5, 51.0, -0.2, -0.3);
        assert!(matches!(result, Err(SpatialError::InvalidBox { .. })));

        let result = BoundingBox::new(51.5, 51.5, -0.3, -0.2);
        assert!(matches!(result, Err(SpatialError::InvalidBox { .. })));
    }

    #[test]
    fn bounding_box_rejects_non_finite_bounds() {
        let result = BoundingBox::new(f64::NAN, 51.0, -0.3, -0.2);
        assert!(matches!(result, Err(SpatialError::InvalidBox { .. })));
    }

    #[test]
    fn bounding_box_centered_dimensions() {
        let area = BoundingBox::centered(51.4, -0.3, 0.01, 0.02).unwrap();
        assert!((area.north() - 51.405).abs() < 1e-12);
        assert!((area.south() - 51.395).abs() < 1e-12);
        assert!((area.west() - (-0.31)).abs() < 1e-12);
        assert!((area.east() - (-0.29)).abs() < 1e-12);
        assert!((area.height() - 0.01).abs() < 1e-12);
        assert!((area.width() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn bounding_box_centered_rejects_bad_dimensions() {
        let result = BoundingBox::centered(51.4, -0.3, 0.0, 0.01);
        assert!(matches!(result, Err(SpatialError::InvalidDimensions { .. })));

        let result = BoundingBox::centered(51.4, -0.3, 0.01, -1.0);
        assert!(matches!(result, Err(SpatialError::InvalidDimensions { .. })));

        let result = BoundingBox::centered(51.4, -0.3, f64::NAN, 0.01);
        assert!(matches!(result, Err(SpatialError::InvalidDimensions { .. })));
    }

    #[test]
    fn contains_is_strict_on_every_edge() {
        let area = BoundingBox::new(51.5, 51.4, -0.4, -0.3).unwrap();
        assert!(area.contains(51.45, -0.35));
        assert!(!area.contains(51.5, -0.35)); // on north edge
        assert!(!area.contains(51.4, -0.35)); // on south edge
        assert!(!area.contains(51.45, -0.3)); // on east edge
        assert!(!area.contains(51.45, -0.4)); // on west edge
    }

    #[test]
    fn strictly_contains_doubled_box() {
        let inner = BoundingBox::centered(51.4, -0.3, 0.01, 0.01).unwrap();
        let outer = BoundingBox::centered(51.4, -0.3, 0.02, 0.02).unwrap();
        assert!(outer.strictly_contains(&inner));
        assert!(!inner.strictly_contains(&outer));
        assert!(!inner.strictly_contains(&inner));
    }

    #[test]
    fn date_range_around_spans_eleven_years() {
        let period = DateRange::around(date(2021, 6, 15));
        assert_eq!(period.lower(), date(2016, 1, 1));
        assert_eq!(period.upper(), date(2026, 12, 31));
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let result = DateRange::new(date(2022, 1, 1), date(2021, 1, 1));
        assert!(matches!(result, Err(SpatialError::InvalidDateRange { .. })));

        let result = DateRange::new(date(2021, 1, 1), date(2021, 1, 1));
        assert!(matches!(result, Err(SpatialError::InvalidDateRange { .. })));
    }

    #[test]
    fn date_range_contains_excludes_endpoints() {
        let period = DateRange::around(date(2021, 6, 15));
        assert!(period.contains(date(2021, 6, 15)));
        assert!(period.contains(date(2016, 1, 2)));
        assert!(period.contains(date(2026, 12, 30)));
        assert!(!period.contains(date(2016, 1, 1)));
        assert!(!period.contains(date(2026, 12, 31)));
    }

    #[test]
    fn filter_excludes_boundary_rows() {
        let area = BoundingBox::new(51.5, 51.4, -0.4, -0.3).unwrap();
        let period = DateRange::around(date(2021, 6, 15));
        let kind = PropertyType::Terraced;
        let sales = vec![
            sale(51.45, -0.35, date(2021, 3, 1), kind),
            sale(51.5, -0.35, date(2021, 3, 1), kind), // latitude == north
            sale(51.45, -0.3, date(2021, 3, 1), kind), // longitude == east
            sale(51.45, -0.35, date(2016, 1, 1), kind), // date == lower
            sale(51.45, -0.35, date(2026, 12, 31), kind), // date == upper
        ];

        let subset = filter_sales(&sales, &area, &period, kind);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].latitude, 51.45);
    }

    #[test]
    fn filter_matches_property_type_only() {
        let area = BoundingBox::new(51.5, 51.4, -0.4, -0.3).unwrap();
        let period = DateRange::around(date(2021, 6, 15));
        let sales = vec![
            sale(51.45, -0.35, date(2021, 3, 1), PropertyType::Terraced),
            sale(51.46, -0.36, date(2021, 3, 1), PropertyType::Flat),
            sale(51.47, -0.37, date(2021, 3, 1), PropertyType::Detached),
        ];

        let subset = filter_sales(&sales, &area, &period, PropertyType::Flat);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].property_type, PropertyType::Flat);
    }

    #[test]
    fn filter_returns_empty_when_nothing_matches() {
        let area = BoundingBox::new(51.5, 51.4, -0.4, -0.3).unwrap();
        let period = DateRange::around(date(2021, 6, 15));
        let sales = vec![sale(40.0, -0.35, date(2021, 3, 1), PropertyType::Flat)];

        let subset = filter_sales(&sales, &area, &period, PropertyType::Flat);
        assert!(subset.is_empty());
    }

    #[test]
    fn filter_preserves_input_order() {
        let area = BoundingBox::new(51.5, 51.4, -0.4, -0.3).unwrap();
        let period = DateRange::around(date(2021, 6, 15));
        let kind = PropertyType::Terraced;
        let mut sales = Vec::new();
        for i in 0..5 {
            let mut s = sale(51.45, -0.35, date(2021, 3, 1), kind);
            s.price = i;
            sales.push(s);
        }

        let subset = filter_sales(&sales, &area, &period, kind);
        let prices: Vec<u32> = subset.iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![0, 1, 2, 3, 4]);
    }
}
