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
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::{CsvError, SchemaError};

/// Column order of the flat joined table produced by the upstream loader
/// (price paid feed left-joined with postcode coordinates).
pub const TRANSACTION_COLUMNS: [&str; 13] = [
    "price",
    "date_of_transfer",
    "postcode",
    "property_type",
    "new_build_flag",
    "tenure_type",
    "locality",
    "town_city",
    "district",
    "county",
    "country",
    "latitude",
    "longitude",
];

/// The columns a labelled learning set retains.
pub const LEARNING_COLUMNS: [&str; 5] =
    ["price", "latitude", "longitude", "date_of_transfer", "property_type"];

/// Dwelling classification carried by the price paid feed, single-letter
/// codes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum PropertyType {
    #[serde(rename = "F")]
    Flat,
    #[serde(rename = "S")]
    SemiDetached,
    #[serde(rename = "D")]
    Detached,
    #[serde(rename = "T")]
    Terraced,
    #[serde(rename = "O")]
    Other,
}

impl PropertyType {
    pub fn code(&self) -> char {
        match self {
            PropertyType::Flat => 'F',
            PropertyType::SemiDetached => 'S',
            PropertyType::Detached => 'D',
            PropertyType::Terraced => 'T',
            PropertyType::Other => 'O',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'F' => Some(PropertyType::Flat),
            'S' => Some(PropertyType::SemiDetached),
            'D' => Some(PropertyType::Detached),
            'T' => Some(PropertyType::Terraced),
            'O' => Some(PropertyType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One row of the flat joined table. Coordinates are optional because the
/// upstream join is a left join; postcodes missing from the geocoding feed
/// come through with empty latitude/longitude fields.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    pub price: u32,
    pub date_of_transfer: NaiveDate,
    pub postcode: String,
    pub property_type: PropertyType,
    pub new_build_flag: char,
    pub tenure_type: char,
    pub locality: String,
    pub town_city: String,
    pub district: String,
    pub county: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A labelled sale ready for learning: the five learning columns with
/// coordinates guaranteed present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sale {
    pub price: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub date_of_transfer: NaiveDate,
    pub property_type: PropertyType,
}

/// An in-memory view of the flat table, tracking which columns it carries so
/// narrowed or malformed tables are detectable.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<TransactionRecord>,
}

impl Dataset {
    /// A dataset carrying the full transaction schema.
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        let columns = TRANSACTION_COLUMNS.iter().map(|c| c.to_string()).collect();
        Dataset { columns, records }
    }

    /// A dataset restricted to an explicit column set, e.g. one decoded from
    /// a table that does not carry the full schema.
    pub fn with_columns(columns: Vec<String>, records: Vec<TransactionRecord>) -> Self {
        Dataset { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Narrows the table to the learning columns, preserving row order and
    /// dropping rows whose coordinates are missing. Fails when a learning
    /// column is absent from the table.
    pub fn labelled(&self) -> Result<Vec<Sale>, SchemaError> {
        for required in LEARNING_COLUMNS {
            if !self.columns.iter().any(|c| c == required) {
                return Err(SchemaError::MissingColumn(required.to_string()));
            }
        }

        let mut sales = Vec::with_capacity(self.records.len());
        let mut dropped = 0usize;
        for record in &self.records {
            match (record.latitude, record.longitude) {
                (Some(latitude), Some(longitude)) => sales.push(Sale {
                    price: record.price,
                    latitude,
                    longitude,
                    date_of_transfer: record.date_of_transfer,
                    property_type: record.property_type,
                }),
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            log::debug!(
                "labelled: dropped {} of {} rows with missing coordinates",
                dropped,
                self.records.len()
            );
        }
        Ok(sales)
    }
}

/// Source of the flat joined table. Producing the table (downloading feeds,
/// running the postcode join) is the collaborator's business; the core only
/// consumes what a provider hands it.
pub trait DatasetProvider {
    type Error: std::error::Error + 'static;

    fn provide(&self) -> Result<Dataset, Self::Error>;
}

/// Configuration for the CSV-backed provider.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    pub path: PathBuf,
    pub has_headers: bool,
    pub delimiter: u8,
}

impl CsvConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvConfig { path: path.as_ref().to_path_buf(), has_headers: true, delimiter: b',' }
    }

    pub fn has_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Reads the flat joined table from a CSV file, decoding each row into a
/// typed [`TransactionRecord`]. With headers enabled the column set is
/// validated up front; without headers the full schema order is assumed.
pub struct CsvProvider {
    config: CsvConfig,
}

impl CsvProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        CsvProvider { config: CsvConfig::new(path) }
    }

    pub fn with_config(config: CsvConfig) -> Self {
        CsvProvider { config }
    }
}

impl DatasetProvider for CsvProvider {
    type Error = CsvError;

    fn provide(&self) -> Result<Dataset, Self::Error> {
        let file = File::open(&self.config.path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(self.config.has_headers)
            .delimiter(self.config.delimiter)
            .from_reader(file);

        let columns: Vec<String> = if self.config.has_headers {
            let headers = rdr.headers()?;
            if headers.is_empty() {
                return Err(CsvError::EmptyFile);
            }
            let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
            for required in TRANSACTION_COLUMNS {
                if !columns.iter().any(|c| c == required) {
                    return Err(CsvError::Schema(SchemaError::MissingColumn(
                        required.to_string(),
                    )));
                }
            }
            columns
        } else {
            TRANSACTION_COLUMNS.iter().map(|c| c.to_string()).collect()
        };

        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: TransactionRecord = result?;
            records.push(record);
        }
        log::debug!(
            "loaded {} transaction records from {}",
            records.len(),
            self.config.path.display()
        );
        Ok(Dataset::with_columns(columns, records))
    }
}
