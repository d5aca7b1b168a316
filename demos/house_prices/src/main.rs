use chrono::{Duration, NaiveDate};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use propval::{
    predict_price, CsvProvider, Dataset, DatasetProvider, PropertyType, TransactionRecord,
};

/// Synthesizes a plausible transaction table: 20,000 terraced sales
/// scattered over a one-degree box around south-west London, with prices
/// linear in location and date plus uniform noise.
fn synthetic_dataset() -> Dataset {
    let mut rng = StdRng::seed_from_u64(42);
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let first_day = NaiveDate::from_ymd_opt(2017, 1, 1)
        .unwrap()
        .signed_duration_since(epoch)
        .num_days();
    let last_day = NaiveDate::from_ymd_opt(2025, 12, 31)
        .unwrap()
        .signed_duration_since(epoch)
        .num_days();

    let records = (0..20_000)
        .map(|_| {
            let latitude = rng.gen_range(50.9..51.9);
            let longitude = rng.gen_range(-0.8..0.2);
            let day = rng.gen_range(first_day..=last_day);
            let noise = rng.gen_range(-10_000.0..10_000.0);
            let price = 200_000.0
                + 80_000.0 * (latitude - 51.4)
                - 50_000.0 * (longitude + 0.3)
                + 15.0 * (day - first_day) as f64
                + noise;
            TransactionRecord {
                price: price.round() as u32,
                date_of_transfer: epoch + Duration::days(day),
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
        })
        .collect();
    Dataset::new(records)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Pass a path to a prices_coordinates CSV to run against real data;
    // without one a synthetic table is used.
    let dataset = match std::env::args().nth(1) {
        Some(path) => {
            info!("loading transaction table from {}", path);
            CsvProvider::new(&path).provide()?
        }
        None => {
            info!("no CSV path given, synthesizing a transaction table");
            synthetic_dataset()
        }
    };
    println!("Transaction table: {} rows", dataset.len());

    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let valuation = predict_price(&dataset, 51.4, -0.3, date, PropertyType::Terraced)?;

    println!("Query: terraced house at (51.4, -0.3) on {date}");
    println!("Search window: {}", valuation.bounding_box);
    println!("Validation R2: {:.4}", valuation.r_squared);
    println!("Estimated price: {:.0}", valuation.predicted_price);

    Ok(())
}
