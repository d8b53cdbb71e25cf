//! Export estimates and lot data to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts. A lot-set export can be read back with `load_lot_set_csv`.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::domain::{LotEstimates, LotSet, ShelfLife};
use crate::error::AppError;

const ESTIMATE_HEADER: [&str; 9] = [
    "series",
    "is_average",
    "month",
    "observed",
    "predicted",
    "lower",
    "upper",
    "shelf_life_months",
    "status",
];

/// Write one row per (series, time point).
pub fn write_estimates_csv(path: &Path, lots: &LotSet, estimates: &LotEstimates) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    writer
        .write_record(ESTIMATE_HEADER)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (label, is_average, values) in lots.series() {
        let Some(est) = estimates.iter().find(|e| e.label == label && e.is_average == is_average) else {
            continue;
        };
        let est = &est.estimate;
        let (shelf_life_months, status) = shelf_life_columns(est.shelf_life);

        for (i, (&t, &y)) in lots.times().iter().zip(values).enumerate() {
            let (lower, upper) = match &est.confidence_band {
                Some(band) => (format!("{:.4}", band.lower[i]), format!("{:.4}", band.upper[i])),
                None => (String::new(), String::new()),
            };
            writer
                .write_record([
                    label.to_string(),
                    is_average.to_string(),
                    format!("{t}"),
                    format!("{y:.4}"),
                    format!("{:.4}", est.predicted[i]),
                    lower,
                    upper,
                    shelf_life_months.clone(),
                    status.to_string(),
                ])
                .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))
}

/// Write lots in the stability CSV layout (`month` column, then one column per lot).
pub fn write_lot_set_csv(path: &Path, lots: &LotSet) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;

    let header: Vec<&str> = std::iter::once("month")
        .chain(lots.lots().iter().map(|l| l.label.as_str()))
        .collect();
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write lot CSV header: {e}")))?;

    for (i, t) in lots.times().iter().enumerate() {
        let row: Vec<String> = std::iter::once(format!("{t}"))
            .chain(lots.lots().iter().map(|l| format!("{}", l.values[i])))
            .collect();
        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write lot CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush lot CSV: {e}")))
}

fn create_writer(path: &Path) -> Result<Writer<File>, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;
    Ok(Writer::from_writer(file))
}

fn shelf_life_columns(shelf_life: ShelfLife) -> (String, &'static str) {
    match shelf_life {
        ShelfLife::Months(t) => (format!("{t:.4}"), "months"),
        ShelfLife::Infinite => (String::new(), "infinite"),
        ShelfLife::Exceeded => ("0".to_string(), "exceeded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::demo_dataset;
    use crate::domain::{ConfidenceLevel, DemoDataset, EstimationParameters};
    use crate::fit::estimate_lots;
    use crate::io::ingest::load_lot_set_csv;

    #[test]
    fn lot_set_csv_round_trips() {
        let sample = demo_dataset(DemoDataset::Interactive).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lots.csv");

        write_lot_set_csv(&path, &sample.lots).unwrap();
        let back = load_lot_set_csv(&path).unwrap();
        assert_eq!(back, sample.lots);
    }

    #[test]
    fn estimate_csv_has_row_per_series_and_time() {
        let sample = demo_dataset(DemoDataset::LongTerm).unwrap();
        let params = EstimationParameters {
            limit: sample.limit,
            confidence_level: ConfidenceLevel::P95,
        };
        let estimates = estimate_lots(&sample.lots, &params).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estimates.csv");
        write_estimates_csv(&path, &sample.lots, &estimates).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ESTIMATE_HEADER.join(","));
        // 3 lots + average, 5 time points each
        assert_eq!(lines.len(), 1 + 4 * 5);
        assert!(lines[1].starts_with("Lot 1,false,0,98.0000,97.8000,"));
        assert!(lines.last().unwrap().starts_with("Average,true,12,"));
    }
}
