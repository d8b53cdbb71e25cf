//! Read/write estimate JSON files.
//!
//! An estimate file is the portable record of a run:
//! - parameters (limit, confidence level) and the optional upper line
//! - the shared time axis
//! - per-series values, regression, band and shelf life
//!
//! The schema is defined by `domain::EstimateFile`; `shelf plot` redraws a saved
//! file without refitting.

use std::fs::File;
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::domain::{EstimateFile, EstimationParameters, LotEstimates, LotSet, SeriesRecord};
use crate::error::AppError;

/// Assemble an estimate file from a finished run.
///
/// `without_band` drops the confidence band from every series.
pub fn build_estimate_file(
    lots: &LotSet,
    estimates: &LotEstimates,
    params: &EstimationParameters,
    upper_limit: Option<f64>,
    without_band: bool,
) -> EstimateFile {
    let series = lots
        .series()
        .filter_map(|(label, is_average, values)| {
            let entry = estimates
                .iter()
                .find(|e| e.label == label && e.is_average == is_average)?;
            let mut estimate = entry.estimate.clone();
            if without_band {
                estimate.confidence_band = None;
            }
            Some(SeriesRecord {
                label: label.to_string(),
                is_average,
                values: values.to_vec(),
                estimate,
            })
        })
        .collect();

    EstimateFile {
        tool: env!("CARGO_PKG_NAME").to_string(),
        generated_at: Utc::now(),
        params: *params,
        upper_limit,
        times: lots.times().to_vec(),
        series,
    }
}

/// Write an estimate JSON file.
pub fn write_estimate_json(path: &Path, file: &EstimateFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create estimate JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write estimate JSON: {e}")))?;
    info!(path = %path.display(), series = file.series.len(), "wrote estimate file");
    Ok(())
}

/// Read an estimate JSON file.
pub fn read_estimate_json(path: &Path) -> Result<EstimateFile, AppError> {
    let input = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open estimate JSON '{}': {e}", path.display())))?;
    let file: EstimateFile =
        serde_json::from_reader(input).map_err(|e| AppError::new(2, format!("Invalid estimate JSON: {e}")))?;

    if let Some(bad) = file.series.iter().find(|s| s.values.len() != file.times.len()) {
        return Err(AppError::new(
            2,
            format!("Invalid estimate JSON: series '{}' does not match the time axis", bad.label),
        ));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::demo_dataset;
    use crate::domain::{ConfidenceLevel, DemoDataset, ShelfLife};
    use crate::fit::estimate_lots;

    fn run() -> (LotSet, LotEstimates, EstimationParameters) {
        let sample = demo_dataset(DemoDataset::LongTerm).unwrap();
        let params = EstimationParameters {
            limit: 95.0,
            confidence_level: ConfidenceLevel::P95,
        };
        let est = estimate_lots(&sample.lots, &params).unwrap();
        (sample.lots, est, params)
    }

    #[test]
    fn json_round_trips() {
        let (lots, est, params) = run();
        let file = build_estimate_file(&lots, &est, &params, Some(105.0), false);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estimate.json");
        write_estimate_json(&path, &file).unwrap();
        let back = read_estimate_json(&path).unwrap();

        assert_eq!(back.series.len(), 4);
        assert_eq!(back.params, params);
        assert_eq!(back.upper_limit, Some(105.0));
        assert!(back.find(None).unwrap().is_average);
        let lot1 = back.find(Some("Lot 1")).unwrap();
        assert!(lot1.estimate.confidence_band.is_some());
        assert!(matches!(lot1.estimate.shelf_life, ShelfLife::Months(_)));
    }

    #[test]
    fn band_can_be_stripped() {
        let (lots, est, params) = run();
        let file = build_estimate_file(&lots, &est, &params, None, true);
        let json = serde_json::to_string(&file).unwrap();
        assert!(!json.contains("confidence_band"));
        assert!(!json.contains("upper_limit"));

        let back: EstimateFile = serde_json::from_str(&json).unwrap();
        assert!(back.series.iter().all(|s| s.estimate.confidence_band.is_none()));
    }

    #[test]
    fn rejects_mismatched_series() {
        let (lots, est, params) = run();
        let mut file = build_estimate_file(&lots, &est, &params, None, false);
        file.series[0].values.pop();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        write_estimate_json(&path, &file).unwrap();
        let err = read_estimate_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
