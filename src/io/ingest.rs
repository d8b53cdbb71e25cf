//! Input parsing and validation.
//!
//! This module is responsible for turning user-supplied text (comma-delimited
//! fields or a stability CSV) into a validated `LotSet` that is safe to fit.
//!
//! Design goals:
//! - **Strict**: any malformed field fails the whole request, naming the field
//! - **Deterministic behavior** (no hidden defaults or randomness)
//! - **Separation of concerns**: no fitting logic here

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::domain::LotSet;
use crate::error::{AppError, EstimateError};
use crate::fit::MIN_POINTS;

/// Accepted names for the time column of a stability CSV.
const TIME_HEADERS: [&str; 4] = ["month", "months", "time", "time_months"];

/// Parse a comma-separated list of numbers.
pub fn parse_sequence(field: &str, text: &str) -> Result<Vec<f64>, EstimateError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EstimateError::input_format(field, "no values supplied"));
    }

    trimmed
        .split(',')
        .enumerate()
        .map(|(idx, item)| {
            let item = item.trim();
            if item.is_empty() {
                return Err(EstimateError::input_format(
                    field,
                    format!("item {} is empty", idx + 1),
                ));
            }
            match item.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(EstimateError::input_format(
                    field,
                    format!("item {} ('{item}') is not a number", idx + 1),
                )),
            }
        })
        .collect()
}

/// Parse time points: non-negative and strictly increasing.
pub fn parse_times(text: &str) -> Result<Vec<f64>, EstimateError> {
    let times = parse_sequence("months", text)?;
    validate_times(&times)?;
    Ok(times)
}

/// Check that time points are non-negative and strictly increasing.
pub fn validate_times(times: &[f64]) -> Result<(), EstimateError> {
    if let Some(t) = times.iter().find(|t| **t < 0.0) {
        return Err(EstimateError::input_format(
            "months",
            format!("time points must be non-negative (found {t})"),
        ));
    }
    if let Some(pair) = times.windows(2).find(|w| w[1] <= w[0]) {
        return Err(EstimateError::input_format(
            "months",
            format!("time points must be strictly increasing ({} then {})", pair[0], pair[1]),
        ));
    }
    Ok(())
}

/// Parse the acceptance limit.
pub fn parse_limit(text: &str) -> Result<f64, EstimateError> {
    let limit = text
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .map_err(|_| EstimateError::input_format("limit", format!("'{}' is not a number", text.trim())))?;
    validate_limit(limit)
}

/// Limits are percentages of label claim.
pub fn validate_limit(limit: f64) -> Result<f64, EstimateError> {
    if !limit.is_finite() || !(0.0..=100.0).contains(&limit) {
        return Err(EstimateError::input_format(
            "limit",
            format!("{limit} is outside [0, 100]"),
        ));
    }
    Ok(limit)
}

/// Parse the optional upper specification line.
///
/// Unlike the acceptance limit it may exceed 100 % of label claim.
pub fn parse_upper_limit(text: &str) -> Result<f64, EstimateError> {
    let upper = text
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .map_err(|_| EstimateError::input_format("upper_limit", format!("'{}' is not a number", text.trim())))?;
    if !upper.is_finite() || upper <= 0.0 {
        return Err(EstimateError::input_format(
            "upper_limit",
            format!("{upper} must be a positive percentage"),
        ));
    }
    Ok(upper)
}

/// Build a `LotSet` from text fields.
///
/// `lots` holds `(label, comma-separated values)` in display order.
pub fn build_lot_set(times_text: &str, lots: &[(String, String)]) -> Result<LotSet, EstimateError> {
    let times = parse_times(times_text)?;
    if lots.is_empty() {
        return Err(EstimateError::input_format("lots", "at least one lot is required"));
    }

    let mut parsed = Vec::with_capacity(lots.len());
    for (label, text) in lots {
        parsed.push((label.clone(), parse_sequence(label, text)?));
    }
    lot_set_from_columns(times, parsed)
}

/// Validate parsed columns and assemble them.
pub fn lot_set_from_columns(times: Vec<f64>, lots: Vec<(String, Vec<f64>)>) -> Result<LotSet, EstimateError> {
    validate_times(&times)?;
    if times.len() < MIN_POINTS {
        return Err(EstimateError::InsufficientData { n: times.len() });
    }

    let mut set = LotSet::new(times);
    for (label, values) in lots {
        set.push_lot(label, values)?;
    }
    Ok(set)
}

/// Load a stability CSV: a time column followed by one column per lot.
pub fn load_lot_set_csv(path: &Path) -> Result<LotSet, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    let set = read_lot_set_csv(file)?;
    debug!(path = %path.display(), lots = set.lots().len(), points = set.times().len(), "loaded stability csv");
    Ok(set)
}

/// Parse a stability CSV from any reader.
pub fn read_lot_set_csv<R: Read>(reader: R) -> Result<LotSet, EstimateError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| EstimateError::input_format("csv", format!("failed to read headers: {e}")))?
        .clone();
    let labels = lot_labels(&headers)?;

    let mut times = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, lines are 1-based.
        let line = idx + 2;
        let record = result
            .map_err(|e| EstimateError::input_format("csv", format!("line {line}: {e}")))?;

        times.push(parse_cell(&record, 0, "months", line)?);
        for (col, label) in labels.iter().enumerate() {
            columns[col].push(parse_cell(&record, col + 1, label, line)?);
        }
    }

    lot_set_from_columns(times, labels.into_iter().zip(columns).collect())
}

fn lot_labels(headers: &StringRecord) -> Result<Vec<String>, EstimateError> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    let Some(first) = names.first() else {
        return Err(EstimateError::input_format("csv", "missing header row"));
    };
    if !TIME_HEADERS.contains(&first.to_ascii_lowercase().as_str()) {
        return Err(EstimateError::input_format(
            "csv",
            format!("first column must be the time column (one of {}), found '{first}'", TIME_HEADERS.join(", ")),
        ));
    }
    if names.len() < 2 {
        return Err(EstimateError::input_format("csv", "no lot columns after the time column"));
    }
    Ok(names[1..].to_vec())
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn parse_cell(record: &StringRecord, col: usize, field: &str, line: usize) -> Result<f64, EstimateError> {
    let raw = record
        .get(col)
        .ok_or_else(|| EstimateError::input_format(field, format!("line {line}: missing value")))?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(EstimateError::input_format(
            field,
            format!("line {line}: '{raw}' is not a number"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: EstimateError) -> String {
        match err {
            EstimateError::InputFormat { field, .. } => field,
            other => panic!("expected input format error, got {other:?}"),
        }
    }

    #[test]
    fn parses_sequences_with_whitespace() {
        assert_eq!(parse_sequence("lot", " 100.0, 98.1 ,96.2").unwrap(), vec![100.0, 98.1, 96.2]);
    }

    #[test]
    fn rejects_bad_tokens_naming_the_field() {
        assert_eq!(field_of(parse_sequence("Lot 2", "100,abc,98").unwrap_err()), "Lot 2");
        assert_eq!(field_of(parse_sequence("Lot 2", "100,,98").unwrap_err()), "Lot 2");
        assert_eq!(field_of(parse_sequence("Lot 2", "   ").unwrap_err()), "Lot 2");
        assert_eq!(field_of(parse_sequence("Lot 2", "100,NaN,98").unwrap_err()), "Lot 2");
    }

    #[test]
    fn times_must_increase_and_be_non_negative() {
        assert_eq!(field_of(parse_times("0,3,3,6").unwrap_err()), "months");
        assert_eq!(field_of(parse_times("-1,3,6").unwrap_err()), "months");
        assert_eq!(parse_times("0,3,6").unwrap(), vec![0.0, 3.0, 6.0]);
    }

    #[test]
    fn limit_must_be_a_percentage() {
        assert_eq!(parse_limit("90").unwrap(), 90.0);
        assert_eq!(parse_limit("95.5%").unwrap(), 95.5);
        assert_eq!(field_of(parse_limit("120").unwrap_err()), "limit");
        assert_eq!(field_of(parse_limit("-1").unwrap_err()), "limit");
        assert_eq!(field_of(parse_limit("ninety").unwrap_err()), "limit");
    }

    #[test]
    fn upper_limit_accepts_values_above_label_claim() {
        assert_eq!(parse_upper_limit("105").unwrap(), 105.0);
        assert_eq!(parse_upper_limit("110.5%").unwrap(), 110.5);
        assert_eq!(field_of(parse_upper_limit("0").unwrap_err()), "upper_limit");
        assert_eq!(field_of(parse_upper_limit("NaN").unwrap_err()), "upper_limit");
    }

    #[test]
    fn builds_lot_set_from_fields() {
        let lots = vec![
            ("Lot 1".to_string(), "100,98,96".to_string()),
            ("Lot 2".to_string(), "99,97,95".to_string()),
        ];
        let set = build_lot_set("0,6,12", &lots).unwrap();
        assert_eq!(set.times(), &[0.0, 6.0, 12.0]);
        assert_eq!(set.average(), &[99.5, 97.5, 95.5]);
    }

    #[test]
    fn mismatched_lot_length_names_the_lot() {
        let lots = vec![("Lot 3".to_string(), "100,98".to_string())];
        assert_eq!(field_of(build_lot_set("0,6,12", &lots).unwrap_err()), "Lot 3");
    }

    #[test]
    fn two_time_points_are_insufficient() {
        let lots = vec![("Lot 1".to_string(), "100,98".to_string())];
        assert_eq!(
            build_lot_set("0,6", &lots).unwrap_err(),
            EstimateError::InsufficientData { n: 2 }
        );
    }

    #[test]
    fn reads_csv_with_bom_and_spaces() {
        let data = "\u{feff}month, Lot A, Lot B\n0, 100.0, 99.0\n3, 98.0, 97.5\n6, 96.5, 96.0\n";
        let set = read_lot_set_csv(data.as_bytes()).unwrap();
        assert_eq!(set.times(), &[0.0, 3.0, 6.0]);
        let labels: Vec<&str> = set.lots().iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Lot A", "Lot B"]);
    }

    #[test]
    fn csv_bad_cell_names_column_and_line() {
        let data = "month,Lot A\n0,100\n3,x\n6,97\n";
        match read_lot_set_csv(data.as_bytes()).unwrap_err() {
            EstimateError::InputFormat { field, message } => {
                assert_eq!(field, "Lot A");
                assert!(message.contains("line 3"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn csv_requires_time_column_first() {
        let data = "lot,month\n1,0\n";
        assert_eq!(field_of(read_lot_set_csv(data.as_bytes()).unwrap_err()), "csv");
    }
}
