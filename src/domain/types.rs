//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during estimation
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EstimateError;

/// Label used for the derived elementwise-mean series.
pub const AVERAGE_LABEL: &str = "Average";

/// Two-sided confidence level used for the critical t value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ConfidenceLevel {
    #[serde(rename = "90%")]
    #[value(name = "90")]
    P90,
    #[serde(rename = "95%")]
    #[value(name = "95")]
    P95,
}

impl ConfidenceLevel {
    /// Significance level α.
    pub fn alpha(self) -> f64 {
        match self {
            ConfidenceLevel::P90 => 0.10,
            ConfidenceLevel::P95 => 0.05,
        }
    }

    /// Probability passed to the t quantile function (`1 - α/2`).
    pub fn quantile_probability(self) -> f64 {
        1.0 - self.alpha() / 2.0
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::P90 => "90%",
            ConfidenceLevel::P95 => "95%",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ConfidenceLevel::P90 => ConfidenceLevel::P95,
            ConfidenceLevel::P95 => ConfidenceLevel::P90,
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConfidenceLevel {
    type Err = EstimateError;

    /// Accepts `90`, `90%`, `0.9`, `0.90` (and the 95 equivalents).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%').trim();
        match trimmed {
            "90" | "0.9" | "0.90" => Ok(ConfidenceLevel::P90),
            "95" | "0.95" => Ok(ConfidenceLevel::P95),
            _ => Err(EstimateError::input_format(
                "confidence",
                format!("'{}' is not a supported level (use 90% or 95%)", s.trim()),
            )),
        }
    }
}

/// Inputs that configure a single estimation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimationParameters {
    /// Lower acceptance limit (% of label claim).
    pub limit: f64,
    pub confidence_level: ConfidenceLevel,
}

/// One series of measurements against time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Self {
        Self { times, values }
    }
}

/// A labelled lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub label: String,
    pub values: Vec<f64>,
}

/// Lots sharing a common time axis, plus their elementwise average.
///
/// The average is derived state: it is rebuilt on every mutation so it can
/// never disagree with the lots it summarizes.
#[derive(Debug, Clone, PartialEq)]
pub struct LotSet {
    times: Vec<f64>,
    lots: Vec<Lot>,
    average: Vec<f64>,
}

impl LotSet {
    /// Create an empty set over `times`.
    pub fn new(times: Vec<f64>) -> Self {
        let average = vec![0.0; times.len()];
        Self {
            times,
            lots: Vec::new(),
            average,
        }
    }

    /// Append a lot (insertion order is display order).
    pub fn push_lot(&mut self, label: impl Into<String>, values: Vec<f64>) -> Result<(), EstimateError> {
        let label = label.into();
        self.check_len(&label, &values)?;
        if self.lots.iter().any(|l| l.label == label) {
            return Err(EstimateError::input_format(
                label,
                "duplicate lot label",
            ));
        }
        self.lots.push(Lot { label, values });
        self.recompute_average();
        Ok(())
    }

    /// Replace the values of an existing lot.
    pub fn set_values(&mut self, label: &str, values: Vec<f64>) -> Result<(), EstimateError> {
        self.check_len(label, &values)?;
        let lot = self
            .lots
            .iter_mut()
            .find(|l| l.label == label)
            .ok_or_else(|| EstimateError::input_format(label, "unknown lot label"))?;
        lot.values = values;
        self.recompute_average();
        Ok(())
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Elementwise mean of all lots (zeros while the set is empty).
    pub fn average(&self) -> &[f64] {
        &self.average
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Iterate `(label, is_average, values)` over lots then the average.
    pub fn series(&self) -> impl Iterator<Item = (&str, bool, &[f64])> {
        self.lots
            .iter()
            .map(|l| (l.label.as_str(), false, l.values.as_slice()))
            .chain(
                (!self.lots.is_empty())
                    .then_some((AVERAGE_LABEL, true, self.average.as_slice())),
            )
    }

    fn check_len(&self, label: &str, values: &[f64]) -> Result<(), EstimateError> {
        if values.len() != self.times.len() {
            return Err(EstimateError::input_format(
                label,
                format!(
                    "expected {} values (one per time point), got {}",
                    self.times.len(),
                    values.len()
                ),
            ));
        }
        Ok(())
    }

    fn recompute_average(&mut self) {
        let n_lots = self.lots.len() as f64;
        self.average = (0..self.times.len())
            .map(|i| {
                if self.lots.is_empty() {
                    0.0
                } else {
                    self.lots.iter().map(|l| l.values[i]).sum::<f64>() / n_lots
                }
            })
            .collect();
    }
}

/// Ordinary least squares fit of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    /// Standard error of the slope estimate.
    pub stderr: f64,
    /// Pearson correlation between time and value.
    pub r_value: f64,
}

impl RegressionResult {
    pub fn predict(&self, t: f64) -> f64 {
        self.intercept + self.slope * t
    }
}

/// Two-sided band around the regression line, evaluated at the input times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Estimated shelf life of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "months", rename_all = "lowercase")]
pub enum ShelfLife {
    /// Months until the release-adjusted line reaches the limit (unrounded).
    Months(f64),
    /// No downward trend.
    Infinite,
    /// The adjusted line is already at or below the limit at release.
    ///
    /// A crossing exactly at release (solved `t` within
    /// `fit::RELEASE_TOLERANCE_MONTHS` of zero, `-0.0` included) counts here
    /// rather than as `Months(0.0)`.
    Exceeded,
}

impl ShelfLife {
    /// Months as a number for comparisons: `Exceeded` is 0, `Infinite` is +∞.
    pub fn as_months(self) -> f64 {
        match self {
            ShelfLife::Months(t) => t,
            ShelfLife::Infinite => f64::INFINITY,
            ShelfLife::Exceeded => 0.0,
        }
    }
}

/// Intermediate quantities of the bound-and-solve step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundDiagnostics {
    pub n: usize,
    pub degrees_of_freedom: usize,
    pub t_critical: f64,
    /// Residual standard error of the fit.
    pub residual_se: f64,
    pub mean_time: f64,
    /// Σ(t - t̄)².
    pub sxx: f64,
    /// Band half-width at release (t = 0).
    pub release_half_width: f64,
}

/// Output of one estimation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfLifeEstimate {
    pub regression: RegressionResult,
    pub predicted: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_band: Option<ConfidenceBand>,
    pub shelf_life: ShelfLife,
    pub note: String,
    pub diagnostics: BoundDiagnostics,
}

/// Estimate for one labelled series of a `LotSet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotEstimate {
    pub label: String,
    pub is_average: bool,
    pub estimate: ShelfLifeEstimate,
}

/// Ordered label → estimate mapping (lots in insertion order, then the average).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LotEstimates {
    pub entries: Vec<LotEstimate>,
}

impl LotEstimates {
    pub fn get(&self, label: &str) -> Option<&ShelfLifeEstimate> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.estimate)
    }

    pub fn average(&self) -> Option<&LotEstimate> {
        self.entries.iter().find(|e| e.is_average)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LotEstimate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One series inside an estimate file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub label: String,
    pub is_average: bool,
    pub values: Vec<f64>,
    pub estimate: ShelfLifeEstimate,
}

/// Portable JSON representation of a run.
///
/// Holds everything needed to redraw the charts without refitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub params: EstimationParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_limit: Option<f64>,
    pub times: Vec<f64>,
    pub series: Vec<SeriesRecord>,
}

impl EstimateFile {
    /// Series by label, or the average when `label` is `None`.
    pub fn find(&self, label: Option<&str>) -> Option<&SeriesRecord> {
        match label {
            Some(label) => self.series.iter().find(|s| s.label == label),
            None => self.series.iter().find(|s| s.is_average),
        }
    }
}

/// Label language for reports and charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ko,
}

/// Presentation settings, passed explicitly to every renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub locale: Locale,
    pub width: usize,
    pub height: usize,
    pub show_band: bool,
    /// Optional upper specification line (display only).
    pub upper_limit: Option<f64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            width: 80,
            height: 20,
            show_band: true,
            upper_limit: None,
        }
    }
}

/// Built-in stability datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DemoDataset {
    /// 0–36 months, three lots starting at 100 %.
    Interactive,
    /// 0–12 months, three lots near the 95 % limit.
    LongTerm,
}

/// Settings for seeded synthetic lots.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub seed: u64,
    pub lot_count: usize,
    pub times: Vec<f64>,
    /// Potency at release (%).
    pub initial: f64,
    /// Mean degradation (% per month, positive = loss).
    pub rate: f64,
    /// Standard deviation of each lot's release offset.
    pub lot_sigma: f64,
    /// Standard deviation of measurement noise.
    pub noise_sigma: f64,
}

/// Where the lots come from.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// Comma-delimited text fields: times plus `(label, values)` per lot.
    Inline { times: String, lots: Vec<(String, String)> },
    Csv(PathBuf),
    Demo(DemoDataset),
    Simulated(SimulationConfig),
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment defaults).
#[derive(Debug, Clone)]
pub struct EstimateConfig {
    pub source: InputSource,
    pub params: EstimationParameters,
    pub render: RenderConfig,
    pub plot: bool,
    /// Series to chart (`None` = the average).
    pub plot_series: Option<String>,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
    /// Strip the band from the JSON export.
    pub export_without_band: bool,
}
