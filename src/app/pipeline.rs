//! Estimation pipeline shared by the CLI and the TUI.
//!
//! load lots -> estimate every lot and the average -> package for presentation.

use tracing::info;

use crate::data::{demo_dataset, simulate_lots};
use crate::domain::{EstimateConfig, EstimationParameters, InputSource, LotEstimates, LotSet};
use crate::error::AppError;
use crate::fit::estimate_lots;
use crate::io::ingest::{build_lot_set, load_lot_set_csv};

/// Lots produced by an input source, with the limits it suggests.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub lots: LotSet,
    /// Limit that ships with a built-in dataset (used when none is given).
    pub suggested_limit: Option<f64>,
    pub suggested_upper_limit: Option<f64>,
}

/// All computed outputs of a single estimation run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub lots: LotSet,
    pub params: EstimationParameters,
    pub estimates: LotEstimates,
    pub upper_limit: Option<f64>,
}

/// Turn an input source into a validated `LotSet`.
pub fn load_input(source: &InputSource) -> Result<LoadedInput, AppError> {
    let loaded = match source {
        InputSource::Inline { times, lots } => LoadedInput {
            lots: build_lot_set(times, lots)?,
            suggested_limit: None,
            suggested_upper_limit: None,
        },
        InputSource::Csv(path) => LoadedInput {
            lots: load_lot_set_csv(path)?,
            suggested_limit: None,
            suggested_upper_limit: None,
        },
        InputSource::Demo(dataset) => {
            let sample = demo_dataset(*dataset)?;
            LoadedInput {
                lots: sample.lots,
                suggested_limit: Some(sample.limit),
                suggested_upper_limit: sample.upper_limit,
            }
        }
        InputSource::Simulated(config) => LoadedInput {
            lots: simulate_lots(config)?,
            suggested_limit: None,
            suggested_upper_limit: None,
        },
    };

    info!(
        lots = loaded.lots.lots().len(),
        points = loaded.lots.times().len(),
        "loaded input"
    );
    Ok(loaded)
}

/// Execute the full pipeline for a CLI run.
pub fn run_estimate(config: &EstimateConfig) -> Result<RunOutput, AppError> {
    let loaded = load_input(&config.source)?;
    let upper_limit = config.render.upper_limit.or(loaded.suggested_upper_limit);
    run_with_lots(loaded.lots, config.params, upper_limit)
}

/// Estimate an already loaded lot set.
///
/// The TUI calls this directly with lots built from its text fields.
pub fn run_with_lots(
    lots: LotSet,
    params: EstimationParameters,
    upper_limit: Option<f64>,
) -> Result<RunOutput, AppError> {
    if lots.is_empty() {
        return Err(AppError::new(2, "No lots to estimate."));
    }
    let estimates = estimate_lots(&lots, &params)?;
    Ok(RunOutput {
        lots,
        params,
        estimates,
        upper_limit,
    })
}
