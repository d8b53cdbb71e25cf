//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - estimation inputs (`TimeSeries`, `LotSet`, `EstimationParameters`)
//! - estimator outputs (`RegressionResult`, `ShelfLifeEstimate`, `LotEstimates`)
//! - run configuration (`EstimateConfig`, `RenderConfig`, `InputSource`)

pub mod types;

pub use types::*;
