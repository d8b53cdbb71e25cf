//! Demo datasets and seeded synthetic stability lots.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DemoDataset, LotSet, SimulationConfig};
use crate::error::{AppError, EstimateError};
use crate::io::ingest::lot_set_from_columns;

/// A dataset together with the limits it is usually evaluated against.
#[derive(Debug, Clone)]
pub struct SampleData {
    pub lots: LotSet,
    pub limit: f64,
    pub upper_limit: Option<f64>,
}

/// Load one of the built-in datasets.
pub fn demo_dataset(dataset: DemoDataset) -> Result<SampleData, EstimateError> {
    match dataset {
        DemoDataset::Interactive => Ok(SampleData {
            lots: lot_set_from_columns(
                vec![0.0, 3.0, 6.0, 9.0, 12.0, 18.0, 24.0, 36.0],
                vec![
                    ("Lot 1".to_string(), vec![100.0, 98.1, 96.2, 95.8, 94.7, 92.3, 90.1, 88.4]),
                    ("Lot 2".to_string(), vec![100.0, 98.3, 96.6, 95.5, 94.2, 92.0, 90.5, 88.0]),
                    ("Lot 3".to_string(), vec![100.0, 98.0, 96.3, 95.6, 94.5, 92.1, 90.4, 88.2]),
                ],
            )?,
            limit: 90.0,
            upper_limit: None,
        }),
        DemoDataset::LongTerm => Ok(SampleData {
            lots: lot_set_from_columns(
                vec![0.0, 3.0, 6.0, 9.0, 12.0],
                vec![
                    ("Lot 1".to_string(), vec![98.0, 97.0, 96.0, 95.0, 95.0]),
                    ("Lot 2".to_string(), vec![99.0, 98.0, 97.0, 96.0, 95.0]),
                    ("Lot 3".to_string(), vec![97.0, 96.0, 95.0, 94.0, 94.0]),
                ],
            )?,
            limit: 95.0,
            upper_limit: Some(105.0),
        }),
    }
}

/// Generate lots that degrade linearly with normal noise.
///
/// Lot `k` starts at `initial + δ_k` with `δ_k ~ N(0, lot_sigma)` and each
/// measurement adds `ε ~ N(0, noise_sigma)`. The same seed always yields the
/// same lots.
pub fn simulate_lots(config: &SimulationConfig) -> Result<LotSet, AppError> {
    if config.lot_count == 0 {
        return Err(AppError::new(2, "Lot count must be > 0."));
    }
    if !(config.lot_sigma.is_finite() && config.lot_sigma >= 0.0)
        || !(config.noise_sigma.is_finite() && config.noise_sigma >= 0.0)
    {
        return Err(AppError::new(2, "Invalid noise settings."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let lot_noise = Normal::new(0.0, config.lot_sigma)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let meas_noise = Normal::new(0.0, config.noise_sigma)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let lots = (0..config.lot_count)
        .map(|k| {
            let offset = lot_noise.sample(&mut rng);
            let values = config
                .times
                .iter()
                .map(|&t| round2(config.initial + offset - config.rate * t + meas_noise.sample(&mut rng)))
                .collect();
            (format!("Lot {}", k + 1), values)
        })
        .collect();

    Ok(lot_set_from_columns(config.times.clone(), lots)?)
}

/// Assay results are reported to two decimals.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed,
            lot_count: 3,
            times: vec![0.0, 3.0, 6.0, 9.0, 12.0, 18.0, 24.0],
            initial: 100.0,
            rate: 0.3,
            lot_sigma: 0.5,
            noise_sigma: 0.2,
        }
    }

    #[test]
    fn demo_datasets_are_valid() {
        let interactive = demo_dataset(DemoDataset::Interactive).unwrap();
        assert_eq!(interactive.lots.lots().len(), 3);
        assert_eq!(interactive.lots.times().len(), 8);

        let long_term = demo_dataset(DemoDataset::LongTerm).unwrap();
        assert_eq!(long_term.upper_limit, Some(105.0));
        assert_eq!(long_term.lots.average(), &[98.0, 97.0, 96.0, 95.0, 94.66666666666667]);
    }

    #[test]
    fn simulation_is_reproducible() {
        let a = simulate_lots(&config(7)).unwrap();
        let b = simulate_lots(&config(7)).unwrap();
        let c = simulate_lots(&config(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn noiseless_simulation_is_exactly_linear() {
        let mut cfg = config(1);
        cfg.lot_sigma = 0.0;
        cfg.noise_sigma = 0.0;
        let set = simulate_lots(&cfg).unwrap();
        assert_eq!(set.lots()[0].values[0], 100.0);
        assert_eq!(set.lots()[2].values[6], 92.8);
    }

    #[test]
    fn rejects_zero_lots() {
        let mut cfg = config(1);
        cfg.lot_count = 0;
        assert_eq!(simulate_lots(&cfg).unwrap_err().exit_code(), 2);
    }
}
