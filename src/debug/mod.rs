//! Debug bundle writer for inspecting inputs and bound diagnostics.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::error::AppError;

/// Write a markdown dump of a run into `dir` and return its path.
pub fn write_debug_bundle(run: &RunOutput, dir: &Path) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(2, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("shelf_debug_{ts}.md"));
    let file = File::create(&path).map_err(|e| AppError::new(2, format!("Failed to create debug file: {e}")))?;
    let mut out = BufWriter::new(file);

    write_bundle(&mut out, run).map_err(|e| AppError::new(2, format!("Failed to write debug: {e}")))?;
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write debug: {e}")))?;
    Ok(path)
}

fn write_bundle<W: Write>(out: &mut W, run: &RunOutput) -> std::io::Result<()> {
    writeln!(out, "# shelf debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- limit: {:.2}%", run.params.limit)?;
    writeln!(out, "- confidence: {}", run.params.confidence_level)?;
    if let Some(upper) = run.upper_limit {
        writeln!(out, "- upper_limit: {upper:.2}%")?;
    }

    writeln!(out, "\n## Inputs")?;
    let header: Vec<&str> = run.lots.series().map(|(label, _, _)| label).collect();
    writeln!(out, "| month | {} |", header.join(" | "))?;
    writeln!(out, "|{}", " - |".repeat(header.len() + 1))?;
    for (i, t) in run.lots.times().iter().enumerate() {
        let row: Vec<String> = run
            .lots
            .series()
            .map(|(_, _, values)| format!("{:.3}", values[i]))
            .collect();
        writeln!(out, "| {t} | {} |", row.join(" | "))?;
    }

    writeln!(out, "\n## Fits")?;
    writeln!(out, "| series | slope | intercept | stderr | r | n | df | t_crit | se | mean_t | sxx | hw(0) | shelf_life |")?;
    writeln!(out, "| - | - | - | - | - | - | - | - | - | - | - | - | - |")?;
    for entry in run.estimates.iter() {
        let reg = &entry.estimate.regression;
        let diag = &entry.estimate.diagnostics;
        writeln!(
            out,
            "| {} | {:.6} | {:.6} | {:.6} | {:.6} | {} | {} | {:.6} | {:.6} | {:.4} | {:.4} | {:.6} | {:?} |",
            entry.label,
            reg.slope,
            reg.intercept,
            reg.stderr,
            reg.r_value,
            diag.n,
            diag.degrees_of_freedom,
            diag.t_critical,
            diag.residual_se,
            diag.mean_time,
            diag.sxx,
            diag.release_half_width,
            entry.estimate.shelf_life,
        )?;
    }

    for entry in run.estimates.iter() {
        writeln!(out, "\n### {}", entry.label)?;
        writeln!(out, "{}", entry.estimate.note)?;
        writeln!(out, "| month | predicted | lower | upper |")?;
        writeln!(out, "| - | - | - | - |")?;
        for (i, t) in run.lots.times().iter().enumerate() {
            let (lower, upper) = match &entry.estimate.confidence_band {
                Some(band) => (fmt_opt(band.lower.get(i).copied()), fmt_opt(band.upper.get(i).copied())),
                None => ("-".to_string(), "-".to_string()),
            };
            writeln!(
                out,
                "| {t} | {} | {lower} | {upper} |",
                fmt_opt(entry.estimate.predicted.get(i).copied())
            )?;
        }
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.3}"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_with_lots;
    use crate::data::demo_dataset;
    use crate::domain::{ConfidenceLevel, DemoDataset, EstimationParameters};

    #[test]
    fn bundle_lists_every_series() {
        let sample = demo_dataset(DemoDataset::LongTerm).unwrap();
        let run = run_with_lots(
            sample.lots,
            EstimationParameters {
                limit: sample.limit,
                confidence_level: ConfidenceLevel::P95,
            },
            sample.upper_limit,
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_debug_bundle(&run, dir.path()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();

        assert!(text.starts_with("# shelf debug bundle"));
        assert!(text.contains("- upper_limit: 105.00%"));
        assert!(text.contains("| month | Lot 1 | Lot 2 | Lot 3 | Average |"));
        assert!(text.contains("\n### Average\n"));
        assert!(text.contains("| 0 | 98.000 | 99.000 | 97.000 | 98.000 |"));
    }
}
