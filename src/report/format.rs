//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the estimation code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{EstimationParameters, LotEstimates, LotSet, RenderConfig};
use crate::fit::SweepPoint;
use crate::report::Labels;

/// Format the run header (inputs and parameters).
pub fn format_run_summary(lots: &LotSet, params: &EstimationParameters, render: &RenderConfig) -> String {
    let labels = Labels::for_locale(render.locale);
    let mut out = String::new();

    out.push_str(&format!("=== shelf - {} ===\n", labels.title));
    out.push_str(&format!(
        "{}: {}\n",
        labels.time_axis,
        fmt_list(lots.times(), 1)
    ));
    for lot in lots.lots() {
        out.push_str(&format!("{}: {}\n", lot.label, fmt_list(&lot.values, 2)));
    }
    out.push_str(&format!("{}: {}\n", labels.average, fmt_list(lots.average(), 2)));
    out.push_str(&format!(
        "{}: {:.1}% | {}: {}",
        labels.limit, params.limit, labels.band, params.confidence_level
    ));
    if let Some(upper) = render.upper_limit {
        out.push_str(&format!(" | {}: {upper:.1}%", labels.upper_limit));
    }
    out.push_str("\n\n");

    out
}

/// Format the per-series estimate table.
pub fn format_estimates(estimates: &LotEstimates, render: &RenderConfig) -> String {
    let labels = Labels::for_locale(render.locale);
    let mut out = String::new();

    out.push_str(
        format!(
            "{:<12} {:>9} {:>10} {:>8} {:>9} {:>8} {:>7}  {}\n",
            "series", "slope", "intercept", "r", "stderr", "se", "t", labels.shelf_life
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<12} {:-<9} {:-<10} {:-<8} {:-<9} {:-<8} {:-<7}  {:-<20}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for entry in estimates.iter() {
        let est = &entry.estimate;
        out.push_str(
            format!(
                "{:<12} {:>9.4} {:>10.3} {:>8.4} {:>9.4} {:>8.4} {:>7.3}  {}\n",
                truncate(labels.series_label(entry), 12),
                est.regression.slope,
                est.regression.intercept,
                est.regression.r_value,
                est.regression.stderr,
                est.diagnostics.residual_se,
                est.diagnostics.t_critical,
                labels.shelf_life_text(est.shelf_life),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// One-line headline for the average (or the first series).
pub fn format_headline(estimates: &LotEstimates, render: &RenderConfig) -> Option<String> {
    let labels = Labels::for_locale(render.locale);
    let entry = estimates.average().or_else(|| estimates.iter().next())?;
    Some(format!(
        "{} ({}): {}",
        labels.shelf_life,
        labels.series_label(entry),
        labels.shelf_life_text(entry.estimate.shelf_life)
    ))
}

/// Notes for every series, one per line.
pub fn format_notes(estimates: &LotEstimates, render: &RenderConfig) -> String {
    let labels = Labels::for_locale(render.locale);
    estimates
        .iter()
        .map(|e| format!("- {}: {}\n", labels.series_label(e), e.estimate.note))
        .collect()
}

/// Format a limit sweep as a two-column table.
pub fn format_sweep(series: &str, sweep: &[SweepPoint], render: &RenderConfig) -> String {
    let labels = Labels::for_locale(render.locale);
    let mut out = String::new();
    out.push_str(&format!("{} - {series}\n", labels.shelf_life));
    out.push_str(&format!("{:>8}  {}\n", "limit", labels.shelf_life));
    out.push_str(&format!("{:->8}  {:-<20}\n", "", ""));
    for p in sweep {
        out.push_str(&format!(
            "{:>7.1}%  {}\n",
            p.limit,
            labels.shelf_life_text(p.shelf_life)
        ));
    }
    out
}

fn fmt_list(v: &[f64], decimals: usize) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.decimals$}")).collect();
    parts.join(", ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfidenceLevel, Locale, ShelfLife};
    use crate::fit::estimate_lots;

    fn sample() -> (LotSet, EstimationParameters) {
        let mut set = LotSet::new(vec![0.0, 3.0, 6.0, 9.0, 12.0]);
        set.push_lot("Lot 1", vec![98.0, 97.0, 96.0, 95.0, 95.0]).unwrap();
        set.push_lot("Lot 2", vec![99.0, 98.0, 97.0, 96.0, 95.0]).unwrap();
        let params = EstimationParameters {
            limit: 95.0,
            confidence_level: ConfidenceLevel::P95,
        };
        (set, params)
    }

    #[test]
    fn summary_lists_inputs() {
        let (set, params) = sample();
        let render = RenderConfig {
            upper_limit: Some(105.0),
            ..RenderConfig::default()
        };
        let txt = format_run_summary(&set, &params, &render);
        assert!(txt.contains("months: 0.0, 3.0, 6.0, 9.0, 12.0"));
        assert!(txt.contains("Lot 2: 99.00, 98.00, 97.00, 96.00, 95.00"));
        assert!(txt.contains("Average: 98.50, 97.50, 96.50, 95.50, 95.00"));
        assert!(txt.contains("lower limit: 95.0% | confidence band: 95% | upper limit: 105.0%"));
    }

    #[test]
    fn table_has_one_row_per_series() {
        let (set, params) = sample();
        let est = estimate_lots(&set, &params).unwrap();
        let txt = format_estimates(&est, &RenderConfig::default());
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 2 + 3);
        assert!(lines[2].starts_with("Lot 1"));
        assert!(lines[2].ends_with("13.9 months"));
        assert!(lines[4].starts_with("Average"));
        assert!(lines.iter().all(|l| l == &l.trim_end()));
    }

    #[test]
    fn headline_uses_average_and_locale() {
        let (set, params) = sample();
        let est = estimate_lots(&set, &params).unwrap();
        let render = RenderConfig {
            locale: Locale::Ko,
            ..RenderConfig::default()
        };
        let line = format_headline(&est, &render).unwrap();
        assert!(line.starts_with("예측 유효기한 (평균): "));
    }

    #[test]
    fn sweep_table_rows() {
        let sweep = [
            SweepPoint { limit: 90.0, shelf_life: ShelfLife::Months(30.26) },
            SweepPoint { limit: 100.0, shelf_life: ShelfLife::Exceeded },
        ];
        let txt = format_sweep("Average", &sweep, &RenderConfig::default());
        assert!(txt.contains("   90.0%  30.3 months\n"));
        assert!(txt.contains("  100.0%  0 months (limit exceeded)\n"));
    }

    #[test]
    fn truncate_marks_cut_labels() {
        assert_eq!(truncate("Lot 1", 12), "Lot 1");
        assert_eq!(truncate("A very long lot label", 8), "A very .");
    }
}
