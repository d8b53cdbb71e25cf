//! Command-line parsing for the shelf-life estimator.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! estimation code. Flags are folded into an `EstimateConfig` by `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ConfidenceLevel, DemoDataset, Locale};
use crate::io::ingest::{parse_limit, parse_upper_limit};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about = "Stability shelf-life estimator (linear regression with confidence bounds)")]
pub struct Cli {
    /// Log debug events (overridden by SHELF_LOG / RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate shelf life for every lot and the lot average.
    Estimate(EstimateArgs),
    /// Tabulate shelf life across a range of acceptance limits.
    Sweep(SweepArgs),
    /// Plot a previously exported estimate JSON.
    Plot(PlotArgs),
    /// Show a built-in or synthetic dataset, optionally saving it as CSV.
    Demo(DemoArgs),
    /// Launch the interactive TUI.
    Tui(TuiArgs),
}

/// Where the lots come from.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Time points in months, comma separated (e.g. "0,3,6,9,12").
    #[arg(long, value_name = "LIST", requires = "lot")]
    pub months: Option<String>,

    /// One lot as "label=v1,v2,..." (or just "v1,v2,..."). Repeatable.
    #[arg(long, value_name = "LOT", requires = "months")]
    pub lot: Vec<String>,

    /// Stability CSV: a time column followed by one column per lot.
    #[arg(long, value_name = "CSV", conflicts_with_all = ["months", "lot", "demo"])]
    pub csv: Option<PathBuf>,

    /// Use a built-in dataset.
    #[arg(long, value_enum, conflicts_with_all = ["months", "lot"])]
    pub demo: Option<DemoDataset>,
}

/// Estimation parameters.
#[derive(Debug, Args, Clone)]
pub struct ParamArgs {
    /// Lower acceptance limit in % of label claim (default: dataset limit, else 90).
    #[arg(long, env = "SHELF_LIMIT", value_parser = limit_arg)]
    pub limit: Option<f64>,

    /// Confidence level: 90 or 95.
    #[arg(long, env = "SHELF_CONFIDENCE", default_value = "95", value_parser = confidence_arg)]
    pub confidence: ConfidenceLevel,
}

/// Presentation options shared by commands that print.
#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Label language.
    #[arg(long, env = "SHELF_LOCALE", value_enum, default_value_t = Locale::En)]
    pub locale: Locale,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Hide the confidence band in plots.
    #[arg(long)]
    pub no_band: bool,
}

/// Options for `shelf estimate`.
#[derive(Debug, Args, Clone)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub params: ParamArgs,

    #[command(flatten)]
    pub render: RenderArgs,

    /// Upper specification line drawn on plots, e.g. 105 (display only).
    #[arg(long, value_parser = upper_limit_arg)]
    pub upper_limit: Option<f64>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Series to plot (default: the average; "all" overlays every series).
    #[arg(long)]
    pub series: Option<String>,

    /// Export per-series results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the run (parameters + estimates) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

/// Options for `shelf sweep`.
#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub params: ParamArgs,

    /// Label language.
    #[arg(long, env = "SHELF_LOCALE", value_enum, default_value_t = Locale::En)]
    pub locale: Locale,

    /// Series to sweep (default: the average).
    #[arg(long)]
    pub series: Option<String>,

    /// First limit of the sweep (%).
    #[arg(long, default_value_t = 80.0, value_parser = limit_arg)]
    pub from: f64,

    /// Last limit of the sweep (%).
    #[arg(long, default_value_t = 100.0, value_parser = limit_arg)]
    pub to: f64,

    /// Step between limits (%).
    #[arg(long, default_value_t = 1.0)]
    pub step: f64,
}

/// Options for plotting a saved estimate.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Estimate JSON produced by `shelf estimate --export-json`.
    #[arg(long, value_name = "JSON")]
    pub estimate: PathBuf,

    /// Series to plot (default: the average; "all" overlays every series).
    #[arg(long)]
    pub series: Option<String>,

    #[command(flatten)]
    pub render: RenderArgs,
}

/// Options for `shelf demo`.
#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Built-in dataset to show.
    #[arg(long, value_enum, default_value_t = DemoDataset::Interactive)]
    pub dataset: DemoDataset,

    /// Generate seeded synthetic lots instead of a built-in dataset.
    #[arg(long)]
    pub simulate: bool,

    /// Random seed for synthetic lots.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of synthetic lots.
    #[arg(long, default_value_t = 3)]
    pub lots: usize,

    /// Time points of synthetic lots (months).
    #[arg(long, default_value = "0,3,6,9,12,18,24,36")]
    pub months: String,

    /// Potency at release (%).
    #[arg(long, default_value_t = 100.0)]
    pub initial: f64,

    /// Mean potency loss per month (%).
    #[arg(long, default_value_t = 0.3)]
    pub rate: f64,

    /// Standard deviation of each lot's release offset.
    #[arg(long, default_value_t = 0.5)]
    pub lot_sigma: f64,

    /// Standard deviation of measurement noise.
    #[arg(long, default_value_t = 0.3)]
    pub noise: f64,

    /// Write the lots as a stability CSV.
    #[arg(long, value_name = "CSV")]
    pub save_csv: Option<PathBuf>,

    /// Label language.
    #[arg(long, env = "SHELF_LOCALE", value_enum, default_value_t = Locale::En)]
    pub locale: Locale,
}

/// Options for the TUI.
#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Append log events to this file (the TUI never logs to the terminal).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Initial label language.
    #[arg(long, env = "SHELF_LOCALE", value_enum, default_value_t = Locale::En)]
    pub locale: Locale,
}

fn limit_arg(s: &str) -> Result<f64, String> {
    parse_limit(s).map_err(|e| e.to_string())
}

fn upper_limit_arg(s: &str) -> Result<f64, String> {
    parse_upper_limit(s).map_err(|e| e.to_string())
}

fn confidence_arg(s: &str) -> Result<ConfidenceLevel, String> {
    s.parse::<ConfidenceLevel>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_inline_estimate() {
        let cli = Cli::try_parse_from([
            "shelf", "estimate", "--months", "0,3,6", "--lot", "A=100,99,98", "--lot", "B=100,98,97",
            "--limit", "95%", "--confidence", "90",
        ])
        .unwrap();
        let Command::Estimate(args) = cli.command else {
            panic!("expected estimate");
        };
        assert_eq!(args.input.lot.len(), 2);
        assert_eq!(args.params.limit, Some(95.0));
        assert_eq!(args.params.confidence, ConfidenceLevel::P90);
    }

    #[test]
    fn rejects_out_of_range_limit() {
        assert!(Cli::try_parse_from(["shelf", "estimate", "--demo", "interactive", "--limit", "101"]).is_err());
    }

    #[test]
    fn upper_limit_may_exceed_label_claim() {
        let cli = Cli::try_parse_from([
            "shelf", "estimate", "--demo", "long-term", "--upper-limit", "105",
        ])
        .unwrap();
        let Command::Estimate(args) = cli.command else {
            panic!("expected estimate");
        };
        assert_eq!(args.upper_limit, Some(105.0));

        assert!(Cli::try_parse_from(["shelf", "estimate", "--demo", "long-term", "--upper-limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["shelf", "estimate", "--demo", "long-term", "--upper-limit", "inf"]).is_err());
    }

    #[test]
    fn csv_conflicts_with_inline_fields() {
        assert!(Cli::try_parse_from([
            "shelf", "estimate", "--csv", "lots.csv", "--months", "0,3,6", "--lot", "1,2,3"
        ])
        .is_err());
    }
}
