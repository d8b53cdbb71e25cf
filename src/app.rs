//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - runs the estimation pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command, DemoArgs, EstimateArgs, InputArgs, PlotArgs, RenderArgs, SweepArgs, TuiArgs};
use crate::data::demo_dataset;
use crate::domain::{
    EstimateConfig, EstimationParameters, InputSource, LotSet, RenderConfig, SimulationConfig,
};
use crate::error::AppError;
use crate::logging::{self, LogTarget};
use crate::plot::{render_ascii_overview, render_ascii_plot, SeriesView};

pub mod pipeline;

/// Limit used when neither the user nor the dataset supplies one.
pub const DEFAULT_LIMIT: f64 = 90.0;

/// `--series all` overlays every series in one plot.
pub const ALL_SERIES: &str = "all";

/// Entry point for the `shelf` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    // We want bare `shelf` to behave like `shelf tui`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    let level = logging::default_level(cli.verbose);

    match cli.command {
        Command::Estimate(args) => {
            logging::init(level, LogTarget::Stderr)?;
            handle_estimate(args)
        }
        Command::Sweep(args) => {
            logging::init(level, LogTarget::Stderr)?;
            handle_sweep(args)
        }
        Command::Plot(args) => {
            logging::init(level, LogTarget::Stderr)?;
            handle_plot(args)
        }
        Command::Demo(args) => {
            logging::init(level, LogTarget::Stderr)?;
            handle_demo(args)
        }
        Command::Tui(args) => {
            let target = match &args.log_file {
                Some(path) => LogTarget::File(path),
                None => LogTarget::Discard,
            };
            logging::init(level, target)?;
            handle_tui(args)
        }
    }
}

fn handle_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let config = estimate_config_from_args(&args)?;
    let run = pipeline::run_estimate(&config)?;
    let render = RenderConfig {
        upper_limit: run.upper_limit,
        ..config.render.clone()
    };

    print!("{}", crate::report::format_run_summary(&run.lots, &run.params, &render));
    println!("{}", crate::report::format_estimates(&run.estimates, &render));
    if let Some(headline) = crate::report::format_headline(&run.estimates, &render) {
        println!("{headline}");
    }
    print!("{}", crate::report::format_notes(&run.estimates, &render));

    if config.plot {
        println!();
        println!("{}", plot_run(&run, config.plot_series.as_deref(), &render)?);
    }

    if let Some(path) = &config.export_csv {
        crate::io::export::write_estimates_csv(path, &run.lots, &run.estimates)?;
        info!(path = %path.display(), "wrote estimate csv");
    }
    if let Some(path) = &config.export_json {
        let file = crate::io::estimate_file::build_estimate_file(
            &run.lots,
            &run.estimates,
            &run.params,
            run.upper_limit,
            config.export_without_band,
        );
        crate::io::estimate_file::write_estimate_json(path, &file)?;
    }

    Ok(())
}

fn handle_sweep(args: SweepArgs) -> Result<(), AppError> {
    if !(args.step > 0.0) || args.to < args.from {
        return Err(AppError::new(2, "Sweep needs --step > 0 and --to >= --from."));
    }

    let source = input_source(&args.input)?;
    let loaded = pipeline::load_input(&source)?;
    let params = EstimationParameters {
        limit: args.params.limit.or(loaded.suggested_limit).unwrap_or(DEFAULT_LIMIT),
        confidence_level: args.params.confidence,
    };

    let (label, values) = select_series(&loaded.lots, args.series.as_deref())?;
    let limits = crate::fit::limit_grid(args.from, args.to, args.step);
    let sweep = crate::fit::shelf_life_sweep(loaded.lots.times(), &values, &params, &limits)?;

    let render = RenderConfig {
        locale: args.locale,
        ..RenderConfig::default()
    };
    print!("{}", crate::report::format_sweep(&label, &sweep, &render));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::estimate_file::read_estimate_json(&args.estimate)?;
    let render = RenderConfig {
        upper_limit: file.upper_limit,
        ..render_config_from_args(&args.render)
    };
    let views: Vec<SeriesView<'_>> = file
        .series
        .iter()
        .map(|record| SeriesView {
            label: &record.label,
            is_average: record.is_average,
            times: &file.times,
            values: &record.values,
            estimate: &record.estimate,
        })
        .collect();

    println!(
        "{}",
        render_views(&views, args.series.as_deref(), file.params.limit, &render)?
    );
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let source = if args.simulate {
        InputSource::Simulated(SimulationConfig {
            seed: args.seed,
            lot_count: args.lots,
            times: crate::io::ingest::parse_times(&args.months)?,
            initial: args.initial,
            rate: args.rate,
            lot_sigma: args.lot_sigma,
            noise_sigma: args.noise,
        })
    } else {
        InputSource::Demo(args.dataset)
    };

    let loaded = pipeline::load_input(&source)?;
    let params = EstimationParameters {
        limit: loaded.suggested_limit.unwrap_or(DEFAULT_LIMIT),
        confidence_level: crate::domain::ConfidenceLevel::P95,
    };
    let render = RenderConfig {
        locale: args.locale,
        upper_limit: loaded.suggested_upper_limit,
        ..RenderConfig::default()
    };
    print!("{}", crate::report::format_run_summary(&loaded.lots, &params, &render));

    if let Some(path) = &args.save_csv {
        crate::io::export::write_lot_set_csv(path, &loaded.lots)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    crate::tui::run(args.locale)
}

/// Fold `shelf estimate` flags into a pipeline configuration.
pub fn estimate_config_from_args(args: &EstimateArgs) -> Result<EstimateConfig, AppError> {
    let source = input_source(&args.input)?;
    let dataset_limit = match &source {
        InputSource::Demo(dataset) => Some(demo_dataset(*dataset)?.limit),
        _ => None,
    };

    Ok(EstimateConfig {
        source,
        params: EstimationParameters {
            limit: args.params.limit.or(dataset_limit).unwrap_or(DEFAULT_LIMIT),
            confidence_level: args.params.confidence,
        },
        render: RenderConfig {
            upper_limit: args.upper_limit,
            ..render_config_from_args(&args.render)
        },
        plot: !args.no_plot,
        plot_series: args.series.clone(),
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
        export_without_band: args.render.no_band,
    })
}

fn render_config_from_args(args: &RenderArgs) -> RenderConfig {
    RenderConfig {
        locale: args.locale,
        width: args.width,
        height: args.height,
        show_band: !args.no_band,
        upper_limit: None,
    }
}

fn input_source(args: &InputArgs) -> Result<InputSource, AppError> {
    if let Some(path) = &args.csv {
        return Ok(InputSource::Csv(path.clone()));
    }
    if let Some(dataset) = args.demo {
        return Ok(InputSource::Demo(dataset));
    }
    match &args.months {
        Some(months) => Ok(InputSource::Inline {
            times: months.clone(),
            lots: split_lot_args(&args.lot),
        }),
        None => Err(AppError::new(
            2,
            "No input: pass --months with --lot, --csv, or --demo.",
        )),
    }
}

/// `"label=values"` or bare `"values"` (labelled `Lot k`).
fn split_lot_args(raw: &[String]) -> Vec<(String, String)> {
    raw.iter()
        .enumerate()
        .map(|(i, arg)| match arg.split_once('=') {
            Some((label, values)) if !label.trim().is_empty() => (label.trim().to_string(), values.to_string()),
            Some((_, values)) => (format!("Lot {}", i + 1), values.to_string()),
            None => (format!("Lot {}", i + 1), arg.clone()),
        })
        .collect()
}

fn select_series(lots: &LotSet, series: Option<&str>) -> Result<(String, Vec<f64>), AppError> {
    lots.series()
        .find(|(label, is_average, _)| match series {
            Some(wanted) => *label == wanted,
            None => *is_average,
        })
        .map(|(label, _, values)| (label.to_string(), values.to_vec()))
        .ok_or_else(|| unknown_series(series))
}

fn unknown_series(series: Option<&str>) -> AppError {
    AppError::new(2, format!("Unknown series '{}'.", series.unwrap_or(crate::domain::AVERAGE_LABEL)))
}

fn plot_run(run: &pipeline::RunOutput, series: Option<&str>, render: &RenderConfig) -> Result<String, AppError> {
    let views: Vec<SeriesView<'_>> = run
        .lots
        .series()
        .filter_map(|(label, is_average, values)| {
            let entry = run
                .estimates
                .iter()
                .find(|e| e.label == label && e.is_average == is_average)?;
            Some(SeriesView {
                label,
                is_average,
                times: run.lots.times(),
                values,
                estimate: &entry.estimate,
            })
        })
        .collect();
    render_views(&views, series, run.params.limit, render)
}

/// One series by label (the average when `None`), or the overview for `all`.
fn render_views(
    views: &[SeriesView<'_>],
    series: Option<&str>,
    limit: f64,
    render: &RenderConfig,
) -> Result<String, AppError> {
    if series == Some(ALL_SERIES) {
        return Ok(render_ascii_overview(views, limit, render));
    }
    let view = views
        .iter()
        .find(|v| match series {
            Some(wanted) => v.label == wanted,
            None => v.is_average,
        })
        .ok_or_else(|| unknown_series(series))?;
    Ok(render_ascii_plot(view, limit, render))
}

/// Rewrite argv so `shelf` defaults to `shelf tui`.
///
/// Rules:
/// - `shelf`                      -> `shelf tui`
/// - `shelf --log-file x ...`     -> `shelf tui --log-file x ...`
/// - `shelf --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "estimate" | "sweep" | "plot" | "demo" | "tui");
    if is_subcommand {
        return argv;
    }

    // A leading global flag may precede the subcommand.
    let has_subcommand = argv
        .iter()
        .skip(1)
        .any(|a| matches!(a.as_str(), "estimate" | "sweep" | "plot" | "demo" | "tui"));
    if arg1.starts_with('-') && !has_subcommand {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfidenceLevel, DemoDataset, Locale};

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn estimate_args(args: &[&str]) -> EstimateArgs {
        let mut full = vec!["shelf", "estimate"];
        full.extend_from_slice(args);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Estimate(args) => args,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["shelf"])), argv(&["shelf", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["shelf", "--log-file", "x.log"])),
            argv(&["shelf", "tui", "--log-file", "x.log"])
        );
        assert_eq!(rewrite_args(argv(&["shelf", "--help"])), argv(&["shelf", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["shelf", "-v", "estimate"])),
            argv(&["shelf", "-v", "estimate"])
        );
    }

    #[test]
    fn lot_args_get_default_labels() {
        let lots = split_lot_args(&argv(&["A=1,2,3", "4,5,6", "=7,8,9"]));
        assert_eq!(lots[0], ("A".to_string(), "1,2,3".to_string()));
        assert_eq!(lots[1], ("Lot 2".to_string(), "4,5,6".to_string()));
        assert_eq!(lots[2], ("Lot 3".to_string(), "7,8,9".to_string()));
    }

    #[test]
    fn demo_limit_is_used_when_none_given() {
        let args = estimate_args(&["--demo", "long-term", "--confidence", "90", "--locale", "ko"]);
        let config = estimate_config_from_args(&args).unwrap();
        assert_eq!(config.source, InputSource::Demo(DemoDataset::LongTerm));
        assert_eq!(config.params.limit, 95.0);
        assert_eq!(config.params.confidence_level, ConfidenceLevel::P90);
        assert_eq!(config.render.locale, Locale::Ko);
    }

    #[test]
    fn explicit_limit_wins_and_flags_fold() {
        let args = estimate_args(&[
            "--months", "0,3,6", "--lot", "100,99,98", "--limit", "92.5", "--no-plot", "--no-band",
        ]);
        let config = estimate_config_from_args(&args).unwrap();
        assert_eq!(config.params.limit, 92.5);
        assert!(!config.plot);
        assert!(!config.render.show_band);
        assert!(config.export_without_band);
    }

    #[test]
    fn missing_input_is_an_input_error() {
        let args = estimate_args(&[]);
        assert_eq!(estimate_config_from_args(&args).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn plot_selects_one_series_or_all() {
        let sample = demo_dataset(DemoDataset::LongTerm).unwrap();
        let params = EstimationParameters {
            limit: sample.limit,
            confidence_level: ConfidenceLevel::P95,
        };
        let run = pipeline::run_with_lots(sample.lots, params, sample.upper_limit).unwrap();
        let render = RenderConfig::default();

        let average = plot_run(&run, None, &render).unwrap();
        assert!(average.starts_with("Plot: Average |"));
        let lot = plot_run(&run, Some("Lot 2"), &render).unwrap();
        assert!(lot.starts_with("Plot: Lot 2 |"));
        let all = plot_run(&run, Some(ALL_SERIES), &render).unwrap();
        assert!(all.starts_with("Plot: All series |"));
        assert!(all.contains("\n# Average: "));

        assert_eq!(plot_run(&run, Some("Lot 9"), &render).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn unknown_series_is_reported() {
        let sample = demo_dataset(DemoDataset::Interactive).unwrap();
        assert!(select_series(&sample.lots, Some("Lot 9")).is_err());
        let (label, values) = select_series(&sample.lots, None).unwrap();
        assert_eq!(label, crate::domain::AVERAGE_LABEL);
        assert_eq!(values, sample.lots.average());
    }
}
