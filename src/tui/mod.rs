//! Ratatui-based terminal UI.
//!
//! The TUI mirrors an interactive stability worksheet: editable text fields for
//! the months, three lots, the limit and the confidence level, an estimate
//! action, a chart of the selected series (or of all series) and the
//! per-series results.
//! Estimation errors land in the status line; the app stays usable.

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Terminal,
};
use tracing::{info, warn};

use crate::app::pipeline::{run_with_lots, RunOutput};
use crate::data::demo_dataset;
use crate::domain::{ConfidenceLevel, DemoDataset, EstimationParameters, Locale, LotEstimate, ShelfLife};
use crate::error::AppError;
use crate::io::ingest::{build_lot_set, parse_limit};
use crate::report::Labels;

mod plotters_chart;

use plotters_chart::{ChartLine, ShelfLifeChart};

const FIELD_MONTHS: usize = 0;
const LOT_FIELDS: [usize; 3] = [1, 2, 3];
const FIELD_LIMIT: usize = 4;
const FIELD_CONFIDENCE: usize = 5;
const FIELD_COUNT: usize = 6;

const AVERAGE_COLOR: (u8, u8, u8) = (0, 255, 255);
const LOT_COLORS: [(u8, u8, u8); 6] = [
    (255, 170, 0),
    (255, 0, 255),
    (0, 200, 0),
    (255, 128, 128),
    (128, 128, 255),
    (200, 200, 200),
];
const POINT_COLOR: (u8, u8, u8) = (255, 255, 255);

/// Start the TUI.
pub fn run(locale: Locale) -> Result<(), AppError> {
    let mut app = App::new(locale)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    locale: Locale,
    /// Text of the months, lot and limit fields (indexed by `FIELD_*`).
    fields: [String; FIELD_CONFIDENCE],
    confidence: ConfidenceLevel,
    selected_field: usize,
    editing: bool,
    edit_buffer: String,
    /// Index into the estimate list (lots then the average).
    selected_series: usize,
    /// Chart every series at once instead of the selected one.
    overview: bool,
    status: String,
    run: Option<RunOutput>,
}

impl App {
    fn new(locale: Locale) -> Result<Self, AppError> {
        let mut app = Self {
            locale,
            fields: Default::default(),
            confidence: ConfidenceLevel::P95,
            selected_field: 0,
            editing: false,
            edit_buffer: String::new(),
            selected_series: 0,
            overview: false,
            status: String::new(),
            run: None,
        };
        app.load_demo()?;
        Ok(app)
    }

    /// Fill the fields from the built-in interactive dataset and estimate.
    fn load_demo(&mut self) -> Result<(), AppError> {
        let sample = demo_dataset(DemoDataset::Interactive)?;
        self.fields[FIELD_MONTHS] = join_numbers(sample.lots.times());
        for (slot, field) in LOT_FIELDS.iter().enumerate() {
            self.fields[*field] = sample
                .lots
                .lots()
                .get(slot)
                .map(|lot| join_numbers(&lot.values))
                .unwrap_or_default();
        }
        self.fields[FIELD_LIMIT] = format!("{}", sample.limit);
        self.estimate();
        Ok(())
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing {
            self.handle_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => self.selected_field = self.selected_field.saturating_sub(1),
            KeyCode::Down => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.step_series(-1),
            KeyCode::Right => self.step_series(1),
            KeyCode::Enter => {
                if self.selected_field == FIELD_CONFIDENCE {
                    self.toggle_confidence();
                } else {
                    self.editing = true;
                    self.edit_buffer = self.fields[self.selected_field].clone();
                    self.status = "Editing (Enter to apply, Esc to cancel).".to_string();
                }
            }
            KeyCode::Char('e') => self.estimate(),
            KeyCode::Char('c') => self.toggle_confidence(),
            KeyCode::Char('a') => self.overview = !self.overview,
            KeyCode::Char('l') => {
                self.locale = match self.locale {
                    Locale::En => Locale::Ko,
                    Locale::Ko => Locale::En,
                };
            }
            KeyCode::Char('r') => {
                if let Err(err) = self.load_demo() {
                    self.status = format!("Reset failed: {err}");
                }
            }
            KeyCode::Char('d') => self.write_debug(),
            _ => {}
        }

        false
    }

    fn handle_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing = false;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = false;
                self.fields[self.selected_field] = std::mem::take(&mut self.edit_buffer);
                self.status = "Field updated; press e to estimate.".to_string();
            }
            KeyCode::Backspace => {
                self.edit_buffer.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || matches!(c, '.' | ',' | ' ' | '%' | '-') {
                    self.edit_buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn toggle_confidence(&mut self) {
        self.confidence = self.confidence.toggle();
        self.estimate();
    }

    fn step_series(&mut self, delta: isize) {
        let Some(run) = &self.run else {
            return;
        };
        let n = run.estimates.len() as isize;
        if n == 0 {
            return;
        }
        self.selected_series = (self.selected_series as isize + delta).rem_euclid(n) as usize;
    }

    /// Parse the fields and run the pipeline. Failures go to the status line.
    fn estimate(&mut self) {
        match self.try_estimate() {
            Ok(run) => {
                let labels = Labels::for_locale(self.locale);
                self.status = run
                    .estimates
                    .average()
                    .map(|avg| format!("{}: {}", labels.shelf_life, labels.shelf_life_text(avg.estimate.shelf_life)))
                    .unwrap_or_default();
                if self.selected_series >= run.estimates.len() {
                    self.selected_series = run.estimates.len().saturating_sub(1);
                }
                info!(series = run.estimates.len(), "tui estimate");
                self.run = Some(run);
            }
            Err(err) => {
                warn!(error = %err, "tui estimate failed");
                self.status = format!("Error: {err}");
            }
        }
    }

    fn try_estimate(&self) -> Result<RunOutput, AppError> {
        let lots: Vec<(String, String)> = LOT_FIELDS
            .iter()
            .enumerate()
            .filter(|(_, field)| !self.fields[**field].trim().is_empty())
            .map(|(slot, field)| (format!("Lot {}", slot + 1), self.fields[*field].clone()))
            .collect();

        let lot_set = build_lot_set(&self.fields[FIELD_MONTHS], &lots)?;
        let params = EstimationParameters {
            limit: parse_limit(&self.fields[FIELD_LIMIT])?,
            confidence_level: self.confidence,
        };
        run_with_lots(lot_set, params, None)
    }

    fn write_debug(&mut self) {
        let Some(run) = &self.run else {
            self.status = "Nothing estimated yet.".to_string();
            return;
        };
        match crate::debug::write_debug_bundle(run, Path::new("debug")) {
            Ok(path) => self.status = format!("Wrote debug bundle: {}", path.display()),
            Err(err) => self.status = format!("Debug write failed: {err}"),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let labels = Labels::for_locale(self.locale);
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("shelf", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" - {}", labels.title)),
        ]));

        if let Some(run) = &self.run {
            let headline = crate::report::format_headline(
                &run.estimates,
                &crate::domain::RenderConfig {
                    locale: self.locale,
                    ..Default::default()
                },
            )
            .unwrap_or_default();
            lines.push(Line::from(Span::styled(
                format!(
                    "{}: {:.1}% | {}: {} | {headline}",
                    labels.limit, run.params.limit, labels.band, run.params.confidence_level
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(58), Constraint::Min(0)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(FIELD_COUNT as u16 + 2), Constraint::Min(0)])
            .split(columns[0]);

        self.draw_fields(frame, left[0]);
        self.draw_results(frame, left[1]);
        self.draw_chart(frame, columns[1]);
    }

    fn draw_fields(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let labels = Labels::for_locale(self.locale);
        let mut items: Vec<ListItem> = field_names(&labels)
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let text = if self.editing && i == self.selected_field {
                    format!("{}_", self.edit_buffer)
                } else {
                    self.fields[i].clone()
                };
                ListItem::new(format!("{name}: {text}"))
            })
            .collect();
        items.push(ListItem::new(format!("{}: {}", labels.band, self.confidence)));

        let list = List::new(items)
            .block(Block::default().title("Inputs").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);

        if self.editing {
            let hint = Paragraph::new("Editing…")
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Right);
            let rect = Rect {
                x: area.x + 1,
                y: area.y,
                width: area.width.saturating_sub(2),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_results(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let labels = Labels::for_locale(self.locale);
        let items: Vec<ListItem> = match &self.run {
            Some(run) => run
                .estimates
                .iter()
                .map(|entry| {
                    let reg = &entry.estimate.regression;
                    let (r, g, b) = series_color(run, entry);
                    ListItem::new(format!(
                        "{:<8} {:<24} b={:+.4} r={:.3}",
                        labels.series_label(entry),
                        labels.shelf_life_text(entry.estimate.shelf_life),
                        reg.slope,
                        reg.r_value
                    ))
                    .style(Style::default().fg(Color::Rgb(r, g, b)))
                })
                .collect(),
            None => vec![ListItem::new("No estimate yet (press e).")],
        };

        let list = List::new(items)
            .block(Block::default().title(labels.shelf_life).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .highlight_symbol("› ");

        let mut state = ratatui::widgets::ListState::default();
        if self.run.is_some() {
            state.select(Some(self.selected_series));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let labels = Labels::for_locale(self.locale);
        let title = if self.overview {
            labels.all_series.to_string()
        } else {
            self.run
                .as_ref()
                .and_then(|run| run.estimates.iter().nth(self.selected_series))
                .map(|entry| labels.series_label(entry).to_string())
                .unwrap_or_else(|| labels.title.to_string())
        };

        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = self.run.as_ref().and_then(|run| {
            if self.overview {
                chart_overview(run)
            } else {
                chart_series(run, self.selected_series)
            }
        }) else {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = ShelfLifeChart {
            lines: &data.lines,
            limit: data.limit,
            upper_limit: data.upper_limit,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_label: labels.time_axis,
            y_label: labels.potency_axis,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, data.x_bounds, data.y_bounds, &labels);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ field  Enter edit  e estimate  c 90/95%  ←/→ series  a all  l lang  r reset  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Everything the chart widget draws.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    lines: Vec<ChartLine>,
    limit: f64,
    upper_limit: Option<f64>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build the chart for the `index`-th estimate, band included.
fn chart_series(run: &RunOutput, index: usize) -> Option<ChartData> {
    let entry = run.estimates.iter().nth(index)?;
    let t1 = x_extent(run, std::slice::from_ref(entry));
    let mut line = chart_line(run, entry, t1, true)?;
    line.point_color = POINT_COLOR;
    Some(chart_data(run, vec![line], t1))
}

/// Build the chart with every lot and the average, without bands.
fn chart_overview(run: &RunOutput) -> Option<ChartData> {
    if run.estimates.is_empty() {
        return None;
    }
    let t1 = x_extent(run, &run.estimates.entries);
    let lines = run
        .estimates
        .iter()
        .map(|entry| chart_line(run, entry, t1, false))
        .collect::<Option<Vec<_>>>()?;
    Some(chart_data(run, lines, t1))
}

/// The x range starts at release and is stretched to show a limit crossing
/// when it falls within three times the observed range.
fn x_extent(run: &RunOutput, entries: &[LotEstimate]) -> f64 {
    let t_last = run.lots.times().iter().copied().fold(0.0_f64, f64::max);
    let base = if t_last > 0.0 { t_last } else { 1.0 };
    entries
        .iter()
        .filter_map(|entry| match entry.estimate.shelf_life {
            ShelfLife::Months(t) if t > base && t <= 3.0 * base => Some(t),
            _ => None,
        })
        .fold(base, f64::max)
}

fn chart_line(run: &RunOutput, entry: &LotEstimate, t1: f64, with_band: bool) -> Option<ChartLine> {
    let (_, _, values) = run
        .lots
        .series()
        .find(|(label, is_average, _)| *label == entry.label && *is_average == entry.is_average)?;
    let times = run.lots.times();
    let est = &entry.estimate;

    let n = 100usize;
    let fit: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let t = t1 * i as f64 / (n as f64 - 1.0);
            (t, est.regression.predict(t))
        })
        .collect();

    let (band_lower, band_upper): (Vec<(f64, f64)>, Vec<(f64, f64)>) = match &est.confidence_band {
        Some(band) if with_band => (
            times.iter().copied().zip(band.lower.iter().copied()).collect(),
            times.iter().copied().zip(band.upper.iter().copied()).collect(),
        ),
        _ => (Vec::new(), Vec::new()),
    };

    let color = series_color(run, entry);
    Some(ChartLine {
        points: times.iter().copied().zip(values.iter().copied()).collect(),
        fit,
        band_lower,
        band_upper,
        fit_color: if with_band { AVERAGE_COLOR } else { color },
        point_color: color,
    })
}

fn chart_data(run: &RunOutput, lines: Vec<ChartLine>, t1: f64) -> ChartData {
    let (mut y_min, mut y_max) = (run.params.limit, run.params.limit);
    if let Some(u) = run.upper_limit {
        y_max = y_max.max(u);
    }
    for line in &lines {
        for &(_, y) in line
            .points
            .iter()
            .chain(&line.fit)
            .chain(&line.band_lower)
            .chain(&line.band_upper)
        {
            if y.is_finite() {
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
        }
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    ChartData {
        lines,
        limit: run.params.limit,
        upper_limit: run.upper_limit,
        x_bounds: [0.0, t1],
        y_bounds: [y_min - pad, y_max + pad],
    }
}

/// Lots cycle through a palette in display order; the average is cyan.
fn series_color(run: &RunOutput, entry: &LotEstimate) -> (u8, u8, u8) {
    if entry.is_average {
        return AVERAGE_COLOR;
    }
    let index = run
        .estimates
        .iter()
        .filter(|e| !e.is_average)
        .position(|e| e.label == entry.label)
        .unwrap_or(0);
    LOT_COLORS[index % LOT_COLORS.len()]
}

/// Labels of the editable text fields, in `FIELD_*` order.
fn field_names(labels: &Labels) -> Vec<String> {
    let mut names = vec![labels.time_axis.to_string()];
    names.extend((1..=LOT_FIELDS.len()).map(|k| labels.lot_field(k)));
    names.push(labels.limit.to_string());
    names
}

fn join_numbers(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    labels: &Labels,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.0}");
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label.clone()).style(style),
            Rect {
                x: start,
                y,
                width: label.len() as u16,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.1}");
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label.clone()).style(style),
            Rect {
                x: start,
                y,
                width: label.len() as u16,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new(labels.time_axis)
        .alignment(Alignment::Center)
        .style(style);
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(labels.potency_axis).style(style.add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(Locale::En).unwrap()
    }

    #[test]
    fn starts_with_demo_estimate() {
        let app = app();
        let run = app.run.as_ref().unwrap();
        assert_eq!(run.estimates.len(), 4);
        assert_eq!(run.params.limit, 90.0);
        assert_eq!(app.fields[FIELD_MONTHS], "0, 3, 6, 9, 12, 18, 24, 36");
    }

    #[test]
    fn bad_field_keeps_previous_run_and_reports_error() {
        let mut app = app();
        app.fields[1] = "100, 98, abc".to_string();
        app.handle_key(KeyCode::Char('e'));
        assert!(app.status.starts_with("Error: invalid Lot 1"));
        assert!(app.run.is_some());
    }

    #[test]
    fn empty_lot_fields_are_skipped() {
        let mut app = app();
        app.fields[3].clear();
        app.handle_key(KeyCode::Char('e'));
        assert_eq!(app.run.as_ref().unwrap().estimates.len(), 3);
    }

    #[test]
    fn editing_replaces_field_text() {
        let mut app = app();
        app.selected_field = FIELD_LIMIT;
        app.handle_key(KeyCode::Enter);
        assert!(app.editing);
        app.handle_key(KeyCode::Backspace);
        app.handle_key(KeyCode::Backspace);
        app.handle_key(KeyCode::Char('9'));
        app.handle_key(KeyCode::Char('5'));
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.fields[FIELD_LIMIT], "95");
        app.handle_key(KeyCode::Char('e'));
        assert_eq!(app.run.as_ref().unwrap().params.limit, 95.0);
    }

    #[test]
    fn confidence_toggle_reestimates() {
        let mut app = app();
        app.handle_key(KeyCode::Char('c'));
        assert_eq!(app.run.as_ref().unwrap().params.confidence_level, ConfidenceLevel::P90);
    }

    #[test]
    fn series_selection_wraps() {
        let mut app = app();
        app.handle_key(KeyCode::Left);
        assert_eq!(app.selected_series, 3);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.selected_series, 0);
    }

    #[test]
    fn chart_covers_points_band_and_limit() {
        let app = app();
        let run = app.run.as_ref().unwrap();
        let data = chart_series(run, 3).unwrap();
        assert_eq!(data.lines.len(), 1);
        assert_eq!(data.lines[0].points.len(), 8);
        assert_eq!(data.lines[0].band_lower.len(), 8);
        assert_eq!(data.x_bounds[0], 0.0);
        assert!(data.x_bounds[1] >= 36.0);
        assert!(data.y_bounds[0] < 90.0 && data.y_bounds[1] > 100.0);
        assert!(chart_series(run, 9).is_none());
    }

    #[test]
    fn overview_charts_every_series_in_its_own_color() {
        let mut app = app();
        app.handle_key(KeyCode::Char('a'));
        assert!(app.overview);

        let run = app.run.as_ref().unwrap();
        let data = chart_overview(run).unwrap();
        assert_eq!(data.lines.len(), 4);
        assert!(data.lines.iter().all(|l| l.band_lower.is_empty() && l.points.len() == 8));
        let colors: Vec<_> = data.lines.iter().map(|l| l.point_color).collect();
        assert_eq!(colors, vec![LOT_COLORS[0], LOT_COLORS[1], LOT_COLORS[2], AVERAGE_COLOR]);
        assert!(data.x_bounds[1] >= 36.0);

        app.handle_key(KeyCode::Char('a'));
        assert!(!app.overview);
    }

    #[test]
    fn field_names_are_localized() {
        let ko = field_names(&Labels::for_locale(Locale::Ko));
        assert_eq!(ko, vec!["개월", "로트1", "로트2", "로트3", "허용 하한"]);
        assert_eq!(field_names(&Labels::for_locale(Locale::En))[1], "Lot 1");
    }
}
