//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - regression line: `-`
//! - confidence band edges: `:`
//! - lower limit: `=`
//! - optional upper limit: `^`
//!
//! The overview chart overlays every series: lot points are `1`, `2`, ...,
//! average points `#`, lot lines `-` and the average line `*`.

use crate::domain::{RenderConfig, ShelfLifeEstimate};
use crate::report::Labels;

/// Everything needed to draw one series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesView<'a> {
    pub label: &'a str,
    pub is_average: bool,
    pub times: &'a [f64],
    pub values: &'a [f64],
    pub estimate: &'a ShelfLifeEstimate,
}

/// Render one series with its regression line, band and limit lines.
pub fn render_ascii_plot(view: &SeriesView<'_>, limit: f64, render: &RenderConfig) -> String {
    let width = render.width.max(10);
    let height = render.height.max(5);
    let labels = Labels::for_locale(render.locale);

    let (t_min, t_max) = time_range(view.times).unwrap_or((0.0, 1.0));

    let line = sample_line(view.estimate, t_min, t_max, width);
    let band = if render.show_band {
        view.estimate.confidence_band.as_ref().map(|b| {
            let lower: Vec<(f64, f64)> = view.times.iter().copied().zip(b.lower.iter().copied()).collect();
            let upper: Vec<(f64, f64)> = view.times.iter().copied().zip(b.upper.iter().copied()).collect();
            (lower, upper)
        })
    } else {
        None
    };

    let mut ys: Vec<f64> = view.values.to_vec();
    ys.extend(line.iter().map(|&(_, y)| y));
    if let Some((lower, upper)) = &band {
        ys.extend(lower.iter().chain(upper).map(|&(_, y)| y));
    }
    ys.push(limit);
    if let Some(u) = render.upper_limit {
        ys.push(u);
    }
    let (y_min, y_max) = y_range(&ys).unwrap_or((limit - 1.0, limit + 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let frame = Frame {
        t_min,
        t_max,
        y_min,
        y_max,
    };

    // Earlier layers win: draw_line only fills blank cells.
    draw_polyline(&mut grid, &line, &frame, '-');
    if let Some((lower, upper)) = &band {
        draw_polyline(&mut grid, lower, &frame, ':');
        draw_polyline(&mut grid, upper, &frame, ':');
    }
    draw_horizontal(&mut grid, limit, &frame, '=');
    if let Some(u) = render.upper_limit {
        draw_horizontal(&mut grid, u, &frame, '^');
    }

    for (&t, &y) in view.times.iter().zip(view.values) {
        let x = map_x(t, t_min, t_max, width);
        let y = map_y(y, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | {}=[{t_min:.1}, {t_max:.1}] | {}=[{y_min:.2}, {y_max:.2}]\n",
        series_name(view, &labels),
        labels.time_axis,
        labels.potency_axis
    ));
    push_grid(&mut out, grid);

    let mut legend = vec![format!("o {}", labels.observed), format!("- {}", labels.regression)];
    if band.is_some() {
        legend.push(format!(": {}", labels.band));
    }
    legend.push(format!("= {}", labels.limit));
    if render.upper_limit.is_some() {
        legend.push(format!("^ {}", labels.upper_limit));
    }
    out.push_str(&legend.join("  "));
    out.push('\n');

    out
}

/// Overlay every series on one grid, with a legend of shelf lives.
pub fn render_ascii_overview(views: &[SeriesView<'_>], limit: f64, render: &RenderConfig) -> String {
    let width = render.width.max(10);
    let height = render.height.max(5);
    let labels = Labels::for_locale(render.locale);

    let all_times: Vec<f64> = views.iter().flat_map(|v| v.times.iter().copied()).collect();
    let (t_min, t_max) = time_range(&all_times).unwrap_or((0.0, 1.0));
    let lines: Vec<Vec<(f64, f64)>> = views
        .iter()
        .map(|v| sample_line(v.estimate, t_min, t_max, width))
        .collect();

    let mut ys: Vec<f64> = views.iter().flat_map(|v| v.values.iter().copied()).collect();
    ys.extend(lines.iter().flatten().map(|&(_, y)| y));
    ys.push(limit);
    if let Some(u) = render.upper_limit {
        ys.push(u);
    }
    let (y_min, y_max) = y_range(&ys).unwrap_or((limit - 1.0, limit + 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let frame = Frame {
        t_min,
        t_max,
        y_min,
        y_max,
    };

    // The average line goes first so lot lines never cover it.
    for average_pass in [true, false] {
        for (view, line) in views.iter().zip(&lines) {
            if view.is_average == average_pass {
                draw_polyline(&mut grid, line, &frame, if average_pass { '*' } else { '-' });
            }
        }
    }
    draw_horizontal(&mut grid, limit, &frame, '=');
    if let Some(u) = render.upper_limit {
        draw_horizontal(&mut grid, u, &frame, '^');
    }

    let markers = series_markers(views);
    for (view, &marker) in views.iter().zip(&markers) {
        for (&t, &y) in view.times.iter().zip(view.values) {
            let x = map_x(t, t_min, t_max, width);
            let y = map_y(y, y_min, y_max, height);
            grid[y][x] = marker;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | {}=[{t_min:.1}, {t_max:.1}] | {}=[{y_min:.2}, {y_max:.2}]\n",
        labels.all_series, labels.time_axis, labels.potency_axis
    ));
    push_grid(&mut out, grid);

    for (view, marker) in views.iter().zip(markers) {
        out.push_str(&format!(
            "{marker} {}: {}\n",
            series_name(view, &labels),
            labels.shelf_life_text(view.estimate.shelf_life)
        ));
    }
    let mut legend = vec![format!("- {}", labels.regression)];
    if views.iter().any(|v| v.is_average) {
        legend.push(format!("* {} ({})", labels.regression, labels.average));
    }
    legend.push(format!("= {}", labels.limit));
    if render.upper_limit.is_some() {
        legend.push(format!("^ {}", labels.upper_limit));
    }
    out.push_str(&legend.join("  "));
    out.push('\n');

    out
}

/// Point markers in view order: lots count up from `1`, the average is `#`.
fn series_markers(views: &[SeriesView<'_>]) -> Vec<char> {
    let mut lot = 0u32;
    views
        .iter()
        .map(|v| {
            if v.is_average {
                return '#';
            }
            lot += 1;
            match lot {
                1..=9 => char::from_digit(lot, 10).unwrap_or('+'),
                _ => char::from_u32('a' as u32 + lot - 10)
                    .filter(char::is_ascii_lowercase)
                    .unwrap_or('+'),
            }
        })
        .collect()
}

fn series_name<'a>(view: &SeriesView<'a>, labels: &Labels) -> &'a str {
    if view.is_average { labels.average } else { view.label }
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
}

struct Frame {
    t_min: f64,
    t_max: f64,
    y_min: f64,
    y_max: f64,
}

fn time_range(times: &[f64]) -> Option<(f64, f64)> {
    let mut min_t = f64::INFINITY;
    let mut max_t = f64::NEG_INFINITY;
    for &t in times {
        min_t = min_t.min(t);
        max_t = max_t.max(t);
    }
    if min_t.is_finite() && max_t.is_finite() && max_t > min_t {
        Some((min_t, max_t))
    } else {
        None
    }
}

fn sample_line(estimate: &ShelfLifeEstimate, t_min: f64, t_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let t = t_min + u * (t_max - t_min);
            (t, estimate.regression.predict(t))
        })
        .collect()
}

fn y_range(ys: &[f64]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &y in ys.iter().filter(|y| y.is_finite()) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], points: &[(f64, f64)], frame: &Frame, ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in points {
        let x = map_x(t, frame.t_min, frame.t_max, width);
        let yy = map_y(y, frame.y_min, frame.y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, yy, ch),
            None => draw_line(grid, x, yy, x, yy, ch),
        }
        prev = Some((x, yy));
    }
}

fn draw_horizontal(grid: &mut [Vec<char>], y: f64, frame: &Frame, ch: char) {
    let height = grid.len();
    let width = grid[0].len();
    let row = map_y(y, frame.y_min, frame.y_max, height);
    draw_line(grid, 0, row, width - 1, row, ch);
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
