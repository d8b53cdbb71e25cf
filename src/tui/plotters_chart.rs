//! Plotters-powered shelf-life chart widget for Ratatui.
//!
//! Plotters gives us axis and tick rendering for free; the output is drawn into
//! the Ratatui buffer through `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// One series as drawn on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine {
    /// Observed measurements.
    pub points: Vec<(f64, f64)>,
    /// Regression line sampled over the x range.
    pub fit: Vec<(f64, f64)>,
    /// Lower and upper band edges at the observed times (empty when hidden).
    pub band_lower: Vec<(f64, f64)>,
    pub band_upper: Vec<(f64, f64)>,
    pub fit_color: (u8, u8, u8),
    pub point_color: (u8, u8, u8),
}

/// A render-only chart description.
///
/// All series and bounds are computed by the caller; `render()` only draws.
pub struct ShelfLifeChart<'a> {
    pub lines: &'a [ChartLine],
    /// Lower acceptance limit (horizontal line).
    pub limit: f64,
    /// Optional upper specification line.
    pub upper_limit: Option<f64>,
    /// X bounds (months).
    pub x_bounds: [f64; 2],
    /// Y bounds (% of label claim).
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
}

impl<'a> Widget for ShelfLifeChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out tiny areas; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.0}"))
                .y_label_formatter(&|v| format!("{v:.1}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let band_color = RGBColor(255, 255, 0);
            let limit_color = RGBColor(255, 0, 0);
            let upper_color = RGBColor(0, 255, 0);

            chart.draw_series(LineSeries::new(
                [(x0, self.limit), (x1, self.limit)],
                &limit_color,
            ))?;
            if let Some(upper) = self.upper_limit {
                chart.draw_series(LineSeries::new([(x0, upper), (x1, upper)], &upper_color))?;
            }

            for line in self.lines {
                if !line.band_lower.is_empty() {
                    chart.draw_series(LineSeries::new(line.band_lower.iter().copied(), &band_color))?;
                    chart.draw_series(LineSeries::new(line.band_upper.iter().copied(), &band_color))?;
                }

                let (r, g, b) = line.fit_color;
                chart.draw_series(LineSeries::new(line.fit.iter().copied(), &RGBColor(r, g, b)))?;

                // `Circle` radii are mis-scaled by the backend; a pixel reads as a dot.
                let (r, g, b) = line.point_color;
                chart.draw_series(line.points.iter().map(|&(x, y)| Pixel::new((x, y), RGBColor(r, g, b))))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
