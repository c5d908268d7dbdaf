//! Bitmap rendering of chart specs using the `image` crate.

use std::f64::consts::PI;

use image::{DynamicImage, Rgb, RgbImage};

use super::{ChartKind, ChartRasterizer, ChartSpec};
use crate::aggregate::Series;
use crate::error::ReportError;
use crate::layout::{CHART_CANVAS, CHART_SCALE};

/// Width of the chart bitmaps embedded in the report: one pixel per printed point.
pub const DEFAULT_CHART_WIDTH_PX: u32 = (CHART_CANVAS.width * CHART_SCALE) as u32;
/// Height of the chart bitmaps embedded in the report.
pub const DEFAULT_CHART_HEIGHT_PX: u32 = (CHART_CANVAS.height * CHART_SCALE) as u32;

const MIN_WIDTH_PX: u32 = 80;
const MIN_HEIGHT_PX: u32 = 60;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([150, 150, 150]);
const GRID: Rgb<u8> = Rgb([230, 230, 230]);
const GRID_LINES: u32 = 5;

const BAR_FILL_RATIO: f64 = 0.7;
const LINE_THICKNESS: f64 = 3.0;
const MARKER_RADIUS: f64 = 5.0;
const PIE_RADIUS_RATIO: f64 = 0.4;
const DOUGHNUT_HOLE_RATIO: f64 = 0.5;

/// Draws bar, line, pie and doughnut charts onto a fixed-size RGB canvas.
///
/// The bitmap carries no text; titles and legends are printed next to the image by the
/// composer.  Empty series produce an empty frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapRasterizer {
    width: u32,
    height: u32,
}

impl Default for BitmapRasterizer {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH_PX,
            height: DEFAULT_CHART_HEIGHT_PX,
        }
    }
}

impl BitmapRasterizer {
    /// Creates a rasterizer for the given canvas size, clamped to a small minimum.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(MIN_WIDTH_PX),
            height: height.max(MIN_HEIGHT_PX),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl ChartRasterizer for BitmapRasterizer {
    fn rasterize(&self, spec: &ChartSpec, series: &Series) -> Result<DynamicImage, ReportError> {
        let mut canvas = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let plot = PlotArea::for_canvas(self.width, self.height);

        match spec.kind {
            ChartKind::Bar => draw_bars(&mut canvas, &plot, spec, series),
            ChartKind::Line => draw_line_series(&mut canvas, &plot, spec, series),
            ChartKind::Pie => draw_slices(&mut canvas, spec, series, 0.0),
            ChartKind::Doughnut => draw_slices(&mut canvas, spec, series, DOUGHNUT_HOLE_RATIO),
        }

        Ok(DynamicImage::ImageRgb8(canvas))
    }
}

struct PlotArea {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl PlotArea {
    fn for_canvas(width: u32, height: u32) -> Self {
        let (width, height) = (width as f64, height as f64);
        Self {
            left: (width * 0.08).round(),
            top: (height * 0.07).round(),
            right: (width * 0.96).round(),
            bottom: (height * 0.9).round(),
        }
    }

    fn width(&self) -> f64 {
        self.right - self.left
    }

    fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Horizontal centre of the `index`-th of `count` equal slots.
    fn slot_center(&self, index: usize, count: usize) -> f64 {
        let slot = self.width() / count as f64;
        self.left + slot * (index as f64 + 0.5)
    }

    /// Canvas y coordinate of `value` on a scale from zero to `max`.
    fn value_y(&self, value: f64, max: f64) -> f64 {
        self.bottom - value.max(0.0) / max * self.height()
    }
}

fn set_pixel(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_rect(canvas: &mut RgbImage, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb<u8>) {
    let (x0, x1) = (x0.min(x1).round() as i64, x0.max(x1).round() as i64);
    let (y0, y1) = (y0.min(y1).round() as i64, y0.max(y1).round() as i64);
    for y in y0..y1 {
        for x in x0..x1 {
            set_pixel(canvas, x, y, color);
        }
    }
}

fn fill_circle(canvas: &mut RgbImage, cx: f64, cy: f64, radius: f64, color: Rgb<u8>) {
    let reach = radius.ceil() as i64;
    let (cxi, cyi) = (cx.round() as i64, cy.round() as i64);
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            if ((dx * dx + dy * dy) as f64) <= radius * radius {
                set_pixel(canvas, cxi + dx, cyi + dy, color);
            }
        }
    }
}

fn draw_segment(
    canvas: &mut RgbImage,
    from: (f64, f64),
    to: (f64, f64),
    thickness: f64,
    color: Rgb<u8>,
) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    let half = thickness / 2.0;
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let (x, y) = (from.0 + dx * t, from.1 + dy * t);
        fill_rect(canvas, x - half, y - half, x + half, y + half, color);
    }
}

fn draw_axes(canvas: &mut RgbImage, plot: &PlotArea) {
    for line in 1..=GRID_LINES {
        let y = plot.bottom - plot.height() * line as f64 / GRID_LINES as f64;
        draw_segment(canvas, (plot.left, y), (plot.right, y), 1.0, GRID);
    }
    draw_segment(
        canvas,
        (plot.left, plot.top),
        (plot.left, plot.bottom),
        2.0,
        AXIS,
    );
    draw_segment(
        canvas,
        (plot.left, plot.bottom),
        (plot.right, plot.bottom),
        2.0,
        AXIS,
    );
}

fn draw_bars(canvas: &mut RgbImage, plot: &PlotArea, spec: &ChartSpec, series: &Series) {
    draw_axes(canvas, plot);
    let max = series.max_value();
    if series.is_empty() || max <= 0.0 {
        return;
    }

    let count = series.len();
    let bar_width = (plot.width() / count as f64 * BAR_FILL_RATIO).max(1.0);
    for (index, point) in series.points().iter().enumerate() {
        let center = plot.slot_center(index, count);
        fill_rect(
            canvas,
            center - bar_width / 2.0,
            plot.value_y(point.value, max),
            center + bar_width / 2.0,
            plot.bottom,
            spec.color(index),
        );
    }
}

fn draw_line_series(canvas: &mut RgbImage, plot: &PlotArea, spec: &ChartSpec, series: &Series) {
    draw_axes(canvas, plot);
    let max = series.max_value();
    if series.is_empty() {
        return;
    }

    let count = series.len();
    let scale = if max > 0.0 { max } else { 1.0 };
    let vertices: Vec<(f64, f64)> = series
        .points()
        .iter()
        .enumerate()
        .map(|(index, point)| {
            (
                plot.slot_center(index, count),
                plot.value_y(point.value, scale),
            )
        })
        .collect();

    let color = spec.color(0);
    for pair in vertices.windows(2) {
        draw_segment(canvas, pair[0], pair[1], LINE_THICKNESS, color);
    }
    for &(x, y) in &vertices {
        fill_circle(canvas, x, y, MARKER_RADIUS, color);
    }
}

/// Fills pie slices clockwise from twelve o'clock; `hole_ratio` > 0 leaves a doughnut hole.
fn draw_slices(canvas: &mut RgbImage, spec: &ChartSpec, series: &Series, hole_ratio: f64) {
    let values: Vec<f64> = series
        .points()
        .iter()
        .map(|point| point.value.max(0.0))
        .collect();
    let total: f64 = values.iter().fold(0.0, |sum, value| sum + value);
    if total <= 0.0 {
        return;
    }

    let mut running = 0.0;
    let boundaries: Vec<f64> = values
        .iter()
        .map(|value| {
            running += value / total;
            running
        })
        .collect();

    let (width, height) = (canvas.width() as f64, canvas.height() as f64);
    let (cx, cy) = (width / 2.0, height / 2.0);
    let radius = width.min(height) * PIE_RADIUS_RATIO;
    let inner = radius * hole_ratio;
    let reach = radius.ceil() as i64;

    for py in (cy as i64 - reach)..=(cy as i64 + reach) {
        for px in (cx as i64 - reach)..=(cx as i64 + reach) {
            let dx = px as f64 + 0.5 - cx;
            let dy = py as f64 + 0.5 - cy;
            let distance = dx.hypot(dy);
            if distance > radius || distance < inner {
                continue;
            }

            let fraction = dx.atan2(-dy).rem_euclid(2.0 * PI) / (2.0 * PI);
            let slice = boundaries
                .iter()
                .position(|&boundary| fraction < boundary)
                .unwrap_or(boundaries.len() - 1);
            set_pixel(canvas, px, py, spec.color(slice));
        }
    }
}
