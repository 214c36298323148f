//! Histogram figure rendering (SVG text or PNG raster).

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use irislab_training::{Histogram, TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Cursor;
use std::str::FromStr;

/// Figure edge length in pixels (6in at 100dpi).
pub const FIGURE_SIZE: u32 = 600;

const MARGIN_LEFT: u32 = 80;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 20;
const MARGIN_BOTTOM: u32 = 60;
const BAR_FILL: [u8; 3] = [31, 119, 180];
const BAR_EDGE: [u8; 3] = [20, 80, 125];
const AXIS: [u8; 3] = [0, 0, 0];
const Y_TICKS: usize = 5;

/// Raster glyph cell edge in pixels, before scaling.
const GLYPH: i64 = 8;
const TICK_SCALE: i64 = 1;
const LABEL_SCALE: i64 = 2;
/// Left edge of the rotated y label in the raster figure.
const Y_LABEL_LEFT: i64 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotFormat {
    #[default]
    Svg,
    Png,
}

impl PlotFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

impl FromStr for PlotFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            other => Err(format!("unknown plot format '{other}' (expected svg or png)")),
        }
    }
}

impl std::fmt::Display for PlotFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
}

impl Default for AxisLabels {
    fn default() -> Self {
        Self {
            x: "Accuracy".to_string(),
            y: "Count".to_string(),
        }
    }
}

pub fn render_histogram(
    hist: &Histogram,
    labels: &AxisLabels,
    format: PlotFormat,
) -> TrainingResult<Vec<u8>> {
    match format {
        PlotFormat::Svg => render_svg(hist, labels)
            .map(String::into_bytes)
            .map_err(|e| TrainingError::Render(format!("failed to format svg: {e}"))),
        PlotFormat::Png => render_png(hist, labels),
    }
}

/// Pixel rectangle of one bar: `(x0, x1, y_top)`; the bottom is the x axis.
struct BarGeometry {
    x0: f64,
    x1: f64,
    top: f64,
}

struct Frame {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl Frame {
    fn standard() -> Self {
        Self {
            left: f64::from(MARGIN_LEFT),
            right: f64::from(FIGURE_SIZE - MARGIN_RIGHT),
            top: f64::from(MARGIN_TOP),
            bottom: f64::from(FIGURE_SIZE - MARGIN_BOTTOM),
        }
    }

    fn x_of(&self, hist: &Histogram, value: f64) -> f64 {
        let (lo, hi) = hist.range();
        self.left + (value - lo) / (hi - lo) * (self.right - self.left)
    }

    fn y_of(&self, y_max: f64, value: f64) -> f64 {
        if y_max <= 0.0 {
            return self.bottom;
        }
        self.bottom - value / y_max * (self.bottom - self.top)
    }

    fn bars(&self, hist: &Histogram, y_max: f64) -> Vec<BarGeometry> {
        hist.edges
            .windows(2)
            .zip(&hist.density)
            .map(|(e, &d)| BarGeometry {
                x0: self.x_of(hist, e[0]),
                x1: self.x_of(hist, e[1]),
                top: self.y_of(y_max, d),
            })
            .collect()
    }
}

/// Axis top: the largest density padded by 5%, or 1 for an empty histogram.
fn y_axis_max(hist: &Histogram) -> f64 {
    let max = hist.max_density();
    if max > 0.0 { max * 1.05 } else { 1.0 }
}

fn x_ticks(hist: &Histogram) -> Vec<f64> {
    if hist.n_bins() <= 10 {
        return hist.edges.clone();
    }
    let (lo, hi) = hist.range();
    (0..=4).map(|i| lo + (hi - lo) * f64::from(i) / 4.0).collect()
}

fn y_ticks(y_max: f64) -> impl Iterator<Item = f64> {
    (0..=Y_TICKS).map(move |i| y_max * i as f64 / Y_TICKS as f64)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn render_svg(hist: &Histogram, labels: &AxisLabels) -> Result<String, std::fmt::Error> {
    let frame = Frame::standard();
    let y_max = y_axis_max(hist);
    let size = FIGURE_SIZE;
    let fill = format!("rgb({},{},{})", BAR_FILL[0], BAR_FILL[1], BAR_FILL[2]);
    let edge = format!("rgb({},{},{})", BAR_EDGE[0], BAR_EDGE[1], BAR_EDGE[2]);

    let mut svg = String::new();
    writeln!(
        svg,
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" "#,
            r#"viewBox="0 0 {size} {size}" font-family="sans-serif" font-size="12">"#,
        ),
        size = size
    )?;
    writeln!(svg, r#"<rect width="{size}" height="{size}" fill="white"/>"#)?;

    for bar in frame.bars(hist, y_max) {
        let height = frame.bottom - bar.top;
        if height <= 0.0 {
            continue;
        }
        writeln!(
            svg,
            concat!(
                r#"<rect class="bar" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" "#,
                r#"fill="{fill}" stroke="{edge}"/>"#,
            ),
            bar.x0,
            bar.top,
            bar.x1 - bar.x0,
            height,
            fill = fill,
            edge = edge
        )?;
    }

    writeln!(
        svg,
        concat!(
            r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/>"#,
            r#"<line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
        ),
        l = frame.left,
        r = frame.right,
        t = frame.top,
        b = frame.bottom
    )?;

    for tick in x_ticks(hist) {
        let x = frame.x_of(hist, tick);
        writeln!(
            svg,
            concat!(
                r#"<line x1="{x:.2}" y1="{b}" x2="{x:.2}" y2="{b5}" stroke="black"/>"#,
                r#"<text x="{x:.2}" y="{ty}" text-anchor="middle">{tick:.3}</text>"#,
            ),
            x = x,
            tick = tick,
            b = frame.bottom,
            b5 = frame.bottom + 5.0,
            ty = frame.bottom + 20.0
        )?;
    }

    for value in y_ticks(y_max) {
        let y = frame.y_of(y_max, value);
        writeln!(
            svg,
            concat!(
                r#"<line x1="{l5}" y1="{y:.2}" x2="{l}" y2="{y:.2}" stroke="black"/>"#,
                r#"<text x="{tx}" y="{ty:.2}" text-anchor="end">{value:.2}</text>"#,
            ),
            y = y,
            value = value,
            l = frame.left,
            l5 = frame.left - 5.0,
            tx = frame.left - 8.0,
            ty = y + 4.0
        )?;
    }

    writeln!(
        svg,
        concat!(
            r#"<text class="xlabel" x="{:.1}" y="{}" text-anchor="middle" font-size="14">"#,
            "{}</text>",
        ),
        (frame.left + frame.right) / 2.0,
        size - 15,
        escape_xml(&labels.x)
    )?;
    writeln!(
        svg,
        concat!(
            r#"<text class="ylabel" x="20" y="{cy:.1}" text-anchor="middle" font-size="14" "#,
            r#"transform="rotate(-90 20 {cy:.1})">{}</text>"#,
        ),
        escape_xml(&labels.y),
        cy = (frame.top + frame.bottom) / 2.0
    )?;
    svg.push_str("</svg>\n");
    Ok(svg)
}

fn render_png(hist: &Histogram, labels: &AxisLabels) -> TrainingResult<Vec<u8>> {
    let frame = Frame::standard();
    let y_max = y_axis_max(hist);
    let mut img = RgbImage::from_pixel(FIGURE_SIZE, FIGURE_SIZE, Rgb([255, 255, 255]));

    for bar in frame.bars(hist, y_max) {
        let (x0, x1) = (bar.x0.round() as u32, bar.x1.round() as u32);
        let (y0, y1) = (bar.top.round() as u32, frame.bottom.round() as u32);
        if y0 >= y1 {
            continue;
        }
        fill_rect(&mut img, x0, y0, x1, y1, BAR_FILL);
        stroke_rect(&mut img, x0, y0, x1, y1, BAR_EDGE);
    }

    let (l, r, t, b) =
        (frame.left as u32, frame.right as u32, frame.top as u32, frame.bottom as u32);
    fill_rect(&mut img, l, b, r + 1, b + 1, AXIS);
    fill_rect(&mut img, l, t, l + 1, b + 1, AXIS);
    for tick in x_ticks(hist) {
        let x = frame.x_of(hist, tick).round() as u32;
        fill_rect(&mut img, x, b, x + 1, b + 6, AXIS);
        let text = format!("{tick:.3}");
        let left = i64::from(x) - text_width(&text, TICK_SCALE) / 2;
        draw_text(&mut img, &text, left, i64::from(b) + 10, TICK_SCALE);
    }
    for value in y_ticks(y_max) {
        let y = frame.y_of(y_max, value).round() as u32;
        fill_rect(&mut img, l.saturating_sub(5), y, l, y + 1, AXIS);
        let text = format!("{value:.2}");
        let left = i64::from(l) - 8 - text_width(&text, TICK_SCALE);
        draw_text(&mut img, &text, left, i64::from(y) - GLYPH / 2, TICK_SCALE);
    }

    let center_x = ((frame.left + frame.right) / 2.0).round() as i64;
    let label_top = i64::from(FIGURE_SIZE) - 15 - GLYPH * LABEL_SCALE;
    let left = center_x - text_width(&labels.x, LABEL_SCALE) / 2;
    draw_text(&mut img, &labels.x, left, label_top, LABEL_SCALE);

    let center_y = ((frame.top + frame.bottom) / 2.0).round() as i64;
    let bottom = center_y + text_width(&labels.y, LABEL_SCALE) / 2;
    draw_text_upward(&mut img, &labels.y, Y_LABEL_LEFT, bottom, LABEL_SCALE);

    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| TrainingError::Render(format!("failed to encode png: {e}")))?;
    Ok(buf)
}

/// Fill `[x0, x1) x [y0, y1)`, clipped to the image.
fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: [u8; 3]) {
    let (w, h) = img.dimensions();
    for y in y0.min(h)..y1.min(h) {
        for x in x0.min(w)..x1.min(w) {
            img.put_pixel(x, y, Rgb(color));
        }
    }
}

fn stroke_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: [u8; 3]) {
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    fill_rect(img, x0, y0, x1, y0 + 1, color);
    fill_rect(img, x0, y1 - 1, x1, y1, color);
    fill_rect(img, x0, y0, x0 + 1, y1, color);
    fill_rect(img, x1 - 1, y0, x1, y1, color);
}

fn text_width(text: &str, scale: i64) -> i64 {
    text.chars().count() as i64 * GLYPH * scale
}

/// 8x8 bitmap for `c`; characters outside basic latin render as `?`.
fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?')).unwrap_or([0; 8])
}

/// One glyph pixel blown up to a `scale` square; off-image parts are dropped.
fn plot_cell(img: &mut RgbImage, x: i64, y: i64, scale: i64) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y, s) = (x as u32, y as u32, scale as u32);
    fill_rect(img, x, y, x + s, y + s, AXIS);
}

/// Draw `text` left to right with its top-left corner at `(left, top)`.
fn draw_text(img: &mut RgbImage, text: &str, left: i64, top: i64, scale: i64) {
    for (i, c) in text.chars().enumerate() {
        let origin = left + i as i64 * GLYPH * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH {
                if bits & (1 << col) != 0 {
                    plot_cell(img, origin + col * scale, top + row as i64 * scale, scale);
                }
            }
        }
    }
}

/// Draw `text` rotated a quarter turn counter-clockwise, reading bottom to top
/// from `bottom`, with its left edge at `left`.
fn draw_text_upward(img: &mut RgbImage, text: &str, left: i64, bottom: i64, scale: i64) {
    for (i, c) in text.chars().enumerate() {
        let origin = bottom - (i as i64 + 1) * GLYPH * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH {
                if bits & (1 << col) != 0 {
                    let x = left + row as i64 * scale;
                    let y = origin + (GLYPH - 1 - col) * scale;
                    plot_cell(img, x, y, scale);
                }
            }
        }
    }
}
