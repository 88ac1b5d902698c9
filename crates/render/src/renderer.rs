//! Chart renderer interface and the HTML implementation.
//!
//! The HTML renderer writes one self-contained document per call: an inline
//! SVG candlestick chart with no external scripts or stylesheets.

use chrono::NaiveDateTime;
use predchart_core::config::ChartConfig;
use predchart_core::{AlignedDataset, AlignedRow, ComparisonPlan, Error, OhlcFields, Result};
use std::path::PathBuf;

/// Turns a comparison plan and its dataset into a visual artifact.
pub trait ChartRenderer {
    /// Render and return the artifact's location.
    ///
    /// Fails with [`Error::Render`] on malformed input or write failure.
    fn render(
        &self,
        plan: &ComparisonPlan,
        dataset: &AlignedDataset,
        output_id: &str,
    ) -> Result<PathBuf>;
}

/// Deterministic artifact identifier for a table name.
///
/// Characters outside `[A-Za-z0-9_.-]` are percent-encoded byte by byte, so
/// distinct table names always map to distinct identifiers.
pub fn output_id_for(table: &str) -> String {
    let mut id = String::with_capacity(table.len());
    for c in table.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
            id.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                id.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    id
}

const ACTUAL_UP: &str = "#26a69a";
const ACTUAL_DOWN: &str = "#ef5350";
const PREDICTED_UP: &str = "cyan";
const PREDICTED_DOWN: &str = "magenta";
const PREDICTED_LINE: &str = "#ff9800";
const AXIS: &str = "#444";
const GRID: &str = "#e5e5e5";

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 70.0;

/// Writes `{output_dir}/{output_id}.html`.
#[derive(Debug, Clone)]
pub struct HtmlChartRenderer {
    config: ChartConfig,
}

impl HtmlChartRenderer {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    /// Location of the artifact for an output id.
    pub fn output_path(&self, output_id: &str) -> PathBuf {
        self.config.output_dir.join(format!("{output_id}.html"))
    }

    /// Build the HTML document without touching the filesystem.
    pub fn document(&self, plan: &ComparisonPlan, dataset: &AlignedDataset) -> Result<String> {
        let actual = plan.actual_fields().ok_or_else(|| {
            Error::render(format!("'{}': skipped plan cannot be rendered", dataset.name))
        })?;
        if dataset.is_empty() {
            return Err(Error::render(format!("'{}': dataset has no rows", dataset.name)));
        }
        for field in required_fields(plan) {
            if !dataset.has_field(field) {
                return Err(Error::render(format!(
                    "'{}': plan refers to missing field '{}'",
                    dataset.name, field
                )));
            }
        }

        let mut rows: Vec<&AlignedRow> = dataset.rows.iter().collect();
        rows.sort_by_key(|r| r.ts);

        let actual_candles: Vec<Option<Candle>> =
            rows.iter().map(|r| Candle::from_row(dataset, r, actual)).collect();
        let predicted_candles: Vec<Option<Candle>> = match plan {
            ComparisonPlan::FullOverlay { predicted, .. } => {
                rows.iter().map(|r| Candle::from_row(dataset, r, predicted)).collect()
            }
            _ => Vec::new(),
        };
        let predicted_line: Vec<Option<f64>> = match plan {
            ComparisonPlan::PredictedLineOnly { predicted_close, .. } => {
                rows.iter().map(|r| dataset.value(r, predicted_close)).collect()
            }
            _ => Vec::new(),
        };

        let values = actual_candles
            .iter()
            .chain(&predicted_candles)
            .flatten()
            .flat_map(|c| [c.low, c.high])
            .chain(predicted_line.iter().flatten().copied());
        let (y_min, y_max) = value_range(values).ok_or_else(|| {
            Error::render(format!("'{}': no plottable price values", dataset.name))
        })?;

        let frame = Frame::new(
            self.config.width as f64,
            self.config.height as f64,
            rows.len(),
            y_min,
            y_max,
        );
        let stamps: Vec<NaiveDateTime> = rows.iter().map(|r| r.ts).collect();
        let title = format!("{} {}", self.config.title_prefix, dataset.name);

        let mut svg = String::new();
        frame.draw_axes(&mut svg, &stamps);

        let overlay = !predicted_candles.is_empty();
        let (actual_shift, body) = if overlay { (-0.2, 0.35) } else { (0.0, 0.7) };
        draw_candles(&mut svg, &frame, &actual_candles, &ACTUAL_STYLE, actual_shift, body);
        if overlay {
            draw_candles(&mut svg, &frame, &predicted_candles, &PREDICTED_STYLE, 0.2, body);
        }
        if !predicted_line.is_empty() {
            draw_line(&mut svg, &frame, &predicted_line);
        }
        draw_legend(&mut svg, &frame, overlay || !predicted_line.is_empty());

        Ok(wrap_document(&title, &frame, &svg))
    }
}

impl ChartRenderer for HtmlChartRenderer {
    fn render(
        &self,
        plan: &ComparisonPlan,
        dataset: &AlignedDataset,
        output_id: &str,
    ) -> Result<PathBuf> {
        if output_id.is_empty() {
            return Err(Error::render("empty output id"));
        }
        let html = self.document(plan, dataset)?;

        std::fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            Error::render(format!(
                "cannot create output directory {}: {e}",
                self.config.output_dir.display()
            ))
        })?;
        let path = self.output_path(output_id);
        std::fs::write(&path, html)
            .map_err(|e| Error::render(format!("cannot write {}: {e}", path.display())))?;
        Ok(path)
    }
}

fn required_fields(plan: &ComparisonPlan) -> Vec<&str> {
    match plan {
        ComparisonPlan::FullOverlay { actual, predicted } => {
            actual.names().into_iter().chain(predicted.names()).collect()
        }
        ComparisonPlan::PredictedLineOnly {
            actual,
            predicted_close,
        } => {
            let mut fields = actual.names().to_vec();
            fields.push(predicted_close.as_str());
            fields
        }
        ComparisonPlan::Skip { .. } => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy)]
struct Candle {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl Candle {
    /// A candle needs all four values; partial rows are not drawn.
    fn from_row(dataset: &AlignedDataset, row: &AlignedRow, fields: &OhlcFields) -> Option<Self> {
        let candle = Candle {
            open: dataset.value(row, &fields.open)?,
            high: dataset.value(row, &fields.high)?,
            low: dataset.value(row, &fields.low)?,
            close: dataset.value(row, &fields.close)?,
        };
        [candle.open, candle.high, candle.low, candle.close]
            .iter()
            .all(|v| v.is_finite())
            .then_some(candle)
    }

    fn rising(&self) -> bool {
        self.close >= self.open
    }
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return None;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.01 };
    Some((lo - pad, hi + pad))
}

/// Maps row positions and prices onto SVG coordinates.
struct Frame {
    width: f64,
    height: f64,
    slots: usize,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn new(width: f64, height: f64, slots: usize, y_min: f64, y_max: f64) -> Self {
        Self {
            width: width.max(MARGIN_LEFT + MARGIN_RIGHT + 1.0),
            height: height.max(MARGIN_TOP + MARGIN_BOTTOM + 1.0),
            slots: slots.max(1),
            y_min,
            y_max,
        }
    }

    fn plot_width(&self) -> f64 {
        self.width - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        self.height - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn slot_width(&self) -> f64 {
        self.plot_width() / self.slots as f64
    }

    fn x(&self, slot: usize) -> f64 {
        MARGIN_LEFT + self.slot_width() * (slot as f64 + 0.5)
    }

    fn y(&self, price: f64) -> f64 {
        MARGIN_TOP + (self.y_max - price) / (self.y_max - self.y_min) * self.plot_height()
    }

    fn draw_axes(&self, svg: &mut String, stamps: &[NaiveDateTime]) {
        let bottom = MARGIN_TOP + self.plot_height();
        let right = MARGIN_LEFT + self.plot_width();

        for i in 0..=4 {
            let price = self.y_min + (self.y_max - self.y_min) * i as f64 / 4.0;
            let y = self.y(price);
            svg.push_str(&format!(
                r#"<line x1="{MARGIN_LEFT:.1}" y1="{y:.1}" x2="{right:.1}" y2="{y:.1}" stroke="{GRID}"/>"#
            ));
            svg.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end" fill="{AXIS}">{price:.2}</text>"#,
                MARGIN_LEFT - 6.0,
                y + 4.0
            ));
        }

        let step = (stamps.len() / 8).max(1);
        for (i, ts) in stamps.iter().enumerate().step_by(step) {
            let x = self.x(i);
            svg.push_str(&format!(
                r#"<text x="{x:.1}" y="{:.1}" font-size="10" text-anchor="end" fill="{AXIS}" transform="rotate(-30 {x:.1} {:.1})">{}</text>"#,
                bottom + 16.0,
                bottom + 16.0,
                ts.format("%Y-%m-%d %H:%M")
            ));
        }

        svg.push_str(&format!(
            r#"<line x1="{MARGIN_LEFT:.1}" y1="{bottom:.1}" x2="{right:.1}" y2="{bottom:.1}" stroke="{AXIS}"/>"#
        ));
        svg.push_str(&format!(
            r#"<line x1="{MARGIN_LEFT:.1}" y1="{MARGIN_TOP:.1}" x2="{MARGIN_LEFT:.1}" y2="{bottom:.1}" stroke="{AXIS}"/>"#
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle" fill="{AXIS}">Datetime</text>"#,
            MARGIN_LEFT + self.plot_width() / 2.0,
            self.height - 8.0
        ));
        svg.push_str(&format!(
            r#"<text x="14" y="{:.1}" font-size="12" text-anchor="middle" fill="{AXIS}" transform="rotate(-90 14 {:.1})">Price</text>"#,
            MARGIN_TOP + self.plot_height() / 2.0,
            MARGIN_TOP + self.plot_height() / 2.0
        ));
    }
}

/// CSS class and rising/falling colours of one candle series.
struct CandleStyle {
    class: &'static str,
    up: &'static str,
    down: &'static str,
}

const ACTUAL_STYLE: CandleStyle = CandleStyle {
    class: "actual",
    up: ACTUAL_UP,
    down: ACTUAL_DOWN,
};

const PREDICTED_STYLE: CandleStyle = CandleStyle {
    class: "predicted",
    up: PREDICTED_UP,
    down: PREDICTED_DOWN,
};

/// `shift` offsets candles within their slot and `body` is the body width,
/// both as fractions of the slot width.
fn draw_candles(
    svg: &mut String,
    frame: &Frame,
    candles: &[Option<Candle>],
    style: &CandleStyle,
    shift: f64,
    body: f64,
) {
    let CandleStyle { class, up, down } = *style;
    let slot = frame.slot_width();
    let width = (slot * body).max(1.0);
    for (i, candle) in candles.iter().enumerate() {
        let Some(c) = candle else { continue };
        let x = frame.x(i) + slot * shift;
        let color = if c.rising() { up } else { down };
        let top = frame.y(c.open.max(c.close));
        let height = (frame.y(c.open.min(c.close)) - top).max(1.0);
        svg.push_str(&format!(
            r#"<g class="candle {class}"><line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{color}"/><rect x="{:.1}" y="{top:.1}" width="{width:.1}" height="{height:.1}" fill="{color}" stroke="{color}"/></g>"#,
            frame.y(c.high),
            frame.y(c.low),
            x - width / 2.0
        ));
    }
}

/// Predicted close as line segments with markers; NULLs break the line.
fn draw_line(svg: &mut String, frame: &Frame, values: &[Option<f64>]) {
    let mut segment: Vec<String> = Vec::new();
    for (i, value) in values.iter().enumerate() {
        match value.filter(|v| v.is_finite()) {
            Some(v) => segment.push(format!("{:.1},{:.1}", frame.x(i), frame.y(v))),
            None => flush_segment(svg, &mut segment),
        }
    }
    flush_segment(svg, &mut segment);

    for (i, value) in values.iter().enumerate() {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            svg.push_str(&format!(
                r#"<circle class="predicted-marker" cx="{:.1}" cy="{:.1}" r="3" fill="{PREDICTED_LINE}"/>"#,
                frame.x(i),
                frame.y(v)
            ));
        }
    }
}

fn flush_segment(svg: &mut String, segment: &mut Vec<String>) {
    if segment.len() > 1 {
        svg.push_str(&format!(
            r#"<polyline class="predicted-line" points="{}" fill="none" stroke="{PREDICTED_LINE}" stroke-width="2"/>"#,
            segment.join(" ")
        ));
    }
    segment.clear();
}

fn draw_legend(svg: &mut String, frame: &Frame, with_predicted: bool) {
    let x = frame.width - MARGIN_RIGHT - 160.0;
    let y = MARGIN_TOP - 24.0;
    svg.push_str(&format!(
        r#"<rect x="{x:.1}" y="{:.1}" width="10" height="10" fill="{ACTUAL_UP}"/><text x="{:.1}" y="{:.1}" font-size="12" fill="{AXIS}">Actual</text>"#,
        y - 9.0,
        x + 14.0,
        y
    ));
    if with_predicted {
        svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="10" height="10" fill="{PREDICTED_UP}"/><text x="{:.1}" y="{:.1}" font-size="12" fill="{AXIS}">Predicted</text>"#,
            x + 70.0,
            y - 9.0,
            x + 84.0,
            y
        ));
    }
}

fn wrap_document(title: &str, frame: &Frame, body: &str) -> String {
    let title = escape_html(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>body {{ font-family: sans-serif; margin: 16px; background: #fff; }}</style>
</head>
<body>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<text x="{cx:.1}" y="24" font-size="16" text-anchor="middle" fill="{AXIS}">{title}</text>
{body}
</svg>
</body>
</html>
"#,
        w = frame.width,
        h = frame.height,
        cx = frame.width / 2.0,
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
