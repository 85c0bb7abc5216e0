//! Chart layout and SVG rendering.
//!
//! A [`ChartSpec`] describes one figure as a list of panels in data terms.
//! [`render_svg`] lays the panels out, reduces them to drawing primitives
//! and renders those through the `chart.svg` template, which escapes every
//! label.

use askama::Template;

use crate::error::{Result, SharkwatchError};

const PANEL_WIDTH: f64 = 640.0;
const PANEL_HEIGHT: f64 = 420.0;
const TITLE_BAND: f64 = 56.0;
const TICKS: u32 = 5;
const MAX_LABEL_CHARS: usize = 28;

const AXIS_COLOR: &str = "#333333";
const GRID_COLOR: &str = "#dddddd";

/// Direction in which bars grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Bars grow upward from a category axis along the bottom
    #[default]
    Vertical,
    /// Bars grow rightward from a category axis along the left
    Horizontal,
}

/// How the panels of a figure are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Side by side
    #[default]
    Row,
    /// Stacked, each panel spanning the full width
    Column,
}

/// One bar of a bar panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: String,
}

impl Bar {
    pub fn new(label: impl Into<String>, value: f64, color: &str) -> Self {
        Self {
            label: label.into(),
            value,
            color: color.to_string(),
        }
    }
}

/// Dashed reference line across a bar panel at a fixed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    pub value: f64,
    pub color: String,
    pub label: String,
}

/// Categorical bar panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarPanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub orientation: Orientation,
    pub bars: Vec<Bar>,
    pub guides: Vec<Guide>,
    /// Appended to every value label, e.g. `%`
    pub value_suffix: String,
}

impl BarPanel {
    pub fn new(title: impl Into<String>, orientation: Orientation) -> Self {
        Self {
            title: title.into(),
            orientation,
            ..Self::default()
        }
    }

    /// Sets the axis titles.
    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_bars(mut self, bars: Vec<Bar>) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_guide(mut self, value: f64, color: &str, label: impl Into<String>) -> Self {
        self.guides.push(Guide {
            value,
            color: color.to_string(),
            label: label.into(),
        });
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.value_suffix = suffix.into();
        self
    }
}

/// Line panel over integer x positions (years).
#[derive(Debug, Clone, PartialEq)]
pub struct LinePanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(i64, f64)>,
    pub color: String,
}

/// Horizontal box-and-whisker panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPanel {
    pub title: String,
    pub x_label: String,
    pub summary: BoxSummary,
    pub color: String,
}

/// One panel of a figure.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Bars(BarPanel),
    Line(LinePanel),
    Box(BoxPanel),
}

/// A complete figure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartSpec {
    pub title: String,
    /// Annotation shown under the title
    pub subtitle: Option<String>,
    pub layout: Layout,
    pub panels: Vec<Panel>,
}

impl ChartSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_panel(mut self, panel: Panel) -> Self {
        self.panels.push(panel);
        self
    }
}

#[derive(Debug, Clone)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    fill: String,
}

#[derive(Debug, Clone)]
struct Line {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    stroke: String,
    dashed: bool,
}

#[derive(Debug, Clone)]
struct Label {
    x: f64,
    y: f64,
    anchor: &'static str,
    size: u32,
    bold: bool,
    rotate: f64,
    text: String,
}

#[derive(Debug, Clone)]
struct Polyline {
    points: String,
    stroke: String,
}

#[derive(Debug, Clone)]
struct Marker {
    cx: f64,
    cy: f64,
    fill: String,
}

#[derive(Template)]
#[template(path = "chart.svg", escape = "html")]
struct ChartTemplate<'a> {
    width: f64,
    height: f64,
    rects: &'a [Rect],
    lines: &'a [Line],
    labels: &'a [Label],
    polylines: &'a [Polyline],
    markers: &'a [Marker],
}

/// Rectangle in figure coordinates.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn inset(self, left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            x: self.x + left,
            y: self.y + top,
            width: (self.width - left - right).max(1.0),
            height: (self.height - top - bottom).max(1.0),
        }
    }

    fn right(self) -> f64 {
        self.x + self.width
    }

    fn bottom(self) -> f64 {
        self.y + self.height
    }

    fn center_x(self) -> f64 {
        self.x + self.width / 2.0
    }

    fn center_y(self) -> f64 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Default)]
struct Canvas {
    rects: Vec<Rect>,
    lines: Vec<Line>,
    labels: Vec<Label>,
    polylines: Vec<Polyline>,
    markers: Vec<Marker>,
}

impl Canvas {
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &str) {
        self.rects.push(Rect {
            x: round1(x),
            y: round1(y),
            width: round1(width.max(0.0)),
            height: round1(height.max(0.0)),
            fill: fill.to_string(),
        });
    }

    fn line(&mut self, (x1, y1): (f64, f64), (x2, y2): (f64, f64), stroke: &str, dashed: bool) {
        self.lines.push(Line {
            x1: round1(x1),
            y1: round1(y1),
            x2: round1(x2),
            y2: round1(y2),
            stroke: stroke.to_string(),
            dashed,
        });
    }

    fn text(&mut self, x: f64, y: f64, anchor: &'static str, size: u32, text: impl Into<String>) {
        self.labels.push(Label {
            x: round1(x),
            y: round1(y),
            anchor,
            size,
            bold: false,
            rotate: 0.0,
            text: text.into(),
        });
    }

    fn title(&mut self, x: f64, y: f64, size: u32, text: &str) {
        self.text(x, y, "middle", size, text);
        if let Some(label) = self.labels.last_mut() {
            label.bold = true;
        }
    }

    fn rotated(&mut self, x: f64, y: f64, anchor: &'static str, size: u32, rotate: f64, text: &str) {
        self.text(x, y, anchor, size, text);
        if let Some(label) = self.labels.last_mut() {
            label.rotate = rotate;
        }
    }

    fn no_data(&mut self, area: Frame) {
        self.text(area.center_x(), area.center_y(), "middle", 14, "No data");
    }
}

/// Renders a figure to an SVG document.
pub fn render_svg(chart: &ChartSpec) -> Result<String> {
    let count = chart.panels.len().max(1) as f64;
    let (width, height) = match chart.layout {
        Layout::Row => (PANEL_WIDTH * count, TITLE_BAND + PANEL_HEIGHT),
        Layout::Column => (PANEL_WIDTH * 1.5, TITLE_BAND + PANEL_HEIGHT * count),
    };

    let mut canvas = Canvas::default();
    canvas.title(width / 2.0, 26.0, 20, &chart.title);
    if let Some(subtitle) = &chart.subtitle {
        canvas.text(width / 2.0, 46.0, "middle", 12, subtitle.as_str());
    }

    for (index, panel) in chart.panels.iter().enumerate() {
        let offset = index as f64;
        let frame = match chart.layout {
            Layout::Row => Frame {
                x: PANEL_WIDTH * offset,
                y: TITLE_BAND,
                width: PANEL_WIDTH,
                height: PANEL_HEIGHT,
            },
            Layout::Column => Frame {
                x: 0.0,
                y: TITLE_BAND + PANEL_HEIGHT * offset,
                width,
                height: PANEL_HEIGHT,
            },
        };
        match panel {
            Panel::Bars(bars) => draw_bars(&mut canvas, frame, bars),
            Panel::Line(line) => draw_line(&mut canvas, frame, line),
            Panel::Box(boxed) => draw_box(&mut canvas, frame, boxed),
        }
    }

    let template = ChartTemplate {
        width: round1(width),
        height: round1(height),
        rects: &canvas.rects,
        lines: &canvas.lines,
        labels: &canvas.labels,
        polylines: &canvas.polylines,
        markers: &canvas.markers,
    };
    template
        .render()
        .map_err(|e| SharkwatchError::render(format!("chart '{}'", chart.title), e))
}

fn draw_bars(canvas: &mut Canvas, frame: Frame, panel: &BarPanel) {
    canvas.title(frame.center_x(), frame.y + 24.0, 14, &panel.title);
    let vertical = panel.orientation == Orientation::Vertical;
    let area = if vertical {
        frame.inset(70.0, 30.0, 44.0, 120.0)
    } else {
        frame.inset(190.0, 50.0, 44.0, 56.0)
    };
    draw_axis_titles(canvas, frame, area, &panel.x_label, &panel.y_label);

    if panel.bars.is_empty() {
        canvas.no_data(area);
        return;
    }

    let max = panel
        .bars
        .iter()
        .map(|bar| bar.value)
        .chain(panel.guides.iter().map(|guide| guide.value))
        .fold(0.0, f64::max);
    let scale_max = nice_ceiling(max);
    draw_value_grid(canvas, area, scale_max, vertical);

    let extent = if vertical { area.width } else { area.height };
    let slot = extent / panel.bars.len() as f64;
    let thickness = slot * 0.8;
    let gap = (slot - thickness) / 2.0;

    for (index, bar) in panel.bars.iter().enumerate() {
        let value_text = format_value(bar.value, &panel.value_suffix);
        let label = truncate_label(&bar.label);
        let start = index as f64 * slot + gap;
        if vertical {
            let length = area.height * bar.value.max(0.0) / scale_max;
            let x = area.x + start;
            let y = area.bottom() - length;
            canvas.rect(x, y, thickness, length, &bar.color);
            canvas.text(x + thickness / 2.0, y - 4.0, "middle", 10, value_text);
            canvas.rotated(x + thickness / 2.0, area.bottom() + 14.0, "end", 11, -40.0, &label);
        } else {
            let length = area.width * bar.value.max(0.0) / scale_max;
            let y = area.y + start;
            canvas.rect(area.x, y, length, thickness, &bar.color);
            canvas.text(area.x + length + 4.0, y + thickness / 2.0 + 4.0, "start", 10, value_text);
            canvas.text(area.x - 6.0, y + thickness / 2.0 + 4.0, "end", 11, label);
        }
    }

    for guide in &panel.guides {
        if vertical {
            let y = area.bottom() - area.height * guide.value / scale_max;
            canvas.line((area.x, y), (area.right(), y), &guide.color, true);
            canvas.text(area.right() - 2.0, y - 4.0, "end", 10, guide.label.as_str());
        } else {
            let x = area.x + area.width * guide.value / scale_max;
            canvas.line((x, area.y), (x, area.bottom()), &guide.color, true);
            canvas.text(x + 2.0, area.y - 4.0, "start", 10, guide.label.as_str());
        }
    }

    draw_axes(canvas, area);
}

fn draw_line(canvas: &mut Canvas, frame: Frame, panel: &LinePanel) {
    canvas.title(frame.center_x(), frame.y + 24.0, 14, &panel.title);
    let area = frame.inset(70.0, 30.0, 44.0, 64.0);
    draw_axis_titles(canvas, frame, area, &panel.x_label, &panel.y_label);

    let (Some(first), Some(last)) = (
        panel.points.iter().map(|(x, _)| *x).min(),
        panel.points.iter().map(|(x, _)| *x).max(),
    ) else {
        canvas.no_data(area);
        return;
    };
    let (low, high) = if first == last {
        (first - 1, last + 1)
    } else {
        (first, last)
    };
    let span = (high - low) as f64;
    let max = panel.points.iter().map(|(_, y)| *y).fold(0.0, f64::max);
    let scale_max = nice_ceiling(max);
    draw_value_grid(canvas, area, scale_max, true);

    let x_at = |x: i64| area.x + area.width * (x - low) as f64 / span;
    let y_at = |y: f64| area.bottom() - area.height * y.max(0.0) / scale_max;

    let step = ((high - low) as f64 / 6.0).ceil().max(1.0) as i64;
    let mut tick = low;
    while tick <= high {
        let x = x_at(tick);
        canvas.line((x, area.bottom()), (x, area.bottom() + 5.0), AXIS_COLOR, false);
        canvas.text(x, area.bottom() + 18.0, "middle", 10, tick.to_string());
        tick += step;
    }

    let points: Vec<String> = panel
        .points
        .iter()
        .map(|(x, y)| format!("{},{}", round1(x_at(*x)), round1(y_at(*y))))
        .collect();
    canvas.polylines.push(Polyline {
        points: points.join(" "),
        stroke: panel.color.clone(),
    });
    for (x, y) in &panel.points {
        canvas.markers.push(Marker {
            cx: round1(x_at(*x)),
            cy: round1(y_at(*y)),
            fill: panel.color.clone(),
        });
    }

    draw_axes(canvas, area);
}

fn draw_box(canvas: &mut Canvas, frame: Frame, panel: &BoxPanel) {
    canvas.title(frame.center_x(), frame.y + 24.0, 14, &panel.title);
    let area = frame.inset(40.0, 40.0, 44.0, 64.0);
    draw_axis_titles(canvas, frame, area, &panel.x_label, "");

    let summary = panel.summary;
    let scale_max = nice_ceiling(summary.max);
    draw_value_grid(canvas, area, scale_max, false);

    let x_at = |value: f64| area.x + area.width * value.max(0.0) / scale_max;
    let center = area.center_y();
    let half = area.height * 0.18;

    canvas.line((x_at(summary.min), center), (x_at(summary.q1), center), AXIS_COLOR, false);
    canvas.line((x_at(summary.q3), center), (x_at(summary.max), center), AXIS_COLOR, false);
    for cap in [summary.min, summary.max] {
        let x = x_at(cap);
        canvas.line((x, center - half / 2.0), (x, center + half / 2.0), AXIS_COLOR, false);
    }
    canvas.rect(
        x_at(summary.q1),
        center - half,
        x_at(summary.q3) - x_at(summary.q1),
        half * 2.0,
        &panel.color,
    );
    let median = x_at(summary.median);
    canvas.line((median, center - half), (median, center + half), "#c0392b", false);
    canvas.text(
        median,
        center - half - 8.0,
        "middle",
        11,
        format!("median {}", format_value(summary.median, "")),
    );

    draw_axes(canvas, area);
}

fn draw_axis_titles(canvas: &mut Canvas, frame: Frame, area: Frame, x_label: &str, y_label: &str) {
    if !x_label.is_empty() {
        canvas.text(area.center_x(), frame.bottom() - 10.0, "middle", 12, x_label);
    }
    if !y_label.is_empty() {
        canvas.rotated(frame.x + 18.0, area.center_y(), "middle", 12, -90.0, y_label);
    }
}

/// Gridlines and tick labels along the value axis.
fn draw_value_grid(canvas: &mut Canvas, area: Frame, scale_max: f64, vertical: bool) {
    for step in 0..=TICKS {
        let fraction = f64::from(step) / f64::from(TICKS);
        let value = format_value(scale_max * fraction, "");
        if vertical {
            let y = area.bottom() - area.height * fraction;
            canvas.line((area.x, y), (area.right(), y), GRID_COLOR, false);
            canvas.text(area.x - 6.0, y + 4.0, "end", 10, value);
        } else {
            let x = area.x + area.width * fraction;
            canvas.line((x, area.y), (x, area.bottom()), GRID_COLOR, false);
            canvas.text(x, area.bottom() + 16.0, "middle", 10, value);
        }
    }
}

fn draw_axes(canvas: &mut Canvas, area: Frame) {
    canvas.line((area.x, area.y), (area.x, area.bottom()), AXIS_COLOR, false);
    canvas.line((area.x, area.bottom()), (area.right(), area.bottom()), AXIS_COLOR, false);
}

/// Smallest 1, 2 or 5 times a power of ten at or above `max`.
pub fn nice_ceiling(max: f64) -> f64 {
    if !max.is_finite() || max <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(max.log10().floor());
    let normalized = max / magnitude;
    let step = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    step * magnitude
}

fn format_value(value: f64, suffix: &str) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}{}", value, suffix)
    } else {
        format!("{:.1}{}", value, suffix)
    }
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let mut short: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
    short.push('…');
    short
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
