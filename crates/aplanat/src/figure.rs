//! The figure type shared by all plotting helpers.
//!
//! A [`Figure`] owns the plotly traces of a chart together with the
//! figure-level state the helpers need to adjust after creation: sizes,
//! axis ranges, tick overrides, subtitles and vertical markers. The plotly
//! layout is derived from that state whenever the figure is rendered.
use maud::{html, PreEscaped};
use plotly::common::{Fill, Font, Line, Mode};
use plotly::layout::{Annotation, Axis, Layout, Shape, ShapeLine, ShapeType};
use plotly::{Plot, Scatter, Trace};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::util::script_json;

/// An axis range with optional pan/zoom bounds.
///
/// Bounds are written to the figure as the axis `minallowed` and
/// `maxallowed` limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range1d {
    pub start: f64,
    pub end: f64,
    pub bounds: Option<(f64, f64)>,
}

impl Range1d {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            bounds: None,
        }
    }

    /// A range whose bounds equal its extent.
    pub fn bounded(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            bounds: Some((start, end)),
        }
    }
}

/// Figure-level presentation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureOptions {
    pub title: Option<String>,
    /// Fixed width in pixels; `None` lets the figure stretch to its container.
    pub width: Option<usize>,
    pub height: usize,
    pub x_axis_label: Option<String>,
    pub y_axis_label: Option<String>,
    pub show_x_axis: bool,
    pub show_y_axis: bool,
    pub show_grid: bool,
    pub show_legend: Option<bool>,
    pub background: Option<String>,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            title: None,
            width: Some(600),
            height: 300,
            x_axis_label: None,
            y_axis_label: None,
            show_x_axis: true,
            show_y_axis: true,
            show_grid: true,
            show_legend: None,
            background: None,
        }
    }
}

impl FigureOptions {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    /// A copy of these options with a new title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_labels(mut self, x_axis_label: &str, y_axis_label: &str) -> Self {
        self.x_axis_label = Some(x_axis_label.to_string());
        self.y_axis_label = Some(y_axis_label.to_string());
        self
    }

    pub fn with_size(mut self, width: Option<usize>, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Explicit tick positions and their labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticks {
    pub values: Vec<f64>,
    pub labels: Vec<String>,
}

/// A vertical line spanning the plot height.
#[derive(Debug, Clone, PartialEq)]
pub struct VLine {
    pub x: f64,
    pub color: String,
    pub width: f64,
    pub label: Option<String>,
}

/// Text placed in paper coordinates (0..1 on both axes).
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Clone)]
pub struct Figure {
    plot: Plot,
    n_traces: usize,
    pub options: FigureOptions,
    pub x_range: Option<Range1d>,
    pub y_range: Option<Range1d>,
    pub x_ticks: Option<Ticks>,
    pub y_ticks: Option<Ticks>,
    pub subtitle: Option<String>,
    vlines: Vec<VLine>,
    notes: Vec<Note>,
}

impl std::fmt::Debug for Figure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Figure")
            .field("options", &self.options)
            .field("traces", &self.n_traces)
            .field("x_range", &self.x_range)
            .field("y_range", &self.y_range)
            .finish()
    }
}

impl Default for Figure {
    fn default() -> Self {
        Self::new(FigureOptions::default())
    }
}

impl Figure {
    pub fn new(options: FigureOptions) -> Self {
        Self {
            plot: Plot::new(),
            n_traces: 0,
            options,
            x_range: None,
            y_range: None,
            x_ticks: None,
            y_ticks: None,
            subtitle: None,
            vlines: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// An empty figure explaining that a plot could not be created.
    pub fn failed(name: &str, reason: &str) -> Self {
        let mut fig = Self::new(FigureOptions {
            title: Some(format!("Failed to create plot: {}", name)),
            show_x_axis: false,
            show_y_axis: false,
            show_grid: false,
            ..FigureOptions::default()
        });
        fig.notes.push(Note {
            x: 0.5,
            y: 0.5,
            text: reason.to_string(),
        });
        fig
    }

    pub fn add_trace(&mut self, trace: Box<dyn Trace>) {
        self.plot.add_trace(trace);
        self.n_traces += 1;
    }

    pub fn trace_count(&self) -> usize {
        self.n_traces
    }

    pub fn set_x_range(&mut self, range: Range1d) {
        self.x_range = Some(range);
    }

    pub fn set_y_range(&mut self, range: Range1d) {
        self.y_range = Some(range);
    }

    pub fn width(&self) -> Option<usize> {
        self.options.width
    }

    pub fn height(&self) -> usize {
        self.options.height
    }

    pub fn add_vline(&mut self, vline: VLine) {
        self.vlines.push(vline);
    }

    pub fn vlines(&self) -> &[VLine] {
        &self.vlines
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    fn title_text(&self) -> Option<String> {
        match (&self.options.title, &self.subtitle) {
            (Some(t), Some(s)) => Some(format!("{}<br><sup><i>{}</i></sup>", t, s)),
            (None, Some(s)) => Some(format!("<sup><i>{}</i></sup>", s)),
            (Some(t), None) => Some(t.clone()),
            (None, None) => None,
        }
    }

    fn axis(
        label: &Option<String>,
        range: &Option<Range1d>,
        ticks: &Option<Ticks>,
        visible: bool,
        show_grid: bool,
    ) -> Axis {
        let mut axis = Axis::new().visible(visible).show_grid(show_grid);
        if let Some(label) = label {
            axis = axis.title(label.as_str());
        }
        if let Some(range) = range {
            axis = axis.range(vec![range.start, range.end]);
        }
        if let Some(ticks) = ticks {
            axis = axis
                .tick_values(ticks.values.clone())
                .tick_text(ticks.labels.clone());
        }
        axis
    }

    /// Build the plotly layout from the figure state.
    pub fn layout(&self) -> Layout {
        let opts = &self.options;
        let mut layout = Layout::new()
            .height(opts.height)
            .x_axis(Self::axis(
                &opts.x_axis_label,
                &self.x_range,
                &self.x_ticks,
                opts.show_x_axis,
                opts.show_grid,
            ))
            .y_axis(Self::axis(
                &opts.y_axis_label,
                &self.y_range,
                &self.y_ticks,
                opts.show_y_axis,
                opts.show_grid,
            ));
        layout = match opts.width {
            Some(width) => layout.width(width),
            None => layout.auto_size(true),
        };
        if let Some(title) = self.title_text() {
            layout = layout.title(title.as_str());
        }
        if let Some(show) = opts.show_legend {
            layout = layout.show_legend(show);
        }
        if let Some(bg) = &opts.background {
            layout = layout
                .plot_background_color(bg.clone())
                .paper_background_color(bg.clone());
        }
        for vline in &self.vlines {
            layout.add_shape(
                Shape::new()
                    .shape_type(ShapeType::Line)
                    .x_ref("x")
                    .y_ref("paper")
                    .x0(vline.x)
                    .x1(vline.x)
                    .y0(0.0)
                    .y1(1.0)
                    .line(ShapeLine::new().color(vline.color.clone()).width(vline.width)),
            );
            if let Some(label) = &vline.label {
                layout.add_annotation(
                    Annotation::new()
                        .x_ref("x")
                        .y_ref("paper")
                        .x(vline.x)
                        .y(0.5)
                        .text(label.as_str())
                        .text_angle(-90.0)
                        .show_arrow(false)
                        .font(Font::new().color(vline.color.clone())),
                );
            }
        }
        for note in &self.notes {
            layout.add_annotation(
                Annotation::new()
                    .x_ref("paper")
                    .y_ref("paper")
                    .x(note.x)
                    .y(note.y)
                    .text(note.text.as_str())
                    .show_arrow(false),
            );
        }
        layout
    }

    /// A plotly plot holding the traces and the derived layout.
    pub fn to_plot(&self) -> Plot {
        let mut plot = self.plot.clone();
        plot.set_layout(self.layout());
        plot
    }

    /// The plot document (data, layout and config) with axis bounds applied.
    pub fn to_value(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self.to_plot())?;
        for (axis, range) in [("xaxis", &self.x_range), ("yaxis", &self.y_range)] {
            if let Some((low, high)) = range.and_then(|r| r.bounds) {
                value["layout"][axis]["minallowed"] = json!(low);
                value["layout"][axis]["maxallowed"] = json!(high);
            }
        }
        Ok(value)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(self.to_value()?.to_string())
    }

    /// HTML fragment (div and script) drawing the figure into `div_id`.
    ///
    /// The page must load plotly.js.
    pub fn to_inline_html(&self, div_id: &str) -> Result<String> {
        let doc = script_json(&self.to_value()?);
        let call = format!("Plotly.newPlot({}, {});", script_json(&json!(div_id)), doc);
        let markup = html! {
            div id=(div_id) class="plotly-graph-div" style="height:100%; width:100%;" {}
            script type="text/javascript" { (PreEscaped(call)) }
        };
        Ok(markup.into_string())
    }
}

/// A single trace drawing filled polygons.
///
/// Polygons are separated by gaps so that each is filled independently,
/// mirroring quad and rect glyphs.
pub(crate) fn polygon_trace(
    polygons: &[Vec<(f64, f64)>],
    fill: &str,
    line_color: Option<&str>,
    opacity: f64,
    name: Option<&str>,
) -> Box<Scatter<Option<f64>, Option<f64>>> {
    let mut xs = Vec::with_capacity(polygons.len() * 6);
    let mut ys = Vec::with_capacity(polygons.len() * 6);
    for polygon in polygons {
        for &(x, y) in polygon {
            xs.push(Some(x));
            ys.push(Some(y));
        }
        if let Some(&(x, y)) = polygon.first() {
            xs.push(Some(x));
            ys.push(Some(y));
        }
        xs.push(None);
        ys.push(None);
    }
    let line = match line_color {
        Some(color) => Line::new().color(color.to_string()).width(1.0),
        None => Line::new().color(fill.to_string()).width(0.0),
    };
    let trace = Scatter::new(xs, ys)
        .mode(Mode::Lines)
        .fill(Fill::ToSelf)
        .fill_color(fill.to_string())
        .opacity(opacity)
        .line(line);
    match name {
        Some(name) => trace.name(name),
        None => trace.show_legend(false),
    }
}

/// Axis-aligned rectangle as a polygon.
pub(crate) fn rect(left: f64, right: f64, bottom: f64, top: f64) -> Vec<(f64, f64)> {
    vec![(left, bottom), (left, top), (right, top), (right, bottom)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtitle_is_folded_into_title() {
        let mut fig = Figure::new(FigureOptions::titled("Lengths"));
        fig.subtitle = Some("Mean: 3".into());
        assert_eq!(
            fig.title_text().as_deref(),
            Some("Lengths<br><sup><i>Mean: 3</i></sup>")
        );
    }

    #[test]
    fn ranges_reach_the_layout_json() {
        let mut fig = Figure::default();
        fig.add_trace(Scatter::new(vec![0.0, 1.0], vec![2.0, 3.0]));
        fig.set_x_range(Range1d::bounded(-1.0, 4.0));
        let json = fig.to_json().unwrap();
        assert!(json.contains("\"range\":[-1.0,4.0]"), "{}", json);
        assert_eq!(fig.trace_count(), 1);
    }

    #[test]
    fn bounds_limit_pan_and_zoom() {
        let mut fig = Figure::default();
        fig.set_x_range(Range1d::bounded(-1.0, 4.0));
        fig.set_y_range(Range1d::new(0.0, 2.0));
        let doc = fig.to_value().unwrap();
        assert_eq!(doc["layout"]["xaxis"]["minallowed"], -1.0);
        assert_eq!(doc["layout"]["xaxis"]["maxallowed"], 4.0);
        assert!(doc["layout"]["yaxis"].get("minallowed").is_none());
        let html = fig.to_inline_html("fig-1").unwrap();
        assert!(html.contains("<div id=\"fig-1\""));
        assert!(html.contains("Plotly.newPlot(\"fig-1\", {"));
    }

    #[test]
    fn failed_figure_carries_reason() {
        let fig = Figure::failed("lengths", "no data");
        assert_eq!(fig.notes()[0].text, "no data");
        assert!(!fig.options.show_x_axis);
    }
}
