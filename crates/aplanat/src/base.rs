//! Base function for simple line, step and scatter plots.
use std::str::FromStr;

use plotly::common::{Line, LineShape, Marker, Mode};
use plotly::Scatter;
use serde::{Deserialize, Serialize};

use crate::error::{AplanatError, Result};
use crate::figure::{Figure, FigureOptions, Range1d};
use crate::util::{Bounds, Limiter};

/// Where the change in y value is placed on a step line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    #[default]
    Before,
    Center,
    After,
}

impl StepMode {
    fn line_shape(self) -> LineShape {
        match self {
            StepMode::Before => LineShape::Vh,
            StepMode::Center => LineShape::Hvh,
            StepMode::After => LineShape::Hv,
        }
    }
}

impl FromStr for StepMode {
    type Err = AplanatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "before" => Ok(StepMode::Before),
            "center" => Ok(StepMode::Center),
            "after" => Ok(StepMode::After),
            _ => Err(AplanatError::UnknownStyle(s.to_string())),
        }
    }
}

/// How each series of a simple plot is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Line,
    Points,
    Steps(StepMode),
}

impl FromStr for Style {
    type Err = AplanatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "line" => Ok(Style::Line),
            "points" => Ok(Style::Points),
            "steps" => Ok(Style::Steps(StepMode::default())),
            _ => Err(AplanatError::UnknownStyle(s.to_string())),
        }
    }
}

/// Per-series options shared by the simple plotting functions.
#[derive(Debug, Clone, Default)]
pub struct SeriesOptions {
    /// Legend name of each dataset.
    pub names: Option<Vec<String>>,
    /// Colour of each dataset, `"blue"` when absent.
    pub colors: Option<Vec<String>>,
    pub xlim: Bounds,
    pub ylim: Bounds,
    pub figure: FigureOptions,
}

impl SeriesOptions {
    pub fn with_figure(figure: FigureOptions) -> Self {
        Self {
            figure,
            ..Self::default()
        }
    }

    pub fn colors<S: AsRef<str>>(mut self, colors: &[S]) -> Self {
        self.colors = Some(colors.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    pub fn names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.names = Some(names.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    pub fn xlim(mut self, xlim: Bounds) -> Self {
        self.xlim = xlim;
        self
    }

    pub fn ylim(mut self, ylim: Bounds) -> Self {
        self.ylim = ylim;
        self
    }

    /// Resolve names and colours for `items` datasets, checking lengths.
    pub(crate) fn resolve(
        &self,
        items: usize,
        what: &str,
    ) -> Result<(Vec<Option<String>>, Vec<String>)> {
        let names: Vec<Option<String>> = match &self.names {
            Some(names) => names.iter().cloned().map(Some).collect(),
            None => vec![None; items],
        };
        let colors = match &self.colors {
            Some(colors) => colors.clone(),
            None => vec!["blue".to_string(); items],
        };
        if names.len() != items || colors.len() != items {
            return Err(AplanatError::LengthMismatch(what.to_string()));
        }
        Ok((names, colors))
    }
}

/// Create a simple line, step or scatter plot.
///
/// `x_datas` and `y_datas` hold one vector per dataset. The display range is
/// calculated from the data unless fixed by `xlim`/`ylim`.
pub fn simple(
    x_datas: &[Vec<f64>],
    y_datas: &[Vec<f64>],
    style: Style,
    opts: &SeriesOptions,
) -> Result<Figure> {
    let items = x_datas.len();
    if y_datas.len() != items {
        return Err(AplanatError::LengthMismatch(
            "x_datas, y_datas, names, and colors".into(),
        ));
    }
    let (names, colors) = opts.resolve(items, "x_datas, y_datas, names, and colors")?;

    let mut fig = Figure::new(opts.figure.clone());
    let mut x_lim = Limiter::new();
    let mut y_lim = Limiter::new();
    for (((x, y), name), color) in x_datas.iter().zip(y_datas).zip(names).zip(colors) {
        if x.len() != y.len() {
            return Err(AplanatError::LengthMismatch("x and y data of a series".into()));
        }
        x_lim.accumulate(x);
        y_lim.accumulate(y);
        let trace = Scatter::new(x.clone(), y.clone());
        let trace = match style {
            Style::Line => trace
                .mode(Mode::Lines)
                .line(Line::new().color(color).width(1.5)),
            Style::Points => trace
                .mode(Mode::Markers)
                .marker(Marker::new().color(color).opacity(0.4)),
            Style::Steps(mode) => trace
                .mode(Mode::Lines)
                .line(Line::new().color(color).width(1.5).shape(mode.line_shape())),
        };
        let trace = match name {
            Some(name) => trace.name(&name),
            None => trace.show_legend(false),
        };
        fig.add_trace(trace);
    }
    x_lim.fix_bounds(opts.xlim);
    y_lim.fix_bounds(opts.ylim);
    if !x_lim.is_finite() || !y_lim.is_finite() {
        return Err(AplanatError::EmptyData(
            "no finite values to derive plot limits from".into(),
        ));
    }
    fig.set_x_range(Range1d::bounded(x_lim.min, x_lim.max));
    fig.set_y_range(Range1d::bounded(y_lim.min, y_lim.max));
    Ok(fig)
}
