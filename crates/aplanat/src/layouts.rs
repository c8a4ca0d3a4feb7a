//! Creation of more complex plotting layouts.
use std::f64::consts::FRAC_PI_2;

use maud::{html, Markup, PreEscaped};
use polars::prelude::DataFrame;

use crate::base::SeriesOptions;
use crate::dataframe;
use crate::error::{AplanatError, Result};
use crate::figure::{Figure, FigureOptions, Range1d};
use crate::report::Component;
use crate::util::{choose_palette, script_json, Bounds};

/// A list of rows of fixed length.
#[derive(Debug, Clone)]
pub struct Grid<T> {
    width: usize,
    rows: Vec<Vec<T>>,
}

impl<T> Grid<T> {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            rows: vec![Vec::new()],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn add(&mut self, item: T) {
        if let Some(last) = self.rows.last_mut() {
            last.push(item);
            if last.len() == self.width {
                self.rows.push(Vec::new());
            }
        }
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.add(item);
        }
    }

    /// Non-empty rows.
    pub fn rows(&self) -> impl Iterator<Item = &Vec<T>> {
        self.rows.iter().filter(|r| !r.is_empty())
    }

    pub fn into_rows(self) -> Vec<Vec<T>> {
        self.rows.into_iter().filter(|r| !r.is_empty()).collect()
    }
}

/// Figures laid out in rows.
#[derive(Debug, Clone)]
pub struct PlotGrid {
    pub rows: Vec<Vec<Figure>>,
}

/// Arrange plots into a grid of `ncol` columns.
pub fn grid(plots: Vec<Figure>, ncol: usize) -> PlotGrid {
    let mut grid = Grid::new(ncol);
    grid.extend(plots);
    PlotGrid {
        rows: grid.into_rows(),
    }
}

impl Component for PlotGrid {
    fn render(&self, id: &str) -> Markup {
        html! {
            div id=(id) class="aplanat-grid" {
                @for (r, row) in self.rows.iter().enumerate() {
                    div style="display:flex;flex-wrap:nowrap;" {
                        @for (c, plot) in row.iter().enumerate() {
                            div { (plot.render(&format!("{}-{}-{}", id, r, c))) }
                        }
                    }
                }
            }
        }
    }
}

/// Components stacked vertically.
#[derive(Default)]
pub struct Stack {
    items: Vec<Box<dyn Component>>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<C: Component + 'static>(&mut self, item: C) {
        self.items.push(Box::new(item));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Component for Stack {
    fn render(&self, id: &str) -> Markup {
        html! {
            div id=(id) class="aplanat-stack" {
                @for (i, item) in self.items.iter().enumerate() {
                    (item.render(&format!("{}-{}", id, i)))
                }
            }
        }
    }
}

/// Components shown one at a time, selected by a row of tabs.
#[derive(Default)]
pub struct Tabs {
    panels: Vec<(String, Box<dyn Component>)>,
}

impl Tabs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<C: Component + 'static>(&mut self, title: &str, item: C) {
        self.panels.push((title.to_string(), Box::new(item)));
    }

    pub fn titles(&self) -> Vec<&str> {
        self.panels.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    fn script(id: &str) -> String {
        // plotly sizes hidden plots to zero, so redraw on show
        format!(
            "(function(){{var root=document.getElementById({id});\
             var links=root.querySelectorAll(':scope>ul [data-tab]');\
             var panes=root.querySelectorAll(':scope>.tab-content>.tab-pane');\
             links.forEach(function(link){{link.addEventListener('click',function(e){{e.preventDefault();\
             var target=link.getAttribute('data-tab');\
             links.forEach(function(l){{l.classList.toggle('active',l===link);}});\
             panes.forEach(function(p){{var on=p.id===target;p.classList.toggle('active',on);p.classList.toggle('show',on);\
             if(on){{p.querySelectorAll('.plotly-graph-div').forEach(function(g){{Plotly.Plots.resize(g);}});}}}});}});}});}})();",
            id = script_json(&serde_json::json!(id))
        )
    }
}

impl Component for Tabs {
    fn render(&self, id: &str) -> Markup {
        let pane = |i: usize| format!("{}-t{}", id, i);
        html! {
            div id=(id) class="aplanat-tabs" {
                ul class="nav nav-tabs" role="tablist" {
                    @for (i, (title, _)) in self.panels.iter().enumerate() {
                        li class="nav-item" {
                            a class=(if i == 0 { "nav-link active" } else { "nav-link" })
                                href=(format!("#{}", pane(i)))
                                data-tab=(pane(i))
                                role="tab" { (title) }
                        }
                    }
                }
                div class="tab-content" {
                    @for (i, (_, item)) in self.panels.iter().enumerate() {
                        div id=(pane(i))
                            class=(if i == 0 { "tab-pane fade show active" } else { "tab-pane fade" })
                            role="tabpanel" {
                            (item.render(&format!("{}-c", pane(i))))
                        }
                    }
                }
                script type="text/javascript" { (PreEscaped(Self::script(id))) }
            }
        }
    }
}

/// Column names to plot along x and y, with an optional colouring column.
#[derive(Debug, Clone, PartialEq)]
pub struct Aes {
    pub x: String,
    pub y: String,
    pub col: Option<String>,
}

impl Aes {
    pub fn new(x: &str, y: &str) -> Self {
        Self {
            x: x.to_string(),
            y: y.to_string(),
            col: None,
        }
    }

    pub fn colour(mut self, col: &str) -> Self {
        self.col = Some(col.to_string());
        self
    }
}

pub type Transform = Box<dyn Fn(&[f64]) -> Vec<f64>>;

/// Options of [`facet_grid`].
#[derive(Default)]
pub struct FacetOptions {
    pub xlim: Bounds,
    pub ylim: Bounds,
    /// Columns whose values split the data across grid columns and rows.
    pub facet: (Option<String>, Option<String>),
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub x_facet_heading: String,
    pub y_facet_heading: String,
    /// Applied to the (x, y) data of each facet before plotting.
    pub transform: (Option<Transform>, Option<Transform>),
    /// Synchronise pan and zoom between cells.
    pub link_axes: bool,
    /// Options for every cell figure.
    pub figure: FigureOptions,
}

impl FacetOptions {
    pub fn new() -> Self {
        Self {
            link_axes: true,
            ..Self::default()
        }
    }

    pub fn facet(mut self, x: Option<&str>, y: Option<&str>) -> Self {
        self.facet = (x.map(str::to_string), y.map(str::to_string));
        self
    }

    pub fn labels(mut self, x_axis_label: &str, y_axis_label: &str) -> Self {
        self.x_axis_label = x_axis_label.to_string();
        self.y_axis_label = y_axis_label.to_string();
        self
    }

    pub fn headings(mut self, x_facet_heading: &str, y_facet_heading: &str) -> Self {
        self.x_facet_heading = x_facet_heading.to_string();
        self.y_facet_heading = y_facet_heading.to_string();
        self
    }
}

/// Which side of a facet grid a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetAxis {
    X,
    Y,
}

/// A text cell of a facet layout; `angle` is in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetLabel {
    pub text: String,
    pub height: usize,
    pub width: usize,
    pub angle: f64,
    pub italic: bool,
}

impl FacetLabel {
    fn render(&self) -> Markup {
        let mut style = format!(
            "height:{}px;width:{}px;text-align:center;vertical-align:middle;",
            self.height, self.width
        );
        if self.angle > 0.0 {
            style.push_str("writing-mode:vertical-rl;");
        } else if self.angle < 0.0 {
            style.push_str("writing-mode:vertical-rl;transform:rotate(180deg);");
        }
        if self.italic {
            style.push_str("font-style:italic;");
        }
        html! { div style=(style) { (self.text) } }
    }
}

/// Create labels for a facet grid.
///
/// Returns `[facet header, axis label, facet label...]`. Labels on the x
/// side are 40px high and as wide as a plot; labels on the y side are 40px
/// wide, as high as a plot and rotated.
pub fn make_facet_labels<S: AsRef<str>>(
    facet_name: &str,
    facet_labels: &[S],
    axis_label: &str,
    facet: FacetAxis,
    base_height: usize,
    base_width: usize,
) -> Vec<FacetLabel> {
    let n = facet_labels.len();
    let (h, w, head_h, head_w, angle, axis_angle) = match facet {
        FacetAxis::X => (40, base_width, 40, n * base_width, 0.0, 0.0),
        FacetAxis::Y => (base_height, 40, n * base_height, 40, -FRAC_PI_2, FRAC_PI_2),
    };
    let label = |text: &str, height, width, angle, italic| FacetLabel {
        text: text.to_string(),
        height,
        width,
        angle,
        italic,
    };
    let mut labels = vec![
        label(facet_name, head_h, head_w, angle, false),
        label(axis_label, head_h, head_w, axis_angle, true),
    ];
    labels.extend(
        facet_labels
            .iter()
            .map(|l| label(l.as_ref(), h, w, angle, false)),
    );
    labels
}

/// A grid of plots split by facet values, with headers, labels and legend.
#[derive(Debug, Clone)]
pub struct FacetGrid {
    /// `cells[row][col]`, `None` where a facet combination has no data.
    pub cells: Vec<Vec<Option<Figure>>>,
    pub x_header: FacetLabel,
    pub x_axis_label: FacetLabel,
    pub x_labels: Vec<FacetLabel>,
    pub y_header: FacetLabel,
    pub y_axis_label: FacetLabel,
    pub y_labels: Vec<FacetLabel>,
    /// `(value, colour)` pairs, empty unless more than one colour is used.
    pub legend: Vec<(String, String)>,
    pub link_axes: bool,
}

impl FacetGrid {
    pub fn ncols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn nrows(&self) -> usize {
        self.cells.len()
    }

    pub fn plots(&self) -> impl Iterator<Item = &Figure> {
        self.cells.iter().flatten().flatten()
    }

    fn link_script(ids: &[String]) -> String {
        let ids = serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string());
        format!(
            "window.addEventListener('load',function(){{\
             var ids={ids};var syncing=false;\
             var keys=['xaxis.range[0]','xaxis.range[1]','yaxis.range[0]','yaxis.range[1]','xaxis.autorange','yaxis.autorange'];\
             ids.forEach(function(id){{var el=document.getElementById(id);if(!el||!el.on){{return;}}\
             el.on('plotly_relayout',function(ev){{if(syncing){{return;}}var upd={{}};\
             keys.forEach(function(k){{if(k in ev){{upd[k]=ev[k];}}}});\
             if(Object.keys(upd).length===0){{return;}}syncing=true;\
             Promise.all(ids.filter(function(o){{return o!==id;}}).map(function(o){{return Plotly.relayout(o,upd);}}))\
             .then(function(){{syncing=false;}});}});}});}});",
            ids = ids
        )
    }
}

impl Component for FacetGrid {
    fn render(&self, id: &str) -> Markup {
        let (ncols, nrows) = (self.ncols(), self.nrows());
        let cell_id = |r: usize, c: usize| format!("{}-{}-{}", id, r, c);
        let ids: Vec<String> = self
            .cells
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, p)| p.is_some())
                    .map(move |(c, _)| (r, c))
            })
            .map(|(r, c)| cell_id(r, c))
            .collect();
        html! {
            div id=(id) class="aplanat-facet" {
                table style="border-collapse:collapse;" {
                    @if ncols > 1 {
                        tr { td {} td colspan=(ncols) { (self.x_header.render()) } }
                        tr {
                            td {}
                            @for label in &self.x_labels { td { (label.render()) } }
                        }
                    }
                    @for (r, row) in self.cells.iter().enumerate() {
                        tr {
                            @if r == 0 {
                                td rowspan=(nrows) { (self.y_axis_label.render()) }
                            }
                            @for (c, cell) in row.iter().enumerate() {
                                td {
                                    @if let Some(plot) = cell {
                                        (plot.render(&cell_id(r, c)))
                                    }
                                }
                            }
                            @if nrows > 1 {
                                td { (self.y_labels[r].render()) }
                                @if r == 0 {
                                    td rowspan=(nrows) { (self.y_header.render()) }
                                }
                            }
                            @if r == 0 && !self.legend.is_empty() {
                                td rowspan=(nrows) style="vertical-align:top;padding-left:12px;" {
                                    ul style="list-style:none;padding:0;" {
                                        @for (value, colour) in &self.legend {
                                            li {
                                                span style={ "display:inline-block;width:12px;height:12px;margin-right:6px;background:" (colour) ";" } {}
                                                (value)
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    tr { td {} td colspan=(ncols) { (self.x_axis_label.render()) } }
                }
            }
            @if self.link_axes && ids.len() > 1 {
                script type="text/javascript" { (PreEscaped(Self::link_script(&ids))) }
            }
        }
    }
}

fn facet_values(df: &DataFrame, column: &Option<String>) -> Result<Vec<Option<String>>> {
    match column {
        Some(column) => Ok(dataframe::unique(df, column)?.into_iter().map(Some).collect()),
        None => Ok(vec![None]),
    }
}

fn facet_subset(df: &DataFrame, column: &Option<String>, value: &Option<String>) -> Result<DataFrame> {
    match (column, value) {
        (Some(column), Some(value)) => dataframe::filter_eq(df, column, value),
        _ => Ok(df.clone()),
    }
}

/// Create a facet-grid layout from a data frame.
///
/// The data are split by the unique values of the facet columns; each
/// non-empty facet is drawn by `plot_func` with one series per value of the
/// colouring column. All cells share the union of their axis ranges.
pub fn facet_grid<F>(df: &DataFrame, aes: &Aes, plot_func: F, opts: &FacetOptions) -> Result<FacetGrid>
where
    F: Fn(&[Vec<f64>], &[Vec<f64>], &SeriesOptions) -> Result<Figure>,
{
    let col_values: Vec<Option<String>> = facet_values(df, &aes.col)?;
    let palette = choose_palette(col_values.len())?;
    let facet_x_values = facet_values(df, &opts.facet.0)?;
    let facet_y_values = facet_values(df, &opts.facet.1)?;

    let mut plots: Vec<((usize, usize), Figure)> = Vec::new();
    for (px, fx) in facet_x_values.iter().enumerate() {
        for (py, fy) in facet_y_values.iter().enumerate() {
            let d = facet_subset(df, &opts.facet.0, fx)?;
            let d = facet_subset(&d, &opts.facet.1, fy)?;

            let mut x_data = Vec::new();
            let mut y_data = Vec::new();
            let mut colors = Vec::new();
            for (col, colour) in col_values.iter().zip(&palette) {
                let dcol = facet_subset(&d, &aes.col, col)?;
                if dcol.height() == 0 {
                    continue;
                }
                colors.push(colour.clone());
                let x = dataframe::floats(&dcol, &aes.x)?;
                let y = dataframe::floats(&dcol, &aes.y)?;
                x_data.push(match &opts.transform.0 {
                    Some(f) => f(&x),
                    None => x,
                });
                y_data.push(match &opts.transform.1 {
                    Some(f) => f(&y),
                    None => y,
                });
            }
            if x_data.is_empty() {
                continue;
            }
            let series = SeriesOptions {
                names: None,
                colors: Some(colors),
                xlim: opts.xlim,
                ylim: opts.ylim,
                figure: opts.figure.clone(),
            };
            plots.push(((px, py), plot_func(&x_data, &y_data, &series)?));
        }
    }
    if plots.is_empty() {
        return Err(AplanatError::EmptyData("no facet holds any data".into()));
    }

    share_ranges(&mut plots, |p| &mut p.x_range);
    share_ranges(&mut plots, |p| &mut p.y_range);

    let (ncols, nrows) = (facet_x_values.len(), facet_y_values.len());
    let (bh, bw) = (plots[0].1.height(), plots[0].1.width().unwrap_or(400));
    let mut cells: Vec<Vec<Option<Figure>>> = vec![vec![None; ncols]; nrows];
    for ((col, row), plot) in plots {
        cells[row][col] = Some(plot);
    }

    let names = |values: &[Option<String>]| -> Vec<String> {
        values.iter().map(|v| v.clone().unwrap_or_default()).collect()
    };
    let mut x = make_facet_labels(
        &opts.x_facet_heading,
        &names(&facet_x_values),
        &opts.x_axis_label,
        FacetAxis::X,
        bh,
        bw,
    )
    .into_iter();
    let mut y = make_facet_labels(
        &opts.y_facet_heading,
        &names(&facet_y_values),
        &opts.y_axis_label,
        FacetAxis::Y,
        bh,
        bw,
    )
    .into_iter();
    let (x_header, x_axis_label) = header_pair(&mut x)?;
    let (y_header, y_axis_label) = header_pair(&mut y)?;

    let legend = if col_values.len() > 1 {
        names(&col_values).into_iter().zip(palette).collect()
    } else {
        Vec::new()
    };
    log::debug!("Created facet grid of {} x {} cells", ncols, nrows);

    Ok(FacetGrid {
        cells,
        x_header,
        x_axis_label,
        x_labels: x.collect(),
        y_header,
        y_axis_label,
        y_labels: y.collect(),
        legend,
        link_axes: opts.link_axes,
    })
}

fn header_pair(labels: &mut impl Iterator<Item = FacetLabel>) -> Result<(FacetLabel, FacetLabel)> {
    match (labels.next(), labels.next()) {
        (Some(header), Some(axis)) => Ok((header, axis)),
        _ => Err(AplanatError::EmptyData("facet labels".into())),
    }
}

fn share_ranges<F>(plots: &mut [((usize, usize), Figure)], range: F)
where
    F: Fn(&mut Figure) -> &mut Option<Range1d>,
{
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (_, plot) in plots.iter_mut() {
        if let Some(r) = range(plot) {
            lo = lo.min(r.start);
            hi = hi.max(r.end);
        }
    }
    if lo.is_finite() && hi.is_finite() {
        for (_, plot) in plots.iter_mut() {
            *range(plot) = Some(Range1d::bounded(lo, hi));
        }
    }
}
