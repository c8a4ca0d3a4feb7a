//! aplanat: plotting helpers and HTML report assembly.
//!
//! The crate wraps plotly figures behind a small set of high-level plotting
//! functions (lines, points, histograms, bars, heatmaps, karyotypes) that
//! take plain vectors and compute sensible axis ranges. Figures, grids,
//! facet layouts, tables and infographics can then be collected into
//! [`report::HtmlReport`]s and written as standalone HTML pages.
//!
//! Ready-made report sections for common bioinformatics outputs live in
//! [`components`], with parsers for the tool outputs they read in
//! [`parsers`].
pub mod annot;
pub mod bars;
pub mod base;
pub mod bio;
pub mod components;
pub mod dataframe;
pub mod error;
pub mod export;
pub mod figure;
pub mod graphics;
pub mod hist;
pub mod icons;
pub mod layouts;
pub mod lines;
pub mod palettes;
pub mod parsers;
pub mod points;
pub mod report;
pub mod spatial;
pub mod util;

pub use error::{AplanatError, Result};
pub use export::{dump_json, export_jsx, json_item, save_html, Background};
pub use figure::{Figure, FigureOptions, Range1d};
pub use layouts::{facet_grid, grid, Grid};
pub use polars::prelude::DataFrame;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
