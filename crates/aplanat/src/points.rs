//! Plotting points.
use crate::base::{simple, SeriesOptions, Style};
use crate::error::Result;
use crate::figure::Figure;

/// Create a simple scatter plot, one set of markers per dataset.
pub fn points(x_datas: &[Vec<f64>], y_datas: &[Vec<f64>], opts: &SeriesOptions) -> Result<Figure> {
    simple(x_datas, y_datas, Style::Points, opts)
}
