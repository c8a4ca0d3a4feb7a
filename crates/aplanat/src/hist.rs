//! Histogram-like plots.
use itertools_num::linspace;
use plotly::common::{Line, Mode};
use plotly::Scatter;
use serde::{Deserialize, Serialize};

use crate::base::SeriesOptions;
use crate::error::{AplanatError, Result};
use crate::figure::{polygon_trace, rect, Figure, Range1d};
use crate::util::Limiter;

/// `Bars` draws the classical histogram, `Line` a line per dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistStyle {
    #[default]
    Bars,
    Line,
}

#[derive(Debug, Clone)]
pub struct HistogramOptions {
    pub series: SeriesOptions,
    /// One weight vector per dataset.
    pub weights: Option<Vec<Vec<f64>>>,
    /// Normalise counts by the total weight across all datasets.
    pub normalize: bool,
    pub bins: usize,
    /// Overrides `bins` with a precise bin width.
    pub binwidth: Option<f64>,
    pub style: HistStyle,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            series: SeriesOptions::default(),
            weights: None,
            normalize: false,
            bins: 30,
            binwidth: None,
            style: HistStyle::Bars,
        }
    }
}

impl HistogramOptions {
    pub fn with_series(series: SeriesOptions) -> Self {
        Self {
            series,
            ..Self::default()
        }
    }
}

/// Bin edges spanning `[min, max]`.
///
/// With `binwidth` the edges step from `min` until just past `max`,
/// otherwise `bins` evenly spaced edges are produced. Either way there is
/// at least one bin, and equal `min` and `max` are widened by half a unit.
pub fn bin_edges(min: f64, max: f64, bins: usize, binwidth: Option<f64>) -> Vec<f64> {
    let (min, max) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    match binwidth {
        Some(width) if width > 0.0 => {
            let stop = max + 1e-10;
            let n = (((stop - min) / width).ceil() as usize).max(2);
            (0..n).map(|i| min + i as f64 * width).collect()
        }
        _ => linspace(min, max, bins.max(2)).collect(),
    }
}

/// Weighted counts per bin; the last bin includes its right edge and values
/// outside the edges are dropped.
pub fn histogram_counts(data: &[f64], weights: Option<&[f64]>, edges: &[f64]) -> Vec<f64> {
    let nbins = edges.len().saturating_sub(1);
    let mut counts = vec![0.0; nbins];
    let (first, last) = match (edges.first(), edges.last()) {
        (Some(f), Some(l)) if nbins > 0 => (*f, *l),
        _ => return counts,
    };
    for (i, &v) in data.iter().enumerate() {
        if v.is_nan() || v < first || v > last {
            continue;
        }
        let bin = if v == last {
            nbins - 1
        } else {
            edges.partition_point(|&e| e <= v) - 1
        };
        counts[bin] += weights.map_or(1.0, |w| w[i]);
    }
    counts
}

/// Create a histogram plot with one set of bars (or a line) per dataset.
pub fn histogram(datas: &[Vec<f64>], opts: &HistogramOptions) -> Result<Figure> {
    let items = datas.len();
    let what = "datas, weights, names, and colors";
    let (names, colors) = opts.series.resolve(items, what)?;
    if let Some(weights) = &opts.weights {
        let mismatched = weights.len() != items
            || weights.iter().zip(datas).any(|(w, d)| w.len() != d.len());
        if mismatched {
            return Err(AplanatError::LengthMismatch(what.into()));
        }
    }

    let mut x_lim = Limiter::new();
    for data in datas {
        x_lim.accumulate(data);
    }
    if !x_lim.is_finite() {
        return Err(AplanatError::EmptyData("histogram datasets are empty".into()));
    }
    let edges = bin_edges(x_lim.min, x_lim.max, opts.bins, opts.binwidth);
    if x_lim.min == x_lim.max {
        x_lim.accumulate(&[edges[0], edges[edges.len() - 1]]);
    }
    let total_weight: f64 = match &opts.weights {
        Some(weights) => weights.iter().flatten().sum(),
        None => datas.iter().map(|d| d.len() as f64).sum(),
    };

    let mut fig = Figure::new(opts.series.figure.clone());
    let mut y_lim = Limiter::new();
    if opts.style == HistStyle::Bars {
        y_lim.accumulate(&[0.0]);
    }
    for (i, ((data, name), color)) in datas.iter().zip(names).zip(colors).enumerate() {
        let weights = opts.weights.as_ref().map(|w| w[i].as_slice());
        let mut counts = histogram_counts(data, weights, &edges);
        if opts.normalize && total_weight > 0.0 {
            counts.iter_mut().for_each(|c| *c /= total_weight);
        }
        y_lim.accumulate(&counts);
        match opts.style {
            HistStyle::Bars => {
                let quads: Vec<Vec<(f64, f64)>> = counts
                    .iter()
                    .zip(edges.windows(2))
                    .map(|(&c, e)| rect(e[0], e[1], 0.0, c))
                    .collect();
                fig.add_trace(polygon_trace(&quads, &color, None, 0.6, name.as_deref()));
            }
            HistStyle::Line => {
                let left = edges[..edges.len() - 1].to_vec();
                let trace = Scatter::new(left, counts)
                    .mode(Mode::Lines)
                    .line(Line::new().color(color).width(1.5));
                let trace = match name {
                    Some(name) => trace.name(&name),
                    None => trace.show_legend(false),
                };
                fig.add_trace(trace);
            }
        }
    }
    x_lim.fix_bounds(opts.series.xlim);
    y_lim.fix_bounds(opts.series.ylim);
    fig.set_x_range(Range1d::bounded(x_lim.min, x_lim.max));
    fig.set_y_range(Range1d::bounded(y_lim.min, y_lim.max));
    Ok(fig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_from_bins_and_width() {
        let edges = bin_edges(0.0, 10.0, 11, None);
        assert_eq!(edges.len(), 11);
        assert_eq!(edges[1], 1.0);
        let edges = bin_edges(0.0, 1.0, 30, Some(0.25));
        assert_eq!(edges, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn counts_close_the_last_bin() {
        let edges = vec![0.0, 1.0, 2.0];
        let counts = histogram_counts(&[0.0, 0.5, 1.0, 2.0, 3.0, -1.0], None, &edges);
        assert_eq!(counts, vec![2.0, 2.0]);
        let counts = histogram_counts(&[0.5, 1.5], Some(&[2.0, 3.0]), &edges);
        assert_eq!(counts, vec![2.0, 3.0]);
    }

    #[test]
    fn normalised_counts_sum_to_one() {
        let opts = HistogramOptions {
            normalize: true,
            bins: 5,
            ..HistogramOptions::default()
        };
        let fig = histogram(&[vec![1.0, 2.0, 3.0], vec![2.0, 4.0]], &opts).unwrap();
        let y = fig.y_range.unwrap();
        assert_eq!(y.start, 0.0);
        assert!(y.end <= 1.0);
        assert_eq!(fig.trace_count(), 2);
    }

    #[test]
    fn identical_values_get_a_unit_wide_range() {
        let opts = HistogramOptions {
            bins: 3,
            ..HistogramOptions::default()
        };
        let fig = histogram(&[vec![5.0, 5.0, 5.0]], &opts).unwrap();
        let x = fig.x_range.unwrap();
        assert_eq!((x.start, x.end), (4.5, 5.5));
        assert_eq!(bin_edges(5.0, 5.0, 3, None), vec![4.5, 5.0, 5.5]);
        let counts = histogram_counts(&[5.0, 5.0, 5.0], None, &bin_edges(5.0, 5.0, 3, None));
        assert_eq!(counts, vec![0.0, 3.0]);
        assert_eq!(fig.y_range.unwrap().end, 3.0);
    }

    #[test]
    fn binwidth_sets_the_bins() {
        let opts = HistogramOptions {
            binwidth: Some(1.0),
            style: HistStyle::Line,
            ..HistogramOptions::default()
        };
        let fig = histogram(&[vec![0.0, 0.5, 1.5, 3.0]], &opts).unwrap();
        let y = fig.y_range.unwrap();
        assert_eq!((y.start, y.end), (1.0, 2.0));
        assert_eq!(bin_edges(0.0, 3.0, 30, Some(1.0)), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(bin_edges(0.0, 1.0, 30, Some(5.0)).len(), 2);
    }

    #[test]
    fn weights_must_match_datasets() {
        let opts = HistogramOptions {
            weights: Some(vec![vec![1.0]]),
            ..HistogramOptions::default()
        };
        assert!(histogram(&[vec![1.0, 2.0]], &opts).is_err());
    }
}
