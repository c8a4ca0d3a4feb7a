//! Report components for per-read summaries written by fastcat.
use std::collections::BTreeMap;
use std::path::Path;

use polars::prelude::{BooleanChunked, DataFrame};
use statrs::statistics::Statistics;

use crate::annot;
use crate::bars::simple_bar;
use crate::base::SeriesOptions;
use crate::components::section_or_new;
use crate::dataframe;
use crate::error::{AplanatError, Result};
use crate::figure::{Figure, FigureOptions};
use crate::hist::{histogram, HistogramOptions};
use crate::layouts::grid;
use crate::report::HtmlSection;
use crate::util::{quantile, read_files, Bounds, Colors};

pub const FULL_REPORT_HEADER: &str = "
### Read summary

The following tables and figures are derived from
the output of [fastcat](https://github.com/epi2me-labs/fastcat).
";

fn mean_and_median(values: &[f64]) -> Result<(f64, f64)> {
    if values.is_empty() {
        return Err(AplanatError::EmptyData("no reads".into()));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok((Statistics::mean(values), quantile(&sorted, 0.5)))
}

fn cerulean_histogram(values: &[f64], figure: FigureOptions, xlim: Bounds) -> Result<Figure> {
    let series = SeriesOptions::with_figure(figure)
        .colors(&[Colors::CERULEAN])
        .xlim(xlim);
    let opts = HistogramOptions {
        bins: 100,
        ..HistogramOptions::with_series(series)
    };
    histogram(&[values.to_vec()], &opts)
}

/// Create a read length histogram.
///
/// `min_len` and `max_len` only annotate the plot; the data are not
/// filtered. `base` supplies size and presentation; title and axis labels
/// are set here.
pub fn read_length_plot(
    summary: &DataFrame,
    min_len: Option<f64>,
    max_len: Option<f64>,
    xlim: Bounds,
    base: &FigureOptions,
) -> Result<Figure> {
    let lengths = dataframe::floats(summary, "read_length")?;
    let (mean, median) = mean_and_median(&lengths)?;
    let figure = base
        .clone()
        .with_title("Read length distribution.")
        .with_labels("Read Length / bases", "Number of reads");
    let mut plot = cerulean_histogram(&lengths, figure, xlim)?;
    if let Some(min_len) = min_len {
        plot = annot::marker_vline(plot, min_len, Some(format!("Min: {}", min_len).as_str()), "grey", 1.5);
    }
    if let Some(max_len) = max_len {
        plot = annot::marker_vline(plot, max_len, Some(format!("Max: {}", max_len).as_str()), "black", 1.5);
    }
    Ok(annot::subtitle(
        plot,
        &format!("Mean: {:.0}. Median: {:.0}", mean, median),
    ))
}

/// Create a read quality histogram.
pub fn read_quality_plot(summary: &DataFrame, base: &FigureOptions) -> Result<Figure> {
    let quals = dataframe::floats(summary, "mean_quality")?;
    let (mean, median) = mean_and_median(&quals)?;
    let figure = base
        .clone()
        .with_title("Read quality score")
        .with_labels("Quality score", "Number of reads");
    let plot = cerulean_histogram(&quals, figure, (Some(4.0), Some(25.0)))?;
    Ok(annot::subtitle(
        plot,
        &format!("Mean: {:.0}. Median: {:.0}", mean, median),
    ))
}

/// Create a bar plot of read counts per sample, optionally counting only
/// reads strictly between `min_len` and `max_len`.
pub fn sample_read_counts(
    summary: &DataFrame,
    min_len: Option<f64>,
    max_len: Option<f64>,
    base: &FigureOptions,
) -> Result<Figure> {
    let lengths = dataframe::floats(summary, "read_length")?;
    let mask: BooleanChunked = lengths
        .iter()
        .map(|&l| min_len.map_or(true, |m| l > m) && max_len.map_or(true, |m| l < m))
        .collect();
    let filtered = summary.filter(&mask)?;

    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    for sample in dataframe::labels(&filtered, "sample_name")? {
        *counts.entry(sample).or_default() += 1.0;
    }

    let mut title = "Number of reads per barcode".to_string();
    if min_len.is_some() || max_len.is_some() {
        let t0 = min_len.map_or(String::new(), |m| format!("{} < ", m));
        let t1 = max_len.map_or(String::new(), |m| format!(" > {}", m));
        title.push_str(&format!(" (filtered by {}length{}).", t0, t1));
    }
    let samples: Vec<String> = counts.keys().cloned().collect();
    let values: Vec<f64> = counts.values().copied().collect();
    let colors = vec![Colors::CERULEAN.to_string(); samples.len()];
    let figure = FigureOptions {
        width: None,
        ..base.clone().with_title(&title)
    };
    simple_bar(&samples, &values, Some(colors.as_slice()), &figure)
}

/// Create a report section from one or more fastcat per-read outputs.
pub fn full_report<P: AsRef<Path>>(
    stats: &[P],
    header: Option<&str>,
    section: Option<HtmlSection>,
    sample_counts: bool,
    min_len: Option<f64>,
    max_len: Option<f64>,
    figure: &FigureOptions,
) -> anyhow::Result<HtmlSection> {
    let summary = read_files(stats, b'\t')?;
    log::info!("Read {} records from {} file(s)", summary.height(), stats.len());
    let mut section = section_or_new(section);
    section.markdown(header.unwrap_or(FULL_REPORT_HEADER), None)?;

    let mut plots = vec![
        read_length_plot(&summary, min_len, max_len, (Some(0.0), None), figure)?,
        read_quality_plot(&summary, figure)?,
    ];
    if sample_counts {
        plots.push(sample_read_counts(&summary, min_len, max_len, figure)?);
    }
    section.grid(grid(plots, 2), None)?;
    Ok(section)
}
