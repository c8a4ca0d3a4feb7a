//! A tabbed dashboard of alignment statistics from mapula's JSON output.
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use maud::html;
use plotly::common::{Line, Marker, Mode};
use plotly::{Pie, Scatter};
use serde::Deserialize;

use crate::annot;
use crate::bars::simple_bar;
use crate::base::SeriesOptions;
use crate::components::section_or_new;
use crate::dataframe;
use crate::error::{AplanatError, Result};
use crate::figure::{Figure, FigureOptions};
use crate::hist::{histogram, HistogramOptions};
use crate::layouts::{grid, Stack, Tabs};
use crate::points::points;
use crate::report::{HtmlSection, RawHtml};
use crate::util::{choose_palette, Bounds, Colors};

const SUMMARY_TEXT: &str = "This report contains visualisations of statistics that can help in \
understanding the results from the wf-alignment workflow. Each tab above contains a different \
type of plot, and in general the results are broken down by the reference genome to which \
alignments were made. On this tab, the donut plot displays the proportion of mapped to \
unmapped reads (hover over for counts) and the bar charts give a breakdown of the different \
alignment types per-reference.";

const ACCURACY_TEXT: &str = "This tab contains visualisations of percentage alignment accuracy \
broken down by aligned reference. Naturally, no accuracy measurements are available for \
unmapped reads.";

const QUALITY_TEXT: &str = "This tab contains visualisations of avg read quality. Each data point \
represents the mean per-base Phred quality score for a given read. Quality scores are related \
to the underlying error probabilities.";

const LENGTH_TEXT: &str = "This tab contains visualisations of read length. The n50 is defined \
as the length N for which 50 percent of all bases in the sequence are in a sequence of length \
L < N.";

const COVERAGE_TEXT: &str = "This tab contains visualisations of reference-coverage (i.e. the \
proportion of the reference that a given alignment covers ex. soft-clipping). The cov80 gives \
the number of alignments which cover more than 80 percent of the reference.";

const CONTROL_TEXT: &str = "This tab becomes available if you have supplied an expected counts \
csv to the wf-alignment workflow. Providing expected counts permits us to calculate the \
correlation between the number of observations for each of a given set of reference sequences \
against their expected counts.";

/// Alignment statistics of one reference, barcode or run.
///
/// Histogram fields hold counts per bin: accuracies and qualities in
/// steps of 0.1, coverages in steps of 1 percent and read lengths in steps
/// of 50 bases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MappingStats {
    pub source: Option<String>,
    pub fasta: Option<String>,
    pub run_id: Option<String>,
    pub barcode: Option<String>,
    pub reference: Option<String>,
    pub read_group: Option<String>,
    pub observations: f64,
    pub primary_count: f64,
    pub secondary_count: f64,
    pub supplementary_count: f64,
    pub base_pairs: f64,
    pub alignment_accuracies: Vec<f64>,
    pub median_accuracy: Option<f64>,
    pub alignment_coverages: Vec<f64>,
    pub cov80_count: f64,
    pub cov80_percent: f64,
    pub aligned_qualities: Vec<f64>,
    pub median_quality: Option<f64>,
    pub read_lengths: Vec<f64>,
    pub read_n50: Option<f64>,
    pub observed_references: BTreeMap<String, f64>,
    pub observed_reference_count: f64,
    pub spearmans_rho: Option<f64>,
    pub spearmans_rho_pval: Option<f64>,
    pub pearson: Option<f64>,
    pub pearson_pval: Option<f64>,
}

impl MappingStats {
    /// Identifying fields, in display order, joined for a plot title.
    fn ident(&self) -> Option<String> {
        let parts: Vec<&str> = [
            &self.source,
            &self.fasta,
            &self.run_id,
            &self.barcode,
            &self.reference,
            &self.read_group,
        ]
        .iter()
        .filter_map(|f| f.as_deref())
        .filter(|f| !f.is_empty())
        .collect();
        (!parts.is_empty()).then(|| parts.join(" / "))
    }
}

/// Load mapula's JSON output: statistics keyed by grouping name.
pub fn load_data<P: AsRef<Path>>(path: P) -> anyhow::Result<BTreeMap<String, MappingStats>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Path {} cannot be opened", path.display()))?;
    let data = serde_json::from_str(&text)
        .with_context(|| format!("Error loading data from {}", path.display()))?;
    Ok(data)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Short display name: fasta, barcode and run, long names truncated.
pub fn abbreviate_name(stats: &MappingStats) -> String {
    format!(
        "{} / {} / {}",
        truncate(stats.fasta.as_deref().unwrap_or(""), 20),
        stats.barcode.as_deref().unwrap_or(""),
        truncate(stats.run_id.as_deref().unwrap_or(""), 20)
    )
}

fn titled(plot: Figure, stats: Option<&MappingStats>, subtitle: &str) -> Figure {
    let mut plot = annot::subtitle(plot, subtitle);
    if let Some(ident) = stats.and_then(MappingStats::ident) {
        plot.options.title = Some(ident);
    }
    plot
}

fn description(text: &str) -> RawHtml {
    let style = "display:block;width:100%;padding:25px 0 0 0;font-size:16px;margin-bottom:0;";
    RawHtml(html! { p style=(style) class="lead" { (text) } }.into_string())
}

/// Donut chart of the bases aligned to each grouping.
pub fn plot_base_pairs(data: &BTreeMap<String, MappingStats>, base: &FigureOptions) -> Figure {
    let labels: Vec<String> = data.values().map(abbreviate_name).collect();
    let values: Vec<f64> = data.values().map(|s| s.base_pairs).collect();
    let colors = choose_palette(labels.len())
        .unwrap_or_else(|_| vec![Colors::LIGHT_CORNFLOWER_BLUE.to_string(); labels.len()]);
    let total: f64 = values.iter().sum();

    let mut figure = base.clone().with_title("Base pairs breakdown");
    figure.show_x_axis = false;
    figure.show_y_axis = false;
    figure.show_grid = false;
    let mut plot = Figure::new(figure);
    plot.add_trace(
        Pie::new(values)
            .labels(labels)
            .hole(0.5)
            .sort(false)
            .marker(Marker::new().color_array(colors))
            .hover_template("%{label}<br>%{percent:.2%}<br>%{value} bases<extra></extra>"),
    );
    annot::subtitle(plot, &format!("Total: {:.2}mb", total / 1e6))
}

/// Bars of primary, secondary and supplementary alignment counts, or `None`
/// when there are no alignments.
pub fn plot_alignment_summary(stats: &MappingStats, base: &FigureOptions) -> Result<Option<Figure>> {
    let counts = [stats.primary_count, stats.secondary_count, stats.supplementary_count];
    if counts.iter().sum::<f64>() == 0.0 {
        return Ok(None);
    }
    let labels = ["Primary", "Secondary", "Supplementary"];
    let colors = [Colors::LIGHT_CORNFLOWER_BLUE; 3];
    let opts = base.clone().with_size(None, 350).with_labels("Outcome", "Count");
    let plot = simple_bar(&labels, &counts, Some(&colors[..]), &opts)?;
    Ok(Some(titled(
        plot,
        Some(stats),
        &format!("Total observations: {}", stats.observations),
    )))
}

/// Histogram of binned counts, drawn at `scale` times each bin index.
fn binned_histogram(
    counts: &[f64],
    scale: f64,
    bins: usize,
    xlim: Bounds,
    labels: (&str, &str),
    base: &FigureOptions,
) -> Result<Figure> {
    let x: Vec<f64> = (0..counts.len()).map(|i| i as f64 * scale).collect();
    let figure = base
        .clone()
        .with_size(Some(400), 300)
        .with_labels(labels.0, labels.1);
    let opts = HistogramOptions {
        weights: Some(vec![counts.to_vec()]),
        bins,
        ..HistogramOptions::with_series(
            SeriesOptions::with_figure(figure)
                .colors(&[Colors::LIGHT_CORNFLOWER_BLUE])
                .xlim(xlim),
        )
    };
    histogram(&[x], &opts)
}

fn whole(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{}", v.trunc()))
}

pub fn plot_accuracy_distribution(stats: &MappingStats, base: &FigureOptions) -> Result<Figure> {
    let plot = binned_histogram(
        &stats.alignment_accuracies,
        0.1,
        100,
        (Some(0.0), Some(100.0)),
        ("Accuracy %", "Count"),
        base,
    )?;
    let median = stats.median_accuracy.map_or_else(|| "NA".to_string(), |m| m.to_string());
    Ok(titled(plot, Some(stats), &format!("Median: {}%", median)))
}

pub fn plot_coverage_distribution(stats: &MappingStats, base: &FigureOptions) -> Result<Figure> {
    let plot = binned_histogram(
        &stats.alignment_coverages,
        1.0,
        101,
        (Some(0.0), Some(100.0)),
        ("Coverage %", "Count"),
        base,
    )?;
    let percent = (stats.cov80_percent * 100.0).round() / 100.0;
    Ok(titled(
        plot,
        Some(stats),
        &format!("Cov80: {} ({}%)", stats.cov80_count, percent),
    ))
}

pub fn plot_qscore_distribution(stats: &MappingStats, base: &FigureOptions) -> Result<Figure> {
    let plot = binned_histogram(
        &stats.aligned_qualities,
        0.1,
        600,
        (Some(0.0), Some(30.0)),
        ("Avg Quality", "Count"),
        base,
    )?;
    Ok(titled(plot, Some(stats), &format!("Median: {}", whole(stats.median_quality))))
}

pub fn plot_read_length_distribution(stats: &MappingStats, base: &FigureOptions) -> Result<Figure> {
    let max_length = stats
        .read_lengths
        .iter()
        .rposition(|c| *c > 0.0)
        .map_or(0.0, |i| i as f64 * 50.0);
    let plot = binned_histogram(
        &stats.read_lengths,
        50.0,
        1000,
        (Some(0.0), Some(max_length + 200.0)),
        ("Length", "Count"),
        base,
    )?;
    Ok(titled(plot, Some(stats), &format!("Read n50: {}", whole(stats.read_n50))))
}

/// Expected counts per reference from a CSV with (case insensitive)
/// `reference` and `expected_count` columns.
pub fn read_expected_counts<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, f64>> {
    let mut frame = dataframe::read_delimited(path, b',')?;
    let lower: Vec<String> = dataframe::names(&frame).iter().map(|n| n.to_lowercase()).collect();
    frame.set_column_names(lower.iter().map(String::as_str))?;
    for required in ["reference", "expected_count"] {
        if !lower.iter().any(|n| n == required) {
            return Err(AplanatError::Malformed(
                "counts file does not contain the required columns 'reference,expected_count'".into(),
            ));
        }
    }
    let names = dataframe::labels(&frame, "reference")?;
    let counts = dataframe::floats(&frame, "expected_count")?;
    Ok(names.into_iter().zip(counts).collect())
}

/// (name, observed, expected) per reference of `expected`.
fn observed_and_expected(stats: &MappingStats, expected: &BTreeMap<String, f64>) -> Vec<(String, f64, f64)> {
    expected
        .iter()
        .map(|(name, exp)| {
            let obs = stats.observed_references.get(name).copied().unwrap_or(0.0);
            (name.clone(), obs, *exp)
        })
        .collect()
}

/// Least squares slope and intercept, or `None` without spread in `x`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len() as f64;
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }
    let (mx, my) = (x.iter().sum::<f64>() / n, y.iter().sum::<f64>() / n);
    let sxx: f64 = x.iter().map(|v| (v - mx).powi(2)).sum();
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

fn log_count(v: f64) -> f64 {
    (v + 1.0).log10()
}

/// Scatter of log observed against log expected counts with a fitted line.
pub fn plot_observed_vs_expected(
    stats: &MappingStats,
    expected: &BTreeMap<String, f64>,
    base: &FigureOptions,
) -> Result<Figure> {
    let (x, y): (Vec<f64>, Vec<f64>) = observed_and_expected(stats, expected)
        .into_iter()
        .map(|(_, obs, exp)| (log_count(exp), log_count(obs)))
        .unzip();
    let figure = base
        .clone()
        .with_size(None, 350)
        .with_title("Expected vs Observed")
        .with_labels("log10(Expected Count)", "log10(Observed Count)");
    let series = SeriesOptions::with_figure(figure).colors(&[Colors::LIGHT_CORNFLOWER_BLUE]);
    let mut plot = points(&[x.clone()], &[y.clone()], &series)?;
    if let Some((slope, intercept)) = linear_fit(&x, &y) {
        let ends = [plot.x_range.map_or(0.0, |r| r.start), plot.x_range.map_or(1.0, |r| r.end)];
        plot.add_trace(
            Scatter::new(ends.to_vec(), ends.iter().map(|v| slope * v + intercept).collect())
                .mode(Mode::Lines)
                .line(Line::new().color(Colors::LIGHT_CORNFLOWER_BLUE))
                .show_legend(false),
        );
    }
    let stat = |v: Option<f64>| v.map_or_else(|| "NA".to_string(), |v| format!("{:.2}", v));
    let corrs = format!(
        "Spearmans: {}, (p = {})  Pearsons: {}, (p = {})",
        stat(stats.spearmans_rho),
        stat(stats.spearmans_rho_pval),
        stat(stats.pearson),
        stat(stats.pearson_pval)
    );
    Ok(annot::subtitle(plot, &corrs))
}

/// Bars of detected against undetected expected references.
pub fn plot_detected_vs_undetected(
    stats: &MappingStats,
    expected: &BTreeMap<String, f64>,
    base: &FigureOptions,
) -> Result<Figure> {
    let total = expected.len() as f64;
    let detected = stats.observed_reference_count;
    let counts = [detected, (total - detected).max(0.0)];
    let colors = [Colors::LIGHT_CORNFLOWER_BLUE; 2];
    let opts = base
        .clone()
        .with_size(None, 350)
        .with_title("Detected vs Undetected references")
        .with_labels("Outcome", "Count");
    let plot = simple_bar(&["Detected", "Not Detected"], &counts, Some(&colors[..]), &opts)?;
    Ok(annot::subtitle(plot, &format!("Detected: {} / {}", detected, total)))
}

/// Bars of log observed counts, ordered by increasing expected count.
pub fn plot_observations_vs_expected_molarity(
    stats: &MappingStats,
    expected: &BTreeMap<String, f64>,
    base: &FigureOptions,
) -> Result<Figure> {
    let mut rows = observed_and_expected(stats, expected);
    rows.sort_by(|a, b| a.2.total_cmp(&b.2));
    let names: Vec<String> = rows.iter().map(|r| r.0.clone()).collect();
    let counts: Vec<f64> = rows.iter().map(|r| log_count(r.1)).collect();
    let colors = vec![Colors::LIGHT_CORNFLOWER_BLUE.to_string(); names.len()];
    let opts = base
        .clone()
        .with_size(None, 300)
        .with_title("Observations ordered by increasing expected count")
        .with_labels("Reference", "log10(Observed Count)");
    simple_bar(&names, &counts, Some(&colors[..]), &opts)
}

type PlotFn = fn(&MappingStats, &FigureOptions) -> Result<Figure>;

/// A tab of per-grouping plots with a leading description, or `None` when
/// no grouping has data for it.
fn plot_tab(
    text: &str,
    data: &BTreeMap<String, MappingStats>,
    has_data: fn(&MappingStats) -> bool,
    plot: PlotFn,
    base: &FigureOptions,
) -> Result<Option<Stack>> {
    let plots = data
        .values()
        .filter(|s| has_data(s))
        .map(|s| plot(s, base))
        .collect::<Result<Vec<_>>>()?;
    if plots.is_empty() {
        return Ok(None);
    }
    let mut stack = Stack::new();
    stack.push(description(text));
    stack.push(grid(plots, 2));
    Ok(Some(stack))
}

fn summary_tab(data: &BTreeMap<String, MappingStats>, base: &FigureOptions) -> Result<Option<Stack>> {
    let mut plots = Vec::new();
    for stats in data.values() {
        if let Some(plot) = plot_alignment_summary(stats, base)? {
            plots.push(plot);
        }
    }
    if plots.is_empty() {
        return Ok(None);
    }
    let mut stack = Stack::new();
    stack.push(description(SUMMARY_TEXT));
    stack.push(plot_base_pairs(data, base));
    stack.push(grid(plots, 2));
    Ok(Some(stack))
}

fn control_tab(
    data: &BTreeMap<String, MappingStats>,
    expected: &BTreeMap<String, f64>,
    base: &FigureOptions,
) -> Result<Stack> {
    let mut stack = Stack::new();
    stack.push(description(CONTROL_TEXT));
    for (key, stats) in data {
        let has_rho = stats.spearmans_rho.map_or(false, |r| r != 0.0);
        if !has_rho || stats.observed_references.is_empty() {
            continue;
        }
        stack.push(RawHtml(html! { h3 { (key) } }.into_string()));
        stack.push(grid(
            vec![
                plot_observed_vs_expected(stats, expected, base)?,
                plot_detected_vs_undetected(stats, expected, base)?,
            ],
            2,
        ));
        stack.push(plot_observations_vs_expected_molarity(stats, expected, base)?);
    }
    Ok(stack)
}

fn any_counts(counts: &[f64]) -> bool {
    counts.iter().sum::<f64>() > 0.0
}

/// Build the alignment statistics dashboard from mapula's JSON output.
///
/// Tabs without data are left out. The control tab is added when an
/// expected counts CSV is given.
pub fn plot_mapping_stats<P: AsRef<Path>>(
    json: P,
    counts: Option<P>,
    section: Option<HtmlSection>,
    base: &FigureOptions,
) -> anyhow::Result<HtmlSection> {
    let data = load_data(json)?;
    log::info!("Loaded mapping statistics for {} groupings", data.len());

    let mut tabs = Tabs::new();
    if let Some(summary) = summary_tab(&data, base)? {
        tabs.add("Summary", summary);
    }
    let per_grouping: [(&str, &str, fn(&MappingStats) -> bool, PlotFn); 4] = [
        ("Accuracy", ACCURACY_TEXT, |s| any_counts(&s.alignment_accuracies), plot_accuracy_distribution),
        ("Quality", QUALITY_TEXT, |s| any_counts(&s.aligned_qualities), plot_qscore_distribution),
        ("Length", LENGTH_TEXT, |s| any_counts(&s.read_lengths), plot_read_length_distribution),
        ("Coverage", COVERAGE_TEXT, |s| any_counts(&s.alignment_coverages), plot_coverage_distribution),
    ];
    for (title, text, has_data, plot) in per_grouping {
        if let Some(tab) = plot_tab(text, &data, has_data, plot, base)? {
            tabs.add(title, tab);
        }
    }
    if let Some(counts) = counts {
        let counts = counts.as_ref();
        let expected = read_expected_counts(counts)
            .with_context(|| format!("Failed to read expected counts from {}", counts.display()))?;
        tabs.add("Control", control_tab(&data, &expected, base)?);
    }

    let mut section = section_or_new(section);
    if tabs.is_empty() {
        section.markdown("*No alignment statistics to report.*", None)?;
    } else {
        section.component(tabs, None)?;
    }
    Ok(section)
}
