//! Depth of coverage plots from mosdepth outputs.
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use itertools_num::linspace;
use polars::prelude::DataFrame;

use crate::base::{SeriesOptions, StepMode};
use crate::components::section_or_new;
use crate::dataframe;
use crate::error::{AplanatError, Result};
use crate::figure::{Figure, FigureOptions};
use crate::layouts::{grid, PlotGrid, Tabs};
use crate::lines::{line, steps};
use crate::report::HtmlSection;
use crate::util::{Bounds, Colors};

pub const FULL_REPORT_HEADER: &str = "
### Depth Coverage

The following tables and figures are derived from
the output of [Mosdepth](https://github.com/brentp/mosdepth).
";

const DEPTH_COLUMNS: [&str; 4] = ["ref", "start", "end", "depth"];

fn cumulative_options(base: &FigureOptions) -> SeriesOptions {
    SeriesOptions::with_figure(
        base.clone()
            .with_labels("Read depth", "Percentage of genome"),
    )
}

/// Cumulative depth plot from a mosdepth `*.dist.txt` file.
///
/// Only the whole genome (`total`) rows are used.
pub fn cumulative_depth_from_dist<P: AsRef<Path>>(path: P, base: &FigureOptions) -> Result<Figure> {
    let dist = dataframe::read_delimited_headerless(path, b'\t', &["ref", "coverage", "proportion"])?;
    let total = dataframe::filter_eq(&dist, "ref", "total")?;
    let coverage = dataframe::floats(&total, "coverage")?;
    let proportion = dataframe::floats(&total, "proportion")?;

    let mut points: Vec<(f64, f64)> = coverage.into_iter().zip(proportion).collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut seen = BTreeSet::new();
    let (x, y): (Vec<f64>, Vec<f64>) = points
        .into_iter()
        .map(|(c, p)| (c, p * 100.0))
        .filter(|(_, p)| seen.insert(p.to_bits()))
        .unzip();
    if x.is_empty() {
        return Err(AplanatError::EmptyData("no 'total' rows in depth distribution".into()));
    }
    line(&[x], &[y], &cumulative_options(base))
}

/// Cumulative depth plot from mosdepth regions with `start`, `end` and
/// `depth` columns.
///
/// Bases are counted per depth, then accumulated from the deepest down so
/// each point gives the percentage of bases at or above that depth. At most
/// `bins` evenly spaced points are drawn.
pub fn cumulative_depth_from_bed(df: &DataFrame, bins: usize, base: &FigureOptions) -> Result<Figure> {
    let starts = dataframe::floats(df, "start")?;
    let ends = dataframe::floats(df, "end")?;
    let depths = dataframe::floats(df, "depth")?;

    let mut regions: Vec<(f64, f64)> = depths
        .into_iter()
        .zip(ends.iter().zip(&starts).map(|(e, s)| e - s))
        .collect();
    regions.sort_by(|a, b| b.0.total_cmp(&a.0));
    let mut per_depth: Vec<(f64, f64)> = Vec::new();
    for (depth, bases) in regions {
        match per_depth.last_mut() {
            Some((d, total)) if *d == depth => *total += bases,
            _ => per_depth.push((depth, bases)),
        }
    }
    let mut cumulative = 0.0;
    let mut points: Vec<(f64, f64)> = per_depth
        .into_iter()
        .map(|(depth, bases)| {
            cumulative += bases;
            (depth, cumulative)
        })
        .collect();
    let total = match points.last() {
        Some((_, total)) if *total > 0.0 => *total,
        _ => return Err(AplanatError::EmptyData("no bases covered".into())),
    };
    points.reverse();

    let points: Vec<(f64, f64)> = if points.len() > bins {
        linspace(0.0, (points.len() - 1) as f64, bins.max(2))
            .map(|i| points[i as usize])
            .collect()
    } else {
        points
    };
    let (x, y): (Vec<f64>, Vec<f64>) = points
        .into_iter()
        .map(|(depth, bases)| (depth, bases / total * 100.0))
        .unzip();
    line(&[x], &[y], &cumulative_options(base))
}

fn read_depths<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    dataframe::read_delimited_headerless(path, b'\t', &DEPTH_COLUMNS)
}

/// Rows of `depths` grouped by reference name, as (starts, per-column values).
fn by_reference(depths: &[&DataFrame]) -> Result<BTreeMap<String, (Vec<f64>, Vec<Vec<f64>>)>> {
    let first = depths
        .first()
        .ok_or_else(|| AplanatError::EmptyData("no depth files".into()))?;
    let refs = dataframe::labels(first, "ref")?;
    let starts = dataframe::floats(first, "start")?;
    let values = depths
        .iter()
        .map(|d| dataframe::floats(d, "depth"))
        .collect::<Result<Vec<_>>>()?;

    let mut grouped: BTreeMap<String, (Vec<f64>, Vec<Vec<f64>>)> = BTreeMap::new();
    for (i, reference) in refs.into_iter().enumerate() {
        let (s, v) = grouped
            .entry(reference)
            .or_insert_with(|| (Vec::new(), vec![Vec::new(); values.len()]));
        s.push(starts[i]);
        for (column, series) in v.iter_mut().zip(&values) {
            column.push(series[i]);
        }
    }
    Ok(grouped)
}

fn coverage_plot(
    reference: &str,
    starts: Vec<f64>,
    values: Vec<Vec<f64>>,
    series: SeriesOptions,
    base: &FigureOptions,
) -> Result<Figure> {
    let figure = base
        .clone()
        .with_title(reference)
        .with_labels("Position along reference", "Sequencing depth / Bases");
    let x = vec![starts; values.len()];
    steps(&x, &values, StepMode::After, &SeriesOptions { figure, ..series })
}

/// Step plots of depth along each reference of a mosdepth regions file,
/// one plot per reference in name order.
pub fn depth_coverage<P: AsRef<Path>>(
    path: P,
    xlim: Bounds,
    ylim: Bounds,
    base: &FigureOptions,
) -> Result<Vec<Figure>> {
    let depths = read_depths(path)?;
    let series = SeriesOptions::default()
        .colors(&[Colors::CERULEAN])
        .xlim(xlim)
        .ylim(ylim);
    by_reference(&[&depths])?
        .into_iter()
        .map(|(reference, (starts, values))| coverage_plot(&reference, starts, values, series.clone(), base))
        .collect()
}

/// As [`depth_coverage`], with forward and reverse strand depths drawn
/// together. The two files must list the same regions in the same order.
pub fn depth_coverage_orientation<P: AsRef<Path>>(
    fwd: P,
    rev: P,
    xlim: Bounds,
    ylim: Bounds,
    base: &FigureOptions,
) -> Result<Vec<Figure>> {
    let fwd = read_depths(fwd)?;
    let rev = read_depths(rev)?;
    if fwd.height() != rev.height() {
        return Err(AplanatError::LengthMismatch(format!(
            "forward ({} regions) and reverse ({} regions) depths",
            fwd.height(),
            rev.height()
        )));
    }
    let series = SeriesOptions::default()
        .colors(&[Colors::CERULEAN, Colors::FELDGRAU])
        .names(&["fwd", "rev"])
        .xlim(xlim)
        .ylim(ylim);
    by_reference(&[&fwd, &rev])?
        .into_iter()
        .map(|(reference, (starts, values))| coverage_plot(&reference, starts, values, series.clone(), base))
        .collect()
}

/// Create a depth coverage section from mosdepth outputs.
///
/// With `tab` the total and stranded plots sit in separate tabs, otherwise
/// they are drawn side by side for each reference.
pub fn full_report<P: AsRef<Path>>(
    depth: P,
    fwd: P,
    rev: P,
    header: Option<&str>,
    section: Option<HtmlSection>,
    tab: bool,
    base: &FigureOptions,
) -> anyhow::Result<HtmlSection> {
    let mut section = section_or_new(section);
    section.markdown(header.unwrap_or(FULL_REPORT_HEADER), None)?;

    let coverage = depth_coverage(depth, (None, None), (None, None), base)?;
    let orientation = depth_coverage_orientation(fwd, rev, (None, None), (None, None), base)?;
    log::info!("Plotted depth for {} references", coverage.len());

    if tab {
        let mut tabs = Tabs::new();
        tabs.add("Proportions covered", grid(coverage, 1));
        tabs.add("Coverage traces", grid(orientation, 1));
        section.component(tabs, None)?;
    } else {
        let mut coverage = coverage.into_iter();
        let mut orientation = orientation.into_iter();
        let mut rows = Vec::new();
        loop {
            let row: Vec<Figure> = coverage.next().into_iter().chain(orientation.next()).collect();
            if row.is_empty() {
                break;
            }
            rows.push(row);
        }
        section.grid(PlotGrid { rows }, None)?;
    }
    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    const DEPTH: &str = "chr2\t0\t100\t5\nchr1\t0\t100\t10\nchr1\t100\t200\t20\n";

    #[test]
    fn dist_keeps_total_and_drops_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.dist.txt",
            "chr1\t0\t1.00\ntotal\t2\t0.25\ntotal\t0\t1.00\ntotal\t1\t0.25\n",
        );
        let plot = cumulative_depth_from_dist(&path, &FigureOptions::default()).unwrap();
        let x = plot.x_range.unwrap();
        assert_eq!((x.start, x.end), (0.0, 1.0));
        let y = plot.y_range.unwrap();
        assert_eq!((y.start, y.end), (25.0, 100.0));

        let none = write(dir.path(), "b.dist.txt", "chr1\t0\t1.00\n");
        assert!(matches!(
            cumulative_depth_from_dist(&none, &FigureOptions::default()),
            Err(AplanatError::EmptyData(_))
        ));
    }

    #[test]
    fn bed_depths_accumulate_from_the_deepest() {
        let df = polars::df!(
            "start" => [0.0, 100.0, 150.0, 300.0],
            "end" => [100.0, 150.0, 300.0, 400.0],
            "depth" => [0.0, 10.0, 20.0, 10.0]
        )
        .unwrap();
        let plot = cumulative_depth_from_bed(&df, 2000, &FigureOptions::default()).unwrap();
        let x = plot.x_range.unwrap();
        assert_eq!((x.start, x.end), (0.0, 20.0));
        let y = plot.y_range.unwrap();
        // 150 of 400 bases are at depth 20
        assert_eq!((y.start, y.end), (37.5, 100.0));

        let binned = cumulative_depth_from_bed(&df, 2, &FigureOptions::default()).unwrap();
        assert_eq!(binned.x_range.unwrap().end, 20.0);
    }

    #[test]
    fn one_plot_per_reference_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "regions.bed", DEPTH);
        let plots = depth_coverage(&path, (None, None), (Some(0.0), None), &FigureOptions::default()).unwrap();
        let titles: Vec<&str> = plots.iter().map(|p| p.options.title.as_deref().unwrap()).collect();
        assert_eq!(titles, vec!["chr1", "chr2"]);
        assert_eq!(plots[0].y_range.unwrap().start, 0.0);
        assert_eq!(plots[0].y_range.unwrap().end, 20.0);
    }

    #[test]
    fn strands_must_cover_the_same_regions() {
        let dir = tempfile::tempdir().unwrap();
        let fwd = write(dir.path(), "fwd.bed", DEPTH);
        let rev = write(dir.path(), "rev.bed", "chr1\t0\t100\t1\n");
        assert!(matches!(
            depth_coverage_orientation(&fwd, &rev, (None, None), (None, None), &FigureOptions::default()),
            Err(AplanatError::LengthMismatch(_))
        ));
        let plots =
            depth_coverage_orientation(&fwd, &fwd, (None, None), (None, None), &FigureOptions::default()).unwrap();
        assert_eq!(plots.len(), 2);
        assert_eq!(plots[0].trace_count(), 2);
    }

    #[test]
    fn full_report_pairs_or_tabs_plots() {
        let dir = tempfile::tempdir().unwrap();
        let depth = write(dir.path(), "regions.bed", DEPTH);
        let section = full_report(&depth, &depth, &depth, None, None, false, &FigureOptions::default()).unwrap();
        let html: String = section
            .components("s0")
            .unwrap()
            .into_iter()
            .map(|m| m.into_string())
            .collect();
        assert!(html.contains("<h3>Depth Coverage</h3>"));
        assert!(html.contains("s0-i1-1-1"));
        assert!(!html.contains("nav-tabs"));

        let section = full_report(&depth, &depth, &depth, None, None, true, &FigureOptions::default()).unwrap();
        let html: String = section
            .components("s0")
            .unwrap()
            .into_iter()
            .map(|m| m.into_string())
            .collect();
        assert!(html.contains("Proportions covered"));
        assert!(html.contains("Coverage traces"));
    }
}
