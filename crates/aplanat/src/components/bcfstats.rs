//! Report components for displaying information from `bcftools stats`.
use std::collections::BTreeMap;
use std::path::Path;

use polars::prelude::DataFrame;

use crate::base::SeriesOptions;
use crate::components::section_or_new;
use crate::dataframe;
use crate::error::{AplanatError, Result};
use crate::figure::{Figure, FigureOptions, Ticks};
use crate::hist::{histogram, HistogramOptions};
use crate::parsers::bcfstats::{parse_bcftools_stats_multi, BcfStats};
use crate::report::{HtmlSection, TableOptions};
use crate::spatial::heatmap;
use crate::util::Colors;

pub const VARIANT_COUNTS_HEADER: &str = "**Variant counts:**";

pub const TRANS_COUNTS_HEADER: &str = "**Transitions and tranversions:**";

pub const SUB_HEADER: &str = "
**Substitution types**

Base substitutions aggregated across all samples (symmetrised by pairing)
";

pub const INDEL_LENGTH_HEADER: &str = "
**Indel lengths**

Insertion and deletion lengths aggregated across all samples.
";

pub const FULL_REPORT_HEADER: &str = "
### Variant call summaries

The following tables and figures are derived from
the output of `bcftools stats`.
";

const REFERENCE_BASES: [&str; 2] = ["C", "A"];
const ALTERNATIVE_BASES: [&str; 4] = ["A", "C", "G", "T"];

fn table<'a>(stats: &'a BcfStats, name: &str) -> Result<&'a DataFrame> {
    stats
        .get(name)
        .ok_or_else(|| AplanatError::Malformed(format!("no {} table in bcftools stats", name)))
}

fn maybe_transposed(frame: DataFrame, samples_as_columns: bool) -> Result<DataFrame> {
    if samples_as_columns {
        dataframe::transpose(&frame, "sample")
    } else {
        Ok(frame)
    }
}

/// Create a section containing the summary counts of each sample.
///
/// With `samples_as_columns` the table is transposed to give a column per
/// sample.
pub fn variant_counts_table(
    stats: &BcfStats,
    samples_as_columns: bool,
    header: Option<&str>,
    section: Option<HtmlSection>,
) -> Result<HtmlSection> {
    let mut section = section_or_new(section);
    section.markdown(header.unwrap_or(VARIANT_COUNTS_HEADER), None)?;
    let mut frame = table(stats, "SN")?.clone();
    if dataframe::names(&frame).iter().any(|n| n == "samples") {
        frame = frame.drop("samples")?;
    }
    let frame = maybe_transposed(frame, samples_as_columns)?;
    section.table(&frame, TableOptions::default(), None)?;
    Ok(section)
}

/// Create a section with transition and transversion counts.
pub fn trans_counts(
    stats: &BcfStats,
    samples_as_columns: bool,
    header: Option<&str>,
    section: Option<HtmlSection>,
) -> Result<HtmlSection> {
    let mut section = section_or_new(section);
    section.markdown(header.unwrap_or(TRANS_COUNTS_HEADER), None)?;
    let frame = maybe_transposed(table(stats, "TSTV")?.clone(), samples_as_columns)?;
    section.table(&frame, TableOptions::default(), None)?;
    Ok(section)
}

/// Fold a substitution onto the strand with an A or C reference base,
/// returning the reference and alternative bases.
pub fn canonical_substitution(sub: &str) -> Result<(char, char)> {
    let bases: Vec<char> = sub.chars().collect();
    let (reference, alternative) = match bases.as_slice() {
        [r, '>', a] => (*r, *a),
        _ => return Err(AplanatError::Malformed(format!("substitution type '{}'", sub))),
    };
    let complement = |b: char| match b {
        'A' => Some('T'),
        'C' => Some('G'),
        'G' => Some('C'),
        'T' => Some('A'),
        _ => None,
    };
    match reference {
        'A' | 'C' => Ok((reference, alternative)),
        _ => match (complement(reference), complement(alternative)) {
            (Some(r), Some(a)) => Ok((r, a)),
            _ => Err(AplanatError::Malformed(format!("substitution type '{}'", sub))),
        },
    }
}

fn parse_counts(frame: &DataFrame, column: &str) -> Result<Vec<f64>> {
    dataframe::labels(frame, column)?
        .iter()
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| AplanatError::Malformed(format!("{} value '{}'", column, v)))
        })
        .collect()
}

/// Summed substitution counts keyed by canonical (reference, alternative).
pub fn substitution_counts(stats: &BcfStats) -> Result<BTreeMap<(char, char), f64>> {
    let st = table(stats, "ST")?;
    let types = dataframe::labels(st, "type")?;
    let counts = parse_counts(st, "count")?;
    let mut summed = BTreeMap::new();
    for (sub, count) in types.iter().zip(counts) {
        *summed.entry(canonical_substitution(sub)?).or_insert(0.0) += count;
    }
    Ok(summed)
}

/// Heatmap of substitution counts, reference base against alternative.
pub fn sub_matrix_plot(stats: &BcfStats, base: &FigureOptions) -> Result<Figure> {
    let summed = substitution_counts(stats)?;
    let position = |bases: &[&str], b: char| bases.iter().position(|x| x.starts_with(b));
    let (mut x, mut y, mut z) = (Vec::new(), Vec::new(), Vec::new());
    for ((reference, alternative), count) in summed {
        if let (Some(px), Some(py)) = (
            position(&ALTERNATIVE_BASES[..], alternative),
            position(&REFERENCE_BASES[..], reference),
        ) {
            x.push(px as f64);
            y.push(py as f64);
            z.push(count);
        }
    }
    if z.is_empty() {
        return Err(AplanatError::EmptyData("no substitutions".into()));
    }
    let opts = base
        .clone()
        .with_size(Some(300), 225)
        .with_labels("alternative base", "reference base");
    let mut plot = heatmap(&x, &y, &z, Some("count"), &opts)?;
    plot.options.show_x_axis = true;
    plot.options.show_y_axis = true;
    plot.options.show_grid = false;
    let ticks = |bases: &[&str]| Ticks {
        values: (0..bases.len()).map(|i| i as f64).collect(),
        labels: bases.iter().map(|b| b.to_string()).collect(),
    };
    plot.x_ticks = Some(ticks(&ALTERNATIVE_BASES[..]));
    plot.y_ticks = Some(ticks(&REFERENCE_BASES[..]));
    Ok(plot)
}

/// Create a section with a base substitution matrix.
pub fn sub_matrix(
    stats: &BcfStats,
    header: Option<&str>,
    section: Option<HtmlSection>,
    base: &FigureOptions,
) -> Result<HtmlSection> {
    let mut section = section_or_new(section);
    section.markdown(header.unwrap_or(SUB_HEADER), None)?;
    section.plot(sub_matrix_plot(stats, base)?, None)?;
    Ok(section)
}

/// Histogram of insertion and deletion lengths, or `None` when the stats
/// hold no indels.
pub fn indel_length_plot(stats: &BcfStats, color: &str, base: &FigureOptions) -> Result<Option<Figure>> {
    let idd = match stats.get("IDD") {
        Some(idd) if idd.height() > 0 => idd,
        _ => return Ok(None),
    };
    let lengths = parse_counts(idd, "length (deletions negative)")?;
    let sites = parse_counts(idd, "number of sites")?;
    let mut summed: BTreeMap<i64, f64> = BTreeMap::new();
    for (length, count) in lengths.iter().zip(sites) {
        *summed.entry(*length as i64).or_insert(0.0) += count;
    }
    // empty padding so the axis always spans -10 to 10
    let mut x: Vec<f64> = summed.keys().map(|l| *l as f64).collect();
    let mut w: Vec<f64> = summed.into_values().collect();
    x.extend([-10.0, 10.0]);
    w.extend([0.0, 0.0]);

    let figure = base
        .clone()
        .with_title("Insertion and deletion variant lengths")
        .with_labels("Length / bases (deletions negative)", "Count");
    let opts = HistogramOptions {
        weights: Some(vec![w]),
        binwidth: Some(1.0),
        ..HistogramOptions::with_series(SeriesOptions::with_figure(figure).colors(&[color]))
    };
    histogram(&[x], &opts).map(Some)
}

/// Create a section containing an indel length chart.
pub fn indel_lengths(
    stats: &BcfStats,
    header: Option<&str>,
    section: Option<HtmlSection>,
    color: Option<&str>,
    base: &FigureOptions,
) -> Result<HtmlSection> {
    let mut section = section_or_new(section);
    section.markdown(header.unwrap_or(INDEL_LENGTH_HEADER), None)?;
    let color = color.unwrap_or(Colors::LIGHT_CORNFLOWER_BLUE);
    match indel_length_plot(stats, color, base)? {
        Some(plot) => {
            section.plot(plot, None)?;
        }
        None => {
            section.markdown("*No indels to report.*", None)?;
        }
    }
    Ok(section)
}

/// Create a report section from one or more `bcftools stats` outputs.
pub fn full_report<P: AsRef<Path>>(
    stats: &[P],
    header: Option<&str>,
    section: Option<HtmlSection>,
    base: &FigureOptions,
) -> anyhow::Result<HtmlSection> {
    let stats = parse_bcftools_stats_multi(stats, None)?;
    log::info!("Parsed {} bcftools stats tables", stats.len());
    let mut section = section_or_new(section);
    section.markdown(header.unwrap_or(FULL_REPORT_HEADER), None)?;
    let section = variant_counts_table(&stats, false, None, Some(section))?;
    let section = trans_counts(&stats, false, None, Some(section))?;
    let section = sub_matrix(&stats, None, Some(section), base)?;
    let section = indel_lengths(&stats, None, Some(section), None, base)?;
    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::bcfstats::{parse_bcftools_stats_text, STATS};

    fn stats() -> BcfStats {
        let mut tables = parse_bcftools_stats_text(STATS).unwrap();
        for table in tables.values_mut() {
            let sample = polars::prelude::Column::new("sample".into(), vec!["s1"; table.height()]);
            table.insert_column(0, sample).unwrap();
        }
        tables
    }

    fn render(section: &HtmlSection) -> String {
        section
            .components("s0")
            .unwrap()
            .into_iter()
            .map(|m| m.into_string())
            .collect()
    }

    #[test]
    fn substitutions_fold_onto_a_and_c() {
        assert_eq!(canonical_substitution("G>A").unwrap(), ('C', 'T'));
        assert_eq!(canonical_substitution("T>G").unwrap(), ('A', 'C'));
        assert_eq!(canonical_substitution("A>G").unwrap(), ('A', 'G'));
        assert!(canonical_substitution("N>A").is_err());
        assert!(canonical_substitution("AG").is_err());

        let counts = substitution_counts(&stats()).unwrap();
        assert_eq!(counts[&('C', 'T')], 5.0);
        assert_eq!(counts[&('A', 'C')], 2.0);
        assert_eq!(counts[&('A', 'G')], 2.0);
    }

    #[test]
    fn sub_matrix_labels_the_bases() {
        let plot = sub_matrix_plot(&stats(), &FigureOptions::default()).unwrap();
        assert_eq!(plot.x_ticks.as_ref().unwrap().labels, vec!["A", "C", "G", "T"]);
        assert_eq!(plot.y_ticks.as_ref().unwrap().labels, vec!["C", "A"]);
        assert_eq!((plot.width(), plot.height()), (Some(300), 225));
    }

    #[test]
    fn counts_tables_drop_and_transpose() {
        let section = variant_counts_table(&stats(), false, None, None).unwrap();
        let html = render(&section);
        assert!(html.contains("<th>SNPs</th>"));
        assert!(!html.contains("<th>samples</th>"));

        let section = trans_counts(&stats(), true, Some("**TSTV**"), None).unwrap();
        let html = render(&section);
        assert!(html.contains("<strong>TSTV</strong>"));
        assert!(html.contains("<th>s1</th>"));
        assert!(html.contains("<td>ts/tv</td><td>2.00</td>"));
    }

    #[test]
    fn indels_are_padded_or_reported_missing() {
        let plot = indel_length_plot(&stats(), "red", &FigureOptions::default())
            .unwrap()
            .unwrap();
        let x = plot.x_range.unwrap();
        assert_eq!((x.start, x.end), (-10.0, 10.0));

        let mut without = stats();
        without.remove("IDD");
        let section = indel_lengths(&without, None, None, None, &FigureOptions::default()).unwrap();
        assert!(render(&section).contains("<em>No indels to report.</em>"));
    }

    #[test]
    fn full_report_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.stats");
        std::fs::write(&path, STATS).unwrap();
        let section = full_report(&[&path], None, None, &FigureOptions::default()).unwrap();
        let html = render(&section);
        assert!(html.contains("<h3>Variant call summaries</h3>"));
        assert!(html.contains("<td>calls.stats</td>"));
        assert!(html.contains("Insertion and deletion variant lengths"));
    }
}
