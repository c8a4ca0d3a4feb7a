//! Bio specific plots.
use plotly::common::{Line, Mode};
use plotly::Scatter;

use crate::error::{AplanatError, Result};
use crate::figure::{polygon_trace, rect, Figure, FigureOptions, Range1d, Ticks};

/// A chromosome drawn on a karyotype, `order` being its row (from 1).
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    pub order: usize,
    pub name: String,
    pub length: u64,
}

/// GRCh37 chromosome lengths.
pub const GRCH37: [(&str, u64); 24] = [
    ("1", 249250621),
    ("2", 243199373),
    ("3", 198022430),
    ("4", 191154276),
    ("5", 180915260),
    ("6", 171115067),
    ("7", 159138663),
    ("8", 146364022),
    ("9", 141213431),
    ("10", 135534747),
    ("11", 135006516),
    ("12", 133851895),
    ("13", 115169878),
    ("14", 107349540),
    ("15", 102531392),
    ("16", 90354753),
    ("17", 81195210),
    ("18", 78077248),
    ("19", 59128983),
    ("20", 63025520),
    ("21", 48129895),
    ("22", 51304566),
    ("X", 155270560),
    ("Y", 59373566),
];

/// The GRCh37 karyotype, optionally prefixing names (e.g. with `chr`).
pub fn human_chromosomes(prefix: &str) -> Vec<Chromosome> {
    GRCH37
        .iter()
        .enumerate()
        .map(|(i, (name, length))| Chromosome {
            order: i + 1,
            name: format!("{}{}", prefix, name),
            length: *length,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct KaryotypeOptions {
    pub names: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    /// Transparency of the ticks.
    pub alpha: f64,
    /// Chromosomes to draw, GRCh37 when absent.
    pub chromosomes: Option<Vec<Chromosome>>,
    pub figure: FigureOptions,
}

impl Default for KaryotypeOptions {
    fn default() -> Self {
        Self {
            names: None,
            colors: None,
            alpha: 0.2,
            chromosomes: None,
            figure: FigureOptions::default(),
        }
    }
}

const ROW_HEIGHT: f64 = 0.8;

/// Draw chromosome outlines with a tick for every `(position, chromosome)`.
///
/// `x_datas` holds positions and `y_datas` chromosome names, one vector per
/// data series.
pub fn karyotype(
    x_datas: &[Vec<f64>],
    y_datas: &[Vec<String>],
    opts: &KaryotypeOptions,
) -> Result<Figure> {
    let items = x_datas.len();
    let names = opts.names.clone().unwrap_or_default();
    let colors = opts.colors.clone().unwrap_or_default();
    let mismatched = y_datas.len() != items
        || (opts.names.is_some() && names.len() != items)
        || (opts.colors.is_some() && colors.len() != items);
    if mismatched {
        return Err(AplanatError::LengthMismatch("x_datas, y_datas, names, and colors".into()));
    }
    let chromosomes = opts
        .chromosomes
        .clone()
        .unwrap_or_else(|| human_chromosomes(""));

    let mut fig = Figure::new(opts.figure.clone());
    let outlines: Vec<Vec<(f64, f64)>> = chromosomes
        .iter()
        .map(|c| {
            let y = c.order as f64;
            rect(0.0, c.length as f64, y - ROW_HEIGHT / 2.0, y + ROW_HEIGHT / 2.0)
        })
        .collect();
    fig.add_trace(polygon_trace(&outlines, "white", Some("black"), 1.0, None));

    for (i, (xs, ys)) in x_datas.iter().zip(y_datas).enumerate() {
        if xs.len() != ys.len() {
            return Err(AplanatError::LengthMismatch("positions and chromosomes".into()));
        }
        let mut seg_x = Vec::with_capacity(xs.len() * 3);
        let mut seg_y = Vec::with_capacity(xs.len() * 3);
        for (x, chrom) in xs.iter().zip(ys) {
            let row = chromosomes
                .iter()
                .find(|c| &c.name == chrom)
                .ok_or_else(|| AplanatError::UnknownChromosome(chrom.clone()))?
                .order as f64;
            seg_x.extend([Some(*x), Some(*x), None]);
            seg_y.extend([
                Some(row - ROW_HEIGHT / 2.0),
                Some(row + ROW_HEIGHT / 2.0),
                None,
            ]);
        }
        let mut line = Line::new().width(1.0);
        if let Some(color) = colors.get(i) {
            line = line.color(color.clone());
        }
        let trace = Scatter::new(seg_x, seg_y)
            .mode(Mode::Lines)
            .opacity(opts.alpha)
            .line(line);
        let trace = match names.get(i) {
            Some(name) => trace.name(name),
            None => trace.show_legend(false),
        };
        fig.add_trace(trace);
    }

    fig.y_ticks = Some(Ticks {
        values: chromosomes.iter().map(|c| c.order as f64).collect(),
        labels: chromosomes.iter().map(|c| c.name.clone()).collect(),
    });
    let longest = chromosomes.iter().map(|c| c.length).max().unwrap_or(0) as f64;
    fig.set_x_range(Range1d::bounded(0.0, longest));
    fig.set_y_range(Range1d::bounded(0.0, chromosomes.len() as f64 + 1.0));
    Ok(fig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_chromosomes_are_labelled() {
        let fig = karyotype(
            &[vec![1000.0, 2000.0]],
            &[vec!["1".to_string(), "X".to_string()]],
            &KaryotypeOptions::default(),
        )
        .unwrap();
        let ticks = fig.y_ticks.clone().unwrap();
        assert_eq!(ticks.labels[22], "X");
        assert_eq!(ticks.labels[23], "Y");
        assert_eq!(fig.x_range.unwrap().end, 249250621.0);
        assert_eq!(fig.y_range.unwrap().end, 25.0);
    }

    #[test]
    fn unknown_chromosomes_are_errors() {
        let err = karyotype(
            &[vec![1.0]],
            &[vec!["chrZ".to_string()]],
            &KaryotypeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AplanatError::UnknownChromosome(_)));
    }

    #[test]
    fn prefixed_chromosomes() {
        let chroms = human_chromosomes("chr");
        assert_eq!(chroms[0].name, "chr1");
        assert_eq!(chroms[23].order, 24);
    }
}
