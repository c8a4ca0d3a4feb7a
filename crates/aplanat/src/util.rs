//! Utility functions for aiding plotting.
use std::path::Path;

use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

use polars::prelude::DataFrame;

use crate::dataframe;
use crate::error::{AplanatError, Result};
use crate::figure::Figure;
use crate::palettes::{viridis256, CATEGORY20};

/// Some colours that someone thought were nice.
pub struct Colors;

impl Colors {
    pub const CERULEAN: &'static str = "#0084A9";
    pub const NOT_BLACK: &'static str = "#001A21";
    pub const FELDGRAU: &'static str = "#455556";
    pub const DIM_GRAY: &'static str = "#666666";
    pub const LIGHT_CORNFLOWER_BLUE: &'static str = "#90C5E7";
    pub const DARK_GRAY: &'static str = "#B5AEA7";
    pub const ISABELLINE: &'static str = "#F0EFED";
    pub const MEDIUM_SPRING_BUD: &'static str = "#B8E986";
    pub const CINNABAR: &'static str = "#EF4134";
    pub const SANDSTORM: &'static str = "#F5CC49";
    pub const FANDANGO: &'static str = "#A53F96";
    pub const GREEN: &'static str = "#17BB75";
    pub const VERDIGRIS: &'static str = "#54B8B1";
}

/// Plot limits as `(start, end)`; `None` means "calculate from the data".
pub type Bounds = (Option<f64>, Option<f64>);

/// Helper to determine limits of data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limiter {
    pub min: f64,
    pub max: f64,
}

impl Default for Limiter {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Limiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Widen the limits to include `data`. NaN values are ignored.
    pub fn accumulate(&mut self, data: &[f64]) -> &mut Self {
        for &v in data.iter().filter(|v| !v.is_nan()) {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self
    }

    /// Override either limit.
    pub fn fix(&mut self, lower: Option<f64>, upper: Option<f64>) -> &mut Self {
        if let Some(lower) = lower {
            self.min = lower;
        }
        if let Some(upper) = upper {
            self.max = upper;
        }
        self
    }

    pub fn fix_bounds(&mut self, bounds: Bounds) -> &mut Self {
        self.fix(bounds.0, bounds.1)
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

fn sorted_unique(data: &[f64]) -> Vec<f64> {
    let mut uniq: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    uniq.sort_by(|a, b| a.total_cmp(b));
    uniq.dedup();
    uniq
}

/// Attempt to find sensible plot bounds for a vector of (discrete) values.
pub fn pad(data: &[f64]) -> Result<(f64, f64)> {
    let uniq = sorted_unique(data);
    let (first, last) = match (uniq.first(), uniq.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Err(AplanatError::EmptyData("cannot pad an empty vector".into())),
    };
    let pad = uniq
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f64::INFINITY, f64::min);
    let pad = if pad.is_finite() { 0.5 * pad } else { 0.5 };
    Ok((first - pad, last + pad))
}

/// Quantile of already sorted data, interpolating linearly between points.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Kernel density to approximate a distribution.
///
/// The bandwidth follows R's `nrd0` rule of thumb; the density is evaluated
/// on `[min(x), max(x))` in increments of `step`.
pub fn kernel_density_estimate(x: &[f64], step: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    if !(step.is_finite() && step > 0.0) {
        return Err(AplanatError::InvalidStep(step));
    }
    if x.len() < 2 {
        return Err(AplanatError::EmptyData(
            "kernel density estimation requires at least two values".into(),
        ));
    }
    let hi = x.iter().std_dev();
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let iqr = quantile(&sorted, 0.75) - quantile(&sorted, 0.25);
    let mut lo = hi.min(iqr / 1.34);
    if !((lo == hi) || (lo == x[0].abs()) || (lo == 1.0)) {
        lo = 1.0;
    }
    let bw = 0.9 * lo * (x.len() as f64).powf(-0.2);

    let kernel_sd = hi * bw;
    let kernels = x
        .iter()
        .map(|&xi| Normal::new(xi, kernel_sd))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| AplanatError::EmptyData(format!("degenerate kernel: {}", e)))?;

    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    let n_steps = ((max - min) / step).ceil().max(0.0) as usize;
    let grid: Vec<f64> = (0..n_steps).map(|i| min + i as f64 * step).collect();
    let n = x.len() as f64;
    let pdf = grid
        .iter()
        .map(|&g| kernels.iter().map(|k| k.pdf(g)).sum::<f64>() / n)
        .collect();
    Ok((grid, pdf))
}

/// Choose a colour palette with `ncolours` entries.
///
/// Up to 20 colours are taken from Category20, dark shades first; more come
/// from an evenly strided Viridis256.
pub fn choose_palette(ncolours: usize) -> Result<Vec<String>> {
    if ncolours <= 20 {
        let palette = CATEGORY20
            .iter()
            .step_by(2)
            .chain(CATEGORY20.iter().skip(1).step_by(2));
        Ok(palette.take(ncolours).map(|c| c.to_string()).collect())
    } else if ncolours <= 256 {
        let stride = 256 / ncolours;
        Ok(viridis256()
            .into_iter()
            .step_by(stride)
            .take(ncolours)
            .collect())
    } else {
        Err(AplanatError::PaletteTooLarge(ncolours))
    }
}

/// Remove common leading whitespace from every line of `text`.
///
/// The margin is the longest whitespace prefix shared by all non-blank
/// lines, so tabs and spaces only match themselves.
pub fn dedent(text: &str) -> String {
    let indent = |line: &str| -> usize { line.len() - line.trim_start().len() };
    let margin = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| &l[..indent(l)])
        .fold(None, |acc: Option<&str>, prefix| match acc {
            None => Some(prefix),
            Some(common) => {
                let shared: usize = common
                    .chars()
                    .zip(prefix.chars())
                    .take_while(|(a, b)| a == b)
                    .map(|(a, _)| a.len_utf8())
                    .sum();
                Some(&common[..shared])
            }
        })
        .unwrap_or("");
    let out: Vec<&str> = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(margin).unwrap_or(line)
            }
        })
        .collect();
    let mut joined = out.join("\n");
    if text.ends_with('\n') {
        joined.push('\n');
    }
    joined
}

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Format a number with an SI prefix, e.g. `1.2 k` for 1234.
pub fn si_format(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{:.1} ", value);
    }
    let exponent = ((value.abs().log10() / 3.0).floor() as i32).clamp(-8, 8);
    let scaled = value / 1000f64.powi(exponent);
    let prefix = SI_PREFIXES[(exponent + 8) as usize];
    format!("{:.1} {}", scaled, prefix)
}

/// Round `value` to a number of significant figures.
pub fn round_sigfig(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let power = digits as i32 - 1 - magnitude;
    if power >= 0 {
        let factor = 10f64.powi(power);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-power);
        (value / factor).round() * factor
    }
}

/// Serialise `value` for embedding in an inline `<script>`.
///
/// `<`, `>` and `&` are written as unicode escapes so that string content
/// cannot close the script element.
pub fn script_json(value: &serde_json::Value) -> String {
    value
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// Substitute a placeholder figure for a plot that failed to build.
///
/// The failure is logged so a report can still be written with the remaining
/// content.
pub fn plot_wrapper(result: Result<Figure>, name: &str) -> Figure {
    match result {
        Ok(figure) => figure,
        Err(e) => {
            log::error!("Failed to create plot `{}`: {}", name, e);
            Figure::failed(name, &e.to_string())
        }
    }
}

/// Read one or more delimited files into a single data frame.
pub fn read_files<P: AsRef<Path>>(paths: &[P], delimiter: u8) -> Result<DataFrame> {
    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        log::debug!("Reading {}", path.as_ref().display());
        frames.push(dataframe::read_delimited(path, delimiter)?);
    }
    dataframe::concat(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accumulates_and_fixes() {
        let mut lim = Limiter::new();
        lim.accumulate(&[3.0, -1.0, f64::NAN]).accumulate(&[10.0]);
        assert_eq!((lim.min, lim.max), (-1.0, 10.0));
        lim.fix(None, Some(5.0));
        assert_eq!((lim.min, lim.max), (-1.0, 5.0));
    }

    #[test]
    fn pad_uses_half_the_smallest_gap() {
        let (lo, hi) = pad(&[1.0, 3.0, 2.0, 2.0, 5.0]).unwrap();
        assert_eq!((lo, hi), (0.5, 5.5));
        assert_eq!(pad(&[4.0]).unwrap(), (3.5, 4.5));
        assert!(pad(&[]).is_err());
    }

    #[test]
    fn quantile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&data, 0.5), 2.5);
        assert_eq!(quantile(&data, 0.0), 1.0);
        assert_eq!(quantile(&data, 1.0), 4.0);
        assert!((quantile(&data, 0.25) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn palette_prefers_dark_shades() {
        let pal = choose_palette(3).unwrap();
        assert_eq!(pal, vec!["#1f77b4", "#ff7f0e", "#2ca02c"]);
        let pal = choose_palette(11).unwrap();
        assert_eq!(pal[10], "#aec7e8");
        assert!(choose_palette(257).is_err());
    }

    #[test]
    fn large_palettes_stride_viridis() {
        let full = viridis256();
        let pal = choose_palette(40).unwrap();
        assert_eq!(pal.len(), 40);
        // 256 / 40 = 6
        assert_eq!(pal[0], full[0]);
        assert_eq!(pal[1], full[6]);
        assert_eq!(pal[39], full[234]);
        let pal = choose_palette(256).unwrap();
        assert_eq!(pal, full);
        let pal = choose_palette(21).unwrap();
        assert_eq!(pal.len(), 21);
        assert_eq!(pal[20], full[240]);
    }

    #[test]
    fn dedent_strips_margin() {
        let text = "\n    ### Title\n\n      indented\n    body\n";
        assert_eq!(dedent(text), "\n### Title\n\n  indented\nbody\n");
    }

    #[test]
    fn dedent_only_strips_shared_whitespace() {
        assert_eq!(dedent("\tone\n\t  two"), "one\n  two");
        // tabs and spaces do not match each other
        assert_eq!(dedent("\tone\n    two"), "\tone\n    two");
        assert_eq!(dedent("\u{3000}a\n  \u{3000}b\n"), "\u{3000}a\n  \u{3000}b\n");
        assert_eq!(dedent("\u{3000} a\n\u{3000}b"), " a\nb");
    }

    #[test]
    fn si_and_sigfig_formatting() {
        assert_eq!(si_format(1_000_000.0), "1.0 M");
        assert_eq!(si_format(50e3), "50.0 k");
        assert_eq!(si_format(14.0), "14.0 ");
        assert_eq!(round_sigfig(0.0051234, 3), 0.00512);
        assert_eq!(round_sigfig(123456.0, 3), 123000.0);
    }

    #[test]
    fn kde_is_a_positive_density() {
        let x: Vec<f64> = (0..200).map(|i| (i as f64 / 20.0).sin() * 3.0).collect();
        let (grid, pdf) = kernel_density_estimate(&x, 0.01).unwrap();
        assert_eq!(grid.len(), pdf.len());
        let area: f64 = pdf.iter().sum::<f64>() * 0.01;
        assert!(pdf.iter().all(|&p| p > 0.0));
        assert!(area > 0.5 && area <= 1.01, "area was {}", area);
    }

    #[test]
    fn script_json_cannot_close_the_script() {
        let value = serde_json::json!({"title": "</script><b>&"});
        let out = script_json(&value);
        assert!(!out.contains("</script>"));
        assert_eq!(out, r#"{"title":"\u003c/script\u003e\u003cb\u003e\u0026"}"#);
        let back: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn kde_rejects_bad_steps() {
        let x = [1.0, 2.0, 3.0];
        for step in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                kernel_density_estimate(&x, step),
                Err(AplanatError::InvalidStep(_))
            ));
        }
    }
}
