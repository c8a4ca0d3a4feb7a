//! Add annotations to plots.
use crate::figure::{Figure, VLine};

/// Add a vertical line to a plot with an optional label.
pub fn marker_vline(mut plot: Figure, x: f64, label: Option<&str>, color: &str, width: f64) -> Figure {
    plot.add_vline(VLine {
        x,
        color: color.to_string(),
        width,
        label: label.map(str::to_string),
    });
    plot
}

/// Add a subtitle to a plot.
pub fn subtitle(mut plot: Figure, subtitle: &str) -> Figure {
    plot.subtitle = Some(subtitle.to_string());
    plot
}
