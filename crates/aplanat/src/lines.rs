//! Creation of line plots.
use crate::base::{simple, SeriesOptions, StepMode, Style};
use crate::error::Result;
use crate::figure::Figure;

/// Create a simple line plot, one line per dataset.
pub fn line(x_datas: &[Vec<f64>], y_datas: &[Vec<f64>], opts: &SeriesOptions) -> Result<Figure> {
    simple(x_datas, y_datas, Style::Line, opts)
}

/// Create a step-line plot; `mode` places the change in y value before,
/// centred on, or after each x value.
pub fn steps(
    x_datas: &[Vec<f64>],
    y_datas: &[Vec<f64>],
    mode: StepMode,
    opts: &SeriesOptions,
) -> Result<Figure> {
    simple(x_datas, y_datas, Style::Steps(mode), opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_default_to_before() {
        let fig = steps(
            &[vec![1.0, 2.0, 3.0]],
            &[vec![3.0, 2.0, 1.0]],
            StepMode::default(),
            &SeriesOptions::default(),
        )
        .unwrap();
        assert!(fig.to_json().unwrap().contains("\"shape\":\"vh\""));
    }
}
