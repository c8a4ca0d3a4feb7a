//! Creation of bar-like plots.
use plotly::common::{Line, Mode};
use plotly::Scatter;

use crate::error::{AplanatError, Result};
use crate::figure::{polygon_trace, rect, Figure, FigureOptions, Range1d, Ticks};
use crate::util::{pad, quantile, Bounds, Limiter};

/// Figure options suited to a single stacked bar.
pub fn hbar_options() -> FigureOptions {
    FigureOptions {
        height: 150,
        show_y_axis: false,
        ..FigureOptions::default()
    }
}

/// Create a plot with a single set of stacked horizontal bars.
pub fn single_hbar<S: AsRef<str>>(
    values: &[f64],
    classes: &[S],
    colors: &[S],
    opts: &FigureOptions,
) -> Result<Figure> {
    if values.len() != classes.len() || values.len() != colors.len() {
        return Err(AplanatError::LengthMismatch(
            "`values`, `classes`, and `colors`".into(),
        ));
    }
    let mut figure = opts.clone();
    figure.show_y_axis = false;
    figure.show_grid = false;
    let mut fig = Figure::new(figure);

    let mut left = 0.0;
    for ((value, class), color) in values.iter().zip(classes).zip(colors) {
        let bar = rect(left, left + value, -0.45, 0.45);
        fig.add_trace(polygon_trace(
            &[bar],
            color.as_ref(),
            None,
            0.7,
            Some(class.as_ref()),
        ));
        left += value;
    }
    let total: f64 = values.iter().sum();
    fig.x_range = Some(Range1d::new(0.0, (1.2 * total).trunc()));
    fig.y_range = Some(Range1d::new(-0.5, 0.5));
    Ok(fig)
}

/// Create a plot of vertical bars, one per group.
pub fn simple_bar<S: AsRef<str>>(
    groups: &[S],
    counts: &[f64],
    colors: Option<&[S]>,
    opts: &FigureOptions,
) -> Result<Figure> {
    if groups.len() != counts.len() || colors.map_or(false, |c| c.len() != groups.len()) {
        return Err(AplanatError::LengthMismatch("`groups`, `counts`, and `colors`".into()));
    }
    if groups.is_empty() {
        return Err(AplanatError::EmptyData("no groups to plot".into()));
    }
    let mut fig = Figure::new(opts.clone());
    for (i, count) in counts.iter().enumerate() {
        let color = colors.map_or("blue", |c| c[i].as_ref());
        let x = i as f64;
        fig.add_trace(polygon_trace(
            &[rect(x - 0.4, x + 0.4, 0.0, *count)],
            color,
            None,
            0.9,
            None,
        ));
    }
    fig.x_ticks = Some(Ticks {
        values: (0..groups.len()).map(|i| i as f64).collect(),
        labels: groups.iter().map(|g| g.as_ref().to_string()).collect(),
    });
    let mut y_lim = Limiter::with_limits(0.0, 0.0);
    y_lim.accumulate(counts);
    fig.x_range = Some(Range1d::new(-0.5, groups.len() as f64 - 0.5));
    fig.y_range = Some(Range1d::new(y_lim.min, 1.05 * y_lim.max));
    Ok(fig)
}

/// The grouping variable of a boxplot series.
#[derive(Debug, Clone, PartialEq)]
pub enum Groups {
    /// Groups placed at their own value along the x axis.
    Numeric(Vec<f64>),
    /// Groups placed in order of first appearance, labelled by name.
    Categorical(Vec<String>),
}

impl Groups {
    fn len(&self) -> usize {
        match self {
            Groups::Numeric(v) => v.len(),
            Groups::Categorical(v) => v.len(),
        }
    }
}

impl From<Vec<f64>> for Groups {
    fn from(v: Vec<f64>) -> Self {
        Groups::Numeric(v)
    }
}

impl From<Vec<String>> for Groups {
    fn from(v: Vec<String>) -> Self {
        Groups::Categorical(v)
    }
}

/// Summary statistics of one box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub label: String,
    pub position: f64,
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    /// Lower whisker, `q1 - 1.5 * IQR`.
    pub lower: f64,
    /// Upper whisker, `q3 + 1.5 * IQR`.
    pub upper: f64,
}

/// Quartiles and whiskers for each group, in order of first appearance.
pub fn box_stats(groups: &Groups, values: &[f64]) -> Result<Vec<BoxStats>> {
    if groups.len() != values.len() {
        return Err(AplanatError::LengthMismatch("`groups` and `values`".into()));
    }
    let keys: Vec<(String, f64)> = match groups {
        Groups::Numeric(v) => v.iter().map(|g| (g.to_string(), *g)).collect(),
        Groups::Categorical(v) => {
            let mut order: Vec<&String> = Vec::new();
            v.iter()
                .map(|g| {
                    let pos = match order.iter().position(|o| *o == g) {
                        Some(p) => p,
                        None => {
                            order.push(g);
                            order.len() - 1
                        }
                    };
                    (g.clone(), pos as f64)
                })
                .collect()
        }
    };

    let mut grouped: Vec<(String, f64, Vec<f64>)> = Vec::new();
    for ((label, pos), value) in keys.into_iter().zip(values) {
        match grouped.iter_mut().find(|(l, _, _)| *l == label) {
            Some((_, _, vals)) => vals.push(*value),
            None => grouped.push((label, pos, vec![*value])),
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(label, position, mut vals)| {
            vals.sort_by(|a, b| a.total_cmp(b));
            let q1 = quantile(&vals, 0.25);
            let q2 = quantile(&vals, 0.5);
            let q3 = quantile(&vals, 0.75);
            let iqr = q3 - q1;
            BoxStats {
                label,
                position,
                q1,
                q2,
                q3,
                lower: q1 - 1.5 * iqr,
                upper: q3 + 1.5 * iqr,
            }
        })
        .collect())
}

/// Create a (e.g. time-) series of boxplots for a variable.
pub fn boxplot_series(
    groups: &Groups,
    values: &[f64],
    xlim: Bounds,
    ylim: Bounds,
    opts: &FigureOptions,
) -> Result<Figure> {
    let stats = box_stats(groups, values)?;
    if stats.is_empty() {
        return Err(AplanatError::EmptyData("no values for boxplots".into()));
    }
    let positions: Vec<f64> = stats.iter().map(|s| s.position).collect();
    let (x_start, x_end) = pad(&positions)?;
    let first = positions.iter().copied().fold(f64::INFINITY, f64::min);
    let half_width = 0.8 * (first - x_start);

    let mut fig = Figure::new(opts.clone());

    // stems
    let mut stem_x = Vec::new();
    let mut stem_y = Vec::new();
    for s in &stats {
        for (from, to) in [(s.upper, s.q3), (s.lower, s.q1)] {
            stem_x.extend([Some(s.position), Some(s.position), None]);
            stem_y.extend([Some(from), Some(to), None]);
        }
    }
    fig.add_trace(
        Scatter::new(stem_x, stem_y)
            .mode(Mode::Lines)
            .line(Line::new().color("black").width(1.0))
            .show_legend(false),
    );

    // boxes
    let boxes: Vec<Vec<(f64, f64)>> = stats
        .iter()
        .flat_map(|s| {
            [(s.q2, s.q3), (s.q1, s.q2)].map(|(low, high)| {
                rect(s.position - half_width, s.position + half_width, low, high)
            })
        })
        .collect();
    fig.add_trace(polygon_trace(&boxes, "blue", Some("black"), 0.7, None));

    if let Groups::Categorical(_) = groups {
        fig.x_ticks = Some(Ticks {
            values: positions.clone(),
            labels: stats.iter().map(|s| s.label.clone()).collect(),
        });
    }

    let mut x_lim = Limiter::with_limits(x_start, x_end);
    x_lim.fix_bounds(xlim);
    let mut y_lim = Limiter::new();
    y_lim.accumulate(values).fix_bounds(ylim);
    fig.set_x_range(Range1d::bounded(x_lim.min, x_lim.max));
    fig.set_y_range(Range1d::bounded(y_lim.min, y_lim.max));
    Ok(fig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hbar_stacks_classes() {
        let fig = single_hbar(
            &[1.0, 2.0, 3.0],
            &["a", "b", "c"],
            &["red", "green", "blue"],
            &hbar_options(),
        )
        .unwrap();
        assert_eq!(fig.trace_count(), 3);
        assert_eq!(fig.x_range.unwrap().end, 7.0);
        assert!(!fig.options.show_y_axis);
    }

    #[test]
    fn hbar_requires_equal_lengths() {
        let err = single_hbar(&[1.0], &["a", "b"], &["red"], &hbar_options());
        assert!(err.is_err());
    }

    #[test]
    fn categorical_boxes_follow_first_appearance() {
        let groups = Groups::Categorical(
            ["b", "a", "b", "a", "b"].iter().map(|s| s.to_string()).collect(),
        );
        let stats = box_stats(&groups, &[1.0, 10.0, 3.0, 20.0, 5.0]).unwrap();
        assert_eq!(stats[0].label, "b");
        assert_eq!(stats[0].position, 0.0);
        assert_eq!(stats[0].q2, 3.0);
        assert_eq!(stats[0].q1, 2.0);
        assert_eq!(stats[0].upper, 4.0 + 1.5 * 2.0);
        assert_eq!(stats[1].position, 1.0);
    }

    #[test]
    fn numeric_boxplot_ranges_are_padded() {
        let groups = Groups::Numeric(vec![1.0, 1.0, 3.0, 3.0]);
        let fig = boxplot_series(
            &groups,
            &[0.0, 1.0, 2.0, 5.0],
            (None, None),
            (None, Some(6.0)),
            &FigureOptions::default(),
        )
        .unwrap();
        assert_eq!(fig.x_range.unwrap().start, 0.0);
        assert_eq!(fig.x_range.unwrap().end, 4.0);
        assert_eq!(fig.y_range.unwrap().end, 6.0);
        assert!(fig.x_ticks.is_none());
    }
}
