//! Plotting of spatial/3D data.
use std::collections::BTreeMap;

use plotly::common::{ColorBar, ColorScale, ColorScaleElement};
use plotly::HeatMap;

use crate::error::{AplanatError, Result};
use crate::figure::{polygon_trace, Figure, FigureOptions, Range1d};
use crate::palettes::{LinearColorMapper, BLUES9};
use crate::util::{pad, Limiter};

fn blues_light_to_dark() -> Vec<String> {
    BLUES9.iter().rev().map(|c| c.to_string()).collect()
}

/// Create a heatmap from three columns.
///
/// Each `(x, y)` pair is drawn as a unit cell coloured by `z`; `name` titles
/// the colour bar.
pub fn heatmap(
    x: &[f64],
    y: &[f64],
    z: &[f64],
    name: Option<&str>,
    opts: &FigureOptions,
) -> Result<Figure> {
    if x.len() != y.len() || x.len() != z.len() {
        return Err(AplanatError::LengthMismatch("x, y, and z".into()));
    }
    let palette = blues_light_to_dark();
    let steps = (palette.len() - 1) as f64;
    let scale: Vec<ColorScaleElement> = palette
        .iter()
        .enumerate()
        .map(|(i, c)| ColorScaleElement(i as f64 / steps, c.clone()))
        .collect();

    let mut trace = HeatMap::new(x.to_vec(), y.to_vec(), z.to_vec())
        .color_scale(ColorScale::Vector(scale));
    if let Some(name) = name {
        trace = trace.name(name).color_bar(ColorBar::new().title(name));
    }

    let mut figure = opts.clone();
    figure.show_x_axis = false;
    figure.show_y_axis = false;
    let mut fig = Figure::new(figure);
    fig.add_trace(trace);
    let (x0, x1) = pad(x)?;
    let (y0, y1) = pad(y)?;
    fig.set_x_range(Range1d::bounded(x0, x1));
    fig.set_y_range(Range1d::bounded(y0, y1));
    Ok(fig)
}

/// A hexagonal bin in axial coordinates (pointy-top orientation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexTile {
    pub q: i64,
    pub r: i64,
    pub count: usize,
}

const SQRT3: f64 = 1.732_050_807_568_877_2;

fn round_hex(q: f64, r: f64) -> (i64, i64) {
    let (x, z) = (q, r);
    let y = -x - z;
    let (rx, ry, rz) = (x.round_ties_even(), y.round_ties_even(), z.round_ties_even());
    let (dx, dy, dz) = ((rx - x).abs(), (ry - y).abs(), (rz - z).abs());
    let cond = dx > dy && dx > dz;
    let q = if cond { -(ry + rz) } else { rx };
    let r = if !cond && !(dy > dz) { -(rx + ry) } else { rz };
    (q as i64, r as i64)
}

/// Axial hex coordinates of a cartesian point for hexagons of `size`.
pub fn cartesian_to_axial(x: f64, y: f64, size: f64) -> (i64, i64) {
    let x = x / size;
    let y = -y / size;
    let q = SQRT3 / 3.0 * x - y / 3.0;
    let r = 2.0 / 3.0 * y;
    round_hex(q, r)
}

/// Centre of the hexagon at axial `(q, r)`.
pub fn axial_to_cartesian(q: i64, r: i64, size: f64) -> (f64, f64) {
    let (q, r) = (q as f64, r as f64);
    (size * SQRT3 * (q + r / 2.0), -size * 1.5 * r)
}

/// Count points falling into each hexagon of `size`.
///
/// Tiles are ordered by `(q, r)`.
pub fn hexbin(x: &[f64], y: &[f64], size: f64) -> Result<Vec<HexTile>> {
    if x.len() != y.len() {
        return Err(AplanatError::LengthMismatch("x and y".into()));
    }
    let mut counts: BTreeMap<(i64, i64), usize> = BTreeMap::new();
    for (&xi, &yi) in x.iter().zip(y) {
        if xi.is_finite() && yi.is_finite() {
            *counts.entry(cartesian_to_axial(xi, yi, size)).or_default() += 1;
        }
    }
    Ok(counts
        .into_iter()
        .map(|((q, r), count)| HexTile { q, r, count })
        .collect())
}

fn hexagon(cx: f64, cy: f64, size: f64) -> Vec<(f64, f64)> {
    (0..6)
        .map(|i| {
            let angle = (60.0 * i as f64 + 30.0).to_radians();
            (cx + size * angle.cos(), cy + size * angle.sin())
        })
        .collect()
}

/// Create a hexbin heat map of `(x, y)` point density.
pub fn hexbin_map(x: &[f64], y: &[f64], size: f64, opts: &FigureOptions) -> Result<Figure> {
    let tiles = hexbin(x, y, size)?;
    if tiles.is_empty() {
        return Err(AplanatError::EmptyData("no points to bin".into()));
    }
    let max_count = tiles.iter().map(|t| t.count).max().unwrap_or(1) as f64;
    let mapper = LinearColorMapper::new(blues_light_to_dark(), 0.0, max_count);

    let mut classes: BTreeMap<usize, Vec<Vec<(f64, f64)>>> = BTreeMap::new();
    let mut x_lim = Limiter::new();
    let mut y_lim = Limiter::new();
    for tile in &tiles {
        let (cx, cy) = axial_to_cartesian(tile.q, tile.r, size);
        x_lim.accumulate(&[cx - size, cx + size]);
        y_lim.accumulate(&[cy - size, cy + size]);
        classes
            .entry(mapper.index(tile.count as f64))
            .or_default()
            .push(hexagon(cx, cy, size));
    }

    let mut fig = Figure::new(opts.clone());
    for (index, hexagons) in classes {
        fig.add_trace(polygon_trace(&hexagons, &mapper.palette[index], None, 1.0, None));
    }
    fig.set_x_range(Range1d::bounded(x_lim.min, x_lim.max));
    fig.set_y_range(Range1d::bounded(y_lim.min, y_lim.max));
    log::debug!("Binned {} points into {} hexagons", x.len(), tiles.len());
    Ok(fig)
}
