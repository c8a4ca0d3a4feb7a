//! A demonstration report exercising the plotting and report API.
use anyhow::Result;
use polars::prelude::{Column, DataFrame};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;
use statrs::statistics::Statistics;

use crate::annot;
use crate::bars::{boxplot_series, hbar_options, simple_bar, single_hbar, Groups};
use crate::base::{SeriesOptions, StepMode};
use crate::bio::{human_chromosomes, karyotype, KaryotypeOptions};
use crate::export::dump_json;
use crate::figure::FigureOptions;
use crate::graphics::{infographic, InfoGraphItems};
use crate::hist::{histogram, HistogramOptions};
use crate::layouts::grid;
use crate::lines::{line, steps};
use crate::points::points;
use crate::report::{HtmlReport, TableOptions};
use crate::spatial::{heatmap, hexbin_map};
use crate::util::{kernel_density_estimate, plot_wrapper};

const GALLERY: &str = "additional_section";

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

fn xy_frame(x: &[f64], y: &[f64]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("x".into(), x),
        Column::new("y".into(), y),
    ])?)
}

/// Build the demo report from normally distributed data drawn with `seed`.
///
/// `base` sets the size and presentation of figures that are not
/// deliberately narrow.
pub fn demo_report(seed: u64, base: &FigureOptions) -> Result<HtmlReport> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)?;
    let x: Vec<f64> = (0..2000).map(|_| normal.sample(&mut rng)).collect();
    let y: Vec<f64> = (0..2000).map(|_| normal.sample(&mut rng)).collect();
    let sorted_xy = vec![sorted(&x), sorted(&x)];
    let reversed_xy: Vec<Vec<f64>> = sorted_xy.iter().rev().cloned().collect();

    log::info!("Start a report");
    let mut report = HtmlReport::new("Aplanat Demo", "A brief demonstration of Aplanat's API.");

    // placeholders keep their position until filled in
    report.main().markdown("placeholder", Some("simple preamble"))?;
    report.add_section(Some(GALLERY), None);

    log::info!("Adding points plot");
    let series = SeriesOptions::with_figure(base.clone());
    let pnt_plot = points(&sorted_xy, &reversed_xy, &series)?;
    report.main().plot(pnt_plot, Some("points_plot"))?;

    log::info!("Testing json export");
    report.main().markdown("A simple line plot.", None)?;
    let line_plot = line(&sorted_xy, &reversed_xy, &series)?;
    let json = dump_json(&line_plot)?;
    log::info!("Some json: {}...", json.chars().take(40).collect::<String>());
    report.main().grid(grid(vec![line_plot], 1), Some("lines_plot"))?;

    report.main().placeholder("histogram preamble")?;
    log::info!("Adding histogram");
    let shifted = vec![
        x.iter().map(|v| v - 1.0).collect::<Vec<f64>>(),
        y.iter().map(|v| v + 1.0).collect::<Vec<f64>>(),
    ];
    let hist_opts = HistogramOptions::with_series(series.clone().colors(&["red", "green"]));
    let h = histogram(&shifted, &hist_opts)?;
    let h = annot::marker_vline(h, x.iter().mean() - 1.0, Some("x values - 1"), "red", 1.5);
    let h = annot::marker_vline(h, y.iter().mean() + 1.0, Some("y values + 1"), "green", 1.5);
    report.main().plot(h, None)?;

    log::info!("Deleting an item for fun");
    report.main().markdown("Garbage", Some("garbage"))?;
    report.main().remove("garbage");

    log::info!("Adding heatmaps");
    report.main().placeholder("heatmap preamble")?;
    report
        .main()
        .plot(hexbin_map(&x, &y, 0.25, base)?, None)?;
    let (gx, gy, gz): (Vec<f64>, Vec<f64>, Vec<f64>) = (0..100)
        .map(|i| {
            let (a, b) = ((i % 10) as f64, (i / 10) as f64);
            (a, b, a * b)
        })
        .fold((Vec::new(), Vec::new(), Vec::new()), |(mut xs, mut ys, mut zs), (a, b, c)| {
            xs.push(a);
            ys.push(b);
            zs.push(c);
            (xs, ys, zs)
        });
    report
        .main()
        .plot(heatmap(&gx, &gy, &gz, Some("x * y"), base)?, None)?;

    log::info!("Adding table");
    report.main().placeholder("table preamble")?;
    let frame = xy_frame(&x, &y)?;
    report.main().markdown("Here's a table:", None)?;
    let small = TableOptions {
        paging: false,
        sortable: false,
        ..TableOptions::default()
    };
    report
        .main()
        .table(&frame.head(Some(5)), small, Some("Table with auto_height"))?;
    report.main().markdown(
        "Here's a second table with more data, pagination, and searchable",
        None,
    )?;
    let swapped = xy_frame(&y, &x)?;
    report.main().table(
        &swapped,
        TableOptions::default().option("perPage", 10),
        Some("Table with more data and pagination"),
    )?;

    log::info!("Adding boxplot");
    report.main().placeholder("boxplot preamble")?;
    let x_discrete: Vec<f64> = x.iter().map(|v| v.round()).collect();
    let x_str: Vec<String> = x_discrete.iter().map(|v| v.abs().to_string()).collect();
    let narrow = |title: &str| FigureOptions::titled(title).with_size(Some(300), 300);
    let boxes = vec![
        boxplot_series(
            &Groups::Numeric(x_discrete),
            &y,
            (None, None),
            (None, None),
            &narrow("continuous"),
        )?,
        boxplot_series(
            &Groups::Categorical(x_str),
            &y,
            (None, None),
            (None, None),
            &narrow("categorical"),
        )?,
    ];
    report.main().grid(grid(boxes, 2), None)?;

    if let Some(gallery) = report.section(GALLERY) {
        gallery.placeholder("gallery preamble")?;
        log::info!("Adding some infographics");
        let mut summary = InfoGraphItems::new();
        summary.append("Example", 0.0051, "angle-up", "%")?;
        summary.append("Total reads", 1_000_000u64, "angle-up", "")?;
        summary.append("Total yield", 1e9, "signal", "b")?;
        summary.append("Mean read length", 50e3, "align-center", "b")?;
        summary.append("Mean qscore (pass)", 14.0, "thumbs-up", "")?;
        gallery.component(infographic(summary.values()), None)?;

        log::info!("Adding karyogram");
        let chromosomes = human_chromosomes("chr");
        let mut positions = Vec::new();
        let mut names = Vec::new();
        for _ in 0..2000 {
            let chrom = &chromosomes[rng.gen_range(0..chromosomes.len())];
            positions.push(rng.gen_range(0..chrom.length) as f64);
            names.push(chrom.name.clone());
        }
        let opts = KaryotypeOptions {
            chromosomes: Some(chromosomes.clone()),
            ..KaryotypeOptions::default()
        };
        gallery.plot(karyotype(&[positions], &[names], &opts)?, None)?;

        log::info!("Adding density, steps and stacked bar");
        let (kx, ky) = kernel_density_estimate(&x, 0.1)?;
        let step_opts = SeriesOptions::with_figure(base.clone().with_title("Density"));
        gallery.plot(steps(&[kx], &[ky], StepMode::Center, &step_opts)?, None)?;
        gallery.plot(
            single_hbar(
                &[30.0, 50.0, 20.0],
                &["pass", "fail", "unclassified"],
                &["#17BB75", "#EF4134", "#B5AEA7"],
                &hbar_options(),
            )?,
            None,
        )?;
    }

    report.main().placeholder("failed plot preamble")?;
    log::info!("Adding failed plot, an error will be logged below.");
    let groups = ["x1", "x2", "x3", "4", "x5"];
    let plot = plot_wrapper(simple_bar(&groups, &[1.0], None, base), "demo bars");
    report.main().plot(plot, None)?;
    log::info!("End of plot that will fail.");

    log::info!("Checking empty placeholder validation");
    if let Err(e) = report.render() {
        log::info!("Caught error as expected: {}", e);
    }

    let preambles = [
        ("simple preamble", "### Simple plots\n\nA simple points plot:"),
        ("histogram preamble", "### Histograms\n\nMulti-variate histograms:"),
        ("heatmap preamble", "### Heatmaps\n\nHeatmaps from `x-y` values:"),
        ("table preamble", "### Tables\n\nData tables:"),
        (
            "boxplot preamble",
            "### Boxplots\n\nA series of boxplots using either a continuous or categorical grouping:",
        ),
        ("failed plot preamble", "### Failed Plot\n\nWhen plot fails:"),
    ];
    for (key, text) in preambles {
        report.main().markdown(text, Some(key))?;
    }
    if let Some(gallery) = report.section(GALLERY) {
        gallery.markdown("### Gallery\n\nAssortment of possibilities:", Some("gallery preamble"))?;
    }
    Ok(report)
}
