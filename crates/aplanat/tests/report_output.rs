//! Integration tests for writing reports and exported figures to disk.

use aplanat::base::SeriesOptions;
use aplanat::lines::line;
use aplanat::report::{HtmlReport, ReportStyle, TableOptions, WorkflowReport};
use aplanat::{export_jsx, save_html, Background, DataFrame, Figure, FigureOptions};

fn line_plot() -> Figure {
    let opts = SeriesOptions::with_figure(FigureOptions::titled("A line"));
    line(&[vec![0.0, 1.0, 2.0]], &[vec![2.0, 1.0, 3.0]], &opts).unwrap()
}

// ---------------------------------------------------------------------------
// HtmlReport
// ---------------------------------------------------------------------------

#[test]
fn report_is_written_with_plots_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.html");

    let mut report = HtmlReport::new("Integration", "Written by a test");
    report.main().plot(line_plot(), Some("line")).unwrap();
    let frame: DataFrame = polars::df!("sample" => ["a", "b"], "reads" => [10i64, 20]).unwrap();
    report
        .main()
        .table(&frame, TableOptions::default(), Some("table"))
        .unwrap();
    report.write(&path).unwrap();

    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Integration</title>"));
    assert!(html.contains("A line"));
    assert!(html.contains("<td>20</td>"));
    assert!(html.contains("Report generated"));
}

#[test]
fn unfilled_placeholder_blocks_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.html");
    let mut report = HtmlReport::new("t", "l");
    report.main().placeholder("later").unwrap();
    assert!(report.write(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn logo_is_embedded_as_base64() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    std::fs::write(&logo, [0x89u8, b'P', b'N', b'G']).unwrap();
    let report = HtmlReport::with_options("t", "l", ReportStyle::Epi2me, Some(logo), false);
    let html = report.render().unwrap();
    assert!(html.contains("data:image/png;base64,iVBORw=="));
}

#[test]
fn workflow_report_writes_about_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wf.html");
    let mut report = WorkflowReport::new("wf", Some("wf-demo"), None, Some("v1.0"), Some("abc123"));
    report.main().markdown("### Results", None).unwrap();
    report.write(&path).unwrap();
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("provided by unknown."));
    assert!(html.contains("abc123"));
    assert!(html.contains("<h3>Results</h3>"));
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

#[test]
fn jsx_export_defines_default_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plot.jsx");
    export_jsx(&line_plot(), &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("const plotJson = {"));
    assert!(text.ends_with("\nexport default plotJson"));
}

#[test]
fn save_html_applies_background_to_copy_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plot.html");
    let plot = line_plot();
    let background: Background = "#F0EFED".parse().unwrap();
    save_html(&plot, &path, Some(&background)).unwrap();
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("#F0EFED"));
    assert!(plot.options.background.is_none());
}
