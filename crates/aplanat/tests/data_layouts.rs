//! Integration tests for reading delimited data and building facet layouts.

use aplanat::base::SeriesOptions;
use aplanat::layouts::{Aes, FacetOptions};
use aplanat::lines::line;
use aplanat::report::{Component, HtmlSection};
use aplanat::dataframe::{floats, labels, read_delimited};
use aplanat::util::read_files;
use aplanat::{facet_grid, AplanatError, DataFrame};
use polars::prelude::DataType;

fn write_tsv(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

#[test]
fn delimited_columns_are_typed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tsv(
        dir.path(),
        "a.tsv",
        "read_id\tread_length\tsample_name\nr1\t100\ts1\nr2\t250.5\ts2\n",
    );
    let frame = read_delimited(&path, b'\t').unwrap();
    assert_eq!(frame.height(), 2);
    assert_eq!(floats(&frame, "read_length").unwrap(), vec![100.0, 250.5]);
    assert_eq!(frame.column("sample_name").unwrap().dtype(), &DataType::String);
    assert_eq!(labels(&frame, "sample_name").unwrap(), vec!["s1", "s2"]);
}

#[test]
fn multiple_files_are_concatenated() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_tsv(dir.path(), "a.tsv", "x\ty\n1\t2\n");
    let b = write_tsv(dir.path(), "b.tsv", "x\ty\n3\t4\n5\t6\n");
    let frame = read_files(&[a, b], b'\t').unwrap();
    assert_eq!(floats(&frame, "x").unwrap(), vec![1.0, 3.0, 5.0]);
}

#[test]
fn missing_file_is_an_error() {
    let err = read_delimited("/nonexistent/file.tsv", b'\t').unwrap_err();
    assert!(matches!(err, AplanatError::Polars(_)));
}

// ---------------------------------------------------------------------------
// Facet grids
// ---------------------------------------------------------------------------

fn frame() -> DataFrame {
    polars::df!(
        "pos" => [1.0, 2.0, 3.0, 1.0, 2.0, 3.0],
        "depth" => [10.0, 20.0, 30.0, 5.0, 15.0, 25.0],
        "strand" => ["+", "+", "+", "-", "-", "-"],
        "chrom" => ["chr1", "chr1", "chr2", "chr1", "chr2", "chr2"]
    )
    .unwrap()
}

#[test]
fn transforms_are_applied_before_plotting() {
    let mut opts = FacetOptions::new().facet(Some("chrom"), None);
    opts.transform.1 = Some(Box::new(|y: &[f64]| y.iter().map(|v| v * 2.0).collect()));
    let grid = facet_grid(&frame(), &Aes::new("pos", "depth"), line, &opts).unwrap();
    let y = grid.plots().next().unwrap().y_range.unwrap();
    assert_eq!((y.start, y.end), (10.0, 60.0));
}

#[test]
fn linked_axes_emit_relayout_script() {
    let opts = FacetOptions::new()
        .facet(Some("chrom"), Some("strand"))
        .labels("position", "depth")
        .headings("Chromosome", "Strand");
    let aes = Aes::new("pos", "depth").colour("strand");
    let grid = facet_grid(&frame(), &aes, line, &opts).unwrap();
    assert_eq!((grid.ncols(), grid.nrows()), (2, 2));
    let html = grid.render("cov").into_string();
    assert!(html.contains("plotly_relayout"));
    assert!(html.contains("Chromosome"));
    assert!(html.contains("\"cov-0-0\""));

    let mut section = HtmlSection::default();
    section.layout(grid, Some("coverage")).unwrap();
    assert_eq!(section.components("s0").unwrap().len(), 1);
}

#[test]
fn unlinked_axes_have_no_script() {
    let mut opts = FacetOptions::new().facet(Some("chrom"), None);
    opts.link_axes = false;
    let grid = facet_grid(
        &frame(),
        &Aes::new("pos", "depth"),
        |x: &[Vec<f64>], y: &[Vec<f64>], o: &SeriesOptions| line(x, y, o),
        &opts,
    )
    .unwrap();
    assert!(!grid.render("cov").into_string().contains("plotly_relayout"));
}
