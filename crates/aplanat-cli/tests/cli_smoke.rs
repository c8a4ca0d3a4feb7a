//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `aplanat` binary to verify that
//! argument parsing, report writing, and error handling work end-to-end.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("aplanat").unwrap()
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("simple"))
        .stdout(predicate::str::contains("fastcat"))
        .stdout(predicate::str::contains("bcfstats"))
        .stdout(predicate::str::contains("nextclade"))
        .stdout(predicate::str::contains("depthcoverage"))
        .stdout(predicate::str::contains("mapula"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("aplanat"));
}

// ---------------------------------------------------------------------------
// demo
// ---------------------------------------------------------------------------

#[test]
fn demo_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("demo.html");
    cmd()
        .args(["demo", "--seed", "7", "--title", "My demo", "--output"])
        .arg(&output)
        .assert()
        .success();
    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("<title>My demo</title>"));
    assert!(html.contains("simpleDatatables.DataTable"));
}

#[test]
fn unknown_style_is_rejected() {
    cmd()
        .args(["demo", "--style", "fancy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fancy"));
}

// ---------------------------------------------------------------------------
// simple
// ---------------------------------------------------------------------------

#[test]
fn simple_requires_an_input() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .args(["simple", "--output"])
        .arg(dir.path().join("out.html"))
        .assert()
        .failure();
}

#[test]
fn simple_writes_version_and_param_tables() {
    let dir = tempfile::tempdir().unwrap();
    let versions = dir.path().join("versions.csv");
    let params = dir.path().join("params.json");
    let output = dir.path().join("simple.html");
    std::fs::write(&versions, "minimap2,2.24\nsamtools,1.15\n").unwrap();
    std::fs::write(&params, r#"{"threads": 4}"#).unwrap();
    cmd()
        .arg("simple")
        .arg("--versions")
        .arg(&versions)
        .arg("--params")
        .arg(&params)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("Software versions"));
    assert!(html.contains("<td>minimap2</td>"));
    assert!(html.contains("<td>threads</td>"));
}

#[test]
fn simple_missing_params_file_errors() {
    cmd()
        .args(["simple", "--params", "/nonexistent/params.json"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// fastcat
// ---------------------------------------------------------------------------

#[test]
fn fastcat_requires_stats_files() {
    cmd().arg("fastcat").assert().failure();
}

#[test]
fn fastcat_writes_workflow_report_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let stats = dir.path().join("per-read-stats.tsv");
    std::fs::write(
        &stats,
        "read_id\tread_length\tmean_quality\tsample_name\n\
         r1\t100\t9.5\tbarcode01\n\
         r2\t250\t11.0\tbarcode02\n\
         r3\t900\t12.5\tbarcode01\n",
    )
    .unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{"title": "Reads", "workflow": "wf-test", "provider": "epi2me-labs"}"#,
    )
    .unwrap();
    let output = dir.path().join("fastcat.html");
    cmd()
        .arg("fastcat")
        .arg(&stats)
        .arg("--samples")
        .args(["--min_len", "50"])
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("<title>Reads</title>"));
    assert!(html.contains("wf-test Nextflow workflow provided by epi2me-labs"));
    assert!(html.contains("<h3>About</h3>"));
    assert!(html.contains("Read length distribution."));
}

#[test]
fn workflow_report_keeps_the_given_lead() {
    let dir = tempfile::tempdir().unwrap();
    let versions = dir.path().join("versions.csv");
    std::fs::write(&versions, "minimap2,2.24\n").unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"workflow": "wf-test", "figure": {"height": 420}}"#).unwrap();
    let output = dir.path().join("simple.html");
    cmd()
        .arg("simple")
        .arg("--versions")
        .arg(&versions)
        .args(["--lead", "A custom strapline"])
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("A custom strapline"));
    assert!(!html.contains("wf-test Nextflow workflow"));
}

// ---------------------------------------------------------------------------
// bcfstats
// ---------------------------------------------------------------------------

const BCF_STATS: &str = "\
# This file was produced by bcftools stats (1.15+htslib-1.15)
# ID\t[2]id\t[3]tab-separated file names
ID\t0\tcalls.vcf.gz
# SN\t[2]id\t[3]key\t[4]value
SN\t0\tnumber of samples:\t1
SN\t0\tnumber of records:\t12
SN\t0\tnumber of SNPs:\t9
# TSTV\t[2]id\t[3]ts\t[4]tv\t[5]ts/tv
TSTV\t0\t6\t3\t2.00
# ST\t[2]id\t[3]type\t[4]count
ST\t0\tA>G\t2
ST\t0\tC>T\t3
# IDD\t[2]id\t[3]length (deletions negative)\t[4]number of sites\t[5]number of genotypes\t[6]mean VAF
IDD\t0\t-2\t1\t0\t.
IDD\t0\t1\t2\t0\t.
";

#[test]
fn bcfstats_requires_stats_files() {
    cmd().arg("bcfstats").assert().failure();
}

#[test]
fn bcfstats_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let stats = dir.path().join("calls.stats");
    std::fs::write(&stats, BCF_STATS).unwrap();
    let output = dir.path().join("bcf.html");
    cmd()
        .arg("bcfstats")
        .arg(&stats)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("<title>bcftools stats</title>"));
    assert!(html.contains("Plotly.newPlot"));
}

#[test]
fn bcfstats_rejects_other_files() {
    let dir = tempfile::tempdir().unwrap();
    let stats = dir.path().join("calls.stats");
    std::fs::write(&stats, "not\tbcftools\n").unwrap();
    cmd()
        .arg("bcfstats")
        .arg(&stats)
        .arg("--output")
        .arg(dir.path().join("bcf.html"))
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// nextclade
// ---------------------------------------------------------------------------

#[test]
fn nextclade_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("nextclade.json");
    std::fs::write(
        &json,
        r#"{"results": [{"seqName": "barcode01", "clade": "20A", "qc": {"overallStatus": "good"}}]}"#,
    )
    .unwrap();
    let output = dir.path().join("nextclade.html");
    cmd()
        .arg("nextclade")
        .arg(&json)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("NextClade analysis"));
    assert!(html.contains("<td>barcode01</td>"));
}

#[test]
fn nextclade_missing_json_errors() {
    cmd()
        .args(["nextclade", "/nonexistent/nextclade.json"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// depthcoverage
// ---------------------------------------------------------------------------

#[test]
fn depthcoverage_writes_tabbed_report() {
    let dir = tempfile::tempdir().unwrap();
    let regions = dir.path().join("regions.bed");
    std::fs::write(&regions, "chr1\t0\t100\t10\nchr1\t100\t200\t20\n").unwrap();
    let output = dir.path().join("depth.html");
    cmd()
        .arg("depthcoverage")
        .arg("--depth_file")
        .arg(&regions)
        .arg("--fwd")
        .arg(&regions)
        .arg("--rev")
        .arg(&regions)
        .arg("--tab")
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("Depth Coverage"));
    assert!(html.contains("Proportions covered"));
}

#[test]
fn depthcoverage_requires_strands() {
    let dir = tempfile::tempdir().unwrap();
    let regions = dir.path().join("regions.bed");
    std::fs::write(&regions, "chr1\t0\t100\t10\n").unwrap();
    cmd()
        .arg("depthcoverage")
        .arg("--depth_file")
        .arg(&regions)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--fwd"));
}

// ---------------------------------------------------------------------------
// mapula
// ---------------------------------------------------------------------------

#[test]
fn mapula_writes_dashboard_with_control_tab() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("mapula.json");
    std::fs::write(
        &json,
        r#"{"ref1": {
            "fasta": "ref.fasta", "barcode": "barcode01", "run_id": "run1",
            "observations": 4, "primary_count": 4, "base_pairs": 1000,
            "alignment_accuracies": [0, 2, 2], "read_lengths": [0, 4],
            "observed_references": {"a": 3, "b": 1}, "observed_reference_count": 2,
            "spearmans_rho": 1.0
        }}"#,
    )
    .unwrap();
    let counts = dir.path().join("counts.csv");
    std::fs::write(&counts, "reference,expected_count\na,30\nb,10\n").unwrap();
    let output = dir.path().join("mapula.html");
    cmd()
        .arg("mapula")
        .arg(&json)
        .arg("--counts")
        .arg(&counts)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("<title>Alignment statistics</title>"));
    assert!(html.contains("role=\"tab\">Accuracy</a>"));
    assert!(html.contains("role=\"tab\">Control</a>"));
    assert!(!html.contains("role=\"tab\">Quality</a>"));
}
