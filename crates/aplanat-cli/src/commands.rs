//! Subcommand implementations.
use std::path::{Path, PathBuf};

use anyhow::Result;

use aplanat::components::{bcfstats, demo, depthcoverage, fastcat, mapula, nextclade, simple};
use aplanat::report::{HtmlReport, HtmlSection, WorkflowReport};

use crate::config::ReportConfig;

pub const DEMO_OUTPUT: &str = "aplanat_demo_report.html";
pub const SIMPLE_OUTPUT: &str = "simple_components_report.html";
pub const FASTCAT_OUTPUT: &str = "fastcat_report.html";
pub const BCFSTATS_OUTPUT: &str = "bcf_stats_report.html";
pub const NEXTCLADE_OUTPUT: &str = "nextclade_report.html";
pub const DEPTH_OUTPUT: &str = "depth_coverage.html";
pub const MAPULA_OUTPUT: &str = "mapula_report.html";

/// Write `sections` as a report configured by `config`.
///
/// A configured workflow name selects the workflow report layout.
pub fn write_report(
    config: &ReportConfig,
    default_title: &str,
    default_lead: &str,
    sections: Vec<HtmlSection>,
    output: &Path,
) -> Result<()> {
    let title = config.title.as_deref().unwrap_or(default_title);
    if config.workflow.is_some() {
        let mut report = WorkflowReport::new(
            title,
            config.workflow.as_deref(),
            config.provider.as_deref(),
            config.revision.as_deref(),
            config.commit.as_deref(),
        );
        // the workflow description is the default strapline
        if let Some(lead) = &config.lead {
            report.report.lead = lead.clone();
        }
        report.report.style = config.style;
        report.report.logo = config.logo.clone();
        for section in sections {
            report.add_section(None, Some(section));
        }
        report.write(output)?;
    } else {
        let lead = config.lead.as_deref().unwrap_or(default_lead);
        let mut report = HtmlReport::with_options(title, lead, config.style, config.logo.clone(), false);
        for section in sections {
            report.add_section(None, Some(section));
        }
        report.write(output)?;
    }
    Ok(())
}

pub fn run_demo(config: &ReportConfig, seed: u64) -> Result<PathBuf> {
    let output = config.output_or(DEMO_OUTPUT);
    let mut report = demo::demo_report(seed, &config.figure)?;
    if let Some(title) = &config.title {
        report.title = title.clone();
    }
    if let Some(lead) = &config.lead {
        report.lead = lead.clone();
    }
    report.style = config.style;
    report.logo = config.logo.clone();
    log::info!("Rendering report");
    report.write(&output)?;
    Ok(output)
}

pub fn run_simple(
    config: &ReportConfig,
    versions: Option<&Path>,
    params: Option<&Path>,
) -> Result<PathBuf> {
    let output = config.output_or(SIMPLE_OUTPUT);
    let mut sections = Vec::new();
    if let Some(versions) = versions {
        sections.push(simple::version_table(versions, None, None, None)?);
    }
    if let Some(params) = params {
        sections.push(simple::params_table(params, None, None, None)?);
    }
    if sections.is_empty() {
        anyhow::bail!("Nothing to report: provide --versions and/or --params");
    }
    write_report(
        config,
        "Simple component demo.",
        "A demonstration of small, simple reporting components.",
        sections,
        &output,
    )?;
    Ok(output)
}

pub fn run_fastcat(
    config: &ReportConfig,
    stats: &[PathBuf],
    sample_counts: bool,
    min_len: Option<f64>,
    max_len: Option<f64>,
) -> Result<PathBuf> {
    let output = config.output_or(FASTCAT_OUTPUT);
    let section = fastcat::full_report(
        stats,
        None,
        None,
        sample_counts,
        min_len,
        max_len,
        &config.figure,
    )?;
    write_report(
        config,
        "Read summary",
        "Per-read statistics from fastcat.",
        vec![section],
        &output,
    )?;
    Ok(output)
}

pub fn run_bcfstats(config: &ReportConfig, stats: &[PathBuf]) -> Result<PathBuf> {
    let output = config.output_or(BCFSTATS_OUTPUT);
    let section = bcfstats::full_report(stats, None, None, &config.figure)?;
    write_report(
        config,
        "bcftools stats",
        "Variant summaries from bcftools stats.",
        vec![section],
        &output,
    )?;
    Ok(output)
}

pub fn run_nextclade(config: &ReportConfig, json: &Path) -> Result<PathBuf> {
    let output = config.output_or(NEXTCLADE_OUTPUT);
    let section = nextclade::nextclade(json, true, None)?;
    write_report(
        config,
        "NextClade report",
        "Clade assignments from nextclade.",
        vec![section],
        &output,
    )?;
    Ok(output)
}

pub fn run_depthcoverage(
    config: &ReportConfig,
    depth: &Path,
    fwd: &Path,
    rev: &Path,
    tab: bool,
) -> Result<PathBuf> {
    let output = config.output_or(DEPTH_OUTPUT);
    let section = depthcoverage::full_report(depth, fwd, rev, None, None, tab, &config.figure)?;
    write_report(
        config,
        "Depth of coverage",
        "Genome coverage from mosdepth.",
        vec![section],
        &output,
    )?;
    Ok(output)
}

pub fn run_mapula(config: &ReportConfig, json: &Path, counts: Option<&Path>) -> Result<PathBuf> {
    let output = config.output_or(MAPULA_OUTPUT);
    let section = mapula::plot_mapping_stats(json, counts, None, &config.figure)?;
    write_report(
        config,
        "Alignment statistics",
        "Read alignment summaries from mapula.",
        vec![section],
        &output,
    )?;
    Ok(output)
}
