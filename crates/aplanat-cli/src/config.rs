use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use aplanat::report::ReportStyle;
use aplanat::FigureOptions;

/// Report settings shared by all subcommands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: Option<String>,
    pub lead: Option<String>,
    pub style: ReportStyle,
    /// PNG embedded in the report header.
    pub logo: Option<PathBuf>,
    /// Nextflow workflow name; when set the report ends with an "About"
    /// section describing the workflow.
    pub workflow: Option<String>,
    pub provider: Option<String>,
    pub revision: Option<String>,
    pub commit: Option<String>,
    pub output: Option<PathBuf>,
    /// Presentation defaults for figures.
    pub figure: FigureOptions,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: None,
            lead: None,
            style: ReportStyle::Ont,
            logo: None,
            workflow: None,
            provider: None,
            revision: None,
            commit: None,
            output: None,
            figure: FigureOptions::default(),
        }
    }
}

/// Load a report configuration from a JSON file.
pub fn load_report_config<P: AsRef<Path>>(path: P) -> Result<ReportConfig> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: ReportConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

impl ReportConfig {
    /// Load the `--config` file if given, then apply command line overrides.
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let mut config = match matches.get_one::<PathBuf>("config") {
            Some(path) => {
                log::info!("Using config: {}", path.display());
                load_report_config(path)?
            }
            None => ReportConfig::default(),
        };

        if let Some(title) = matches.get_one::<String>("title") {
            config.title = Some(title.clone());
        }
        if let Some(lead) = matches.get_one::<String>("lead") {
            config.lead = Some(lead.clone());
        }
        if let Some(style) = matches.get_one::<String>("style") {
            config.style = style.parse()?;
        }
        if let Some(logo) = matches.get_one::<PathBuf>("logo") {
            config.logo = Some(logo.clone());
        }
        if let Some(output) = matches.get_one::<PathBuf>("output") {
            config.output = Some(output.clone());
        }
        Ok(config)
    }

    /// The output path, or `default` when none was configured.
    pub fn output_or(&self, default: &str) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from(default))
    }
}
