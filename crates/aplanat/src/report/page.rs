use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AplanatError, Result};
use crate::report::section::HtmlSection;

pub const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
pub const DATATABLES_JS: &str = "https://cdn.jsdelivr.net/npm/simple-datatables@latest";
pub const DATATABLES_CSS: &str =
    "https://cdn.jsdelivr.net/npm/simple-datatables@latest/dist/style.css";
pub const BOOTSTRAP_CSS: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@4.6.2/dist/css/bootstrap.min.css";
pub const FONT_AWESOME_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/5.15.4/css/all.min.css";

/// House style of the report page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStyle {
    #[default]
    Ont,
    Ond,
    Epi2me,
    Wf,
}

impl ReportStyle {
    fn css(&self) -> &'static str {
        match self {
            ReportStyle::Ont => {
                "body{font-family:Arial,Helvetica,sans-serif;color:#001A21;}\
                 .jumbotron{background-color:#0084A9;color:white;}\
                 h1,h2,h3{color:#0084A9;}"
            }
            ReportStyle::Ond => {
                "body{font-family:Arial,Helvetica,sans-serif;color:#001A21;}\
                 .jumbotron{background-color:#455556;color:white;}\
                 h1,h2,h3{color:#455556;}"
            }
            ReportStyle::Epi2me => {
                "body{font-family:Arial,Helvetica,sans-serif;color:#001A21;}\
                 .jumbotron{background-color:#A53F96;color:white;}\
                 h1,h2,h3{color:#A53F96;}"
            }
            ReportStyle::Wf => {
                "body{font-family:Arial,Helvetica,sans-serif;color:#001A21;}\
                 .jumbotron{background-color:#F0EFED;color:#0084A9;}\
                 h1,h2,h3{color:#0084A9;}"
            }
        }
    }
}

impl FromStr for ReportStyle {
    type Err = AplanatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ont" => Ok(ReportStyle::Ont),
            "ond" => Ok(ReportStyle::Ond),
            "epi2me" => Ok(ReportStyle::Epi2me),
            "wf" => Ok(ReportStyle::Wf),
            other => Err(AplanatError::UnknownStyle(other.to_string())),
        }
    }
}

/// A standalone HTML report made of sections.
///
/// The report always holds a `main` section; further sections are
/// rendered after it in the order they were added.
#[derive(Debug)]
pub struct HtmlReport {
    pub title: String,
    pub lead: String,
    pub style: ReportStyle,
    /// PNG file embedded as the header logo.
    pub logo: Option<PathBuf>,
    sections: Vec<(String, HtmlSection)>,
}

impl HtmlReport {
    pub fn new(title: &str, lead: &str) -> Self {
        Self::with_options(title, lead, ReportStyle::default(), None, false)
    }

    pub fn with_options(
        title: &str,
        lead: &str,
        style: ReportStyle,
        logo: Option<PathBuf>,
        require_keys: bool,
    ) -> Self {
        Self {
            title: title.to_string(),
            lead: lead.to_string(),
            style,
            logo,
            sections: vec![("main".to_string(), HtmlSection::new(require_keys))],
        }
    }

    /// The `main` section.
    pub fn main(&mut self) -> &mut HtmlSection {
        &mut self.sections[0].1
    }

    /// Add a section, or replace the one under `key` keeping its position.
    pub fn add_section(&mut self, key: Option<&str>, section: Option<HtmlSection>) -> &mut HtmlSection {
        let key = key.map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
        let section = section.unwrap_or_default();
        let index = match self.sections.iter().position(|(k, _)| *k == key) {
            Some(i) => {
                self.sections[i].1 = section;
                i
            }
            None => {
                self.sections.push((key, section));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index].1
    }

    pub fn section(&mut self, key: &str) -> Option<&mut HtmlSection> {
        self.sections
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, s)| s)
    }

    pub fn remove_section(&mut self, key: &str) -> Option<HtmlSection> {
        let index = self.sections.iter().position(|(k, _)| k == key)?;
        if index == 0 {
            return None;
        }
        Some(self.sections.remove(index).1)
    }

    pub fn section_keys(&self) -> Vec<&str> {
        self.sections.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn logo_uri(&self) -> Result<Option<String>> {
        match &self.logo {
            Some(path) => {
                let bytes = fs::read(path)?;
                Ok(Some(format!("data:image/png;base64,{}", STANDARD.encode(bytes))))
            }
            None => Ok(None),
        }
    }

    /// Render the report as an HTML page.
    pub fn render(&self) -> Result<String> {
        let mut body: Vec<Markup> = Vec::new();
        for (i, (_, section)) in self.sections.iter().enumerate() {
            body.extend(section.components(&format!("s{}", i))?);
        }
        let logo = self.logo_uri()?;
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let page = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (self.title) }
                    link rel="stylesheet" href=(BOOTSTRAP_CSS);
                    link rel="stylesheet" href=(DATATABLES_CSS);
                    link rel="stylesheet" href=(FONT_AWESOME_CSS);
                    style { (PreEscaped(self.style.css())) }
                    script src=(PLOTLY_JS) {}
                    script src=(DATATABLES_JS) type="text/javascript" {}
                }
                body {
                    div class="jumbotron" {
                        div class="container" {
                            @if let Some(logo) = &logo {
                                img src=(logo) alt="logo" style="float:right;max-height:60px;";
                            }
                            h1 class="display-4" { (self.title) }
                            p class="lead" { (self.lead) }
                        }
                    }
                    div class="container" {
                        @for item in &body {
                            div class="report-item" { (item) }
                        }
                    }
                    footer class="container text-muted" {
                        p { "Report generated " (generated) " with aplanat " (crate::VERSION) "." }
                    }
                }
            }
        };
        Ok(page.into_string())
    }

    /// Write the rendered report to `path`.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let html = self.render()?;
        fs::write(&path, html)?;
        log::info!("Report written to {}", path.as_ref().display());
        Ok(())
    }
}

/// A report for a Nextflow workflow, ending with an "About" section.
#[derive(Debug)]
pub struct WorkflowReport {
    pub report: HtmlReport,
    pub workflow: String,
    pub provider: String,
    pub revision: String,
    pub commit: String,
    pub about: bool,
    tail_key: String,
}

fn or_unknown(value: Option<&str>) -> String {
    value.unwrap_or("unknown").to_string()
}

impl WorkflowReport {
    pub fn new(
        title: &str,
        workflow: Option<&str>,
        provider: Option<&str>,
        revision: Option<&str>,
        commit: Option<&str>,
    ) -> Self {
        let workflow = or_unknown(workflow);
        let provider = or_unknown(provider);
        let lead = format!(
            "Results generated through the {} Nextflow workflow provided by {}.",
            workflow, provider
        );
        Self {
            report: HtmlReport::with_options(title, &lead, ReportStyle::Wf, None, false),
            workflow,
            provider,
            revision: or_unknown(revision),
            commit: or_unknown(commit),
            about: true,
            tail_key: Uuid::new_v4().to_string(),
        }
    }

    pub fn main(&mut self) -> &mut HtmlSection {
        self.report.main()
    }

    pub fn add_section(&mut self, key: Option<&str>, section: Option<HtmlSection>) -> &mut HtmlSection {
        self.report.add_section(key, section)
    }

    fn about_text(&self) -> String {
        format!(
            "
            ### About
            This report was produced using the
            [{0}/{1}](https://github.com/{0}/{1}). The
            workflow can be run using `nextflow run {0}/{1} --help`.

            **Version details** *Revision*: {2} *Git Commit*: {3}

            ---
            ",
            self.provider, self.workflow, self.revision, self.commit
        )
    }

    /// Render the report; the "About" tail is rebuilt each time so that it
    /// always comes last.
    pub fn render(&mut self) -> Result<String> {
        self.report.remove_section(&self.tail_key);
        if self.about {
            let text = self.about_text();
            let key = self.tail_key.clone();
            self.report.add_section(Some(&key), None).markdown(&text, None)?;
        }
        self.report.render()
    }

    pub fn write<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let html = self.render()?;
        fs::write(&path, html)?;
        log::info!("Report written to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_parse() {
        assert_eq!("epi2me".parse::<ReportStyle>().unwrap(), ReportStyle::Epi2me);
        assert!("fancy".parse::<ReportStyle>().is_err());
    }

    #[test]
    fn sections_render_in_order() {
        let mut report = HtmlReport::new("Title", "Lead text");
        report.main().html("<p>one</p>", None).unwrap();
        report
            .add_section(Some("extra"), None)
            .html("<p>two</p>", None)
            .unwrap();
        report.main().html("<p>three</p>", None).unwrap();
        let html = report.render().unwrap();
        let one = html.find("<p>one</p>").unwrap();
        let two = html.find("<p>two</p>").unwrap();
        let three = html.find("<p>three</p>").unwrap();
        assert!(one < three && three < two);
        assert!(html.contains("<p class=\"lead\">Lead text</p>"));
        assert!(html.contains(PLOTLY_JS));
    }

    #[test]
    fn element_ids_are_unique_across_sections() {
        let plot = || {
            let mut fig = crate::Figure::default();
            fig.add_trace(plotly::Scatter::new(vec![0.0, 1.0], vec![1.0, 2.0]));
            fig
        };
        let mut report = HtmlReport::new("t", "l");
        report.main().plot(plot(), Some("plot")).unwrap();
        report.add_section(Some("second"), None).plot(plot(), Some("plot")).unwrap();
        let html = report.render().unwrap();
        assert_eq!(html.matches("id=\"s0-i0\"").count(), 1);
        assert_eq!(html.matches("id=\"s1-i0\"").count(), 1);
        assert_eq!(html.matches("id=\"plot\"").count(), 0);
    }

    #[test]
    fn main_section_cannot_be_removed() {
        let mut report = HtmlReport::new("t", "l");
        assert!(report.remove_section("main").is_none());
        assert_eq!(report.section_keys(), vec!["main"]);
    }

    #[test]
    fn workflow_tail_is_rebuilt_not_duplicated() {
        let mut report = WorkflowReport::new("wf report", Some("wf-test"), Some("epi2me-labs"), None, None);
        assert!(report.report.lead.contains("wf-test Nextflow workflow provided by epi2me-labs"));
        report.main().html("<p>body</p>", None).unwrap();
        let first = report.render().unwrap();
        let second = report.render().unwrap();
        assert_eq!(first.matches("<h3>About</h3>").count(), 1);
        assert_eq!(second.matches("<h3>About</h3>").count(), 1);
        assert!(second.contains("<em>Revision</em>: unknown"));
        assert!(second.find("<p>body</p>").unwrap() < second.find("<h3>About</h3>").unwrap());
    }
}
