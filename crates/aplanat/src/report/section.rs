use std::str::FromStr;

use maud::{html, Markup};
use polars::prelude::DataFrame;
use pulldown_cmark::{Options, Parser};
use uuid::Uuid;

use crate::error::{AplanatError, Result};
use crate::figure::Figure;
use crate::layouts::{FacetGrid, PlotGrid};
use crate::report::table::{Table, TableOptions};
use crate::report::{Component, RawHtml};
use crate::util::dedent;

/// Bootstrap alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Danger,
    Warning,
    Success,
    Info,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Danger => "danger",
            AlertLevel::Warning => "warning",
            AlertLevel::Success => "success",
            AlertLevel::Info => "info",
        }
    }
}

impl FromStr for AlertLevel {
    type Err = AplanatError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "danger" => Ok(AlertLevel::Danger),
            "warning" => Ok(AlertLevel::Warning),
            "success" => Ok(AlertLevel::Success),
            "info" => Ok(AlertLevel::Info),
            other => Err(AplanatError::InvalidAlertLevel(other.to_string())),
        }
    }
}

/// A section of a report.
///
/// Items are kept in insertion order. Adding an item under an existing key
/// replaces it without changing its position, so a key can be reserved
/// early with [`HtmlSection::placeholder`] and filled in later.
#[derive(Default)]
pub struct HtmlSection {
    items: Vec<(String, Option<Box<dyn Component>>)>,
    require_keys: bool,
}

impl std::fmt::Debug for HtmlSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlSection")
            .field("keys", &self.keys())
            .field("require_keys", &self.require_keys)
            .finish()
    }
}

impl HtmlSection {
    pub fn new(require_keys: bool) -> Self {
        Self {
            items: Vec::new(),
            require_keys,
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|(k, _)| k == key)
    }

    fn add_item(&mut self, item: Option<Box<dyn Component>>, key: Option<&str>) -> Result<String> {
        let key = match key {
            Some(key) => key.to_string(),
            None if self.require_keys => return Err(AplanatError::KeyRequired),
            None => Uuid::new_v4().to_string(),
        };
        match self.items.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = item,
            None => self.items.push((key.clone(), item)),
        }
        Ok(key)
    }

    /// Reserve a position to be filled in later.
    pub fn placeholder(&mut self, key: &str) -> Result<()> {
        self.add_item(None, Some(key))?;
        Ok(())
    }

    /// Add any component, returning the key it was stored under.
    pub fn component<C: Component + 'static>(&mut self, item: C, key: Option<&str>) -> Result<String> {
        self.add_item(Some(Box::new(item)), key)
    }

    pub fn plot(&mut self, plot: Figure, key: Option<&str>) -> Result<String> {
        self.component(plot, key)
    }

    pub fn grid(&mut self, grid: PlotGrid, key: Option<&str>) -> Result<String> {
        self.component(grid, key)
    }

    /// Add a facet grid layout.
    pub fn layout(&mut self, layout: FacetGrid, key: Option<&str>) -> Result<String> {
        self.component(layout, key)
    }

    pub fn table(&mut self, frame: &DataFrame, opts: TableOptions, key: Option<&str>) -> Result<String> {
        self.component(Table::new(frame, opts)?, key)
    }

    /// Add markdown formatted text.
    ///
    /// The text is dedented before conversion, so indented raw strings are
    /// fine. Empty text adds nothing and returns `None`.
    pub fn markdown(&mut self, text: &str, key: Option<&str>) -> Result<Option<String>> {
        if text.is_empty() {
            return Ok(None);
        }
        let text = dedent(text);
        let mut out = String::new();
        pulldown_cmark::html::push_html(&mut out, Parser::new_ext(&text, Options::ENABLE_TABLES));
        self.add_item(Some(Box::new(RawHtml(out))), key).map(Some)
    }

    /// Add an alert box. `level` is one of danger, warning, success or info.
    pub fn alert(&mut self, title: &str, text: &str, level: &str, key: Option<&str>) -> Result<Option<String>> {
        let level: AlertLevel = level.parse()?;
        if text.is_empty() {
            return Ok(None);
        }
        let markup = html! {
            div class={ "alert alert-" (level.as_str()) } {
                p { strong { (title) } }
                (text)
            }
        };
        self.add_item(Some(Box::new(RawHtml(markup.into_string()))), key)
            .map(Some)
    }

    /// Add raw HTML.
    pub fn html(&mut self, html: &str, key: Option<&str>) -> Result<String> {
        self.add_item(Some(Box::new(RawHtml(html.to_string()))), key)
    }

    /// Remove an item, returning whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|(k, _)| k != key);
        self.items.len() != before
    }

    /// Rendered items in order.
    ///
    /// Item `i` is rendered with the element id `{prefix}-i{i}`; keys are
    /// only unique within a section, so the caller picks a prefix that is
    /// unique within the page.
    pub fn components(&self, prefix: &str) -> Result<Vec<Markup>> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, (key, item))| match item {
                Some(item) => Ok(item.render(&format!("{}-i{}", prefix, i))),
                None => Err(AplanatError::UnassignedPlaceholder(key.clone())),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacing_a_key_keeps_its_position() {
        let mut section = HtmlSection::default();
        section.placeholder("first").unwrap();
        section.html("<p>second</p>", Some("second")).unwrap();
        assert!(matches!(
            section.components("s0"),
            Err(AplanatError::UnassignedPlaceholder(k)) if k == "first"
        ));
        section.html("<p>first</p>", Some("first")).unwrap();
        let rendered: Vec<String> = section
            .components("s0")
            .unwrap()
            .into_iter()
            .map(|m| m.into_string())
            .collect();
        assert_eq!(rendered, vec!["<p>first</p>", "<p>second</p>"]);
    }

    #[test]
    fn keys_are_generated_unless_required() {
        let mut section = HtmlSection::default();
        let key = section.html("x", None).unwrap();
        assert_eq!(key.len(), 36);

        let mut strict = HtmlSection::new(true);
        assert!(matches!(strict.html("x", None), Err(AplanatError::KeyRequired)));
    }

    #[test]
    fn markdown_is_dedented_and_converted() {
        let mut section = HtmlSection::default();
        assert!(section.markdown("", None).unwrap().is_none());
        section
            .markdown("\n    ### Heading\n    Some *text*\n", Some("md"))
            .unwrap();
        let html = section.components("s0").unwrap()[0].clone().into_string();
        assert!(html.contains("<h3>Heading</h3>"), "{}", html);
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn alerts_validate_level() {
        let mut section = HtmlSection::default();
        assert!(matches!(
            section.alert("Oops", "text", "fatal", None),
            Err(AplanatError::InvalidAlertLevel(_))
        ));
        assert!(section.alert("Oops", "", "info", None).unwrap().is_none());
        section.alert("Oops", "it broke", "danger", Some("a")).unwrap();
        let html = section.components("s0").unwrap()[0].clone().into_string();
        assert!(html.contains("alert alert-danger"));
        assert!(html.contains("<strong>Oops</strong>"));
    }

    #[test]
    fn render_ids_use_the_prefix_and_position() {
        let mut section = HtmlSection::default();
        let mut fig = Figure::default();
        fig.add_trace(plotly::Scatter::new(vec![0.0], vec![1.0]));
        section.plot(fig.clone(), Some("same")).unwrap();
        section.plot(fig, None).unwrap();
        let html: Vec<String> = section
            .components("s3")
            .unwrap()
            .into_iter()
            .map(|m| m.into_string())
            .collect();
        assert!(html[0].contains("id=\"s3-i0\""));
        assert!(html[1].contains("id=\"s3-i1\""));
    }

    #[test]
    fn remove_drops_items() {
        let mut section = HtmlSection::default();
        section.html("x", Some("a")).unwrap();
        assert!(section.remove("a"));
        assert!(!section.remove("a"));
        assert!(section.is_empty());
    }
}
