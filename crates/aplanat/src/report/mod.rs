//! Report building from multiple items.
//!
//! A report is an ordered collection of [`HtmlSection`]s, each an ordered
//! map from key to item. Items are anything implementing [`Component`]:
//! figures, grids, facet layouts, tables, infographics and raw HTML.
//! Rendering produces a single standalone HTML page.
pub mod page;
pub mod section;
pub mod table;

use maud::{html, Markup, PreEscaped};

use crate::figure::Figure;

pub use page::{HtmlReport, ReportStyle, WorkflowReport};
pub use section::{AlertLevel, HtmlSection};
pub use table::{Table, TableOptions};

/// An item that can be placed in a report section.
pub trait Component {
    /// Render the item; `id` is unique within the report.
    fn render(&self, id: &str) -> Markup;
}

/// Pre-rendered HTML, inserted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHtml(pub String);

impl Component for RawHtml {
    fn render(&self, _id: &str) -> Markup {
        PreEscaped(self.0.clone())
    }
}

impl Component for Figure {
    fn render(&self, id: &str) -> Markup {
        match self.to_inline_html(id) {
            Ok(html) => PreEscaped(html),
            Err(e) => {
                log::error!("Failed to render figure {}: {}", id, e);
                html! { div id=(id) class="alert alert-danger" { "Failed to render figure: " (e.to_string()) } }
            }
        }
    }
}
