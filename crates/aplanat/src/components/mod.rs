//! Ready-made report sections.
pub mod bcfstats;
pub mod demo;
pub mod depthcoverage;
pub mod fastcat;
pub mod mapula;
pub mod nextclade;
pub mod simple;

use crate::report::HtmlSection;

/// Use the given section or start a new one.
pub(crate) fn section_or_new(section: Option<HtmlSection>) -> HtmlSection {
    section.unwrap_or_default()
}
