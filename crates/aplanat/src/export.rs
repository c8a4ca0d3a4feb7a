//! Exporting figures as JSON documents, JSX modules and standalone pages.
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use maud::{html, DOCTYPE};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AplanatError, Result};
use crate::figure::Figure;
use crate::report::page::PLOTLY_JS;
use crate::report::Component;

/// Export a figure to an embeddable JSON document.
///
/// The result holds the `target_id` to embed into, a fresh `root_id` and
/// the plotly `doc` (data and layout).
pub fn json_item(plot: &Figure, target: Option<&str>) -> Result<Value> {
    let doc = plot.to_value()?;
    Ok(json!({
        "target_id": target,
        "root_id": Uuid::new_v4().to_string(),
        "doc": doc,
    }))
}

/// JSON string of [`json_item`] without a target.
pub fn dump_json(plot: &Figure) -> Result<String> {
    Ok(serde_json::to_string(&json_item(plot, None)?)?)
}

/// Export a figure to a JSX (react) module.
pub fn export_jsx<P: AsRef<Path>>(plot: &Figure, path: P) -> Result<()> {
    let contents = format!("const plotJson = {}\nexport default plotJson", dump_json(plot)?);
    fs::write(path, contents)?;
    Ok(())
}

/// A plot background fill colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    Hex(String),
    Rgb(u8, u8, u8),
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Background::Hex(hex) => write!(f, "{}", hex),
            Background::Rgb(r, g, b) => write!(f, "rgb({},{},{})", r, g, b),
        }
    }
}

impl FromStr for Background {
    type Err = AplanatError;

    /// Accepts `#rgb`, `#rrggbb` or an `r,g,b` tuple (optionally
    /// parenthesised).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || AplanatError::InvalidColour(s.to_string());
        if let Some(hex) = s.strip_prefix('#') {
            if matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Ok(Background::Hex(s.to_string()));
            }
            return Err(invalid());
        }
        let inner = s.trim_start_matches('(').trim_end_matches(')');
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        let channel = |p: &str| p.parse::<u8>().map_err(|_| invalid());
        Ok(Background::Rgb(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
        ))
    }
}

/// Write a figure as a standalone HTML page.
///
/// `background` fills the plot and paper of the written copy only; the
/// figure itself is left unchanged.
pub fn save_html<P: AsRef<Path>>(plot: &Figure, path: P, background: Option<&Background>) -> Result<()> {
    let mut copy = plot.clone();
    if let Some(bg) = background {
        copy.options.background = Some(bg.to_string());
    }
    let title = copy.options.title.clone().unwrap_or_else(|| "aplanat".to_string());
    let page = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
                script src=(PLOTLY_JS) {}
            }
            body { (copy.render("plot")) }
        }
    };
    fs::write(&path, page.into_string())?;
    log::info!("Plot written to {}", path.as_ref().display());
    Ok(())
}
