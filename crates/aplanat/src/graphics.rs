//! Plots which are more graphics than plots.
use maud::{html, Markup, PreEscaped};

use crate::error::{AplanatError, Result};
use crate::icons::is_icon;
use crate::report::Component;
use crate::util::{round_sigfig, si_format};

/// The headline value of an infographic item.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Number(f64),
    Text(String),
}

impl From<f64> for InfoValue {
    fn from(v: f64) -> Self {
        InfoValue::Number(v)
    }
}

impl From<u64> for InfoValue {
    fn from(v: u64) -> Self {
        InfoValue::Number(v as f64)
    }
}

impl From<&str> for InfoValue {
    fn from(v: &str) -> Self {
        InfoValue::Text(v.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(v: String) -> Self {
        InfoValue::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoItem {
    pub label: String,
    pub value: InfoValue,
    pub icon: String,
    pub unit: String,
}

impl InfoItem {
    /// Display text: SI-prefixed numbers with the unit appended, or three
    /// significant figures for percentages. Text is used as is.
    pub fn display_value(&self) -> String {
        match &self.value {
            InfoValue::Text(s) => s.clone(),
            InfoValue::Number(v) if self.unit == "%" => format!("{}%", round_sigfig(*v, 3)),
            InfoValue::Number(v) => format!("{}{}", si_format(*v), self.unit),
        }
    }
}

/// Cumulatively create items for an infographic.
///
/// Items are keyed by label; appending an existing label replaces the item
/// in place.
#[derive(Debug, Clone, Default)]
pub struct InfoGraphItems {
    items: Vec<InfoItem>,
}

impl InfoGraphItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<V: Into<InfoValue>>(
        &mut self,
        label: &str,
        value: V,
        icon: &str,
        unit: &str,
    ) -> Result<()> {
        if !is_icon(icon) {
            return Err(AplanatError::UnknownIcon(icon.to_string()));
        }
        let item = InfoItem {
            label: label.to_string(),
            value: value.into(),
            icon: icon.to_string(),
            unit: unit.to_string(),
        };
        match self.items.iter_mut().find(|i| i.label == label) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
        Ok(())
    }

    pub fn extend<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, InfoValue, String, String)>,
    {
        for (label, value, icon, unit) in items {
            self.append(&label, value, &icon, &unit)?;
        }
        Ok(())
    }

    pub fn values(&self) -> &[InfoItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A row of headline-number tiles.
#[derive(Debug, Clone)]
pub struct Infographic {
    pub items: Vec<InfoItem>,
}

/// Create an infographic from items; repeated labels are shown once.
pub fn infographic(items: &[InfoItem]) -> Infographic {
    let mut seen: Vec<&str> = Vec::new();
    let mut unique = Vec::new();
    for item in items {
        if seen.contains(&item.label.as_str()) {
            continue;
        }
        seen.push(&item.label);
        unique.push(item.clone());
    }
    Infographic { items: unique }
}

const TILE_STYLE: &str = ".aplanat-infographic{display:flex;flex-wrap:wrap;gap:4px;}\
.aplanat-infographic .tile{background:#2171b5;width:175px;height:100px;padding:8px 12px;\
box-sizing:border-box;position:relative;}\
.aplanat-infographic .value{color:#DEEBF7;font-size:24px;}\
.aplanat-infographic .label{color:#C6DBEF;font-size:16px;position:absolute;bottom:8px;}\
.aplanat-infographic .icon{color:#6BAED6;font-size:36px;position:absolute;right:12px;top:20px;}";

impl Component for Infographic {
    fn render(&self, id: &str) -> Markup {
        html! {
            style { (PreEscaped(TILE_STYLE)) }
            div id=(id) class="aplanat-infographic" {
                @for item in &self.items {
                    div class="tile" {
                        div class="value" { (item.display_value()) }
                        div class="label" { (item.label) }
                        i class={ "icon fas fa-" (item.icon) } {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_formatted_by_unit() {
        let mut items = InfoGraphItems::new();
        items.append("Example", 0.0051, "angle-up", "%").unwrap();
        items.append("Total reads", 1_000_000u64, "angle-up", "").unwrap();
        items.append("Total yield", 1e9, "signal", "b").unwrap();
        items.append("Run", "PAK123", "flask", "").unwrap();
        let shown: Vec<String> = items.values().iter().map(|i| i.display_value()).collect();
        assert_eq!(shown, vec!["0.0051%", "1.0 M", "1.0 Gb", "PAK123"]);
    }

    #[test]
    fn unknown_icons_are_rejected() {
        let mut items = InfoGraphItems::new();
        let err = items.append("Reads", 1.0, "no-such-icon", "").unwrap_err();
        assert!(matches!(err, AplanatError::UnknownIcon(_)));
        assert!(items.append("Reads", 1.0, "bar-chart", "").is_err());
        items.append("Beds", 12.0, "hospital", "").unwrap();
        items.append("Hosts", 3.0, "server", "").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn labels_replace_in_place() {
        let mut items = InfoGraphItems::new();
        items.append("a", 1.0, "check", "").unwrap();
        items.append("b", 2.0, "check", "").unwrap();
        items.append("a", 3.0, "check", "").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.values()[0].value, InfoValue::Number(3.0));
    }

    #[test]
    fn infographic_renders_tiles_once_per_label() {
        let item = InfoItem {
            label: "Reads".into(),
            value: InfoValue::Number(2500.0),
            icon: "signal".into(),
            unit: "".into(),
        };
        let graphic = infographic(&[item.clone(), item]);
        assert_eq!(graphic.items.len(), 1);
        let html = graphic.render("info").into_string();
        assert!(html.contains("2.5 k"));
        assert!(html.contains("fas fa-signal"));
    }
}
