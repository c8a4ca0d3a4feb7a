use std::collections::BTreeMap;

use maud::{html, Markup, PreEscaped};
use serde::{Deserialize, Serialize};
use polars::prelude::DataFrame;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::dataframe;
use crate::error::Result;
use crate::report::Component;
use crate::util::{script_json, Colors};

/// Presentation options for a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Include the row number as a leading column.
    pub index: bool,
    pub searchable: bool,
    pub paging: bool,
    pub sortable: bool,
    /// Extra CSS declarations for the table element.
    pub formatting: Option<String>,
    pub classes: Option<String>,
    pub th_color: String,
    /// Escape cell contents; disable to embed links or markup.
    pub escape: bool,
    /// Further simple-datatables options, emitted as JSON values.
    pub extra: BTreeMap<String, Value>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            index: false,
            searchable: true,
            paging: true,
            sortable: true,
            formatting: None,
            classes: None,
            th_color: Colors::CERULEAN.to_string(),
            escape: true,
            extra: BTreeMap::new(),
        }
    }
}

impl TableOptions {
    pub fn option<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// An interactive HTML table.
#[derive(Debug, Clone)]
pub struct Table {
    id: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    opts: TableOptions,
}

impl Table {
    pub fn new(frame: &DataFrame, opts: TableOptions) -> Result<Self> {
        // element ids must not start with a digit
        let simple = Uuid::new_v4().simple().to_string();
        let id = format!("a{}", &simple[1..]);
        let header = dataframe::names(frame);
        let columns = header
            .iter()
            .map(|name| dataframe::labels(frame, name))
            .collect::<Result<Vec<_>>>()?;
        let rows = (0..frame.height())
            .map(|i| columns.iter().map(|c| c[i].clone()).collect())
            .collect();
        Ok(Self {
            id,
            header,
            rows,
            opts,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn style(&self) -> String {
        let id = &self.id;
        format!(
            "#{id}{{font-family:Arial,Helvetica,sans-serif;border-collapse:collapse;width:100%;{extra}}}\n\
             #{id} td,#{id} th{{border:1px solid #ddd;padding:4px;}}\n\
             #{id} tr:nth-child(even){{background-color:#f2f2f2;}}\n\
             #{id} tr:hover{{background-color:{hover};}}\n\
             #{id} th{{padding-top:4px;padding-bottom:4px;text-align:left;background-color:{th};color:white;}}",
            id = id,
            extra = self.opts.formatting.as_deref().unwrap_or(""),
            hover = Colors::LIGHT_CORNFLOWER_BLUE,
            th = self.opts.th_color,
        )
    }

    fn script(&self) -> String {
        let mut options = Map::new();
        options.insert("searchable".into(), self.opts.searchable.into());
        options.insert("paging".into(), self.opts.paging.into());
        options.insert("sortable".into(), self.opts.sortable.into());
        for (key, value) in &self.opts.extra {
            options.insert(key.clone(), value.clone());
        }
        format!(
            "let {id}=new simpleDatatables.DataTable(\"#{id}\",{opts});",
            id = self.id,
            opts = script_json(&Value::Object(options))
        )
    }

    fn cell(&self, text: &str) -> Markup {
        if self.opts.escape {
            html! { (text) }
        } else {
            html! { (PreEscaped(text)) }
        }
    }
}

impl Component for Table {
    fn render(&self, _id: &str) -> Markup {
        let classes = self.opts.classes.as_deref().unwrap_or("dataframe");
        html! {
            style { (PreEscaped(self.style())) }
            table id=(self.id) class=(classes) {
                thead {
                    tr {
                        @if self.opts.index { th {} }
                        @for name in &self.header { th { (name) } }
                    }
                }
                tbody {
                    @for (i, row) in self.rows.iter().enumerate() {
                        tr {
                            @if self.opts.index { th { (i) } }
                            @for cell in row { td { (self.cell(cell)) } }
                        }
                    }
                }
            }
            script type="text/javascript" { (PreEscaped(self.script())) }
        }
    }
}
