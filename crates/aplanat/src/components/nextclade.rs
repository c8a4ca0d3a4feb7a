//! A report section summarising nextclade clade assignments.
use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use serde_json::Value;

use crate::components::section_or_new;
use crate::dataframe;
use crate::error::{AplanatError, Result};
use crate::report::{HtmlSection, TableOptions};

pub const HEADER: &str = "
### NextClade analysis
The following view is produced by the
[nextclade](https://clades.nextstrain.org/) software.
";

pub const COLUMNS: [&str; 10] = [
    "Sequence",
    "Clade",
    "QC status",
    "QC score",
    "Substitutions",
    "Deletions",
    "Insertions",
    "Missing",
    "Nucleotide changes",
    "Amino acid changes",
];

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.fract() != 0.0 => format!("{:.2}", f),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

fn joined<F: Fn(&Value) -> Option<String>>(value: Option<&Value>, describe: F) -> String {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(&describe).collect::<Vec<_>>().join(", "))
        .unwrap_or_default()
}

/// Nucleotide substitutions as `C241T`, positions one-based.
fn nucleotide_change(sub: &Value) -> Option<String> {
    let pos = sub.get("pos")?.as_u64()?;
    Some(format!(
        "{}{}{}",
        sub.get("refNuc")?.as_str()?,
        pos + 1,
        sub.get("queryNuc")?.as_str()?
    ))
}

/// Amino acid substitutions as `S:N501Y`, codons one-based.
fn amino_acid_change(sub: &Value) -> Option<String> {
    let codon = sub.get("codon")?.as_u64()?;
    Some(format!(
        "{}:{}{}{}",
        sub.get("gene")?.as_str()?,
        sub.get("refAA")?.as_str()?,
        codon + 1,
        sub.get("queryAA")?.as_str()?
    ))
}

fn result_row(result: &Value) -> Vec<String> {
    let qc = result.get("qc");
    vec![
        text(result.get("seqName")),
        text(result.get("clade")),
        text(qc.and_then(|q| q.get("overallStatus"))),
        text(qc.and_then(|q| q.get("overallScore"))),
        text(result.get("totalSubstitutions")),
        text(result.get("totalDeletions")),
        text(result.get("totalInsertions")),
        text(result.get("totalMissing")),
        joined(result.get("substitutions"), nucleotide_change),
        joined(result.get("aaSubstitutions"), amino_acid_change),
    ]
}

fn error_row(error: &Value) -> Vec<String> {
    let mut row = vec![String::new(); COLUMNS.len()];
    row[0] = text(error.get("seqName"));
    row[2] = "error".to_string();
    row[8] = match error.get("errors") {
        Some(Value::Array(messages)) => messages.iter().map(|m| text(Some(m))).collect::<Vec<_>>().join("; "),
        other => text(other),
    };
    row
}

/// Table rows, one per analysed sequence, from nextclade's JSON output.
///
/// Both the `{"results": [...], "errors": [...]}` document and a bare
/// array of results are accepted. Sequences nextclade failed to analyse are
/// listed with the status `error`.
pub fn nextclade_rows(data: &Value) -> Result<Vec<Vec<String>>> {
    let (results, errors) = match data {
        Value::Array(results) => (results.as_slice(), &[][..]),
        Value::Object(doc) => {
            let list = |key: &str| doc.get(key).and_then(Value::as_array).map(Vec::as_slice);
            match list("results") {
                Some(results) => (results, list("errors").unwrap_or(&[])),
                None => return Err(AplanatError::Malformed("nextclade output has no 'results'".into())),
            }
        }
        _ => return Err(AplanatError::Malformed("nextclade output is not an object or array".into())),
    };
    Ok(results
        .iter()
        .map(result_row)
        .chain(errors.iter().map(error_row))
        .collect())
}

/// Create a section from the JSON written by the nextclade CLI.
pub fn nextclade<P: AsRef<Path>>(
    json: P,
    add_title: bool,
    section: Option<HtmlSection>,
) -> anyhow::Result<HtmlSection> {
    let json = json.as_ref();
    if !json.is_file() {
        bail!("nextclade output should be a JSON file: {}", json.display());
    }
    let text = fs::read_to_string(json).with_context(|| format!("Failed to read {}", json.display()))?;
    let data: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse JSON from {}", json.display()))?;
    let rows = nextclade_rows(&data)?;
    log::info!("Read nextclade results for {} sequences", rows.len());

    let mut section = section_or_new(section);
    if add_title {
        section.markdown(HEADER, None)?;
    }
    let frame = dataframe::from_rows(&COLUMNS, &rows)?;
    section.table(&frame, TableOptions::default().option("perPage", 25), None)?;
    Ok(section)
}
