//! Simple report components.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::components::section_or_new;
use crate::dataframe;
use crate::report::{HtmlSection, TableOptions};

pub const VERSION_HEADER: &str = "
### Software versions

The table below highlights versions of key software used within the analysis.
";

pub const PARAMS_HEADER: &str = "
### Workflow parameters

The table below highlights values of the main parameters used in this analysis.
";

fn read_versions(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != 2 {
            bail!("expected 'software,version', found {} fields", record.len());
        }
        rows.push(vec![record[0].trim().to_string(), record[1].trim().to_string()]);
    }
    Ok(rows)
}

fn table_options(th_color: Option<&str>) -> TableOptions {
    let defaults = TableOptions::default();
    TableOptions {
        th_color: th_color.map_or(defaults.th_color.clone(), str::to_string),
        ..defaults
    }
}

/// Create a software version table from headerless `software,version` CSVs.
///
/// `versions` is a single file or a directory of such files. Files that
/// cannot be read are logged and skipped. `th_color` overrides the
/// header background.
pub fn version_table<P: AsRef<Path>>(
    versions: P,
    header: Option<&str>,
    section: Option<HtmlSection>,
    th_color: Option<&str>,
) -> Result<HtmlSection> {
    let versions = versions.as_ref();
    let mut section = section_or_new(section);
    section.markdown(header.unwrap_or(VERSION_HEADER), None)?;

    let files: Vec<PathBuf> = if versions.is_dir() {
        let mut files = fs::read_dir(versions)
            .with_context(|| format!("Failed to list {}", versions.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect::<Vec<_>>();
        files.sort();
        files
    } else if versions.is_file() {
        vec![versions.to_path_buf()]
    } else {
        bail!("`versions` should be a file or directory: {}", versions.display());
    };

    let mut rows = Vec::new();
    for file in &files {
        log::info!("Reading versions from file: {}", file.display());
        match read_versions(file) {
            Ok(found) => rows.extend(found),
            Err(e) => log::warn!("Failed to read versions from {}: {}", file.display(), e),
        }
    }
    let frame = dataframe::from_rows(&["Name", "Version"], &rows)?;
    section.table(&frame, table_options(th_color), None)?;
    Ok(section)
}

/// Create a workflow parameter table from a flat JSON object.
pub fn params_table<P: AsRef<Path>>(
    params: P,
    header: Option<&str>,
    section: Option<HtmlSection>,
    th_color: Option<&str>,
) -> Result<HtmlSection> {
    let params = params.as_ref();
    if !params.is_file() {
        bail!("`params` should be a JSON file: {}", params.display());
    }
    let mut section = section_or_new(section);
    section.markdown(header.unwrap_or(PARAMS_HEADER), None)?;

    let text = fs::read_to_string(params)
        .with_context(|| format!("Failed to read {}", params.display()))?;
    let data: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse JSON from {}", params.display()))?;
    let object = match data {
        Value::Object(object) => object,
        _ => bail!("`params` should hold a JSON object"),
    };
    let rows: Vec<Vec<String>> = object
        .into_iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            vec![k, value]
        })
        .collect();
    let frame = dataframe::from_rows(&["Key", "Value"], &rows)?;
    section.table(&frame, table_options(th_color), None)?;
    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bad_version_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "minimap2,2.24\nsamtools,1.15\n").unwrap();
        fs::write(dir.path().join("b.csv"), "broken line without comma\n").unwrap();
        let section = version_table(dir.path(), None, None, None).unwrap();
        assert_eq!(section.len(), 2);
        let html: String = section
            .components("s0")
            .unwrap()
            .into_iter()
            .map(|m| m.into_string())
            .collect();
        assert!(html.contains("<td>minimap2</td>"));
        assert!(html.contains("<td>1.15</td>"));
        assert!(!html.contains("broken"));
    }

    #[test]
    fn missing_paths_are_errors() {
        assert!(version_table("/no/such/path", None, None, None).is_err());
        assert!(params_table("/no/such/file.json", None, None, None).is_err());
    }

    #[test]
    fn params_become_key_value_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"threads": 4, "out_dir": "output", "fast": true}}"#).unwrap();
        let mut section = HtmlSection::default();
        section.html("<p>before</p>", Some("first")).unwrap();
        let section = params_table(file.path(), Some("### Params"), Some(section), None).unwrap();
        assert_eq!(section.keys()[0], "first");
        let html: String = section
            .components("s0")
            .unwrap()
            .into_iter()
            .map(|m| m.into_string())
            .collect();
        assert!(html.contains("<h3>Params</h3>"));
        assert!(html.contains("<td>out_dir</td><td>output</td>"));
        assert!(html.contains("<td>threads</td><td>4</td>"));
        assert!(html.contains("background-color:#0084A9"));
    }

    #[test]
    fn header_colour_can_be_overridden() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "minimap2,2.24").unwrap();
        let versions = version_table(file.path(), None, None, Some("#123456")).unwrap();
        let mut params = tempfile::NamedTempFile::new().unwrap();
        write!(params, r#"{{"threads": 4}}"#).unwrap();
        let params = params_table(params.path(), None, None, Some("#654321")).unwrap();
        for (section, colour) in [(versions, "#123456"), (params, "#654321")] {
            let html: String = section
                .components("s0")
                .unwrap()
                .into_iter()
                .map(|m| m.into_string())
                .collect();
            assert!(html.contains(&format!("background-color:{};color:white", colour)));
            assert!(!html.contains("#0084A9;color:white"));
        }
    }
}
