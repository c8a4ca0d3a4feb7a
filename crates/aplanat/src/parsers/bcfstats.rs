//! Parse single and multiple outputs from `bcftools stats` into frames.
//!
//! A stats file is a series of blocks. Each block starts with comment
//! lines, the last of which names the block and its fields:
//!
//! ```text
//! # SN, Summary numbers:
//! # SN	[2]id	[3]key	[4]value
//! SN	0	number of samples:	1
//! ```
//!
//! Every data line repeats the block name as its first field.
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use polars::prelude::{Column, DataFrame};
use regex::Regex;

use crate::dataframe;
use crate::error::{AplanatError, Result};

/// Tables of one or more stats files, keyed by block name (`SN`, `TSTV`,
/// `ST`, `IDD`, ...).
pub type BcfStats = BTreeMap<String, DataFrame>;

/// A block of comment lines followed by its data lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub comment: Vec<String>,
    pub data: Vec<String>,
}

/// Split the lines of a stats file into blocks.
///
/// A block ends where a comment line follows data. Comment lines lose their
/// leading and trailing `#` and space characters.
pub fn split_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut block = Block::default();
    for line in text.lines() {
        if line.starts_with('#') {
            if !block.data.is_empty() {
                blocks.push(std::mem::take(&mut block));
            }
            block
                .comment
                .push(line.trim_matches(|c| c == '#' || c == ' ').trim_end().to_string());
        } else if !line.trim().is_empty() {
            block.data.push(line.trim_end().to_string());
        }
    }
    if !block.comment.is_empty() || !block.data.is_empty() {
        blocks.push(block);
    }
    blocks
}

fn parse_block(block: &Block, field_sep: &Regex) -> Result<(String, DataFrame)> {
    let header = block
        .comment
        .last()
        .ok_or_else(|| AplanatError::Malformed("data lines without a header comment".into()))?;
    let mut fields = field_sep.split(header).map(|f| f.trim_end().to_string());
    let section = fields.next().unwrap_or_default();
    let fields: Vec<String> = fields.collect();

    let mut rows = Vec::with_capacity(block.data.len());
    for line in &block.data {
        let mut items = line.split('\t');
        if items.next() != Some(section.as_str()) {
            return Err(AplanatError::Malformed(format!(
                "first data field not equal to section key '{}'",
                section
            )));
        }
        rows.push(items.map(str::to_string).collect::<Vec<String>>());
    }
    Ok((section, dataframe::from_rows(&fields, &rows)?))
}

/// Pivot the `SN` block from `id, key, value` rows to one row per id with
/// a column per key. Keys lose their "number of " prefix and trailing colon.
fn pivot_summary(sn: &DataFrame) -> Result<DataFrame> {
    let ids = dataframe::labels(sn, "id")?;
    let keys = dataframe::labels(sn, "key")?;
    let values = dataframe::labels(sn, "value")?;

    let mut table: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut names = BTreeSet::new();
    for ((id, key), value) in ids.into_iter().zip(keys).zip(values) {
        let key = key.replace("number of ", "");
        let key = key.trim_end_matches(':').to_string();
        names.insert(key.clone());
        table.entry(id).or_default().insert(key, value);
    }

    let mut columns = vec![Column::new("id".into(), table.keys().cloned().collect::<Vec<String>>())];
    for name in &names {
        let values: Vec<String> = table
            .values()
            .map(|row| row.get(name).cloned().unwrap_or_default())
            .collect();
        columns.push(Column::new(name.as_str().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

/// Parse the text of one `bcftools stats` output.
pub fn parse_bcftools_stats_text(text: &str) -> Result<BcfStats> {
    let field_sep = Regex::new(r"\[\d+\]")?;
    let mut tables = BcfStats::new();
    for block in split_blocks(text) {
        let (section, table) = parse_block(&block, &field_sep)?;
        tables.insert(section, table);
    }
    let sn = tables
        .get("SN")
        .ok_or_else(|| AplanatError::Malformed("no SN (summary numbers) block".into()))?;
    let summary = pivot_summary(sn)?;
    tables.insert("SN".to_string(), summary);
    Ok(tables)
}

/// Parse a `bcftools stats` output file.
pub fn parse_bcftools_stats<P: AsRef<Path>>(path: P) -> Result<BcfStats> {
    let text = fs::read_to_string(&path)?;
    let tables = parse_bcftools_stats_text(&text)?;
    log::debug!(
        "Parsed {} blocks from {}",
        tables.len(),
        path.as_ref().display()
    );
    Ok(tables)
}

/// Parse and combine several `bcftools stats` outputs.
///
/// Each table gains a leading `sample` column, named by `sample_names` or
/// else by the file name of each input. The `id` column, which only
/// distinguishes the sets of a two-file comparison, is dropped.
pub fn parse_bcftools_stats_multi<P: AsRef<Path>>(
    paths: &[P],
    sample_names: Option<&[String]>,
) -> Result<BcfStats> {
    let names: Vec<String> = match sample_names {
        Some(names) if names.len() != paths.len() => {
            return Err(AplanatError::LengthMismatch(
                "`paths` and `sample_names`".into(),
            ))
        }
        Some(names) => names.to_vec(),
        None => paths
            .iter()
            .map(|p| {
                p.as_ref()
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect(),
    };

    let mut all: BTreeMap<String, Vec<DataFrame>> = BTreeMap::new();
    for (sample, path) in names.iter().zip(paths) {
        for (section, mut table) in parse_bcftools_stats(path)? {
            if table.get_column_names().iter().any(|n| n.as_str() == "id") {
                table = table.drop("id")?;
            }
            let sample_column = Column::new("sample".into(), vec![sample.clone(); table.height()]);
            table.insert_column(0, sample_column)?;
            all.entry(section).or_default().push(table);
        }
    }
    all.into_iter()
        .map(|(section, tables)| Ok((section, dataframe::concat(tables)?)))
        .collect()
}

#[cfg(test)]
pub(crate) const STATS: &str = "\
# This file was produced by bcftools stats (1.15+htslib-1.15)
# Definition of sets:
# ID\t[2]id\t[3]tab-separated file names
ID\t0\tcalls.vcf.gz
# SN, Summary numbers:
# SN\t[2]id\t[3]key\t[4]value
SN\t0\tnumber of samples:\t1
SN\t0\tnumber of records:\t12
SN\t0\tnumber of SNPs:\t9
SN\t0\tnumber of indels:\t3
# TSTV, transitions/transversions:
# TSTV\t[2]id\t[3]ts\t[4]tv\t[5]ts/tv
TSTV\t0\t6\t3\t2.00
# ST, Substitution types:
# ST\t[2]id\t[3]type\t[4]count
ST\t0\tA>C\t1
ST\t0\tA>G\t2
ST\t0\tC>T\t3
ST\t0\tG>A\t2
ST\t0\tT>G\t1
# IDD, InDel distribution:
# IDD\t[2]id\t[3]length (deletions negative)\t[4]number of sites\t[5]number of genotypes\t[6]mean VAF
IDD\t0\t-2\t1\t0\t.
IDD\t0\t1\t2\t0\t.
";

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    #[test]
    fn blocks_split_where_comments_follow_data() {
        let blocks = split_blocks(STATS);
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0].comment.len(), 3);
        assert_eq!(blocks[0].comment[2], "ID\t[2]id\t[3]tab-separated file names");
        assert_eq!(blocks[1].data.len(), 4);
    }

    #[test]
    fn tables_are_named_by_their_block() {
        let tables = parse_bcftools_stats_text(STATS).unwrap();
        let names: Vec<&str> = tables.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["ID", "IDD", "SN", "ST", "TSTV"]);
        let tstv = &tables["TSTV"];
        assert_eq!(dataframe::names(tstv), vec!["id", "ts", "tv", "ts/tv"]);
        assert_eq!(dataframe::labels(tstv, "ts/tv").unwrap(), vec!["2.00"]);
    }

    #[test]
    fn summary_numbers_are_pivoted() {
        let tables = parse_bcftools_stats_text(STATS).unwrap();
        let sn = &tables["SN"];
        assert_eq!(
            dataframe::names(sn),
            vec!["id", "SNPs", "indels", "records", "samples"]
        );
        assert_eq!(sn.height(), 1);
        assert_eq!(dataframe::labels(sn, "records").unwrap(), vec!["12"]);
    }

    #[test]
    fn mismatched_data_lines_are_errors() {
        let text = "# SN\t[2]id\t[3]key\t[4]value\nXX\t0\tsamples\t1\n";
        assert!(matches!(
            parse_bcftools_stats_text(text),
            Err(AplanatError::Malformed(_))
        ));
        let text = "# TSTV\t[2]id\t[3]ts\nTSTV\t0\t1\n";
        assert!(matches!(
            parse_bcftools_stats_text(text),
            Err(AplanatError::Malformed(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Multiple files
    // -----------------------------------------------------------------------

    #[test]
    fn multiple_files_gain_a_sample_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for name in ["a.stats", "b.stats"] {
            let path = dir.path().join(name);
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(STATS.as_bytes()).unwrap();
            paths.push(path);
        }
        let tables = parse_bcftools_stats_multi(&paths, None).unwrap();
        let sn = &tables["SN"];
        assert_eq!(dataframe::names(sn)[0], "sample");
        assert!(!dataframe::names(sn).contains(&"id".to_string()));
        assert_eq!(dataframe::labels(sn, "sample").unwrap(), vec!["a.stats", "b.stats"]);
        assert_eq!(tables["ST"].height(), 10);

        let named = parse_bcftools_stats_multi(&paths, Some(&["x".to_string(), "y".to_string()])).unwrap();
        assert_eq!(dataframe::labels(&named["TSTV"], "sample").unwrap(), vec!["x", "y"]);
        assert!(parse_bcftools_stats_multi(&paths, Some(&["x".to_string()])).is_err());
    }
}
