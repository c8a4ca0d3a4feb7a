//! Reading and slicing polars data frames for layouts, tables and components.
use std::path::Path;

use polars::prelude::{
    BooleanChunked, Column, CsvParseOptions, CsvReadOptions, DataFrame, DataType, NamedFrom,
    SerReader,
};

use crate::error::{AplanatError, Result};

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| AplanatError::UnknownColumn(name.to_string()))
}

fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_float() || dtype.is_integer() || matches!(dtype, DataType::Boolean)
}

/// Column names in order.
pub fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

/// Values of a numeric column as floats; nulls become NaN.
pub fn floats(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = column(df, name)?;
    if !is_numeric(column.dtype()) {
        return Err(AplanatError::NotNumeric(name.to_string()));
    }
    let cast = column.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Values of any column as display text; nulls become empty strings.
pub fn labels(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let cast = column(df, name)?.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect())
}

/// Distinct values of a column as text, in order of first appearance.
pub fn unique(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let values = column(df, name)?
        .as_materialized_series()
        .unique_stable()?
        .cast(&DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect())
}

/// Rows whose `name` column displays as `value`.
pub fn filter_eq(df: &DataFrame, name: &str, value: &str) -> Result<DataFrame> {
    let mask: BooleanChunked = labels(df, name)?.iter().map(|l| l == value).collect();
    Ok(df.filter(&mask)?)
}

/// A frame of text columns from row-major cells.
pub fn from_rows<S: AsRef<str>>(names: &[S], rows: &[Vec<String>]) -> Result<DataFrame> {
    if let Some(row) = rows.iter().find(|r| r.len() != names.len()) {
        return Err(AplanatError::LengthMismatch(format!(
            "row ({} cells) and header ({} columns)",
            row.len(),
            names.len()
        )));
    }
    let columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<String> = rows.iter().map(|r| r[i].clone()).collect();
            Column::new(name.as_ref().into(), values)
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Swap rows and columns. The values of `key` name the new columns; the old
/// column names fill a leading column called `key`. All values become text.
pub fn transpose(df: &DataFrame, key: &str) -> Result<DataFrame> {
    let headings = labels(df, key)?;
    let others: Vec<String> = names(df).into_iter().filter(|n| n != key).collect();
    let values = others
        .iter()
        .map(|name| labels(df, name))
        .collect::<Result<Vec<_>>>()?;
    let mut columns = vec![Column::new(key.into(), others.clone())];
    for (row, heading) in headings.iter().enumerate() {
        let cells: Vec<String> = values.iter().map(|v| v[row].clone()).collect();
        columns.push(Column::new(heading.as_str().into(), cells));
    }
    Ok(DataFrame::new(columns)?)
}

/// Read a delimited file with a header row.
///
/// Column types are inferred from the whole file.
pub fn read_delimited<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<DataFrame> {
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_separator(delimiter))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    log::debug!(
        "Read {} rows and {} columns from {}",
        frame.height(),
        frame.width(),
        path.as_ref().display()
    );
    Ok(frame)
}

/// Read a delimited file without a header row, naming its columns.
pub fn read_delimited_headerless<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
    columns: &[&str],
) -> Result<DataFrame> {
    let mut frame = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_separator(delimiter))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    if frame.width() != columns.len() {
        return Err(AplanatError::LengthMismatch(format!(
            "{} columns in {}, expected {}",
            frame.width(),
            path.as_ref().display(),
            columns.len()
        )));
    }
    frame.set_column_names(columns.iter().copied())?;
    Ok(frame)
}

/// Cast `a` and `b` to a shared type: float when both are numeric,
/// otherwise text.
fn align_dtypes(a: &mut DataFrame, b: &mut DataFrame) -> Result<()> {
    for name in names(a) {
        let (da, db) = (column(a, &name)?.dtype().clone(), column(b, &name)?.dtype().clone());
        if da == db {
            continue;
        }
        let common = if is_numeric(&da) && is_numeric(&db) {
            DataType::Float64
        } else {
            DataType::String
        };
        for frame in [&mut *a, &mut *b] {
            let cast = column(frame, &name)?.cast(&common)?;
            frame.with_column(cast)?;
        }
    }
    Ok(())
}

/// Stack frames row-wise. Columns must share names and order; numeric
/// columns of different types are widened to float, mixed columns to text.
pub fn concat(frames: Vec<DataFrame>) -> Result<DataFrame> {
    let mut frames = frames.into_iter();
    let mut out = match frames.next() {
        Some(first) => first,
        None => return Ok(DataFrame::empty()),
    };
    for mut frame in frames {
        if names(&frame) != names(&out) {
            return Err(AplanatError::LengthMismatch(
                "column names of concatenated frames".into(),
            ));
        }
        align_dtypes(&mut out, &mut frame)?;
        out.vstack_mut(&frame)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        polars::df!(
            "x" => [1.0, 2.0, 3.0, 4.0],
            "group" => ["a", "b", "a", "c"],
            "count" => [1i64, 2, 3, 4]
        )
        .unwrap()
    }

    #[test]
    fn floats_and_labels() {
        let f = frame();
        assert_eq!(floats(&f, "x").unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(floats(&f, "count").unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(labels(&f, "count").unwrap(), vec!["1", "2", "3", "4"]);
        assert!(matches!(floats(&f, "nope"), Err(AplanatError::UnknownColumn(_))));
        assert!(matches!(floats(&f, "group"), Err(AplanatError::NotNumeric(_))));
    }

    #[test]
    fn unique_keeps_first_appearance_order() {
        assert_eq!(unique(&frame(), "group").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn filter_by_value() {
        let f = filter_eq(&frame(), "group", "a").unwrap();
        assert_eq!(floats(&f, "x").unwrap(), vec![1.0, 3.0]);
        let none = filter_eq(&frame(), "group", "z").unwrap();
        assert_eq!(none.height(), 0);
        let by_number = filter_eq(&frame(), "count", "2").unwrap();
        assert_eq!(labels(&by_number, "group").unwrap(), vec!["b"]);
    }

    #[test]
    fn rows_must_match_header() {
        let rows = vec![vec!["a".to_string(), "1".to_string()]];
        let f = from_rows(&["Key", "Value"], &rows).unwrap();
        assert_eq!(names(&f), vec!["Key", "Value"]);
        assert_eq!(f.height(), 1);
        let bad = vec![vec!["a".to_string()]];
        assert!(matches!(
            from_rows(&["Key", "Value"], &bad),
            Err(AplanatError::LengthMismatch(_))
        ));
    }

    #[test]
    fn transpose_moves_names_into_a_column() {
        let f = polars::df!("sample" => ["s1", "s2"], "snps" => [3i64, 4]).unwrap();
        let t = transpose(&f, "sample").unwrap();
        assert_eq!(names(&t), vec!["sample", "s1", "s2"]);
        assert_eq!(labels(&t, "sample").unwrap(), vec!["snps"]);
        assert_eq!(labels(&t, "s2").unwrap(), vec!["4"]);
        let dup = polars::df!("sample" => ["s1", "s1"], "snps" => [3i64, 4]).unwrap();
        assert!(transpose(&dup, "sample").is_err());
    }

    #[test]
    fn headerless_files_are_named() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dist.txt");
        std::fs::write(&path, "total\t0\t1.00\ntotal\t1\t0.50\n").unwrap();
        let f = read_delimited_headerless(&path, b'\t', &["ref", "coverage", "proportion"]).unwrap();
        assert_eq!(f.height(), 2);
        assert_eq!(floats(&f, "proportion").unwrap(), vec![1.0, 0.5]);
        assert!(read_delimited_headerless(&path, b'\t', &["ref"]).is_err());
    }

    #[test]
    fn concat_widens_types() {
        let a = polars::df!("n" => [1i64, 2], "s" => ["x", "y"]).unwrap();
        let b = polars::df!("n" => [2.5], "s" => ["z"]).unwrap();
        let out = concat(vec![a, b]).unwrap();
        assert_eq!(floats(&out, "n").unwrap(), vec![1.0, 2.0, 2.5]);
        assert_eq!(labels(&out, "s").unwrap(), vec!["x", "y", "z"]);

        let c = polars::df!("other" => [1i64]).unwrap();
        assert!(concat(vec![frame(), c]).is_err());
        assert_eq!(concat(Vec::new()).unwrap().height(), 0);
    }
}
