//! Row sets loaded from one result file.
//!
//! A [`Table`] keeps every cell as a `serde_json::Value`: CSV cells arrive as
//! strings, JSON snapshots keep their native scalars. Typed access happens at
//! the point of use ([`value_as_f64`], [`value_matches`]).

use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A batch of rows sharing one header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Same header, no rows.
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    /// Load a CSV file with a header row. Short rows are padded with nulls
    /// and empty cells become nulls.
    pub fn from_csv_path(path: &Path) -> Result<Self, ArtifactError> {
        let csv_err = |source| ArtifactError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let mut row: Vec<Value> = record
                .iter()
                .take(columns.len())
                .map(|cell| {
                    if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.to_string())
                    }
                })
                .collect();
            row.resize(columns.len(), Value::Null);
            rows.push(row);
        }

        tracing::trace!(path = %path.display(), rows = rows.len(), "Loaded CSV table");
        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Numeric cells of one column; non-numeric cells are skipped.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| value_as_f64(&row[idx]))
                .collect(),
        )
    }

    /// `(x, y)` pairs for rows where both cells are numeric.
    pub fn numeric_pairs(&self, x: &str, y: &str) -> Option<Vec<(f64, f64)>> {
        let xi = self.column_index(x)?;
        let yi = self.column_index(y)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| Some((value_as_f64(&row[xi])?, value_as_f64(&row[yi])?)))
                .collect(),
        )
    }

    /// The last column whose name starts with `prefix`.
    pub fn last_column_with_prefix(&self, prefix: &str) -> Option<&str> {
        self.columns
            .iter()
            .rev()
            .find(|c| c.starts_with(prefix))
            .map(String::as_str)
    }

    /// A new table holding the rows where `mask` is true.
    pub fn filter_by_mask(&self, mask: &[bool]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(row, _)| row.clone())
                .collect(),
        }
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// A copy without the named columns. Names that are absent are ignored.
    pub fn without_columns(&self, names: &[&str]) -> Self {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !names.contains(&c.as_str()))
            .map(|(i, _)| i)
            .collect();
        Self {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}

/// Numeric view of a cell: JSON numbers, or strings that parse as `f64`.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Display text of a scalar cell; `None` for nulls and containers.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Equality between a cell and a selected dimension value.
///
/// CSV cells arrive as text, so numeric text matches by value (`1.0` matches
/// `1`) and `true`/`false` match regardless of case (`True` matches `true`).
pub fn value_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => text_matches(s, expected),
        Value::Number(n) => {
            n.to_string() == expected
                || matches!((n.as_f64(), expected.trim().parse::<f64>()), (Some(a), Ok(b)) if a == b)
        }
        Value::Bool(b) => parse_bool(expected) == Some(*b),
        _ => false,
    }
}

fn text_matches(cell: &str, expected: &str) -> bool {
    if cell == expected {
        return true;
    }
    let (cell, expected) = (cell.trim(), expected.trim());
    if let (Ok(a), Ok(b)) = (cell.parse::<f64>(), expected.parse::<f64>()) {
        return a == b;
    }
    matches!((parse_bool(cell), parse_bool(expected)), (Some(a), Some(b)) if a == b)
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_from_csv_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "a.csv",
            "x_count,y_acc,feature_city\n1,0.5,sf\n2,0.75,ny\n",
        );
        let table = Table::from_csv_path(&path).unwrap();
        assert_eq!(table.columns, vec!["x_count", "y_acc", "feature_city"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1][2], json!("ny"));
    }

    #[test]
    fn test_from_csv_pads_short_rows_and_nulls_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "a.csv", "a,b,c\n1,,3\n4\n");
        let table = Table::from_csv_path(&path).unwrap();
        assert_eq!(table.rows[0], vec![json!("1"), Value::Null, json!("3")]);
        assert_eq!(table.rows[1], vec![json!("4"), Value::Null, Value::Null]);
    }

    #[test]
    fn test_from_csv_missing_file() {
        let err = Table::from_csv_path(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ArtifactError::Csv { .. }));
    }

    #[test]
    fn test_numeric_pairs_skip_non_numeric() {
        let table = Table::new(
            vec!["x_n".into(), "y_v".into()],
            vec![
                vec![json!("1"), json!("2.5")],
                vec![json!("oops"), json!("3")],
                vec![json!(3), json!(4.0)],
            ],
        );
        assert_eq!(
            table.numeric_pairs("x_n", "y_v").unwrap(),
            vec![(1.0, 2.5), (3.0, 4.0)]
        );
        assert!(table.numeric_pairs("x_n", "y_missing").is_none());
    }

    #[test]
    fn test_last_column_with_prefix() {
        let table = Table::new(
            vec!["x_a".into(), "y_a".into(), "x_b".into(), "id".into()],
            Vec::new(),
        );
        assert_eq!(table.last_column_with_prefix("x_"), Some("x_b"));
        assert_eq!(table.last_column_with_prefix("y_"), Some("y_a"));
        assert_eq!(table.last_column_with_prefix("z_"), None);
    }

    #[test]
    fn test_without_columns() {
        let table = Table::new(
            vec!["id".into(), "dist".into(), "gt".into()],
            vec![vec![json!("1"), json!("2.0"), json!("3")]],
        );
        let dropped = table.without_columns(&["id", "gt", "output"]);
        assert_eq!(dropped.columns, vec!["dist"]);
        assert_eq!(dropped.rows, vec![vec![json!("2.0")]]);
    }

    #[test]
    fn test_value_matches() {
        assert!(value_matches(&json!("a"), "a"));
        assert!(!value_matches(&json!("a"), "A"));
        assert!(value_matches(&json!(1), "1"));
        assert!(value_matches(&json!(1), "1.0"));
        assert!(value_matches(&json!(true), "true"));
        assert!(!value_matches(&Value::Null, "null"));
        assert!(!value_matches(&json!({"a": 1}), "a"));
    }

    #[test]
    fn test_value_matches_python_written_cells() {
        assert!(value_matches(&json!("1.0"), "1"));
        assert!(value_matches(&json!("2"), "2.0"));
        assert!(!value_matches(&json!("1.0"), "2"));
        assert!(value_matches(&json!("True"), "true"));
        assert!(value_matches(&json!("FALSE"), "false"));
        assert!(!value_matches(&json!("True"), "false"));
        assert!(value_matches(&json!(false), "False"));
        assert!(!value_matches(&json!("truthy"), "true"));
        assert!(!value_matches(&json!(""), "0"));
    }
}
