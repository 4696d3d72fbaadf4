//! Decoders for the JSON artifacts a dashboard section holds, and the
//! file-name conventions that index them.

use crate::error::ArtifactError;
use crate::table::{Table, value_as_f64, value_text};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const EMBEDDING_KEY: &str = "umap";
const CLUSTERS_KEY: &str = "clusters";
const HOVER_KEY: &str = "hover_texts";
const BAR_HOVER_KEY: &str = "hover_text";

/// Column names of an embedding snapshot table.
pub const COL_X: &str = "x";
pub const COL_Y: &str = "y";
pub const COL_Z: &str = "z";
pub const COL_COLOR: &str = "color";
pub const COL_HOVER: &str = "hover";

fn read_json(path: &Path) -> Result<Value, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// File stem, e.g. `"12"` for `line_plots/acc/12.csv`.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// The integer file stem used to gate per-snapshot display.
pub fn count_from_file_name(path: &Path) -> Option<i64> {
    file_stem(path).parse().ok()
}

/// The integer prefix before the first `_`, e.g. `200` for `200_a_s1.json`.
pub fn view_point_from_file_name(path: &Path) -> Option<i64> {
    let name = path.file_name()?.to_string_lossy().to_string();
    name.split('_').next()?.parse().ok()
}

/// Sorted, de-duplicated view points of a set of embedding files.
pub fn view_points(files: &[PathBuf]) -> Vec<i64> {
    let mut points: Vec<i64> = files
        .iter()
        .filter_map(|f| view_point_from_file_name(f))
        .collect();
    points.sort_unstable();
    points.dedup();
    points
}

/// Path of the embedding file for one view point and model combination.
pub fn embedding_file_name(
    dir: &Path,
    view_point: i64,
    compare_value: &str,
    other_value: Option<&str>,
) -> PathBuf {
    let name = match other_value {
        Some(other) => format!("{view_point}_{compare_value}_{other}.json"),
        None => format!("{view_point}_{compare_value}.json"),
    };
    dir.join(name)
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// A logged alert: the file stem and its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub name: String,
    pub message: String,
}

impl Alert {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let message = match read_json(path)? {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(Self {
            name: file_stem(path),
            message,
        })
    }
}

// ---------------------------------------------------------------------------
// Embedding snapshots (UMAP / t-SNE with clusters)
// ---------------------------------------------------------------------------

/// A decoded clustering/embedding snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingSnapshot {
    pub path: PathBuf,
    /// 2 or 3.
    pub dims: usize,
    /// Point coordinates, color label, hover mapping and extra attributes,
    /// one row per point.
    pub table: Table,
    /// Hover field names, taken from the first hover mapping.
    pub hover_fields: Vec<String>,
}

impl EmbeddingSnapshot {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let value = read_json(path)?;
        Self::from_value(path, value)
    }

    pub fn from_value(path: &Path, value: Value) -> Result<Self, ArtifactError> {
        let Value::Object(obj) = value else {
            return Err(ArtifactError::MissingColumn {
                path: path.to_path_buf(),
                column: EMBEDDING_KEY.to_string(),
            });
        };
        let missing = |column: &str| ArtifactError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        };

        let coords: Vec<Vec<f64>> = match obj.get(EMBEDDING_KEY) {
            Some(Value::Array(points)) => points
                .iter()
                .map(|p| match p {
                    Value::Array(c) => c
                        .iter()
                        .map(|v| value_as_f64(v).unwrap_or(f64::NAN))
                        .collect(),
                    _ => Vec::new(),
                })
                .collect(),
            _ => return Err(missing(EMBEDDING_KEY)),
        };
        let n = coords.len();
        let dims = coords.first().map_or(2, Vec::len);
        let bad_dims = if (2..=3).contains(&dims) {
            coords.iter().map(Vec::len).find(|&l| l != dims)
        } else {
            Some(dims)
        };
        if let Some(dims) = bad_dims {
            return Err(ArtifactError::EmbeddingDimension {
                path: path.to_path_buf(),
                dims,
            });
        }

        let check_len = |column: &str, found: usize| {
            if found == n {
                Ok(())
            } else {
                Err(ArtifactError::ColumnLength {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                    expected: n,
                    found,
                })
            }
        };
        let clusters = match obj.get(CLUSTERS_KEY) {
            Some(Value::Array(c)) => c,
            _ => return Err(missing(CLUSTERS_KEY)),
        };
        check_len(CLUSTERS_KEY, clusters.len())?;

        let hover = match obj.get(HOVER_KEY) {
            Some(Value::Array(h)) => {
                check_len(HOVER_KEY, h.len())?;
                Some(h)
            }
            _ => None,
        };
        let hover_fields: Vec<String> = hover
            .and_then(|h| h.first())
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        let mut columns = vec![COL_X.to_string(), COL_Y.to_string()];
        if dims == 3 {
            columns.push(COL_Z.to_string());
        }
        columns.push(COL_COLOR.to_string());
        if hover.is_some() {
            columns.push(COL_HOVER.to_string());
        }

        // Extra keys become per-point columns; scalars broadcast.
        let mut extras: Vec<(String, Vec<Value>)> = Vec::new();
        for (key, value) in obj
            .iter()
            .filter(|(k, _)| ![EMBEDDING_KEY, CLUSTERS_KEY, HOVER_KEY].contains(&k.as_str()))
        {
            let column = match value {
                Value::Array(values) => {
                    check_len(key, values.len())?;
                    values.clone()
                }
                scalar => vec![scalar.clone(); n],
            };
            columns.push(key.clone());
            extras.push((key.clone(), column));
        }

        let rows = (0..n)
            .map(|i| {
                let mut row: Vec<Value> = coords[i].iter().map(|&c| number(c)).collect();
                row.push(clusters[i].clone());
                if let Some(h) = hover {
                    row.push(h[i].clone());
                }
                row.extend(extras.iter().map(|(_, col)| col[i].clone()));
                row
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            dims,
            table: Table::new(columns, rows),
            hover_fields,
        })
    }
}

fn number(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

/// One scatter point ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub cluster: String,
    /// `(field, text)` for every hover field; absent values are empty.
    pub hover: Vec<(String, String)>,
}

/// Convert a (possibly sliced) embedding table back into scatter points.
pub fn scatter_points(table: &Table, hover_fields: &[String]) -> Vec<ScatterPoint> {
    let (Some(xi), Some(yi), Some(ci)) = (
        table.column_index(COL_X),
        table.column_index(COL_Y),
        table.column_index(COL_COLOR),
    ) else {
        return Vec::new();
    };
    let zi = table.column_index(COL_Z);
    let hi = table.column_index(COL_HOVER);

    table
        .rows
        .iter()
        .filter_map(|row| {
            let x = value_as_f64(&row[xi])?;
            let y = value_as_f64(&row[yi])?;
            let z = match zi {
                Some(zi) => Some(value_as_f64(&row[zi])?),
                None => None,
            };
            let hover_map = hi.and_then(|hi| row[hi].as_object());
            let hover = hover_fields
                .iter()
                .map(|field| {
                    let text = hover_map
                        .and_then(|m| m.get(field))
                        .and_then(value_text)
                        .unwrap_or_default();
                    (field.clone(), text)
                })
                .collect();
            Some(ScatterPoint {
                x,
                y,
                z,
                cluster: value_text(&row[ci]).unwrap_or_default(),
                hover,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Bar graphs
// ---------------------------------------------------------------------------

/// One named group of bars.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGroup {
    pub name: String,
    /// `(category, value)` in file order.
    pub bars: Vec<(String, f64)>,
    /// Hover text per bar, in file order of the hover mapping.
    pub hover: Vec<String>,
}

/// A decoded bar-graph snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGraph {
    pub name: String,
    pub groups: Vec<BarGroup>,
}

impl BarGraph {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let value = read_json(path)?;
        let Value::Object(obj) = value else {
            return Err(ArtifactError::MissingColumn {
                path: path.to_path_buf(),
                column: "bar groups".to_string(),
            });
        };
        let hover_root: Map<String, Value> = obj
            .get(BAR_HOVER_KEY)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let groups = obj
            .iter()
            .filter(|(name, _)| name.as_str() != BAR_HOVER_KEY)
            .map(|(name, bars)| {
                let bars = bars
                    .as_object()
                    .map(|m| {
                        m.iter()
                            .map(|(cat, v)| (cat.clone(), value_as_f64(v).unwrap_or(0.0)))
                            .collect()
                    })
                    .unwrap_or_default();
                let hover = hover_root
                    .get(name)
                    .and_then(Value::as_object)
                    .map(|m| m.values().map(|v| value_text(v).unwrap_or_default()).collect())
                    .unwrap_or_default();
                BarGroup {
                    name: name.clone(),
                    bars,
                    hover,
                }
            })
            .collect();

        Ok(Self {
            name: file_stem(path),
            groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_file_name_conventions() {
        assert_eq!(count_from_file_name(Path::new("a/-1.json")), Some(-1));
        assert_eq!(count_from_file_name(Path::new("a/200.json")), Some(200));
        assert_eq!(count_from_file_name(Path::new("a/latest.json")), None);
        assert_eq!(view_point_from_file_name(Path::new("d/200_a_s1.json")), Some(200));
        assert_eq!(view_point_from_file_name(Path::new("d/x_a.json")), None);

        let files = vec![
            PathBuf::from("d/500_a_s1.json"),
            PathBuf::from("d/200_b_s1.json"),
            PathBuf::from("d/200_a_s1.json"),
        ];
        assert_eq!(view_points(&files), vec![200, 500]);

        assert_eq!(
            embedding_file_name(Path::new("d"), 200, "a", Some("s1")),
            PathBuf::from("d/200_a_s1.json")
        );
        assert_eq!(
            embedding_file_name(Path::new("d"), 200, "a", None),
            PathBuf::from("d/200_a.json")
        );
    }

    #[test]
    fn test_alert_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "data_drift.json", &json!("Drift detected"));
        let alert = Alert::load(&path).unwrap();
        assert_eq!(alert.name, "data_drift");
        assert_eq!(alert.message, "Drift detected");

        let path = write(dir.path(), "structured.json", &json!({"level": 2}));
        assert_eq!(Alert::load(&path).unwrap().message, r#"{"level":2}"#);
    }

    #[test]
    fn test_embedding_2d_with_hover_and_extras() {
        let value = json!({
            "umap": [[0.0, 1.0], [2.0, 3.0]],
            "clusters": [0, 1],
            "hover_texts": [{"id": "p1", "label": "cat"}, {"id": "p2"}],
            "model_model_type": ["a", "b"],
            "feature_city": "sf"
        });
        let snap = EmbeddingSnapshot::from_value(Path::new("0_a.json"), value).unwrap();
        assert_eq!(snap.dims, 2);
        assert_eq!(
            snap.table.columns,
            vec!["x", "y", "color", "hover", "model_model_type", "feature_city"]
        );
        assert_eq!(snap.hover_fields, vec!["id", "label"]);
        assert_eq!(snap.table.rows[1][5], json!("sf"));

        let points = scatter_points(&snap.table, &snap.hover_fields);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].cluster, "0");
        assert_eq!(points[1].z, None);
        assert_eq!(
            points[1].hover,
            vec![("id".to_string(), "p2".to_string()), ("label".to_string(), String::new())]
        );
    }

    #[test]
    fn test_embedding_3d() {
        let value = json!({"umap": [[0, 1, 2]], "clusters": ["c"]});
        let snap = EmbeddingSnapshot::from_value(Path::new("e.json"), value).unwrap();
        assert_eq!(snap.dims, 3);
        let points = scatter_points(&snap.table, &snap.hover_fields);
        assert_eq!(points[0].z, Some(2.0));
    }

    #[test]
    fn test_embedding_bad_dimension() {
        let value = json!({"umap": [[0, 1, 2, 3]], "clusters": [0]});
        let err = EmbeddingSnapshot::from_value(Path::new("e.json"), value).unwrap_err();
        assert!(matches!(err, ArtifactError::EmbeddingDimension { dims: 4, .. }));
    }

    #[test]
    fn test_embedding_length_mismatch() {
        let value = json!({"umap": [[0, 1], [1, 2]], "clusters": [0]});
        let err = EmbeddingSnapshot::from_value(Path::new("e.json"), value).unwrap_err();
        assert!(matches!(err, ArtifactError::ColumnLength { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_embedding_missing_umap() {
        let err =
            EmbeddingSnapshot::from_value(Path::new("e.json"), json!({"clusters": []})).unwrap_err();
        assert!(matches!(err, ArtifactError::MissingColumn { .. }));
    }

    #[test]
    fn test_bar_graph_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("-1.json");
        std::fs::write(
            &path,
            r#"{"zeta": {"b": 2, "a": 1}, "alpha": {"c": 3.5},
                "hover_text": {"zeta": {"b": "two", "a": "one"}}}"#,
        )
        .unwrap();
        let graph = BarGraph::load(&path).unwrap();
        assert_eq!(graph.name, "-1");
        assert_eq!(graph.groups.len(), 2);
        assert_eq!(graph.groups[0].name, "zeta");
        assert_eq!(
            graph.groups[0].bars,
            vec![("b".to_string(), 2.0), ("a".to_string(), 1.0)]
        );
        assert_eq!(graph.groups[0].hover, vec!["two", "one"]);
        assert!(graph.groups[1].hover.is_empty());
    }
}
