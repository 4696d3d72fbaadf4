//! Explainability adapter: per-feature attributions for the first
//! `shap_num_points` rows of the logged data file.
//!
//! The attribution model is a JSON document next to the logs. Two kinds are
//! understood:
//!
//! - `linear`: exact attributions of a linear model,
//!   `coef_i * (x_i - mean_i)`, with base value `intercept + Σ coef_i * mean_i`.
//! - `precomputed`: attribution rows produced elsewhere, row-aligned with the
//!   data file.
//!
//! Results are memoized per `(model path, data path, point count)` for the
//! lifetime of the process.

use crate::error::{ExplainError, Result};
use crate::metadata::Metadata;
use crate::table::{Table, value_as_f64, value_text};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Column holding row ids in the data file.
pub const ID_COLUMN: &str = "id";
/// Columns never treated as features.
pub const NON_FEATURE_COLUMNS: [&str; 3] = [ID_COLUMN, "output", "gt"];

/// A serialized attribution model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributionModel {
    Linear {
        feature_names: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
        /// Reference point; the mean of the explained rows when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background_means: Option<Vec<f64>>,
    },
    Precomputed {
        feature_names: Vec<String>,
        base_value: f64,
        values: Vec<Vec<f64>>,
    },
}

impl AttributionModel {
    /// Read and validate a model file.
    pub fn load(path: &Path) -> std::result::Result<Self, ExplainError> {
        let invalid = |message: String| ExplainError::InvalidModel {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let model: Self = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
        model.validate().map_err(invalid)?;
        Ok(model)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let n = self.feature_names().len();
        match self {
            Self::Linear {
                coefficients,
                background_means,
                ..
            } => {
                if coefficients.len() != n {
                    return Err(format!("{} coefficients for {n} features", coefficients.len()));
                }
                if let Some(means) = background_means
                    && means.len() != n
                {
                    return Err(format!("{} background means for {n} features", means.len()));
                }
            }
            Self::Precomputed { values, .. } => {
                if let Some(row) = values.iter().find(|r| r.len() != n) {
                    return Err(format!("attribution row of {} values for {n} features", row.len()));
                }
            }
        }
        Ok(())
    }

    pub fn feature_names(&self) -> &[String] {
        match self {
            Self::Linear { feature_names, .. } | Self::Precomputed { feature_names, .. } => {
                feature_names
            }
        }
    }

    /// Attribute every row of `data`, which must carry every model feature.
    pub fn attribute(&self, data: &Table) -> std::result::Result<Attributions, ExplainError> {
        let features = feature_matrix(data, self.feature_names())?;
        let rows = data.len();

        let (base_value, values) = match self {
            Self::Linear {
                coefficients,
                intercept,
                background_means,
                ..
            } => {
                let means = match background_means {
                    Some(means) => means.clone(),
                    None => column_means(&features, coefficients.len()),
                };
                let base = intercept
                    + coefficients
                        .iter()
                        .zip(&means)
                        .map(|(c, m)| c * m)
                        .sum::<f64>();
                let values = features
                    .iter()
                    .map(|row| {
                        row.iter()
                            .zip(coefficients.iter().zip(&means))
                            .map(|(x, (c, m))| c * (x - m))
                            .collect()
                    })
                    .collect();
                (base, values)
            }
            Self::Precomputed {
                base_value, values, ..
            } => {
                if values.len() < rows {
                    return Err(ExplainError::RowMismatch {
                        expected: rows,
                        found: values.len(),
                    });
                }
                (*base_value, values[..rows].to_vec())
            }
        };

        Ok(Attributions {
            feature_names: self.feature_names().to_vec(),
            base_value,
            values,
            features,
        })
    }
}

fn feature_matrix(
    data: &Table,
    names: &[String],
) -> std::result::Result<Vec<Vec<f64>>, ExplainError> {
    let indices = names
        .iter()
        .map(|name| {
            data.column_index(name)
                .ok_or_else(|| ExplainError::MissingFeature {
                    feature: name.clone(),
                })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    data.rows
        .iter()
        .map(|row| {
            indices
                .iter()
                .zip(names)
                .map(|(&i, name)| {
                    value_as_f64(&row[i]).ok_or_else(|| ExplainError::NonNumeric {
                        feature: name.clone(),
                        value: value_text(&row[i]).unwrap_or_default(),
                    })
                })
                .collect()
        })
        .collect()
}

fn column_means(matrix: &[Vec<f64>], width: usize) -> Vec<f64> {
    if matrix.is_empty() {
        return vec![0.0; width];
    }
    let n = matrix.len() as f64;
    (0..width)
        .map(|j| matrix.iter().map(|row| row[j]).sum::<f64>() / n)
        .collect()
}

/// Attribution matrix for a set of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributions {
    pub feature_names: Vec<String>,
    pub base_value: f64,
    /// One row of per-feature attributions per data row.
    pub values: Vec<Vec<f64>>,
    /// Feature values of the explained rows, aligned with `values`.
    pub features: Vec<Vec<f64>>,
}

/// One bar of a waterfall.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub feature: String,
    pub value: f64,
    pub attribution: f64,
}

/// Per-point breakdown from the base value to the prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Waterfall {
    pub base_value: f64,
    pub prediction: f64,
    /// Sorted by absolute attribution, largest first.
    pub contributions: Vec<Contribution>,
}

impl Attributions {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean absolute attribution per feature, largest first.
    pub fn importance(&self) -> Vec<(String, f64)> {
        let n = self.values.len().max(1) as f64;
        let mut out: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let total: f64 = self.values.iter().map(|row| row[j].abs()).sum();
                (name.clone(), total / n)
            })
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }

    pub fn waterfall(&self, row: usize) -> Option<Waterfall> {
        let values = self.values.get(row)?;
        let features = self.features.get(row)?;
        let mut contributions: Vec<Contribution> = self
            .feature_names
            .iter()
            .zip(values.iter().zip(features))
            .map(|(name, (&attribution, &value))| Contribution {
                feature: name.clone(),
                value,
                attribution,
            })
            .collect();
        contributions.sort_by(|a, b| b.attribution.abs().total_cmp(&a.attribution.abs()));
        Some(Waterfall {
            base_value: self.base_value,
            prediction: self.base_value + values.iter().sum::<f64>(),
            contributions,
        })
    }
}

/// Attributions together with the ids of the explained rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub ids: Vec<String>,
    pub attributions: Attributions,
}

/// Result of an explainability request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplainOutcome {
    Ready(Arc<Explanation>),
    /// The data file holds fewer rows than requested.
    Insufficient { available: usize, required: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    model: PathBuf,
    data: PathBuf,
    points: usize,
}

/// Process-lifetime memo of computed explanations.
#[derive(Debug, Default)]
pub struct ExplainCache {
    entries: Mutex<HashMap<CacheKey, Arc<Explanation>>>,
}

impl ExplainCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Explain the first `shap_num_points` rows of the data file named by
    /// `metadata`. Relative paths resolve against `log_folder`.
    pub fn explain(&self, metadata: &Metadata, log_folder: &Path) -> Result<ExplainOutcome> {
        let not_configured = |field: &str| ExplainError::NotConfigured {
            field: field.to_string(),
        };
        let model = metadata
            .path_shap_file
            .as_deref()
            .ok_or_else(|| not_configured("path_shap_file"))?;
        let data = metadata
            .path_all_data
            .as_deref()
            .ok_or_else(|| not_configured("path_all_data"))?;
        let points = metadata
            .shap_num_points
            .ok_or_else(|| not_configured("shap_num_points"))?;

        let key = CacheKey {
            model: log_folder.join(model),
            data: log_folder.join(data),
            points,
        };
        if let Some(hit) = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            tracing::debug!(model = %key.model.display(), "Explanation cache hit");
            return Ok(ExplainOutcome::Ready(Arc::clone(hit)));
        }

        let table = Table::from_csv_path(&key.data)?;
        if table.len() < points {
            tracing::info!(
                available = table.len(),
                required = points,
                "Not enough data points to explain"
            );
            return Ok(ExplainOutcome::Insufficient {
                available: table.len(),
                required: points,
            });
        }
        let table = table.head(points);
        let ids = match table.column(ID_COLUMN) {
            Some(col) => col
                .into_iter()
                .map(|v| value_text(v).unwrap_or_default())
                .collect(),
            None => (0..table.len()).map(|i| i.to_string()).collect(),
        };

        let attribution_model = AttributionModel::load(&key.model)?;
        let attributions =
            attribution_model.attribute(&table.without_columns(&NON_FEATURE_COLUMNS))?;
        let explanation = Arc::new(Explanation { ids, attributions });

        tracing::info!(
            model = %key.model.display(),
            points,
            features = explanation.attributions.feature_names.len(),
            "Computed explanation"
        );
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, Arc::clone(&explanation));
        Ok(ExplainOutcome::Ready(explanation))
    }
}
