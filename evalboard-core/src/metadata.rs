//! The `metadata.json` descriptor written next to the logged artifacts.
//!
//! Declares which categorical dimensions exist: model variants (`model_args`)
//! and feature slices (`feature_args`), plus optional explainability inputs.

use crate::error::MetadataError;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// File name of the descriptor inside the log folder.
pub const METADATA_FILE: &str = "metadata.json";

/// One categorical dimension and its ordered allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub feature_name: String,
    #[serde(deserialize_with = "scalar_strings")]
    pub allowed_values: Vec<String>,
}

impl DimensionSpec {
    pub fn new(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            feature_name: name.into(),
            allowed_values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn allows(&self, value: &str) -> bool {
        self.allowed_values.iter().any(|v| v == value)
    }
}

/// Parsed `metadata.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, deserialize_with = "nullable_list")]
    pub model_args: Vec<DimensionSpec>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub feature_args: Vec<DimensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_shap_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_all_data: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shap_num_points: Option<usize>,
}

impl Metadata {
    /// Read `<log_folder>/metadata.json`.
    pub fn load(log_folder: &Path) -> Result<Self, MetadataError> {
        let path = log_folder.join(METADATA_FILE);
        if !path.exists() {
            return Err(MetadataError::NotFound { path });
        }
        let content = std::fs::read_to_string(&path).map_err(|source| MetadataError::Read {
            path: path.clone(),
            source,
        })?;
        let metadata: Self = serde_json::from_str(&content)
            .map_err(|source| MetadataError::Parse { path, source })?;
        tracing::debug!(
            models = metadata.model_args.len(),
            features = metadata.feature_args.len(),
            explainability = metadata.has_explainability(),
            "Loaded dashboard metadata"
        );
        Ok(metadata)
    }

    pub fn model(&self, name: &str) -> Option<&DimensionSpec> {
        self.model_args.iter().find(|m| m.feature_name == name)
    }

    pub fn feature(&self, name: &str) -> Option<&DimensionSpec> {
        self.feature_args.iter().find(|f| f.feature_name == name)
    }

    pub fn has_explainability(&self) -> bool {
        self.path_shap_file.is_some()
    }
}

fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept allowed values written as strings, numbers or booleans.
fn scalar_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            serde_json::Value::Bool(b) => Ok(b.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "allowed value must be a scalar, got {other}"
            ))),
        })
        .collect()
}
