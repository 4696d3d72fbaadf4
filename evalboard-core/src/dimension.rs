//! Typed categorical dimensions and their column accessors.
//!
//! Logged tables carry one column per dimension, named with a fixed marker:
//! `feature_<name>` for feature slices and `model_<name>` for model variants.
//! [`Dimension`] owns that naming rule so no caller concatenates prefixes.

use crate::error::SessionError;
use crate::metadata::{DimensionSpec, Metadata};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two families of categorical dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    Feature,
    Model,
}

impl DimensionKind {
    /// Column-name marker for this family.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Feature => "feature_",
            Self::Model => "model_",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Model => "model",
        }
    }
}

/// A named dimension of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dimension {
    pub kind: DimensionKind,
    pub name: String,
}

impl Dimension {
    pub fn feature(name: impl Into<String>) -> Self {
        Self {
            kind: DimensionKind::Feature,
            name: name.into(),
        }
    }

    pub fn model(name: impl Into<String>) -> Self {
        Self {
            kind: DimensionKind::Model,
            name: name.into(),
        }
    }

    /// Name of the column carrying this dimension.
    pub fn column(&self) -> String {
        format!("{}{}", self.kind.marker(), self.name)
    }

    /// Index of this dimension's column in `table`, if the table carries it.
    pub fn locate(&self, table: &Table) -> Option<usize> {
        table.column_index(&self.column())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// The dimensions a metadata descriptor declares, used to validate
/// selections before they reach the slice engine.
#[derive(Debug, Clone, Default)]
pub struct DimensionSchema {
    models: Vec<DimensionSpec>,
    features: Vec<DimensionSpec>,
}

impl DimensionSchema {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            models: metadata.model_args.clone(),
            features: metadata.feature_args.clone(),
        }
    }

    pub fn spec(&self, kind: DimensionKind, name: &str) -> Option<&DimensionSpec> {
        let specs = match kind {
            DimensionKind::Feature => &self.features,
            DimensionKind::Model => &self.models,
        };
        specs.iter().find(|s| s.feature_name == name)
    }

    /// Resolve `name` to a declared dimension and check `value` is allowed.
    pub fn validate(
        &self,
        kind: DimensionKind,
        name: &str,
        value: &str,
    ) -> Result<Dimension, SessionError> {
        let spec = self
            .spec(kind, name)
            .ok_or_else(|| SessionError::UnknownDimension {
                kind: kind.label().to_string(),
                name: name.to_string(),
            })?;
        if !spec.allows(value) {
            return Err(SessionError::UnknownValue {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        Ok(Dimension {
            kind,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_names() {
        assert_eq!(Dimension::feature("city").column(), "feature_city");
        assert_eq!(Dimension::model("model_type").column(), "model_model_type");
    }

    #[test]
    fn test_locate() {
        let table = Table::new(
            vec!["y_v".into(), "feature_city".into()],
            vec![vec![json!("1"), json!("sf")]],
        );
        assert_eq!(Dimension::feature("city").locate(&table), Some(1));
        assert_eq!(Dimension::model("city").locate(&table), None);
    }

    #[test]
    fn test_schema_validate() {
        let metadata = Metadata {
            model_args: vec![DimensionSpec::new("model_type", &["a", "b"])],
            feature_args: vec![DimensionSpec::new("city", &["sf", "ny"])],
            ..Default::default()
        };
        let schema = DimensionSchema::from_metadata(&metadata);

        let dim = schema.validate(DimensionKind::Feature, "city", "ny").unwrap();
        assert_eq!(dim, Dimension::feature("city"));

        assert!(matches!(
            schema.validate(DimensionKind::Model, "city", "ny"),
            Err(SessionError::UnknownDimension { .. })
        ));
        assert!(matches!(
            schema.validate(DimensionKind::Feature, "city", "la"),
            Err(SessionError::UnknownValue { .. })
        ));
    }
}
