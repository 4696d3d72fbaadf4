//! Per-session selection state: comparison axis, pinned model values and
//! feature slices, derived from the metadata descriptor.
//!
//! The session is the single context object every rendering path receives;
//! it turns a view index into the constraints the slice engine applies.

use crate::config::{BoardConfig, MissingColumnPolicy};
use crate::dimension::{DimensionKind, DimensionSchema};
use crate::error::{SessionError, SliceError};
use crate::metadata::{DimensionSpec, Metadata};
use crate::slice::{Constraint, Selection, SliceRequest, select_rows};
use crate::table::Table;
use std::collections::BTreeMap;

/// Sidebar selections for one dashboard session.
#[derive(Debug, Clone)]
pub struct Session {
    metadata: Metadata,
    schema: DimensionSchema,
    /// Index into `metadata.model_args` of the comparison axis.
    axis: Option<usize>,
    other_models: BTreeMap<String, String>,
    features: BTreeMap<String, Selection>,
    policy: MissingColumnPolicy,
    columns: usize,
}

impl Session {
    /// Build a session with default selections: the first model dimension is
    /// the comparison axis, every other model dimension is pinned to its first
    /// allowed value, and every feature is unconstrained.
    pub fn new(metadata: Metadata, config: &BoardConfig) -> Self {
        let schema = DimensionSchema::from_metadata(&metadata);
        let axis = if metadata.model_args.is_empty() {
            None
        } else {
            Some(0)
        };
        let features = metadata
            .feature_args
            .iter()
            .map(|f| (f.feature_name.clone(), Selection::All))
            .collect();
        let mut session = Self {
            metadata,
            schema,
            axis,
            other_models: BTreeMap::new(),
            features,
            policy: config.slicing.missing_column,
            columns: config.ui.columns.max(1),
        };
        session.reset_other_models();
        session
    }

    fn reset_other_models(&mut self) {
        self.other_models = self
            .metadata
            .model_args
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != self.axis)
            .filter_map(|(_, m)| {
                m.allowed_values
                    .first()
                    .map(|v| (m.feature_name.clone(), v.clone()))
            })
            .collect();
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The dimension compared side by side, if the metadata declares models.
    pub fn comparison(&self) -> Option<&DimensionSpec> {
        self.axis.map(|i| &self.metadata.model_args[i])
    }

    /// Make `name` the comparison axis. The previous axis becomes a pinned
    /// dimension at its first allowed value; existing pins are kept.
    pub fn set_comparison(&mut self, name: &str) -> Result<(), SessionError> {
        let idx = self
            .metadata
            .model_args
            .iter()
            .position(|m| m.feature_name == name)
            .ok_or_else(|| SessionError::UnknownDimension {
                kind: DimensionKind::Model.label().to_string(),
                name: name.to_string(),
            })?;
        if self.axis == Some(idx) {
            return Ok(());
        }
        if let Some(old) = self.axis.map(|i| &self.metadata.model_args[i]) {
            if let Some(first) = old.allowed_values.first() {
                self.other_models
                    .insert(old.feature_name.clone(), first.clone());
            }
        }
        self.other_models.remove(name);
        self.axis = Some(idx);
        tracing::debug!(axis = name, "Comparison axis changed");
        Ok(())
    }

    /// Pin a non-axis model dimension to one value.
    pub fn pin_model(&mut self, name: &str, value: &str) -> Result<(), SessionError> {
        if self.comparison().is_some_and(|c| c.feature_name == name) {
            return Err(SessionError::AxisPinned {
                name: name.to_string(),
            });
        }
        let dim = self.schema.validate(DimensionKind::Model, name, value)?;
        self.other_models.insert(dim.name, value.to_string());
        Ok(())
    }

    /// Narrow (or widen, with [`Selection::All`]) one feature slice.
    pub fn select_feature(&mut self, name: &str, selection: Selection) -> Result<(), SessionError> {
        match &selection {
            Selection::All => {
                if self.schema.spec(DimensionKind::Feature, name).is_none() {
                    return Err(SessionError::UnknownDimension {
                        kind: DimensionKind::Feature.label().to_string(),
                        name: name.to_string(),
                    });
                }
            }
            Selection::Value(v) => {
                self.schema.validate(DimensionKind::Feature, name, v)?;
            }
        }
        self.features.insert(name.to_string(), selection);
        Ok(())
    }

    pub fn other_models(&self) -> &BTreeMap<String, String> {
        &self.other_models
    }

    pub fn feature_filters(&self) -> &BTreeMap<String, Selection> {
        &self.features
    }

    pub fn feature_selection(&self, name: &str) -> &Selection {
        self.features.get(name).unwrap_or(&Selection::All)
    }

    /// Number of side-by-side views: one per allowed value of the axis, or a
    /// single view when there is no axis.
    pub fn num_views(&self) -> usize {
        self.comparison().map_or(1, |c| c.allowed_values.len())
    }

    /// Heading for view `j`: the axis value it shows.
    pub fn view_label(&self, j: usize) -> Option<&str> {
        self.comparison()
            .and_then(|c| c.allowed_values.get(j))
            .map(String::as_str)
    }

    /// Number of display columns views are laid out across.
    pub fn display_columns(&self) -> usize {
        self.columns
    }

    /// `(row, column)` of view `j` in the display grid.
    pub fn view_cell(&self, j: usize) -> (usize, usize) {
        (j / self.columns, j % self.columns)
    }

    pub fn request(&self, j: usize) -> SliceRequest<'_> {
        SliceRequest {
            feature_filters: &self.features,
            comparison: self.comparison(),
            other_filters: &self.other_models,
            view_index: j,
        }
    }

    pub fn constraints_for_view(&self, j: usize) -> Result<Vec<Constraint>, SliceError> {
        self.request(j).constraints()
    }

    /// Rows of `table` belonging to view `j`.
    pub fn select(&self, table: &Table, j: usize) -> Result<Table, SliceError> {
        select_rows(table, &self.request(j), self.policy)
    }

    /// First pinned model value, used to locate per-model embedding files.
    pub fn first_other_model_value(&self) -> Option<&str> {
        self.metadata
            .model_args
            .iter()
            .find_map(|m| self.other_models.get(&m.feature_name))
            .map(String::as_str)
    }

    /// Compact description of the active filters for headers and reports.
    pub fn describe_filters(&self) -> String {
        let mut parts: Vec<String> = self
            .other_models
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        parts.extend(
            self.features
                .iter()
                .filter_map(|(k, s)| s.value().map(|v| format!("{k}={v}"))),
        );
        if parts.is_empty() {
            "no filters".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::Dimension;
    use serde_json::json;

    fn metadata() -> Metadata {
        Metadata {
            model_args: vec![
                DimensionSpec::new("model_type", &["a", "b", "c"]),
                DimensionSpec::new("signal", &["s1", "s2"]),
            ],
            feature_args: vec![DimensionSpec::new("city", &["sf", "ny"])],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let session = Session::new(metadata(), &BoardConfig::default());
        assert_eq!(session.comparison().unwrap().feature_name, "model_type");
        assert_eq!(session.other_models().get("signal").unwrap(), "s1");
        assert_eq!(session.feature_selection("city"), &Selection::All);
        assert_eq!(session.num_views(), 3);
    }

    #[test]
    fn test_single_model_arg_three_values_two_columns() {
        let meta = Metadata {
            model_args: vec![DimensionSpec::new("model_type", &["a", "b", "c"])],
            ..Default::default()
        };
        let session = Session::new(meta, &BoardConfig::default());
        assert_eq!(session.num_views(), 3);
        assert_eq!(session.display_columns(), 2);
        assert_eq!(session.view_cell(0), (0, 0));
        assert_eq!(session.view_cell(1), (0, 1));
        assert_eq!(session.view_cell(2), (1, 0));
        assert!(session.other_models().is_empty());
        assert_eq!(session.view_label(2), Some("c"));
    }

    #[test]
    fn test_no_models_single_view() {
        let session = Session::new(Metadata::default(), &BoardConfig::default());
        assert!(session.comparison().is_none());
        assert_eq!(session.num_views(), 1);
        assert_eq!(session.view_label(0), None);
        assert!(session.constraints_for_view(0).unwrap().is_empty());
    }

    #[test]
    fn test_set_comparison_swaps_pins() {
        let mut session = Session::new(metadata(), &BoardConfig::default());
        session.set_comparison("signal").unwrap();
        assert_eq!(session.comparison().unwrap().feature_name, "signal");
        assert_eq!(session.other_models().get("model_type").unwrap(), "a");
        assert!(!session.other_models().contains_key("signal"));
        assert_eq!(session.num_views(), 2);
        assert_eq!(session.first_other_model_value(), Some("a"));
    }

    #[test]
    fn test_set_comparison_unknown() {
        let mut session = Session::new(metadata(), &BoardConfig::default());
        assert!(matches!(
            session.set_comparison("city"),
            Err(SessionError::UnknownDimension { .. })
        ));
    }

    #[test]
    fn test_pin_model_validation() {
        let mut session = Session::new(metadata(), &BoardConfig::default());
        session.pin_model("signal", "s2").unwrap();
        assert_eq!(session.other_models().get("signal").unwrap(), "s2");
        assert!(matches!(
            session.pin_model("model_type", "a"),
            Err(SessionError::AxisPinned { .. })
        ));
        assert!(matches!(
            session.pin_model("signal", "s9"),
            Err(SessionError::UnknownValue { .. })
        ));
    }

    #[test]
    fn test_select_feature_validation() {
        let mut session = Session::new(metadata(), &BoardConfig::default());
        session
            .select_feature("city", Selection::Value("ny".into()))
            .unwrap();
        assert_eq!(session.feature_selection("city").value(), Some("ny"));
        assert!(session.select_feature("city", Selection::Value("la".into())).is_err());
        assert!(session.select_feature("weather", Selection::All).is_err());
        session.select_feature("city", Selection::All).unwrap();
        assert_eq!(session.feature_selection("city"), &Selection::All);
    }

    #[test]
    fn test_constraints_for_view() {
        let mut session = Session::new(metadata(), &BoardConfig::default());
        session
            .select_feature("city", Selection::Value("sf".into()))
            .unwrap();
        let constraints = session.constraints_for_view(1).unwrap();
        assert!(constraints.contains(&Constraint::new(Dimension::feature("city"), "sf")));
        assert!(constraints.contains(&Constraint::new(Dimension::model("model_type"), "b")));
        assert!(constraints.contains(&Constraint::new(Dimension::model("signal"), "s1")));
        assert_eq!(constraints.len(), 3);
    }

    #[test]
    fn test_select_rows_for_view() {
        let session = Session::new(metadata(), &BoardConfig::default());
        let table = Table::new(
            vec!["model_model_type".into(), "model_signal".into(), "y".into()],
            vec![
                vec![json!("a"), json!("s1"), json!(1)],
                vec![json!("b"), json!("s1"), json!(2)],
                vec![json!("b"), json!("s2"), json!(3)],
            ],
        );
        let view = session.select(&table, 1).unwrap();
        assert_eq!(view.rows, vec![vec![json!("b"), json!("s1"), json!(2)]]);
    }

    #[test]
    fn test_select_python_written_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.csv");
        std::fs::write(
            &path,
            "model_bucket,feature_flag,y\n1.0,True,1\n2.0,False,2\n,True,3\n",
        )
        .unwrap();
        let table = Table::from_csv_path(&path).unwrap();
        let meta: Metadata = serde_json::from_value(json!({
            "model_args": [{"feature_name": "bucket", "allowed_values": [1, 2]}],
            "feature_args": [{"feature_name": "flag", "allowed_values": [true, false]}],
        }))
        .unwrap();

        let mut session = Session::new(meta, &BoardConfig::default());
        assert_eq!(session.select(&table, 0).unwrap().len(), 1);
        assert_eq!(session.select(&table, 1).unwrap().len(), 1);

        session
            .select_feature("flag", Selection::Value("true".into()))
            .unwrap();
        let view = session.select(&table, 0).unwrap();
        assert_eq!(view.rows, vec![vec![json!("1.0"), json!("True"), json!("1")]]);
        assert!(session.select(&table, 1).unwrap().is_empty());
    }

    #[test]
    fn test_describe_filters() {
        let mut session = Session::new(metadata(), &BoardConfig::default());
        assert_eq!(session.describe_filters(), "signal=s1");
        session
            .select_feature("city", Selection::Value("ny".into()))
            .unwrap();
        assert_eq!(session.describe_filters(), "signal=s1, city=ny");
        let empty = Session::new(Metadata::default(), &BoardConfig::default());
        assert_eq!(empty.describe_filters(), "no filters");
    }
}
