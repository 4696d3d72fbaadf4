//! The slice engine: selects the rows of one table that belong to one view.
//!
//! Every filter is an equality mask over a dimension column; masks are ANDed,
//! so the order constraints are applied in never changes the result. A filter
//! whose column the table does not carry cannot match anything: under the
//! default [`MissingColumnPolicy::NoMatch`] the result is simply empty.

use crate::config::MissingColumnPolicy;
use crate::dimension::Dimension;
use crate::error::SliceError;
use crate::metadata::DimensionSpec;
use crate::table::{Table, value_matches};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel shown for an unconstrained feature selector.
pub const ALL: &str = "All";

/// A feature selector value: no constraint, or one required value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    All,
    Value(String),
}

impl Selection {
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Value(v) => Some(v),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "{ALL}"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

/// One equality requirement: `dimension`'s column must equal `value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Constraint {
    pub dimension: Dimension,
    pub value: String,
}

impl Constraint {
    pub fn new(dimension: Dimension, value: impl Into<String>) -> Self {
        Self {
            dimension,
            value: value.into(),
        }
    }
}

/// Everything that decides which rows belong to one view.
#[derive(Debug, Clone, Copy)]
pub struct SliceRequest<'a> {
    /// Feature name to selected value or [`Selection::All`].
    pub feature_filters: &'a BTreeMap<String, Selection>,
    /// The dimension compared side by side, if any.
    pub comparison: Option<&'a DimensionSpec>,
    /// Pinned values of the remaining model dimensions.
    pub other_filters: &'a BTreeMap<String, String>,
    /// Which allowed value of `comparison` is active.
    pub view_index: usize,
}

impl SliceRequest<'_> {
    /// Flatten the request into typed constraints. `All` selections add none.
    pub fn constraints(&self) -> Result<Vec<Constraint>, SliceError> {
        let mut constraints: Vec<Constraint> = self
            .feature_filters
            .iter()
            .filter_map(|(name, selection)| {
                selection
                    .value()
                    .map(|v| Constraint::new(Dimension::feature(name.clone()), v))
            })
            .collect();

        if let Some(axis) = self.comparison {
            let value = axis.allowed_values.get(self.view_index).ok_or_else(|| {
                SliceError::ViewOutOfRange {
                    dimension: axis.feature_name.clone(),
                    index: self.view_index,
                    len: axis.allowed_values.len(),
                }
            })?;
            constraints.push(Constraint::new(
                Dimension::model(axis.feature_name.clone()),
                value.clone(),
            ));
        }

        constraints.extend(
            self.other_filters
                .iter()
                .map(|(name, value)| Constraint::new(Dimension::model(name.clone()), value.clone())),
        );
        Ok(constraints)
    }
}

/// Rows of `table` belonging to the view described by `request`.
pub fn select_rows(
    table: &Table,
    request: &SliceRequest<'_>,
    policy: MissingColumnPolicy,
) -> Result<Table, SliceError> {
    select_rows_with(table, &request.constraints()?, policy)
}

/// Rows of `table` satisfying every constraint, in input order.
pub fn select_rows_with(
    table: &Table,
    constraints: &[Constraint],
    policy: MissingColumnPolicy,
) -> Result<Table, SliceError> {
    let mut mask: Option<Vec<bool>> = None;

    for constraint in constraints {
        let Some(idx) = constraint.dimension.locate(table) else {
            return match policy {
                MissingColumnPolicy::NoMatch => {
                    tracing::trace!(column = %constraint.dimension, "Filter column absent, no rows match");
                    Ok(table.empty_like())
                }
                MissingColumnPolicy::Strict => Err(SliceError::MissingColumn {
                    column: constraint.dimension.column(),
                }),
            };
        };

        let hits = table
            .rows
            .iter()
            .map(|row| value_matches(&row[idx], &constraint.value));
        mask = Some(match mask {
            None => hits.collect(),
            Some(prev) => prev.into_iter().zip(hits).map(|(a, b)| a && b).collect(),
        });
    }

    Ok(match mask {
        None => table.clone(),
        Some(mask) => table.filter_by_mask(&mask),
    })
}
