//! Property-based tests for the slice engine using proptest.

use proptest::prelude::*;

use evalboard_core::{Constraint, Dimension, MissingColumnPolicy, Table, select_rows_with};
use serde_json::json;

const FEATURE_VALUES: [&str; 3] = ["sf", "ny", "la"];
const MODEL_VALUES: [&str; 2] = ["a", "b"];

fn table_strategy() -> impl Strategy<Value = Table> {
    prop::collection::vec((0usize..3, 0usize..2, -100i64..100), 0..40).prop_map(|rows| {
        Table::new(
            vec![
                "feature_city".into(),
                "model_model_type".into(),
                "y".into(),
            ],
            rows.into_iter()
                .map(|(f, m, y)| vec![json!(FEATURE_VALUES[f]), json!(MODEL_VALUES[m]), json!(y)])
                .collect(),
        )
    })
}

fn constraint_strategy() -> impl Strategy<Value = Constraint> {
    prop_oneof![
        (0usize..3).prop_map(|i| Constraint::new(Dimension::feature("city"), FEATURE_VALUES[i])),
        (0usize..2).prop_map(|i| Constraint::new(Dimension::model("model_type"), MODEL_VALUES[i])),
        Just(Constraint::new(Dimension::feature("region"), "eu")),
    ]
}

fn constraints_strategy() -> impl Strategy<Value = Vec<Constraint>> {
    prop::collection::vec(constraint_strategy(), 0..4)
}

// --- Algebraic properties ---

proptest! {
    #[test]
    fn slicing_twice_equals_slicing_by_union(
        table in table_strategy(),
        f1 in constraints_strategy(),
        f2 in constraints_strategy(),
    ) {
        let policy = MissingColumnPolicy::NoMatch;
        let stepwise = select_rows_with(
            &select_rows_with(&table, &f1, policy).unwrap(),
            &f2,
            policy,
        )
        .unwrap();
        let union: Vec<Constraint> = f1.iter().chain(&f2).cloned().collect();
        let combined = select_rows_with(&table, &union, policy).unwrap();
        prop_assert_eq!(stepwise, combined);
    }

    #[test]
    fn empty_filter_is_identity(table in table_strategy()) {
        let out = select_rows_with(&table, &[], MissingColumnPolicy::NoMatch).unwrap();
        prop_assert_eq!(out, table);
    }

    #[test]
    fn constraint_order_does_not_matter(
        table in table_strategy(),
        mut filters in constraints_strategy(),
    ) {
        let policy = MissingColumnPolicy::NoMatch;
        let forward = select_rows_with(&table, &filters, policy).unwrap();
        filters.reverse();
        let backward = select_rows_with(&table, &filters, policy).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn result_is_an_ordered_subset(
        table in table_strategy(),
        filters in constraints_strategy(),
    ) {
        let out = select_rows_with(&table, &filters, MissingColumnPolicy::NoMatch).unwrap();
        prop_assert_eq!(&out.columns, &table.columns);
        let mut remaining = table.rows.iter();
        for row in &out.rows {
            prop_assert!(remaining.any(|r| r == row));
        }
    }

    #[test]
    fn absent_column_matches_nothing(
        table in table_strategy(),
        filters in constraints_strategy(),
    ) {
        let mut filters = filters;
        filters.push(Constraint::new(Dimension::model("signal"), "s1"));
        let out = select_rows_with(&table, &filters, MissingColumnPolicy::NoMatch).unwrap();
        prop_assert!(out.is_empty());
    }
}
