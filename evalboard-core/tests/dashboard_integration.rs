//! Integration tests for a complete log folder.
//!
//! These tests lay out a realistic log folder on disk and drive it through
//! metadata loading, dashboard discovery, session selection and section
//! aggregation.

use evalboard_core::config::SamplingConfig;
use evalboard_core::views::{EmbeddingContent, SectionContent};
use evalboard_core::{
    BoardConfig, ExplainCache, ExplainOutcome, Metadata, Sampler, SectionKind, SectionOptions,
    Selection, Session, build_section, list_dashboards, scan_dashboard,
};
use serde_json::json;
use std::path::Path;

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A log folder with one dashboard holding every section kind.
fn log_folder() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("metadata.json"),
        &json!({
            "model_args": [
                {"feature_name": "model_type", "allowed_values": ["a", "b", "c"]},
                {"feature_name": "signal", "allowed_values": ["s1", "s2"]}
            ],
            "feature_args": [
                {"feature_name": "city", "allowed_values": ["sf", "ny"]}
            ],
            "path_shap_file": "explainer.json",
            "path_all_data": "all_data.csv",
            "shap_num_points": 2
        })
        .to_string(),
    );

    let dash = root.join("performance");
    write(&dash.join("alerts/accuracy_drop.json"), r#""Accuracy fell below 0.8""#);
    write(
        &dash.join("line_plots/accuracy/0.csv"),
        "x_count,y_accuracy,model_model_type,model_signal,feature_city\n\
         1,0.90,a,s1,sf\n2,0.80,b,s1,sf\n3,0.70,c,s1,ny\n4,0.60,b,s2,sf\n",
    );
    write(
        &dash.join("histograms/errors/0.csv"),
        "y_points,model_model_type,model_signal\n0.1,a,s1\n0.2,b,s1\n0.3,b,s1\n",
    );
    write(
        &dash.join("histograms/umap_and_clusters/100_a_s1.json"),
        &json!({
            "umap": [[0.0, 1.0], [1.0, 0.0]],
            "clusters": [0, 1],
            "hover_texts": [{"id": "r1"}, {"id": "r2"}],
            "model_model_type": "a",
            "model_signal": "s1"
        })
        .to_string(),
    );
    write(
        &dash.join("bar_graphs/counts/-1.json"),
        r#"{"errors": {"sf": 3, "ny": 1}}"#,
    );
    write(&dash.join("images/confusion.png"), "");

    write(
        &root.join("explainer.json"),
        &json!({
            "kind": "linear",
            "feature_names": ["f1", "f2"],
            "coefficients": [1.0, 2.0],
            "intercept": 0.0
        })
        .to_string(),
    );
    write(
        &root.join("all_data.csv"),
        "id,f1,f2,output,gt\n1,1,0,1,1\n2,3,2,7,6\n3,5,5,15,15\n",
    );
    dir
}

#[test]
fn test_full_dashboard_walkthrough() {
    let dir = log_folder();
    let metadata = Metadata::load(dir.path()).unwrap();
    assert_eq!(list_dashboards(dir.path()).unwrap(), vec!["performance"]);

    let dashboard = scan_dashboard(dir.path(), "performance").unwrap();
    let kinds: Vec<SectionKind> = dashboard.sections.iter().map(|s| s.kind).collect();
    for kind in [
        SectionKind::Alerts,
        SectionKind::LinePlot,
        SectionKind::Histogram,
        SectionKind::Umap,
        SectionKind::BarGraph,
        SectionKind::Other,
    ] {
        assert!(kinds.contains(&kind), "missing {kind}");
    }

    let config = BoardConfig::default();
    let mut session = Session::new(metadata, &config);
    session
        .select_feature("city", Selection::Value("sf".into()))
        .unwrap();
    let mut sampler = Sampler::new(Some(7));
    let sampling = SamplingConfig::default();
    let options = SectionOptions::default();

    for section in &dashboard.sections {
        let content = build_section(section, &session, &options, &sampling, &mut sampler).unwrap();
        match content {
            SectionContent::Lines(plot) => {
                assert_eq!(plot.views.len(), 3);
                let ys: Vec<Vec<(f64, f64)>> = plot
                    .views
                    .iter()
                    .map(|v| v.series[0].points.clone())
                    .collect();
                assert_eq!(ys, vec![vec![(1.0, 0.9)], vec![(2.0, 0.8)], vec![]]);
            }
            SectionContent::Histograms(views) => {
                // The histogram file has no feature_city column.
                assert!(views.iter().all(|v| v.series[0].values.is_empty()));
            }
            SectionContent::Embeddings(panel) => {
                assert_eq!(panel.selected, Some(100));
                assert_eq!(panel.cells.len(), 3);
                assert!(matches!(panel.cells[1].content, EmbeddingContent::NotSufficientData));
            }
            SectionContent::Bars(cells) => {
                assert_eq!(cells[0].graph.as_ref().unwrap().groups[0].bars.len(), 2);
            }
            SectionContent::Alerts(alerts) => {
                assert_eq!(alerts[0].message, "Accuracy fell below 0.8");
            }
            SectionContent::Images => assert_eq!(section.images.len(), 1),
        }
    }
}

#[test]
fn test_embedding_sliced_by_feature_without_column() {
    let dir = log_folder();
    let metadata = Metadata::load(dir.path()).unwrap();
    let dashboard = scan_dashboard(dir.path(), "performance").unwrap();
    let umap = dashboard
        .sections
        .iter()
        .find(|s| s.kind == SectionKind::Umap)
        .unwrap();

    let session = Session::new(metadata, &BoardConfig::default());
    let content = build_section(
        umap,
        &session,
        &SectionOptions::default(),
        &SamplingConfig::default(),
        &mut Sampler::new(Some(0)),
    )
    .unwrap();
    let SectionContent::Embeddings(panel) = content else {
        panic!("expected embeddings");
    };
    let EmbeddingContent::Points(set) = &panel.cells[0].content else {
        panic!("expected points");
    };
    assert_eq!(set.points.len(), 2);
    assert_eq!(set.points[0].hover, vec![("id".to_string(), "r1".to_string())]);
}

#[test]
fn test_explainability_from_metadata() {
    let dir = log_folder();
    let metadata = Metadata::load(dir.path()).unwrap();
    assert!(metadata.has_explainability());

    let cache = ExplainCache::new();
    let ExplainOutcome::Ready(explanation) = cache.explain(&metadata, dir.path()).unwrap() else {
        panic!("expected explanation");
    };
    assert_eq!(explanation.ids, vec!["1", "2"]);
    let importance = explanation.attributions.importance();
    assert_eq!(importance[0].0, "f2");
    let waterfall = explanation.attributions.waterfall(1).unwrap();
    // Linear model output for the second row: 3 + 2 * 2.
    assert!((waterfall.prediction - 7.0).abs() < 1e-9);
}
