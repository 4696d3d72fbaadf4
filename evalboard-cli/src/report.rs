//! Plain-text report of every dashboard, printed in `--no-tui` mode with the
//! default session selections.

use evalboard_core::views::{EmbeddingContent, SectionContent};
use evalboard_core::{
    BoardConfig, ExplainCache, ExplainOutcome, Metadata, Sampler, SectionOptions, Session,
    build_section, list_dashboards, scan_dashboard,
};
use std::io::Write;
use std::path::Path;

/// Number of features listed in the explainability summary.
const TOP_FEATURES: usize = 10;

/// Print the report to stdout.
pub fn print(log_folder: &Path, config: &BoardConfig, metadata: Metadata) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, log_folder, config, metadata)
}

fn label(view: Option<&str>) -> String {
    view.map_or_else(String::new, |v| format!("[{v}] "))
}

/// Write the report for `log_folder` to `out`.
pub fn write_report<W: Write>(
    out: &mut W,
    log_folder: &Path,
    config: &BoardConfig,
    metadata: Metadata,
) -> anyhow::Result<()> {
    let session = Session::new(metadata, config);
    let mut sampler = Sampler::new(config.sampling.seed);
    let options = SectionOptions::default();

    writeln!(out, "evalboard report for {}", log_folder.display())?;
    writeln!(out, "generated {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    match session.comparison() {
        Some(axis) => writeln!(
            out,
            "comparison: {} ({} views)",
            axis.feature_name,
            session.num_views()
        )?,
        None => writeln!(out, "comparison: none")?,
    }
    writeln!(out, "filters: {}", session.describe_filters())?;

    for name in list_dashboards(log_folder)? {
        writeln!(out)?;
        writeln!(out, "== Dashboard: {name} ==")?;
        let dashboard = scan_dashboard(log_folder, &name)?;
        for section in &dashboard.sections {
            writeln!(out, "-- {} --", section.title())?;
            match build_section(section, &session, &options, &config.sampling, &mut sampler) {
                Ok(content) => write_section(out, &content)?,
                Err(e) => {
                    tracing::warn!(section = %section.name, error = %e, "Failed to build section");
                    writeln!(out, "  failed: {e}")?;
                }
            }
            if !section.images.is_empty() {
                let names: Vec<String> = section
                    .images
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .collect();
                writeln!(out, "  images: {}", names.join(", "))?;
            }
        }
    }

    if session.metadata().has_explainability() {
        writeln!(out)?;
        writeln!(out, "== Explainability ==")?;
        match ExplainCache::new().explain(session.metadata(), log_folder) {
            Ok(ExplainOutcome::Ready(explanation)) => {
                let top: Vec<String> = explanation
                    .attributions
                    .importance()
                    .into_iter()
                    .take(TOP_FEATURES)
                    .map(|(name, value)| format!("{name} ({value:.3})"))
                    .collect();
                writeln!(out, "  points: {}", explanation.attributions.len())?;
                writeln!(out, "  base value: {:.3}", explanation.attributions.base_value)?;
                writeln!(out, "  top features: {}", top.join(", "))?;
            }
            Ok(ExplainOutcome::Insufficient {
                available,
                required,
            }) => writeln!(
                out,
                "  Not sufficient data points: {available} available, {required} required"
            )?,
            Err(e) => writeln!(out, "  failed: {e}")?,
        }
    }
    Ok(())
}

fn write_section<W: Write>(out: &mut W, content: &SectionContent) -> std::io::Result<()> {
    match content {
        SectionContent::Alerts(alerts) => {
            for alert in alerts {
                writeln!(out, "  ! {}: {}", alert.name, alert.message)?;
            }
        }
        SectionContent::Lines(plot) => {
            writeln!(out, "  axes: {} vs {}", plot.x_axis, plot.y_axis)?;
            for view in &plot.views {
                for series in &view.series {
                    let last = series
                        .points
                        .last()
                        .map_or_else(|| "-".to_string(), |(_, y)| format!("{y}"));
                    writeln!(
                        out,
                        "  {}{}: {} points, last {}={last}",
                        label(view.label.as_deref()),
                        series.name,
                        series.points.len(),
                        plot.y_axis
                    )?;
                }
            }
        }
        SectionContent::Histograms(views) => {
            for view in views {
                for series in &view.series {
                    let n = series.values.len();
                    let mean = if n == 0 {
                        "-".to_string()
                    } else {
                        format!("{:.4}", series.values.iter().sum::<f64>() / n as f64)
                    };
                    writeln!(
                        out,
                        "  {}{}: n={n} mean={mean}",
                        label(view.label.as_deref()),
                        series.name
                    )?;
                }
            }
        }
        SectionContent::Embeddings(panel) => {
            if let Some(selected) = panel.selected {
                let points: Vec<String> = panel.view_points.iter().map(|p| p.to_string()).collect();
                writeln!(out, "  view point {selected} of [{}]", points.join(", "))?;
            }
            for cell in &panel.cells {
                match &cell.content {
                    EmbeddingContent::Points(set) => {
                        write!(
                            out,
                            "  {}: {} points, {} clusters",
                            cell.title,
                            set.points.len(),
                            set.clusters().len()
                        )?;
                        if !set.hover_fields.is_empty() {
                            write!(out, ", hover: {}", set.hover_fields.join(", "))?;
                        }
                        writeln!(out)?;
                    }
                    EmbeddingContent::NotSufficientData => {
                        writeln!(out, "  {}: Not sufficient data.", cell.title)?
                    }
                    EmbeddingContent::Hidden => writeln!(out, "  {}: hidden (opt-in)", cell.title)?,
                }
            }
        }
        SectionContent::Bars(cells) => {
            for cell in cells {
                match &cell.graph {
                    Some(graph) => {
                        let groups: Vec<String> = graph
                            .groups
                            .iter()
                            .map(|g| {
                                let bars: Vec<String> = g
                                    .bars
                                    .iter()
                                    .enumerate()
                                    .map(|(i, (k, v))| match g.hover.get(i) {
                                        Some(h) if !h.is_empty() => format!("{k}={v} [{h}]"),
                                        _ => format!("{k}={v}"),
                                    })
                                    .collect();
                                format!("{}({})", g.name, bars.join(", "))
                            })
                            .collect();
                        writeln!(out, "  For count {}: {}", cell.gate.label, groups.join(" "))?;
                    }
                    None => writeln!(out, "  For count {}: hidden (opt-in)", cell.gate.label)?,
                }
            }
        }
        SectionContent::Images => {}
    }
    Ok(())
}
