//! Multi-file aggregation: turns the files of one section into per-view data
//! ready to draw, slicing every file through the session's constraints.

use crate::artifacts::{
    Alert, BarGraph, EmbeddingSnapshot, ScatterPoint, count_from_file_name, embedding_file_name,
    file_stem, scatter_points, view_points,
};
use crate::config::SamplingConfig;
use crate::error::{ArtifactError, Result};
use crate::session::Session;
use crate::table::Table;
use crate::walker::{Section, SectionKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Column holding histogram samples.
pub const HISTOGRAM_COLUMN: &str = "y_points";

/// Random down-sampling shared by every aggregation path.
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    /// A seeded sampler is reproducible; an unseeded one draws from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// At most `max` items, chosen without replacement, in original order.
    pub fn sample<T: Clone>(&mut self, items: &[T], max: usize) -> Vec<T> {
        if items.len() <= max {
            return items.to_vec();
        }
        let mut picked = index::sample(&mut self.rng, items.len(), max).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|i| items[i].clone()).collect()
    }
}

/// User choices that shape a section beyond the session's filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionOptions {
    /// Selected embedding view point; defaults to the first available.
    pub view_point: Option<i64>,
    /// File stems of opt-in snapshots the user enabled.
    pub enabled_counts: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Line plots
// ---------------------------------------------------------------------------

/// One line: the sliced `(x, y)` points of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// All lines for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct LineView {
    pub label: Option<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePlot {
    pub x_axis: String,
    pub y_axis: String,
    pub views: Vec<LineView>,
}

/// Aggregate line-plot files into one chart per view.
///
/// Axes come from the first file: its last `x_` and last `y_` columns.
pub fn build_line_plot(
    files: &[PathBuf],
    session: &Session,
    sampling: &SamplingConfig,
    sampler: &mut Sampler,
) -> Result<LinePlot> {
    let files = sampler.sample(files, sampling.max_files);
    let Some(first) = files.first() else {
        return Ok(LinePlot {
            x_axis: String::new(),
            y_axis: String::new(),
            views: Vec::new(),
        });
    };

    let tables = files
        .iter()
        .map(|f| Table::from_csv_path(f))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let axis = |prefix: &str| {
        tables[0]
            .last_column_with_prefix(prefix)
            .map(str::to_string)
            .ok_or_else(|| ArtifactError::MissingAxis {
                path: first.clone(),
                prefix: prefix.to_string(),
            })
    };
    let x_axis = axis("x_")?;
    let y_axis = axis("y_")?;

    let mut views = Vec::with_capacity(session.num_views());
    for j in 0..session.num_views() {
        let mut series = Vec::with_capacity(files.len());
        for (i, (file, table)) in files.iter().zip(&tables).enumerate() {
            let sliced = session.select(table, j)?;
            let points = sliced.numeric_pairs(&x_axis, &y_axis).unwrap_or_else(|| {
                tracing::warn!(file = %file.display(), x = %x_axis, y = %y_axis, "File lacks plot axes");
                Vec::new()
            });
            series.push(Series {
                name: format!("{i},{}", file_stem(file)),
                points,
            });
        }
        views.push(LineView {
            label: session.view_label(j).map(str::to_string),
            series,
        });
    }

    Ok(LinePlot {
        x_axis,
        y_axis,
        views,
    })
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramView {
    pub label: Option<String>,
    pub series: Vec<HistogramSeries>,
}

/// Aggregate histogram files: each file's sliced `y_points` becomes one
/// series per view, down-sampled to `max_points`.
pub fn build_histograms(
    files: &[PathBuf],
    session: &Session,
    sampling: &SamplingConfig,
    sampler: &mut Sampler,
) -> Result<Vec<HistogramView>> {
    let tables = files
        .iter()
        .map(|f| {
            let table = Table::from_csv_path(f)?;
            if table.has_column(HISTOGRAM_COLUMN) {
                Ok(table)
            } else {
                Err(ArtifactError::MissingColumn {
                    path: f.clone(),
                    column: HISTOGRAM_COLUMN.to_string(),
                })
            }
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut views = Vec::with_capacity(session.num_views());
    for j in 0..session.num_views() {
        let mut series = Vec::with_capacity(files.len());
        for (file, table) in files.iter().zip(&tables) {
            let values = session
                .select(table, j)?
                .numeric_column(HISTOGRAM_COLUMN)
                .unwrap_or_default();
            series.push(HistogramSeries {
                name: file_stem(file),
                values: sampler.sample(&values, sampling.max_points),
            });
        }
        views.push(HistogramView {
            label: session.view_label(j).map(str::to_string),
            series,
        });
    }
    Ok(views)
}

/// One histogram bucket `[lo, hi)`; the last bucket is closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: u64,
}

/// Bucket every series over one shared range so they are comparable.
pub fn bin_series(series: &[HistogramSeries], bins: usize) -> Vec<Vec<Bin>> {
    let bins = bins.max(1);
    let finite = series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo > hi {
        return series.iter().map(|_| Vec::new()).collect();
    }
    let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };

    series
        .iter()
        .map(|s| {
            let mut out: Vec<Bin> = (0..bins)
                .map(|b| Bin {
                    lo: lo + width * b as f64,
                    hi: lo + width * (b + 1) as f64,
                    count: 0,
                })
                .collect();
            for v in s.values.iter().filter(|v| v.is_finite()) {
                let b = (((v - lo) / width) as usize).min(bins - 1);
                out[b].count += 1;
            }
            out
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Count-gated snapshots
// ---------------------------------------------------------------------------

/// A snapshot file and whether it shows without being enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedFile {
    pub path: PathBuf,
    /// File stem shown as "For count <label>".
    pub label: String,
    /// Negative counts are always shown; others are opt-in.
    pub always_visible: bool,
}

impl GatedFile {
    pub fn is_visible(&self, options: &SectionOptions) -> bool {
        self.always_visible || options.enabled_counts.contains(&self.label)
    }
}

pub fn gate_files(files: &[PathBuf]) -> Vec<GatedFile> {
    files
        .iter()
        .map(|path| GatedFile {
            path: path.clone(),
            label: file_stem(path),
            always_visible: count_from_file_name(path).is_some_and(|c| c < 0),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Embeddings
// ---------------------------------------------------------------------------

/// Points of one embedding snapshot after slicing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSet {
    pub dims: usize,
    pub points: Vec<ScatterPoint>,
    pub hover_fields: Vec<String>,
}

impl ScatterSet {
    /// Distinct cluster labels, sorted.
    pub fn clusters(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.points.iter().map(|p| p.cluster.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingContent {
    Points(ScatterSet),
    /// No snapshot was logged for this combination.
    NotSufficientData,
    /// An opt-in snapshot the user has not enabled.
    Hidden,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingCell {
    pub title: String,
    /// Stem used to enable opt-in snapshots.
    pub gate: Option<String>,
    pub content: EmbeddingContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingPanel {
    /// Sorted view points available for selection (axis mode only).
    pub view_points: Vec<i64>,
    pub selected: Option<i64>,
    pub cells: Vec<EmbeddingCell>,
}

/// Load one embedding file and slice it for view `j`.
pub fn load_scatter(path: &Path, session: &Session, j: usize) -> Result<ScatterSet> {
    let snapshot = EmbeddingSnapshot::load(path)?;
    let sliced = session.select(&snapshot.table, j)?;
    Ok(ScatterSet {
        dims: snapshot.dims,
        points: scatter_points(&sliced, &snapshot.hover_fields),
        hover_fields: snapshot.hover_fields,
    })
}

/// Build the embedding panel of a UMAP / t-SNE section.
///
/// With a comparison axis, one cell per view shows the snapshot logged for
/// the selected view point; otherwise every file is listed, count-gated and
/// sliced with the single view.
pub fn build_embeddings(
    section: &Section,
    session: &Session,
    options: &SectionOptions,
) -> Result<EmbeddingPanel> {
    let Some(axis) = session.comparison() else {
        let mut cells = Vec::new();
        for gated in gate_files(&section.files) {
            let content = if gated.is_visible(options) {
                EmbeddingContent::Points(load_scatter(&gated.path, session, 0)?)
            } else {
                EmbeddingContent::Hidden
            };
            cells.push(EmbeddingCell {
                title: format!("For count {}", gated.label),
                gate: (!gated.always_visible).then(|| gated.label.clone()),
                content,
            });
        }
        return Ok(EmbeddingPanel {
            view_points: Vec::new(),
            selected: None,
            cells,
        });
    };

    let points = view_points(&section.files);
    let selected = options
        .view_point
        .filter(|p| points.contains(p))
        .or_else(|| points.first().copied());
    let other = session.first_other_model_value();

    let mut cells = Vec::with_capacity(session.num_views());
    if let Some(count) = selected {
        for (j, value) in axis.allowed_values.iter().enumerate() {
            let path = embedding_file_name(&section.dir, count, value, other);
            let content = if path.exists() {
                EmbeddingContent::Points(load_scatter(&path, session, j)?)
            } else {
                EmbeddingContent::NotSufficientData
            };
            let title = match other {
                Some(o) => format!("Model: {value}, Signal: {o}, Count: {count}"),
                None => format!("Model: {value}, Count: {count}"),
            };
            cells.push(EmbeddingCell {
                title,
                gate: None,
                content,
            });
        }
    }

    Ok(EmbeddingPanel {
        view_points: points,
        selected,
        cells,
    })
}

// ---------------------------------------------------------------------------
// Whole sections
// ---------------------------------------------------------------------------

/// A count-gated bar-graph snapshot, loaded when visible.
#[derive(Debug, Clone, PartialEq)]
pub struct BarCell {
    pub gate: GatedFile,
    pub graph: Option<BarGraph>,
}

/// Everything needed to draw one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Alerts(Vec<Alert>),
    Lines(LinePlot),
    Histograms(Vec<HistogramView>),
    Embeddings(EmbeddingPanel),
    Bars(Vec<BarCell>),
    /// Nothing but images.
    Images,
}

/// Read and aggregate one section for the current session.
pub fn build_section(
    section: &Section,
    session: &Session,
    options: &SectionOptions,
    sampling: &SamplingConfig,
    sampler: &mut Sampler,
) -> Result<SectionContent> {
    let content = match section.kind {
        SectionKind::Alerts => SectionContent::Alerts(
            section
                .files
                .iter()
                .map(|f| Alert::load(f))
                .collect::<std::result::Result<_, _>>()?,
        ),
        SectionKind::LinePlot => {
            SectionContent::Lines(build_line_plot(&section.files, session, sampling, sampler)?)
        }
        SectionKind::Histogram => SectionContent::Histograms(build_histograms(
            &section.files,
            session,
            sampling,
            sampler,
        )?),
        SectionKind::Umap | SectionKind::Tsne => {
            SectionContent::Embeddings(build_embeddings(section, session, options)?)
        }
        SectionKind::BarGraph => {
            let mut cells = Vec::new();
            for gate in gate_files(&section.files) {
                let graph = if gate.is_visible(options) {
                    Some(BarGraph::load(&gate.path)?)
                } else {
                    None
                };
                cells.push(BarCell { gate, graph });
            }
            SectionContent::Bars(cells)
        }
        SectionKind::Other => SectionContent::Images,
    };
    tracing::debug!(section = %section.name, kind = %section.kind, "Built section");
    Ok(content)
}
