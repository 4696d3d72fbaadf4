//! Discovers dashboards under the log folder and classifies their
//! directories into plot sections by literal path-segment names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What a section directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Alerts,
    LinePlot,
    Histogram,
    Umap,
    Tsne,
    BarGraph,
    /// Any other directory; only its images are shown.
    Other,
}

impl SectionKind {
    /// Classify a directory from its last two path segments.
    pub fn classify(name: &str, parent: Option<&str>) -> Self {
        match (name, parent) {
            ("alerts", _) => Self::Alerts,
            (_, Some("line_plots")) => Self::LinePlot,
            ("umap_and_clusters", Some("histograms")) => Self::Umap,
            ("tsne_and_clusters", Some("histograms")) => Self::Tsne,
            (_, Some("histograms")) => Self::Histogram,
            (_, Some("bar_graphs")) => Self::BarGraph,
            _ => Self::Other,
        }
    }

    /// Extension of the data files this section reads.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Alerts | Self::Umap | Self::Tsne | Self::BarGraph => Some("json"),
            Self::LinePlot | Self::Histogram => Some("csv"),
            Self::Other => None,
        }
    }

    /// Sidebar label prefix, e.g. "Line-plot for".
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Self::Alerts => "Alerts",
            Self::LinePlot => "Line-plot for",
            Self::Histogram => "Histogram for",
            Self::Umap => "UMAP for",
            Self::Tsne => "t-SNE for",
            Self::BarGraph => "Bar graph for",
            Self::Other => "Images in",
        }
    }

    /// Alerts are always displayed; plots are opt-in from the sidebar.
    pub fn always_visible(&self) -> bool {
        matches!(self, Self::Alerts)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Alerts => "alerts",
            Self::LinePlot => "line plot",
            Self::Histogram => "histogram",
            Self::Umap => "umap",
            Self::Tsne => "t-sne",
            Self::BarGraph => "bar graph",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// One classified directory of a dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Last path segment; used as the plot name.
    pub name: String,
    pub kind: SectionKind,
    pub dir: PathBuf,
    /// Data files found anywhere under `dir`, sorted.
    pub files: Vec<PathBuf>,
    /// PNG images directly inside `dir`, sorted.
    pub images: Vec<PathBuf>,
}

impl Section {
    pub fn title(&self) -> String {
        match self.kind {
            SectionKind::Alerts => "Alerts".to_string(),
            kind => format!("{} {}", kind.toggle_label(), self.name),
        }
    }

    /// Whether there is anything to show for this section.
    pub fn has_content(&self) -> bool {
        !self.images.is_empty() || (self.kind != SectionKind::Other && !self.files.is_empty())
    }
}

/// A top-level dashboard and its sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub name: String,
    pub sections: Vec<Section>,
}

/// Names of the dashboards under `log_folder`: its immediate
/// sub-directories, sorted. Hidden directories are skipped.
pub fn list_dashboards(log_folder: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(log_folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Walk one dashboard and classify every directory under it.
pub fn scan_dashboard(log_folder: &Path, name: &str) -> std::io::Result<Dashboard> {
    let root = log_folder.join(name);
    let mut sections = Vec::new();

    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        let dir_name = segment(dir);
        let parent = dir.parent().map(segment);
        let kind = SectionKind::classify(&dir_name, parent.as_deref());

        let files = match kind.extension() {
            Some(ext) => files_with_extension(dir, ext, true)?,
            None => Vec::new(),
        };
        let images = files_with_extension(dir, "png", false)?;

        let section = Section {
            name: dir_name,
            kind,
            dir: dir.to_path_buf(),
            files,
            images,
        };
        if section.has_content() {
            sections.push(section);
        }
    }

    tracing::debug!(
        dashboard = name,
        sections = sections.len(),
        "Scanned dashboard"
    );
    Ok(Dashboard {
        name: name.to_string(),
        sections,
    })
}

fn segment(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn files_with_extension(dir: &Path, ext: &str, recursive: bool) -> std::io::Result<Vec<PathBuf>> {
    let depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(depth) {
        let entry = entry.map_err(std::io::Error::other)?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(ext)
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
