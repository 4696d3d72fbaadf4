//! # Evalboard Core
//!
//! Core library for the evalboard model-monitoring dashboard.
//! Provides the slice engine, metadata and session state, the log-folder
//! walker, artifact decoders, multi-file views, explainability, and
//! configuration.

pub mod artifacts;
pub mod config;
pub mod dimension;
pub mod error;
pub mod explain;
pub mod metadata;
pub mod session;
pub mod slice;
pub mod table;
pub mod views;
pub mod walker;

// Re-export commonly used types at the crate root.
pub use config::{BoardConfig, MissingColumnPolicy, load_config};
pub use dimension::{Dimension, DimensionKind, DimensionSchema};
pub use error::{BoardError, Result};
pub use explain::{ExplainCache, ExplainOutcome, Explanation};
pub use metadata::{DimensionSpec, Metadata};
pub use session::Session;
pub use slice::{Constraint, Selection, SliceRequest, select_rows, select_rows_with};
pub use table::Table;
pub use views::{Sampler, SectionContent, SectionOptions, build_section};
pub use walker::{Dashboard, Section, SectionKind, list_dashboards, scan_dashboard};
