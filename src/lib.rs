//! Consolidation and metrics engine for RVTools inventory exports.
//!
//! Reads every RVTools workbook in a folder, merges their vInfo, vHost and
//! vMetaData sheets into three consolidated tables, derives dashboard metrics
//! and writes the consolidated workbook, summary, data tables and manifest.
pub mod classify;
pub mod config;
pub mod consolidator;
pub mod error;
pub mod extractor;
pub mod metrics;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use consolidator::Consolidator;
pub use error::{ExtractError, OutputError};
pub use metrics::compute_metrics;
pub use reports::{build_reports, read_manifest_metrics, run_pipeline, write_reports, ReportBundle};
pub use types::{ConsolidatedData, DashboardMetrics, Manifest, ProcessingResult};
