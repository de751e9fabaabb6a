#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Fold/collapse helpers reconciling geometric join fan-out.
pub mod aggregate;
/// Run configuration and the reporting window.
pub mod config;
/// Derived classification fields applied after folding.
pub mod derive;
/// Crate-wide error type.
pub mod errors;
/// Output sinks: per-type GeoJSON and the multi-sheet workbook.
pub mod export;
/// Per-organization boundary layer and the geometric overlap step.
pub mod overlay;
/// Per-run orchestration.
pub mod pipeline;
/// Tabular row model shared by every stage.
pub mod record;
/// The closed set of record types and their per-type rules.
pub mod record_type;
/// Canonical per-type output schemas.
pub mod schema;
/// Record source interfaces and per-type fetch logic.
pub mod source;
/// Documented aliases for the crate's key string/id types.
pub mod types;

pub use config::{ReportingWindow, RunConfig, DEFAULT_BOUNDARY_ORG};
pub use errors::ReportError;
pub use overlay::{OrgLayer, OverlayFragment};
pub use pipeline::{run, RunSummary};
pub use record::{CellValue, RecordSet, Row};
pub use record_type::RecordType;
pub use schema::CanonicalReport;
pub use source::{InMemoryExecutor, QueryExecutor, QueryKind, QueryRequest, RecordSource};
