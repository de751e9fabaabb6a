//! Crate-wide error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for query execution, geometry handling, and export failures.
///
/// `Connection` and `Query` belong to the executor seam: implementations of
/// [`crate::source::QueryExecutor`] surface backend failures through them and
/// the pipeline treats both as fatal to the run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Connecting to the backing record store failed.
    #[error("connection to the record source failed: {reason}")]
    Connection {
        /// Backend-reported cause.
        reason: String,
    },
    /// A query executed against the record store failed.
    #[error("query '{context}' failed: {reason}")]
    Query {
        /// Which logical query failed.
        context: String,
        /// Backend-reported cause.
        reason: String,
    },
    /// A record's geometry column could not be parsed.
    #[error("record '{label}' carries unparseable geometry: {reason}")]
    Geometry {
        /// Map label of the offending record.
        label: String,
        /// Parser-reported cause.
        reason: String,
    },
    /// The boundary-layer path does not look like a supported format.
    #[error("unrecognized layer format '{}': provide a .geojson or .json file", path.display())]
    UnrecognizedLayerFormat {
        /// Offending path.
        path: PathBuf,
    },
    /// The boundary layer could not be read or parsed.
    #[error("failed reading layer '{}': {reason}", path.display())]
    LayerRead {
        /// Offending path.
        path: PathBuf,
        /// Read or parse failure cause.
        reason: String,
    },
    /// Filesystem failure while writing outputs.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Workbook serialization failure.
    #[error("workbook write failure: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
    /// Spatial export failure outside plain I/O.
    #[error("spatial export failure: {0}")]
    SpatialExport(String),
}
