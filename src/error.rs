// Error taxonomy for report actions

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a report action
///
/// Empty results are never an error; every report type has its own
/// "no data" state.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to open pipeline database {}: {source}", .path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Pipeline database {} has no '{table}' table", .path.display())]
    MissingTable { path: PathBuf, table: String },

    #[error("Failed to {context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ReportError {
    /// Adapter for `map_err` on rusqlite calls
    pub fn query(context: &'static str) -> impl FnOnce(rusqlite::Error) -> ReportError {
        move |source| ReportError::Query { context, source }
    }

    /// Connection and query failures come from the database, not the user
    pub fn is_database(&self) -> bool {
        !matches!(self, ReportError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
