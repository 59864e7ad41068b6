//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::backend::{Backend, BackendConnection};
pub use crate::config::{ConnectionOptions, ConnectionOptionsBuilder};
pub use crate::diagnostics::{Diagnostic, DiagnosticSink, Severity};
pub use crate::error::{ER_NO_DB_ERROR, SessionDbError};
pub use crate::executor::{MAX_BAD_CONN_RETRIES, SCHEMA_LOST_WARNING};
pub use crate::plan::QueryPlan;
pub use crate::results::{CustomDbRow, ResultSet, RowCursor};
pub use crate::scan::{FromRow, ScanDest};
pub use crate::session::{ConnTarget, Session};
pub use crate::types::{ExecResult, RowValues};

#[cfg(feature = "mysql")]
pub use crate::mysql::{MySqlBackend, MySqlConnection};
