//! Statement execution for one SQL session that survives dropped connections.
//!
//! A [`Session`] owns a primary connection and a separate DDL connection. Every
//! statement path ([`Session::row_query`], [`Session::exec`],
//! [`Session::ddl_exec`], [`Session::scan_into`]) notices an invalidated
//! connection, rebuilds it, selects the session's schema again, and reissues
//! the statement, up to [`MAX_BAD_CONN_RETRIES`] attempts. What happened along
//! the way is recorded in the session's [`DiagnosticSink`].
//!
//! ```rust,no_run
//! use resilient_sql::prelude::*;
//!
//! # async fn demo() -> Result<(), SessionDbError> {
//! let options = ConnectionOptions::builder("127.0.0.1".into(), 3306, "audit".into(), "pw".into())
//!     .wait_timeout(28_800)
//!     .build()?;
//! let mut session = Session::new(MySqlBackend, options, 1)?;
//! session.use_schema("orders").await?;
//!
//! let mut count: Option<i64> = None;
//! session.scan_into("SELECT COUNT(*) FROM t", &mut count).await?;
//! session.exec("UPDATE t SET flag = 1", true).await?;
//!
//! for diag in session.diagnostics().entries() {
//!     println!("{:?}: {}", diag.severity, diag.message);
//! }
//! # Ok(()) }
//! ```

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod plan;
pub mod prelude;
pub mod results;
pub mod scan;
pub mod session;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use backend::{Backend, BackendConnection};
pub use config::{ConnectionOptions, ConnectionOptionsBuilder};
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity};
pub use error::{ER_NO_DB_ERROR, FailureClass, SessionDbError};
pub use executor::{MAX_BAD_CONN_RETRIES, SCHEMA_LOST_WARNING};
pub use plan::QueryPlan;
pub use results::{CustomDbRow, ResultSet, RowCursor};
pub use scan::{FromRow, ScanDest};
pub use session::{ConnTarget, Session};
pub use types::{ExecResult, RowValues};
