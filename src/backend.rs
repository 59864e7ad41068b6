use async_trait::async_trait;

use crate::config::ConnectionOptions;
use crate::error::SessionDbError;
use crate::results::RowCursor;
use crate::types::{ExecResult, RowValues};

/// Driver side of the connection factory: opens one physical connection.
///
/// Implementations must map driver failures onto `SessionDbError` so that a
/// connection that can no longer be used comes back as
/// `SessionDbError::InvalidConnection` and server-side failures keep their
/// numeric code in `SessionDbError::Server`.
#[async_trait]
pub trait Backend: Send + Sync {
    type Conn: BackendConnection;

    /// Open a connection with `schema` as its default database. An empty
    /// schema opens without one.
    async fn connect(
        &self,
        options: &ConnectionOptions,
        schema: &str,
    ) -> Result<Self::Conn, SessionDbError>;
}

/// One physical connection as the session sees it.
#[async_trait]
pub trait BackendConnection: Send {
    /// Run a read statement and return its rows in server order.
    async fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<RowCursor, SessionDbError>;

    /// Run a statement that returns no rows.
    async fn exec(&mut self, sql: &str) -> Result<ExecResult, SessionDbError>;

    /// Liveness probe.
    async fn ping(&mut self) -> Result<(), SessionDbError>;

    /// Toggle per-statement logging on this handle.
    fn set_statement_logging(&mut self, enabled: bool);

    async fn close(self) -> Result<(), SessionDbError>
    where
        Self: Sized;
}
