mod attempt;

use attempt::{Attempt, ExecAttempt, QueryAttempt, ScanAttempt};

use crate::backend::Backend;
use crate::error::{ClassifyContext, FailureClass, SessionDbError, classify};
use crate::results::RowCursor;
use crate::scan::ScanDest;
use crate::session::{ConnTarget, Session};
use crate::types::{ExecResult, RowValues};

/// Attempts per statement, and rebuilds per reconnect.
pub const MAX_BAD_CONN_RETRIES: usize = 2;

/// Warning recorded when an idle timeout cost the session its schema.
pub const SCHEMA_LOST_WARNING: &str = "Database timeout reconnect.";

/// What a statement path does after a failure.
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    /// Reissue the statement once the connection is rebuilt.
    retry_after_reconnect: bool,
    /// Record the invalid-connection error again as a warning before retrying.
    warn_on_retry: bool,
    /// Treat "no database selected" after a long idle period as lost schema.
    schema_lost_branch: bool,
}

impl RetryPolicy {
    const READ: Self = Self {
        retry_after_reconnect: true,
        warn_on_retry: false,
        schema_lost_branch: false,
    };

    fn write(allow_retry: bool) -> Self {
        Self {
            retry_after_reconnect: allow_retry,
            warn_on_retry: allow_retry,
            schema_lost_branch: true,
        }
    }

    fn ddl(allow_retry: bool) -> Self {
        Self {
            schema_lost_branch: false,
            ..Self::write(allow_retry)
        }
    }
}

impl<B: Backend> Session<B> {
    /// Run a read statement on the primary connection.
    ///
    /// An invalid connection is rebuilt and the statement reissued, up to
    /// `MAX_BAD_CONN_RETRIES` attempts in total. Other errors are returned
    /// as they are.
    ///
    /// # Errors
    /// Returns the statement's last error, or `SessionDbError::ReconnectFailed`
    /// if the connection could not be rebuilt.
    pub async fn row_query(&mut self, sql: &str) -> Result<RowCursor, SessionDbError> {
        let mut attempt = QueryAttempt { sql };
        self.execute_with_reconnect(ConnTarget::Primary, RetryPolicy::READ, &mut attempt)
            .await
    }

    /// Run a write statement on the primary connection.
    ///
    /// After an invalid connection the connection is always rebuilt, but the
    /// statement is only reissued when `allow_retry` is set. With a server
    /// `wait_timeout` of at least 600 seconds and a bound schema, a
    /// "no database selected" error is taken as an idle disconnect: the
    /// connection is rebuilt, the schema restored, and the statement reissued.
    ///
    /// # Errors
    /// Returns the statement's last error, or `SessionDbError::ReconnectFailed`
    /// if the connection could not be rebuilt.
    pub async fn exec(&mut self, sql: &str, allow_retry: bool) -> Result<ExecResult, SessionDbError> {
        let mut attempt = ExecAttempt { sql };
        self.execute_with_reconnect(
            ConnTarget::Primary,
            RetryPolicy::write(allow_retry),
            &mut attempt,
        )
        .await
    }

    /// Run a schema-altering statement on the DDL connection.
    ///
    /// Same as [`Session::exec`] minus the idle-timeout branch.
    ///
    /// # Errors
    /// Returns the statement's last error, or `SessionDbError::ReconnectFailed`
    /// if the connection could not be rebuilt.
    pub async fn ddl_exec(
        &mut self,
        sql: &str,
        allow_retry: bool,
    ) -> Result<ExecResult, SessionDbError> {
        let mut attempt = ExecAttempt { sql };
        self.execute_with_reconnect(ConnTarget::Ddl, RetryPolicy::ddl(allow_retry), &mut attempt)
            .await
    }

    /// Run `sql` and decode its result into `dest`.
    ///
    /// For a JSON explain statement and a destination with a plan field, the
    /// statement is read a second time through a cursor and every row is
    /// joined into that field.
    ///
    /// # Errors
    /// Same as [`Session::row_query`], plus decode errors from `dest`.
    pub async fn scan_into<D: ScanDest>(
        &mut self,
        sql: &str,
        dest: &mut D,
    ) -> Result<(), SessionDbError> {
        self.scan_into_with_params(sql, dest, &[]).await
    }

    /// [`Session::scan_into`] with positional parameters.
    ///
    /// # Errors
    /// Same as [`Session::scan_into`].
    pub async fn scan_into_with_params<D: ScanDest>(
        &mut self,
        sql: &str,
        dest: &mut D,
        params: &[RowValues],
    ) -> Result<(), SessionDbError> {
        let mut attempt = ScanAttempt { sql, params, dest };
        self.execute_with_reconnect(ConnTarget::Primary, RetryPolicy::READ, &mut attempt)
            .await
    }

    fn classify_context(&self, target: ConnTarget, policy: RetryPolicy) -> ClassifyContext {
        ClassifyContext {
            schema_lost_branch: policy.schema_lost_branch && target == ConnTarget::Primary,
            wait_timeout: self.options.wait_timeout,
            schema_bound: !self.db_name.is_empty(),
        }
    }

    /// The retry loop shared by every statement path.
    async fn execute_with_reconnect<A>(
        &mut self,
        target: ConnTarget,
        policy: RetryPolicy,
        attempt: &mut A,
    ) -> Result<A::Output, SessionDbError>
    where
        A: Attempt<B::Conn>,
    {
        let mut tries = 0;
        loop {
            let conn = self.connection(target).await?;
            let err = match attempt.run(conn).await {
                Ok(out) => return Ok(out),
                Err(err) => err,
            };

            tracing::error!(
                conn_id = self.connection_id,
                retry = tries,
                error = %err,
                sql = attempt.sql(),
                "statement failed"
            );
            tries += 1;

            match classify(&err, self.classify_context(target, policy)) {
                FailureClass::Logical => return Err(err),
                FailureClass::ConnectionInvalidated => {
                    self.diagnostics.append_error(err.to_string());
                    self.reconnect(target).await?;
                    if !policy.retry_after_reconnect {
                        return Err(err);
                    }
                    if policy.warn_on_retry {
                        self.diagnostics.append_warning(err.to_string());
                    }
                }
                FailureClass::SchemaLost => {
                    self.reconnect(target).await?;
                    self.diagnostics.append_warning(SCHEMA_LOST_WARNING);
                }
            }

            if tries >= MAX_BAD_CONN_RETRIES {
                return Err(err);
            }
        }
    }
}
