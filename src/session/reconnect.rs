use super::{ConnTarget, Session};
use crate::backend::{Backend, BackendConnection};
use crate::error::SessionDbError;
use crate::executor::MAX_BAD_CONN_RETRIES;

/// `USE` statement for `schema`, backquoted.
#[must_use]
pub fn use_statement(schema: &str) -> String {
    format!("USE `{}`", schema.replace('`', "``"))
}

/// Restore schema context on `conn`.
///
/// An empty `schema` means nothing was ever selected, so the connection is
/// only probed with a ping.
///
/// # Errors
/// Returns the backend error of the `USE` or the ping.
pub async fn reselect_schema<C: BackendConnection>(
    conn: &mut C,
    schema: &str,
) -> Result<(), SessionDbError> {
    if schema.is_empty() {
        conn.ping().await
    } else {
        conn.exec(&use_statement(schema)).await.map(|_| ())
    }
}

impl<B: Backend> Session<B> {
    /// Rebuild `target`'s connection and restore the session's schema on it.
    ///
    /// The schema is the bound one, else the configured default. A reselect
    /// that fails with an invalid connection rebuilds again, within
    /// `MAX_BAD_CONN_RETRIES`; any other failure ends the attempt at once.
    /// Failures come back wrapped in `SessionDbError::ReconnectFailed` and are
    /// recorded as error diagnostics.
    pub(crate) async fn reconnect(&mut self, target: ConnTarget) -> Result<(), SessionDbError> {
        let schema = self.effective_schema().to_string();
        let mut tries = 0;
        loop {
            if let Err(err) = self.open_connection(target, &schema).await {
                return Err(SessionDbError::ReconnectFailed(Box::new(err)));
            }

            let err = match self.reselect(target, &schema).await {
                Ok(()) => {
                    tracing::info!(conn_id = self.connection_id, schema = %schema, "database reconnect");
                    return Ok(());
                }
                Err(err) => err,
            };

            tries += 1;
            tracing::error!(conn_id = self.connection_id, error = %err, "reselect failed");
            if !err.is_invalid_connection() || tries >= MAX_BAD_CONN_RETRIES {
                self.diagnostics.append_error(err.server_message());
                return Err(SessionDbError::ReconnectFailed(Box::new(err)));
            }
        }
    }

    async fn reselect(&mut self, target: ConnTarget, schema: &str) -> Result<(), SessionDbError> {
        let conn = self.slot_mut(target).get_mut().ok_or_else(|| {
            SessionDbError::ConnectionError("no connection to reselect on".to_string())
        })?;
        reselect_schema(conn, schema).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_statement_quotes_backticks() {
        assert_eq!(use_statement("orders"), "USE `orders`");
        assert_eq!(use_statement("we`ird"), "USE `we``ird`");
    }
}
