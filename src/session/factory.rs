use super::{ConnTarget, Session};
use crate::backend::{Backend, BackendConnection};
use crate::error::SessionDbError;

impl<B: Backend> Session<B> {
    /// Open a fresh handle on `schema` and install it in `target`'s slot.
    ///
    /// A failed open is logged and recorded as an error diagnostic; the
    /// existing handle stays in place and nothing is retried here. On success
    /// statement logging is switched off, the configured settle delay is
    /// waited out, and only then is the previous handle closed and replaced.
    pub(crate) async fn open_connection(
        &mut self,
        target: ConnTarget,
        schema: &str,
    ) -> Result<(), SessionDbError> {
        let mut conn = match self.backend.connect(&self.options, schema).await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::error!(conn_id = self.connection_id, error = %err, "open connection failed");
                self.diagnostics.append_error(err.to_string());
                return Err(err);
            }
        };

        conn.set_statement_logging(false);

        let settle = self.options.settle_delay();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        self.slot_mut(target).replace(conn).await;
        tracing::debug!(
            conn_id = self.connection_id,
            target = ?target,
            addr = %self.options.display_target(schema),
            "connection opened"
        );
        Ok(())
    }
}
