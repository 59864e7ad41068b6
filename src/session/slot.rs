use crate::backend::BackendConnection;
use crate::error::SessionDbError;

/// Exclusive holder of one physical connection.
///
/// The only way to put a handle in is `replace`, which closes the current
/// one first, so at most one handle per slot is ever live.
pub(crate) struct ConnectionSlot<C> {
    conn: Option<C>,
}

impl<C: BackendConnection> ConnectionSlot<C> {
    pub(crate) fn empty() -> Self {
        Self { conn: None }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut C> {
        self.conn.as_mut()
    }

    /// Close the held handle, if any, then install `next`.
    pub(crate) async fn replace(&mut self, next: C) {
        if let Some(prev) = self.conn.take() {
            if let Err(err) = prev.close().await {
                tracing::warn!(error = %err, "closing superseded connection failed");
            }
        }
        self.conn = Some(next);
    }

    /// Close and release the held handle.
    pub(crate) async fn close(&mut self) -> Result<(), SessionDbError> {
        match self.conn.take() {
            Some(conn) => conn.close().await,
            None => Ok(()),
        }
    }
}
