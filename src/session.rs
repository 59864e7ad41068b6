mod factory;
mod reconnect;
mod slot;

use std::fmt;

pub use reconnect::{reselect_schema, use_statement};
pub(crate) use slot::ConnectionSlot;

use crate::backend::Backend;
use crate::config::ConnectionOptions;
use crate::diagnostics::DiagnosticSink;
use crate::error::SessionDbError;

/// Which of the session's two connections a statement runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnTarget {
    /// Reads and writes.
    Primary,
    /// Schema-altering statements.
    Ddl,
}

/// One logical caller's view of the backend.
///
/// The session owns its primary and DDL connections outright. They are opened
/// on first use and only ever replaced by the connection factory, which closes
/// the previous handle before installing the new one. A session runs one
/// statement at a time; callers that share it across tasks must wrap it in
/// their own mutex.
pub struct Session<B: Backend> {
    pub(crate) backend: B,
    pub(crate) options: ConnectionOptions,
    pub(crate) connection_id: u64,
    pub(crate) db_name: String,
    pub(crate) primary: ConnectionSlot<B::Conn>,
    pub(crate) ddl: ConnectionSlot<B::Conn>,
    pub(crate) diagnostics: DiagnosticSink,
}

impl<B: Backend> fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("connection_id", &self.connection_id)
            .field("db_name", &self.db_name)
            .field("options", &self.options)
            .field("primary_open", &self.primary.is_open())
            .field("ddl_open", &self.ddl.is_open())
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Session<B> {
    /// Create a session. No connection is opened until the first statement.
    ///
    /// # Errors
    /// Returns `SessionDbError::ConfigError` if `options` are incomplete.
    pub fn new(
        backend: B,
        options: ConnectionOptions,
        connection_id: u64,
    ) -> Result<Self, SessionDbError> {
        options.validate()?;
        Ok(Self {
            backend,
            options,
            connection_id,
            db_name: String::new(),
            primary: ConnectionSlot::empty(),
            ddl: ConnectionSlot::empty(),
            diagnostics: DiagnosticSink::new(),
        })
    }

    #[must_use]
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// The schema this session has selected; empty when none is bound.
    #[must_use]
    pub fn bound_schema(&self) -> &str {
        &self.db_name
    }

    /// The schema a fresh connection should select: the bound one, else the
    /// configured default.
    #[must_use]
    pub fn effective_schema(&self) -> &str {
        if self.db_name.is_empty() {
            &self.options.default_schema
        } else {
            &self.db_name
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticSink {
        &mut self.diagnostics
    }

    #[must_use]
    pub fn has_connection(&self, target: ConnTarget) -> bool {
        self.slot(target).is_open()
    }

    /// Select `schema` and remember it, so every later reconnect restores it.
    ///
    /// The primary connection always switches. An open DDL connection switches
    /// too; a closed one picks the schema up when it is next opened.
    ///
    /// # Errors
    /// Returns the error of either `USE` statement after the usual retries.
    pub async fn use_schema(&mut self, schema: &str) -> Result<(), SessionDbError> {
        let statement = use_statement(schema);
        self.exec(&statement, true).await?;
        self.db_name = schema.to_string();
        if self.ddl.is_open() {
            self.ddl_exec(&statement, true).await?;
        }
        Ok(())
    }

    /// Close both connections. The session reopens them on the next statement.
    ///
    /// # Errors
    /// Returns the first close failure; both handles are released regardless.
    pub async fn close(&mut self) -> Result<(), SessionDbError> {
        let primary = self.primary.close().await;
        let ddl = self.ddl.close().await;
        primary.and(ddl)
    }

    pub(crate) fn slot(&self, target: ConnTarget) -> &ConnectionSlot<B::Conn> {
        match target {
            ConnTarget::Primary => &self.primary,
            ConnTarget::Ddl => &self.ddl,
        }
    }

    pub(crate) fn slot_mut(&mut self, target: ConnTarget) -> &mut ConnectionSlot<B::Conn> {
        match target {
            ConnTarget::Primary => &mut self.primary,
            ConnTarget::Ddl => &mut self.ddl,
        }
    }

    /// The live handle for `target`, opened on demand.
    pub(crate) async fn connection(
        &mut self,
        target: ConnTarget,
    ) -> Result<&mut B::Conn, SessionDbError> {
        if !self.slot(target).is_open() {
            let schema = self.effective_schema().to_string();
            self.open_connection(target, &schema).await?;
        }
        self.slot_mut(target).get_mut().ok_or_else(|| {
            SessionDbError::ConnectionError("connection slot empty after open".to_string())
        })
    }
}
