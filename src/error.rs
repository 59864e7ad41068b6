use thiserror::Error;

/// Server error code for "No database selected".
pub const ER_NO_DB_ERROR: u16 = 1046;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionDbError {
    /// The physical connection can no longer be used and has to be replaced.
    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    /// An error reported by the server on an otherwise healthy connection.
    #[error("Error {code} ({state}): {message}")]
    Server {
        code: u16,
        state: String,
        message: String,
    },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The reconnect protocol itself failed; no further attempts are made.
    #[error("reconnect failed: {0}")]
    ReconnectFailed(Box<SessionDbError>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SessionDbError {
    #[must_use]
    pub fn is_invalid_connection(&self) -> bool {
        matches!(self, Self::InvalidConnection(_))
    }

    /// Numeric server code, if the server reported one.
    #[must_use]
    pub fn server_code(&self) -> Option<u16> {
        match self {
            Self::Server { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The message as the server phrased it, without code or state.
    ///
    /// Other variants fall back to their display form.
    #[must_use]
    pub fn server_message(&self) -> String {
        match self {
            Self::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// How the retry loop treats a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Rebuild the connection, restore the schema, and retry.
    ConnectionInvalidated,
    /// A long idle period dropped the schema context without closing the
    /// connection. Only raised when the caller enabled that branch.
    SchemaLost,
    /// Anything else. Returned to the caller unchanged.
    Logical,
}

/// Session facts the classifier needs beyond the error itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyContext {
    /// The statement path handles schema loss (primary `exec` only).
    pub schema_lost_branch: bool,
    /// Server-side `wait_timeout` in seconds.
    pub wait_timeout: u64,
    /// A non-empty schema is currently bound.
    pub schema_bound: bool,
}

/// Idle timeouts below this never trigger the schema-lost branch.
pub const SCHEMA_LOST_MIN_WAIT_TIMEOUT: u64 = 600;

#[must_use]
pub fn classify(err: &SessionDbError, ctx: ClassifyContext) -> FailureClass {
    match err {
        SessionDbError::InvalidConnection(_) => FailureClass::ConnectionInvalidated,
        SessionDbError::Server { code, .. }
            if ctx.schema_lost_branch
                && ctx.wait_timeout >= SCHEMA_LOST_MIN_WAIT_TIMEOUT
                && ctx.schema_bound
                && *code == ER_NO_DB_ERROR =>
        {
            FailureClass::SchemaLost
        }
        _ => FailureClass::Logical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_db() -> SessionDbError {
        SessionDbError::Server {
            code: ER_NO_DB_ERROR,
            state: "3D000".into(),
            message: "No database selected".into(),
        }
    }

    fn armed() -> ClassifyContext {
        ClassifyContext {
            schema_lost_branch: true,
            wait_timeout: 600,
            schema_bound: true,
        }
    }

    #[test]
    fn invalid_connection_always_reconnects() {
        let err = SessionDbError::InvalidConnection("broken pipe".into());
        assert_eq!(
            classify(&err, ClassifyContext::default()),
            FailureClass::ConnectionInvalidated
        );
        assert_eq!(classify(&err, armed()), FailureClass::ConnectionInvalidated);
    }

    #[test]
    fn schema_lost_needs_every_condition() {
        assert_eq!(classify(&no_db(), armed()), FailureClass::SchemaLost);

        let short_timeout = ClassifyContext {
            wait_timeout: 599,
            ..armed()
        };
        assert_eq!(classify(&no_db(), short_timeout), FailureClass::Logical);

        let unbound = ClassifyContext {
            schema_bound: false,
            ..armed()
        };
        assert_eq!(classify(&no_db(), unbound), FailureClass::Logical);

        let disabled = ClassifyContext {
            schema_lost_branch: false,
            ..armed()
        };
        assert_eq!(classify(&no_db(), disabled), FailureClass::Logical);
    }

    #[test]
    fn other_server_codes_are_logical() {
        let dup = SessionDbError::Server {
            code: 1062,
            state: "23000".into(),
            message: "Duplicate entry '1' for key 'PRIMARY'".into(),
        };
        assert_eq!(classify(&dup, armed()), FailureClass::Logical);
        assert_eq!(dup.server_code(), Some(1062));
        assert_eq!(dup.server_message(), "Duplicate entry '1' for key 'PRIMARY'");
    }
}
