use mysql_async::{DriverError, Error as MySqlError, ServerError};

use crate::error::SessionDbError;

/// Tag a driver error for the retry loop.
///
/// I/O failures and a closed or desynchronised connection mean the handle is
/// unusable; server errors keep their code and state.
#[must_use]
pub fn map_mysql_error(err: MySqlError) -> SessionDbError {
    match err {
        MySqlError::Server(ServerError {
            code,
            message,
            state,
        }) => SessionDbError::Server {
            code,
            state,
            message,
        },
        MySqlError::Io(e) => SessionDbError::InvalidConnection(e.to_string()),
        MySqlError::Driver(e @ (DriverError::ConnectionClosed | DriverError::PacketOutOfOrder)) => {
            SessionDbError::InvalidConnection(e.to_string())
        }
        MySqlError::Driver(e) => SessionDbError::ExecutionError(e.to_string()),
        MySqlError::Url(e) => SessionDbError::ConfigError(e.to_string()),
        #[allow(unreachable_patterns)]
        other => SessionDbError::Other(other.to_string()),
    }
}
