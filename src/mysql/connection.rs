use std::fmt;

use async_trait::async_trait;
use mysql_async::Conn;
use mysql_async::prelude::Queryable;

use super::config::build_opts;
use super::error::map_mysql_error;
use super::params::Params;
use super::query::fetch_cursor;
use crate::backend::{Backend, BackendConnection};
use crate::config::ConnectionOptions;
use crate::error::SessionDbError;
use crate::results::RowCursor;
use crate::types::{ExecResult, RowValues};

/// Opens single, unpooled `mysql_async` connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlBackend;

#[async_trait]
impl Backend for MySqlBackend {
    type Conn = MySqlConnection;

    async fn connect(
        &self,
        options: &ConnectionOptions,
        schema: &str,
    ) -> Result<MySqlConnection, SessionDbError> {
        let conn = Conn::new(build_opts(options, schema))
            .await
            .map_err(map_mysql_error)?;
        Ok(MySqlConnection {
            conn,
            log_statements: true,
        })
    }
}

pub struct MySqlConnection {
    conn: Conn,
    log_statements: bool,
}

// Manual Debug implementation because `Conn` is large and noisy
impl fmt::Debug for MySqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlConnection")
            .field("id", &self.conn.id())
            .field("log_statements", &self.log_statements)
            .finish()
    }
}

impl MySqlConnection {
    fn trace(&self, sql: &str) {
        if self.log_statements {
            tracing::trace!(thread_id = self.conn.id(), sql, "statement");
        }
    }
}

#[async_trait]
impl BackendConnection for MySqlConnection {
    async fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<RowCursor, SessionDbError> {
        self.trace(sql);
        let params = Params::convert(params);
        if params.is_empty() {
            let result = self.conn.query_iter(sql).await.map_err(map_mysql_error)?;
            Ok(fetch_cursor(result).await)
        } else {
            let result = self
                .conn
                .exec_iter(sql, params.into_driver())
                .await
                .map_err(map_mysql_error)?;
            Ok(fetch_cursor(result).await)
        }
    }

    async fn exec(&mut self, sql: &str) -> Result<ExecResult, SessionDbError> {
        self.trace(sql);
        self.conn.query_drop(sql).await.map_err(map_mysql_error)?;
        Ok(ExecResult::new(
            self.conn.affected_rows(),
            self.conn.last_insert_id(),
        ))
    }

    async fn ping(&mut self) -> Result<(), SessionDbError> {
        self.conn.ping().await.map_err(map_mysql_error)
    }

    fn set_statement_logging(&mut self, enabled: bool) {
        self.log_statements = enabled;
    }

    async fn close(self) -> Result<(), SessionDbError> {
        self.conn.disconnect().await.map_err(map_mysql_error)
    }
}
