use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::backend::{Backend, BackendConnection};
use crate::config::ConnectionOptions;
use crate::error::SessionDbError;
use crate::results::RowCursor;
use crate::types::{ExecResult, RowValues};

/// Something a scripted connection did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEvent {
    Open { conn: u32, schema: String },
    OpenFailed { schema: String },
    Close { conn: u32 },
    Statement { conn: u32, sql: String },
    Ping { conn: u32 },
    StatementLogging { conn: u32, enabled: bool },
}

#[derive(Debug, Clone)]
struct ScriptedRows {
    columns: Arc<Vec<String>>,
    rows: Vec<Vec<RowValues>>,
    fetch_error: Option<SessionDbError>,
}

#[derive(Debug, Default)]
struct ScriptState {
    next_id: u32,
    open_failures: VecDeque<SessionDbError>,
    statement_failures: VecDeque<SessionDbError>,
    reselect_failures: VecDeque<SessionDbError>,
    rows: HashMap<String, ScriptedRows>,
    exec_results: HashMap<String, ExecResult>,
    read_failures: HashMap<(String, usize), SessionDbError>,
    events: Vec<ScriptEvent>,
    live: HashSet<u32>,
}

fn is_reselect(sql: &str) -> bool {
    sql.trim_start()
        .get(..4)
        .is_some_and(|head| head.eq_ignore_ascii_case("USE "))
}

/// Backend whose failures are queued up front and whose activity is recorded.
///
/// Failures are consumed in order by the next matching call: open failures by
/// `connect`, reselect failures by `USE` statements and pings, statement
/// failures by every other query or exec. Clones share one script, so a test
/// keeps a clone for assertions while the session owns the other.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_next_open(&self, err: SessionDbError) -> &Self {
        self.lock().open_failures.push_back(err);
        self
    }

    pub fn fail_next_statement(&self, err: SessionDbError) -> &Self {
        self.lock().statement_failures.push_back(err);
        self
    }

    pub fn fail_next_reselect(&self, err: SessionDbError) -> &Self {
        self.lock().reselect_failures.push_back(err);
        self
    }

    /// Rows returned whenever `sql` is queried.
    pub fn set_rows(&self, sql: &str, columns: &[&str], rows: Vec<Vec<RowValues>>) -> &Self {
        self.insert_rows(sql, columns, rows, None)
    }

    /// Rows followed by a fetch error part way through the result.
    pub fn set_rows_then_error(
        &self,
        sql: &str,
        columns: &[&str],
        rows: Vec<Vec<RowValues>>,
        err: SessionDbError,
    ) -> &Self {
        self.insert_rows(sql, columns, rows, Some(err))
    }

    fn insert_rows(
        &self,
        sql: &str,
        columns: &[&str],
        rows: Vec<Vec<RowValues>>,
        fetch_error: Option<SessionDbError>,
    ) -> &Self {
        let scripted = ScriptedRows {
            columns: Arc::new(columns.iter().map(|c| (*c).to_string()).collect()),
            rows,
            fetch_error,
        };
        self.lock().rows.insert(sql.to_string(), scripted);
        self
    }

    /// End the `read`-th query of `sql` (counting from 1) with a fetch error
    /// after its rows. Other reads of `sql` are unaffected.
    pub fn fail_fetch_on_read(&self, sql: &str, read: usize, err: SessionDbError) -> &Self {
        self.lock()
            .read_failures
            .insert((sql.to_string(), read), err);
        self
    }

    pub fn set_exec_result(&self, sql: &str, result: ExecResult) -> &Self {
        self.lock().exec_results.insert(sql.to_string(), result);
        self
    }

    #[must_use]
    pub fn events(&self) -> Vec<ScriptEvent> {
        self.lock().events.clone()
    }

    /// Every statement text issued, `USE` included, in order.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                ScriptEvent::Statement { sql, .. } => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn statement_count(&self, sql: &str) -> usize {
        self.statements().iter().filter(|s| *s == sql).count()
    }

    /// Schemas passed to every successful open, in order.
    #[must_use]
    pub fn opened_schemas(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|e| match e {
                ScriptEvent::Open { schema, .. } => Some(schema.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.opened_schemas().len()
    }

    #[must_use]
    pub fn ping_count(&self) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|e| matches!(e, ScriptEvent::Ping { .. }))
            .count()
    }

    /// Connections opened and not yet closed.
    #[must_use]
    pub fn live_connections(&self) -> usize {
        self.lock().live.len()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    type Conn = ScriptedConnection;

    async fn connect(
        &self,
        _options: &ConnectionOptions,
        schema: &str,
    ) -> Result<ScriptedConnection, SessionDbError> {
        let mut state = self.lock();
        if let Some(err) = state.open_failures.pop_front() {
            state.events.push(ScriptEvent::OpenFailed {
                schema: schema.to_string(),
            });
            return Err(err);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id);
        state.events.push(ScriptEvent::Open {
            conn: id,
            schema: schema.to_string(),
        });
        Ok(ScriptedConnection {
            id,
            backend: self.clone(),
        })
    }
}

#[derive(Debug)]
pub struct ScriptedConnection {
    id: u32,
    backend: ScriptedBackend,
}

impl ScriptedConnection {
    /// Record the statement and pop the failure queued for it, if any.
    fn issue(&self, sql: &str) -> Result<(), SessionDbError> {
        let mut state = self.backend.lock();
        state.events.push(ScriptEvent::Statement {
            conn: self.id,
            sql: sql.to_string(),
        });
        let queued = if is_reselect(sql) {
            state.reselect_failures.pop_front()
        } else {
            state.statement_failures.pop_front()
        };
        queued.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl BackendConnection for ScriptedConnection {
    async fn query(&mut self, sql: &str, _params: &[RowValues]) -> Result<RowCursor, SessionDbError> {
        self.issue(sql)?;
        let read = self.backend.statement_count(sql);
        let mut state = self.backend.lock();
        let read_failure = state.read_failures.remove(&(sql.to_string(), read));
        let cursor = match state.rows.get(sql).cloned() {
            Some(s) => {
                let cursor = RowCursor::new(s.columns, s.rows);
                match s.fetch_error {
                    Some(err) => cursor.with_trailing_error(err),
                    None => cursor,
                }
            }
            None => RowCursor::new(Arc::new(Vec::new()), Vec::new()),
        };
        Ok(match read_failure {
            Some(err) => cursor.with_trailing_error(err),
            None => cursor,
        })
    }

    async fn exec(&mut self, sql: &str) -> Result<ExecResult, SessionDbError> {
        self.issue(sql)?;
        Ok(self
            .backend
            .lock()
            .exec_results
            .get(sql)
            .copied()
            .unwrap_or_default())
    }

    async fn ping(&mut self) -> Result<(), SessionDbError> {
        let mut state = self.backend.lock();
        state.events.push(ScriptEvent::Ping { conn: self.id });
        state.reselect_failures.pop_front().map_or(Ok(()), Err)
    }

    fn set_statement_logging(&mut self, enabled: bool) {
        self.backend
            .lock()
            .events
            .push(ScriptEvent::StatementLogging {
                conn: self.id,
                enabled,
            });
    }

    async fn close(self) -> Result<(), SessionDbError> {
        let mut state = self.backend.lock();
        state.live.remove(&self.id);
        state.events.push(ScriptEvent::Close { conn: self.id });
        Ok(())
    }
}
