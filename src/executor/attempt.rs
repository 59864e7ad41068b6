use async_trait::async_trait;

use crate::backend::BackendConnection;
use crate::error::SessionDbError;
use crate::plan::{assemble_plan, is_vendor_plan};
use crate::results::RowCursor;
use crate::scan::ScanDest;
use crate::types::{ExecResult, RowValues};

/// One issue of a statement on a connection. The retry loop calls `run` once
/// per attempt, always on the session's current handle.
#[async_trait]
pub(crate) trait Attempt<C: BackendConnection>: Send {
    type Output: Send;

    fn sql(&self) -> &str;

    async fn run(&mut self, conn: &mut C) -> Result<Self::Output, SessionDbError>;
}

pub(crate) struct QueryAttempt<'a> {
    pub(crate) sql: &'a str,
}

#[async_trait]
impl<'a, C: BackendConnection> Attempt<C> for QueryAttempt<'a> {
    type Output = RowCursor;

    fn sql(&self) -> &str {
        self.sql
    }

    async fn run(&mut self, conn: &mut C) -> Result<RowCursor, SessionDbError> {
        conn.query(self.sql, &[]).await
    }
}

pub(crate) struct ExecAttempt<'a> {
    pub(crate) sql: &'a str,
}

#[async_trait]
impl<'a, C: BackendConnection> Attempt<C> for ExecAttempt<'a> {
    type Output = ExecResult;

    fn sql(&self) -> &str {
        self.sql
    }

    async fn run(&mut self, conn: &mut C) -> Result<ExecResult, SessionDbError> {
        conn.exec(self.sql).await
    }
}

pub(crate) struct ScanAttempt<'a, D> {
    pub(crate) sql: &'a str,
    pub(crate) params: &'a [RowValues],
    pub(crate) dest: &'a mut D,
}

#[async_trait]
impl<'a, C: BackendConnection, D: ScanDest> Attempt<C> for ScanAttempt<'a, D> {
    type Output = ();

    fn sql(&self) -> &str {
        self.sql
    }

    async fn run(&mut self, conn: &mut C) -> Result<(), SessionDbError> {
        let rows = conn.query(self.sql, self.params).await?.into_result_set()?;
        self.dest.scan_rows(rows)?;

        if is_vendor_plan(self.sql) && self.dest.query_plan_mut().is_some() {
            let plan = conn
                .query(self.sql, self.params)
                .await
                .and_then(assemble_plan);
            if let Some(slot) = self.dest.query_plan_mut() {
                // a failed re-read must not leave the first fragment behind
                match plan {
                    Ok(plan) => *slot = plan,
                    Err(err) => {
                        slot.clear();
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }
}
