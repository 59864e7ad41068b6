//! Reassembly of multi-row JSON explain plans.
//!
//! `EXPLAIN FORMAT=JSON` on OceanBase returns the plan split across rows, one
//! JSON fragment per row. A regular scan only keeps the first row, so the
//! scan path re-reads the statement through a cursor and joins the fragments.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SessionDbError;
use crate::results::{CustomDbRow, ResultSet, RowCursor};
use crate::scan::ScanDest;

static VENDOR_PLAN_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bEXPLAIN\s+FORMAT\s*=\s*JSON\b").expect("plan marker pattern is valid")
});

/// Whether `sql` asks for the fragmented JSON plan.
#[must_use]
pub fn is_vendor_plan(sql: &str) -> bool {
    VENDOR_PLAN_MARKER.is_match(sql)
}

/// Concatenate the first column of every row, in cursor order, with no
/// separator.
///
/// # Errors
/// Returns the cursor's fetch error or a decode error; nothing is returned
/// for the rows read before it.
pub fn assemble_plan(cursor: RowCursor) -> Result<String, SessionDbError> {
    let mut plan = String::new();
    for row in cursor {
        plan.push_str(&fragment(&row?)?);
    }
    Ok(plan)
}

fn fragment(row: &CustomDbRow) -> Result<String, SessionDbError> {
    row.get_by_index(0)
        .and_then(|v| v.as_str_lossless())
        .map(str::to_string)
        .ok_or_else(|| SessionDbError::DecodeError("plan row is not text".to_string()))
}

/// Destination for an explain statement. After a JSON explain on the scan
/// path `query_plan` holds the whole plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    pub query_plan: String,
}

impl ScanDest for QueryPlan {
    fn scan_rows(&mut self, rows: ResultSet) -> Result<(), SessionDbError> {
        if let Some(row) = rows.results.first() {
            self.query_plan = fragment(row)?;
        }
        Ok(())
    }

    fn query_plan_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.query_plan)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::RowValues;

    fn cursor(fragments: &[&str]) -> RowCursor {
        RowCursor::new(
            Arc::new(vec!["Query Plan".to_string()]),
            fragments
                .iter()
                .map(|f| vec![RowValues::Text((*f).to_string())])
                .collect(),
        )
    }

    #[test]
    fn fragments_join_without_separator() {
        let plan = assemble_plan(cursor(&["{\"a\":1,", "\"b\":2}", ""])).unwrap();
        assert_eq!(plan, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn cursor_error_discards_partial_plan() {
        let broken = cursor(&["{\"a\":1,"])
            .with_trailing_error(SessionDbError::InvalidConnection("reset".into()));
        assert_eq!(
            assemble_plan(broken),
            Err(SessionDbError::InvalidConnection("reset".into()))
        );
    }

    #[test]
    fn marker_detection() {
        assert!(is_vendor_plan("EXPLAIN FORMAT=JSON SELECT * FROM t"));
        assert!(is_vendor_plan("explain  format = json select 1"));
        assert!(!is_vendor_plan("EXPLAIN SELECT * FROM t"));
        assert!(!is_vendor_plan("SELECT 'format=json'"));
    }
}
