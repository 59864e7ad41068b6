use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::error::SessionDbError;
use crate::types::RowValues;

/// A row from a database query result
///
/// This struct represents a single row from a database query result,
/// with access to both the column names and the values.
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub rows: Vec<RowValues>,
    // Shared name -> index map so lookups skip string scans
    #[doc(hidden)]
    pub(crate) column_index_cache: Arc<HashMap<String, usize>>,
}

fn build_index(column_names: &[String]) -> Arc<HashMap<String, usize>> {
    Arc::new(
        column_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect(),
    )
}

impl CustomDbRow {
    /// Create a new database row
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names
    /// * `rows` - The values for this row
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        let cache = build_index(&column_names);
        Self {
            column_names,
            rows,
            column_index_cache: cache,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index_cache.get(column_name) {
            return Some(idx);
        }
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }
}

/// A result set from a database query
///
/// Holds the rows returned by the query and the column names they share.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            column_names: None,
            column_index: None,
        }
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(build_index(&column_names));
        self.column_names = Some(column_names);
    }

    /// Add a row to the result set. Ignored until column names are set.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let (Some(column_names), Some(index)) = (&self.column_names, &self.column_index) {
            self.results.push(CustomDbRow {
                column_names: column_names.clone(),
                rows: row_values,
                column_index_cache: index.clone(),
            });
        }
    }

    pub fn add_row(&mut self, row: CustomDbRow) {
        if self.column_names.is_none() {
            self.column_index = Some(row.column_index_cache.clone());
            self.column_names = Some(row.column_names.clone());
        }
        self.results.push(row);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Rows produced by a read statement, consumed in server order.
///
/// Backends fetch the rows before handing out the cursor. A fetch error that
/// happened part way through is kept and yielded after the rows that did
/// arrive, so consumers see the same sequence a streaming cursor would give.
#[derive(Debug, Default)]
pub struct RowCursor {
    column_names: Arc<Vec<String>>,
    rows: VecDeque<CustomDbRow>,
    trailing_error: Option<SessionDbError>,
}

impl RowCursor {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<Vec<RowValues>>) -> Self {
        let mut set = ResultSet::with_capacity(rows.len());
        set.set_column_names(column_names.clone());
        for values in rows {
            set.add_row_values(values);
        }
        Self {
            column_names,
            rows: set.results.into(),
            trailing_error: None,
        }
    }

    /// Attach the error that stopped the fetch.
    #[must_use]
    pub fn with_trailing_error(mut self, err: SessionDbError) -> Self {
        self.trailing_error = Some(err);
        self
    }

    #[must_use]
    pub fn column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    /// Drain the cursor into a `ResultSet`, failing if the fetch failed.
    ///
    /// # Errors
    /// Returns the fetch error; the rows read before it are discarded.
    pub fn into_result_set(self) -> Result<ResultSet, SessionDbError> {
        let mut set = ResultSet::with_capacity(self.rows.len());
        set.set_column_names(self.column_names.clone());
        for row in self {
            set.add_row(row?);
        }
        Ok(set)
    }
}

impl Iterator for RowCursor {
    type Item = Result<CustomDbRow, SessionDbError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.pop_front() {
            Some(row) => Some(Ok(row)),
            None => self.trailing_error.take().map(Err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Arc<Vec<String>> {
        Arc::new(cols.iter().map(|c| (*c).to_string()).collect())
    }

    #[test]
    fn rows_resolve_columns_by_name() {
        let mut set = ResultSet::with_capacity(1);
        set.set_column_names(names(&["id", "name"]));
        set.add_row_values(vec![RowValues::Int(7), RowValues::Text("ann".into())]);

        let row = &set.results[0];
        assert_eq!(row.get("name").and_then(RowValues::as_text), Some("ann"));
        assert_eq!(row.get_by_index(0), Some(&RowValues::Int(7)));
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn cursor_yields_rows_then_trailing_error() {
        let cursor = RowCursor::new(
            names(&["c"]),
            vec![vec![RowValues::Int(1)], vec![RowValues::Int(2)]],
        )
        .with_trailing_error(SessionDbError::InvalidConnection("eof".into()));

        let items: Vec<_> = cursor.collect();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[1].is_ok());
        assert!(matches!(items[2], Err(SessionDbError::InvalidConnection(_))));
    }

    #[test]
    fn into_result_set_is_all_or_nothing() {
        let ok = RowCursor::new(names(&["c"]), vec![vec![RowValues::Int(1)]]);
        assert_eq!(ok.into_result_set().map(|s| s.len()), Ok(1));

        let broken = RowCursor::new(names(&["c"]), vec![vec![RowValues::Int(1)]])
            .with_trailing_error(SessionDbError::Other("lost".into()));
        assert!(broken.into_result_set().is_err());
    }
}
