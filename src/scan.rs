use crate::error::SessionDbError;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Decode one row into a record.
pub trait FromRow: Sized {
    /// # Errors
    /// Returns `SessionDbError::DecodeError` when a column is missing or has
    /// the wrong shape.
    fn from_row(row: &CustomDbRow) -> Result<Self, SessionDbError>;
}

/// Something a scan statement can write its result into.
pub trait ScanDest: Send {
    /// Populate `self` from the rows of a successful statement.
    ///
    /// # Errors
    /// Returns the first decode failure.
    fn scan_rows(&mut self, rows: ResultSet) -> Result<(), SessionDbError>;

    /// Field that receives a reassembled vendor explain plan. Destinations
    /// without one never trigger reassembly.
    fn query_plan_mut(&mut self) -> Option<&mut String> {
        None
    }
}

/// First row, or `None` when the statement returned nothing.
impl<T: FromRow + Send> ScanDest for Option<T> {
    fn scan_rows(&mut self, rows: ResultSet) -> Result<(), SessionDbError> {
        *self = rows.results.first().map(T::from_row).transpose()?;
        Ok(())
    }
}

/// Every row, replacing whatever the vector held.
impl<T: FromRow + Send> ScanDest for Vec<T> {
    fn scan_rows(&mut self, rows: ResultSet) -> Result<(), SessionDbError> {
        *self = rows
            .results
            .iter()
            .map(T::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }
}

fn first_column(row: &CustomDbRow) -> Result<&RowValues, SessionDbError> {
    row.get_by_index(0)
        .ok_or_else(|| SessionDbError::DecodeError("row has no columns".to_string()))
}

impl FromRow for String {
    fn from_row(row: &CustomDbRow) -> Result<Self, SessionDbError> {
        match first_column(row)? {
            RowValues::Null => Err(SessionDbError::DecodeError(
                "NULL in string column".to_string(),
            )),
            RowValues::Int(i) => Ok(i.to_string()),
            RowValues::Float(f) => Ok(f.to_string()),
            value => value.as_str_lossless().map(str::to_string).ok_or_else(|| {
                SessionDbError::DecodeError(format!("expected text, got {value:?}"))
            }),
        }
    }
}

impl FromRow for i64 {
    fn from_row(row: &CustomDbRow) -> Result<Self, SessionDbError> {
        match first_column(row)? {
            RowValues::Int(i) => Ok(*i),
            RowValues::Text(s) => s
                .parse()
                .map_err(|e| SessionDbError::DecodeError(format!("'{s}' is not an integer: {e}"))),
            value => Err(SessionDbError::DecodeError(format!(
                "expected integer, got {value:?}"
            ))),
        }
    }
}
