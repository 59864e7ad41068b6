use std::sync::Arc;

use chrono::NaiveDate;
use mysql_async::consts::ColumnType;
use mysql_async::prelude::Protocol;
use mysql_async::{QueryResult, Row as MySqlRow, Value};

use super::error::map_mysql_error;
use crate::results::RowCursor;
use crate::types::RowValues;

/// Fetch every row of the current result set into a cursor.
///
/// A fetch failure stops reading; the rows already fetched stay in the cursor
/// ahead of the error.
pub async fn fetch_cursor<'a, 't: 'a, P: Protocol>(
    mut result: QueryResult<'a, 't, P>,
) -> RowCursor {
    let columns = result.columns();
    let column_names: Arc<Vec<String>> = Arc::new(
        columns
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|c| c.name_str().into_owned())
            .collect(),
    );
    let column_types: Vec<ColumnType> = columns
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|c| c.column_type())
        .collect();

    let mut rows = Vec::new();
    let trailing = loop {
        match result.next().await {
            Ok(Some(row)) => rows.push(convert_row(row, &column_types)),
            Ok(None) => break None,
            Err(err) => break Some(map_mysql_error(err)),
        }
    };

    let cursor = RowCursor::new(column_names, rows);
    match trailing {
        Some(err) => cursor.with_trailing_error(err),
        None => cursor,
    }
}

fn convert_row(mut row: MySqlRow, column_types: &[ColumnType]) -> Vec<RowValues> {
    (0..row.len())
        .map(|idx| {
            let value = row.take(idx).unwrap_or(Value::NULL);
            let col_type = column_types
                .get(idx)
                .copied()
                .unwrap_or(ColumnType::MYSQL_TYPE_STRING);
            mysql_value_to_row_value(value, col_type)
        })
        .collect()
}

/// Convert a driver value, using the column type to interpret the byte
/// strings the text protocol returns for every column.
#[must_use]
pub fn mysql_value_to_row_value(value: Value, col_type: ColumnType) -> RowValues {
    match value {
        Value::NULL => RowValues::Null,
        Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => match col_type {
                ColumnType::MYSQL_TYPE_TINY
                | ColumnType::MYSQL_TYPE_SHORT
                | ColumnType::MYSQL_TYPE_LONG
                | ColumnType::MYSQL_TYPE_LONGLONG
                | ColumnType::MYSQL_TYPE_INT24
                | ColumnType::MYSQL_TYPE_YEAR => {
                    s.parse().map_or(RowValues::Text(s), RowValues::Int)
                }
                ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
                    s.parse().map_or(RowValues::Text(s), RowValues::Float)
                }
                _ => RowValues::Text(s),
            },
            Err(e) => RowValues::Blob(e.into_bytes()),
        },
        Value::Int(i) => RowValues::Int(i),
        Value::UInt(u) => i64::try_from(u).map_or_else(|_| RowValues::Text(u.to_string()), RowValues::Int),
        Value::Float(f) => RowValues::Float(f64::from(f)),
        Value::Double(d) => RowValues::Float(d),
        Value::Date(year, month, day, hour, min, sec, micro) => {
            NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .and_then(|d| {
                    d.and_hms_micro_opt(u32::from(hour), u32::from(min), u32::from(sec), micro)
                })
                .map_or_else(
                    || {
                        RowValues::Text(format!(
                            "{year:04}-{month:02}-{day:02} {hour:02}:{min:02}:{sec:02}"
                        ))
                    },
                    RowValues::Timestamp,
                )
        }
        Value::Time(negative, days, hours, mins, secs, micros) => {
            let sign = if negative { "-" } else { "" };
            let total_hours = days * 24 + u32::from(hours);
            RowValues::Text(format!(
                "{sign}{total_hours:02}:{mins:02}:{secs:02}.{micros:06}"
            ))
        }
    }
}
