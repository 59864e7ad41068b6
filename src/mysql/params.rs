use chrono::{Datelike, Timelike};
use mysql_async::Value;

use crate::types::RowValues;

/// Positional parameters in the driver's value type.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: Vec<Value>,
}

impl Params {
    /// Convert from a slice of `RowValues`
    #[must_use]
    pub fn convert(params: &[RowValues]) -> Self {
        Self {
            values: params.iter().map(to_mysql_value).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn into_driver(self) -> mysql_async::Params {
        if self.values.is_empty() {
            mysql_async::Params::Empty
        } else {
            mysql_async::Params::Positional(self.values)
        }
    }
}

fn to_mysql_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Int(*i),
        RowValues::Float(f) => Value::Double(*f),
        RowValues::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
        RowValues::Bool(b) => Value::Int(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Date(
            u16::try_from(dt.year()).unwrap_or(0),
            u8::try_from(dt.month()).unwrap_or(0),
            u8::try_from(dt.day()).unwrap_or(0),
            u8::try_from(dt.hour()).unwrap_or(0),
            u8::try_from(dt.minute()).unwrap_or(0),
            u8::try_from(dt.second()).unwrap_or(0),
            dt.nanosecond() / 1_000,
        ),
        RowValues::Null => Value::NULL,
        RowValues::JSON(json) => Value::Bytes(json.to_string().into_bytes()),
        RowValues::Blob(bytes) => Value::Bytes(bytes.clone()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn converts_each_variant() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .and_then(|d| d.and_hms_micro_opt(13, 5, 9, 250))
            .unwrap();
        let params = Params::convert(&[
            RowValues::Int(-3),
            RowValues::Bool(true),
            RowValues::Text("x".into()),
            RowValues::Timestamp(ts),
            RowValues::Null,
        ]);

        let mysql_async::Params::Positional(values) = params.into_driver() else {
            panic!("expected positional params");
        };
        assert_eq!(values[0], Value::Int(-3));
        assert_eq!(values[1], Value::Int(1));
        assert_eq!(values[2], Value::Bytes(b"x".to_vec()));
        assert_eq!(values[3], Value::Date(2024, 2, 29, 13, 5, 9, 250));
        assert_eq!(values[4], Value::NULL);
    }

    #[test]
    fn no_params_is_empty() {
        assert!(matches!(
            Params::convert(&[]).into_driver(),
            mysql_async::Params::Empty
        ));
    }
}
