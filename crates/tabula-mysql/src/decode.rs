//! Generic row decoding.
//!
//! The core consumes rows as name→[`Value`] maps, so every MySQL result
//! column must be decoded through its reported type. Temporal values are
//! rendered in the same `YYYY-MM-DD HH:MM:SS` shape the layer writes.

use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo};
use tabula_core::{Record, Value};

/// Decodes one row into a [`Record`].
pub(crate) fn decode_row(row: &MySqlRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, index, column.type_info().name())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOLEAN" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            row.try_get::<Option<i64>, _>(index)?.map(Value::Int)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<Option<u64>, _>(index)?.map(Value::Uint),
        "FLOAT" | "DOUBLE" => row.try_get::<Option<f64>, _>(index)?.map(Value::Float),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)?
            .map(|d| Value::Text(d.format("%Y-%m-%d").to_string())),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)?
            .map(|t| Value::Text(t.format("%H:%M:%S").to_string())),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
            .map(|dt| Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)?
            .map(Value::Bytes),
        // CHAR/VARCHAR/TEXT/ENUM/SET/JSON/DECIMAL all read as text.
        _ => row.try_get::<Option<String>, _>(index)?.map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}
