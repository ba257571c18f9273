//! MySQL backend.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use serde_json::{Map, Number, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::types::Json;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use super::{LegacySource, LegacyTable};
use crate::config::MySqlSourceConfig;
use crate::error::{MigrateError, ReadError};
use crate::record::LegacyRecord;

/// Legacy relational database.
///
/// Every table is read with `SELECT *`; columns become JSON values based on
/// their declared type so the transformers see the same shapes as from a
/// JSON export. A cell that cannot be decoded (zero dates, out of range
/// times) is read as null, which the transformers already treat as absent.
#[derive(Debug, Clone)]
pub struct MySqlSource {
    pool: MySqlPool,
    description: String,
}

impl MySqlSource {
    pub async fn connect(config: &MySqlSourceConfig) -> Result<Self, MigrateError> {
        let description = format!(
            "mysql://{}@{}:{}/{}",
            config.user, config.host, config.port, config.database
        );
        info!("Connecting to legacy database: {}", description);

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        // Reads are strictly sequential
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| MigrateError::source_unavailable(description.clone(), e))?;

        debug!("Legacy database connection established");

        Ok(Self { pool, description })
    }
}

#[async_trait]
impl LegacySource for MySqlSource {
    fn describe(&self) -> String {
        self.description.clone()
    }

    async fn read_table(&self, table: LegacyTable) -> Result<Vec<LegacyRecord>, ReadError> {
        let sql = format!("SELECT * FROM `{}`", table.table_name());
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|cause| ReadError::Query {
                table: table.table_name(),
                cause,
            })?;

        let mut undecodable = 0;
        let records: Vec<_> = rows
            .iter()
            .map(|row| row_to_record(row, table, &mut undecodable))
            .collect();

        if undecodable > 0 {
            warn!(%table, cells = undecodable, "Undecodable values read as null");
        }
        debug!("Read {} rows from {}", records.len(), table);
        Ok(records)
    }
}

/// How a column is turned into JSON, chosen from its declared type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Bool,
    Signed,
    Unsigned,
    Float,
    Double,
    Decimal,
    DateTime,
    Date,
    Time,
    Json,
    Text,
}

impl ColumnKind {
    fn from_type_name(name: &str) -> Self {
        match name {
            "BOOLEAN" => Self::Bool,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Self::Signed,
            "YEAR" => Self::Unsigned,
            name if name.ends_with("UNSIGNED") => Self::Unsigned,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DECIMAL" => Self::Decimal,
            "DATETIME" | "TIMESTAMP" => Self::DateTime,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "JSON" => Self::Json,
            _ => Self::Text,
        }
    }
}

fn row_to_record(row: &MySqlRow, table: LegacyTable, undecodable: &mut usize) -> LegacyRecord {
    let mut fields = Map::with_capacity(row.columns().len());
    for column in row.columns() {
        let kind = ColumnKind::from_type_name(column.type_info().name());
        let decoded = column_value(row, column.ordinal(), kind);
        if decoded.is_err() {
            *undecodable += 1;
        }
        fields.insert(column.name().to_string(), or_null(decoded, table, column.name()));
    }
    LegacyRecord::new(fields)
}

/// A cell that failed to decode becomes null instead of failing the table.
fn or_null(decoded: Result<Value, sqlx::Error>, table: LegacyTable, column: &str) -> Value {
    decoded.unwrap_or_else(|e| {
        debug!(%table, column, error = %e, "Reading undecodable value as null");
        Value::Null
    })
}

fn column_value(row: &MySqlRow, idx: usize, kind: ColumnKind) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match kind {
        ColumnKind::Bool => Value::Bool(row.try_get::<bool, _>(idx)?),
        ColumnKind::Signed => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
        ColumnKind::Unsigned => Value::from(row.try_get_unchecked::<u64, _>(idx)?),
        ColumnKind::Float => float(f64::from(row.try_get::<f32, _>(idx)?)),
        ColumnKind::Double => float(row.try_get::<f64, _>(idx)?),
        // Sent as text; parsed so prices arrive as numbers
        ColumnKind::Decimal => decimal(row.try_get_unchecked::<String, _>(idx)?),
        ColumnKind::DateTime => {
            let naive = row.try_get_unchecked::<NaiveDateTime, _>(idx)?;
            Value::String(naive.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        ColumnKind::Date => Value::String(row.try_get_unchecked::<NaiveDate, _>(idx)?.to_string()),
        ColumnKind::Time => Value::String(row.try_get_unchecked::<NaiveTime, _>(idx)?.to_string()),
        ColumnKind::Json => row.try_get::<Json<Value>, _>(idx)?.0,
        ColumnKind::Text => match row.try_get_unchecked::<String, _>(idx) {
            Ok(text) => Value::String(text),
            Err(_) => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
        },
    };
    Ok(value)
}

fn decimal(text: String) -> Value {
    match text.trim().parse::<f64>() {
        Ok(parsed) => float(parsed),
        Err(_) => Value::String(text),
    }
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_column_kind_from_type_name() {
        assert_eq!(ColumnKind::from_type_name("BOOLEAN"), ColumnKind::Bool);
        assert_eq!(ColumnKind::from_type_name("BIGINT"), ColumnKind::Signed);
        assert_eq!(ColumnKind::from_type_name("INT UNSIGNED"), ColumnKind::Unsigned);
        assert_eq!(ColumnKind::from_type_name("TINYINT UNSIGNED"), ColumnKind::Unsigned);
        assert_eq!(ColumnKind::from_type_name("YEAR"), ColumnKind::Unsigned);
        assert_eq!(ColumnKind::from_type_name("DECIMAL"), ColumnKind::Decimal);
        assert_eq!(ColumnKind::from_type_name("TIMESTAMP"), ColumnKind::DateTime);
        assert_eq!(ColumnKind::from_type_name("DATE"), ColumnKind::Date);
        assert_eq!(ColumnKind::from_type_name("TIME"), ColumnKind::Time);
        assert_eq!(ColumnKind::from_type_name("JSON"), ColumnKind::Json);
        assert_eq!(ColumnKind::from_type_name("VARCHAR"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_type_name("BLOB"), ColumnKind::Text);
    }

    #[test]
    fn test_decimal() {
        assert_eq!(decimal("19.90".to_string()), json!(19.9));
        assert_eq!(decimal(" 5 ".to_string()), json!(5.0));
        assert_eq!(decimal("n/a".to_string()), json!("n/a"));
    }

    #[test]
    fn test_undecodable_value_reads_as_null() {
        // What sqlx reports for a `0000-00-00 00:00:00` DATETIME
        let zero_date = Err(sqlx::Error::Decode(Box::new(sqlx::error::UnexpectedNullError)));
        assert_eq!(or_null(zero_date, LegacyTable::Users, "created_at"), Value::Null);

        let decoded = Ok(json!("2023-01-02T00:00:00.000Z"));
        assert_eq!(
            or_null(decoded, LegacyTable::Users, "created_at"),
            json!("2023-01-02T00:00:00.000Z")
        );
    }
}
