//! Database access for sqlpilot.
//!
//! A deliberately small client: one connection, parameterized execution,
//! and information-schema introspection for a single table. The query
//! endpoint never touches the database; this exists for the `introspect`
//! command and for operators poking at table structure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgConnection, PgRow};
use sqlx::{Arguments, Column, Connection, Row, TypeInfo};

pub mod config;
pub mod error;

pub use config::{AVAILABLE_DRIVERS, Driver, connection_string};
pub use error::DbError;
use sqlpilot_core::config::DatabaseConfig;

/// One row of the information-schema column listing, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    #[serde(rename = "column_name")]
    pub name: String,
    pub data_type: String,
    /// "YES" or "NO", as reported by information_schema.
    pub is_nullable: String,
}

/// Result of [`DbClient::execute_query`].
#[derive(Debug)]
pub enum QueryOutcome {
    /// Fetched rows, one JSON object per row keyed by column name.
    Rows(Vec<Map<String, Value>>),
    /// Affected-row count of a committed write.
    Affected(u64),
}

const COLUMNS_QUERY: &str = r#"
select column_name, data_type, is_nullable
from information_schema.columns
where table_name = $1
order by ordinal_position
"#;

/// Database client owning at most one live connection.
///
/// State machine: Disconnected -> connect -> Connected -> disconnect ->
/// Disconnected. Query methods require the Connected state.
pub struct DbClient {
    config: DatabaseConfig,
    default_table: Option<String>,
    conn: Option<PgConnection>,
}

impl DbClient {
    /// `default_table` is the table name from the prompt context, used when
    /// [`DbClient::get_table_schema`] is called without an explicit table.
    pub fn new(config: DatabaseConfig, default_table: Option<String>) -> Self {
        Self {
            config,
            default_table,
            conn: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Resolve the driver, build the connection string and open the
    /// connection.
    pub async fn connect(&mut self) -> Result<(), DbError> {
        let driver = Driver::resolve(self.config.driver.as_deref())?;
        let url = connection_string(&self.config, driver)?;
        let conn = PgConnection::connect(&url).await.map_err(DbError::Connect)?;
        tracing::info!(
            driver = driver.name(),
            host = %self.config.host,
            database = %self.config.database,
            "database connection opened"
        );
        self.conn = Some(conn);
        Ok(())
    }

    /// Close the connection if one is open. Close-time errors are logged,
    /// never propagated.
    pub async fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(err) = conn.close().await {
                tracing::warn!(%err, "error while closing database connection");
            }
        }
    }

    /// Execute a parameterized query. `fetch` selects between reading all
    /// result rows and committing a write.
    pub async fn execute_query(
        &mut self,
        query: &str,
        params: &[Value],
        fetch: bool,
    ) -> Result<QueryOutcome, DbError> {
        if fetch {
            self.fetch_all(query, params).await.map(QueryOutcome::Rows)
        } else {
            self.execute(query, params).await.map(QueryOutcome::Affected)
        }
    }

    /// Read path: fetch all rows, zipped with column names into JSON
    /// objects. Reads run outside an explicit transaction, so a failed
    /// fetch has nothing to roll back.
    pub async fn fetch_all(
        &mut self,
        query: &str,
        params: &[Value],
    ) -> Result<Vec<Map<String, Value>>, DbError> {
        let conn = self.conn.as_mut().ok_or(DbError::NotConnected)?;
        let args = bind_params(params)?;
        let rows = sqlx::query_with(query, args)
            .fetch_all(&mut *conn)
            .await
            .map_err(DbError::QueryExecution)?;
        Ok(rows.iter().map(row_to_object).collect())
    }

    /// Write path: runs inside a transaction; commits on success, rolls
    /// back on failure and returns the wrapped execution error.
    pub async fn execute(&mut self, query: &str, params: &[Value]) -> Result<u64, DbError> {
        let conn = self.conn.as_mut().ok_or(DbError::NotConnected)?;
        let args = bind_params(params)?;
        let mut tx = conn.begin().await.map_err(DbError::QueryExecution)?;
        match sqlx::query_with(query, args).execute(&mut *tx).await {
            Ok(done) => {
                tx.commit().await.map_err(DbError::QueryExecution)?;
                Ok(done.rows_affected())
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(%rollback_err, "rollback failed after query error");
                }
                Err(DbError::QueryExecution(err))
            }
        }
    }

    /// Column listing for `table`, or for the configured default table when
    /// `table` is `None`.
    pub async fn get_table_schema(
        &mut self,
        table: Option<&str>,
    ) -> Result<Vec<ColumnInfo>, DbError> {
        let table = table
            .map(str::to_string)
            .or_else(|| self.default_table.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                DbError::Validation("no table name provided and none configured".to_string())
            })?;

        let rows = self
            .fetch_all(COLUMNS_QUERY, &[Value::String(table)])
            .await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(DbError::Decode))
            .collect()
    }
}

/// Bind JSON parameter values the way the wire expects them: null as a
/// typed NULL, numbers split into integer/float, everything structured as
/// a jsonb argument.
fn bind_params(params: &[Value]) -> Result<PgArguments, DbError> {
    let mut args = PgArguments::default();
    for value in params {
        let added = match value {
            Value::Null => args.add(Option::<String>::None),
            Value::Bool(b) => args.add(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => args.add(i),
                None => match n.as_f64() {
                    Some(f) => args.add(f),
                    None => {
                        return Err(DbError::Validation(format!(
                            "unrepresentable numeric parameter: {n}"
                        )));
                    }
                },
            },
            Value::String(s) => args.add(s.clone()),
            other => args.add(sqlx::types::Json(other.clone())),
        };
        added.map_err(|e| DbError::Validation(format!("cannot bind parameter: {e}")))?;
    }
    Ok(args)
}

fn row_to_object(row: &PgRow) -> Map<String, Value> {
    let mut out = Map::new();
    for col in row.columns() {
        out.insert(col.name().to_string(), decode_column(row, col.ordinal(), col.type_info().name()));
    }
    out
}

fn opt<T: Into<Value>>(v: Option<T>) -> Value {
    v.map(Into::into).unwrap_or(Value::Null)
}

/// Decode a single column into JSON by its Postgres type name. Types with
/// no JSON mapping fall back to their text form, then to null.
fn decode_column(row: &PgRow, idx: usize, ty: &str) -> Value {
    let decoded = match ty {
        "BOOL" => row.try_get::<Option<bool>, _>(idx).map(opt),
        "INT2" => row.try_get::<Option<i16>, _>(idx).map(opt),
        "INT4" => row.try_get::<Option<i32>, _>(idx).map(opt),
        "INT8" => row.try_get::<Option<i64>, _>(idx).map(opt),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx).map(opt),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx).map(opt),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(idx)
            .map(|v| opt(v.map(|u| u.to_string()))),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(idx)
            .map(|v| v.unwrap_or(Value::Null)),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
            .map(|v| opt(v.map(|t| t.to_rfc3339()))),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .map(|v| opt(v.map(|t| t.to_string()))),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .map(|v| opt(v.map(|d| d.to_string()))),
        _ => row.try_get::<Option<String>, _>(idx).map(opt),
    };
    decoded.unwrap_or_else(|err| {
        tracing::debug!(ordinal = idx, pg_type = ty, %err, "column not decodable, emitting null");
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> DbClient {
        DbClient::new(DatabaseConfig::default(), None)
    }

    #[tokio::test]
    async fn execute_query_requires_connection() {
        let mut db = client();
        let err = db.execute_query("select 1", &[], true).await.unwrap_err();
        assert!(matches!(err, DbError::NotConnected));

        let err = db
            .execute_query("delete from t", &[], false)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotConnected));
    }

    #[tokio::test]
    async fn get_table_schema_requires_some_table_name() {
        let mut db = client();
        let err = db.get_table_schema(None).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn get_table_schema_uses_default_table_when_unset() {
        // With a default table configured the call proceeds past name
        // resolution and fails on the missing connection instead.
        let mut db = DbClient::new(DatabaseConfig::default(), Some("orders".to_string()));
        let err = db.get_table_schema(None).await.unwrap_err();
        assert!(matches!(err, DbError::NotConnected));
    }

    #[tokio::test]
    async fn disconnect_without_connection_is_a_noop() {
        let mut db = client();
        assert!(!db.is_connected());
        db.disconnect().await;
        assert!(!db.is_connected());
    }

    #[test]
    fn bind_params_accepts_all_json_shapes() {
        let params = vec![
            Value::Null,
            json!(true),
            json!(42),
            json!(3.5),
            json!("text"),
            json!({"nested": [1, 2]}),
        ];
        assert!(bind_params(&params).is_ok());
    }

    #[test]
    fn column_info_decodes_from_introspection_row() {
        let row = json!({
            "column_name": "invvalue",
            "data_type": "numeric",
            "is_nullable": "YES"
        });
        let info: ColumnInfo = serde_json::from_value(row).unwrap();
        assert_eq!(info.name, "invvalue");
        assert_eq!(info.data_type, "numeric");
        assert_eq!(info.is_nullable, "YES");
    }
}
