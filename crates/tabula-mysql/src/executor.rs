//! MySQL executor.

use std::time::Duration;

use sqlx::mysql::{MySqlArguments, MySqlPool};
use sqlx::pool::PoolConnection;
use sqlx::{MySql, Row};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use tabula_core::{ColumnDescriptor, ExecError, Execute, Introspect, Outcome, Statement, Value};

use crate::decode::decode_row;

/// Default per-statement timeout budget.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(40);

/// Default number of connection-acquisition attempts.
const DEFAULT_ACQUIRE_ATTEMPTS: u32 = 3;

/// Base delay of the acquisition backoff; doubles per attempt.
const BACKOFF_BASE: Duration = Duration::from_millis(100);

/// Column metadata query: one row per column, with the covering index
/// type when a full-text (or other) index exists on the column.
const COLUMNS_SQL: &str = "SELECT DISTINCT \
     COLUMNS.COLUMN_NAME, COLUMNS.COLUMN_TYPE, COLUMNS.IS_NULLABLE, \
     COLUMNS.COLUMN_DEFAULT, COLUMNS.EXTRA, STATISTICS.INDEX_TYPE \
     FROM INFORMATION_SCHEMA.COLUMNS \
     LEFT JOIN INFORMATION_SCHEMA.STATISTICS \
     ON COLUMNS.COLUMN_NAME = STATISTICS.COLUMN_NAME \
     AND COLUMNS.TABLE_NAME = STATISTICS.TABLE_NAME \
     AND COLUMNS.TABLE_SCHEMA = STATISTICS.TABLE_SCHEMA \
     WHERE COLUMNS.TABLE_SCHEMA = ? AND COLUMNS.TABLE_NAME = ? \
     ORDER BY COLUMNS.ORDINAL_POSITION";

const ENGINE_SQL: &str = "SELECT ENGINE FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? LIMIT 1";

/// Executes statements against a MySQL pool.
///
/// Connection acquisition is retried with exponential backoff; every
/// statement runs under a per-call timeout. Query failures are reported
/// to the caller, never retried.
#[derive(Debug, Clone)]
pub struct MySqlExecutor {
    pool: MySqlPool,
    timeout: Duration,
    acquire_attempts: u32,
}

impl MySqlExecutor {
    /// Wraps an existing pool with the default timeout and retry policy.
    #[must_use]
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_TIMEOUT,
            acquire_attempts: DEFAULT_ACQUIRE_ATTEMPTS,
        }
    }

    /// Connects to `url` and wraps the resulting pool.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        Ok(Self::new(MySqlPool::connect(url).await?))
    }

    /// Overrides the per-statement timeout budget.
    #[must_use]
    pub fn timeout(mut self, budget: Duration) -> Self {
        self.timeout = budget;
        self
    }

    /// Overrides the number of connection-acquisition attempts.
    #[must_use]
    pub fn acquire_attempts(mut self, attempts: u32) -> Self {
        self.acquire_attempts = attempts.max(1);
        self
    }

    /// Returns the wrapped pool.
    #[must_use]
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn acquire(&self) -> Result<PoolConnection<MySql>, ExecError> {
        let mut attempt = 1;
        loop {
            match self.pool.acquire().await {
                Ok(conn) => return Ok(conn),
                Err(error) if attempt < self.acquire_attempts => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        attempt,
                        error = %error,
                        delay_ms = delay.as_millis() as u64,
                        "connection acquisition failed, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Err(ExecError::Connection {
                        message: error.to_string(),
                    });
                }
            }
        }
    }

    async fn run(&self, statement: &Statement) -> Result<Outcome, ExecError> {
        let mut conn = self.acquire().await?;
        debug!(sql = %statement.sql, params = statement.params.len(), "executing");

        let work = async {
            let mut query = sqlx::query(&statement.sql);
            for value in &statement.params {
                query = bind_value(query, value);
            }

            if returns_rows(&statement.sql) {
                let rows = query.fetch_all(&mut *conn).await?;
                let mut decoded = Vec::with_capacity(rows.len());
                for row in &rows {
                    decoded.push(decode_row(row)?);
                }
                Ok(Outcome {
                    rows: decoded,
                    ..Outcome::empty()
                })
            } else {
                let result = query.execute(&mut *conn).await?;
                Ok(Outcome {
                    rows: Vec::new(),
                    insert_id: result.last_insert_id(),
                    affected_rows: result.rows_affected(),
                    // sqlx does not expose MySQL's changed-rows counter.
                    changed_rows: result.rows_affected(),
                })
            }
        };

        match timeout(self.timeout, work).await {
            Ok(outcome) => outcome.map_err(|error: sqlx::Error| ExecError::Query {
                message: error.to_string(),
            }),
            Err(_) => Err(ExecError::Timeout {
                budget: self.timeout,
            }),
        }
    }
}

impl Execute for MySqlExecutor {
    async fn execute(&self, statement: &Statement) -> Result<Outcome, ExecError> {
        self.run(statement).await
    }
}

impl Introspect for MySqlExecutor {
    async fn columns(
        &self,
        database: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, ExecError> {
        let mut conn = self.acquire().await?;
        let work = async {
            let rows = sqlx::query(COLUMNS_SQL)
                .bind(database)
                .bind(table)
                .fetch_all(&mut *conn)
                .await?;

            let mut columns = Vec::with_capacity(rows.len());
            for row in &rows {
                columns.push(ColumnDescriptor {
                    name: row.try_get("COLUMN_NAME")?,
                    column_type: row.try_get("COLUMN_TYPE")?,
                    nullable: row.try_get::<String, _>("IS_NULLABLE")? == "YES",
                    default: row.try_get("COLUMN_DEFAULT")?,
                    extra: row.try_get("EXTRA")?,
                    index_type: row.try_get("INDEX_TYPE")?,
                });
            }
            Ok(columns)
        };

        match timeout(self.timeout, work).await {
            Ok(result) => result.map_err(|error: sqlx::Error| ExecError::Query {
                message: error.to_string(),
            }),
            Err(_) => Err(ExecError::Timeout {
                budget: self.timeout,
            }),
        }
    }

    async fn engine(&self, database: &str, table: &str) -> Result<Option<String>, ExecError> {
        let mut conn = self.acquire().await?;
        let work = async {
            let row = sqlx::query(ENGINE_SQL)
                .bind(database)
                .bind(table)
                .fetch_optional(&mut *conn)
                .await?;
            match row {
                Some(row) => row.try_get::<Option<String>, _>("ENGINE"),
                None => Ok(None),
            }
        };

        match timeout(self.timeout, work).await {
            Ok(result) => result.map_err(|error: sqlx::Error| ExecError::Query {
                message: error.to_string(),
            }),
            Err(_) => Err(ExecError::Timeout {
                budget: self.timeout,
            }),
        }
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Uint(u) => query.bind(*u),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        Value::Bytes(b) => query.bind(b.clone()),
    }
}

/// `true` for statements answered with a row set rather than counters.
fn returns_rows(sql: &str) -> bool {
    let keyword: String = sql
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();
    matches!(keyword.as_str(), "SELECT" | "SHOW" | "DESCRIBE" | "EXPLAIN")
}

/// Exponential backoff: 100ms, 200ms, 400ms, …
fn backoff_delay(attempt: u32) -> Duration {
    BACKOFF_BASE * 2_u32.saturating_pow(attempt.saturating_sub(1))
}
