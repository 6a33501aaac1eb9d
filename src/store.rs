//! SQLite store for the smart-home dataset.
//!
//! Creates the schema, seeds sample rows, and executes validated
//! statements. Store errors are passed through as plain messages.

use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::info;

use crate::error::{HomeqlError, HomeqlResult};
use crate::schema::{DDL, SCHEMA};
use crate::statement::Statement;

const SEED: &[&str] = &[
    "INSERT OR IGNORE INTO users VALUES
        (1, 'Alice', 120.5, 'alice@example.com'),
        (2, 'Bob', 85.0, 'bob@example.com'),
        (3, 'Charlie', 150.2, 'charlie@example.com')",
    "INSERT OR IGNORE INTO devices VALUES
        (1, '客厅灯', '照明', '客厅'),
        (2, '卧室空调', '空调', '主卧'),
        (3, '客厅电视', '娱乐', '客厅'),
        (4, '厨房冰箱', '电器', '厨房'),
        (5, '浴室热水器', '热水', '浴室')",
    "INSERT OR IGNORE INTO usage_records VALUES
        (1, 1, 1, '2025-06-01 08:00:00', '2025-06-01 09:00:00'),
        (2, 1, 3, '2025-06-01 19:00:00', '2025-06-01 21:00:00'),
        (3, 2, 2, '2025-06-01 21:00:00', '2025-06-01 23:00:00'),
        (4, 3, 4, '2025-06-01 06:00:00', NULL),
        (5, 3, 5, '2025-06-01 07:00:00', '2025-06-01 07:30:00')",
    "INSERT OR IGNORE INTO security_events VALUES
        (1, 1, '2025-06-01 12:30:00', '门禁异常', '前门未正常关闭'),
        (2, 3, '2025-06-01 13:15:00', '摄像头警报', '检测到未知移动')",
];

/// Rows returned by a read, columns in the order the store reported them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Value of `column` in row `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Rows as JSON objects, keys in column order.
    pub fn to_json(&self) -> Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                Value::Object(obj)
            })
            .collect();
        Value::Array(rows)
    }
}

/// Result of executing one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rows(RowSet),
    Ack { rows_affected: u64 },
}

/// Connection to the SQLite database.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect, create the tables and seed sample data.
    ///
    /// ```rust,ignore
    /// let store = Store::open("sqlite::memory:").await?;
    /// ```
    pub async fn open(url: &str) -> HomeqlResult<Self> {
        // A single connection keeps `sqlite::memory:` one database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| HomeqlError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.initialize().await?;
        info!(url, "store initialized");
        Ok(store)
    }

    /// Create missing tables and insert sample rows that are not there yet.
    pub async fn initialize(&self) -> HomeqlResult<()> {
        for ddl in DDL.iter().chain(SEED) {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| HomeqlError::Execution(e.to_string()))?;
        }
        Ok(())
    }

    /// Drop every table, then recreate and reseed.
    pub async fn reset(&self) -> HomeqlResult<()> {
        for table in SCHEMA.iter().rev() {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", table.name))
                .execute(&self.pool)
                .await
                .map_err(|e| HomeqlError::Execution(e.to_string()))?;
        }
        self.initialize().await?;
        info!("store reset");
        Ok(())
    }

    /// Run a statement. Reads return rows, everything else an acknowledgement.
    pub async fn execute(&self, statement: &Statement) -> HomeqlResult<Outcome> {
        if statement.is_read() {
            let rows: Vec<SqliteRow> = sqlx::query(statement.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| HomeqlError::Execution(e.to_string()))?;
            Ok(Outcome::Rows(to_row_set(&rows)))
        } else {
            let result = sqlx::query(statement.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| HomeqlError::Execution(e.to_string()))?;
            Ok(Outcome::Ack {
                rows_affected: result.rows_affected(),
            })
        }
    }
}

fn to_row_set(rows: &[SqliteRow]) -> RowSet {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| (0..row.columns().len()).map(|i| cell(row, i)).collect())
        .collect();

    RowSet { columns, rows }
}

/// Decode one cell by its runtime storage class.
fn cell(row: &SqliteRow, i: usize) -> Value {
    let storage = match row.try_get_raw(i) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    match storage.as_str() {
        "INTEGER" => row
            .try_get::<i64, _>(i)
            .map(|v| Value::Number(v.into()))
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get::<f64, _>(i)
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<String, _>(i)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
