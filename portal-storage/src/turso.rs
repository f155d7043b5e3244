//! libSQL / Turso adapters.
//!
//! Table and column names are only ever built from a validated [`ScopeKey`]
//! and constants; every value goes through bound parameters.

use async_trait::async_trait;
use libsql::{Builder, Connection, Value};
use tracing::{debug, info, instrument};

use portal_core::constants::{COMMON_POOL_ORDER_COLUMN, COMMON_POOL_TABLE_PREFIX};
use portal_core::error::{PortalError, Result};
use portal_core::traits::{AuditSink, DataLoader};
use portal_core::types::{AuditRecord, CacheScope, CellValue, DataTable, ScopeKey, TableRow};

fn storage_err(e: libsql::Error) -> PortalError {
    PortalError::StorageError(e.to_string())
}

/// Opens a connection to a remote Turso database.
pub async fn connect_remote(url: &str, auth_token: &str) -> Result<Connection> {
    let db = Builder::new_remote(url.to_string(), auth_token.to_string())
        .build()
        .await
        .map_err(storage_err)?;
    let conn = db.connect().map_err(storage_err)?;
    info!(url, "connected to libSQL");
    Ok(conn)
}

fn cell_from(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Integer(i) => CellValue::Integer(i),
        Value::Real(f) => CellValue::Real(f),
        Value::Text(s) => CellValue::Text(s),
        Value::Blob(b) => CellValue::Blob(b),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMON POOL TABLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Loads `SecondSourceList_<key>` tables, newest `ID` first.
#[derive(Clone)]
pub struct SqlTableLoader {
    conn: Connection,
}

impl SqlTableLoader {
    /// Creates a loader on an open connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Query text for `key`.
    pub fn table_query(key: &ScopeKey) -> String {
        format!(
            "SELECT * FROM \"{}{}\" ORDER BY \"{}\" DESC",
            COMMON_POOL_TABLE_PREFIX,
            key.as_str(),
            COMMON_POOL_ORDER_COLUMN
        )
    }
}

#[async_trait]
impl DataLoader for SqlTableLoader {
    type Output = DataTable;

    #[instrument(skip(self))]
    async fn load_all(&self, scope: &CacheScope) -> Result<DataTable> {
        let key = scope.key().ok_or_else(|| {
            PortalError::InternalError("common-pool tables are loaded per key".into())
        })?;

        let mut rows = self
            .conn
            .query(&Self::table_query(key), ())
            .await
            .map_err(storage_err)?;

        let columns: Vec<String> = (0..rows.column_count())
            .map(|i| rows.column_name(i).unwrap_or_default().to_string())
            .collect();
        let mut table = DataTable::new(columns);

        while let Some(row) = rows.next().await.map_err(storage_err)? {
            let mut cells = TableRow::new();
            for (i, name) in table.columns.iter().enumerate() {
                let value = row.get_value(i as i32).map_err(storage_err)?;
                cells.insert(name.clone(), cell_from(value));
            }
            table.push_row(cells);
        }

        debug!(%key, rows = table.len(), "table loaded");
        Ok(table)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Appends audit records to an `AuditLog` table.
#[derive(Clone)]
pub struct SqlAuditSink {
    conn: Connection,
}

impl SqlAuditSink {
    /// Creates a sink on an open connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Creates the `AuditLog` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS AuditLog (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_name TEXT NOT NULL,
                    division TEXT NOT NULL,
                    department TEXT NOT NULL,
                    action TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    name TEXT NOT NULL,
                    location TEXT,
                    attributes TEXT NOT NULL,
                    timestamp TEXT NOT NULL
                )",
                (),
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for SqlAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        let attributes = serde_json::to_string(&record.subject.attributes)?;
        let location = record
            .subject
            .location
            .clone()
            .map(Value::Text)
            .unwrap_or(Value::Null);

        self.conn
            .execute(
                "INSERT INTO AuditLog
                    (user_name, division, department, action, kind, name, location, attributes, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    record.actor.user_name.clone(),
                    record.actor.division.clone(),
                    record.actor.department.clone(),
                    record.action.as_str().to_string(),
                    record.subject.kind.clone(),
                    record.subject.name.clone(),
                    location,
                    attributes,
                    record.timestamp.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| PortalError::AuditError(e.to_string()))?;
        Ok(())
    }
}
