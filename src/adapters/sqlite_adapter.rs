//! SQLite record store.
//!
//! Each collection is a table keyed by `id` holding the full record as JSON,
//! plus the columns its secondary indexes need. The schema is versioned with
//! `PRAGMA user_version` and migrated forward by [`SqliteAdapter::initialize_schema`].

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, ToSql};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::record_upgrade::{upgrade_journal_document, upgrade_position_document};
use crate::domain::error::TradebookError;
use crate::domain::journal::{JournalEntry, JournalEntryType};
use crate::domain::position::{Position, PositionStatus};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::{JournalStore, PositionStore, JOURNAL_ENTRIES, POSITIONS};

pub const SCHEMA_VERSION: i64 = 3;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_V1: &str = "CREATE TABLE IF NOT EXISTS positions (
        id TEXT PRIMARY KEY,
        symbol TEXT NOT NULL,
        status TEXT NOT NULL,
        created_date TEXT NOT NULL,
        record TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_positions_symbol ON positions(symbol);
    CREATE INDEX IF NOT EXISTS idx_positions_status ON positions(status);
    CREATE INDEX IF NOT EXISTS idx_positions_created_date ON positions(created_date);";

const SCHEMA_V2: &str = "CREATE TABLE IF NOT EXISTS journal_entries (
        id TEXT PRIMARY KEY,
        position_id TEXT NOT NULL,
        trade_id TEXT,
        entry_type TEXT NOT NULL,
        created_at TEXT NOT NULL,
        record TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_journal_position_id ON journal_entries(position_id);
    CREATE INDEX IF NOT EXISTS idx_journal_trade_id ON journal_entries(trade_id);
    CREATE INDEX IF NOT EXISTS idx_journal_entry_type ON journal_entries(entry_type);
    CREATE INDEX IF NOT EXISTS idx_journal_created_at ON journal_entries(created_at);";

const POSITION_COLUMNS: &str = "id, record";
const JOURNAL_COLUMNS: &str = "id, record";

fn pool_err(e: r2d2::Error) -> TradebookError {
    TradebookError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> TradebookError {
    TradebookError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn insert_err(collection: &str, id: &str, e: rusqlite::Error) -> TradebookError {
    match e {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            TradebookError::DuplicateRecord {
                collection: collection.to_string(),
                id: id.to_string(),
            }
        }
        other => query_err(other),
    }
}

fn unknown_version(version: i64) -> TradebookError {
    TradebookError::Database {
        reason: format!("no migration for schema version {version}"),
    }
}

fn encode_err(collection: &str, id: &str, e: serde_json::Error) -> TradebookError {
    TradebookError::CorruptRecord {
        collection: collection.to_string(),
        id: id.to_string(),
        reason: e.to_string(),
    }
}

/// Fixed-width timestamps so index columns sort chronologically as text.
fn index_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn position_status(position: &Position) -> PositionStatus {
    if position.trades.is_empty() {
        PositionStatus::Planned
    } else {
        PositionStatus::Open
    }
}

fn decode<T: DeserializeOwned>(
    collection: &str,
    id: &str,
    raw: &str,
    upgrade: fn(&mut Value) -> bool,
) -> Result<T, TradebookError> {
    let mut doc: Value = serde_json::from_str(raw).map_err(|e| encode_err(collection, id, e))?;
    upgrade(&mut doc);
    serde_json::from_value(doc).map_err(|e| encode_err(collection, id, e))
}

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradebookError> {
        let db_path =
            config
                .get_string("storage", "path")
                .ok_or_else(|| TradebookError::ConfigMissing {
                    section: "storage".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("storage", "pool_size", 4) as u32;
        Self::open(&db_path, pool_size)
    }

    pub fn open(db_path: &str, pool_size: u32) -> Result<Self, TradebookError> {
        let manager = SqliteConnectionManager::file(db_path)
            .with_init(|conn: &mut Connection| conn.busy_timeout(BUSY_TIMEOUT));
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    /// A private database that lives as long as the adapter.
    pub fn in_memory() -> Result<Self, TradebookError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TradebookError> {
        self.pool.get().map_err(pool_err)
    }

    pub fn schema_version(&self) -> Result<i64, TradebookError> {
        let conn = self.conn()?;
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(query_err)
    }

    /// Apply every migration newer than the stored schema version, one transaction each.
    pub fn initialize_schema(&self) -> Result<(), TradebookError> {
        let mut conn = self.conn()?;
        let current: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(query_err)?;
        if current < 0 {
            return Err(unknown_version(current));
        }

        for version in (current + 1)..=SCHEMA_VERSION {
            let tx = conn.transaction().map_err(query_err)?;
            match version {
                1 => tx.execute_batch(SCHEMA_V1).map_err(query_err)?,
                2 => tx.execute_batch(SCHEMA_V2).map_err(query_err)?,
                3 => upgrade_stored_documents(&tx)?,
                other => return Err(unknown_version(other)),
            }
            tx.pragma_update(None, "user_version", version)
                .map_err(query_err)?;
            tx.commit().map_err(query_err)?;
            tracing::debug!(version, "applied schema migration");
        }
        Ok(())
    }

    fn query_positions(
        &self,
        filter: &str,
        args: &[&dyn ToSql],
    ) -> Result<Vec<Position>, TradebookError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {POSITION_COLUMNS} FROM positions {filter} ORDER BY created_date ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql).map_err(query_err)?;
        let rows = stmt
            .query_map(args, |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(query_err)?;

        let mut positions = Vec::new();
        for row in rows {
            let (id, raw) = row.map_err(query_err)?;
            positions.push(decode(POSITIONS, &id, &raw, upgrade_position_document)?);
        }
        Ok(positions)
    }

    fn query_entries(
        &self,
        filter: &str,
        args: &[&dyn ToSql],
    ) -> Result<Vec<JournalEntry>, TradebookError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {JOURNAL_COLUMNS} FROM journal_entries {filter} ORDER BY created_at ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql).map_err(query_err)?;
        let rows = stmt
            .query_map(args, |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(query_err)?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, raw) = row.map_err(query_err)?;
            entries.push(decode(JOURNAL_ENTRIES, &id, &raw, upgrade_journal_document)?);
        }
        Ok(entries)
    }

    fn delete_by_id(&self, table: &str, id: &str) -> Result<(), TradebookError> {
        let conn = self.conn()?;
        let affected = conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])
            .map_err(query_err)?;
        if affected == 0 {
            return Err(TradebookError::not_found(table, id));
        }
        Ok(())
    }

    fn clear_table(&self, table: &str) -> Result<(), TradebookError> {
        let conn = self.conn()?;
        conn.execute(&format!("DELETE FROM {table}"), [])
            .map_err(query_err)?;
        Ok(())
    }
}

/// Migration 3: rewrite stored documents into the current record shape.
fn upgrade_stored_documents(conn: &Connection) -> Result<(), TradebookError> {
    let rows: Vec<(String, String)> = {
        let mut stmt = conn
            .prepare("SELECT id, record FROM positions")
            .map_err(query_err)?;
        let mapped = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(query_err)?;
        mapped.collect::<Result<_, _>>().map_err(query_err)?
    };

    let mut upgraded = 0usize;
    for (id, raw) in rows {
        let mut doc: Value =
            serde_json::from_str(&raw).map_err(|e| encode_err(POSITIONS, &id, e))?;
        if !upgrade_position_document(&mut doc) {
            continue;
        }
        let status = match doc.get("trades").and_then(Value::as_array) {
            Some(trades) if !trades.is_empty() => PositionStatus::Open,
            _ => PositionStatus::Planned,
        };
        conn.execute(
            "UPDATE positions SET record = ?1, status = ?2 WHERE id = ?3",
            params![doc.to_string(), status.as_str(), id],
        )
        .map_err(query_err)?;
        upgraded += 1;
    }
    tracing::debug!(upgraded, "upgraded stored position documents");
    Ok(())
}

impl PositionStore for SqliteAdapter {
    fn insert_position(&self, position: &Position) -> Result<(), TradebookError> {
        let record =
            serde_json::to_string(position).map_err(|e| encode_err(POSITIONS, &position.id, e))?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO positions (id, symbol, status, created_date, record)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                position.id,
                position.symbol,
                position_status(position).as_str(),
                index_timestamp(&position.created_date),
                record
            ],
        )
        .map_err(|e| insert_err(POSITIONS, &position.id, e))?;
        Ok(())
    }

    fn get_position(&self, id: &str) -> Result<Option<Position>, TradebookError> {
        Ok(self
            .query_positions("WHERE id = ?1", &[&id])?
            .into_iter()
            .next())
    }

    fn list_positions(&self) -> Result<Vec<Position>, TradebookError> {
        self.query_positions("", &[])
    }

    fn positions_by_symbol(&self, symbol: &str) -> Result<Vec<Position>, TradebookError> {
        let symbol = symbol.trim().to_uppercase();
        self.query_positions("WHERE symbol = ?1", &[&symbol])
    }

    fn positions_by_status(&self, status: PositionStatus) -> Result<Vec<Position>, TradebookError> {
        self.query_positions("WHERE status = ?1", &[&status.as_str()])
    }

    fn update_position(&self, position: &Position) -> Result<(), TradebookError> {
        let record =
            serde_json::to_string(position).map_err(|e| encode_err(POSITIONS, &position.id, e))?;
        let conn = self.conn()?;
        let affected = conn
            .execute(
                "UPDATE positions SET symbol = ?1, status = ?2, record = ?3 WHERE id = ?4",
                params![
                    position.symbol,
                    position_status(position).as_str(),
                    record,
                    position.id
                ],
            )
            .map_err(query_err)?;
        if affected == 0 {
            return Err(TradebookError::not_found(POSITIONS, &position.id));
        }
        Ok(())
    }

    fn delete_position(&self, id: &str) -> Result<(), TradebookError> {
        self.delete_by_id(POSITIONS, id)
    }

    fn clear_positions(&self) -> Result<(), TradebookError> {
        self.clear_table(POSITIONS)
    }
}

impl JournalStore for SqliteAdapter {
    fn insert_entry(&self, entry: &JournalEntry) -> Result<(), TradebookError> {
        let record =
            serde_json::to_string(entry).map_err(|e| encode_err(JOURNAL_ENTRIES, &entry.id, e))?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO journal_entries (id, position_id, trade_id, entry_type, created_at, record)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.position_id,
                entry.trade_id,
                entry.entry_type.as_str(),
                index_timestamp(&entry.created_at),
                record
            ],
        )
        .map_err(|e| insert_err(JOURNAL_ENTRIES, &entry.id, e))?;
        Ok(())
    }

    fn get_entry(&self, id: &str) -> Result<Option<JournalEntry>, TradebookError> {
        Ok(self
            .query_entries("WHERE id = ?1", &[&id])?
            .into_iter()
            .next())
    }

    fn list_entries(&self) -> Result<Vec<JournalEntry>, TradebookError> {
        self.query_entries("", &[])
    }

    fn entries_by_position(&self, position_id: &str) -> Result<Vec<JournalEntry>, TradebookError> {
        self.query_entries("WHERE position_id = ?1", &[&position_id])
    }

    fn entries_by_trade(&self, trade_id: &str) -> Result<Vec<JournalEntry>, TradebookError> {
        self.query_entries("WHERE trade_id = ?1", &[&trade_id])
    }

    fn entries_by_type(
        &self,
        entry_type: JournalEntryType,
    ) -> Result<Vec<JournalEntry>, TradebookError> {
        self.query_entries("WHERE entry_type = ?1", &[&entry_type.as_str()])
    }

    fn update_entry(&self, entry: &JournalEntry) -> Result<(), TradebookError> {
        let record =
            serde_json::to_string(entry).map_err(|e| encode_err(JOURNAL_ENTRIES, &entry.id, e))?;
        let conn = self.conn()?;
        let affected = conn
            .execute(
                "UPDATE journal_entries
                 SET position_id = ?1, trade_id = ?2, entry_type = ?3, record = ?4
                 WHERE id = ?5",
                params![
                    entry.position_id,
                    entry.trade_id,
                    entry.entry_type.as_str(),
                    record,
                    entry.id
                ],
            )
            .map_err(query_err)?;
        if affected == 0 {
            return Err(TradebookError::not_found(JOURNAL_ENTRIES, &entry.id));
        }
        Ok(())
    }

    fn delete_entry(&self, id: &str) -> Result<(), TradebookError> {
        self.delete_by_id(JOURNAL_ENTRIES, id)
    }

    fn clear_entries(&self) -> Result<(), TradebookError> {
        self.clear_table(JOURNAL_ENTRIES)
    }
}
