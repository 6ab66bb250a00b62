//! SQLite tables for model blobs, parse-result caching and store settings.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crfname_core::ParseResult;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// How long a cached parse stays valid unless the caller says otherwise.
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Setting that switches result caching on (`"true"`) or off.
pub const CACHE_ENABLED: &str = "cache_enabled";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS crf_models (
    name TEXT PRIMARY KEY,
    version TEXT NOT NULL,
    model_data BLOB NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS parsed_names (
    original_text TEXT PRIMARY KEY,
    model_name TEXT NOT NULL,
    parsed_components TEXT NOT NULL,
    model_version TEXT NOT NULL,
    processing_time_ms INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_parsed_names_created_at ON parsed_names(created_at);

CREATE TABLE IF NOT EXISTS crf_config (
    parameter TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT OR IGNORE INTO crf_config (parameter, value) VALUES ('cache_enabled', 'true');
"#;

const MODEL_COLUMNS: &str = "name, version, model_data, is_active, created_at";

/// One row of the model table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredModel {
    pub name: String,
    pub version: String,
    pub data: Vec<u8>,
    pub is_active: bool,
    /// Seconds since the Unix epoch.
    pub created_at: i64,
}

impl StoredModel {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            version: row.get(1)?,
            data: row.get(2)?,
            is_active: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

/// A single SQLite connection shared behind a mutex.
pub struct ModelStore {
    conn: Mutex<Connection>,
}

impl ModelStore {
    /// Open (or create) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!("opened model store at {}", path.display());
        Self::with_connection(conn)
    }

    /// A private database that disappears with the store.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace the blob stored under `name`. The active flag of an
    /// existing row is left alone.
    pub fn save_model(&self, name: &str, version: &str, data: &[u8]) -> Result<()> {
        self.conn().execute(
            "INSERT INTO crf_models (name, version, model_data, is_active, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)
             ON CONFLICT (name) DO UPDATE SET
                 version = excluded.version,
                 model_data = excluded.model_data,
                 created_at = excluded.created_at",
            params![name, version, data, unix_now()],
        )?;
        info!("stored model '{name}' version {version} ({} bytes)", data.len());
        Ok(())
    }

    pub fn model_by_name(&self, name: &str) -> Result<StoredModel> {
        let sql = format!("SELECT {MODEL_COLUMNS} FROM crf_models WHERE name = ?1");
        self.conn()
            .query_row(&sql, params![name], StoredModel::from_row)
            .optional()?
            .ok_or_else(|| StoreError::ModelNotFound(name.to_string()))
    }

    /// The row flagged active, newest first if several are.
    pub fn active_model(&self) -> Result<StoredModel> {
        let sql = format!(
            "SELECT {MODEL_COLUMNS} FROM crf_models
             WHERE is_active = 1 ORDER BY created_at DESC LIMIT 1"
        );
        self.conn()
            .query_row(&sql, [], StoredModel::from_row)
            .optional()?
            .ok_or(StoreError::NoActiveModel)
    }

    /// Make `name` the only active model.
    pub fn activate(&self, name: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute("UPDATE crf_models SET is_active = 0 WHERE is_active = 1", [])?;
        let updated = tx.execute(
            "UPDATE crf_models SET is_active = 1 WHERE name = ?1",
            params![name],
        )?;
        if updated == 0 {
            return Err(StoreError::ModelNotFound(name.to_string()));
        }
        tx.commit()?;
        info!("activated model '{name}'");
        Ok(())
    }

    /// Stored model names, sorted.
    pub fn model_names(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT name FROM crf_models ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    pub fn delete_model(&self, name: &str) -> Result<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM crf_models WHERE name = ?1", params![name])?;
        Ok(deleted > 0)
    }

    pub fn config_value(&self, parameter: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM crf_config WHERE parameter = ?1",
                params![parameter],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_config(&self, parameter: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO crf_config (parameter, value) VALUES (?1, ?2)
             ON CONFLICT (parameter) DO UPDATE SET value = excluded.value",
            params![parameter, value],
        )?;
        Ok(())
    }

    pub fn cache_enabled(&self) -> Result<bool> {
        Ok(self.config_value(CACHE_ENABLED)?.as_deref() == Some("true"))
    }

    /// Upsert `result`, produced by the model named `model_name`, keyed by its
    /// input text.
    ///
    /// Returns `false` without writing when caching is switched off.
    pub fn cache_result(&self, model_name: &str, result: &ParseResult) -> Result<bool> {
        if !self.cache_enabled()? {
            debug!("result cache disabled, not storing '{}'", result.input);
            return Ok(false);
        }

        let components = result.to_json()?;
        let elapsed_ms = i64::try_from(result.processing_time.as_millis()).unwrap_or(i64::MAX);
        self.conn().execute(
            "INSERT INTO parsed_names
                 (original_text, model_name, parsed_components, model_version,
                  processing_time_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (original_text) DO UPDATE SET
                 model_name = excluded.model_name,
                 parsed_components = excluded.parsed_components,
                 model_version = excluded.model_version,
                 processing_time_ms = excluded.processing_time_ms,
                 created_at = excluded.created_at",
            params![
                result.input,
                model_name,
                components,
                result.model_version,
                elapsed_ms,
                unix_now()
            ],
        )?;
        Ok(true)
    }

    /// Cached parse of `text` by the model named `model_name`, written less
    /// than `max_age` ago.
    pub fn cached_result(
        &self,
        text: &str,
        model_name: &str,
        max_age: Duration,
    ) -> Result<Option<ParseResult>> {
        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        let cutoff = unix_now().saturating_sub(max_age);

        let json: Option<String> = self
            .conn()
            .query_row(
                "SELECT parsed_components FROM parsed_names
                 WHERE original_text = ?1 AND model_name = ?2 AND created_at > ?3",
                params![text, model_name, cutoff],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(ParseResult::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// Delete cache rows written `max_age` ago or earlier.
    pub fn purge_cache(&self, max_age: Duration) -> Result<usize> {
        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        let cutoff = unix_now().saturating_sub(max_age);
        let purged = self.conn().execute(
            "DELETE FROM parsed_names WHERE created_at <= ?1",
            params![cutoff],
        )?;
        if purged > 0 {
            info!("purged {purged} cached results");
        }
        Ok(purged)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
