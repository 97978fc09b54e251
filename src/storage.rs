use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Small durable key-value table holding the session state between runs.
#[derive(Debug, Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct Options {
    pub path: Option<PathBuf>,
}

impl Store {
    pub fn open(opts: Options) -> Result<Self> {
        let path = if let Some(path) = opts.path {
            path
        } else {
            default_path().context("storage: resolve default path")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("storage: create directory {}", parent.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("storage: open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("storage: set WAL")?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .context("storage: set busy timeout")?;
        migrate(&conn)?;
        tracing::debug!(path = %path.display(), "state store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn close(self) -> Result<()> {
        let conn = Arc::try_unwrap(self.conn)
            .map_err(|_| anyhow!("storage: connection still in use"))?
            .into_inner();
        conn.close()
            .map_err(|(_, err)| err)
            .context("storage: close connection")
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("storage: read {key}"))
    }

    pub fn entry(&self, key: &str) -> Result<Option<Entry>> {
        let conn = self.conn.lock();
        let row: Option<(String, String, i64)> = conn
            .query_row(
                "SELECT key, value, updated_at FROM kv WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .with_context(|| format!("storage: read entry {key}"))?;
        Ok(row.map(|(key, value, updated_at)| Entry {
            key,
            value,
            updated_at: timestamp(updated_at),
        }))
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
INSERT INTO kv (key, value, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET
  value = excluded.value,
  updated_at = excluded.updated_at
"#,
            params![key, value, Utc::now().timestamp()],
        )
        .with_context(|| format!("storage: write {key}"))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .with_context(|| format!("storage: remove {key}"))?;
        Ok(removed > 0)
    }

    pub fn remove_many(&self, keys: &[&str]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!("DELETE FROM kv WHERE key IN ({placeholders})");
        let conn = self.conn.lock();
        conn.execute(&sql, params_from_iter(keys.iter()))
            .context("storage: remove keys")
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .with_context(|| format!("storage: decode {key}")),
            None => Ok(None),
        }
    }

    pub fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw =
            serde_json::to_string(value).with_context(|| format!("storage: encode {key}"))?;
        self.put(key, &raw)
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
  version INTEGER PRIMARY KEY,
  applied_at INTEGER NOT NULL
)
"#,
        [],
    )?;

    let current: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    for (idx, sql) in migrations().iter().enumerate() {
        let version = (idx + 1) as i64;
        if version <= current {
            continue;
        }
        conn.execute_batch(sql)
            .with_context(|| format!("storage: apply migration {version}"))?;
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, Utc::now().timestamp()],
        )?;
    }
    Ok(())
}

fn migrations() -> Vec<&'static str> {
    vec![r#"
CREATE TABLE IF NOT EXISTS kv (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);
"#]
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vibecheck").join("state.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(dir: &tempfile::TempDir) -> Store {
        Store::open(Options {
            path: Some(dir.path().join("state.db")),
        })
        .unwrap()
    }

    #[test]
    fn open_creates_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.db");
        let store = Store::open(Options {
            path: Some(path.clone()),
        })
        .unwrap();
        assert!(path.exists());
        store.close().unwrap();
    }

    #[test]
    fn put_overwrites_and_stamps_entries() {
        let dir = tempdir().unwrap();
        let store = open(&dir);
        store.put("theme", "\"dark\"").unwrap();
        store.put("theme", "\"light\"").unwrap();
        let entry = store.entry("theme").unwrap().unwrap();
        assert_eq!(entry.value, "\"light\"");
        assert!(entry.updated_at.timestamp() > 0);
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn json_values_round_trip_and_survive_reopen() {
        let dir = tempdir().unwrap();
        let store = open(&dir);
        store.put_json("text_input", "hello there world").unwrap();
        store.close().unwrap();

        let store = open(&dir);
        let value: Option<String> = store.get_json("text_input").unwrap();
        assert_eq!(value.as_deref(), Some("hello there world"));
    }

    #[test]
    fn remove_many_deletes_only_named_keys() {
        let dir = tempdir().unwrap();
        let store = open(&dir);
        for key in ["a", "b", "c"] {
            store.put(key, "1").unwrap();
        }
        assert_eq!(store.remove_many(&["a", "c", "zzz"]).unwrap(), 2);
        assert_eq!(store.remove_many(&[]).unwrap(), 0);
        assert!(store.get("b").unwrap().is_some());
        assert!(!store.remove("a").unwrap());
    }

    #[test]
    fn corrupt_json_is_an_error() {
        let dir = tempdir().unwrap();
        let store = open(&dir);
        store.put("text_analysis", "{not json").unwrap();
        let decoded: Result<Option<serde_json::Value>> = store.get_json("text_analysis");
        assert!(decoded.is_err());
    }
}
