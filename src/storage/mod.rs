//! 設定値の永続化
//!
//! アバター画像・壁紙・語録の履歴・話術ライブラリの使用回数などを
//! キー・バリュー形式で端末ローカルに保存する。
//! ストアのエラーはログに残すだけで呼び出し元には返さない。
//! 読み取り失敗は「値なし」、書き込み失敗は no-op として扱う。

pub mod blob;
mod memory;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use blob::BlobStore;
pub use memory::MemoryPreferences;

/// これを超える長さの値は BlobStore に退避する（data URL の画像を想定）
const BLOB_THRESHOLD: usize = 4 * 1024;

/// 永続化キー
pub mod keys {
    pub const COMPANION_IMAGE: &str = "vibeCoderCompanionImage";
    pub const WALLPAPER: &str = "vibeCoderWallpaper";
    pub const DAILY_QUOTE: &str = "dailyQuote";
    pub const QUOTE_HISTORY: &str = "quoteHistory";
    pub const QUOTE_FAVORITES: &str = "quoteFavorites";
    pub const PHRASE_USAGE: &str = "phraseUsage";
    pub const PHRASE_FAVORITES: &str = "phraseFavorites";
}

/// キー・バリューストアの契約。
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// JSON として保存された値を読み出す。壊れた値は警告を出して「なし」とみなす。
pub fn load_json<T: DeserializeOwned>(store: &dyn PreferenceStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Stored preference is not valid JSON, ignoring it");
            None
        }
    }
}

/// 値を JSON にシリアライズして保存する。
pub fn save_json<T: Serialize + ?Sized>(store: &dyn PreferenceStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, &raw),
        Err(e) => warn!(key, error = %e, "Failed to serialize preference"),
    }
}

/// SQLite + BlobStore による永続ストア。
pub struct Preferences {
    conn: Mutex<Connection>,
    blobs: BlobStore,
}

impl Preferences {
    /// 指定ディレクトリでストアを開く。
    pub fn open_at(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).with_context(|| {
            format!("failed to create data directory: {}", data_dir.display())
        })?;

        let db_path = data_dir.join("preferences.db");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open database: {}", db_path.display()))?;
        Self::migrate(&conn)?;

        let blobs = BlobStore::new(data_dir.join("blobs"))?;

        Ok(Self {
            conn: Mutex::new(conn),
            blobs,
        })
    }

    /// データディレクトリのパスを返す。
    pub fn data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "vibe-companion")
            .context("failed to determine data directory")?;
        Ok(dirs.data_dir().to_path_buf())
    }

    fn migrate(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS preferences (
                key        TEXT PRIMARY KEY,
                value      TEXT,
                blob_hash  TEXT,
                updated_at TEXT NOT NULL
            );",
        )
        .context("failed to create preferences table")?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(Option<String>, Option<String>)> = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT value, blob_hash FROM preferences WHERE key = ?1",
                rusqlite::params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("failed to query preference")?
        };

        match row {
            None => Ok(None),
            Some((_, Some(hash))) => self.blobs.get(&hash).map(Some),
            Some((value, None)) => Ok(value),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        // blob の書き込みから参照の掃除まで同じロックの中で行う
        let conn = self.lock()?;
        let previous = Self::blob_hash_of(&conn, key)?;

        let (inline, hash) = if value.len() > BLOB_THRESHOLD {
            (None, Some(self.blobs.put(value)?))
        } else {
            (Some(value), None)
        };

        debug!(key, bytes = value.len(), spilled = hash.is_some(), "Writing preference");

        conn.execute(
            "INSERT INTO preferences (key, value, blob_hash, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                blob_hash = excluded.blob_hash,
                updated_at = excluded.updated_at",
            rusqlite::params![key, inline, hash, Utc::now().to_rfc3339()],
        )
        .context("failed to upsert preference")?;

        if let Some(previous) = previous {
            self.release_blob(&conn, &previous)?;
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        let previous = Self::blob_hash_of(&conn, key)?;

        conn.execute(
            "DELETE FROM preferences WHERE key = ?1",
            rusqlite::params![key],
        )
        .context("failed to delete preference")?;

        if let Some(previous) = previous {
            self.release_blob(&conn, &previous)?;
        }
        Ok(())
    }

    fn blob_hash_of(conn: &Connection, key: &str) -> Result<Option<String>> {
        let hash: Option<Option<String>> = conn
            .query_row(
                "SELECT blob_hash FROM preferences WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query blob reference")?;
        Ok(hash.flatten())
    }

    /// どの行からも参照されなくなった blob を削除する。
    fn release_blob(&self, conn: &Connection, hash: &str) -> Result<()> {
        let references: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM preferences WHERE blob_hash = ?1",
                rusqlite::params![hash],
                |row| row.get(0),
            )
            .context("failed to count blob references")?;

        if references == 0 {
            debug!(hash, "Removing unreferenced blob");
            self.blobs.remove(hash)?;
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("preference database lock poisoned"))
    }
}

impl PreferenceStore for Preferences {
    fn get(&self, key: &str) -> Option<String> {
        self.read(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "Failed to read preference");
            None
        })
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.write(key, value) {
            warn!(key, error = %e, "Failed to write preference");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.delete(key) {
            warn!(key, error = %e, "Failed to remove preference");
        }
    }
}
