//! Model and voice registries backed by SQLite.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task;

use super::{ModelRegistry, VoiceRegistry};
use crate::errors::{AppError, AppResult};
use crate::models::{ModelRow, NewModel, NewVoiceProfile, PageQuery, VoiceProfile};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS models (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model_name TEXT NOT NULL,
    video_path TEXT NOT NULL,
    audio_path TEXT NOT NULL,
    voice_id INTEGER NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_models_name ON models(model_name);

CREATE TABLE IF NOT EXISTS voices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    origin_audio_path TEXT NOT NULL,
    lang TEXT NOT NULL,
    asr_format_audio_url TEXT NOT NULL,
    reference_audio_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

#[derive(Clone)]
pub struct SqliteRegistry {
    db_path: PathBuf,
}

impl SqliteRegistry {
    /// Open (or create) the database and apply the schema
    pub fn initialize(db_path: impl Into<PathBuf>) -> AppResult<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = open_connection(&db_path)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self { db_path })
    }

    async fn run_blocking<F, T>(&self, task_fn: F) -> AppResult<T>
    where
        F: FnOnce(Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let conn = open_connection(&db_path)?;
            task_fn(conn)
        })
        .await
        .map_err(|err| AppError::Database(format!("Registry worker failed: {err}")))?
    }
}

fn open_connection(path: &Path) -> AppResult<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_secs(3))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

fn model_from_row(row: &Row<'_>) -> rusqlite::Result<ModelRow> {
    Ok(ModelRow {
        id: row.get(0)?,
        model_name: row.get(1)?,
        video_path: row.get(2)?,
        audio_path: row.get(3)?,
        voice_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn voice_from_row(row: &Row<'_>) -> rusqlite::Result<VoiceProfile> {
    Ok(VoiceProfile {
        id: row.get(0)?,
        origin_audio_path: row.get(1)?,
        lang: row.get(2)?,
        asr_format_audio_url: row.get(3)?,
        reference_audio_text: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[async_trait]
impl ModelRegistry for SqliteRegistry {
    async fn insert_model(&self, model: NewModel) -> AppResult<i64> {
        self.run_blocking(move |conn| {
            conn.execute(
                r#"
                INSERT INTO models (model_name, video_path, audio_path, voice_id, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    model.model_name,
                    model.video_path,
                    model.audio_path,
                    model.voice_id,
                    Utc::now()
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn select_model_page(&self, query: &PageQuery) -> AppResult<Vec<ModelRow>> {
        let name = query.name.clone();
        let limit = i64::from(query.page_size);
        let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);

        self.run_blocking(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, model_name, video_path, audio_path, voice_id, created_at
                FROM models
                WHERE model_name LIKE '%' || ?1 || '%'
                ORDER BY id DESC
                LIMIT ?2 OFFSET ?3
                "#,
            )?;

            let rows = stmt.query_map(params![name, limit, offset], model_from_row)?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
    }

    async fn count_models(&self, name: &str) -> AppResult<u64> {
        let name = name.to_string();
        self.run_blocking(move |conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM models WHERE model_name LIKE '%' || ?1 || '%'",
                params![name],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(total).unwrap_or(0))
        })
        .await
    }

    async fn select_model(&self, id: i64) -> AppResult<Option<ModelRow>> {
        self.run_blocking(move |conn| {
            let row = conn
                .query_row(
                    r#"
                    SELECT id, model_name, video_path, audio_path, voice_id, created_at
                    FROM models
                    WHERE id = ?1
                    "#,
                    params![id],
                    model_from_row,
                )
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn remove_model(&self, id: i64) -> AppResult<bool> {
        self.run_blocking(move |conn| {
            let changed = conn.execute("DELETE FROM models WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
    }
}

#[async_trait]
impl VoiceRegistry for SqliteRegistry {
    async fn insert_voice(&self, voice: NewVoiceProfile) -> AppResult<i64> {
        self.run_blocking(move |conn| {
            conn.execute(
                r#"
                INSERT INTO voices (origin_audio_path, lang, asr_format_audio_url, reference_audio_text, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    voice.origin_audio_path,
                    voice.lang,
                    voice.asr_format_audio_url,
                    voice.reference_audio_text,
                    Utc::now()
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn select_voice(&self, id: i64) -> AppResult<Option<VoiceProfile>> {
        self.run_blocking(move |conn| {
            let row = conn
                .query_row(
                    r#"
                    SELECT id, origin_audio_path, lang, asr_format_audio_url, reference_audio_text, created_at
                    FROM voices
                    WHERE id = ?1
                    "#,
                    params![id],
                    voice_from_row,
                )
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn select_all_voices(&self) -> AppResult<Vec<VoiceProfile>> {
        self.run_blocking(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, origin_audio_path, lang, asr_format_audio_url, reference_audio_text, created_at
                FROM voices
                ORDER BY id ASC
                "#,
            )?;
            let rows = stmt.query_map([], voice_from_row)?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
    }
}
