use crate::{
    domain::{Study, StudyId, Tag},
    error::{ConsoleError, Result},
    storage::{OrderKeyStore, Storage},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::{path::Path, str::FromStr};
use tokio::sync::Mutex;

const STUDY_COLUMNS: &str = "id, title, subtitle, sort_order, tags, image, content, \
                             is_premium, view_count, created_at, updated_at";

/// SQLite-based storage backend for studies
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (or creates) a database file
    pub fn open(database_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(database_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn parse_timestamp(column: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn row_to_study(row: &Row<'_>) -> rusqlite::Result<Study> {
    let id: String = row.get(0)?;
    let id = StudyId::from_str(&id).map_err(|e| conversion_error(0, e))?;
    let tags: String = row.get(4)?;
    let tags: Vec<Tag> = serde_json::from_str(&tags).map_err(|e| conversion_error(4, e))?;
    let view_count: i64 = row.get(8)?;

    Ok(Study {
        id,
        title: row.get(1)?,
        subtitle: row.get(2)?,
        order: row.get(3)?,
        tags,
        image: row.get(5)?,
        content: row.get(6)?,
        is_premium: row.get(7)?,
        view_count: view_count.max(0) as u64,
        created_at: parse_timestamp(9, row.get(9)?)?,
        updated_at: parse_timestamp(10, row.get(10)?)?,
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS studies (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                subtitle TEXT,
                sort_order REAL NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                image TEXT,
                content TEXT,
                is_premium INTEGER NOT NULL DEFAULT 0,
                view_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_studies_sort_order ON studies (sort_order);",
        )?;
        Ok(())
    }

    async fn save_study(&self, study: &Study) -> Result<()> {
        let tags = serde_json::to_string(&study.tags)?;
        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO studies ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                STUDY_COLUMNS
            ),
            params![
                study.id.to_string(),
                study.title,
                study.subtitle,
                study.order,
                tags,
                study.image,
                study.content,
                study.is_premium,
                study.view_count as i64,
                study.created_at.to_rfc3339(),
                study.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn load_study(&self, id: &StudyId) -> Result<Study> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {} FROM studies WHERE id = ?1", STUDY_COLUMNS),
            params![id.to_string()],
            row_to_study,
        )
        .optional()?
        .ok_or_else(|| ConsoleError::StudyNotFound(id.to_string()))
    }

    async fn list_studies(&self) -> Result<Vec<Study>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM studies ORDER BY sort_order ASC, id ASC",
            STUDY_COLUMNS
        ))?;
        let studies = stmt
            .query_map([], row_to_study)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(studies)
    }

    async fn search_studies(&self, query: &str) -> Result<Vec<Study>> {
        let studies = self.list_studies().await?;
        Ok(studies.into_iter().filter(|s| s.matches(query)).collect())
    }

    async fn delete_study(&self, id: &StudyId) -> Result<()> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute(
            "DELETE FROM studies WHERE id = ?1",
            params![id.to_string()],
        )?;
        if deleted == 0 {
            return Err(ConsoleError::StudyNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn next_order(&self, head_key: f64) -> Result<f64> {
        let conn = self.conn.lock().await;
        let max: Option<f64> =
            conn.query_row("SELECT MAX(sort_order) FROM studies", [], |row| row.get(0))?;
        Ok(max.map_or(head_key, |max| max + 1.0))
    }

    async fn is_initialized(&self) -> bool {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'studies'",
            [],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count > 0)
        .unwrap_or(false)
    }
}

#[async_trait]
impl OrderKeyStore<StudyId> for SqliteStorage {
    async fn update_order_key(&self, id: &StudyId, key: f64) -> Result<()> {
        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE studies SET sort_order = ?1, updated_at = ?2 WHERE id = ?3",
            params![key, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if updated == 0 {
            return Err(ConsoleError::StudyNotFound(id.to_string()));
        }
        Ok(())
    }
}
