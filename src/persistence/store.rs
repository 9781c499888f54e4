//! SQLite-based record store

use crate::core::{LogRecord, OrchidError, Result, RunStatus};
use crate::persistence::RecordBackend;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

/// SQLite record store
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open (or create) the database at the given path
    pub async fn open(db_path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Private in-memory database, one connection so every query sees it
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS logs (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                job_id TEXT NOT NULL,
                status TEXT NOT NULL,
                start_time TEXT,
                end_time TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_logs_job_id ON logs(job_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Convert DateTime<Utc> to NaiveDateTime for SQLite
    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    /// Convert NaiveDateTime to DateTime<Utc>
    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn from_row(row: &SqliteRow) -> Result<LogRecord> {
        Ok(LogRecord {
            id: row.try_get("id")?,
            job_id: row.try_get("job_id")?,
            status: RunStatus::from_str(&row.try_get::<String, _>("status")?)?,
            start_time: row
                .try_get::<Option<NaiveDateTime>, _>("start_time")?
                .map(Self::from_naive),
            end_time: row
                .try_get::<Option<NaiveDateTime>, _>("end_time")?
                .map(Self::from_naive),
        })
    }
}

#[async_trait::async_trait]
impl RecordBackend for SqliteRecordStore {
    async fn insert(&self, record: &LogRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO logs (id, job_id, status, start_time, end_time)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&record.id)
        .bind(&record.job_id)
        .bind(record.status.as_str())
        .bind(record.start_time.map(Self::to_naive))
        .bind(record.end_time.map(Self::to_naive))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                OrchidError::Storage(format!("Log id collision: {}", record.id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, record: &LogRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE logs
            SET status = ?2, start_time = ?3, end_time = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&record.id)
        .bind(record.status.as_str())
        .bind(record.start_time.map(Self::to_naive))
        .bind(record.end_time.map(Self::to_naive))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OrchidError::Storage(format!(
                "Cannot update unknown log {}",
                record.id
            )));
        }

        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<LogRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, job_id, status, start_time, end_time
            FROM logs
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<LogRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, job_id, status, start_time, end_time
            FROM logs
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::from_row).collect()
    }
}
