//! Data loader
//!
//! One-shot import of a `videos.json` export into the two tables. Inserts
//! are idempotent: rows whose id already exists are skipped.

pub mod timestamp;

pub use timestamp::normalize_to_instant;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unrecognised timestamp '{0}'")]
    Timestamp(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
pub struct Dataset {
    pub videos: Vec<VideoRecord>,
}

#[derive(Debug, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub creator_id: String,
    pub video_created_at: String,
    pub views_count: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub reports_count: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub snapshots: Vec<SnapshotRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotRecord {
    pub id: String,
    pub video_id: String,
    pub views_count: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub reports_count: i64,
    pub delta_views_count: i64,
    pub delta_likes_count: i64,
    pub delta_comments_count: i64,
    pub delta_reports_count: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub videos_inserted: u64,
    pub videos_skipped: u64,
    pub snapshots_inserted: u64,
    pub snapshots_skipped: u64,
}

impl Dataset {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn snapshot_count(&self) -> usize {
        self.videos.iter().map(|v| v.snapshots.len()).sum()
    }
}

/// Optional timestamp that falls back to the load instant when missing.
fn instant_or(text: Option<&str>, fallback: DateTime<Utc>) -> Result<DateTime<Utc>, LoadError> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => normalize_to_instant(text),
        None => Ok(fallback),
    }
}

/// Insert every video and snapshot in one transaction.
pub async fn load_dataset(pool: &PgPool, dataset: &Dataset) -> Result<LoadReport, LoadError> {
    let now = Utc::now();
    let mut report = LoadReport::default();
    let mut tx = pool.begin().await?;

    for video in &dataset.videos {
        if insert_video(&mut tx, video, now).await? {
            report.videos_inserted += 1;
        } else {
            report.videos_skipped += 1;
        }

        for snapshot in &video.snapshots {
            if insert_snapshot(&mut tx, snapshot, now).await? {
                report.snapshots_inserted += 1;
            } else {
                report.snapshots_skipped += 1;
            }
        }
        debug!(video_id = %video.id, snapshots = video.snapshots.len(), "video loaded");
    }

    tx.commit().await?;
    info!(?report, "dataset loaded");
    Ok(report)
}

async fn insert_video(
    tx: &mut Transaction<'_, Postgres>,
    video: &VideoRecord,
    now: DateTime<Utc>,
) -> Result<bool, LoadError> {
    let result = sqlx::query(
        r#"
        INSERT INTO videos (
            id, creator_id, video_created_at, views_count, likes_count,
            comments_count, reports_count, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(&video.id)
    .bind(&video.creator_id)
    .bind(normalize_to_instant(&video.video_created_at)?)
    .bind(video.views_count)
    .bind(video.likes_count)
    .bind(video.comments_count)
    .bind(video.reports_count)
    .bind(instant_or(video.created_at.as_deref(), now)?)
    .bind(instant_or(video.updated_at.as_deref(), now)?)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() == 1)
}

async fn insert_snapshot(
    tx: &mut Transaction<'_, Postgres>,
    snapshot: &SnapshotRecord,
    now: DateTime<Utc>,
) -> Result<bool, LoadError> {
    let result = sqlx::query(
        r#"
        INSERT INTO video_snapshots (
            id, video_id, views_count, likes_count, comments_count, reports_count,
            delta_views_count, delta_likes_count, delta_comments_count, delta_reports_count,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(&snapshot.id)
    .bind(&snapshot.video_id)
    .bind(snapshot.views_count)
    .bind(snapshot.likes_count)
    .bind(snapshot.comments_count)
    .bind(snapshot.reports_count)
    .bind(snapshot.delta_views_count)
    .bind(snapshot.delta_likes_count)
    .bind(snapshot.delta_comments_count)
    .bind(snapshot.delta_reports_count)
    .bind(normalize_to_instant(&snapshot.created_at)?)
    .bind(instant_or(snapshot.updated_at.as_deref(), now)?)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() == 1)
}
