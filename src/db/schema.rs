//! Relational layout of the two tables the pipeline queries.

use sqlx::PgPool;

pub const CREATE_TABLES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS videos (
    id               TEXT PRIMARY KEY,
    creator_id       TEXT NOT NULL,
    video_created_at TIMESTAMPTZ NOT NULL,
    views_count      BIGINT NOT NULL DEFAULT 0,
    likes_count      BIGINT NOT NULL DEFAULT 0,
    comments_count   BIGINT NOT NULL DEFAULT 0,
    reports_count    BIGINT NOT NULL DEFAULT 0,
    created_at       TIMESTAMPTZ NOT NULL,
    updated_at       TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS video_snapshots (
    id                   TEXT PRIMARY KEY,
    video_id             TEXT NOT NULL REFERENCES videos(id),
    views_count          BIGINT NOT NULL DEFAULT 0,
    likes_count          BIGINT NOT NULL DEFAULT 0,
    comments_count       BIGINT NOT NULL DEFAULT 0,
    reports_count        BIGINT NOT NULL DEFAULT 0,
    delta_views_count    BIGINT NOT NULL DEFAULT 0,
    delta_likes_count    BIGINT NOT NULL DEFAULT 0,
    delta_comments_count BIGINT NOT NULL DEFAULT 0,
    delta_reports_count  BIGINT NOT NULL DEFAULT 0,
    created_at           TIMESTAMPTZ NOT NULL,
    updated_at           TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_videos_creator ON videos (creator_id);
CREATE INDEX IF NOT EXISTS idx_snapshots_video ON video_snapshots (video_id);
CREATE INDEX IF NOT EXISTS idx_snapshots_created_at ON video_snapshots (created_at);
"#;

/// Create both tables and their indexes if absent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(CREATE_TABLES_SQL).execute(pool).await?;
    Ok(())
}
