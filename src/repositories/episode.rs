//! Episode repository implementation

use crate::error::{CatalogError, Result};
use crate::models::{Entity, Episode, EpisodeId, PodcastId};
use crate::repositories::Repository;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{query, query_as, SqlitePool};

#[derive(sqlx::FromRow)]
struct EpisodeRow {
    id: EpisodeId,
    title: String,
    image: String,
    duration_secs: i64,
    published_on: NaiveDate,
    podcast_id: Option<PodcastId>,
    version: i64,
}

/// SQLite-backed storage for episodes. The owner slot is a plain column.
pub struct SqliteEpisodeRepository {
    pool: SqlitePool,
}

impl SqliteEpisodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl From<EpisodeRow> for Episode {
    fn from(row: EpisodeRow) -> Self {
        Episode {
            id: row.id,
            title: row.title,
            image: row.image,
            duration_secs: row.duration_secs,
            published_on: row.published_on,
            podcast: row.podcast_id,
            version: row.version,
        }
    }
}

#[async_trait]
impl Repository<Episode> for SqliteEpisodeRepository {
    async fn find_by_id(&self, id: EpisodeId) -> Result<Option<Episode>> {
        let row = query_as::<_, EpisodeRow>(
            "SELECT id, title, image, duration_secs, published_on, podcast_id, version \
             FROM episodes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Episode::from))
    }

    async fn find_all(&self) -> Result<Vec<Episode>> {
        let rows = query_as::<_, EpisodeRow>(
            "SELECT id, title, image, duration_secs, published_on, podcast_id, version \
             FROM episodes",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Episode::from).collect())
    }

    async fn save(&self, episode: &Episode) -> Result<Episode> {
        let version = if episode.version == 0 {
            query(
                "INSERT INTO episodes \
                 (id, title, image, duration_secs, published_on, podcast_id, version) \
                 VALUES (?, ?, ?, ?, ?, ?, 1)",
            )
            .bind(episode.id)
            .bind(&episode.title)
            .bind(&episode.image)
            .bind(episode.duration_secs)
            .bind(episode.published_on)
            .bind(episode.podcast)
            .execute(&self.pool)
            .await?;
            1
        } else {
            let result = query(
                "UPDATE episodes SET title = ?, image = ?, duration_secs = ?, \
                 published_on = ?, podcast_id = ?, version = version + 1 \
                 WHERE id = ? AND version = ?",
            )
            .bind(&episode.title)
            .bind(&episode.image)
            .bind(episode.duration_secs)
            .bind(episode.published_on)
            .bind(episode.podcast)
            .bind(episode.id)
            .bind(episode.version)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                let exists: (i64,) = query_as("SELECT COUNT(*) FROM episodes WHERE id = ?")
                    .bind(episode.id)
                    .fetch_one(&self.pool)
                    .await?;

                return Err(if exists.0 > 0 {
                    CatalogError::Conflict {
                        kind: Episode::KIND,
                        id: episode.id.to_string(),
                    }
                } else {
                    CatalogError::NotFound {
                        kind: Episode::KIND,
                        id: episode.id.to_string(),
                    }
                });
            }
            episode.version + 1
        };

        let mut saved = episode.clone();
        saved.version = version;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: EpisodeId) -> Result<bool> {
        let result = query("DELETE FROM episodes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
