//! Theme repository implementation

use crate::error::{CatalogError, Result};
use crate::models::{Entity, PodcastId, Theme, ThemeId};
use crate::repositories::Repository;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[derive(sqlx::FromRow)]
struct ThemeRow {
    id: ThemeId,
    name: String,
    version: i64,
}

/// SQLite-backed storage for podcast themes.
pub struct SqliteThemeRepository {
    pool: SqlitePool,
}

impl SqliteThemeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: ThemeRow) -> Result<Theme> {
        let podcasts: Vec<(PodcastId,)> =
            query_as("SELECT podcast_id FROM podcast_themes WHERE theme_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Theme {
            id: row.id,
            name: row.name,
            podcasts: podcasts.into_iter().map(|(id,)| id).collect(),
            version: row.version,
        })
    }
}

#[async_trait]
impl Repository<Theme> for SqliteThemeRepository {
    async fn find_by_id(&self, id: ThemeId) -> Result<Option<Theme>> {
        let row = query_as::<_, ThemeRow>("SELECT id, name, version FROM themes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Theme>> {
        let rows = query_as::<_, ThemeRow>("SELECT id, name, version FROM themes")
            .fetch_all(&self.pool)
            .await?;

        let mut themes = Vec::with_capacity(rows.len());
        for row in rows {
            themes.push(self.hydrate(row).await?);
        }

        Ok(themes)
    }

    async fn save(&self, theme: &Theme) -> Result<Theme> {
        let mut tx = self.pool.begin().await?;

        let version = if theme.version == 0 {
            query("INSERT INTO themes (id, name, version) VALUES (?, ?, 1)")
                .bind(theme.id)
                .bind(&theme.name)
                .execute(&mut *tx)
                .await?;
            1
        } else {
            let result =
                query("UPDATE themes SET name = ?, version = version + 1 WHERE id = ? AND version = ?")
                    .bind(&theme.name)
                    .bind(theme.id)
                    .bind(theme.version)
                    .execute(&mut *tx)
                    .await?;

            if result.rows_affected() == 0 {
                let exists: (i64,) = query_as("SELECT COUNT(*) FROM themes WHERE id = ?")
                    .bind(theme.id)
                    .fetch_one(&mut *tx)
                    .await?;

                return Err(if exists.0 > 0 {
                    CatalogError::Conflict {
                        kind: Theme::KIND,
                        id: theme.id.to_string(),
                    }
                } else {
                    CatalogError::NotFound {
                        kind: Theme::KIND,
                        id: theme.id.to_string(),
                    }
                });
            }
            theme.version + 1
        };

        query("DELETE FROM podcast_themes WHERE theme_id = ?")
            .bind(theme.id)
            .execute(&mut *tx)
            .await?;
        for podcast_id in &theme.podcasts {
            query("INSERT INTO podcast_themes (podcast_id, theme_id) VALUES (?, ?)")
                .bind(*podcast_id)
                .bind(theme.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let mut saved = theme.clone();
        saved.version = version;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: ThemeId) -> Result<bool> {
        let result = query("DELETE FROM themes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
