//! Podcast repository implementation

use crate::error::{CatalogError, Result};
use crate::models::{ArtistId, Entity, EpisodeId, Podcast, PodcastId, ThemeId};
use crate::repositories::Repository;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[derive(sqlx::FromRow)]
struct PodcastRow {
    id: PodcastId,
    title: String,
    rating: String,
    image: String,
    description: String,
    price: f64,
    version: i64,
}

/// SQLite-backed storage for podcasts.
///
/// Creators and themes live in edge tables; episode ownership is the
/// `podcast_id` column on episode rows, reasserted from the view on save and
/// cascade-deleted with the podcast.
pub struct SqlitePodcastRepository {
    pool: SqlitePool,
}

impl SqlitePodcastRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: PodcastRow) -> Result<Podcast> {
        let creators: Vec<(ArtistId,)> =
            query_as("SELECT artist_id FROM podcast_artists WHERE podcast_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        let episodes: Vec<(EpisodeId,)> =
            query_as("SELECT id FROM episodes WHERE podcast_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        let themes: Vec<(ThemeId,)> =
            query_as("SELECT theme_id FROM podcast_themes WHERE podcast_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Podcast {
            id: row.id,
            title: row.title,
            rating: row.rating,
            image: row.image,
            description: row.description,
            price: row.price,
            creators: creators.into_iter().map(|(id,)| id).collect(),
            episodes: episodes.into_iter().map(|(id,)| id).collect(),
            themes: themes.into_iter().map(|(id,)| id).collect(),
            version: row.version,
        })
    }
}

#[async_trait]
impl Repository<Podcast> for SqlitePodcastRepository {
    async fn find_by_id(&self, id: PodcastId) -> Result<Option<Podcast>> {
        let row = query_as::<_, PodcastRow>(
            "SELECT id, title, rating, image, description, price, version \
             FROM podcasts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Podcast>> {
        let rows = query_as::<_, PodcastRow>(
            "SELECT id, title, rating, image, description, price, version FROM podcasts",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut podcasts = Vec::with_capacity(rows.len());
        for row in rows {
            podcasts.push(self.hydrate(row).await?);
        }

        Ok(podcasts)
    }

    async fn save(&self, podcast: &Podcast) -> Result<Podcast> {
        let mut tx = self.pool.begin().await?;

        let version = if podcast.version == 0 {
            query(
                "INSERT INTO podcasts (id, title, rating, image, description, price, version) \
                 VALUES (?, ?, ?, ?, ?, ?, 1)",
            )
            .bind(podcast.id)
            .bind(&podcast.title)
            .bind(&podcast.rating)
            .bind(&podcast.image)
            .bind(&podcast.description)
            .bind(podcast.price)
            .execute(&mut *tx)
            .await?;
            1
        } else {
            let result = query(
                "UPDATE podcasts SET title = ?, rating = ?, image = ?, description = ?, \
                 price = ?, version = version + 1 WHERE id = ? AND version = ?",
            )
            .bind(&podcast.title)
            .bind(&podcast.rating)
            .bind(&podcast.image)
            .bind(&podcast.description)
            .bind(podcast.price)
            .bind(podcast.id)
            .bind(podcast.version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let exists: (i64,) = query_as("SELECT COUNT(*) FROM podcasts WHERE id = ?")
                    .bind(podcast.id)
                    .fetch_one(&mut *tx)
                    .await?;

                return Err(if exists.0 > 0 {
                    CatalogError::Conflict {
                        kind: Podcast::KIND,
                        id: podcast.id.to_string(),
                    }
                } else {
                    CatalogError::NotFound {
                        kind: Podcast::KIND,
                        id: podcast.id.to_string(),
                    }
                });
            }
            podcast.version + 1
        };

        query("DELETE FROM podcast_artists WHERE podcast_id = ?")
            .bind(podcast.id)
            .execute(&mut *tx)
            .await?;
        for artist_id in &podcast.creators {
            query("INSERT INTO podcast_artists (podcast_id, artist_id) VALUES (?, ?)")
                .bind(podcast.id)
                .bind(*artist_id)
                .execute(&mut *tx)
                .await?;
        }

        query("DELETE FROM podcast_themes WHERE podcast_id = ?")
            .bind(podcast.id)
            .execute(&mut *tx)
            .await?;
        for theme_id in &podcast.themes {
            query("INSERT INTO podcast_themes (podcast_id, theme_id) VALUES (?, ?)")
                .bind(podcast.id)
                .bind(*theme_id)
                .execute(&mut *tx)
                .await?;
        }

        // Detach episodes no longer in the view, then claim the members.
        query("UPDATE episodes SET podcast_id = NULL WHERE podcast_id = ?")
            .bind(podcast.id)
            .execute(&mut *tx)
            .await?;
        for episode_id in &podcast.episodes {
            query("UPDATE episodes SET podcast_id = ? WHERE id = ?")
                .bind(podcast.id)
                .bind(*episode_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let mut saved = podcast.clone();
        saved.version = version;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: PodcastId) -> Result<bool> {
        let result = query("DELETE FROM podcasts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::Episode;
    use crate::repositories::SqliteEpisodeRepository;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_podcast_episode_ownership_roundtrip() {
        let pool = create_test_pool().await.unwrap();
        let podcasts = SqlitePodcastRepository::new(pool.clone());
        let episodes = SqliteEpisodeRepository::new(pool);

        let date = NaiveDate::from_ymd_opt(2022, 10, 3).unwrap();
        let episode = episodes
            .save(&Episode::new("Capitulo 1", date))
            .await
            .unwrap();

        let mut podcast = Podcast::new("Historias", 4.99);
        podcast.episodes.insert(episode.id);
        podcasts.save(&podcast).await.unwrap();

        let owned = episodes.find_by_id(episode.id).await.unwrap().unwrap();
        assert_eq!(owned.podcast, Some(podcast.id));

        let found = podcasts.find_by_id(podcast.id).await.unwrap().unwrap();
        assert!(found.episodes.contains(&episode.id));
    }

    #[tokio::test]
    async fn test_deleting_podcast_cascades_to_episode_rows() {
        let pool = create_test_pool().await.unwrap();
        let podcasts = SqlitePodcastRepository::new(pool.clone());
        let episodes = SqliteEpisodeRepository::new(pool);

        let date = NaiveDate::from_ymd_opt(2022, 10, 3).unwrap();
        let episode = episodes
            .save(&Episode::new("Capitulo unico", date))
            .await
            .unwrap();

        let mut podcast = Podcast::new("Corto", 0.0);
        podcast.episodes.insert(episode.id);
        podcasts.save(&podcast).await.unwrap();

        assert!(podcasts.delete_by_id(podcast.id).await.unwrap());
        assert!(episodes.find_by_id(episode.id).await.unwrap().is_none());
    }
}
