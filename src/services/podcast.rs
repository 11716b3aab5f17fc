//! Podcast lifecycle service.

use crate::error::{CatalogError, Result};
use crate::models::{Episode, Podcast, PodcastId};
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::info;

pub struct PodcastService {
    repo: Arc<dyn Repository<Podcast>>,
    episodes: Arc<dyn Repository<Episode>>,
}

impl PodcastService {
    pub fn new(
        repo: Arc<dyn Repository<Podcast>>,
        episodes: Arc<dyn Repository<Episode>>,
    ) -> Self {
        Self { repo, episodes }
    }

    pub async fn create(&self, podcast: Podcast) -> Result<Podcast> {
        podcast.validate().map_err(CatalogError::invalid)?;

        let mut podcast = podcast;
        podcast.version = 0;
        let podcast = self.repo.save(&podcast).await?;

        info!(id = %podcast.id, title = %podcast.title, "created podcast");
        Ok(podcast)
    }

    pub async fn list(&self) -> Result<Vec<Podcast>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: PodcastId) -> Result<Podcast> {
        require(self.repo.as_ref(), id).await
    }

    pub async fn update(&self, id: PodcastId, podcast: Podcast) -> Result<Podcast> {
        let current = require(self.repo.as_ref(), id).await?;

        let mut podcast = podcast;
        podcast.id = id;
        if podcast.version == 0 {
            podcast.version = current.version;
        }
        podcast.validate().map_err(CatalogError::invalid)?;

        self.repo.save(&podcast).await
    }

    /// Delete a podcast together with the episodes it owns. Creator and
    /// theme edges are dropped with the row.
    pub async fn delete(&self, id: PodcastId) -> Result<()> {
        let podcast = require(self.repo.as_ref(), id).await?;

        for episode_id in &podcast.episodes {
            self.episodes.delete_by_id(*episode_id).await?;
        }
        self.repo.delete_by_id(id).await?;

        info!(id = %id, episodes = podcast.episodes.len(), "deleted podcast");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::{SqliteEpisodeRepository, SqlitePodcastRepository};
    use chrono::NaiveDate;

    fn service(pool: &sqlx::SqlitePool) -> PodcastService {
        PodcastService::new(
            Arc::new(SqlitePodcastRepository::new(pool.clone())),
            Arc::new(SqliteEpisodeRepository::new(pool.clone())),
        )
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);

        let mut podcast = Podcast::new("Historias", 4.99);
        podcast.rating = "9.1".to_string();
        let created = service.create(podcast).await.unwrap();

        let mut changed = service.get(created.id).await.unwrap();
        changed.description = "Crónicas habladas".to_string();
        let updated = service.update(created.id, changed).await.unwrap();
        assert_eq!(updated.description, "Crónicas habladas");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);

        let result = service.create(Podcast::new("", 0.0)).await;
        assert!(matches!(result, Err(CatalogError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_delete_takes_owned_episodes_along() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);
        let episodes = SqliteEpisodeRepository::new(pool.clone());

        let date = NaiveDate::from_ymd_opt(2022, 10, 3).unwrap();
        let episode = episodes.save(&Episode::new("Capitulo 1", date)).await.unwrap();
        let orphan = episodes.save(&Episode::new("Suelto", date)).await.unwrap();

        let podcast = service.create(Podcast::new("Corto", 0.0)).await.unwrap();
        let mut owning = service.get(podcast.id).await.unwrap();
        owning.episodes.insert(episode.id);
        service.update(podcast.id, owning).await.unwrap();

        service.delete(podcast.id).await.unwrap();

        assert!(episodes.find_by_id(episode.id).await.unwrap().is_none());
        // Unowned episodes are not swept.
        assert!(episodes.find_by_id(orphan.id).await.unwrap().is_some());
    }
}
