//! Episode lifecycle service.
//!
//! Episodes are created unowned; assignment to a podcast goes through
//! [`crate::services::podcast_episode::PodcastEpisodeService`].

use crate::error::{CatalogError, Result};
use crate::models::{Episode, EpisodeId};
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::info;

pub struct EpisodeService {
    repo: Arc<dyn Repository<Episode>>,
}

impl EpisodeService {
    pub fn new(repo: Arc<dyn Repository<Episode>>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, episode: Episode) -> Result<Episode> {
        episode.validate().map_err(CatalogError::invalid)?;

        let mut episode = episode;
        episode.version = 0;
        let episode = self.repo.save(&episode).await?;

        info!(id = %episode.id, title = %episode.title, "created episode");
        Ok(episode)
    }

    pub async fn list(&self) -> Result<Vec<Episode>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: EpisodeId) -> Result<Episode> {
        require(self.repo.as_ref(), id).await
    }

    pub async fn update(&self, id: EpisodeId, episode: Episode) -> Result<Episode> {
        let current = require(self.repo.as_ref(), id).await?;

        let mut episode = episode;
        episode.id = id;
        if episode.version == 0 {
            episode.version = current.version;
        }
        episode.validate().map_err(CatalogError::invalid)?;

        self.repo.save(&episode).await
    }

    pub async fn delete(&self, id: EpisodeId) -> Result<()> {
        require(self.repo.as_ref(), id).await?;
        self.repo.delete_by_id(id).await?;
        info!(id = %id, "deleted episode");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::SqliteEpisodeRepository;
    use chrono::NaiveDate;

    fn service(pool: &sqlx::SqlitePool) -> EpisodeService {
        EpisodeService::new(Arc::new(SqliteEpisodeRepository::new(pool.clone())))
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 10, 3).unwrap()
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);

        let created = service.create(Episode::new("Capitulo 1", date())).await.unwrap();
        assert_eq!(created.podcast, None);

        let mut changed = service.get(created.id).await.unwrap();
        changed.duration_secs = 1800;
        let updated = service.update(created.id, changed).await.unwrap();
        assert_eq!(updated.duration_secs, 1800);

        service.delete(created.id).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);

        let result = service.create(Episode::new("  ", date())).await;
        assert!(matches!(result, Err(CatalogError::InvalidOperation(_))));
    }
}
