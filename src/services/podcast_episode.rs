//! Podcast-episode ownership service.
//!
//! Episodes belong to at most one podcast, so this relation does not fit the
//! generic association component: adding claims the episode's owner slot, and
//! `replace_all` really replaces, deleting the episodes it detaches instead
//! of leaving them orphaned.

use crate::error::{CatalogError, Result};
use crate::models::{Episode, EpisodeId, Podcast, PodcastId};
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::{debug, info};

pub struct PodcastEpisodeService {
    podcasts: Arc<dyn Repository<Podcast>>,
    episodes: Arc<dyn Repository<Episode>>,
}

impl PodcastEpisodeService {
    pub fn new(
        podcasts: Arc<dyn Repository<Podcast>>,
        episodes: Arc<dyn Repository<Episode>>,
    ) -> Self {
        Self { podcasts, episodes }
    }

    async fn check_title_unique(&self, podcast: &Podcast, episode: &Episode) -> Result<()> {
        for id in &podcast.episodes {
            if *id == episode.id {
                continue;
            }
            let member = require(self.episodes.as_ref(), *id).await?;
            if member.title == episode.title {
                return Err(CatalogError::invalid(format!(
                    "episode '{}' already exists in podcast",
                    episode.title
                )));
            }
        }
        Ok(())
    }

    /// Assign an existing episode to a podcast.
    ///
    /// Episode titles are unique within a podcast. An episode already owned
    /// elsewhere is re-assigned; its previous podcast loses it.
    pub async fn add(&self, podcast_id: PodcastId, episode_id: EpisodeId) -> Result<Episode> {
        let mut episode = require(self.episodes.as_ref(), episode_id).await?;
        let mut podcast = require(self.podcasts.as_ref(), podcast_id).await?;

        self.check_title_unique(&podcast, &episode).await?;

        podcast.episodes.insert(episode_id);
        episode.podcast = Some(podcast_id);
        self.podcasts.save(&podcast).await?;
        let episode = self.episodes.save(&episode).await?;

        debug!(podcast = %podcast_id, episode = %episode_id, "assigned episode");
        Ok(episode)
    }

    /// All episodes the podcast owns.
    pub async fn get_all(&self, podcast_id: PodcastId) -> Result<Vec<Episode>> {
        let podcast = require(self.podcasts.as_ref(), podcast_id).await?;

        let mut members = Vec::new();
        for id in &podcast.episodes {
            members.push(require(self.episodes.as_ref(), *id).await?);
        }

        Ok(members)
    }

    /// A single owned episode. Fails with `InvalidOperation` if both exist
    /// but the podcast does not own the episode.
    pub async fn get_one(&self, podcast_id: PodcastId, episode_id: EpisodeId) -> Result<Episode> {
        let podcast = require(self.podcasts.as_ref(), podcast_id).await?;
        let episode = require(self.episodes.as_ref(), episode_id).await?;

        if podcast.episodes.contains(&episode_id) {
            return Ok(episode);
        }

        Err(CatalogError::invalid(
            "The episode is not part of the podcast",
        ))
    }

    /// Replace the podcast's episode set.
    ///
    /// Every requested id must exist and titles must be distinct within the
    /// request. Episodes detached by the replacement are deleted, not
    /// orphaned; episodes in the payload are claimed, even away from another
    /// podcast.
    pub async fn replace_all(
        &self,
        podcast_id: PodcastId,
        episode_ids: &[EpisodeId],
    ) -> Result<Vec<Episode>> {
        let podcast = require(self.podcasts.as_ref(), podcast_id).await?;

        let mut titles = std::collections::HashSet::new();
        for &id in episode_ids {
            let episode = require(self.episodes.as_ref(), id).await?;
            if !titles.insert(episode.title) {
                return Err(CatalogError::invalid(
                    "The episode list contains duplicate titles",
                ));
            }
        }

        let detached: Vec<EpisodeId> = podcast
            .episodes
            .iter()
            .filter(|id| !episode_ids.contains(id))
            .copied()
            .collect();

        let mut podcast = podcast;
        podcast.episodes = episode_ids.iter().copied().collect();
        self.podcasts.save(&podcast).await?;

        for id in detached {
            self.episodes.delete_by_id(id).await?;
            info!(podcast = %podcast_id, episode = %id, "deleted detached episode");
        }

        self.get_all(podcast_id).await
    }

    /// Remove an episode from its podcast. The episode survives, unowned.
    pub async fn remove(&self, podcast_id: PodcastId, episode_id: EpisodeId) -> Result<()> {
        let mut podcast = require(self.podcasts.as_ref(), podcast_id).await?;
        let mut episode = require(self.episodes.as_ref(), episode_id).await?;

        podcast.episodes.remove(&episode_id);
        if episode.podcast == Some(podcast_id) {
            episode.podcast = None;
        }
        self.podcasts.save(&podcast).await?;
        self.episodes.save(&episode).await?;

        debug!(podcast = %podcast_id, episode = %episode_id, "detached episode");
        Ok(())
    }

    /// The podcast that owns an episode, if any.
    pub async fn owner_of(&self, episode_id: EpisodeId) -> Result<Option<Podcast>> {
        let episode = require(self.episodes.as_ref(), episode_id).await?;

        match episode.podcast {
            Some(podcast_id) => Ok(Some(require(self.podcasts.as_ref(), podcast_id).await?)),
            None => Ok(None),
        }
    }

    /// Assign an owner from the episode side.
    pub async fn assign_owner(&self, episode_id: EpisodeId, podcast_id: PodcastId) -> Result<Episode> {
        self.add(podcast_id, episode_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::{SqliteEpisodeRepository, SqlitePodcastRepository};
    use chrono::NaiveDate;
    use sqlx::SqlitePool;

    fn service(pool: &SqlitePool) -> PodcastEpisodeService {
        PodcastEpisodeService::new(
            Arc::new(SqlitePodcastRepository::new(pool.clone())),
            Arc::new(SqliteEpisodeRepository::new(pool.clone())),
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 10, 3).unwrap()
    }

    async fn seed(pool: &SqlitePool, podcast: &str, episode: &str) -> (Podcast, Episode) {
        let podcasts = SqlitePodcastRepository::new(pool.clone());
        let episodes = SqliteEpisodeRepository::new(pool.clone());
        let podcast = podcasts.save(&Podcast::new(podcast, 0.0)).await.unwrap();
        let episode = episodes.save(&Episode::new(episode, date())).await.unwrap();
        (podcast, episode)
    }

    #[tokio::test]
    async fn test_add_claims_the_owner_slot() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);
        let (podcast, episode) = seed(&pool, "Historias", "Capitulo 1").await;

        let added = service.add(podcast.id, episode.id).await.unwrap();
        assert_eq!(added.podcast, Some(podcast.id));

        let owner = service.owner_of(episode.id).await.unwrap().unwrap();
        assert_eq!(owner.id, podcast.id);

        let fetched = service.get_one(podcast.id, episode.id).await.unwrap();
        assert_eq!(fetched.id, episode.id);
    }

    #[tokio::test]
    async fn test_duplicate_title_in_podcast_is_rejected() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);
        let episodes = SqliteEpisodeRepository::new(pool.clone());
        let (podcast, episode) = seed(&pool, "Historias", "Capitulo 1").await;

        service.add(podcast.id, episode.id).await.unwrap();

        let clash = episodes.save(&Episode::new("Capitulo 1", date())).await.unwrap();
        let result = service.add(podcast.id, clash.id).await;
        assert!(matches!(result, Err(CatalogError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_adding_to_a_second_podcast_moves_the_episode() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);
        let podcasts = SqlitePodcastRepository::new(pool.clone());
        let (first, episode) = seed(&pool, "Primero", "Capitulo 1").await;
        let second = podcasts.save(&Podcast::new("Segundo", 0.0)).await.unwrap();

        service.add(first.id, episode.id).await.unwrap();
        service.assign_owner(episode.id, second.id).await.unwrap();

        assert!(service.get_all(first.id).await.unwrap().is_empty());
        let owner = service.owner_of(episode.id).await.unwrap().unwrap();
        assert_eq!(owner.id, second.id);
    }

    #[tokio::test]
    async fn test_replace_all_deletes_detached_episodes() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);
        let episodes = SqliteEpisodeRepository::new(pool.clone());
        let (podcast, old) = seed(&pool, "Historias", "Viejo").await;

        service.add(podcast.id, old.id).await.unwrap();

        let kept = episodes.save(&Episode::new("Nuevo", date())).await.unwrap();
        let result = service.replace_all(podcast.id, &[kept.id]).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, kept.id);
        assert!(episodes.find_by_id(old.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_all_rejects_duplicate_titles_in_the_request() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);
        let episodes = SqliteEpisodeRepository::new(pool.clone());
        let (podcast, first) = seed(&pool, "Historias", "Repetido").await;
        let twin = episodes.save(&Episode::new("Repetido", date())).await.unwrap();

        let result = service.replace_all(podcast.id, &[first.id, twin.id]).await;
        assert!(matches!(result, Err(CatalogError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_replace_all_with_unknown_id_changes_nothing() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);
        let (podcast, episode) = seed(&pool, "Historias", "Capitulo 1").await;

        service.add(podcast.id, episode.id).await.unwrap();

        let result = service.replace_all(podcast.id, &[EpisodeId::new()]).await;
        assert!(matches!(result, Err(CatalogError::NotFound { .. })));
        assert_eq!(service.get_all(podcast.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_detaches_without_deleting() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);
        let episodes = SqliteEpisodeRepository::new(pool.clone());
        let (podcast, episode) = seed(&pool, "Historias", "Capitulo 1").await;

        service.add(podcast.id, episode.id).await.unwrap();
        service.remove(podcast.id, episode.id).await.unwrap();

        assert!(service.get_all(podcast.id).await.unwrap().is_empty());
        let detached = episodes.find_by_id(episode.id).await.unwrap().unwrap();
        assert_eq!(detached.podcast, None);
    }
}
