//! Playlist lifecycle service.

use crate::error::{CatalogError, Result};
use crate::models::{Playlist, PlaylistId};
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::info;

pub struct PlaylistService {
    repo: Arc<dyn Repository<Playlist>>,
}

impl PlaylistService {
    pub fn new(repo: Arc<dyn Repository<Playlist>>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, playlist: Playlist) -> Result<Playlist> {
        if playlist.name.trim().is_empty() {
            return Err(CatalogError::invalid("Playlist name cannot be empty"));
        }

        let mut playlist = playlist;
        playlist.version = 0;
        let playlist = self.repo.save(&playlist).await?;

        info!(id = %playlist.id, name = %playlist.name, "created playlist");
        Ok(playlist)
    }

    pub async fn list(&self) -> Result<Vec<Playlist>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: PlaylistId) -> Result<Playlist> {
        require(self.repo.as_ref(), id).await
    }

    pub async fn update(&self, id: PlaylistId, playlist: Playlist) -> Result<Playlist> {
        let current = require(self.repo.as_ref(), id).await?;

        let mut playlist = playlist;
        playlist.id = id;
        if playlist.version == 0 {
            playlist.version = current.version;
        }

        self.repo.save(&playlist).await
    }

    /// Delete a playlist. The songs it references are untouched.
    pub async fn delete(&self, id: PlaylistId) -> Result<()> {
        require(self.repo.as_ref(), id).await?;
        self.repo.delete_by_id(id).await?;
        info!(id = %id, "deleted playlist");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::Song;
    use crate::repositories::{SqlitePlaylistRepository, SqliteSongRepository};
    use crate::services::links;
    use chrono::NaiveDate;

    fn service(pool: &sqlx::SqlitePool) -> PlaylistService {
        PlaylistService::new(Arc::new(SqlitePlaylistRepository::new(pool.clone())))
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 10, 3).unwrap()
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);

        let created = service.create(Playlist::new("Viaje", date())).await.unwrap();

        let mut changed = service.get(created.id).await.unwrap();
        changed.image = "portada.png".to_string();
        let updated = service.update(created.id, changed).await.unwrap();
        assert_eq!(updated.image, "portada.png");

        service.delete(created.id).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_playlist_leaves_songs_alone() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);
        let songs = SqliteSongRepository::new(pool.clone());

        let playlist = service.create(Playlist::new("Viaje", date())).await.unwrap();
        let song = songs.save(&Song::new("Carretera", 210)).await.unwrap();
        links::playlist_songs(&pool)
            .add(playlist.id, song.id)
            .await
            .unwrap();

        service.delete(playlist.id).await.unwrap();
        assert!(songs.find_by_id(song.id).await.unwrap().is_some());
    }
}
