//! Song lifecycle service.

use crate::error::{CatalogError, Result};
use crate::models::{Song, SongId};
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::info;

pub struct SongService {
    repo: Arc<dyn Repository<Song>>,
}

impl SongService {
    pub fn new(repo: Arc<dyn Repository<Song>>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, song: Song) -> Result<Song> {
        song.validate().map_err(CatalogError::invalid)?;

        let mut song = song;
        song.version = 0;
        let song = self.repo.save(&song).await?;

        info!(id = %song.id, title = %song.title, "created song");
        Ok(song)
    }

    pub async fn list(&self) -> Result<Vec<Song>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: SongId) -> Result<Song> {
        require(self.repo.as_ref(), id).await
    }

    pub async fn update(&self, id: SongId, song: Song) -> Result<Song> {
        let current = require(self.repo.as_ref(), id).await?;

        let mut song = song;
        song.id = id;
        if song.version == 0 {
            song.version = current.version;
        }
        song.validate().map_err(CatalogError::invalid)?;

        self.repo.save(&song).await
    }

    /// Delete a song. Album and playlist edges are dropped with the row.
    pub async fn delete(&self, id: SongId) -> Result<()> {
        require(self.repo.as_ref(), id).await?;
        self.repo.delete_by_id(id).await?;
        info!(id = %id, "deleted song");
        Ok(())
    }
}
