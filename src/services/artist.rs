//! Artist lifecycle service.

use crate::error::{CatalogError, Result};
use crate::models::{Artist, ArtistId};
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::info;

pub struct ArtistService {
    repo: Arc<dyn Repository<Artist>>,
}

impl ArtistService {
    pub fn new(repo: Arc<dyn Repository<Artist>>) -> Self {
        Self { repo }
    }

    /// Register a new artist. Names are unique across the catalog.
    pub async fn create(&self, artist: Artist) -> Result<Artist> {
        artist.validate().map_err(CatalogError::invalid)?;

        let existing = self.repo.find_all().await?;
        if existing.iter().any(|a| a.name == artist.name) {
            return Err(CatalogError::invalid("Artist already exists."));
        }

        let mut artist = artist;
        artist.version = 0;
        let artist = self.repo.save(&artist).await?;

        info!(id = %artist.id, name = %artist.name, "created artist");
        Ok(artist)
    }

    pub async fn list(&self) -> Result<Vec<Artist>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: ArtistId) -> Result<Artist> {
        require(self.repo.as_ref(), id).await
    }

    pub async fn update(&self, id: ArtistId, artist: Artist) -> Result<Artist> {
        let current = require(self.repo.as_ref(), id).await?;

        let mut artist = artist;
        artist.id = id;
        if artist.version == 0 {
            artist.version = current.version;
        }
        artist.validate().map_err(CatalogError::invalid)?;

        self.repo.save(&artist).await
    }

    pub async fn delete(&self, id: ArtistId) -> Result<()> {
        require(self.repo.as_ref(), id).await?;
        self.repo.delete_by_id(id).await?;
        info!(id = %id, "deleted artist");
        Ok(())
    }
}
