//! Album lifecycle service.

use crate::error::{CatalogError, Result};
use crate::models::{Album, AlbumId};
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::info;

pub struct AlbumService {
    repo: Arc<dyn Repository<Album>>,
}

impl AlbumService {
    pub fn new(repo: Arc<dyn Repository<Album>>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, album: Album) -> Result<Album> {
        album.validate().map_err(CatalogError::invalid)?;

        let mut album = album;
        album.version = 0;
        let album = self.repo.save(&album).await?;

        info!(id = %album.id, title = %album.title, "created album");
        Ok(album)
    }

    pub async fn list(&self) -> Result<Vec<Album>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: AlbumId) -> Result<Album> {
        require(self.repo.as_ref(), id).await
    }

    /// Update an album. The entity is persisted as given, relation views
    /// included, so callers changing scalar fields should start from [`get`]
    /// to carry the current links through.
    ///
    /// [`get`]: Self::get
    pub async fn update(&self, id: AlbumId, album: Album) -> Result<Album> {
        let current = require(self.repo.as_ref(), id).await?;

        let mut album = album;
        album.id = id;
        if album.version == 0 {
            album.version = current.version;
        }
        album.validate().map_err(CatalogError::invalid)?;

        self.repo.save(&album).await
    }

    /// Delete an album. Refused while the album still has artists, songs or
    /// genres attached; those links must be removed first.
    pub async fn delete(&self, id: AlbumId) -> Result<()> {
        let album = require(self.repo.as_ref(), id).await?;

        if !album.artists.is_empty() {
            return Err(CatalogError::invalid(
                "Cannot delete an album that still has artists",
            ));
        }
        if !album.songs.is_empty() {
            return Err(CatalogError::invalid(
                "Cannot delete an album that still has songs",
            ));
        }
        if !album.genres.is_empty() {
            return Err(CatalogError::invalid(
                "Cannot delete an album that still has genres",
            ));
        }

        self.repo.delete_by_id(id).await?;
        info!(id = %id, "deleted album");
        Ok(())
    }
}
