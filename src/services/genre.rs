//! Genre lifecycle service.

use crate::error::{CatalogError, Result};
use crate::models::{Genre, GenreId};
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::info;

pub struct GenreService {
    repo: Arc<dyn Repository<Genre>>,
}

impl GenreService {
    pub fn new(repo: Arc<dyn Repository<Genre>>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, genre: Genre) -> Result<Genre> {
        if genre.name.trim().is_empty() {
            return Err(CatalogError::invalid("Genre name cannot be empty"));
        }

        let mut genre = genre;
        genre.version = 0;
        let genre = self.repo.save(&genre).await?;

        info!(id = %genre.id, name = %genre.name, "created genre");
        Ok(genre)
    }

    pub async fn list(&self) -> Result<Vec<Genre>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: GenreId) -> Result<Genre> {
        require(self.repo.as_ref(), id).await
    }

    pub async fn update(&self, id: GenreId, genre: Genre) -> Result<Genre> {
        let current = require(self.repo.as_ref(), id).await?;

        let mut genre = genre;
        genre.id = id;
        if genre.version == 0 {
            genre.version = current.version;
        }

        self.repo.save(&genre).await
    }

    pub async fn delete(&self, id: GenreId) -> Result<()> {
        require(self.repo.as_ref(), id).await?;
        self.repo.delete_by_id(id).await?;
        info!(id = %id, "deleted genre");
        Ok(())
    }
}
