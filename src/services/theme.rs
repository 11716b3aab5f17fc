//! Theme lifecycle service.

use crate::error::{CatalogError, Result};
use crate::models::{Podcast, Theme, ThemeId};
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::info;

pub struct ThemeService {
    repo: Arc<dyn Repository<Theme>>,
    podcasts: Arc<dyn Repository<Podcast>>,
}

impl ThemeService {
    pub fn new(
        repo: Arc<dyn Repository<Theme>>,
        podcasts: Arc<dyn Repository<Podcast>>,
    ) -> Self {
        Self { repo, podcasts }
    }

    /// Create a theme. A payload may arrive with podcast references already
    /// attached; every referenced podcast must exist.
    pub async fn create(&self, theme: Theme) -> Result<Theme> {
        if theme.name.trim().is_empty() {
            return Err(CatalogError::invalid("Theme name cannot be empty"));
        }

        for podcast_id in &theme.podcasts {
            if self.podcasts.find_by_id(*podcast_id).await?.is_none() {
                return Err(CatalogError::invalid("Some podcast is not valid"));
            }
        }

        let mut theme = theme;
        theme.version = 0;
        let theme = self.repo.save(&theme).await?;

        info!(id = %theme.id, name = %theme.name, "created theme");
        Ok(theme)
    }

    pub async fn list(&self) -> Result<Vec<Theme>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: ThemeId) -> Result<Theme> {
        require(self.repo.as_ref(), id).await
    }

    pub async fn update(&self, id: ThemeId, theme: Theme) -> Result<Theme> {
        let current = require(self.repo.as_ref(), id).await?;

        for podcast_id in &theme.podcasts {
            if self.podcasts.find_by_id(*podcast_id).await?.is_none() {
                return Err(CatalogError::invalid("Some podcast is not valid"));
            }
        }

        let mut theme = theme;
        theme.id = id;
        if theme.version == 0 {
            theme.version = current.version;
        }

        self.repo.save(&theme).await
    }

    pub async fn delete(&self, id: ThemeId) -> Result<()> {
        require(self.repo.as_ref(), id).await?;
        self.repo.delete_by_id(id).await?;
        info!(id = %id, "deleted theme");
        Ok(())
    }
}
