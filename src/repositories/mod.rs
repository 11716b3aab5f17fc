//! Repository layer: the only path between the catalog core and storage.
//!
//! A single generic trait exposes the four primitives every entity type
//! supports (find-by-id, find-all, save, delete-by-id). Each entity has a
//! SQLite implementation that additionally materializes the entity's relation
//! views from the shared edge tables on load and syncs them back on save.
//!
//! `save` is a versioned upsert: entities at version 0 are inserted, anything
//! else must match the stored version or the write fails with `Conflict`.

use crate::error::Result;
use crate::models::Entity;
use async_trait::async_trait;

pub mod album;
pub mod artist;
pub mod episode;
pub mod genre;
pub mod playlist;
pub mod podcast;
pub mod song;
pub mod theme;
pub mod user;

pub use album::SqliteAlbumRepository;
pub use artist::SqliteArtistRepository;
pub use episode::SqliteEpisodeRepository;
pub use genre::SqliteGenreRepository;
pub use playlist::SqlitePlaylistRepository;
pub use podcast::SqlitePodcastRepository;
pub use song::SqliteSongRepository;
pub use theme::SqliteThemeRepository;
pub use user::SqliteUserRepository;

/// Key-addressed storage for one entity type.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Find an entity by its id, relation views included.
    async fn find_by_id(&self, id: E::Id) -> Result<Option<E>>;

    /// All entities, in storage order.
    async fn find_all(&self) -> Result<Vec<E>>;

    /// Persist the entity and its relation views.
    ///
    /// Returns the entity as stored, with its version bumped. Fails with
    /// `Conflict` if the stored version no longer matches the one the entity
    /// was loaded with, and with `NotFound` if a non-new entity's row is gone.
    async fn save(&self, entity: &E) -> Result<E>;

    /// Delete by id.
    ///
    /// # Returns
    /// - `Ok(true)` if a row was deleted
    /// - `Ok(false)` if the id was unknown
    async fn delete_by_id(&self, id: E::Id) -> Result<bool>;
}
