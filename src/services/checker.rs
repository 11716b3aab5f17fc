//! Shared existence checker.
//!
//! Centralizes the lookup-or-not-found step every service performs before
//! touching an entity.

use crate::error::{CatalogError, Result};
use crate::models::Entity;
use crate::repositories::Repository;

/// Load the entity with the given id or fail with `NotFound` naming its kind.
pub async fn require<E: Entity>(repo: &dyn Repository<E>, id: E::Id) -> Result<E> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| CatalogError::NotFound {
            kind: E::KIND,
            id: id.to_string(),
        })
}
