//! User lifecycle service.

use crate::error::{CatalogError, Result};
use crate::models::{User, UserId};
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::info;

pub struct UserService {
    repo: Arc<dyn Repository<User>>,
}

impl UserService {
    pub fn new(repo: Arc<dyn Repository<User>>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, user: User) -> Result<User> {
        if user.login.trim().is_empty() {
            return Err(CatalogError::invalid("User login cannot be empty"));
        }

        let mut user = user;
        user.version = 0;
        let user = self.repo.save(&user).await?;

        info!(id = %user.id, login = %user.login, "created user");
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: UserId) -> Result<User> {
        require(self.repo.as_ref(), id).await
    }

    pub async fn update(&self, id: UserId, user: User) -> Result<User> {
        let current = require(self.repo.as_ref(), id).await?;

        let mut user = user;
        user.id = id;
        if user.version == 0 {
            user.version = current.version;
        }

        self.repo.save(&user).await
    }

    /// Delete a user. Owned playlists survive, unowned.
    pub async fn delete(&self, id: UserId) -> Result<()> {
        require(self.repo.as_ref(), id).await?;
        self.repo.delete_by_id(id).await?;
        info!(id = %id, "deleted user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::SqliteUserRepository;

    fn service(pool: &sqlx::SqlitePool) -> UserService {
        UserService::new(Arc::new(SqliteUserRepository::new(pool.clone())))
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);

        let created = service
            .create(User::new("Ana", "ana", "ana@example.com"))
            .await
            .unwrap();

        let mut changed = service.get(created.id).await.unwrap();
        changed.email = "ana@eafit.edu.co".to_string();
        let updated = service.update(created.id, changed).await.unwrap();
        assert_eq!(updated.email, "ana@eafit.edu.co");

        service.delete(created.id).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_login() {
        let pool = create_test_pool().await.unwrap();
        let service = service(&pool);

        let result = service.create(User::new("Ana", "  ", "ana@example.com")).await;
        assert!(matches!(result, Err(CatalogError::InvalidOperation(_))));
    }
}
