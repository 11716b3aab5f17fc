//! User repository implementation

use crate::error::{CatalogError, Result};
use crate::models::{Entity, PlaylistId, User, UserId};
use crate::repositories::Repository;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    login: String,
    email: String,
    version: i64,
}

/// SQLite-backed storage for users.
///
/// Playlist ownership is the `owner_id` column on the playlist rows; saving a
/// user reasserts ownership over exactly the playlists in its view.
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: UserRow) -> Result<User> {
        let playlists: Vec<(PlaylistId,)> =
            query_as("SELECT id FROM playlists WHERE owner_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        Ok(User {
            id: row.id,
            name: row.name,
            login: row.login,
            email: row.email,
            playlists: playlists.into_iter().map(|(id,)| id).collect(),
            version: row.version,
        })
    }
}

#[async_trait]
impl Repository<User> for SqliteUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row = query_as::<_, UserRow>(
            "SELECT id, name, login, email, version FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        let rows = query_as::<_, UserRow>("SELECT id, name, login, email, version FROM users")
            .fetch_all(&self.pool)
            .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(self.hydrate(row).await?);
        }

        Ok(users)
    }

    async fn save(&self, user: &User) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let version = if user.version == 0 {
            query("INSERT INTO users (id, name, login, email, version) VALUES (?, ?, ?, ?, 1)")
                .bind(user.id)
                .bind(&user.name)
                .bind(&user.login)
                .bind(&user.email)
                .execute(&mut *tx)
                .await?;
            1
        } else {
            let result = query(
                "UPDATE users SET name = ?, login = ?, email = ?, version = version + 1 \
                 WHERE id = ? AND version = ?",
            )
            .bind(&user.name)
            .bind(&user.login)
            .bind(&user.email)
            .bind(user.id)
            .bind(user.version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let exists: (i64,) = query_as("SELECT COUNT(*) FROM users WHERE id = ?")
                    .bind(user.id)
                    .fetch_one(&mut *tx)
                    .await?;

                return Err(if exists.0 > 0 {
                    CatalogError::Conflict {
                        kind: User::KIND,
                        id: user.id.to_string(),
                    }
                } else {
                    CatalogError::NotFound {
                        kind: User::KIND,
                        id: user.id.to_string(),
                    }
                });
            }
            user.version + 1
        };

        // Release every playlist currently owned, then claim the view.
        query("UPDATE playlists SET owner_id = NULL WHERE owner_id = ?")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        for playlist_id in &user.playlists {
            query("UPDATE playlists SET owner_id = ? WHERE id = ?")
                .bind(user.id)
                .bind(*playlist_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let mut saved = user.clone();
        saved.version = version;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: UserId) -> Result<bool> {
        let result = query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::Playlist;
    use crate::repositories::SqlitePlaylistRepository;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_user_save_claims_and_releases_playlists() {
        let pool = create_test_pool().await.unwrap();
        let users = SqliteUserRepository::new(pool.clone());
        let playlists = SqlitePlaylistRepository::new(pool);

        let date = NaiveDate::from_ymd_opt(2022, 9, 30).unwrap();
        let playlist = playlists
            .save(&Playlist::new("Favoritas", date))
            .await
            .unwrap();

        let mut user = User::new("ana", "ana", "ana@example.com");
        user.playlists.insert(playlist.id);
        let mut user = users.save(&user).await.unwrap();

        let owned = playlists.find_by_id(playlist.id).await.unwrap().unwrap();
        assert_eq!(owned.owner, Some(user.id));

        user.playlists.clear();
        users.save(&user).await.unwrap();

        let released = playlists.find_by_id(playlist.id).await.unwrap().unwrap();
        assert_eq!(released.owner, None);
    }

    #[tokio::test]
    async fn test_deleting_user_orphans_playlists() {
        let pool = create_test_pool().await.unwrap();
        let users = SqliteUserRepository::new(pool.clone());
        let playlists = SqlitePlaylistRepository::new(pool);

        let date = NaiveDate::from_ymd_opt(2022, 9, 30).unwrap();
        let playlist = playlists.save(&Playlist::new("Mias", date)).await.unwrap();

        let mut user = User::new("luis", "luis", "luis@example.com");
        user.playlists.insert(playlist.id);
        let user = users.save(&user).await.unwrap();

        assert!(users.delete_by_id(user.id).await.unwrap());

        // FK is ON DELETE SET NULL: the playlist survives, unowned.
        let orphan = playlists.find_by_id(playlist.id).await.unwrap().unwrap();
        assert_eq!(orphan.owner, None);
    }
}
