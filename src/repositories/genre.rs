//! Genre repository implementation

use crate::error::{CatalogError, Result};
use crate::models::{AlbumId, Entity, Genre, GenreId};
use crate::repositories::Repository;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[derive(sqlx::FromRow)]
struct GenreRow {
    id: GenreId,
    name: String,
    version: i64,
}

/// SQLite-backed storage for genres.
pub struct SqliteGenreRepository {
    pool: SqlitePool,
}

impl SqliteGenreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: GenreRow) -> Result<Genre> {
        let albums: Vec<(AlbumId,)> =
            query_as("SELECT album_id FROM album_genres WHERE genre_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Genre {
            id: row.id,
            name: row.name,
            albums: albums.into_iter().map(|(id,)| id).collect(),
            version: row.version,
        })
    }
}

#[async_trait]
impl Repository<Genre> for SqliteGenreRepository {
    async fn find_by_id(&self, id: GenreId) -> Result<Option<Genre>> {
        let row = query_as::<_, GenreRow>("SELECT id, name, version FROM genres WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Genre>> {
        let rows = query_as::<_, GenreRow>("SELECT id, name, version FROM genres")
            .fetch_all(&self.pool)
            .await?;

        let mut genres = Vec::with_capacity(rows.len());
        for row in rows {
            genres.push(self.hydrate(row).await?);
        }

        Ok(genres)
    }

    async fn save(&self, genre: &Genre) -> Result<Genre> {
        let mut tx = self.pool.begin().await?;

        let version = if genre.version == 0 {
            query("INSERT INTO genres (id, name, version) VALUES (?, ?, 1)")
                .bind(genre.id)
                .bind(&genre.name)
                .execute(&mut *tx)
                .await?;
            1
        } else {
            let result =
                query("UPDATE genres SET name = ?, version = version + 1 WHERE id = ? AND version = ?")
                    .bind(&genre.name)
                    .bind(genre.id)
                    .bind(genre.version)
                    .execute(&mut *tx)
                    .await?;

            if result.rows_affected() == 0 {
                let exists: (i64,) = query_as("SELECT COUNT(*) FROM genres WHERE id = ?")
                    .bind(genre.id)
                    .fetch_one(&mut *tx)
                    .await?;

                return Err(if exists.0 > 0 {
                    CatalogError::Conflict {
                        kind: Genre::KIND,
                        id: genre.id.to_string(),
                    }
                } else {
                    CatalogError::NotFound {
                        kind: Genre::KIND,
                        id: genre.id.to_string(),
                    }
                });
            }
            genre.version + 1
        };

        query("DELETE FROM album_genres WHERE genre_id = ?")
            .bind(genre.id)
            .execute(&mut *tx)
            .await?;
        for album_id in &genre.albums {
            query("INSERT INTO album_genres (album_id, genre_id) VALUES (?, ?)")
                .bind(*album_id)
                .bind(genre.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let mut saved = genre.clone();
        saved.version = version;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: GenreId) -> Result<bool> {
        let result = query("DELETE FROM genres WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
