//! Artist repository implementation

use crate::error::{CatalogError, Result};
use crate::models::{AlbumId, Artist, ArtistId, Entity, PodcastId};
use crate::repositories::Repository;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[derive(sqlx::FromRow)]
struct ArtistRow {
    id: ArtistId,
    name: String,
    nationality: String,
    image: String,
    version: i64,
}

/// SQLite-backed storage for artists, covering both their album credits and
/// the podcasts they create.
pub struct SqliteArtistRepository {
    pool: SqlitePool,
}

impl SqliteArtistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: ArtistRow) -> Result<Artist> {
        let albums: Vec<(AlbumId,)> =
            query_as("SELECT album_id FROM album_artists WHERE artist_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        let podcasts: Vec<(PodcastId,)> =
            query_as("SELECT podcast_id FROM podcast_artists WHERE artist_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Artist {
            id: row.id,
            name: row.name,
            nationality: row.nationality,
            image: row.image,
            albums: albums.into_iter().map(|(id,)| id).collect(),
            podcasts: podcasts.into_iter().map(|(id,)| id).collect(),
            version: row.version,
        })
    }
}

#[async_trait]
impl Repository<Artist> for SqliteArtistRepository {
    async fn find_by_id(&self, id: ArtistId) -> Result<Option<Artist>> {
        let row = query_as::<_, ArtistRow>(
            "SELECT id, name, nationality, image, version FROM artists WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Artist>> {
        let rows = query_as::<_, ArtistRow>(
            "SELECT id, name, nationality, image, version FROM artists",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut artists = Vec::with_capacity(rows.len());
        for row in rows {
            artists.push(self.hydrate(row).await?);
        }

        Ok(artists)
    }

    async fn save(&self, artist: &Artist) -> Result<Artist> {
        let mut tx = self.pool.begin().await?;

        let version = if artist.version == 0 {
            query(
                "INSERT INTO artists (id, name, nationality, image, version) \
                 VALUES (?, ?, ?, ?, 1)",
            )
            .bind(artist.id)
            .bind(&artist.name)
            .bind(&artist.nationality)
            .bind(&artist.image)
            .execute(&mut *tx)
            .await?;
            1
        } else {
            let result = query(
                "UPDATE artists SET name = ?, nationality = ?, image = ?, \
                 version = version + 1 WHERE id = ? AND version = ?",
            )
            .bind(&artist.name)
            .bind(&artist.nationality)
            .bind(&artist.image)
            .bind(artist.id)
            .bind(artist.version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let exists: (i64,) = query_as("SELECT COUNT(*) FROM artists WHERE id = ?")
                    .bind(artist.id)
                    .fetch_one(&mut *tx)
                    .await?;

                return Err(if exists.0 > 0 {
                    CatalogError::Conflict {
                        kind: Artist::KIND,
                        id: artist.id.to_string(),
                    }
                } else {
                    CatalogError::NotFound {
                        kind: Artist::KIND,
                        id: artist.id.to_string(),
                    }
                });
            }
            artist.version + 1
        };

        query("DELETE FROM album_artists WHERE artist_id = ?")
            .bind(artist.id)
            .execute(&mut *tx)
            .await?;
        for album_id in &artist.albums {
            query("INSERT INTO album_artists (album_id, artist_id) VALUES (?, ?)")
                .bind(*album_id)
                .bind(artist.id)
                .execute(&mut *tx)
                .await?;
        }

        query("DELETE FROM podcast_artists WHERE artist_id = ?")
            .bind(artist.id)
            .execute(&mut *tx)
            .await?;
        for podcast_id in &artist.podcasts {
            query("INSERT INTO podcast_artists (podcast_id, artist_id) VALUES (?, ?)")
                .bind(*podcast_id)
                .bind(artist.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let mut saved = artist.clone();
        saved.version = version;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: ArtistId) -> Result<bool> {
        let result = query("DELETE FROM artists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
