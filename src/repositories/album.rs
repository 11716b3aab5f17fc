//! Album repository implementation

use crate::error::{CatalogError, Result};
use crate::models::{Album, AlbumId, ArtistId, Entity, GenreId, SongId};
use crate::repositories::Repository;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[derive(sqlx::FromRow)]
struct AlbumRow {
    id: AlbumId,
    title: String,
    cover_image: String,
    version: i64,
}

/// SQLite-backed storage for albums.
///
/// Owns the album slice of the `album_songs`, `album_artists` and
/// `album_genres` edge tables: loads them into the album's relation views and
/// rewrites them from those views on save.
pub struct SqliteAlbumRepository {
    pool: SqlitePool,
}

impl SqliteAlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: AlbumRow) -> Result<Album> {
        let artists: Vec<(ArtistId,)> =
            query_as("SELECT artist_id FROM album_artists WHERE album_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        let genres: Vec<(GenreId,)> =
            query_as("SELECT genre_id FROM album_genres WHERE album_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        let songs: Vec<(SongId,)> = query_as("SELECT song_id FROM album_songs WHERE album_id = ?")
            .bind(row.id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Album {
            id: row.id,
            title: row.title,
            cover_image: row.cover_image,
            artists: artists.into_iter().map(|(id,)| id).collect(),
            genres: genres.into_iter().map(|(id,)| id).collect(),
            songs: songs.into_iter().map(|(id,)| id).collect(),
            version: row.version,
        })
    }
}

#[async_trait]
impl Repository<Album> for SqliteAlbumRepository {
    async fn find_by_id(&self, id: AlbumId) -> Result<Option<Album>> {
        let row = query_as::<_, AlbumRow>(
            "SELECT id, title, cover_image, version FROM albums WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Album>> {
        let rows = query_as::<_, AlbumRow>("SELECT id, title, cover_image, version FROM albums")
            .fetch_all(&self.pool)
            .await?;

        let mut albums = Vec::with_capacity(rows.len());
        for row in rows {
            albums.push(self.hydrate(row).await?);
        }

        Ok(albums)
    }

    async fn save(&self, album: &Album) -> Result<Album> {
        let mut tx = self.pool.begin().await?;

        let version = if album.version == 0 {
            query("INSERT INTO albums (id, title, cover_image, version) VALUES (?, ?, ?, 1)")
                .bind(album.id)
                .bind(&album.title)
                .bind(&album.cover_image)
                .execute(&mut *tx)
                .await?;
            1
        } else {
            let result = query(
                "UPDATE albums SET title = ?, cover_image = ?, version = version + 1 \
                 WHERE id = ? AND version = ?",
            )
            .bind(&album.title)
            .bind(&album.cover_image)
            .bind(album.id)
            .bind(album.version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let exists: (i64,) = query_as("SELECT COUNT(*) FROM albums WHERE id = ?")
                    .bind(album.id)
                    .fetch_one(&mut *tx)
                    .await?;

                return Err(if exists.0 > 0 {
                    CatalogError::Conflict {
                        kind: Album::KIND,
                        id: album.id.to_string(),
                    }
                } else {
                    CatalogError::NotFound {
                        kind: Album::KIND,
                        id: album.id.to_string(),
                    }
                });
            }
            album.version + 1
        };

        // Rewrite this album's slice of each edge table from the in-memory view.
        query("DELETE FROM album_artists WHERE album_id = ?")
            .bind(album.id)
            .execute(&mut *tx)
            .await?;
        for artist_id in &album.artists {
            query("INSERT INTO album_artists (album_id, artist_id) VALUES (?, ?)")
                .bind(album.id)
                .bind(*artist_id)
                .execute(&mut *tx)
                .await?;
        }

        query("DELETE FROM album_genres WHERE album_id = ?")
            .bind(album.id)
            .execute(&mut *tx)
            .await?;
        for genre_id in &album.genres {
            query("INSERT INTO album_genres (album_id, genre_id) VALUES (?, ?)")
                .bind(album.id)
                .bind(*genre_id)
                .execute(&mut *tx)
                .await?;
        }

        query("DELETE FROM album_songs WHERE album_id = ?")
            .bind(album.id)
            .execute(&mut *tx)
            .await?;
        for song_id in &album.songs {
            query("INSERT INTO album_songs (album_id, song_id) VALUES (?, ?)")
                .bind(album.id)
                .bind(*song_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let mut saved = album.clone();
        saved.version = version;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: AlbumId) -> Result<bool> {
        let result = query("DELETE FROM albums WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
