//! Song repository implementation

use crate::error::{CatalogError, Result};
use crate::models::{AlbumId, Entity, Song, SongId};
use crate::repositories::Repository;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[derive(sqlx::FromRow)]
struct SongRow {
    id: SongId,
    title: String,
    duration_secs: i64,
    link: String,
    cover: String,
    version: i64,
}

/// SQLite-backed storage for songs.
///
/// Syncs the song slice of `album_songs`; playlist membership is owned by the
/// playlist side and never touched here.
pub struct SqliteSongRepository {
    pool: SqlitePool,
}

impl SqliteSongRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: SongRow) -> Result<Song> {
        let albums: Vec<(AlbumId,)> = query_as("SELECT album_id FROM album_songs WHERE song_id = ?")
            .bind(row.id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Song {
            id: row.id,
            title: row.title,
            duration_secs: row.duration_secs,
            link: row.link,
            cover: row.cover,
            albums: albums.into_iter().map(|(id,)| id).collect(),
            version: row.version,
        })
    }
}

#[async_trait]
impl Repository<Song> for SqliteSongRepository {
    async fn find_by_id(&self, id: SongId) -> Result<Option<Song>> {
        let row = query_as::<_, SongRow>(
            "SELECT id, title, duration_secs, link, cover, version FROM songs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Song>> {
        let rows = query_as::<_, SongRow>(
            "SELECT id, title, duration_secs, link, cover, version FROM songs",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut songs = Vec::with_capacity(rows.len());
        for row in rows {
            songs.push(self.hydrate(row).await?);
        }

        Ok(songs)
    }

    async fn save(&self, song: &Song) -> Result<Song> {
        let mut tx = self.pool.begin().await?;

        let version = if song.version == 0 {
            query(
                "INSERT INTO songs (id, title, duration_secs, link, cover, version) \
                 VALUES (?, ?, ?, ?, ?, 1)",
            )
            .bind(song.id)
            .bind(&song.title)
            .bind(song.duration_secs)
            .bind(&song.link)
            .bind(&song.cover)
            .execute(&mut *tx)
            .await?;
            1
        } else {
            let result = query(
                "UPDATE songs SET title = ?, duration_secs = ?, link = ?, cover = ?, \
                 version = version + 1 WHERE id = ? AND version = ?",
            )
            .bind(&song.title)
            .bind(song.duration_secs)
            .bind(&song.link)
            .bind(&song.cover)
            .bind(song.id)
            .bind(song.version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let exists: (i64,) = query_as("SELECT COUNT(*) FROM songs WHERE id = ?")
                    .bind(song.id)
                    .fetch_one(&mut *tx)
                    .await?;

                return Err(if exists.0 > 0 {
                    CatalogError::Conflict {
                        kind: Song::KIND,
                        id: song.id.to_string(),
                    }
                } else {
                    CatalogError::NotFound {
                        kind: Song::KIND,
                        id: song.id.to_string(),
                    }
                });
            }
            song.version + 1
        };

        query("DELETE FROM album_songs WHERE song_id = ?")
            .bind(song.id)
            .execute(&mut *tx)
            .await?;
        for album_id in &song.albums {
            query("INSERT INTO album_songs (album_id, song_id) VALUES (?, ?)")
                .bind(*album_id)
                .bind(song.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let mut saved = song.clone();
        saved.version = version;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: SongId) -> Result<bool> {
        let result = query("DELETE FROM songs WHERE id = ?")
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
    use crate::models::Album;
    use crate::repositories::SqliteAlbumRepository;

    #[tokio::test]
    async fn test_song_sees_albums_linked_from_the_album_side() {
        let pool = create_test_pool().await.unwrap();
        let songs = SqliteSongRepository::new(pool.clone());
        let albums = SqliteAlbumRepository::new(pool);

        let song = songs.save(&Song::new("La Gota Fria", 263)).await.unwrap();

        let mut album = Album::new("Clasicos", "");
        album.songs.insert(song.id);
        albums.save(&album).await.unwrap();

        // The edge was written by the album repository; the song's view reads
        // through the same table.
        let found = songs.find_by_id(song.id).await.unwrap().unwrap();
        assert!(found.albums.contains(&album.id));
    }
}
