//! Playlist repository implementation

use crate::error::{CatalogError, Result};
use crate::models::{Entity, Playlist, PlaylistId, SongId, UserId};
use crate::repositories::Repository;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{query, query_as, SqlitePool};

#[derive(sqlx::FromRow)]
struct PlaylistRow {
    id: PlaylistId,
    name: String,
    created_on: NaiveDate,
    image: String,
    owner_id: Option<UserId>,
    version: i64,
}

/// SQLite-backed storage for playlists.
///
/// The owner slot is a column on the playlist row; song membership lives in
/// `playlist_songs` and is owned by this side of the relation.
pub struct SqlitePlaylistRepository {
    pool: SqlitePool,
}

impl SqlitePlaylistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: PlaylistRow) -> Result<Playlist> {
        let songs: Vec<(SongId,)> =
            query_as("SELECT song_id FROM playlist_songs WHERE playlist_id = ?")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Playlist {
            id: row.id,
            name: row.name,
            created_on: row.created_on,
            image: row.image,
            owner: row.owner_id,
            songs: songs.into_iter().map(|(id,)| id).collect(),
            version: row.version,
        })
    }
}

#[async_trait]
impl Repository<Playlist> for SqlitePlaylistRepository {
    async fn find_by_id(&self, id: PlaylistId) -> Result<Option<Playlist>> {
        let row = query_as::<_, PlaylistRow>(
            "SELECT id, name, created_on, image, owner_id, version FROM playlists WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Playlist>> {
        let rows = query_as::<_, PlaylistRow>(
            "SELECT id, name, created_on, image, owner_id, version FROM playlists",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut playlists = Vec::with_capacity(rows.len());
        for row in rows {
            playlists.push(self.hydrate(row).await?);
        }

        Ok(playlists)
    }

    async fn save(&self, playlist: &Playlist) -> Result<Playlist> {
        let mut tx = self.pool.begin().await?;

        let version = if playlist.version == 0 {
            query(
                "INSERT INTO playlists (id, name, created_on, image, owner_id, version) \
                 VALUES (?, ?, ?, ?, ?, 1)",
            )
            .bind(playlist.id)
            .bind(&playlist.name)
            .bind(playlist.created_on)
            .bind(&playlist.image)
            .bind(playlist.owner)
            .execute(&mut *tx)
            .await?;
            1
        } else {
            let result = query(
                "UPDATE playlists SET name = ?, created_on = ?, image = ?, owner_id = ?, \
                 version = version + 1 WHERE id = ? AND version = ?",
            )
            .bind(&playlist.name)
            .bind(playlist.created_on)
            .bind(&playlist.image)
            .bind(playlist.owner)
            .bind(playlist.id)
            .bind(playlist.version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let exists: (i64,) = query_as("SELECT COUNT(*) FROM playlists WHERE id = ?")
                    .bind(playlist.id)
                    .fetch_one(&mut *tx)
                    .await?;

                return Err(if exists.0 > 0 {
                    CatalogError::Conflict {
                        kind: Playlist::KIND,
                        id: playlist.id.to_string(),
                    }
                } else {
                    CatalogError::NotFound {
                        kind: Playlist::KIND,
                        id: playlist.id.to_string(),
                    }
                });
            }
            playlist.version + 1
        };

        query("DELETE FROM playlist_songs WHERE playlist_id = ?")
            .bind(playlist.id)
            .execute(&mut *tx)
            .await?;
        for song_id in &playlist.songs {
            query("INSERT INTO playlist_songs (playlist_id, song_id) VALUES (?, ?)")
                .bind(playlist.id)
                .bind(*song_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let mut saved = playlist.clone();
        saved.version = version;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: PlaylistId) -> Result<bool> {
        let result = query("DELETE FROM playlists WHERE id = ?")
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
    use crate::models::Song;
    use crate::repositories::SqliteSongRepository;

    #[tokio::test]
    async fn test_playlist_roundtrip_with_songs() {
        let pool = create_test_pool().await.unwrap();
        let playlists = SqlitePlaylistRepository::new(pool.clone());
        let songs = SqliteSongRepository::new(pool);

        let song = songs.save(&Song::new("Despierta", 201)).await.unwrap();

        let mut playlist = Playlist::new(
            "Entrenamiento",
            NaiveDate::from_ymd_opt(2022, 10, 14).unwrap(),
        );
        playlist.songs.insert(song.id);
        playlists.save(&playlist).await.unwrap();

        let found = playlists.find_by_id(playlist.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Entrenamiento");
        assert_eq!(found.created_on, playlist.created_on);
        assert!(found.songs.contains(&song.id));
        assert_eq!(found.owner, None);
    }
}
