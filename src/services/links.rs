//! Concrete association instances.
//!
//! One constructor per relation direction, each binding the endpoint
//! repositories and the rules that relation enforces. The same edge storage
//! backs both directions of a relation, so e.g. [`album_songs`] and
//! [`song_albums`] observe each other's writes.

use crate::models::{Album, Artist, Genre, Playlist, Podcast, Song, Theme, User};
use crate::repositories::{
    SqliteAlbumRepository, SqliteArtistRepository, SqliteGenreRepository,
    SqlitePlaylistRepository, SqlitePodcastRepository, SqliteSongRepository,
    SqliteThemeRepository, SqliteUserRepository,
};
use crate::services::association::{AssociationRules, AssociationService};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Songs on an album; song titles are unique within the album.
pub fn album_songs(pool: &SqlitePool) -> AssociationService<Album, Song> {
    AssociationService::new(
        Arc::new(SqliteAlbumRepository::new(pool.clone())),
        Arc::new(SqliteSongRepository::new(pool.clone())),
        AssociationRules::unique_children(),
    )
}

/// Albums a song appears on; album titles are unique for the song.
pub fn song_albums(pool: &SqlitePool) -> AssociationService<Song, Album> {
    AssociationService::new(
        Arc::new(SqliteSongRepository::new(pool.clone())),
        Arc::new(SqliteAlbumRepository::new(pool.clone())),
        AssociationRules::unique_children(),
    )
}

/// Albums credited to an artist; album titles are unique per artist.
pub fn artist_albums(pool: &SqlitePool) -> AssociationService<Artist, Album> {
    AssociationService::new(
        Arc::new(SqliteArtistRepository::new(pool.clone())),
        Arc::new(SqliteAlbumRepository::new(pool.clone())),
        AssociationRules::unique_children(),
    )
}

/// Artists credited on an album.
///
/// The artist side governs the uniqueness rule: an artist may not already
/// hold an album with this album's title, whichever direction the link is
/// made from.
pub fn album_artists(pool: &SqlitePool) -> AssociationService<Album, Artist> {
    AssociationService::new(
        Arc::new(SqliteAlbumRepository::new(pool.clone())),
        Arc::new(SqliteArtistRepository::new(pool.clone())),
        AssociationRules::child_governed(),
    )
}

/// Genres an album is filed under; an album keeps at least one genre.
pub fn album_genres(pool: &SqlitePool) -> AssociationService<Album, Genre> {
    AssociationService::new(
        Arc::new(SqliteAlbumRepository::new(pool.clone())),
        Arc::new(SqliteGenreRepository::new(pool.clone())),
        AssociationRules::none().min_on_remove(1),
    )
}

/// Albums filed under a genre.
pub fn genre_albums(pool: &SqlitePool) -> AssociationService<Genre, Album> {
    AssociationService::new(
        Arc::new(SqliteGenreRepository::new(pool.clone())),
        Arc::new(SqliteAlbumRepository::new(pool.clone())),
        AssociationRules::none(),
    )
}

/// Creators of a podcast.
///
/// Creator names are unique per podcast, every podcast keeps at least one
/// creator, and a replace payload must name at least one artist.
pub fn podcast_creators(pool: &SqlitePool) -> AssociationService<Podcast, Artist> {
    AssociationService::new(
        Arc::new(SqlitePodcastRepository::new(pool.clone())),
        Arc::new(SqliteArtistRepository::new(pool.clone())),
        AssociationRules::unique_children()
            .min_on_remove(1)
            .min_on_replace(1),
    )
}

/// Podcasts an artist creates; podcast titles are unique per artist.
pub fn artist_podcasts(pool: &SqlitePool) -> AssociationService<Artist, Podcast> {
    AssociationService::new(
        Arc::new(SqliteArtistRepository::new(pool.clone())),
        Arc::new(SqlitePodcastRepository::new(pool.clone())),
        AssociationRules::unique_children(),
    )
}

/// Themes a podcast covers.
pub fn podcast_themes(pool: &SqlitePool) -> AssociationService<Podcast, Theme> {
    AssociationService::new(
        Arc::new(SqlitePodcastRepository::new(pool.clone())),
        Arc::new(SqliteThemeRepository::new(pool.clone())),
        AssociationRules::none(),
    )
}

/// Podcasts covering a theme.
pub fn theme_podcasts(pool: &SqlitePool) -> AssociationService<Theme, Podcast> {
    AssociationService::new(
        Arc::new(SqliteThemeRepository::new(pool.clone())),
        Arc::new(SqlitePodcastRepository::new(pool.clone())),
        AssociationRules::none(),
    )
}

/// Songs on a playlist. The song model keeps no reverse view.
pub fn playlist_songs(pool: &SqlitePool) -> AssociationService<Playlist, Song> {
    AssociationService::new(
        Arc::new(SqlitePlaylistRepository::new(pool.clone())),
        Arc::new(SqliteSongRepository::new(pool.clone())),
        AssociationRules::none(),
    )
}

/// Playlists owned by a user; linking claims the playlist's owner slot.
pub fn user_playlists(pool: &SqlitePool) -> AssociationService<User, Playlist> {
    AssociationService::new(
        Arc::new(SqliteUserRepository::new(pool.clone())),
        Arc::new(SqlitePlaylistRepository::new(pool.clone())),
        AssociationRules::none(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::error::CatalogError;
    use crate::repositories::Repository;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_album_keeps_its_last_genre() {
        let pool = create_test_pool().await.unwrap();
        let albums = SqliteAlbumRepository::new(pool.clone());
        let genres = SqliteGenreRepository::new(pool.clone());
        let service = album_genres(&pool);

        let album = albums.save(&Album::new("Raices", "")).await.unwrap();
        let vallenato = genres.save(&Genre::new("Vallenato")).await.unwrap();
        let cumbia = genres.save(&Genre::new("Cumbia")).await.unwrap();

        service.add(album.id, vallenato.id).await.unwrap();
        service.add(album.id, cumbia.id).await.unwrap();

        service.remove(album.id, vallenato.id).await.unwrap();
        let result = service.remove(album.id, cumbia.id).await;
        assert!(matches!(result, Err(CatalogError::InvalidOperation(_))));

        // The failed remove left the relation untouched.
        let remaining = service.get_all(album.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, cumbia.id);
    }

    #[tokio::test]
    async fn test_artist_governs_album_title_uniqueness_in_both_directions() {
        let pool = create_test_pool().await.unwrap();
        let albums = SqliteAlbumRepository::new(pool.clone());
        let artists = SqliteArtistRepository::new(pool.clone());

        let artist = artists.save(&Artist::new("Totó", "CO")).await.unwrap();
        let first = albums.save(&Album::new("Raices", "")).await.unwrap();
        let clash = albums.save(&Album::new("Raices", "other.png")).await.unwrap();

        artist_albums(&pool).add(artist.id, first.id).await.unwrap();

        // Same title, either call direction: the artist's set rejects it.
        let via_artist = artist_albums(&pool).add(artist.id, clash.id).await;
        assert!(matches!(via_artist, Err(CatalogError::InvalidOperation(_))));

        let via_album = album_artists(&pool).add(clash.id, artist.id).await;
        assert!(matches!(via_album, Err(CatalogError::InvalidOperation(_))));

        // A different artist can still take the clashing album.
        let other = artists.save(&Artist::new("Petrona", "CO")).await.unwrap();
        album_artists(&pool).add(clash.id, other.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_podcast_keeps_a_creator_and_rejects_empty_replace() {
        let pool = create_test_pool().await.unwrap();
        let podcasts = SqlitePodcastRepository::new(pool.clone());
        let artists = SqliteArtistRepository::new(pool.clone());
        let service = podcast_creators(&pool);

        let podcast = podcasts.save(&Podcast::new("Historias", 4.99)).await.unwrap();
        let creator = artists.save(&Artist::new("Diana", "CO")).await.unwrap();

        service.add(podcast.id, creator.id).await.unwrap();

        let result = service.remove(podcast.id, creator.id).await;
        assert!(matches!(result, Err(CatalogError::InvalidOperation(_))));

        let result = service.replace_all(podcast.id, &[]).await;
        assert!(matches!(result, Err(CatalogError::InvalidOperation(_))));

        // With a second creator in place the first can leave.
        let second = artists.save(&Artist::new("Laura", "CO")).await.unwrap();
        service.add(podcast.id, second.id).await.unwrap();
        service.remove(podcast.id, creator.id).await.unwrap();
        assert_eq!(service.get_all(podcast.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_on_unknown_podcast_is_not_found_before_any_rule() {
        let pool = create_test_pool().await.unwrap();
        let service = podcast_creators(&pool);

        // The missing parent wins over the minimum-payload rule.
        let result = service.replace_all(crate::models::PodcastId::new(), &[]).await;
        assert!(matches!(result, Err(CatalogError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_playlist_songs_are_one_sided() {
        let pool = create_test_pool().await.unwrap();
        let playlists = SqlitePlaylistRepository::new(pool.clone());
        let songs = SqliteSongRepository::new(pool.clone());
        let service = playlist_songs(&pool);

        let date = NaiveDate::from_ymd_opt(2022, 10, 3).unwrap();
        let playlist = playlists.save(&Playlist::new("Viaje", date)).await.unwrap();
        let song = songs.save(&Song::new("Carretera", 210)).await.unwrap();

        service.add(playlist.id, song.id).await.unwrap();

        let members = service.get_all(playlist.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, song.id);

        // The song row is untouched by playlist membership.
        let stored = songs.find_by_id(song.id).await.unwrap().unwrap();
        assert!(stored.albums.is_empty());

        service.remove(playlist.id, song.id).await.unwrap();
        assert!(service.get_all(playlist.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_linking_a_playlist_claims_its_owner_slot() {
        let pool = create_test_pool().await.unwrap();
        let users = SqliteUserRepository::new(pool.clone());
        let playlists = SqlitePlaylistRepository::new(pool.clone());
        let service = user_playlists(&pool);

        let date = NaiveDate::from_ymd_opt(2022, 10, 3).unwrap();
        let user = users
            .save(&User::new("Ana", "ana", "ana@example.com"))
            .await
            .unwrap();
        let playlist = playlists.save(&Playlist::new("Mia", date)).await.unwrap();

        service.add(user.id, playlist.id).await.unwrap();

        let owned = playlists.find_by_id(playlist.id).await.unwrap().unwrap();
        assert_eq!(owned.owner, Some(user.id));

        service.remove(user.id, playlist.id).await.unwrap();
        let released = playlists.find_by_id(playlist.id).await.unwrap().unwrap();
        assert_eq!(released.owner, None);
    }
}
