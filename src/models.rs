//! Domain models for the catalog.
//!
//! Each entity owns its scalar fields plus a read-through view of the
//! relations it participates in. The views are loaded and persisted by the
//! repositories; both endpoints of a relation observe the same underlying
//! edge, so mutating one side and saving keeps the other side consistent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

// =============================================================================
// ID types
// =============================================================================

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[sqlx(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for an album
    AlbumId
);
entity_id!(
    /// Unique identifier for a song
    SongId
);
entity_id!(
    /// Unique identifier for an artist
    ArtistId
);
entity_id!(
    /// Unique identifier for a genre
    GenreId
);
entity_id!(
    /// Unique identifier for a playlist
    PlaylistId
);
entity_id!(
    /// Unique identifier for a user
    UserId
);
entity_id!(
    /// Unique identifier for a podcast
    PodcastId
);
entity_id!(
    /// Unique identifier for an episode
    EpisodeId
);
entity_id!(
    /// Unique identifier for a theme
    ThemeId
);

// =============================================================================
// Entity and relation traits
// =============================================================================

/// Common surface every catalog entity exposes to the generic services.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + fmt::Display + Send + Sync + 'static;

    /// Entity kind as reported in error messages ("album", "song", ...).
    const KIND: &'static str;

    fn id(&self) -> Self::Id;

    /// Natural display key used by uniqueness rules (title or name).
    fn display_key(&self) -> &str;
}

/// One endpoint's view of its relation toward entities of type `C`.
///
/// Sides whose model keeps no reverse collection implement this as a no-op
/// view; the edge itself still lives in shared storage.
pub trait LinksTo<C: Entity>: Entity {
    /// Snapshot of the related ids.
    fn links(&self) -> Vec<C::Id>;

    fn is_linked(&self, id: C::Id) -> bool;

    fn link(&mut self, id: C::Id);

    fn unlink(&mut self, id: C::Id);
}

/// Relation view backed by an id set on the model.
macro_rules! links_via_set {
    ($owner:ty => $other:ty, $field:ident) => {
        impl LinksTo<$other> for $owner {
            fn links(&self) -> Vec<<$other as Entity>::Id> {
                self.$field.iter().copied().collect()
            }

            fn is_linked(&self, id: <$other as Entity>::Id) -> bool {
                self.$field.contains(&id)
            }

            fn link(&mut self, id: <$other as Entity>::Id) {
                self.$field.insert(id);
            }

            fn unlink(&mut self, id: <$other as Entity>::Id) {
                self.$field.remove(&id);
            }
        }
    };
}

// =============================================================================
// Domain models
// =============================================================================

/// Album with its artist, genre and song relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub cover_image: String,
    /// Artists credited on this album
    pub artists: HashSet<ArtistId>,
    /// Genres this album is filed under
    pub genres: HashSet<GenreId>,
    /// Songs on this album
    pub songs: HashSet<SongId>,
    /// Optimistic-locking counter, managed by the repository
    pub version: i64,
}

impl Album {
    pub fn new(title: impl Into<String>, cover_image: impl Into<String>) -> Self {
        Self {
            id: AlbumId::new(),
            title: title.into(),
            cover_image: cover_image.into(),
            artists: HashSet::new(),
            genres: HashSet::new(),
            songs: HashSet::new(),
            version: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Album title cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Entity for Album {
    type Id = AlbumId;
    const KIND: &'static str = "album";

    fn id(&self) -> AlbumId {
        self.id
    }

    fn display_key(&self) -> &str {
        &self.title
    }
}

links_via_set!(Album => Song, songs);
links_via_set!(Album => Artist, artists);
links_via_set!(Album => Genre, genres);

/// Song; may appear on any number of albums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    /// Duration in seconds
    pub duration_secs: i64,
    /// Streaming link
    pub link: String,
    pub cover: String,
    /// Albums this song appears on
    pub albums: HashSet<AlbumId>,
    pub version: i64,
}

impl Song {
    pub fn new(title: impl Into<String>, duration_secs: i64) -> Self {
        Self {
            id: SongId::new(),
            title: title.into(),
            duration_secs,
            link: String::new(),
            cover: String::new(),
            albums: HashSet::new(),
            version: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Song title cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Entity for Song {
    type Id = SongId;
    const KIND: &'static str = "song";

    fn id(&self) -> SongId {
        self.id
    }

    fn display_key(&self) -> &str {
        &self.title
    }
}

links_via_set!(Song => Album, albums);

// The song model keeps no view of the playlists that contain it; the
// playlist side owns that relation exclusively.
impl LinksTo<Playlist> for Song {
    fn links(&self) -> Vec<PlaylistId> {
        Vec::new()
    }

    fn is_linked(&self, _id: PlaylistId) -> bool {
        false
    }

    fn link(&mut self, _id: PlaylistId) {}

    fn unlink(&mut self, _id: PlaylistId) {}
}

/// Artist (album artist or podcast creator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    pub nationality: String,
    pub image: String,
    /// Albums credited to this artist
    pub albums: HashSet<AlbumId>,
    /// Podcasts this artist creates
    pub podcasts: HashSet<PodcastId>,
    pub version: i64,
}

impl Artist {
    pub fn new(name: impl Into<String>, nationality: impl Into<String>) -> Self {
        Self {
            id: ArtistId::new(),
            name: name.into(),
            nationality: nationality.into(),
            image: String::new(),
            albums: HashSet::new(),
            podcasts: HashSet::new(),
            version: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Artist name cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Entity for Artist {
    type Id = ArtistId;
    const KIND: &'static str = "artist";

    fn id(&self) -> ArtistId {
        self.id
    }

    fn display_key(&self) -> &str {
        &self.name
    }
}

links_via_set!(Artist => Album, albums);
links_via_set!(Artist => Podcast, podcasts);

/// Music genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
    /// Albums filed under this genre
    pub albums: HashSet<AlbumId>,
    pub version: i64,
}

impl Genre {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GenreId::new(),
            name: name.into(),
            albums: HashSet::new(),
            version: 0,
        }
    }
}

impl Entity for Genre {
    type Id = GenreId;
    const KIND: &'static str = "genre";

    fn id(&self) -> GenreId {
        self.id
    }

    fn display_key(&self) -> &str {
        &self.name
    }
}

links_via_set!(Genre => Album, albums);

/// Playlist owned by at most one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub created_on: NaiveDate,
    pub image: String,
    /// Owning user, if any
    pub owner: Option<UserId>,
    /// Songs on this playlist
    pub songs: HashSet<SongId>,
    pub version: i64,
}

impl Playlist {
    pub fn new(name: impl Into<String>, created_on: NaiveDate) -> Self {
        Self {
            id: PlaylistId::new(),
            name: name.into(),
            created_on,
            image: String::new(),
            owner: None,
            songs: HashSet::new(),
            version: 0,
        }
    }
}

impl Entity for Playlist {
    type Id = PlaylistId;
    const KIND: &'static str = "playlist";

    fn id(&self) -> PlaylistId {
        self.id
    }

    fn display_key(&self) -> &str {
        &self.name
    }
}

links_via_set!(Playlist => Song, songs);

// The reverse of user->playlist ownership is the single owner slot.
impl LinksTo<User> for Playlist {
    fn links(&self) -> Vec<UserId> {
        self.owner.into_iter().collect()
    }

    fn is_linked(&self, id: UserId) -> bool {
        self.owner == Some(id)
    }

    fn link(&mut self, id: UserId) {
        self.owner = Some(id);
    }

    fn unlink(&mut self, id: UserId) {
        if self.owner == Some(id) {
            self.owner = None;
        }
    }
}

/// Catalog user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub login: String,
    pub email: String,
    /// Playlists owned by this user
    pub playlists: HashSet<PlaylistId>,
    pub version: i64,
}

impl User {
    pub fn new(name: impl Into<String>, login: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            login: login.into(),
            email: email.into(),
            playlists: HashSet::new(),
            version: 0,
        }
    }
}

impl Entity for User {
    type Id = UserId;
    const KIND: &'static str = "user";

    fn id(&self) -> UserId {
        self.id
    }

    fn display_key(&self) -> &str {
        &self.name
    }
}

links_via_set!(User => Playlist, playlists);

/// Podcast with creators, themes and owned episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    pub id: PodcastId,
    pub title: String,
    pub rating: String,
    pub image: String,
    pub description: String,
    pub price: f64,
    /// Creators of this podcast
    pub creators: HashSet<ArtistId>,
    /// Episodes owned by this podcast (cascade-deleted with it)
    pub episodes: HashSet<EpisodeId>,
    /// Themes this podcast covers
    pub themes: HashSet<ThemeId>,
    pub version: i64,
}

impl Podcast {
    pub fn new(title: impl Into<String>, price: f64) -> Self {
        Self {
            id: PodcastId::new(),
            title: title.into(),
            rating: String::new(),
            image: String::new(),
            description: String::new(),
            price,
            creators: HashSet::new(),
            episodes: HashSet::new(),
            themes: HashSet::new(),
            version: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Podcast title cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Entity for Podcast {
    type Id = PodcastId;
    const KIND: &'static str = "podcast";

    fn id(&self) -> PodcastId {
        self.id
    }

    fn display_key(&self) -> &str {
        &self.title
    }
}

links_via_set!(Podcast => Artist, creators);
links_via_set!(Podcast => Theme, themes);

/// Podcast episode; unowned until assigned to a podcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub title: String,
    pub image: String,
    /// Duration in seconds
    pub duration_secs: i64,
    pub published_on: NaiveDate,
    /// Owning podcast, if assigned
    pub podcast: Option<PodcastId>,
    pub version: i64,
}

impl Episode {
    pub fn new(title: impl Into<String>, published_on: NaiveDate) -> Self {
        Self {
            id: EpisodeId::new(),
            title: title.into(),
            image: String::new(),
            duration_secs: 0,
            published_on,
            podcast: None,
            version: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Episode title cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Entity for Episode {
    type Id = EpisodeId;
    const KIND: &'static str = "episode";

    fn id(&self) -> EpisodeId {
        self.id
    }

    fn display_key(&self) -> &str {
        &self.title
    }
}

/// Podcast theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: ThemeId,
    pub name: String,
    /// Podcasts covering this theme
    pub podcasts: HashSet<PodcastId>,
    pub version: i64,
}

impl Theme {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ThemeId::new(),
            name: name.into(),
            podcasts: HashSet::new(),
            version: 0,
        }
    }
}

impl Entity for Theme {
    type Id = ThemeId;
    const KIND: &'static str = "theme";

    fn id(&self) -> ThemeId {
        self.id
    }

    fn display_key(&self) -> &str {
        &self.name
    }
}

links_via_set!(Theme => Podcast, podcasts);
