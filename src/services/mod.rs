//! Service layer: entity lifecycle and association management.
//!
//! One CRUD service per entity type, a single generic [`AssociationService`]
//! parameterized by the relation's endpoints and validation rules, and the
//! owned podcast-episode service whose replace semantics differ from the
//! generic union behavior.

pub mod album;
pub mod artist;
pub mod association;
pub mod checker;
pub mod episode;
pub mod genre;
pub mod links;
pub mod playlist;
pub mod podcast;
pub mod podcast_episode;
pub mod song;
pub mod theme;
pub mod user;

pub use album::AlbumService;
pub use artist::ArtistService;
pub use association::{AssociationRules, AssociationService, Uniqueness};
pub use checker::require;
pub use episode::EpisodeService;
pub use genre::GenreService;
pub use playlist::PlaylistService;
pub use podcast::PodcastService;
pub use podcast_episode::PodcastEpisodeService;
pub use song::SongService;
pub use theme::ThemeService;
pub use user::UserService;
