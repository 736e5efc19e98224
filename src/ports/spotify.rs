use color_eyre::eyre::Result;

/// Most uris the playlist item endpoints accept in one request
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// Decoupled representation of a Spotify playlist from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiPlaylist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

/// Outcome of a track search: the reported total and the uris of the returned page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpotifyApiSearchResult {
    pub total: u32,
    pub track_uris: Vec<String>,
}

/// Port trait wrapping the Spotify API capabilities used by business logic.
///
/// Implementations live in `spotify_rs::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<SpotifyApiSearchResult>;

    /// Every playlist visible on the user's profile, all pages followed.
    async fn user_playlists(&self, user_id: &str) -> Result<Vec<SpotifyApiPlaylist>>;

    async fn create_playlist(&self, user_id: &str, name: &str) -> Result<SpotifyApiPlaylist>;

    /// Uris of every track in the playlist, all pages followed.
    async fn playlist_track_uris(&self, playlist_id: &str) -> Result<Vec<String>>;

    /// Overwrite the playlist with at most 100 uris.
    async fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;

    /// Append at most 100 uris to the end of the playlist.
    async fn add_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;
}
