use serde::{Deserialize, Serialize};

use crate::ports::spotify::{SpotifyApiPlaylist, SpotifyApiSearchResult};

/// Spotify OAuth token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
}

/// Generic paging object returned by list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<Option<T>>,
    pub next: Option<String>,
    #[serde(default)]
    pub total: u32,
}

/// Spotify playlist from API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    pub owner: SpotifyPlaylistOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylistOwner {
    pub id: String,
}

impl From<SpotifyPlaylist> for SpotifyApiPlaylist {
    fn from(playlist: SpotifyPlaylist) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
            owner_id: playlist.owner.id,
        }
    }
}

/// Spotify track from API, only the fields the playlist builder needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub uri: String,
}

/// Entry of a playlist's track list; `track` is null for removed/unavailable items
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylistItem {
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifySearchResponse {
    pub tracks: SpotifyPage<SpotifyTrack>,
}

impl From<SpotifySearchResponse> for SpotifyApiSearchResult {
    fn from(response: SpotifySearchResponse) -> Self {
        Self {
            total: response.tracks.total,
            track_uris: response
                .tracks
                .items
                .into_iter()
                .flatten()
                .map(|track| track.uri)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest<'a> {
    pub name: &'a str,
    pub public: bool,
    pub description: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistUrisRequest<'a> {
    pub uris: &'a [String],
}

/// PKCE OAuth session data
#[derive(Debug, Clone)]
pub struct OAuthSession {
    pub code_verifier: String,
    pub created_at: i64,
}

/// Response for authentication initiation
#[derive(Debug, Clone)]
pub struct SpotifyAuthResponse {
    pub auth_url: String,
    pub state: String,
}
