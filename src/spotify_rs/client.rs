use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::de::DeserializeOwned;

use crate::ports::spotify::{CatalogClient, SpotifyApiPlaylist, SpotifyApiSearchResult};
use crate::spotify_rs::types::{
    CreatePlaylistRequest, PlaylistUrisRequest, SpotifyPage, SpotifyPlaylist,
    SpotifyPlaylistItem, SpotifySearchResponse,
};

const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Spotify API client
pub struct SpotifyClient {
    access_token: String,
    client: reqwest::Client,
}

impl SpotifyClient {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Follow `next` links until the listing runs out
    async fn get_all_pages<T: DeserializeOwned>(&self, first_url: String) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        let mut next_url = Some(first_url);

        while let Some(url) = next_url {
            let page: SpotifyPage<T> = self.get_json(&url).await?;
            all_items.extend(page.items.into_iter().flatten());
            next_url = page.next;
        }

        Ok(all_items)
    }

    /// Search for tracks matching a query
    pub async fn search(&self, query: &str, limit: u32) -> Result<SpotifySearchResponse> {
        let url = format!(
            "{}/search?q={}&type=track&limit={}",
            SPOTIFY_API_URL,
            urlencoding::encode(query),
            limit
        );
        self.get_json(&url)
            .await
            .wrap_err_with(|| format!("Failed to search spotify for: {query}"))
    }

    /// Get all public playlists for a user
    pub async fn get_user_playlists(&self, user_id: &str) -> Result<Vec<SpotifyPlaylist>> {
        self.get_all_pages(format!(
            "{}/users/{}/playlists?limit=50",
            SPOTIFY_API_URL,
            urlencoding::encode(user_id)
        ))
        .await
        .wrap_err_with(|| format!("Failed to list playlists for user {user_id}"))
    }

    /// Get all tracks in a playlist
    pub async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyPlaylistItem>> {
        self.get_all_pages(format!(
            "{}/playlists/{}/tracks?limit=100&fields=items(track(uri)),next,total",
            SPOTIFY_API_URL, playlist_id
        ))
        .await
        .wrap_err_with(|| format!("Failed to fetch tracks of playlist {playlist_id}"))
    }

    /// Create an empty public playlist owned by the user
    pub async fn create_user_playlist(&self, user_id: &str, name: &str) -> Result<SpotifyPlaylist> {
        let playlist = self
            .client
            .post(format!(
                "{}/users/{}/playlists",
                SPOTIFY_API_URL,
                urlencoding::encode(user_id)
            ))
            .bearer_auth(&self.access_token)
            .json(&CreatePlaylistRequest {
                name,
                public: true,
                description: "",
            })
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()
            .wrap_err_with(|| format!("Failed to create playlist {name}"))?
            .json::<SpotifyPlaylist>()
            .await?;

        Ok(playlist)
    }

    async fn send_playlist_uris(
        &self,
        method: reqwest::Method,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<()> {
        self.client
            .request(
                method,
                format!("{}/playlists/{}/tracks", SPOTIFY_API_URL, playlist_id),
            )
            .bearer_auth(&self.access_token)
            .json(&PlaylistUrisRequest { uris })
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogClient for SpotifyClient {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<SpotifyApiSearchResult> {
        Ok(self.search(query, limit).await?.into())
    }

    async fn user_playlists(&self, user_id: &str) -> Result<Vec<SpotifyApiPlaylist>> {
        Ok(self
            .get_user_playlists(user_id)
            .await?
            .into_iter()
            .map(SpotifyApiPlaylist::from)
            .collect())
    }

    async fn create_playlist(&self, user_id: &str, name: &str) -> Result<SpotifyApiPlaylist> {
        Ok(self.create_user_playlist(user_id, name).await?.into())
    }

    async fn playlist_track_uris(&self, playlist_id: &str) -> Result<Vec<String>> {
        Ok(self
            .get_playlist_tracks(playlist_id)
            .await?
            .into_iter()
            .filter_map(|item| item.track)
            .map(|track| track.uri)
            .collect())
    }

    async fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        self.send_playlist_uris(reqwest::Method::PUT, playlist_id, uris)
            .await
            .wrap_err_with(|| format!("Failed to replace tracks of playlist {playlist_id}"))
    }

    async fn add_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        self.send_playlist_uris(reqwest::Method::POST, playlist_id, uris)
            .await
            .wrap_err_with(|| format!("Failed to add tracks to playlist {playlist_id}"))
    }
}
