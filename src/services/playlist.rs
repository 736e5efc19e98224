use std::collections::HashSet;
use std::fmt;

use color_eyre::eyre::{Result, WrapErr};

use crate::ports::spotify::{CatalogClient, MAX_TRACKS_PER_REQUEST, SpotifyApiPlaylist};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite the playlist with exactly the given tracks
    Replace,
    /// Only add tracks the playlist doesn't have yet
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistWriteSummary {
    pub playlist_id: String,
    pub playlist_name: String,
    pub created: bool,
    pub mode: WriteMode,
    /// Tracks written: the full set on replace, only the new ones on append
    pub written: usize,
}

impl fmt::Display for PlaylistWriteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            WriteMode::Replace => write!(
                f,
                "Replaced {} tracks in '{}'",
                self.written, self.playlist_name
            ),
            WriteMode::Append => write!(
                f,
                "Added {} tracks to '{}'",
                self.written, self.playlist_name
            ),
        }
    }
}

/// Uris from `resolved` missing from `current`, in order and without repeats.
pub fn new_tracks(resolved: &[String], current: &[String]) -> Vec<String> {
    let mut present: HashSet<&str> = current.iter().map(String::as_str).collect();
    resolved
        .iter()
        .filter(|uri| present.insert(uri.as_str()))
        .cloned()
        .collect()
}

/// Writes resolved tracks into a playlist owned by `username`.
pub struct PlaylistWriter<'a, C: CatalogClient> {
    client: &'a C,
    username: String,
}

impl<'a, C: CatalogClient> PlaylistWriter<'a, C> {
    pub fn new(client: &'a C, username: impl Into<String>) -> Self {
        Self {
            client,
            username: username.into(),
        }
    }

    /// First of the user's playlists with this exact name that the user owns
    pub async fn find_playlist(&self, name: &str) -> Result<Option<SpotifyApiPlaylist>> {
        let playlists = self.client.user_playlists(&self.username).await?;
        Ok(playlists
            .into_iter()
            .find(|playlist| playlist.name == name && playlist.owner_id == self.username))
    }

    /// The existing playlist, or a new empty one. The flag is true when created.
    pub async fn find_or_create(&self, name: &str) -> Result<(SpotifyApiPlaylist, bool)> {
        if let Some(playlist) = self.find_playlist(name).await? {
            tracing::debug!("Found playlist {} ({})", playlist.name, playlist.id);
            return Ok((playlist, false));
        }

        let playlist = self
            .client
            .create_playlist(&self.username, name)
            .await
            .wrap_err_with(|| format!("Failed to create playlist '{name}'"))?;
        tracing::info!("Created playlist {} ({})", playlist.name, playlist.id);
        Ok((playlist, true))
    }

    #[tracing::instrument(skip(self, uris), fields(tracks = uris.len()))]
    pub async fn write(
        &self,
        name: &str,
        uris: &[String],
        mode: WriteMode,
    ) -> Result<PlaylistWriteSummary> {
        let (playlist, created) = self.find_or_create(name).await?;

        let written = match mode {
            WriteMode::Replace => {
                self.replace(&playlist.id, uris).await?;
                uris.len()
            }
            WriteMode::Append => self.append_new(&playlist.id, uris).await?,
        };

        Ok(PlaylistWriteSummary {
            playlist_id: playlist.id,
            playlist_name: playlist.name,
            created,
            mode,
            written,
        })
    }

    async fn replace(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let mut chunks = uris.chunks(MAX_TRACKS_PER_REQUEST);
        let first = chunks.next().unwrap_or_default();
        self.client
            .replace_playlist_tracks(playlist_id, first)
            .await?;
        for chunk in chunks {
            self.client.add_playlist_tracks(playlist_id, chunk).await?;
        }
        tracing::info!("Replaced playlist {} with {} tracks", playlist_id, uris.len());
        Ok(())
    }

    async fn append_new(&self, playlist_id: &str, uris: &[String]) -> Result<usize> {
        let current = self.client.playlist_track_uris(playlist_id).await?;
        let new = new_tracks(uris, &current);
        if new.is_empty() {
            tracing::info!("Playlist {} already has every track", playlist_id);
            return Ok(0);
        }

        for chunk in new.chunks(MAX_TRACKS_PER_REQUEST) {
            self.client.add_playlist_tracks(playlist_id, chunk).await?;
        }
        tracing::info!("Added {} tracks to playlist {}", new.len(), playlist_id);
        Ok(new.len())
    }
}
