use color_eyre::eyre::Result;

use crate::cache::TrackCache;
use crate::ports::spotify::CatalogClient;
use crate::title::Track;

/// Spotify search query pinning both artist and track name
pub fn search_query(track: &Track) -> String {
    format!("artist:'{}' track:'{}'", track.artist, track.title)
}

/// Looks tracks up on spotify, consulting the cache first when one is attached.
pub struct TrackResolver<'a, C: CatalogClient> {
    client: &'a C,
    cache: Option<&'a mut TrackCache>,
}

impl<'a, C: CatalogClient> TrackResolver<'a, C> {
    pub fn new(client: &'a C, cache: Option<&'a mut TrackCache>) -> Self {
        Self { client, cache }
    }

    /// The uri of the best match for `track`, or `None` when spotify has nothing.
    #[tracing::instrument(skip(self, track), fields(artist = %track.artist, title = %track.title))]
    pub async fn resolve(&mut self, track: &Track) -> Result<Option<String>> {
        if let Some(cache) = self.cache.as_deref() {
            if let Some(uri) = cache.get(track) {
                tracing::debug!("Cache hit");
                return Ok(uri.map(str::to_string));
            }
        }

        let uri = self.search(track).await?;

        if let Some(cache) = self.cache.as_deref_mut() {
            cache.insert(track.clone(), uri.clone());
        }

        Ok(uri)
    }

    async fn search(&self, track: &Track) -> Result<Option<String>> {
        let result = self.client.search_tracks(&search_query(track), 1).await?;
        if result.total == 0 {
            tracing::debug!("No spotify match");
            return Ok(None);
        }
        Ok(result.track_uris.into_iter().next())
    }
}
