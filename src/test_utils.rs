use crate::ports::spotify::SpotifyApiSearchResult;
use crate::reddit::types::RedditPost;

pub fn post(id: &str, title: &str) -> RedditPost {
    RedditPost {
        id: id.to_string(),
        title: title.to_string(),
    }
}

/// Search result with a single match
pub fn search_hit(uri: &str) -> SpotifyApiSearchResult {
    SpotifyApiSearchResult {
        total: 1,
        track_uris: vec![uri.to_string()],
    }
}

pub fn search_miss() -> SpotifyApiSearchResult {
    SpotifyApiSearchResult::default()
}

pub fn uris(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| format!("spotify:track:{id}")).collect()
}
