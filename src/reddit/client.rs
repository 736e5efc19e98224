use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use reqwest::Client;
use url::Url;

use crate::ports::reddit::PostSource;
use crate::reddit::types::{RedditListing, RedditPost, SortMode};

const REDDIT_BASE_URL: &str = "https://www.reddit.com/";

/// Reddit refuses listings larger than this
pub const MAX_PAGE_SIZE: u32 = 100;

pub const DEFAULT_USER_AGENT: &str =
    concat!("reddit-playlist/", env!("CARGO_PKG_VERSION"), " (spotify playlist builder)");

/// Build the listing URL for a page of posts.
///
/// `after` is the bare id of the last post seen; reddit expects the `t3_` fullname.
pub fn listing_url(
    base_url: &Url,
    subreddit: &str,
    sort: SortMode,
    after: Option<&str>,
    limit: u32,
) -> Result<Url> {
    let mut url = base_url
        .join(&format!(
            "r/{}/{}.json",
            urlencoding::encode(subreddit),
            sort.listing()
        ))
        .wrap_err("Failed to build reddit listing url")?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("limit", &limit.min(MAX_PAGE_SIZE).to_string());
        query.append_pair("raw_json", "1");
        if let Some(period) = sort.time_period() {
            query.append_pair("t", period);
        }
        if let Some(after) = after {
            query.append_pair("after", &format!("t3_{after}"));
        }
    }

    Ok(url)
}

/// Anonymous client for reddit's public JSON listings
pub struct RedditHttpAdapter {
    client: Client,
    base_url: Url,
}

impl RedditHttpAdapter {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .wrap_err("Failed to build reddit http client")?;
        let base_url = Url::parse(REDDIT_BASE_URL).wrap_err("Failed to parse reddit base url")?;
        Ok(Self { client, base_url })
    }
}

#[async_trait::async_trait]
impl PostSource for RedditHttpAdapter {
    async fn fetch_posts(
        &self,
        subreddit: &str,
        sort: SortMode,
        after: Option<String>,
        limit: u32,
    ) -> Result<Vec<RedditPost>> {
        let url = listing_url(&self.base_url, subreddit, sort, after.as_deref(), limit)?;
        tracing::debug!("Fetching reddit listing: {}", url);

        let listing = self
            .client
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?
            .json::<RedditListing>()
            .await
            .wrap_err("Failed to deserialize reddit listing")?;

        if listing.data.after.is_none() {
            tracing::debug!("Reddit reports no further pages for r/{}", subreddit);
        }
        Ok(listing.into_posts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse(REDDIT_BASE_URL).unwrap()
    }

    #[test]
    fn test_listing_url_hot_first_page() {
        let url = listing_url(&base(), "listentothis", SortMode::Hot, None, 25).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.reddit.com/r/listentothis/hot.json?limit=25&raw_json=1"
        );
    }

    #[test]
    fn test_listing_url_top_with_cursor() {
        let url = listing_url(&base(), "listentothis", SortMode::TopMonth, Some("abc123"), 50)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.reddit.com/r/listentothis/top.json?limit=50&raw_json=1&t=month&after=t3_abc123"
        );
    }

    #[test]
    fn test_listing_url_clamps_limit() {
        let url = listing_url(&base(), "music", SortMode::New, None, 500).unwrap();
        assert!(url.as_str().contains("limit=100"));
    }
}
