use color_eyre::eyre::Result;

use crate::reddit::types::{RedditPost, SortMode};

/// Port trait wrapping the subreddit listing used by the aggregation loop.
///
/// Implementations live in `reddit::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch up to `limit` posts, continuing after the post with id `after`.
    /// An empty page means the listing is exhausted.
    async fn fetch_posts(
        &self,
        subreddit: &str,
        sort: SortMode,
        after: Option<String>,
        limit: u32,
    ) -> Result<Vec<RedditPost>>;
}
