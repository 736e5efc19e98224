use std::collections::HashSet;

use color_eyre::eyre::Result;

use crate::ports::reddit::PostSource;
use crate::ports::spotify::CatalogClient;
use crate::reddit::types::{RedditPost, SortMode};
use crate::services::resolver::TrackResolver;
use crate::title::{TitleParser, Track};

/// What to do when a resolved uri is already in the accumulated list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Drop repeats, so every uri appears at most once
    #[default]
    SkipDuplicates,
    /// Keep every resolved uri, in the order found
    Keep,
}

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub subreddit: String,
    pub sort: SortMode,
    /// Number of posts requested per listing page
    pub page_size: u32,
    pub duplicates: DuplicatePolicy,
}

/// Walks a subreddit listing page by page, collecting spotify uris for the
/// tracks named in post titles.
pub struct TrackAggregator<'p, 'r, P: PostSource, C: CatalogClient> {
    posts: &'p P,
    parser: &'p TitleParser,
    resolver: TrackResolver<'r, C>,
    options: AggregateOptions,
}

impl<'p, 'r, P: PostSource, C: CatalogClient> TrackAggregator<'p, 'r, P, C> {
    pub fn new(
        posts: &'p P,
        parser: &'p TitleParser,
        resolver: TrackResolver<'r, C>,
        options: AggregateOptions,
    ) -> Self {
        Self {
            posts,
            parser,
            resolver,
            options,
        }
    }

    /// Tracks parsed from the post titles; unparseable titles are dropped.
    pub fn parse_posts(&self, posts: &[RedditPost]) -> Vec<Track> {
        posts
            .iter()
            .filter_map(|post| match self.parser.parse(&post.title) {
                Some(parsed) => {
                    tracing::trace!(
                        "Post {}: {:?} ({}, {})",
                        post.id,
                        parsed.track,
                        parsed.genre,
                        parsed.year
                    );
                    Some(parsed.track)
                }
                None => {
                    tracing::debug!("Skipping post {} with unparseable title: {}", post.id, post.title);
                    None
                }
            })
            .collect()
    }

    /// Collect up to `target` uris. Returns fewer only when the listing runs out.
    #[tracing::instrument(skip(self), fields(subreddit = %self.options.subreddit, sort = %self.options.sort))]
    pub async fn collect(&mut self, target: usize) -> Result<Vec<String>> {
        let mut uris: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut last_id: Option<String> = None;

        while uris.len() < target {
            let posts = self
                .posts
                .fetch_posts(
                    &self.options.subreddit,
                    self.options.sort,
                    last_id.clone(),
                    self.options.page_size,
                )
                .await?;

            let Some(last_post) = posts.last() else {
                tracing::info!(
                    "Listing exhausted after {} of {} tracks",
                    uris.len(),
                    target
                );
                return Ok(uris);
            };
            last_id = Some(last_post.id.clone());

            let tracks = self.parse_posts(&posts);
            tracing::debug!("Parsed {} tracks from {} posts", tracks.len(), posts.len());

            for track in tracks {
                let Some(uri) = self.resolver.resolve(&track).await? else {
                    continue;
                };
                match self.options.duplicates {
                    DuplicatePolicy::SkipDuplicates if !seen.insert(uri.clone()) => {
                        tracing::debug!("Skipping duplicate {}", uri);
                    }
                    _ => uris.push(uri),
                }
            }
        }

        uris.truncate(target);
        Ok(uris)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};

    use super::*;
    use crate::cache::{TrackCache, resolved_only};
    use crate::ports::reddit::MockPostSource;
    use crate::ports::spotify::MockCatalogClient;
    use crate::test_utils::{post, search_hit, search_miss};

    fn options(duplicates: DuplicatePolicy) -> AggregateOptions {
        AggregateOptions {
            subreddit: "listentothis".into(),
            sort: SortMode::Hot,
            page_size: 25,
            duplicates,
        }
    }

    /// A listing that serves `pages` in order and then nothing, checking the
    /// cursor passed on every call.
    fn paged_source(pages: Vec<Vec<RedditPost>>) -> MockPostSource {
        let mut pages: VecDeque<Vec<RedditPost>> = pages.into();
        let mut expected_after: Option<String> = None;
        let mut source = MockPostSource::new();
        source
            .expect_fetch_posts()
            .returning(move |_, _, after, _| {
                assert_eq!(after, expected_after, "unexpected cursor");
                let page = pages.pop_front().unwrap_or_default();
                if let Some(last) = page.last() {
                    expected_after = Some(last.id.clone());
                }
                Ok(page)
            });
        source
    }

    /// A catalog that knows the uri of each listed title.
    fn catalog(known: &[(&str, &str)]) -> MockCatalogClient {
        let known: HashMap<String, String> = known
            .iter()
            .map(|(title, uri)| (title.to_string(), uri.to_string()))
            .collect();
        let mut client = MockCatalogClient::new();
        client.expect_search_tracks().returning(move |query, _| {
            Ok(known
                .iter()
                .find(|(title, _)| query.contains(&format!("track:'{title}'")))
                .map(|(_, uri)| search_hit(uri))
                .unwrap_or_else(search_miss))
        });
        client
    }

    fn titled(id: &str, artist: &str, title: &str) -> RedditPost {
        post(id, &format!("{artist} -- {title} [Genre] (2020)"))
    }

    #[tokio::test]
    async fn test_invalid_titles_are_skipped() {
        let source = paged_source(vec![vec![
            post("a1", "Artist A -- Song One [Genre] (2020)"),
            post("a2", "not a valid title"),
        ]]);
        let client = catalog(&[("Song One", "spotify:track:1")]);
        let parser = TitleParser::new().unwrap();

        let mut aggregator = TrackAggregator::new(
            &source,
            &parser,
            TrackResolver::new(&client, None),
            options(DuplicatePolicy::default()),
        );
        let uris = aggregator.collect(5).await.unwrap();
        assert_eq!(uris, vec!["spotify:track:1"]);
    }

    #[test]
    fn test_parse_posts() {
        let source = MockPostSource::new();
        let client = MockCatalogClient::new();
        let parser = TitleParser::new().unwrap();
        let aggregator = TrackAggregator::new(
            &source,
            &parser,
            TrackResolver::new(&client, None),
            options(DuplicatePolicy::default()),
        );

        let tracks = aggregator.parse_posts(&[
            post("a1", "Artist A -- Song One [Genre] (2020)"),
            post("a2", "not a valid title"),
        ]);
        assert_eq!(tracks, vec![Track::new("Artist A", "Song One")]);
    }

    #[tokio::test]
    async fn test_exhausted_source_returns_fewer_than_target() {
        let source = paged_source(vec![vec![
            titled("a1", "A", "One"),
            titled("a2", "B", "Two"),
            titled("a3", "C", "Three"),
        ]]);
        let client = catalog(&[
            ("One", "spotify:track:1"),
            ("Two", "spotify:track:2"),
            ("Three", "spotify:track:3"),
        ]);
        let parser = TitleParser::new().unwrap();

        let mut aggregator = TrackAggregator::new(
            &source,
            &parser,
            TrackResolver::new(&client, None),
            options(DuplicatePolicy::default()),
        );
        let uris = aggregator.collect(5).await.unwrap();
        assert_eq!(uris, vec!["spotify:track:1", "spotify:track:2", "spotify:track:3"]);
    }

    #[tokio::test]
    async fn test_pages_until_target_and_truncates() {
        let source = paged_source(vec![
            vec![titled("a1", "A", "One"), titled("a2", "B", "Missing")],
            vec![
                titled("b1", "C", "Two"),
                titled("b2", "D", "Three"),
                titled("b3", "E", "Four"),
            ],
        ]);
        let client = catalog(&[
            ("One", "spotify:track:1"),
            ("Two", "spotify:track:2"),
            ("Three", "spotify:track:3"),
            ("Four", "spotify:track:4"),
        ]);
        let parser = TitleParser::new().unwrap();

        let mut aggregator = TrackAggregator::new(
            &source,
            &parser,
            TrackResolver::new(&client, None),
            options(DuplicatePolicy::default()),
        );
        let uris = aggregator.collect(3).await.unwrap();
        assert_eq!(uris, vec!["spotify:track:1", "spotify:track:2", "spotify:track:3"]);
    }

    #[tokio::test]
    async fn test_page_of_unparseable_titles_keeps_paging() {
        let source = paged_source(vec![
            vec![post("a1", "discussion thread"), post("a2", "weekly roundup")],
            vec![titled("b1", "A", "One")],
        ]);
        let client = catalog(&[("One", "spotify:track:1")]);
        let parser = TitleParser::new().unwrap();

        let mut aggregator = TrackAggregator::new(
            &source,
            &parser,
            TrackResolver::new(&client, None),
            options(DuplicatePolicy::default()),
        );
        let uris = aggregator.collect(1).await.unwrap();
        assert_eq!(uris, vec!["spotify:track:1"]);
    }

    #[tokio::test]
    async fn test_zero_target_fetches_nothing() {
        let source = MockPostSource::new();
        let client = MockCatalogClient::new();
        let parser = TitleParser::new().unwrap();

        let mut aggregator = TrackAggregator::new(
            &source,
            &parser,
            TrackResolver::new(&client, None),
            options(DuplicatePolicy::default()),
        );
        assert!(aggregator.collect(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_skipped_across_pages() {
        let source = paged_source(vec![
            vec![titled("a1", "A", "One"), titled("a2", "A", "One")],
            vec![titled("b1", "A", "One"), titled("b2", "B", "Two")],
        ]);
        let client = catalog(&[("One", "spotify:track:1"), ("Two", "spotify:track:2")]);
        let parser = TitleParser::new().unwrap();

        let mut aggregator = TrackAggregator::new(
            &source,
            &parser,
            TrackResolver::new(&client, None),
            options(DuplicatePolicy::SkipDuplicates),
        );
        let uris = aggregator.collect(10).await.unwrap();
        assert_eq!(uris, vec!["spotify:track:1", "spotify:track:2"]);
    }

    #[tokio::test]
    async fn test_duplicates_kept_when_requested() {
        let source = paged_source(vec![
            vec![titled("a1", "A", "One"), titled("a2", "A", "One")],
            vec![titled("b1", "B", "Two")],
        ]);
        let client = catalog(&[("One", "spotify:track:1"), ("Two", "spotify:track:2")]);
        let parser = TitleParser::new().unwrap();

        let mut aggregator = TrackAggregator::new(
            &source,
            &parser,
            TrackResolver::new(&client, None),
            options(DuplicatePolicy::Keep),
        );
        let uris = aggregator.collect(10).await.unwrap();
        assert_eq!(
            uris,
            vec!["spotify:track:1", "spotify:track:1", "spotify:track:2"]
        );
    }

    #[tokio::test]
    async fn test_repeat_posts_hit_the_cache() {
        let source = paged_source(vec![vec![
            titled("a1", "A", "One"),
            titled("a2", "A", "One"),
        ]]);
        let mut client = MockCatalogClient::new();
        client
            .expect_search_tracks()
            .times(1)
            .returning(|_, _| Ok(search_hit("spotify:track:1")));
        let parser = TitleParser::new().unwrap();
        let mut cache = TrackCache::in_memory(resolved_only());

        let mut aggregator = TrackAggregator::new(
            &source,
            &parser,
            TrackResolver::new(&client, Some(&mut cache)),
            options(DuplicatePolicy::Keep),
        );
        let uris = aggregator.collect(2).await.unwrap();
        assert_eq!(uris.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_aborts() {
        let mut source = MockPostSource::new();
        source
            .expect_fetch_posts()
            .returning(|_, _, _, _| Err(color_eyre::eyre::eyre!("reddit is down")));
        let client = MockCatalogClient::new();
        let parser = TitleParser::new().unwrap();

        let mut aggregator = TrackAggregator::new(
            &source,
            &parser,
            TrackResolver::new(&client, None),
            options(DuplicatePolicy::default()),
        );
        assert!(aggregator.collect(5).await.is_err());
    }
}
