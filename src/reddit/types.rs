use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Listing order used when requesting posts from a subreddit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Hot,
    New,
    TopAll,
    TopYear,
    TopMonth,
    TopWeek,
    TopDay,
    TopHour,
}

impl SortMode {
    pub const ALL: [SortMode; 8] = [
        SortMode::Hot,
        SortMode::New,
        SortMode::TopAll,
        SortMode::TopYear,
        SortMode::TopMonth,
        SortMode::TopWeek,
        SortMode::TopDay,
        SortMode::TopHour,
    ];

    /// Path segment of the listing endpoint
    pub fn listing(&self) -> &'static str {
        match self {
            SortMode::Hot => "hot",
            SortMode::New => "new",
            _ => "top",
        }
    }

    /// Value of the `t` query parameter for top listings
    pub fn time_period(&self) -> Option<&'static str> {
        match self {
            SortMode::Hot | SortMode::New => None,
            SortMode::TopAll => Some("all"),
            SortMode::TopYear => Some("year"),
            SortMode::TopMonth => Some("month"),
            SortMode::TopWeek => Some("week"),
            SortMode::TopDay => Some("day"),
            SortMode::TopHour => Some("hour"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Hot => "hot",
            SortMode::New => "new",
            SortMode::TopAll => "top_all",
            SortMode::TopYear => "top_year",
            SortMode::TopMonth => "top_month",
            SortMode::TopWeek => "top_week",
            SortMode::TopDay => "top_day",
            SortMode::TopHour => "top_hour",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown sort mode `{0}` (expected one of hot, new, top_all, top_year, top_month, top_week, top_day, top_hour)")]
pub struct ParseSortModeError(pub String);

impl FromStr for SortMode {
    type Err = ParseSortModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ParseSortModeError(s.to_string()))
    }
}

/// A subreddit submission, reduced to what the playlist builder reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
}

/* ---------- Listing envelope ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing {
    pub data: RedditListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingData {
    #[serde(default)]
    pub children: Vec<RedditThing>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditThing {
    pub kind: String,
    pub data: RedditPost,
}

impl RedditListing {
    /// Submissions in listing order; anything that isn't a link (`t3`) is skipped.
    pub fn into_posts(self) -> Vec<RedditPost> {
        self.data
            .children
            .into_iter()
            .filter(|thing| thing.kind == "t3")
            .map(|thing| thing.data)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_mode_from_str() {
        for mode in SortMode::ALL {
            assert_eq!(mode.as_str().parse::<SortMode>(), Ok(mode));
        }
        assert_eq!(
            "top_decade".parse::<SortMode>(),
            Err(ParseSortModeError("top_decade".to_string()))
        );
    }

    #[test]
    fn test_sort_mode_listing() {
        assert_eq!(SortMode::Hot.listing(), "hot");
        assert_eq!(SortMode::Hot.time_period(), None);
        assert_eq!(SortMode::TopWeek.listing(), "top");
        assert_eq!(SortMode::TopWeek.time_period(), Some("week"));
    }

    #[test]
    fn test_listing_deserialize() {
        let body = r#"{
            "kind": "Listing",
            "data": {
                "after": "t3_abc2",
                "children": [
                    {"kind": "t3", "data": {"id": "abc1", "title": "Artist A -- Song One [Genre] (2020)", "score": 12}},
                    {"kind": "t3", "data": {"id": "abc2", "title": "not a valid title"}}
                ]
            }
        }"#;
        let listing: RedditListing = serde_json::from_str(body).unwrap();
        assert_eq!(listing.data.after.as_deref(), Some("t3_abc2"));
        let posts = listing.into_posts();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "abc1");
        assert_eq!(posts[1].title, "not a valid title");
    }

    #[test]
    fn test_empty_listing_deserialize() {
        let body = r#"{"kind": "Listing", "data": {"after": null, "children": []}}"#;
        let listing: RedditListing = serde_json::from_str(body).unwrap();
        assert!(listing.into_posts().is_empty());
    }
}
