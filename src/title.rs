use color_eyre::eyre::{Result, WrapErr};
use regex::Regex;

/// An artist/track pair pulled out of a post title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Track {
    pub artist: String,
    pub title: String,
}

impl Track {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

/// Everything the title pattern captures. Only `track` is used downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub track: Track,
    pub genre: String,
    pub year: String,
}

/// Parses titles in the form "Artist -- Track [genre / genres] (year)".
pub struct TitleParser {
    title_re: Regex,
}

impl TitleParser {
    pub fn new() -> Result<Self> {
        let title_re = Regex::new(
            r"^(?P<artist>.*?) -+ (?P<track>.*?) \[(?P<genre>.*?)\] \((?P<year>\d+)\)",
        )
        .wrap_err("Failed to create title regex")?;
        Ok(Self { title_re })
    }

    /// `None` when the title doesn't follow the pattern.
    pub fn parse(&self, title: &str) -> Option<ParsedTitle> {
        let captures = self.title_re.captures(title)?;
        Some(ParsedTitle {
            track: Track::new(&captures["artist"], &captures["track"]),
            genre: captures["genre"].to_string(),
            year: captures["year"].to_string(),
        })
    }
}
