use std::collections::HashMap;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::title::Track;

/// Decides whether a search outcome may be memoized.
pub type AcceptPredicate = Box<dyn Fn(Option<&str>) -> bool + Send + Sync>;

/// Only memoize tracks that were actually found, so misses are retried next run.
pub fn resolved_only() -> AcceptPredicate {
    Box::new(|uri| uri.is_some())
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    artist: String,
    title: String,
    uri: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    entries: Vec<CacheEntry>,
}

/// Track -> spotify uri memo, persisted as JSON between runs.
pub struct TrackCache {
    path: Option<PathBuf>,
    entries: HashMap<Track, Option<String>>,
    accept: AcceptPredicate,
}

impl TrackCache {
    /// A cache that is never written to disk
    pub fn in_memory(accept: AcceptPredicate) -> Self {
        Self {
            path: None,
            entries: HashMap::new(),
            accept,
        }
    }

    /// Load the cache stored at `path`. A missing file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>, accept: AcceptPredicate) -> Result<Self> {
        let path = path.into();
        let mut entries = HashMap::new();

        if path.is_file() {
            let contents = std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("Failed to read track cache: {}", path.display()))?;
            let file: CacheFile = serde_json::from_str(&contents)
                .wrap_err_with(|| format!("Failed to parse track cache: {}", path.display()))?;

            for entry in file.entries {
                if accept(entry.uri.as_deref()) {
                    entries.insert(Track::new(entry.artist, entry.title), entry.uri);
                }
            }
            tracing::debug!("Loaded {} cached tracks from {}", entries.len(), path.display());
        } else {
            tracing::debug!("No track cache at {}, starting empty", path.display());
        }

        Ok(Self {
            path: Some(path),
            entries,
            accept,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// `Some` on a hit; the inner value is the memoized search outcome.
    pub fn get(&self, track: &Track) -> Option<Option<&str>> {
        self.entries.get(track).map(|uri| uri.as_deref())
    }

    /// Store `uri` for `track` if the accept predicate allows it.
    /// Returns whether the entry was stored.
    pub fn insert(&mut self, track: Track, uri: Option<String>) -> bool {
        if !(self.accept)(uri.as_deref()) {
            return false;
        }
        self.entries.insert(track, uri);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite the cache file with the current entries. No-op for in-memory caches.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut entries: Vec<CacheEntry> = self
            .entries
            .iter()
            .filter(|(_, uri)| (self.accept)(uri.as_deref()))
            .map(|(track, uri)| CacheEntry {
                artist: track.artist.clone(),
                title: track.title.clone(),
                uri: uri.clone(),
            })
            .collect();
        entries.sort_by(|a, b| (&a.artist, &a.title).cmp(&(&b.artist, &b.title)));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(&CacheFile { entries })
            .wrap_err("Failed to serialize track cache")?;
        std::fs::write(path, contents)
            .wrap_err_with(|| format!("Failed to write track cache: {}", path.display()))?;

        tracing::debug!("Saved {} cached tracks to {}", self.len(), path.display());
        Ok(())
    }
}
