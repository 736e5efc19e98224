use std::path::{Path, PathBuf};

use color_eyre::eyre::{OptionExt, Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::reddit::client::DEFAULT_USER_AGENT;
use crate::spotify_rs::auth::SpotifyApiCredentials;

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

const DEFAULT_CONFIG: &str = r#"# reddit-playlist configuration

# Where resolved tracks are memoized between runs
# cache_file = "~/.cache/reddit-playlist/tracks.json"

[spotify]
# Create an app at https://developer.spotify.com/dashboard
client_id = ""
client_secret = ""
# Printed by `reddit-playlist login`
refresh_token = ""
redirect_uri = "http://127.0.0.1:8888/callback"

[reddit]
# user_agent = "reddit-playlist/0.1 (by /u/your-name)"
"#;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    cache_file: Option<String>,
    #[serde(default)]
    spotify: SpotifyConfig,
    #[serde(default)]
    reddit: RedditConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedditConfig {
    pub user_agent: Option<String>,
}

/// Config value, falling back to an environment variable. Empty strings count as unset.
fn setting(value: Option<&String>, env_key: &str) -> Option<String> {
    let is_set = |value: &String| !value.trim().is_empty();
    value
        .filter(|value| is_set(value))
        .cloned()
        .or_else(|| std::env::var(env_key).ok().filter(is_set))
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("reddit-playlist").join("config.toml"))
    }

    /// Load the default config file, or defaults when there is none
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the commented default config, unless one already exists
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_eyre("No config directory on this platform")?;
        if path.exists() {
            tracing::info!("Config already exists at {}", path.display());
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        std::fs::write(&path, DEFAULT_CONFIG)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(path)
    }

    /// Expand ~ to home directory
    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Track cache location: configured, or under the platform cache dir
    pub fn cache_path(&self) -> Option<PathBuf> {
        match &self.cache_file {
            Some(path) => Some(Self::expand_path(path)),
            None => {
                dirs::cache_dir().map(|path| path.join("reddit-playlist").join("tracks.json"))
            }
        }
    }

    pub fn spotify_credentials(&self) -> Result<SpotifyApiCredentials> {
        let client_id = setting(self.spotify.client_id.as_ref(), "SPOTIFY_CLIENT_ID")
            .ok_or_eyre("Spotify client id missing: set spotify.client_id or SPOTIFY_CLIENT_ID")?;
        let client_secret = setting(self.spotify.client_secret.as_ref(), "SPOTIFY_CLIENT_SECRET")
            .ok_or_eyre(
                "Spotify client secret missing: set spotify.client_secret or SPOTIFY_CLIENT_SECRET",
            )?;
        Ok(SpotifyApiCredentials {
            client_id,
            client_secret,
        })
    }

    pub fn refresh_token(&self) -> Option<String> {
        setting(self.spotify.refresh_token.as_ref(), "SPOTIFY_REFRESH_TOKEN")
    }

    pub fn redirect_uri(&self) -> String {
        self.spotify
            .redirect_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string())
    }

    pub fn user_agent(&self) -> String {
        self.reddit
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }
}
