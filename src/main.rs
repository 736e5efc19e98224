mod cache;
mod config;
mod logging;
mod ports;
mod reddit;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;
mod title;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{OptionExt, WrapErr, bail},
};

use crate::{
    cache::{TrackCache, resolved_only},
    config::Config,
    logging::init_tracing,
    reddit::{client::RedditHttpAdapter, types::SortMode},
    services::{
        aggregate::{AggregateOptions, DuplicatePolicy, TrackAggregator},
        playlist::{PlaylistWriter, WriteMode},
        resolver::TrackResolver,
    },
    spotify_rs::{
        auth::{exchange_code_for_token, extract_auth_code, initiate_oauth, refresh_access_token},
        client::SpotifyClient,
    },
    title::TitleParser,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "REDDIT_PLAYLIST_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `reddit_playlist=debug` (logs go to stderr)
    #[arg(long, default_value = "warn", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// Export spans to this OTLP (gRPC) endpoint
    #[arg(long, global = true, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct BuildArgs {
    /// The subreddit to get tracks from
    #[arg(long, default_value = "listentothis")]
    subreddit: String,

    /// The sorting method for the posts
    #[arg(long, value_enum, default_value_t = SortMode::Hot)]
    time: SortMode,

    /// Spotify username that owns the playlist (prompted for when missing)
    #[arg(short, long, env = "SPOTIFY_USERNAME")]
    username: Option<String>,

    /// Size of the playlist to make
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(1..=100))]
    playlist_size: u32,

    /// The name of the playlist to create or update
    #[arg(long, default_value = "listentothis")]
    playlist_name: String,

    /// Clear the playlist before adding the new tracks
    #[arg(long)]
    replace_playlist: bool,

    /// Keep a track every time it is posted instead of once
    #[arg(long)]
    allow_duplicates: bool,

    /// Where to memoize spotify lookups (defaults to the config/cache dir)
    #[arg(long, conflicts_with = "no_cache")]
    cache_file: Option<PathBuf>,

    /// Search spotify for every track, without reading or writing the cache
    #[arg(long)]
    no_cache: bool,

    /// Use this access token instead of refreshing the configured one
    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Print the resolved track uris instead of writing the playlist
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fill a spotify playlist with tracks posted to a subreddit
    Build(BuildArgs),
    /// Authorize with spotify and print a refresh token for the config file
    Login,
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn prompt(message: &str) -> Result<String> {
    eprint!("{message}");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .wrap_err("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

async fn spotify_access_token(args: &BuildArgs, config: &Config) -> Result<String> {
    if let Some(token) = &args.access_token {
        return Ok(token.clone());
    }

    let credentials = config.spotify_credentials()?;
    let refresh_token = config
        .refresh_token()
        .ok_or_eyre("No spotify refresh token configured, run `reddit-playlist login` first")?;
    let token = refresh_access_token(&credentials, &refresh_token)
        .await
        .wrap_err("Failed to refresh spotify access token")?;
    tracing::debug!(
        "Refreshed spotify access token, valid for {}s (scope: {})",
        token.expires_in,
        token.scope
    );
    Ok(token.access_token)
}

async fn build(args: BuildArgs, config: &Config) -> Result<()> {
    let username = match (&args.username, args.dry_run) {
        (Some(username), _) => Some(username.clone()),
        (None, false) => Some(prompt("Please enter your Spotify username: ")?),
        (None, true) => None,
    };
    if username.as_deref() == Some("") {
        bail!("A spotify username is required");
    }

    let spotify = SpotifyClient::new(spotify_access_token(&args, config).await?);
    let reddit = RedditHttpAdapter::new(&config.user_agent())?;
    let parser = TitleParser::new()?;

    let mut cache = if args.no_cache {
        None
    } else {
        match args.cache_file.clone().or_else(|| config.cache_path()) {
            Some(path) => Some(TrackCache::load(path, resolved_only())?),
            None => {
                tracing::warn!("No cache directory available, lookups are only memoized for this run");
                Some(TrackCache::in_memory(resolved_only()))
            }
        }
    };
    if cache.as_ref().is_some_and(TrackCache::is_empty) {
        tracing::debug!("Starting with an empty track cache");
    }

    let uris = {
        let resolver = TrackResolver::new(&spotify, cache.as_mut());
        let mut aggregator = TrackAggregator::new(
            &reddit,
            &parser,
            resolver,
            AggregateOptions {
                subreddit: args.subreddit.clone(),
                sort: args.time,
                page_size: args.playlist_size,
                duplicates: if args.allow_duplicates {
                    DuplicatePolicy::Keep
                } else {
                    DuplicatePolicy::SkipDuplicates
                },
            },
        );
        aggregator.collect(args.playlist_size as usize).await?
    };
    tracing::info!("Resolved {} tracks from r/{}", uris.len(), args.subreddit);

    match username {
        Some(username) if !args.dry_run => {
            let mode = if args.replace_playlist {
                WriteMode::Replace
            } else {
                WriteMode::Append
            };
            let summary = PlaylistWriter::new(&spotify, username)
                .write(&args.playlist_name, &uris, mode)
                .await?;
            tracing::info!(
                playlist_id = %summary.playlist_id,
                created = summary.created,
                "Playlist written"
            );
            println!("{summary}");
        }
        _ => {
            for uri in &uris {
                println!("{uri}");
            }
        }
    }

    if let Some(cache) = &cache {
        cache.save()?;
        if let Some(path) = cache.path() {
            tracing::debug!("Track cache written to {}", path.display());
        }
    }

    Ok(())
}

async fn login(config: &Config) -> Result<()> {
    let credentials = config.spotify_credentials()?;
    let redirect_uri = config.redirect_uri();
    let (auth, session) = initiate_oauth(&credentials.client_id, &redirect_uri);
    tracing::debug!("Started spotify authorization at {}", session.created_at);

    println!("Open this url, approve access, then paste the url you were redirected to:\n");
    println!("{}\n", auth.auth_url);

    let input = prompt("Redirect url or code: ")?;
    let code = extract_auth_code(&input, &auth.state)
        .ok_or_eyre("No authorization code found, or the state did not match")?;

    let token = exchange_code_for_token(&credentials, &code, &redirect_uri, &session)
        .await
        .wrap_err("Failed to exchange authorization code")?;
    let refresh_token = token
        .refresh_token
        .ok_or_eyre("Spotify did not return a refresh token")?;

    println!("Add this to the [spotify] section of your config as refresh_token:\n");
    println!("{refresh_token}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(
        env!("CARGO_PKG_NAME"),
        args.otlp_endpoint.as_deref(),
        &args.log_level,
    )?;

    tracing::debug!("Loading configuration");
    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load reddit-playlist config")?;

    let result = match args.command {
        Commands::Build(build_args) => build(build_args, &config).await,
        Commands::Login => login(&config).await,
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => Config::create_default().map(|path| {
                println!("{}", path.display());
            }),
            ConfigCommands::Path => {
                match Config::config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No default config path found"),
                }
                Ok(())
            }
        },
    };

    if let Some(provider) = tracer_provider {
        if let Err(error) = provider.shutdown() {
            eprintln!("Failed to flush traces: {error}");
        }
    }

    result
}
