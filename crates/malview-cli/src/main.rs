//! malview - browse a `MyAnimeList` anime list from the terminal.

/// Application configuration (TOML).
mod config;
/// Plain-text output.
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::AppConfig;
use malview_api::jikan::{JikanClient, MediaType, UserListEntry, WatchStatus};
use malview_catalog::{FilterSpec, Library, RandomSource, SortKey, apply, pick_from_source, summarize};
use malview_db::{
    AppDir, CONFIG_FILE, FavoritesStore, ItemCache, ListCache, SqliteStore, SystemClock,
};

/// Library wired to the real API, database and clock.
type AppLibrary = Library<JikanClient, SqliteStore, SystemClock>;

/// CLI argument parser.
#[derive(Parser)]
#[command(name = "malview", about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// `MyAnimeList` username (overrides `jikan.username` in config).
    #[arg(long, global = true)]
    user: Option<String>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List entries, optionally filtered and sorted.
    List(ListArgs),
    /// Pick a random entry.
    Random(RandomArgs),
    /// Show list statistics.
    Stats(StatsArgs),
    /// Show details for one anime.
    Show(ShowArgs),
    /// Local cache operations.
    Cache(CacheCommand),
    /// Manage favorites.
    Favorites(FavoritesCommand),
    /// Manage the config file.
    Config(ConfigCommand),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the `list` subcommand.
#[derive(clap::Args)]
struct ListArgs {
    /// Comma-separated watch statuses (watching, completed, on_hold, dropped, plan_to_watch).
    #[arg(long, value_delimiter = ',')]
    status: Vec<WatchStatus>,

    /// Comma-separated media types (tv, movie, ova, special, ona, music).
    #[arg(long = "type", value_delimiter = ',')]
    media_type: Vec<MediaType>,

    /// Comma-separated genre names; an entry matches if it has any of them.
    #[arg(long, value_delimiter = ',')]
    genre: Vec<String>,

    /// Case-insensitive title search.
    #[arg(long)]
    search: Option<String>,

    /// Sort order: title, score, episodes, updated, user-score.
    #[arg(long)]
    sort: Option<SortKey>,

    /// Ignore the cached list and fetch it again.
    #[arg(long)]
    refresh: bool,
}

/// Arguments for the `random` subcommand.
#[derive(clap::Args)]
struct RandomArgs {
    /// Part of the list to draw from: all, all-except-dropped, completed,
    /// plan-to-watch, watching-and-on-hold.
    #[arg(long, default_value = "all-except-dropped")]
    source: RandomSource,

    /// Ignore the cached list and fetch it again.
    #[arg(long)]
    refresh: bool,
}

/// Arguments for the `stats` subcommand.
#[derive(clap::Args)]
struct StatsArgs {
    /// Ignore the cached list and fetch it again.
    #[arg(long)]
    refresh: bool,
}

/// Arguments for the `show` subcommand.
#[derive(clap::Args)]
struct ShowArgs {
    /// `MyAnimeList` anime ID.
    #[arg(long)]
    id: u64,
}

/// Arguments for the `cache` subcommand.
#[derive(clap::Args)]
struct CacheCommand {
    /// Cache subcommand to run.
    #[command(subcommand)]
    command: CacheSubcommands,
}

/// Available cache subcommands.
#[derive(Subcommand)]
enum CacheSubcommands {
    /// Remove the cached list and all cached details.
    Clear,
}

/// Arguments for the `favorites` subcommand.
#[derive(clap::Args)]
struct FavoritesCommand {
    /// Favorites subcommand to run.
    #[command(subcommand)]
    command: FavoritesSubcommands,
}

/// Available favorites subcommands.
#[derive(Subcommand)]
enum FavoritesSubcommands {
    /// Add an anime to favorites.
    Add(FavoriteAddArgs),
    /// Remove an anime from favorites.
    Remove(FavoriteIdArgs),
    /// Replace the notes of a favorite.
    Note(FavoriteNoteArgs),
    /// List favorites.
    List,
}

/// Arguments for the `favorites add` subcommand.
#[derive(clap::Args)]
struct FavoriteAddArgs {
    /// `MyAnimeList` anime ID.
    #[arg(long)]
    id: u64,

    /// Free-form notes.
    #[arg(long)]
    notes: Option<String>,
}

/// Arguments for the `favorites remove` subcommand.
#[derive(clap::Args)]
struct FavoriteIdArgs {
    /// `MyAnimeList` anime ID.
    #[arg(long)]
    id: u64,
}

/// Arguments for the `favorites note` subcommand.
#[derive(clap::Args)]
struct FavoriteNoteArgs {
    /// `MyAnimeList` anime ID.
    #[arg(long)]
    id: u64,

    /// New notes; omit to clear them.
    #[arg(long)]
    notes: Option<String>,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the config file path and effective settings.
    Show,
    /// Store the default username.
    SetUser(SetUserArgs),
}

/// Arguments for the `config set-user` subcommand.
#[derive(clap::Args)]
struct SetUserArgs {
    /// `MyAnimeList` username.
    name: String,
}

/// Arguments for the `completions` subcommand.
#[derive(clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    shell: Shell,
}

/// Loads the config file for `dir`.
fn load_config(dir: Option<&Path>) -> Result<AppConfig> {
    let path = AppDir::Config.file(dir, CONFIG_FILE)?;
    AppConfig::load(&path)
}

/// Opens the local database.
fn open_store(dir: Option<&Path>) -> Result<Arc<SqliteStore>> {
    let store = SqliteStore::open(dir).context("failed to open database")?;
    Ok(Arc::new(store))
}

/// Builds the Jikan client from config.
fn build_client(config: &AppConfig) -> Result<JikanClient> {
    let mut builder = JikanClient::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .min_interval(config.jikan.min_interval());
    if let Some(base_url) = config.jikan.base_url.as_deref() {
        let url = Url::parse(base_url)
            .with_context(|| format!("invalid jikan.base_url: {base_url}"))?;
        builder = builder.base_url(url);
    }
    builder.build().context("failed to build API client")
}

/// Builds the cached list source for the resolved user.
fn build_library(cli: &Cli) -> Result<AppLibrary> {
    let dir = cli.dir.as_deref();
    let config = load_config(dir)?;
    let username = config.username(cli.user.as_deref())?;
    let client = build_client(&config)?;
    let store = open_store(dir)?;
    let clock = Arc::new(SystemClock);

    Ok(Library::new(
        client,
        username,
        ListCache::new(Arc::clone(&store), Arc::clone(&clock)).with_ttl(config.cache.list_ttl()),
        ItemCache::new(store, clock).with_ttl(config.cache.item_ttl()),
    ))
}

/// Returns the list, from cache unless `refresh` is set.
async fn load_list(library: &AppLibrary, refresh: bool) -> Result<Vec<UserListEntry>> {
    let result = if refresh {
        library.refresh().await
    } else {
        library.get_list().await
    };
    result.with_context(|| {
        format!(
            "failed to fetch the anime list of {} (re-run with --refresh to retry)",
            library.username()
        )
    })
}

/// Runs the `list` subcommand.
///
/// # Errors
///
/// Returns an error if the list cannot be loaded.
#[instrument(skip_all)]
async fn run_list(cli: &Cli, args: &ListArgs) -> Result<()> {
    let library = build_library(cli)?;
    let list = load_list(&library, args.refresh).await?;

    let mut spec = FilterSpec::new()
        .with_statuses(args.status.iter().copied())
        .with_media_types(args.media_type.iter().copied())
        .with_genres(args.genre.iter().map(String::as_str))
        .with_query(args.search.as_deref().unwrap_or_default());
    if let Some(sort) = args.sort {
        spec = spec.with_sort(sort);
    }

    let shown = apply(&list, &spec);
    tracing::info!("{}", render::ENTRY_HEADER);
    for entry in &shown {
        tracing::info!("{}", render::entry_line(entry));
    }
    tracing::info!("Showing {} of {} entries", shown.len(), list.len());

    Ok(())
}

/// Runs the `random` subcommand.
///
/// # Errors
///
/// Returns an error if the list cannot be loaded or nothing matches the source.
#[instrument(skip_all)]
async fn run_random(cli: &Cli, args: &RandomArgs) -> Result<()> {
    let library = build_library(cli)?;
    let list = load_list(&library, args.refresh).await?;

    let mut rng = rand::thread_rng();
    let picked = pick_from_source(&list, args.source, &mut rng)
        .with_context(|| format!("no entries match --source {}", args.source))?;

    tracing::info!("{}", render::ENTRY_HEADER);
    tracing::info!("{}", render::entry_line(picked));

    Ok(())
}

/// Runs the `stats` subcommand.
///
/// # Errors
///
/// Returns an error if the list cannot be loaded.
#[instrument(skip_all)]
async fn run_stats(cli: &Cli, args: &StatsArgs) -> Result<()> {
    let library = build_library(cli)?;
    let list = load_list(&library, args.refresh).await?;

    let Some(stats) = summarize(&list) else {
        tracing::info!("The list of {} is empty", library.username());
        return Ok(());
    };
    for line in render::stats_lines(&stats) {
        tracing::info!("{line}");
    }

    Ok(())
}

/// Runs the `show` subcommand.
///
/// # Errors
///
/// Returns an error if the record cannot be fetched or favorites cannot be read.
#[instrument(skip_all)]
async fn run_show(cli: &Cli, args: &ShowArgs) -> Result<()> {
    let library = build_library(cli)?;
    let anime = library
        .anime_details(args.id)
        .await
        .with_context(|| format!("failed to fetch anime {}", args.id))?;

    let favorites = FavoritesStore::new(open_store(cli.dir.as_deref())?, Arc::new(SystemClock));
    let favorite = favorites
        .list()?
        .into_iter()
        .find(|f| f.anime.mal_id == args.id);

    for line in render::detail_lines(&anime, favorite.as_ref()) {
        tracing::info!("{line}");
    }

    Ok(())
}

/// Runs the `cache clear` subcommand.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
fn run_cache_clear(dir: Option<&Path>) -> Result<()> {
    let store = open_store(dir)?;
    let clock = Arc::new(SystemClock);
    ListCache::new(Arc::clone(&store), Arc::clone(&clock)).invalidate();
    ItemCache::new(store, clock).clear();
    tracing::info!("Cache cleared");
    Ok(())
}

/// Runs the `favorites` subcommands.
///
/// # Errors
///
/// Returns an error if the record cannot be fetched or favorites cannot be
/// read or written.
#[instrument(skip_all)]
async fn run_favorites(cli: &Cli, command: &FavoritesSubcommands) -> Result<()> {
    let favorites = FavoritesStore::new(open_store(cli.dir.as_deref())?, Arc::new(SystemClock));

    match command {
        FavoritesSubcommands::Add(args) => {
            let library = build_library(cli)?;
            let anime = library
                .anime_details(args.id)
                .await
                .with_context(|| format!("failed to fetch anime {}", args.id))?;
            let title = anime.title.clone();
            favorites.add(anime, args.notes.clone())?;
            tracing::info!("Added {} ({}) to favorites", title, args.id);
        }
        FavoritesSubcommands::Remove(args) => {
            if favorites.remove(args.id)? {
                tracing::info!("Removed {} from favorites", args.id);
            } else {
                tracing::warn!("{} is not a favorite", args.id);
            }
        }
        FavoritesSubcommands::Note(args) => {
            if favorites.update_notes(args.id, args.notes.clone())? {
                tracing::info!("Updated notes for {}", args.id);
            } else {
                tracing::warn!("{} is not a favorite", args.id);
            }
        }
        FavoritesSubcommands::List => {
            let list = favorites.list()?;
            tracing::info!("ID\tAdded\t\tTitle\tNotes");
            for favorite in &list {
                tracing::info!("{}", render::favorite_line(favorite));
            }
            tracing::info!("Total: {} favorites", list.len());
        }
    }

    Ok(())
}

/// Runs the `config` subcommands.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written.
fn run_config(dir: Option<&Path>, command: &ConfigSubcommands) -> Result<()> {
    let path = AppDir::Config.file(dir, CONFIG_FILE)?;
    let mut config = AppConfig::load(&path)?;

    match command {
        ConfigSubcommands::Show => {
            tracing::info!("Config file: {}", path.display());
            let content =
                toml::to_string_pretty(&config).context("failed to serialize config to TOML")?;
            for line in content.lines() {
                tracing::info!("{line}");
            }
        }
        ConfigSubcommands::SetUser(args) => {
            config.jikan.username = Some(String::from(args.name.trim()));
            config.save(&path)?;
            tracing::info!("Saved username {} to {}", args.name.trim(), path.display());
        }
    }

    Ok(())
}

/// Runs the `completions` subcommand.
fn run_completions(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    let name = String::from(cmd.get_name());
    clap_complete::generate(args.shell, &mut cmd, name, &mut std::io::stdout());
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match &cli.command {
        Commands::List(args) => run_list(&cli, args).await,
        Commands::Random(args) => run_random(&cli, args).await,
        Commands::Stats(args) => run_stats(&cli, args).await,
        Commands::Show(args) => run_show(&cli, args).await,
        Commands::Cache(cache) => match cache.command {
            CacheSubcommands::Clear => run_cache_clear(cli.dir.as_deref()),
        },
        Commands::Favorites(fav) => run_favorites(&cli, &fav.command).await,
        Commands::Config(cfg) => run_config(cli.dir.as_deref(), &cfg.command),
        Commands::Completions(args) => {
            run_completions(args);
            Ok(())
        }
    }
}
