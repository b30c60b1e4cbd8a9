//! CLI entry point for the bookswipe tool.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use bookswipe_core::catalog::Catalog;
use bookswipe_core::enrich::EnrichmentSettings;
use bookswipe_core::sourcing::SourcingSettings;
use bookswipe_core::store::RESERVED_KEY_PREFIX;
use bookswipe_core::{
    BookStore, CallableError, CallableResponse, Callables, Collection, CoverLookup,
    CoverServiceClient, Database, DiscoveryPipeline, EventDispatcher, FetchBooksRequest,
    GeminiClient, OpenLibraryClient, PipelineSettings, PreferenceProfiler, SetupRequest,
    SqliteStore, SuggestionService, SwipeRequest,
};
use clap::Parser;
use tracing::{debug, info};

mod app_config;
mod cli;

use app_config::{RuntimeConfig, load_config};
use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    init_tracing(default_level);

    debug!(command = ?args.command, "CLI arguments parsed");

    let loaded = load_config(args.config.as_deref())?;
    if let (Some(path), Some(_)) = (&loaded.path, &loaded.config) {
        debug!(path = %path.display(), "Loaded config file");
    }
    let runtime = RuntimeConfig::resolve(&args, loaded.config.as_ref());

    let app = App::build(&runtime).await?;
    let result = app.dispatch(args.command).await;
    app.close().await;
    result
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Wired services for one CLI invocation.
struct App {
    db: Database,
    store: Arc<SqliteStore>,
    profiler: Arc<PreferenceProfiler>,
    dispatcher: EventDispatcher,
    callables: Callables,
}

impl App {
    async fn build(runtime: &RuntimeConfig) -> Result<Self> {
        let db = Database::new(&runtime.database_path, &runtime.database)
            .await
            .with_context(|| {
                format!(
                    "Failed to open database '{}'",
                    runtime.database_path.display()
                )
            })?;
        let store = Arc::new(SqliteStore::new(db.clone()));

        let catalog: Arc<dyn Catalog> = Arc::new(
            OpenLibraryClient::with_base_url(&runtime.http, &runtime.catalog_base_url)
                .context("Failed to create catalog client")?,
        );
        let suggester: Option<Arc<dyn SuggestionService>> = match &runtime.suggest_api_key {
            Some(key) => Some(Arc::new(
                GeminiClient::with_base_url(
                    &runtime.http,
                    key.clone(),
                    runtime.suggestion_model.clone(),
                    runtime.suggestion_base_url.clone(),
                )
                .context("Failed to create suggestion client")?,
            )),
            None => {
                info!("No suggestion API key configured, suggestion feed disabled");
                None
            }
        };
        let covers: Option<Arc<dyn CoverLookup>> = match &runtime.cover_service_url {
            Some(url) => Some(Arc::new(
                CoverServiceClient::new(&runtime.http, url.clone())
                    .context("Failed to create cover lookup client")?,
            )),
            None => None,
        };

        let settings = PipelineSettings {
            sourcing: SourcingSettings {
                subject_page_size: runtime.subject_page_size,
                ..SourcingSettings::default()
            },
            enrichment: EnrichmentSettings {
                cover_timeout: runtime.cover_timeout,
                reserved_prefix: RESERVED_KEY_PREFIX.to_string(),
            },
            ..PipelineSettings::default()
        };
        let pipeline = Arc::new(DiscoveryPipeline::new(
            store.clone(),
            catalog.clone(),
            suggester.clone(),
            covers,
            settings,
        ));
        let profiler = Arc::new(PreferenceProfiler::new(store.clone(), catalog, suggester));
        let dispatcher = EventDispatcher::new(profiler.clone(), pipeline.clone(), store.clone())
            .with_refill_threshold(runtime.refill_threshold);
        let callables = Callables::new(store.clone(), pipeline);

        Ok(Self {
            db,
            store,
            profiler,
            dispatcher,
            callables,
        })
    }

    async fn dispatch(&self, command: Command) -> Result<()> {
        match command {
            Command::Setup { user } => {
                let response = self
                    .callables
                    .setup_user(&SetupRequest { user: Some(user) })
                    .await;
                print_response(response)
            }
            Command::Fetch { user } => {
                let response = self
                    .callables
                    .fetch_books(&FetchBooksRequest {
                        user_id: Some(user),
                    })
                    .await;
                print_response(response)
            }
            Command::Like { user, book } => self.swipe(user, book, true).await,
            Command::Dislike { user, book } => self.swipe(user, book, false).await,
            Command::Profile { user, refresh } => self.show_profile(&user, refresh).await,
        }
    }

    async fn swipe(&self, user: String, book: String, like: bool) -> Result<()> {
        // Subscribe before the move so the swipe's own creation event is seen.
        let mut events = self.store.subscribe();
        let request = SwipeRequest {
            user: Some(user),
            book: Some(book),
        };
        let response = if like {
            self.callables.like_book(&request).await
        } else {
            self.callables.dislike_book(&request).await
        };
        print_response(response)?;
        let handled = self.dispatcher.drain(&mut events).await;
        debug!(handled, "Processed store events");
        Ok(())
    }

    async fn show_profile(&self, user: &str, refresh: bool) -> Result<()> {
        if refresh {
            self.profiler
                .refresh(user)
                .await
                .with_context(|| format!("Failed to refresh preferences for '{user}'"))?;
        }
        let Some(profile) = self.store.get_profile(user).await? else {
            bail!("No profile for user '{user}'. Run `bookswipe setup --user {user}` first.");
        };

        let authors: Vec<&str> = profile
            .shortlisted_authors
            .iter()
            .map(|author| author.name.as_str())
            .collect();
        println!("user: {}", profile.id);
        println!("subject keywords: {}", profile.subject_keywords.join(", "));
        println!(
            "favourite period: {}",
            profile.favourite_publishing_period.as_deref().unwrap_or("-")
        );
        println!("shortlisted authors: {}", authors.join(", "));
        println!("explored subjects: {}", profile.fetched_subjects.join(", "));
        println!("next index: {}", profile.current_index);
        for collection in [Collection::Queue, Collection::Liked, Collection::Disliked] {
            let count = self.store.count_books(user, collection).await?;
            println!("{collection}: {count}");
        }
        Ok(())
    }

    async fn close(self) {
        self.db.close().await;
    }
}

fn print_response(response: Result<CallableResponse, CallableError>) -> Result<()> {
    let response = response.map_err(|e| anyhow!("{e} ({})", e.code()))?;
    println!("{}", response.message);
    Ok(())
}
