use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, Level};

use nq_client::{FeedEvent, HttpNewsSource, NewsFeed};
use nq_core::{NewsFilters, Result};
use nq_storage::{Favorites, FileStore};
use nq_web::{create_app, AppState};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the news proxy server
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: String,
        #[arg(long, default_value = "https://newsapi.org/v2")]
        upstream: String,
        /// Upstream API key. Falls back to the NEWSAPI_KEY environment variable.
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Search news and print the results
    Search {
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        page_size: Option<u32>,
        /// How many pages to fetch before stopping
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// The proxy endpoint to query
        #[arg(long, default_value = "http://127.0.0.1:3000/api/news")]
        api_url: String,
    },
    /// Inspect or clear locally saved favorites
    Favorites {
        #[arg(long, default_value = ".nq")]
        data_dir: String,
        #[command(subcommand)]
        command: FavoritesCommands,
    },
}

#[derive(Subcommand)]
enum FavoritesCommands {
    List,
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            upstream,
            api_key,
        } => {
            let api_key = api_key.or_else(|| std::env::var("NEWSAPI_KEY").ok());
            if api_key.is_none() {
                info!("no API key configured, requests will fail with 500");
            }
            let app = create_app(AppState::new(upstream, api_key));
            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!("🚀 news proxy listening on {}", bind);
            axum::serve(listener, app).await?;
        }
        Commands::Search {
            q,
            language,
            sort_by,
            page_size,
            pages,
            api_url,
        } => {
            let filters = NewsFilters {
                q,
                language,
                sort_by,
                page_size,
                ..Default::default()
            };
            search(filters, pages, api_url).await;
        }
        Commands::Favorites { data_dir, command } => {
            let store = Arc::new(FileStore::new(data_dir)?);
            let mut favorites = Favorites::new(store);
            favorites.load().await;
            match command {
                FavoritesCommands::List => {
                    if favorites.favorites().is_empty() {
                        println!("No favorites saved");
                    }
                    for article in favorites.favorites() {
                        println!("⭐ {} ({})", article.title, article.url);
                    }
                }
                FavoritesCommands::Clear => {
                    favorites.clear().await;
                    println!("Favorites cleared");
                }
            }
        }
    }

    Ok(())
}

async fn search(filters: NewsFilters, pages: usize, api_url: String) {
    let source = Arc::new(HttpNewsSource::new(api_url));
    let mut feed = NewsFeed::new(source, filters);

    loop {
        match feed.drive().await {
            FeedEvent::Loaded => {
                if feed.pages_fetched() >= pages || !feed.has_next_page() {
                    break;
                }
                feed.fetch_next_page();
            }
            FeedEvent::Failed => {
                let state = feed.state();
                eprintln!(
                    "Search failed: {}",
                    state.error_message.unwrap_or_else(|| "unknown error".to_string())
                );
                break;
            }
            FeedEvent::Settled | FeedEvent::Stale => {}
            FeedEvent::Idle => break,
        }
    }

    let articles = feed.articles();
    info!(
        "fetched {} of {} results",
        articles.len(),
        feed.state().total_results
    );
    for article in articles {
        println!("📰 {} ({})", article.title, article.url);
    }
}
