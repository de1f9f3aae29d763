//! shelf-cli: serve the library or query a catalog file offline.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use shelf_app::modules::books::discovery::{self, DiscoveryParams, DiscoveryQuery};
use shelf_app::modules::books::models::{Book, StatusMap};
use shelf_app::modules::books::recommend;
use shelf_app::modules::stats::dashboard;
use shelf_app::modules::status::tracker::StatusTracker;
use shelf_kernel::settings::Settings;

#[derive(Parser)]
#[command(name = "shelf-cli", version, about = "Personal book library")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server with every module.
    Serve,

    /// Search, filter and sort a catalog file.
    Discover {
        /// JSON array of books.
        #[arg(long)]
        catalog: PathBuf,

        /// Case-insensitive search term.
        #[arg(long, default_value = "")]
        term: String,

        /// Exact genre name.
        #[arg(long)]
        genre: Option<String>,

        /// Reading status, or "sem status".
        #[arg(long)]
        status: Option<String>,

        /// Status file consulted by --status.
        #[arg(long)]
        status_file: Option<PathBuf>,

        /// Minimum rating.
        #[arg(long)]
        min_rating: Option<String>,

        /// title, author, year, rating or pages.
        #[arg(long, default_value = "title")]
        sort: String,

        /// Sort descending.
        #[arg(long)]
        desc: bool,
    },

    /// Recommend books related to one title.
    Recommend {
        /// JSON array of books.
        #[arg(long)]
        catalog: PathBuf,

        /// Id of the focal book.
        #[arg(long)]
        id: String,

        /// Number of recommendations.
        #[arg(short, default_value_t = recommend::DEFAULT_K)]
        k: usize,
    },

    /// Print dashboard statistics for a catalog file.
    Stats {
        /// JSON array of books.
        #[arg(long)]
        catalog: PathBuf,

        /// Status file for the tracked status counts.
        #[arg(long)]
        status_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let settings = Settings::load().context("failed to load shelf settings")?;
            shelf_telemetry::init(&settings.telemetry);
            shelf_app::app::run(settings).await
        }
        Commands::Discover {
            catalog,
            term,
            genre,
            status,
            status_file,
            min_rating,
            sort,
            desc,
        } => {
            let books = load_catalog(&catalog).await?;
            let statuses = load_statuses(status_file).await;
            let query = DiscoveryQuery::from(DiscoveryParams {
                term: Some(term),
                genre,
                status,
                min_rating,
                sort: Some(sort),
                direction: Some(if desc { "desc" } else { "asc" }.to_string()),
            });

            print_json(&discovery::discover(&books, &query, &statuses))
        }
        Commands::Recommend { catalog, id, k } => {
            let books = load_catalog(&catalog).await?;
            let Some(focal) = books.iter().find(|b| b.id == id) else {
                bail!("book '{id}' not found in {}", catalog.display());
            };

            print_json(&recommend::recommend(&books, focal, k))
        }
        Commands::Stats {
            catalog,
            status_file,
        } => {
            let books = load_catalog(&catalog).await?;
            let statuses = load_statuses(status_file).await;
            print_json(&dashboard::compute_stats(&books, &statuses))
        }
    }
}

async fn load_catalog(path: &Path) -> anyhow::Result<Vec<Book>> {
    if !path.exists() {
        bail!("catalog file {} does not exist", path.display());
    }
    let books: Vec<Book> = shelf_db::snapshot::load_json(path)
        .await
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    tracing::debug!(books = books.len(), "catalog loaded");
    Ok(books)
}

async fn load_statuses(path: Option<PathBuf>) -> StatusMap {
    match path {
        Some(path) => StatusTracker::new(path).snapshot().await,
        None => StatusMap::new(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
