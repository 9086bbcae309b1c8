use clap::{Parser, Subcommand};

mod app;
mod config;
mod db;
mod error;
mod models;
mod remote;

use app::App;
use config::Config;
use error::Result;

#[derive(Parser)]
#[command(name = "daily-devotion", version, about = "Offline-first devotional reader")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the program list, falling back to the cached copy when offline
    Programs {
        #[arg(long)]
        refresh: bool,
    },
    /// Download all daily studies into the local cache
    Sync,
    /// List cached devotionals for a program
    Studies {
        program: Option<String>,
        /// Only show entries from this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
    /// Show the cached devotional for a day (defaults to today)
    Today {
        #[arg(long)]
        program: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
    /// Fetch one day's study straight from the API
    Fetch {
        /// YYYY-MM-DD
        date: String,
    },
    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// List bookmarks, newest first
    Bookmarks,
}

#[derive(Subcommand)]
enum BookmarkAction {
    Add { devotional_id: i64 },
    Remove { devotional_id: i64 },
    Toggle { devotional_id: i64 },
}

#[tokio::main]
async fn main() {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        if e.is_network() {
            eprintln!("Network error: {}", e);
        } else if e.is_storage() {
            eprintln!("Storage error: {}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let app = App::new(config, cli.json).await?;

    match cli.command {
        Command::Programs { refresh } => app.programs(refresh).await,
        Command::Sync => app.sync().await,
        Command::Studies { program, month } => app.studies(program, month).await,
        Command::Today { program, date } => app.today(program, date).await,
        Command::Fetch { date } => app.fetch(&date).await,
        Command::Bookmark { action } => match action {
            BookmarkAction::Add { devotional_id } => app.add_bookmark(devotional_id).await,
            BookmarkAction::Remove { devotional_id } => app.remove_bookmark(devotional_id).await,
            BookmarkAction::Toggle { devotional_id } => app.toggle_bookmark(devotional_id).await,
        },
        Command::Bookmarks => app.bookmarks().await,
    }
}
