use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use exn::ResultExt;
use libris_catalog::{Catalog, Entry, Surface};
use libris_config::Config;
use libris_store::{Database, Id, Repository, Selector};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "libris", version, about = "Browse a Calibre library as catalog entries")]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, global = true, env = "LIBRIS_CONFIG")]
    config: Option<PathBuf>,
    /// Build entries for the HTML surface instead of the OPDS feed.
    #[arg(long, global = true)]
    html: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// "All books" and "recent additions" entry points
    Top,
    /// Alphabetical index with book counts per letter
    Letters,
    /// Books by an author, oldest publication first
    Author { id: Id },
    /// Books in a series, in series order
    Series { id: Id },
    /// Books with a tag
    Tag { id: Id },
    /// Books whose title or author matches the text
    Search { text: String },
    /// Books whose sort title starts with a letter
    Letter { letter: char },
    /// Most recently added books
    Recent {
        /// Overrides `catalog.recent_limit`.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// A single book
    Book { id: Id },
}

#[derive(Debug, Display, Error)]
enum AppError {
    #[display("invalid configuration")]
    Config,
    #[display("could not open the library database")]
    Database,
    #[display("catalog query failed")]
    Catalog,
    #[display("could not write output")]
    Output,
}

type Result<T> = std::result::Result<T, exn::Exn<AppError>>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| AppError::Config)?;
    let options = config.catalog_options().or_raise(|| AppError::Config)?;
    let db = Database::connect(config.database_path()).await.or_raise(|| AppError::Database)?;
    let catalog = Catalog::new(Arc::new(Repository::from(&db)), options);
    let surface = if cli.html { Surface::Html } else { Surface::Opds };

    let entries = match cli.command {
        Command::Top => catalog.top_level().await,
        Command::Letters => catalog.letter_index().await,
        Command::Author { id } => catalog.books_by_author(id, surface).await,
        Command::Series { id } => catalog.books_by_series(id, surface).await,
        Command::Tag { id } => catalog.books_by_tag(id, surface).await,
        Command::Search { text } => catalog.books_by_query(text, surface).await,
        Command::Letter { letter } => catalog.books_by_letter(letter, surface).await,
        Command::Recent { limit: Some(limit) } => catalog.entries(&Selector::Recent(limit), surface).await,
        Command::Recent { limit: None } => catalog.recent(surface).await,
        Command::Book { id } => match catalog.book_entry(id, surface).await.or_raise(|| AppError::Catalog)? {
            Some(entry) => Ok(vec![entry]),
            None => {
                eprintln!("no book with id {id}");
                db.close().await;
                return Ok(ExitCode::FAILURE);
            },
        },
    }
    .or_raise(|| AppError::Catalog)?;

    tracing::debug!(count = entries.len(), "writing entries");
    print(&entries)?;
    db.close().await;
    Ok(ExitCode::SUCCESS)
}

fn print(entries: &[Entry]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, entries).or_raise(|| AppError::Output)?;
    writeln!(stdout).or_raise(|| AppError::Output)?;
    Ok(())
}
