//! Shelf - browse a directory-backed library from the command line.

mod error;
mod output;

use crate::error::{ErrorKind, Result, lift};
use crate::output::Output;
use clap::{ArgAction, Parser, Subcommand};
use exn::ResultExt;
use shelf_catalog::Catalog;
use shelf_catalog::names::chapter_from_url;
use shelf_config::Config;
use shelf_storage::backend::LocalBackend;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SHELF_LOG";

#[derive(Parser, Debug)]
#[command(name = "shelf", about = "Browse a library of collections, chapters and pages", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file to read instead of the one in the platform config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Library root, overriding the configured one
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every collection in the library
    Collections,
    /// List the chapters of a collection in reading order
    Chapters { slug: String },
    /// List the pages of one chapter
    Pages { slug: String, chapter: String },
    /// List every page of a collection as one sequence
    Combined { slug: String },
    /// Show the chapter after the given one
    Next { slug: String, chapter: String },
    /// Show the chapter before the given one
    Previous { slug: String, chapter: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let verbose = cli.verbose > 0;
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match verbose {
                true => eprintln!("shelf: {err:?}"),
                false => eprintln!("shelf: {err}"),
            }
            ExitCode::from(err.exit_code())
        },
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(library) = cli.library {
        config.library = library;
    }
    let root = std::path::absolute(&config.library).or_raise(|| ErrorKind::Config)?;
    tracing::debug!(root = %root.display(), ttl = ?config.cache_ttl(), "Opening library");
    let backend = LocalBackend::new("local", &root).or_raise(|| ErrorKind::Storage)?;
    let catalog = Catalog::with_ttl(Arc::new(backend), config.cache_ttl());
    let mut output = Output::new(std::io::stdout().lock(), cli.json);

    match cli.command {
        Command::Collections => output.collections(&lift(catalog.list_collections().await)?),
        Command::Chapters { slug } => {
            require_collection(&catalog, &slug).await?;
            output.chapters(&lift(catalog.list_chapters(&slug).await)?)
        },
        Command::Pages { slug, chapter } => {
            let chapter = resolve_chapter(&catalog, &slug, &chapter).await?;
            output.pages(&lift(catalog.list_pages(&slug, &chapter).await)?)
        },
        Command::Combined { slug } => {
            require_collection(&catalog, &slug).await?;
            output.pages(&lift(catalog.list_combined(&slug).await)?)
        },
        Command::Next { slug, chapter } => {
            let chapter = resolve_chapter(&catalog, &slug, &chapter).await?;
            output.neighbour(&lift(catalog.next_chapter(&slug, &chapter).await)?)
        },
        Command::Previous { slug, chapter } => {
            let chapter = resolve_chapter(&catalog, &slug, &chapter).await?;
            output.neighbour(&lift(catalog.previous_chapter(&slug, &chapter).await)?)
        },
    }
}

async fn require_collection(catalog: &Catalog, slug: &str) -> Result<()> {
    if !lift(catalog.collection_exists(slug).await)? {
        exn::bail!(ErrorKind::NotFound(slug.to_string()));
    }
    Ok(())
}

/// Accepts a chapter either by its directory name or in its link form
/// (`1_-_Intro` for `1 - Intro`).
async fn resolve_chapter(catalog: &Catalog, slug: &str, chapter: &str) -> Result<String> {
    require_collection(catalog, slug).await?;
    if lift(catalog.chapter_exists(slug, chapter).await)? {
        return Ok(chapter.to_string());
    }
    let unescaped = chapter_from_url(chapter);
    if unescaped != chapter && lift(catalog.chapter_exists(slug, &unescaped).await)? {
        return Ok(unescaped);
    }
    exn::bail!(ErrorKind::NotFound(format!("{slug}/{chapter}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_storage::backend::MockBackend;

    fn catalog() -> Catalog {
        Catalog::new(Arc::new(MockBackend::with_files(["berserk/1 - Intro/1.png", "berserk/2/1.png"])))
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from(["shelf", "pages", "berserk", "2", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Pages { ref slug, ref chapter } if slug == "berserk" && chapter == "2"));
        assert!(Cli::try_parse_from(["shelf", "pages", "berserk"]).is_err());
    }

    #[tokio::test]
    async fn test_resolve_chapter() {
        let catalog = catalog();
        assert_eq!(resolve_chapter(&catalog, "berserk", "2").await.unwrap(), "2");
        assert_eq!(resolve_chapter(&catalog, "berserk", "1_-_Intro").await.unwrap(), "1 - Intro");
        let err = resolve_chapter(&catalog, "berserk", "3").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(what) if what == "berserk/3"));
        let err = resolve_chapter(&catalog, "vagabond", "1").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(what) if what == "vagabond"));
    }
}
