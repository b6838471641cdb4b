//! GenQuote CLI
//!
//! Terminal front end for the quote session: show, search, browse and share
//! quotes from the cached batch.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use genquote::{
    QuoteSession,
    error::{AppError, Result},
    models::{Config, QuoteRecord},
    platform,
    services::{
        CarouselState, HttpQuoteProvider, Notifier, QueuedNotifier, ShareOutcome,
        carousel::InputSurface,
    },
    storage::{BATCH_KEY, FAVORITES_KEY, PersistentStore},
    terminal::{self, TerminalInput, TerminalSurface},
    utils,
};

/// GenQuote - random quotes from a cached batch
#[derive(Parser, Debug)]
#[command(name = "genquote", version, about = "Random quote session manager")]
struct Cli {
    /// Path to storage directory holding the cache, favorites and config
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a session and print the current quote
    Show,

    /// Pick a new random quote from the batch
    Random {
        /// Add it to favorites
        #[arg(long)]
        favorite: bool,

        /// Copy it to the clipboard
        #[arg(long)]
        copy: bool,

        /// Hand it to the native share sheet
        #[arg(long)]
        share: bool,

        /// Open the Facebook sharer with it
        #[arg(long)]
        facebook: bool,
    },

    /// Print the cached batch
    List,

    /// Search the batch by content, author or tag
    Search {
        query: String,

        /// Show every match instead of the preview
        #[arg(long)]
        all: bool,
    },

    /// Browse matches one at a time
    Browse {
        query: String,

        /// Match to open first
        #[arg(long, default_value_t = 0)]
        start: usize,
    },

    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },

    /// Validate configuration file
    Validate,

    /// Show storage and session info
    Info,
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    /// Print favorites
    List,

    /// Add the batch quote at INDEX
    Add { index: usize },

    /// Remove the favorite at INDEX
    Remove { index: usize },

    /// Remove every favorite
    Clear,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_quote(quote: &QuoteRecord) {
    println!("\"{}\"", quote.content);
    println!("  — {}", quote.author);
    if !quote.tags.is_empty() {
        println!("  #{}", quote.tag_line());
    }
}

fn print_indexed(index: usize, quote: &QuoteRecord) {
    println!(
        "{:>3}. {} — {}",
        index,
        utils::truncate(&quote.content, 72),
        quote.author
    );
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    log::debug!("Using storage directory {}", cli.storage_dir.display());

    let store = PersistentStore::local(&cli.storage_dir);

    match cli.command {
        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            let batch: Vec<QuoteRecord> = store.load(BATCH_KEY).await.unwrap_or_default();
            let favorites: Vec<QuoteRecord> = store.load(FAVORITES_KEY).await.unwrap_or_default();
            let capabilities = platform::detect_capabilities();

            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Provider: {}", config.provider.url);
            log::info!("Cached quotes: {}", batch.len());
            log::info!("Favorites: {}", favorites.len());
            log::info!(
                "Clipboard: {}",
                if capabilities.clipboard.is_some() {
                    "available"
                } else {
                    "not found"
                }
            );
            log::info!(
                "Browser: {}",
                if capabilities.opener.is_some() {
                    "available"
                } else {
                    "not found"
                }
            );
        }

        Command::Browse { query, start } => {
            browse(config, store, &query, start).await?;
        }

        command => {
            let provider = Arc::new(HttpQuoteProvider::new(&config.provider)?);
            let mut session = QuoteSession::builder(config, store, provider)
                .capabilities(platform::detect_capabilities())
                .build()
                .await;
            if let Err(e) = run(&mut session, command).await {
                if e.is_precondition() {
                    log::warn!("{}", e);
                } else {
                    log::error!("{}", e);
                }
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Run a non-interactive command against a fresh session.
async fn run(session: &mut QuoteSession, command: Command) -> Result<()> {
    match command {
        Command::Show => {
            session.start().await?;
            if let Some(quote) = session.current_quote() {
                print_quote(quote);
            }
        }

        Command::Random {
            favorite,
            copy,
            share,
            facebook,
        } => {
            session.start().await?;
            print_quote(session.generate_new_quote()?);

            if favorite {
                session.add_current_to_favorites().await?;
            }
            if copy {
                // Failure is already reported to the user
                if let Err(e) = session.copy_current().await {
                    log::debug!("Copy failed: {}", e);
                }
            }
            if share && session.share_current().await? == ShareOutcome::Shared {
                log::info!("Shared");
            }
            if facebook {
                let url = session.share_current_on_facebook().await?;
                println!("{}", url);
            }
        }

        Command::List => {
            session.start().await?;
            for (i, quote) in session.batch().iter().enumerate() {
                print_indexed(i, quote);
            }
        }

        Command::Search { query, all } => {
            session.start().await?;
            session.set_query(query.as_str());
            if all && !session.show_all() {
                session.toggle_show_all();
            }

            let results = session.matches();
            if results.is_empty() {
                log::info!("No quotes match '{}'", query);
                return Ok(());
            }
            for (i, quote) in session.visible_matches().iter().enumerate() {
                print_indexed(i, quote);
            }
            if !session.show_all() && results.is_collapsible() {
                println!("  ... and {} more (use --all)", results.hidden_count());
            }
        }

        Command::Favorites { action } => match action {
            FavoritesCommand::List => {
                if session.favorites().is_empty() {
                    log::info!("No favorites yet.");
                }
                for (i, quote) in session.favorites().iter().enumerate() {
                    print_indexed(i, quote);
                }
            }
            FavoritesCommand::Add { index } => {
                session.start().await?;
                let batch = session.batch();
                let quote = batch.get(index).cloned().ok_or(AppError::IndexOutOfRange {
                    index,
                    len: batch.len(),
                })?;
                session.add_favorite(quote).await;
            }
            FavoritesCommand::Remove { index } => {
                let removed = session.remove_favorite(index).await?;
                log::info!("Removed \"{}\" — {}", removed.content, removed.author);
            }
            FavoritesCommand::Clear => {
                session.clear_favorites().await;
                log::info!("Favorites cleared");
            }
        },

        Command::Browse { .. } | Command::Validate | Command::Info => {}
    }

    Ok(())
}

/// Interactive carousel over the matches for `query`.
async fn browse(config: Config, store: PersistentStore, query: &str, start: usize) -> Result<()> {
    let provider = Arc::new(HttpQuoteProvider::new(&config.provider)?);
    let notices = Arc::new(QueuedNotifier::new());
    let surface: Arc<dyn InputSurface> = Arc::new(TerminalSurface::new());
    let mut session = QuoteSession::builder(config, store, provider)
        .notifier(notices.clone() as Arc<dyn Notifier>)
        .capabilities(platform::detect_capabilities())
        .input_surface(surface)
        .build()
        .await;

    let started = session.start().await;
    flush_notices(&notices);
    started?;

    session.set_query(query);
    if session.matches().is_empty() {
        log::info!("No quotes match '{}'", query);
        return Ok(());
    }
    session.open_match(start)?;

    let mut status = String::new();
    while session.carousel_state() != CarouselState::Closed {
        render(&session, &status)?;

        match terminal::read_input().await? {
            TerminalInput::Nav(event) => {
                session.handle_input(event);
            }
            TerminalInput::Copy => {
                if let Err(e) = session.copy_match().await {
                    log::debug!("Copy failed: {}", e);
                }
            }
            TerminalInput::Favorite => {
                if let Some(quote) = session.current_match().cloned() {
                    session.add_favorite(quote).await;
                }
            }
            TerminalInput::Ignored => continue,
        }

        status = notices
            .drain()
            .into_iter()
            .map(|notice| notice.message)
            .collect::<Vec<_>>()
            .join("  ");
    }

    // Terminal is restored once the carousel closes
    println!();
    Ok(())
}

fn flush_notices(notices: &QueuedNotifier) {
    for notice in notices.drain() {
        log::info!("[{}] {}", notice.level, notice.message);
    }
}

fn render(session: &QuoteSession, status: &str) -> io::Result<()> {
    let mut out = io::stdout();
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;

    if let (CarouselState::Open { index }, Some(quote)) =
        (session.carousel_state(), session.current_match())
    {
        write!(out, "[{}/{}]\r\n\r\n", index + 1, session.matches().len())?;
        write!(out, "\"{}\"\r\n  — {}\r\n", quote.content, quote.author)?;
        if !quote.tags.is_empty() {
            write!(out, "  #{}\r\n", quote.tag_line())?;
        }
    }

    write!(
        out,
        "\r\n←/→ or drag: navigate   c: copy   f: favorite   Esc/q: close\r\n"
    )?;
    if !status.is_empty() {
        write!(out, "{}\r\n", status)?;
    }
    out.flush()
}
