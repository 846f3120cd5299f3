//! Abstractfeed - personalized research abstract feed
//!
//! Command-line entry point: a line-oriented browsing shell over the feed
//! controller, plus a summary of what previous sessions left on disk.

use abstractfeed_core::{
    utils::text::truncate_at_char_boundary, AbstractArchive, CurrentView, Direction, FeedConfig,
    FeedController, FeedPhase, NatureCatalog, PreloadStore,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, Level};
use tracing_subscriber::{self, EnvFilter};

/// How often the shell checks for finished background work
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "abstractfeed")]
#[command(about = "Endless feed of research abstracts ranked by what you liked", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML)
    #[arg(long, env = "ABSTRACTFEED_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory (overrides configuration)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the feed (default)
    Browse,

    /// Show the archive and the preload queue left by previous sessions
    Stats,
}

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Next,
    Previous,
    Like,
    Open,
    Refresh,
    Help,
    Quit,
    Unknown(String),
}

impl ShellCommand {
    fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "" | "n" | "next" => ShellCommand::Next,
            "p" | "prev" | "previous" => ShellCommand::Previous,
            "l" | "like" => ShellCommand::Like,
            "o" | "open" => ShellCommand::Open,
            "r" | "refresh" => ShellCommand::Refresh,
            "h" | "help" | "?" => ShellCommand::Help,
            "q" | "quit" | "exit" => ShellCommand::Quit,
            other => ShellCommand::Unknown(other.to_string()),
        }
    }

    /// Navigation typed while loading is answered by showing the first document
    fn is_navigation(&self) -> bool {
        matches!(self, ShellCommand::Next | ShellCommand::Previous)
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<FeedConfig> {
    let config = FeedConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    Ok(match &cli.data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    })
}

fn print_help() {
    println!("Commands: [Enter]/n next, p previous, l like, o open link, r load more, q quit");
}

fn render(view: &CurrentView) {
    println!();
    println!("[{}/{}] {}", view.index + 1, view.feed_len, view.title);
    println!();
    println!("{}", view.body_text);
    println!();
    if view.liked {
        println!("(liked)");
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

async fn browse(config: FeedConfig) -> anyhow::Result<()> {
    let source = NatureCatalog::new(&config.source).context("Failed to create catalog client")?;
    let mut feed = FeedController::new(&config, Arc::new(source))
        .context("Failed to initialize the feed")?;
    info!("Corpus holds {} archived abstracts", feed.corpus_len());

    if feed.start() == FeedPhase::Loading {
        println!("Loading...");
    } else if let Some(view) = feed.current() {
        render(&view);
    }
    print_help();
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let was_ready = feed.phase() == FeedPhase::Ready;
                if feed.poll() && !was_ready {
                    match feed.current() {
                        Some(view) => render(&view),
                        None => println!("No documents could be fetched. Try 'r' to retry."),
                    }
                    prompt();
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    debug!("stdin closed");
                    break;
                };

                let command = ShellCommand::parse(&line);
                let was_ready = feed.phase() == FeedPhase::Ready;
                if feed.poll() && !was_ready {
                    if let Some(view) = feed.current() {
                        render(&view);
                        if command.is_navigation() {
                            prompt();
                            continue;
                        }
                    }
                }

                match command {
                    ShellCommand::Quit => break,
                    ShellCommand::Next | ShellCommand::Previous if feed.phase() != FeedPhase::Ready => {
                        println!("{}...", feed.phase());
                    }
                    ShellCommand::Next => {
                        if !feed.advance(Direction::Forward) {
                            println!("No more documents to display yet.");
                        }
                        if let Some(view) = feed.current() {
                            render(&view);
                        }
                    }
                    ShellCommand::Previous => {
                        if feed.advance(Direction::Backward) {
                            if let Some(view) = feed.current() {
                                render(&view);
                            }
                        }
                    }
                    ShellCommand::Like => {
                        if feed.like() {
                            println!("Liked.");
                        }
                    }
                    ShellCommand::Open => match feed.open() {
                        Some(url) => println!("{}", url),
                        None => println!("Nothing to open."),
                    },
                    ShellCommand::Refresh => {
                        if feed.refresh() {
                            println!("Loading more...");
                        }
                    }
                    ShellCommand::Help => print_help(),
                    ShellCommand::Unknown(other) => {
                        println!("Unknown command '{}'", other);
                        print_help();
                    }
                }
                prompt();
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                debug!("Interrupted");
                break;
            }
        }
    }

    if feed.is_refreshing() {
        println!("Finishing the current load before exiting...");
    }
    let report = feed.shutdown().await;
    if let Some(path) = &report.archive_path {
        println!("Archived top abstracts to {}", path.display());
    }
    println!("Saved {} documents for next time", report.preloaded);
    Ok(())
}

fn stats(config: &FeedConfig) -> anyhow::Result<()> {
    let archive = AbstractArchive::from_config(config);
    let files = archive.list_files().context("Failed to list the archive")?;
    let corpus = archive.load_corpus();

    println!("Data directory: {}", config.data_dir.display());
    println!(
        "Archive: {} files, {} abstracts in the corpus",
        files.len(),
        corpus.len()
    );

    let preload = PreloadStore::new(config.preload_path());
    match preload.load() {
        Some(docs) => {
            println!("Preload queue: {} documents", docs.len());
            for doc in docs.iter().take(5) {
                println!("  - {}", truncate_at_char_boundary(doc.title(), 80));
            }
        }
        None => println!("Preload queue: empty"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Keep HTTP client internals quiet unless asked for
    let filter = EnvFilter::new(format!(
        "abstractfeed={level},abstractfeed_core={level},reqwest=warn,hyper=warn",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Logs go to stderr, the feed to stdout
        .init();

    debug!("Abstractfeed v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Browse) {
        Commands::Browse => browse(config).await,
        Commands::Stats => stats(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell_commands() {
        assert_eq!(ShellCommand::parse(""), ShellCommand::Next);
        assert_eq!(ShellCommand::parse(" N \n"), ShellCommand::Next);
        assert_eq!(ShellCommand::parse("p"), ShellCommand::Previous);
        assert_eq!(ShellCommand::parse("l"), ShellCommand::Like);
        assert_eq!(ShellCommand::parse("o"), ShellCommand::Open);
        assert_eq!(ShellCommand::parse("q"), ShellCommand::Quit);
        assert_eq!(
            ShellCommand::parse("zzz"),
            ShellCommand::Unknown("zzz".to_string())
        );
    }

    #[test]
    fn test_only_navigation_is_absorbed_by_first_render() {
        assert!(ShellCommand::parse("").is_navigation());
        assert!(ShellCommand::parse("p").is_navigation());
        assert!(!ShellCommand::parse("l").is_navigation());
        assert!(!ShellCommand::parse("q").is_navigation());
        assert!(!ShellCommand::parse("o").is_navigation());
    }

    #[test]
    fn test_cli_defaults_to_browse() {
        let cli = Cli::parse_from(["abstractfeed"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");

        let cli = Cli::parse_from(["abstractfeed", "--data-dir", "/tmp/feed", "stats"]);
        assert!(matches!(cli.command, Some(Commands::Stats)));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/feed")));
    }
}
