//! glean-sweep - Contest-sweeping daemon for the Fediverse
//!
//! Searches for giveaway posts, works out what each one asks entrants to
//! do, and performs those actions at a human pace.

use clap::Parser;
use libgleaner::logging::{LogFormat, LoggingConfig};
use libgleaner::platforms::mastodon::MastodonPlatform;
use libgleaner::platforms::Platform;
use libgleaner::{Config, Engine, GleanerError, Result, RunSummary, Shutdown};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "glean-sweep")]
#[command(version)]
#[command(about = "Contest-sweeping daemon for the Fediverse")]
#[command(long_about = "\
glean-sweep - Contest-sweeping daemon for the Fediverse

DESCRIPTION:
    glean-sweep is a long-running daemon that searches Mastodon for
    giveaway posts, works out what each one asks entrants to do (boost,
    favorite, follow, reply, tag friends, send a DM), and performs those
    actions with randomized pauses between them.

    Posts from banned authors, posts containing banned words, and posts
    the account already entered are skipped. When the following list
    grows past its ceiling, the oldest follows are shed to make room.

USAGE:
    # Run in the foreground (logs to stderr)
    glean-sweep

    # Use an explicit configuration file
    glean-sweep --config ./gleaner.toml

    # Sweep one batch and exit
    glean-sweep --once

    # Print the run summary as JSON
    glean-sweep --once --format json

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current action)

CONFIGURATION:
    Configuration file: ~/.config/gleaner/config.toml
    Override with GLEANER_CONFIG or --config.

    [platform]
    instance = \"mastodon.social\"
    token_file = \"~/.config/gleaner/mastodon.token\"

    [search]
    keywords = [\"giveaway\", \"contest\"]

EXIT CODES:
    0 - Clean shutdown
    1 - Platform or configuration error
    2 - Authentication or rate-limit error
    3 - Invalid input

For more information, visit: https://github.com/gleaner/gleaner
")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sweep one batch and exit
    #[arg(long)]
    once: bool,

    /// Output format for the run summary (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SummaryFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Run the main logic and handle errors
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Reject a bad format before anything slow happens
    let summary_format = parse_format(&cli.format)?;

    init_logging(cli.verbose);

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    // Connect and verify credentials before entering the loop
    let mut platform = MastodonPlatform::from_config(&config.platform)?;
    let account = platform.verify().await?;
    info!(account = %account.handle, "authenticated");

    // Set up graceful shutdown
    let shutdown = Shutdown::new();
    setup_signal_handlers(shutdown.clone())?;

    let mut engine = Engine::new(config, Box::new(platform), shutdown);

    info!("glean-sweep starting");
    let result = if cli.once {
        engine.run_once().await
    } else {
        engine.run().await
    };

    // The summary prints even when the run ended on a failure
    print_summary(engine.summary(), summary_format);

    result
}

/// Initialize logging from GLEANER_LOG_* with the --verbose override
fn init_logging(verbose: bool) {
    let format = std::env::var("GLEANER_LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LogFormat::Text);
    let level = std::env::var("GLEANER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    LoggingConfig::new(format, level, verbose).init();
}

fn parse_format(format: &str) -> Result<SummaryFormat> {
    match format {
        "text" => Ok(SummaryFormat::Text),
        "json" => Ok(SummaryFormat::Json),
        other => Err(GleanerError::InvalidInput(format!(
            "Invalid format: '{}'. Valid options: text, json",
            other
        ))),
    }
}

/// Set up signal handlers for graceful shutdown
fn setup_signal_handlers(shutdown: Shutdown) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])
        .map_err(|e| GleanerError::InvalidInput(format!("Signal setup failed: {}", e)))?;

    // Spawn thread to handle signals
    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal, stopping gracefully...");
                    shutdown.trigger();
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(())
}

fn print_summary(summary: &RunSummary, format: SummaryFormat) {
    match format {
        SummaryFormat::Text => {
            println!("batches:         {}", summary.batches);
            println!("posts seen:      {}", summary.posts_seen);
            println!("posts skipped:   {}", summary.posts_skipped);
            println!("posts engaged:   {}", summary.posts_engaged);
            println!("reposts:         {}", summary.reposts);
            println!("favorites:       {}", summary.favorites);
            println!("follows:         {}", summary.follows);
            println!("comments:        {}", summary.comments);
            println!("tag comments:    {}", summary.tag_comments);
            println!("direct messages: {}", summary.direct_messages);
            println!("unfollows:       {}", summary.unfollows);
        }
        SummaryFormat::Json => match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize summary: {}", e),
        },
    }
}
