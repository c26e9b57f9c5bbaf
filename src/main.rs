//! Portal-Sync main entry point
//!
//! This is the command-line interface for the Portal-Sync scrape-and-sync bridge.

use anyhow::Context;
use clap::Parser;
use portal_sync::config::{load_config_with_hash, Config, Credentials};
use portal_sync::output::{load_statistics, print_statistics, print_summary};
use portal_sync::storage::open_store;
use portal_sync::{PageFetcher, ResourceKind, Session, Synchronizer};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Portal-Sync: mirrors an admin panel's listings into SQLite
///
/// Portal-Sync logs into a server-rendered admin panel, walks its listing
/// pages, and upserts every record into a local database keyed by each
/// resource's natural key. Scheduling is left to cron or similar.
#[derive(Parser, Debug)]
#[command(name = "portal-sync")]
#[command(version)]
#[command(about = "Scrape-and-sync bridge for a server-rendered admin panel", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Sync only this resource (repeatable); overrides [sync] resources
    #[arg(short, long = "resource", value_name = "NAME")]
    resources: Vec<ResourceKind>,

    /// Validate config and show what would be synced without touching the network
    #[arg(long, conflicts_with_all = ["stats", "test_login"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "test_login"])]
    stats: bool,

    /// Only perform the login handshake and report the outcome
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    test_login: bool,
}

/// Exit code when the sync ran but some records failed or were rejected
const EXIT_RECORD_ERRORS: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let kinds = if cli.resources.is_empty() {
        config.resource_kinds()?
    } else {
        cli.resources.clone()
    };

    if cli.dry_run {
        handle_dry_run(&config, &kinds);
        Ok(ExitCode::SUCCESS)
    } else if cli.stats {
        handle_stats(&config)?;
        Ok(ExitCode::SUCCESS)
    } else if cli.test_login {
        handle_test_login(config).await
    } else {
        handle_sync(config, &kinds, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("portal_sync=info,warn"),
            1 => EnvFilter::new("portal_sync=debug,info"),
            2 => EnvFilter::new("portal_sync=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved resource plan
fn handle_dry_run(config: &Config, kinds: &[ResourceKind]) {
    println!("=== Portal-Sync Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!(
        "  Login: GET {} then POST {} (landing on *{}*)",
        config.source.login_page, config.source.login_endpoint, config.source.landing_marker
    );
    println!("  Re-login on expiry: {}", config.source.relogin_on_expiry);
    match config.source.request_timeout_secs {
        Some(secs) => println!("  Request timeout: {}s", secs),
        None => println!("  Request timeout: transport default"),
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nResources ({}):", kinds.len());
    for kind in kinds {
        let descriptor = kind.descriptor_with(config.resources.get(kind.name()));
        let query: Vec<String> = descriptor
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        let path = if query.is_empty() {
            descriptor.path.to_string()
        } else {
            format!("{}?{}", descriptor.path, query.join("&"))
        };
        match descriptor.paging {
            Some(paging) => println!(
                "  - {:<16} {} (page size {}, offset cap {})",
                kind.name(),
                path,
                paging.page_size,
                paging.max_offset
            ),
            None => println!("  - {:<16} {} (single page)", kind.name(), path),
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --test-login mode: performs only the login handshake
async fn handle_test_login(config: Config) -> anyhow::Result<ExitCode> {
    let credentials = Credentials::resolve(&config.credentials)?;
    let mut session = Session::new(config.source, credentials)?;

    if session.login().await? {
        println!("✓ Login succeeded");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("✗ Login rejected");
        Ok(ExitCode::FAILURE)
    }
}

/// Handles the main sync operation
async fn handle_sync(
    config: Config,
    kinds: &[ResourceKind],
    config_hash: &str,
) -> anyhow::Result<ExitCode> {
    let credentials = Credentials::resolve(&config.credentials)?;
    let store = open_store(Path::new(&config.output.database_path)).with_context(|| {
        format!("Failed to open database {}", config.output.database_path)
    })?;
    let session = Session::new(config.source, credentials)?;

    let mut synchronizer =
        Synchronizer::new(PageFetcher::new(session), store).with_overrides(&config.resources);

    tracing::info!(
        "Syncing {} resources: {}",
        kinds.len(),
        kinds.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ")
    );

    let summary = synchronizer
        .sync_all(kinds, config_hash)
        .await
        .context("Sync aborted")?;
    print_summary(&summary);

    if summary.has_errors() {
        Ok(ExitCode::from(EXIT_RECORD_ERRORS))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
