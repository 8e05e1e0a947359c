//! Shopmap main entry point
//!
//! This is the command-line interface for the Shopmap store-locator harvester.

use anyhow::Context;
use clap::{Parser, Subcommand};
use shopmap::cache::Cache;
use shopmap::config::{load_config_with_hash, Config};
use shopmap::crawler::{run_crawl, Crawler};
use shopmap::output::{dedup_by_id, load_points, write_shops_csv, ColumnMapping, PointProvider, Weight};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Shopmap: a store-locator harvester
///
/// Shopmap walks a retailer's store locator, geocodes every store and writes
/// the result as CSV. Every HTTP response is cached, so a failed run can be
/// fixed and rerun without fetching anything twice.
#[derive(Parser, Debug)]
#[command(name = "shopmap")]
#[command(version = "1.0.0")]
#[command(about = "A store-locator harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH", default_value = "shopmap.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the site, geocode every store and write the CSV
    Crawl {
        /// Fetch every URL again once, overwriting its cached response
        #[arg(long)]
        refresh: bool,

        /// Keep responses in memory only for this run
        #[arg(long)]
        no_cache: bool,

        /// Drop stores whose id was already written
        #[arg(long)]
        dedup: bool,
    },

    /// Geocode one telephone number (via the override table) or address
    Resolve {
        #[arg(value_name = "PHONE|ADDRESS")]
        query: String,
    },

    /// Load a shop CSV as map points and print their centre
    Points {
        #[arg(value_name = "CSV")]
        path: PathBuf,
    },

    /// Inspect or edit the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Validate config and show what would be crawled without crawling
    Check,
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Show the number of stored responses
    Stats,

    /// Drop one stored response so the next run fetches it again
    Forget {
        #[arg(value_name = "KEY")]
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Point import does not need a config file
    if let Command::Points { path } = &cli.command {
        return handle_points(path);
    }

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context(format!("loading {}", cli.config.display()));
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let outcome = match cli.command {
        Command::Crawl {
            refresh,
            no_cache,
            dedup,
        } => handle_crawl(&config, refresh, no_cache, dedup).await,
        Command::Resolve { query } => handle_resolve(&config, &query).await,
        Command::Cache { action } => handle_cache(&config, action),
        Command::Check => handle_check(&config),
        Command::Points { .. } => Ok(()),
    };

    if let Err(e) = &outcome {
        tracing::error!("{:#}", e);
    }
    outcome
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shopmap=info,warn"),
            1 => EnvFilter::new("shopmap=debug,info"),
            2 => EnvFilter::new("shopmap=trace,debug"),
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

fn open_cache(config: &Config) -> anyhow::Result<Cache> {
    Cache::open(Path::new(&config.cache.path))
        .with_context(|| format!("opening cache at {}", config.cache.path))
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    refresh: bool,
    no_cache: bool,
    dedup: bool,
) -> anyhow::Result<()> {
    let cache = if no_cache {
        tracing::info!("Using an in-memory cache for this run");
        Cache::in_memory()
    } else {
        open_cache(config)?
    };

    if refresh {
        tracing::info!("Refreshing every cached response");
    }

    let shops = run_crawl(config, Arc::new(cache), refresh)
        .await
        .context("crawl aborted")?;

    let shops = if dedup { dedup_by_id(shops) } else { shops };
    let written = write_shops_csv(Path::new(&config.output.csv_path), &shops)
        .with_context(|| format!("writing {}", config.output.csv_path))?;

    println!("✓ {} stores written to {}", written, config.output.csv_path);
    Ok(())
}

/// Handles `resolve`: geocodes one phone number or free-text address
async fn handle_resolve(config: &Config, query: &str) -> anyhow::Result<()> {
    let cache = Arc::new(open_cache(config)?);
    let crawler = Crawler::from_config(config, Arc::clone(&cache), false)?;
    let resolver = crawler.resolver();

    let address = match resolver.overrides().get(query) {
        Some(address) => {
            println!("Override for {}: {}", query, address);
            address.to_string()
        }
        None => query.to_string(),
    };

    let result = resolver.resolve_text(&address).await;
    cache.close()?;

    let coordinate = result.with_context(|| format!("resolving '{}'", address))?;
    println!("{}", coordinate);
    Ok(())
}

/// Handles `points`: loads a CSV through the point factory
fn handle_points(path: &Path) -> anyhow::Result<()> {
    let points = load_points(path, &ColumnMapping::default(), &Weight::default())
        .with_context(|| format!("loading points from {}", path.display()))?;

    println!("Points: {}", points.len());
    match points.center() {
        Some(center) => println!("Centre: {}", center),
        None => println!("Centre: n/a"),
    }
    Ok(())
}

/// Handles `cache stats` and `cache forget`
fn handle_cache(config: &Config, action: CacheAction) -> anyhow::Result<()> {
    let cache = open_cache(config)?;
    println!("Cache: {}\n", config.cache.path);

    match action {
        CacheAction::Stats => {
            println!("Stored responses: {}", cache.len()?);
        }
        CacheAction::Forget { key } => {
            if cache.forget(&key)? {
                println!("✓ Forgot {}", key);
            } else {
                println!("No entry for {}", key);
            }
        }
    }

    cache.close()?;
    Ok(())
}

/// Handles `check`: validates config and shows what would be crawled
fn handle_check(config: &Config) -> anyhow::Result<()> {
    println!("=== Shopmap Check ===\n");

    println!("Site:");
    println!("  Root: {}", config.site.root_url);
    println!("  Expected stores: {}", config.site.expected_total);
    println!("  User agent: {}", config.site.user_agent);

    println!("\nSelectors:");
    println!("  Regions: {}", config.selectors.region_links);
    println!("  Sub-regions: {}", config.selectors.subregion_links);
    println!("  Locations: {}", config.selectors.location_records);

    println!("\nGeocoder:");
    println!("  Endpoint: {}", config.geocoder.endpoint);
    println!("  User agent: {}", config.geocoder.user_agent);

    println!("\nCrawler:");
    println!(
        "  Max concurrent sub-regions: {}",
        config.crawler.max_concurrent_subregions
    );
    match config.crawler.request_timeout_secs {
        Some(secs) => println!("  Request timeout: {}s", secs),
        None => println!("  Request timeout: none"),
    }

    println!("\nFiles:");
    println!("  Cache: {}", config.cache.path);
    println!("  Output: {}", config.output.csv_path);
    if let Some(path) = &config.overrides.path {
        println!("  Extra overrides: {}", path);
    }

    let crawler = Crawler::from_config(config, Arc::new(Cache::in_memory()), false)?;
    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} with {} address overrides",
        config.site.root_url,
        crawler.resolver().overrides().len()
    );

    Ok(())
}
