//! likms-crawler main entry point
//!
//! This is the command-line interface for the new-bill crawler.

use chrono::NaiveDate;
use clap::Parser;
use likms_crawler::config::{load_config_with_hash, Config};
use likms_crawler::crawler::{crawl, CrawlReport, NewBillSpider};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// likms-crawler: fetches newly filed bills from the legislative information system
///
/// Fetches the listing of bills filed since a date, then the specification,
/// summary, proposer and withdrawer pages of every bill on it.
#[derive(Parser, Debug)]
#[command(name = "likms-crawler")]
#[command(version)]
#[command(about = "Crawls newly filed bills", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Only list bills filed on or after this date (YYYY-MM-DD, default today)
    #[arg(long, value_name = "DATE")]
    since: Option<NaiveDate>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, cli.since)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, cli.since, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("likms_crawler=info,warn"),
            1 => EnvFilter::new("likms_crawler=debug,info"),
            2 => EnvFilter::new("likms_crawler=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, since: Option<NaiveDate>) -> Result<(), Box<dyn std::error::Error>> {
    let spider = NewBillSpider::new(config, since)?;
    let listing = spider.listing_request()?;

    println!("=== likms-crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Request delay: {}ms", config.crawler.request_delay);
    println!(
        "  Retries: {} (every {}ms)",
        config.crawler.max_retries, config.crawler.retry_delay
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Page size: {}", config.crawler.page_size);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Referer: {}", config.site.referer());
    println!("  Allowed domains: {}", config.site.allowed_domains.join(", "));

    println!("\nURL Rules:");
    for operation in spider.rules().operations() {
        if let Some(rule) = spider.rules().get(operation) {
            let query: Vec<String> = rule
                .query
                .iter()
                .map(|(name, keyword)| format!("{}={{{}}}", name, keyword))
                .collect();
            println!("  {} -> {}?{}", operation, rule.path, query.join("&"));
        }
    }

    println!("\nOutput:");
    if let Some(directory) = &config.output.directory {
        println!("  Directory: {}", directory);
    }
    if let Some(database_path) = &config.output.database_path {
        println!("  Database: {}", database_path);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start with listing: {}", listing.url);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use likms_crawler::output::{load_statistics, print_statistics};
    use likms_crawler::storage::SqliteStorage;
    use std::path::Path;

    let database_path = config
        .output
        .database_path
        .as_deref()
        .ok_or("--stats needs [output] database-path in the configuration")?;

    println!("Database: {}\n", database_path);

    let storage = SqliteStorage::new(Path::new(database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    since: Option<NaiveDate>,
    config_hash: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match crawl(config, since, config_hash).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");
    println!("  Listing pages: {}", report.listing_pages);
    println!("  Bills discovered: {}", report.bills_discovered);
    println!("  Bills dispatched: {}", report.bills_dispatched);
    println!("  Pages dispatched: {}", report.pages_dispatched);
    println!("  Pages fetched: {}", report.pages_fetched);
    println!("  Pages failed: {}", report.pages_failed);
    println!("  Extraction errors: {}", report.extraction_errors);
    if report.duplicates_skipped > 0 {
        println!("  Repeated page requests skipped: {}", report.duplicates_skipped);
    }
    if report.offsite_dropped > 0 {
        println!("  Offsite requests dropped: {}", report.offsite_dropped);
    }
    println!("  Duration: {:.1}s", report.duration.as_secs_f64());
    println!("  Success rate: {:.1}%", report.success_rate());

    if !report.incomplete_bills.is_empty() {
        println!(
            "\nBills with failed pages ({}): {}",
            report.incomplete_bills.len(),
            report.incomplete_bills.join(", ")
        );
    }
}
