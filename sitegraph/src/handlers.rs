use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

// Re-export crawl types and functions from sitegraph-core
pub use sitegraph_core::crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path, generate_crawl_report,
};
pub use sitegraph_core::export::save_sitemap;

/// Installs the fmt subscriber. `RUST_LOG` overrides the default `warn` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when called more than once
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse a seed as a URL, trying to add http:// if needed
pub fn parse_seed(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(url.to_string());
    }

    let with_scheme = format!("http://{}", line);
    match Url::parse(&with_scheme) {
        Ok(url) if url.has_host() => Some(url.to_string()),
        _ => None,
    }
}

/// Expand `~` and environment variables in the output path
pub fn resolve_output_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand output path '{}'", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Build crawl options from the `crawl` subcommand's arguments
pub fn crawl_options_from_args(sub_matches: &ArgMatches, quiet: bool) -> Result<CrawlOptions> {
    let url = sub_matches
        .get_one::<Url>("url")
        .context("--url is required")?;
    let seed = parse_seed(url.as_str())
        .with_context(|| format!("'{}' is not a crawlable URL", url))?;

    let workers = *sub_matches.get_one::<usize>("threads").unwrap_or(&10);
    if workers == 0 {
        bail!("--threads must be at least 1");
    }
    let queue_capacity = *sub_matches
        .get_one::<usize>("queue-capacity")
        .unwrap_or(&1000);
    if queue_capacity == 0 {
        bail!("--queue-capacity must be at least 1");
    }

    Ok(CrawlOptions {
        seed,
        workers,
        queue_capacity,
        timeout_secs: *sub_matches.get_one::<u64>("timeout").unwrap_or(&10),
        pool_idle_per_host: *sub_matches.get_one::<usize>("pool-idle").unwrap_or(&30),
        show_progress: !quiet && !sub_matches.get_flag("no-progress"),
        ..CrawlOptions::default()
    })
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    init_tracing();

    let options = crawl_options_from_args(sub_matches, quiet)?;
    let output = sub_matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("sitemap.json");
    let output_path = resolve_output_path(output)?;

    if !quiet {
        print_divider();
        println!("{}", "  SITEGRAPH CRAWL".bright_white().bold());
        print_divider();
        println!("{} Seed: {}", "→".blue(), options.seed.bright_white());
        println!("{} Workers: {}", "→".blue(), options.workers);
        println!("{} Queue capacity: {}", "→".blue(), options.queue_capacity);
        println!("{} Timeout: {}s", "→".blue(), options.timeout_secs);
        println!(
            "{} Output: {}",
            "→".blue(),
            output_path.display().to_string().bright_white()
        );
        println!();
    }

    let progress_callback: CrawlProgressCallback = Arc::new(|msg: String| {
        tracing::info!("{}", msg);
    });

    let seed = options.seed.clone();
    let outcome = execute_crawl(options, Some(progress_callback))
        .await
        .with_context(|| format!("Crawl of {} failed", seed))?;

    save_sitemap(&outcome.sitemap, &output_path)
        .with_context(|| format!("Failed to export sitemap to {}", output_path.display()))?;

    if !quiet {
        println!();
        println!("{} Crawl complete!", "✓".green().bold());
        println!(
            "{} Sitemap: {}",
            "✓".green().bold(),
            output_path.display().to_string().bright_white()
        );
        println!();
        print!("{}", generate_crawl_report(&outcome));
    }

    Ok(())
}
