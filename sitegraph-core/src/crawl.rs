use indicatif::{ProgressBar, ProgressStyle};
use sitegraph_scanner::fetch::{
    DEFAULT_POOL_IDLE_PER_HOST, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use sitegraph_scanner::frontier::DEFAULT_QUEUE_CAPACITY;
use sitegraph_scanner::{CrawlOutcome, Crawler, HttpFetcher, PageResult, ScanError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;
use url::Url;

pub const DEFAULT_WORKERS: usize = 10;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub seed: String,
    pub workers: usize,
    pub queue_capacity: usize,
    pub timeout_secs: u64,
    pub pool_idle_per_host: usize,
    pub user_agent: String,
    pub show_progress: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            seed: String::new(),
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            pool_idle_per_host: DEFAULT_POOL_IDLE_PER_HOST,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            show_progress: false,
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome, ScanError> {
    let CrawlOptions {
        seed,
        workers,
        queue_capacity,
        timeout_secs,
        pool_idle_per_host,
        user_agent,
        show_progress,
    } = options;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let fetcher = HttpFetcher::with_settings(timeout_secs, pool_idle_per_host, &user_agent)?;
    let mut crawler = Crawler::with_fetcher(fetcher).with_queue_capacity(queue_capacity);

    if let Some(pb) = progress_bar.clone() {
        let count = processed_count.clone();
        crawler = crawler.with_progress_callback(Arc::new(move |_worker_id: usize, url: String| {
            let n = count.fetch_add(1, Ordering::Relaxed) + 1;
            pb.set_message(format!("Crawling... {} pages | {}", n, extract_url_path(&url)));
            pb.tick();
        }));
    }

    if let Some(ref callback) = progress_callback {
        let callback = callback.clone();
        crawler = crawler.with_result_callback(Arc::new(move |result: PageResult| {
            if let Some(ref error) = result.error {
                callback(format!("[!] {}: {}", result.url, error));
            }
        }));
    }

    info!("Crawling {} with {} workers", seed, workers);
    let outcome = crawler.crawl(&seed, workers).await;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} pages processed", total));
    }

    outcome
}

/// Generate a crawl report from an outcome
pub fn generate_crawl_report(outcome: &CrawlOutcome) -> String {
    let stats = &outcome.stats;

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Seed: {}\n", outcome.seed));
    report.push_str(&format!("  Pages fetched: {}\n", stats.fetched));
    report.push_str(&format!("  Pages failed: {}\n", stats.failed));
    report.push_str(&format!("  Tasks skipped: {}\n", stats.skipped));
    report.push_str(&format!("  URLs visited: {}\n", outcome.visited.len()));
    report.push_str(&format!("  Pages with links: {}\n", outcome.sitemap.len()));
    report.push_str(&format!("  Total links found: {}\n", stats.edges));
    report.push_str(&format!("  Elapsed: {:.2}s\n", outcome.elapsed.as_secs_f64()));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Group results by host, sorted by path for stable output
    let mut by_host: BTreeMap<String, Vec<&PageResult>> = BTreeMap::new();
    for result in &outcome.pages {
        if let Ok(url) = Url::parse(&result.url)
            && let Some(host) = url.host_str()
        {
            by_host.entry(host.to_string()).or_default().push(result);
        }
    }

    for (host, host_results) in by_host.iter_mut() {
        host_results.sort_by(|a, b| a.url.cmp(&b.url));

        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages found\n\n", host_results.len()));

        for result in host_results.iter() {
            let path = extract_url_path(&result.url);

            let status_str = match (result.status_code, &result.error) {
                (_, Some(_)) => "\x1b[31mERR\x1b[0m".to_string(),
                (100..=199, _) => format!("\x1b[37m{}\x1b[0m", result.status_code), // White
                (200..=299, _) => format!("\x1b[32m{}\x1b[0m", result.status_code), // Green
                (300..=399, _) => format!("\x1b[36m{}\x1b[0m", result.status_code), // Cyan
                (400..=499, _) => format!("\x1b[33m{}\x1b[0m", result.status_code), // Orange/Yellow
                (500..=599, _) => format!("\x1b[31m{}\x1b[0m", result.status_code), // Red
                _ => format!("{}", result.status_code),
            };

            let mut line = format!("  {} {}", status_str, path);
            if result.links_found > 0 {
                line.push_str(&format!(
                    " \x1b[90m({} links, {} new)\x1b[0m",
                    result.links_found, result.links_queued
                ));
            }

            // Only show MIME type if it's not text/html
            if let Some(ref content_type) = result.content_type
                && !content_type.starts_with("text/html")
            {
                line.push_str(&format!(" \x1b[90m{}\x1b[0m", content_type));
            }

            if let Some(ref error) = result.error {
                line.push_str(&format!(" \x1b[90m{}\x1b[0m", error));
            }

            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    report
}
