use crate::error::{Result, ScanError};
use crate::extract::{LinkExtractor, is_crawlable};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::frontier::{DEFAULT_QUEUE_CAPACITY, Frontier};
use crate::graph::LinkGraph;
use crate::result::{CrawlOutcome, CrawlStats, PageResult};
use crate::tracker::TaskTracker;
use crate::visited::VisitedCache;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(PageResult) + Send + Sync>;

/// State shared by every worker for the length of one crawl.
struct CrawlContext {
    frontier: Frontier,
    visited: VisitedCache,
    graph: LinkGraph,
    tracker: TaskTracker,
    extractor: LinkExtractor,
    pages: Mutex<Vec<PageResult>>,
    fetched: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
}

impl CrawlContext {
    fn new(seed: &Url, queue_capacity: usize) -> Self {
        Self {
            frontier: Frontier::new(queue_capacity),
            visited: VisitedCache::new(),
            graph: LinkGraph::new(),
            tracker: TaskTracker::new(),
            extractor: LinkExtractor::new(seed),
            pages: Mutex::new(Vec::new()),
            fetched: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
        }
    }

    fn stats(&self) -> CrawlStats {
        CrawlStats {
            enqueued: self.tracker.added(),
            completed: self.tracker.completed(),
            fetched: self.fetched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            edges: self.graph.edge_count(),
        }
    }
}

pub struct Crawler<F: Fetcher = HttpFetcher> {
    fetcher: Arc<F>,
    queue_capacity: usize,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl Crawler<HttpFetcher> {
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(HttpFetcher::new()?))
    }
}

impl<F: Fetcher> Crawler<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            progress_callback: None,
            result_callback: None,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    /// Crawls every page on the seed's host reachable from `seed_url`, using
    /// `workers` concurrent workers. Returns once the frontier is exhausted.
    ///
    /// Per-page failures are logged and recorded in the outcome; only bad
    /// configuration is returned as an error.
    pub async fn crawl(&self, seed_url: &str, workers: usize) -> Result<CrawlOutcome> {
        if workers == 0 {
            return Err(ScanError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ScanError::InvalidConfig(
                "queue capacity must be at least 1".to_string(),
            ));
        }

        let mut seed = Url::parse(seed_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", seed_url, e)))?;
        if seed.host_str().is_none() {
            return Err(ScanError::InvalidUrl(format!("{} has no host", seed_url)));
        }
        seed.set_fragment(None);

        info!("Starting crawl of {} with {} workers", seed, workers);
        let start = Instant::now();

        let ctx = Arc::new(CrawlContext::new(&seed, self.queue_capacity));
        ctx.visited.add(seed.as_str());
        ctx.tracker.task_added();
        ctx.frontier.push(seed.to_string()).await?;

        let observer = {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                ctx.tracker.wait_idle().await;
                if ctx.frontier.close() {
                    debug!("No outstanding tasks, frontier closed");
                }
            })
        };

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                tokio::spawn(Self::run_worker(
                    worker_id,
                    ctx.clone(),
                    self.fetcher.clone(),
                    self.progress_callback.clone(),
                    self.result_callback.clone(),
                ))
            })
            .collect();

        for joined in futures::future::join_all(handles).await {
            joined?;
        }
        observer.await?;

        let stats = ctx.stats();
        debug_assert_eq!(ctx.tracker.outstanding(), 0);
        debug_assert_eq!(stats.enqueued, stats.completed);

        let outcome = CrawlOutcome {
            seed: seed.to_string(),
            sitemap: ctx.graph.export(),
            visited: ctx.visited.snapshot(),
            pages: std::mem::take(&mut *ctx.pages.lock()),
            stats,
            elapsed: start.elapsed(),
        };

        info!(
            "Crawl complete. Fetched {} pages ({} failed) and recorded {} edges in {:?}",
            outcome.stats.fetched,
            outcome.stats.failed,
            outcome.stats.edges,
            outcome.elapsed
        );
        Ok(outcome)
    }

    async fn run_worker(
        worker_id: usize,
        ctx: Arc<CrawlContext>,
        fetcher: Arc<F>,
        progress_callback: Option<ProgressCallback>,
        result_callback: Option<ResultCallback>,
    ) {
        debug!("Worker {} started", worker_id);

        while let Some(url) = ctx.frontier.next().await {
            // Dropped at the end of this iteration, after every child has
            // been counted and queued or deferred.
            let _done = ctx.tracker.complete_on_drop();

            let page = match Url::parse(&url) {
                Ok(page) if is_crawlable(&page) => page,
                Ok(_) => {
                    debug!("[Worker {}] Skipping unsupported scheme: {}", worker_id, url);
                    ctx.skipped.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                Err(e) => {
                    warn!("[Worker {}] Invalid URL {}: {}", worker_id, url, e);
                    ctx.skipped.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            if let Some(ref callback) = progress_callback {
                callback(worker_id, url.clone());
            }

            let result = Self::process_page(worker_id, &ctx, fetcher.as_ref(), page).await;

            if let Some(ref callback) = result_callback {
                callback(result.clone());
            }
            ctx.pages.lock().push(result);
        }

        debug!("Worker {} finished", worker_id);
    }

    /// Fetches `page`, records its edges and enqueues its new children.
    async fn process_page(
        worker_id: usize,
        ctx: &Arc<CrawlContext>,
        fetcher: &F,
        page: Url,
    ) -> PageResult {
        debug!("[Worker {}] Processing {}", worker_id, page);

        let fetched = match fetcher.fetch(&page).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("[Worker {}] Failed to fetch {}: {}", worker_id, page, e);
                ctx.failed.fetch_add(1, Ordering::Relaxed);
                return PageResult::with_error(page.to_string(), e.to_string());
            }
        };
        ctx.fetched.fetch_add(1, Ordering::Relaxed);

        // Edges are keyed by the requested address, not the post-redirect one.
        let links = ctx
            .extractor
            .extract(&fetched.body, &page, &ctx.visited, &ctx.graph);

        let mut queued = 0;
        let mut overflow = Vec::new();
        for child in links.children {
            // Counted before it is queued and before this page completes.
            ctx.tracker.task_added();
            if !overflow.is_empty() {
                overflow.push(child);
                continue;
            }
            match ctx.frontier.try_push(child) {
                Ok(None) => queued += 1,
                Ok(Some(child)) => overflow.push(child),
                Err(e) => {
                    // Unreachable while this task is outstanding.
                    error!("[Worker {}] Could not enqueue child of {}: {}", worker_id, page, e);
                    ctx.tracker.task_done();
                }
            }
        }

        if !overflow.is_empty() {
            debug!(
                "[Worker {}] Frontier full, deferring {} children of {}",
                worker_id,
                overflow.len(),
                page
            );
            queued += overflow.len();
            spawn_deferred_push(ctx.clone(), overflow);
        }

        debug!(
            "[Worker {}] {} -> {} ({} links, {} queued)",
            worker_id, page, fetched.status_code, links.edges, queued
        );

        PageResult {
            url: page.to_string(),
            status_code: fetched.status_code,
            content_type: fetched.content_type,
            response_time: fetched.response_time,
            links_found: links.edges,
            links_queued: queued,
            error: None,
        }
    }
}

/// Pushes children that did not fit in the frontier from a separate task, so
/// the worker that found them goes back to draining the queue. The children
/// are already counted, which keeps the frontier open until they land.
fn spawn_deferred_push(ctx: Arc<CrawlContext>, urls: Vec<String>) {
    tokio::spawn(async move {
        for url in urls {
            if let Err(e) = ctx.frontier.push(url).await {
                error!("Could not enqueue deferred URL: {}", e);
                ctx.tracker.task_done();
            }
        }
    });
}
