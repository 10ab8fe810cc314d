use crate::graph::SiteMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happened to a single crawl task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub response_time: Duration,
    /// Number of edges recorded for this page.
    pub links_found: usize,
    /// Number of those links that became new tasks.
    pub links_queued: usize,
    pub error: Option<String>,
}

impl PageResult {
    pub fn new(url: String) -> Self {
        Self {
            url,
            status_code: 0,
            content_type: None,
            response_time: Duration::from_secs(0),
            links_found: 0,
            links_queued: 0,
            error: None,
        }
    }

    pub fn with_error(url: String, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Tasks ever enqueued, seed included.
    pub enqueued: usize,
    /// Tasks ever marked complete.
    pub completed: usize,
    pub fetched: usize,
    pub failed: usize,
    /// Tasks dropped before fetching because of an unsupported scheme or an
    /// unparsable address.
    pub skipped: usize,
    pub edges: usize,
}

/// Everything a finished crawl produced.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub seed: String,
    pub sitemap: SiteMap,
    /// Sorted contents of the visited cache.
    pub visited: Vec<String>,
    pub pages: Vec<PageResult>,
    pub stats: CrawlStats,
    pub elapsed: Duration,
}
