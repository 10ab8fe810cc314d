use parking_lot::RwLock;
use std::collections::HashSet;

/// Set of URLs that have already been claimed for crawling.
///
/// Entries are never removed. Reads take the shared lock, inserts the
/// exclusive one.
#[derive(Debug, Default)]
pub struct VisitedCache {
    urls: RwLock<HashSet<String>>,
}

impl VisitedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, url: &str) -> bool {
        self.urls.read().contains(url)
    }

    /// Idempotent insert.
    pub fn add(&self, url: &str) {
        self.urls.write().insert(url.to_string());
    }

    /// Checks and inserts under one write lock. Returns `true` only for the
    /// caller that actually claimed the URL, so racing discoveries of the same
    /// address cannot both enqueue it.
    pub fn insert_if_absent(&self, url: &str) -> bool {
        let mut urls = self.urls.write();
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.read().is_empty()
    }

    /// Sorted copy of every visited URL.
    pub fn snapshot(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.urls.read().iter().cloned().collect();
        urls.sort();
        urls
    }
}
