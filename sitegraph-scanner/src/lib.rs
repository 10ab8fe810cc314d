pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod frontier;
pub mod graph;
pub mod result;
pub mod tracker;
pub mod visited;

pub use crawler::{Crawler, ProgressCallback, ResultCallback};
pub use error::ScanError;
pub use fetch::{FetchedPage, Fetcher, HttpFetcher};
pub use graph::{LinkGraph, SiteMap};
pub use result::{CrawlOutcome, CrawlStats, PageResult};
