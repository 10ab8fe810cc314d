use crate::error::Result;
use reqwest::Client;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POOL_IDLE_PER_HOST: usize = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("sitegraph/", env!("CARGO_PKG_VERSION"));

/// A page body as returned by a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The address that was requested.
    pub url: Url,
    /// The address the response came from after redirects.
    pub final_url: Url,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub response_time: Duration,
}

/// Network side of the crawl. Any status code counts as a successful fetch;
/// only transport failures are errors.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage>> + Send;
}

/// reqwest-backed fetcher with a bounded timeout and a capped idle pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_settings(
            DEFAULT_TIMEOUT_SECS,
            DEFAULT_POOL_IDLE_PER_HOST,
            DEFAULT_USER_AGENT,
        )
    }

    pub fn with_settings(
        timeout_secs: u64,
        pool_idle_per_host: usize,
        user_agent: &str,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(pool_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;

        let status_code = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await?;
        let response_time = start.elapsed();

        Ok(FetchedPage {
            url: url.clone(),
            final_url,
            status_code,
            content_type,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            response_time,
        })
    }
}
