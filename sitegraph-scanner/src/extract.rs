use crate::graph::LinkGraph;
use crate::visited::VisitedCache;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Result of scanning one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLinks {
    /// Newly claimed same-origin URLs, in document order.
    pub children: Vec<String>,
    /// Edges recorded for the page.
    pub edges: usize,
}

/// Pulls `<a href>` targets out of a page, records every edge and hands back
/// the same-origin URLs that were newly claimed in the visited cache.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    host: String,
    port: Option<u16>,
    selector: Selector,
}

impl LinkExtractor {
    /// Links are followed only when their host (and explicit port, if any)
    /// match `origin`.
    pub fn new(origin: &Url) -> Self {
        Self {
            host: origin.host_str().unwrap_or_default().to_string(),
            port: origin.port(),
            selector: Selector::parse("a[href]").expect("static selector is valid"),
        }
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.host_str() == Some(self.host.as_str()) && url.port() == self.port
    }

    /// Returns the children to enqueue along with the number of edges
    /// recorded for `page`.
    ///
    /// Every resolvable href becomes an edge in `graph`, including cross-origin,
    /// non-HTTP and already-visited targets. Broken markup only ever shortens
    /// the result.
    pub fn extract(
        &self,
        body: &str,
        page: &Url,
        visited: &VisitedCache,
        graph: &LinkGraph,
    ) -> ExtractedLinks {
        let document = Html::parse_document(body);
        let source = page.as_str();

        let mut links = ExtractedLinks::default();
        for element in document.select(&self.selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(destination) = resolve_link(page, href) else {
                debug!("Skipping unresolvable href {:?} on {}", href, source);
                continue;
            };

            graph.add_edge(source, destination.as_str());
            links.edges += 1;

            if is_crawlable(&destination)
                && self.is_same_origin(&destination)
                && visited.insert_if_absent(destination.as_str())
            {
                links.children.push(destination.to_string());
            }
        }

        links
    }
}

/// Resolves `href` against the page address, dropping any fragment.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let mut url = base.join(href.trim()).ok()?;
    url.set_fragment(None);
    Some(url)
}

pub fn is_crawlable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
