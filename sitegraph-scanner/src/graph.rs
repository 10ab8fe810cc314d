use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Exported form of the link graph: page address -> destinations in the
/// order they were recorded. Keys are sorted so serialization is stable.
pub type SiteMap = BTreeMap<String, Vec<String>>;

/// Append-only multimap of page -> linked destinations.
///
/// No dedup happens at the edge level; a page linking to the same target
/// twice yields two edges.
#[derive(Debug, Default)]
pub struct LinkGraph {
    pages: RwLock<HashMap<String, Vec<String>>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&self, source: &str, destination: &str) {
        self.pages
            .write()
            .entry(source.to_string())
            .or_default()
            .push(destination.to_string());
    }

    pub fn edges_from(&self, source: &str) -> Vec<String> {
        self.pages.read().get(source).cloned().unwrap_or_default()
    }

    pub fn page_count(&self) -> usize {
        self.pages.read().len()
    }

    pub fn edge_count(&self) -> usize {
        self.pages.read().values().map(Vec::len).sum()
    }

    /// Snapshot of the graph taken under the exclusive lock.
    pub fn export(&self) -> SiteMap {
        let pages = self.pages.write();
        pages
            .iter()
            .map(|(source, destinations)| (source.clone(), destinations.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_edges_are_kept() {
        let graph = LinkGraph::new();
        graph.add_edge("https://a.com/", "https://a.com/x");
        graph.add_edge("https://a.com/", "https://a.com/x");
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.page_count(), 1);
    }

    #[test]
    fn test_export_preserves_destination_order() {
        let graph = LinkGraph::new();
        graph.add_edge("https://a.com/", "https://a.com/z");
        graph.add_edge("https://a.com/", "https://a.com/b");
        graph.add_edge("https://a.com/b", "mailto:foo");

        let map = graph.export();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["https://a.com/", "https://a.com/b"]);
        assert_eq!(map["https://a.com/"], vec!["https://a.com/z", "https://a.com/b"]);
    }

    #[test]
    fn test_export_twice_is_identical() {
        let graph = LinkGraph::new();
        for i in 0..50 {
            graph.add_edge(&format!("https://a.com/{}", i % 7), &format!("https://a.com/{}", i));
        }
        let first = serde_json::to_string(&graph.export()).unwrap();
        let second = serde_json::to_string(&graph.export()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_edges_from_unknown_page_is_empty() {
        let graph = LinkGraph::new();
        assert!(graph.edges_from("https://a.com/").is_empty());
    }
}
