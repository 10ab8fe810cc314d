pub mod crawl;
pub mod export;

pub use crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path, generate_crawl_report,
};
pub use export::{render_sitemap, save_sitemap};
