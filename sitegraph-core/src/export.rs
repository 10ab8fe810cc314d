// Sitemap export

use sitegraph_scanner::{ScanError, SiteMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Pretty-printed JSON object mapping each page to its destinations.
pub fn render_sitemap(sitemap: &SiteMap) -> Result<String, ScanError> {
    let mut json = serde_json::to_string_pretty(sitemap)?;
    json.push('\n');
    Ok(json)
}

/// Writes the sitemap to `path`, creating parent directories as needed.
pub fn save_sitemap(sitemap: &SiteMap, path: &Path) -> Result<(), ScanError> {
    let content = render_sitemap(sitemap)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;

    info!("Sitemap with {} pages exported to {}", sitemap.len(), path.display());
    Ok(())
}
