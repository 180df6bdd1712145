//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Resolve URL to filesystem path, handling index.html for directories
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;

    // Reject paths with suspicious patterns early
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let local = serve_root.join(&clean);

    // Canonicalize to resolve symlinks and verify path is under serve_root
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Normalize URL: strip query string and fragment, decode, trim slashes.
///
/// `None` when the decoded path is not UTF-8.
fn normalize_url(url: &str) -> Option<String> {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;

    Some(decoded.trim_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("index.html"), "<html></html>").unwrap();
        fs::create_dir(temp.path().join("settings")).unwrap();
        fs::write(temp.path().join("settings/index.html"), "<html></html>").unwrap();
        fs::write(temp.path().join("app.js"), "1").unwrap();
        temp
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/").as_deref(), Some(""));
        assert_eq!(normalize_url("/a/b.js?v=1").as_deref(), Some("a/b.js"));
        assert_eq!(normalize_url("/my%20file.css#top").as_deref(), Some("my file.css"));
        assert_eq!(normalize_url("/%FF"), None);
    }

    #[test]
    fn test_resolves_files_and_index() {
        let temp = site();
        let root = temp.path().canonicalize().unwrap();

        assert_eq!(resolve_path("/", temp.path()), Some(root.join("index.html")));
        assert_eq!(
            resolve_path("/settings/", temp.path()),
            Some(root.join("settings/index.html"))
        );
        assert_eq!(resolve_path("/app.js?t=1", temp.path()), Some(root.join("app.js")));
        assert_eq!(resolve_path("/missing.js", temp.path()), None);
    }

    #[test]
    fn test_undecodable_path_is_not_the_index() {
        let temp = site();
        assert_eq!(resolve_path("/%FF", temp.path()), None);
        assert_eq!(resolve_path("/%C3%28/", temp.path()), None);
    }

    #[test]
    fn test_rejects_traversal() {
        let temp = site();
        let root = temp.path().join("settings");

        assert_eq!(resolve_path("/../app.js", &root), None);
        assert_eq!(resolve_path("/%2e%2e/app.js", &root), None);
    }
}
