//! Content types for files served to the renderer.

use std::path::Path;

/// Content types the server itself emits.
pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// Extension table. Bundler output is mostly scripts, styles, source maps
/// and whatever assets the renderer imports.
const BY_EXTENSION: &[(&[&str], &str)] = &[
    (&["html", "htm"], types::HTML),
    (&["js", "mjs", "cjs"], types::JAVASCRIPT),
    (&["css"], "text/css; charset=utf-8"),
    (&["json", "map"], "application/json"),
    (&["wasm"], "application/wasm"),
    (&["txt"], types::PLAIN),
    (&["svg"], "image/svg+xml"),
    (&["png"], "image/png"),
    (&["jpg", "jpeg"], "image/jpeg"),
    (&["gif"], "image/gif"),
    (&["webp"], "image/webp"),
    (&["ico"], "image/x-icon"),
    (&["woff"], "font/woff"),
    (&["woff2"], "font/woff2"),
    (&["ttf"], "font/ttf"),
];

/// Content type for `path`, by extension (case-insensitive).
pub fn from_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return types::OCTET_STREAM;
    };

    BY_EXTENSION
        .iter()
        .find(|(exts, _)| exts.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .map_or(types::OCTET_STREAM, |&(_, mime)| mime)
}

/// HTML responses get the reload script injected.
pub fn is_html(mime: &str) -> bool {
    mime == types::HTML
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(Path::new("index.html")), types::HTML);
        assert_eq!(from_path(Path::new("INDEX.HTM")), types::HTML);
        assert_eq!(from_path(Path::new("worker.mjs")), types::JAVASCRIPT);
        assert_eq!(from_path(Path::new("app.js.map")), "application/json");
        assert_eq!(from_path(Path::new("logo.png")), "image/png");
        assert_eq!(from_path(Path::new("unknown.xyz")), types::OCTET_STREAM);
        assert_eq!(from_path(Path::new("Makefile")), types::OCTET_STREAM);
    }

    #[test]
    fn test_is_html() {
        assert!(is_html(from_path(Path::new("a.html"))));
        assert!(!is_html(types::JAVASCRIPT));
    }
}
