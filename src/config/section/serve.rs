//! `[serve]` section configuration.
//!
//! Contains dev server settings for the renderer target.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3344                 # HTTP port number, no fallback when taken
//! ws_port = 3345              # Live reload WebSocket port
//! root = "packages/renderer"  # Directory served to the renderer
//! watch = true                # Reload clients when files under root change
//! debounce_ms = 300
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Dev server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port for live reload clients.
    pub ws_port: u16,

    /// Renderer root directory.
    pub root: PathBuf,

    /// Watch the renderer root and broadcast a full reload on change.
    pub watch: bool,

    /// Quiet period before a batch of renderer changes is reported.
    pub debounce_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3344,
            ws_port: 3345,
            root: PathBuf::from("packages/renderer"),
            watch: true,
            debounce_ms: 300,
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port != 0 && self.port == self.ws_port {
            diag.error_with_hint(
                FieldPath::new("serve.ws_port"),
                format!("live reload port {} is already used by serve.port", self.ws_port),
                "pick a different port, e.g. serve.port + 1",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;

    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_serve_config() {
        let config = test_parse_config(
            "[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nws_port = 8081\nwatch = false",
        );

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.ws_port, 8081);
        assert!(!config.serve.watch);
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 3344);
        assert_eq!(config.serve.ws_port, 3345);
        assert_eq!(config.serve.root, PathBuf::from("packages/renderer"));
        assert!(config.serve.watch);
        assert_eq!(config.serve.debounce_ms, 300);
    }

    #[test]
    fn test_serve_config_partial_override() {
        let config = test_parse_config("[serve]\nport = 3000");

        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.ws_port, 3345);
    }

    #[test]
    fn test_serve_config_same_ports_rejected() {
        let config = test_parse_config("[serve]\nport = 4000\nws_port = 4000");
        let mut diag = ConfigDiagnostics::new();
        config.serve.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
