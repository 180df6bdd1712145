//! `[host]` section configuration.
//!
//! How the host process (the desktop app's main process) is launched after
//! each successful main rebuild.
//!
//! # Example
//!
//! ```toml
//! [host]
//! launch = ["electron", "."]
//! host_env = "VITE_DEV_SERVER_HOST"   # receives the dev server IP
//! port_env = "VITE_DEV_SERVER_PORT"   # receives the dev server port
//! debug = false                       # true: rebuild only, never launch
//!
//! [host.env]
//! ELECTRON_ENABLE_LOGGING = "1"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Host process launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Program and arguments of the host process.
    pub launch: Vec<String>,

    /// Working directory (default: project root).
    pub cwd: Option<PathBuf>,

    /// Variable receiving the dev server host.
    pub host_env: String,

    /// Variable receiving the dev server port.
    pub port_env: String,

    /// Extra variables, added on top of the inherited environment.
    pub env: BTreeMap<String, String>,

    /// Never launch the host process (it is started externally,
    /// e.g. under a debugger).
    pub debug: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            launch: vec!["electron".into(), ".".into()],
            cwd: None,
            host_env: "VITE_DEV_SERVER_HOST".into(),
            port_env: "VITE_DEV_SERVER_PORT".into(),
            env: BTreeMap::new(),
            debug: false,
        }
    }
}

impl HostConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.debug && self.launch.is_empty() {
            diag.error_with_hint(
                FieldPath::new("host.launch"),
                "host launch command is empty",
                "e.g. launch = [\"electron\", \".\"], or run with --debug",
            );
        }
        if self.host_env.is_empty() || self.port_env.is_empty() {
            diag.error(
                FieldPath::new("host.host_env"),
                "dev server address variable names must not be empty",
            );
        }
    }
}
