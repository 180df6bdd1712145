//! Project configuration management for `devwatch.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── host       # [host]
//! │   ├── serve      # [serve]
//! │   └── target     # [main], [worker]
//! ├── error.rs       # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # config file lookup, path resolution
//! └── mod.rs         # DevConfig (this file)
//! ```
//!
//! A missing `devwatch.toml` is not an error: every section has defaults
//! matching a conventional `packages/{main,pack-worker,renderer}` layout.

mod error;
pub mod section;
mod util;

use util::{find_config_file, resolve_from_root};

pub use section::{HostConfig, Section, ServeConfig, Strategy, TargetConfig};
pub use error::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, DevArgs},
    log,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const DEFAULT_CONFIG_NAME: &str = "devwatch.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing devwatch.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Dev server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Main process bundle
    #[serde(default = "TargetConfig::default_main")]
    pub main: TargetConfig,

    /// Worker bundle
    #[serde(default = "TargetConfig::default_worker")]
    pub worker: TargetConfig,

    /// Host process launch
    #[serde(default)]
    pub host: HostConfig,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            serve: ServeConfig::default(),
            main: TargetConfig::default_main(),
            worker: TargetConfig::default_worker(),
            host: HostConfig::default(),
        }
    }
}

impl DevConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory, or cwd when running on defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let (mut config, config_path) = match find_config_file(&cli.config) {
            Some(path) => (Self::from_path(&path)?, path),
            None if cli.config != Path::new(DEFAULT_CONFIG_NAME) => {
                bail!("config file `{}` not found", cli.config.display());
            }
            None => {
                let cwd =
                    std::env::current_dir().context("Failed to get current working directory")?;
                crate::debug!("config"; "no {} found, using defaults", DEFAULT_CONFIG_NAME);
                (Self::default(), cwd.join(DEFAULT_CONFIG_NAME))
            }
        };

        config.finalize(&config_path, &cli.dev_args());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // finalize: paths + cli overrides
    // ========================================================================

    /// Resolve paths against the project root and apply CLI overrides.
    pub fn finalize(&mut self, config_path: &Path, args: &DevArgs) {
        let root = config_path
            .parent()
            .map(crate::utils::path::normalize_path)
            .unwrap_or_default();

        self.config_path = config_path.to_path_buf();
        self.normalize_paths(&root);
        self.root = root;
        self.apply_dev_args(args);
    }

    /// Normalize all paths relative to root directory.
    fn normalize_paths(&mut self, root: &Path) {
        self.serve.root = resolve_from_root(&self.serve.root, root);

        for target in [&mut self.main, &mut self.worker] {
            target.out_dir = resolve_from_root(&target.out_dir, root);
            target.cwd = Some(
                target
                    .cwd
                    .as_deref()
                    .map_or_else(|| root.to_path_buf(), |cwd| resolve_from_root(cwd, root)),
            );
            target.watch = target
                .watch
                .iter()
                .map(|p| resolve_from_root(p, root))
                .collect();
        }

        self.host.cwd = Some(
            self.host
                .cwd
                .as_deref()
                .map_or_else(|| root.to_path_buf(), |cwd| resolve_from_root(cwd, root)),
        );
    }

    /// Apply dev command options. `--debug` can only turn debug mode on.
    fn apply_dev_args(&mut self, args: &DevArgs) {
        self.host.debug |= args.debug;
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.serve.ws_port, args.ws_port.as_ref());
        Self::update_option(&mut self.serve.watch, args.watch.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.serve.validate(&mut diag);
        self.main.validate(Section::Main, &mut diag);
        self.worker.validate(Section::Worker, &mut diag);
        self.host.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config and panic on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> DevConfig {
    let (parsed, ignored) = DevConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tempfile::TempDir;

    #[test]
    fn test_invalid_toml() {
        let result = DevConfig::parse_with_ignored("[serve\nport = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DevConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[serve]\nport = 3344\nprot = 1\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = DevConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.serve.port, 3344);
        assert!(ignored.iter().any(|f| f.contains("prot")));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_finalize_resolves_paths_against_config_dir() {
        let temp = TempDir::new().unwrap();
        let root = crate::utils::path::normalize_path(temp.path());
        let mut config = test_parse_config(
            "[host]\ncwd = \"app\"\n[worker]\ncommand = [\"make\"]\nout_dir = \"out/worker\"",
        );

        config.finalize(&root.join(DEFAULT_CONFIG_NAME), &DevArgs::default());

        assert_eq!(config.root, root);
        assert_eq!(config.serve.root, root.join("packages/renderer"));
        assert_eq!(config.worker.out_dir, root.join("out/worker"));
        assert_eq!(config.worker.cwd.as_deref(), Some(root.as_path()));
        assert_eq!(config.host.cwd, Some(root.join("app")));
    }

    #[test]
    fn test_cli_overrides() {
        let temp = TempDir::new().unwrap();
        let mut config = test_parse_config("[serve]\nport = 5000\nwatch = true");
        let args = DevArgs {
            debug: true,
            interface: Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: Some(6000),
            ws_port: None,
            watch: Some(false),
        };

        config.finalize(&temp.path().join(DEFAULT_CONFIG_NAME), &args);

        assert!(config.host.debug);
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.serve.port, 6000);
        assert_eq!(config.serve.ws_port, 3345);
        assert!(!config.serve.watch);
    }

    #[test]
    fn test_debug_flag_does_not_clear_config_debug() {
        let temp = TempDir::new().unwrap();
        let mut config = test_parse_config("[host]\ndebug = true");
        config.finalize(&temp.path().join(DEFAULT_CONFIG_NAME), &DevArgs::default());
        assert!(config.host.debug);
    }

    #[test]
    fn test_validate_reports_every_section() {
        let config = test_parse_config(
            "[serve]\nport = 9000\nws_port = 9000\n[main]\ncommand = []\n[worker]\ncommand = []\n[host]\nlaunch = []",
        );
        let err = config.validate().unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("serve.ws_port"));
        assert!(message.contains("main.command"));
        assert!(message.contains("worker.command"));
        assert!(message.contains("host.launch"));
    }
}
