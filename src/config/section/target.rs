//! `[main]` and `[worker]` build target configuration.
//!
//! # Example
//!
//! ```toml
//! # Resident: the build tool keeps itself running in watch mode.
//! # Every burst of writes to out_dir counts as one successful rebuild.
//! [worker]
//! strategy = "resident"
//! command = ["npx", "vite", "build", "--watch", "--mode", "development",
//!            "--config", "packages/pack-worker/vite.config.ts"]
//! out_dir = "packages/pack-worker/dist"
//!
//! # Oneshot: devwatch watches the sources and runs the command per change.
//! # Exit status 0 is a successful rebuild.
//! [main]
//! strategy = "oneshot"
//! command = ["npx", "esbuild", "src/main.ts", "--bundle", "--outdir=dist"]
//! watch = ["packages/main/src"]
//! out_dir = "packages/main/dist"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// How rebuild completion is detected for a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Build tool runs its own watch mode; completions are output writes.
    #[default]
    Resident,
    /// devwatch watches sources and runs the command once per change batch.
    Oneshot,
}

/// One build target (main process bundle or worker bundle).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Completion detection strategy.
    pub strategy: Strategy,

    /// Build command and arguments.
    pub command: Vec<String>,

    /// Working directory for the build command (default: project root).
    pub cwd: Option<PathBuf>,

    /// Bundle output directory.
    pub out_dir: PathBuf,

    /// Source roots to watch (`oneshot` only).
    pub watch: Vec<PathBuf>,

    /// Quiet period before a batch of file events is reported.
    pub debounce_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Resident,
            command: Vec::new(),
            cwd: None,
            out_dir: PathBuf::from("dist"),
            watch: Vec::new(),
            debounce_ms: 300,
        }
    }
}

impl TargetConfig {
    /// Defaults for the `[main]` section when it is omitted.
    pub fn default_main() -> Self {
        Self::vite_watch("packages/main")
    }

    /// Defaults for the `[worker]` section when it is omitted.
    pub fn default_worker() -> Self {
        Self::vite_watch("packages/pack-worker")
    }

    fn vite_watch(package: &str) -> Self {
        let vite_config = format!("{package}/vite.config.ts");
        Self {
            command: [
                "npx",
                "vite",
                "build",
                "--watch",
                "--mode",
                "development",
                "--config",
                vite_config.as_str(),
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            out_dir: PathBuf::from(format!("{package}/dist")),
            ..Self::default()
        }
    }

    /// Display name of the build tool (first command element).
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("build")
    }

    pub fn validate(&self, section: Section, diag: &mut ConfigDiagnostics) {
        if self.command.is_empty() {
            diag.error_with_hint(
                section.command_field(),
                "build command is empty",
                "e.g. command = [\"npx\", \"vite\", \"build\", \"--watch\"]",
            );
        }
        if self.strategy == Strategy::Oneshot && self.watch.is_empty() {
            diag.error_with_hint(
                section.watch_field(),
                "oneshot targets need at least one source root to watch",
                "e.g. watch = [\"src\"], or use strategy = \"resident\"",
            );
        }
    }
}

/// Which target section a `TargetConfig` was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Main,
    Worker,
}

impl Section {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Worker => "worker",
        }
    }

    const fn command_field(self) -> FieldPath {
        match self {
            Self::Main => FieldPath::new("main.command"),
            Self::Worker => FieldPath::new("worker.command"),
        }
    }

    const fn watch_field(self) -> FieldPath {
        match self {
            Self::Main => FieldPath::new("main.watch"),
            Self::Worker => FieldPath::new("worker.watch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_target_defaults_when_omitted() {
        let config = test_parse_config("");

        assert_eq!(config.main.strategy, Strategy::Resident);
        assert!(config.main.command.contains(&"--watch".to_string()));
        assert!(
            config
                .main
                .command
                .contains(&"packages/main/vite.config.ts".to_string())
        );
        assert_eq!(config.main.out_dir, PathBuf::from("packages/main/dist"));
        assert_eq!(
            config.worker.out_dir,
            PathBuf::from("packages/pack-worker/dist")
        );
    }

    #[test]
    fn test_oneshot_target() {
        let config = test_parse_config(
            "[main]\nstrategy = \"oneshot\"\ncommand = [\"make\", \"main\"]\nwatch = [\"src\"]",
        );

        assert_eq!(config.main.strategy, Strategy::Oneshot);
        assert_eq!(config.main.command, vec!["make", "main"]);
        assert_eq!(config.main.watch, vec![PathBuf::from("src")]);
        assert_eq!(config.main.program(), "make");
        // Fields not given fall back to the generic target defaults
        assert_eq!(config.main.out_dir, PathBuf::from("dist"));
    }

    #[test]
    fn test_validate_empty_command() {
        let target = TargetConfig::default();
        let mut diag = ConfigDiagnostics::new();
        target.validate(Section::Worker, &mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field.as_str(), "worker.command");
    }

    #[test]
    fn test_validate_oneshot_without_watch_roots() {
        let target = TargetConfig {
            strategy: Strategy::Oneshot,
            command: vec!["make".into()],
            ..TargetConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        target.validate(Section::Main, &mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field.as_str(), "main.watch");
    }
}
