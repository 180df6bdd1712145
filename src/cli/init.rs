//! Configuration file generation.
//!
//! Writes a commented `devwatch.toml` whose values are the built-in
//! defaults, as a starting point for editing.

use anyhow::{Context, Result, bail};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::DEFAULT_CONFIG_NAME;
use crate::log;

const CONFIG_BODY: &str = r#"
# Dev server for the renderer
[serve]
interface = "127.0.0.1"       # 0.0.0.0 to allow LAN access
port = 3344                   # no fallback when taken
ws_port = 3345                # live reload WebSocket
root = "packages/renderer"
watch = true                  # reload pages when files under root change
debounce_ms = 300

# Main process bundle; the host process is relaunched after each rebuild.
# strategy = "resident": the command runs its own watch mode and every burst
#   of writes to out_dir counts as one rebuild.
# strategy = "oneshot": devwatch watches `watch` and runs the command once
#   per change; exit status 0 counts as a rebuild.
[main]
strategy = "resident"
command = ["npx", "vite", "build", "--watch", "--mode", "development", "--config", "packages/main/vite.config.ts"]
out_dir = "packages/main/dist"
debounce_ms = 300

# Worker bundle; connected pages reload after each rebuild
[worker]
strategy = "resident"
command = ["npx", "vite", "build", "--watch", "--mode", "development", "--config", "packages/pack-worker/vite.config.ts"]
out_dir = "packages/pack-worker/dist"
debounce_ms = 300

# Host process, launched with the dev server address in its environment
[host]
launch = ["electron", "."]
host_env = "VITE_DEV_SERVER_HOST"
port_env = "VITE_DEV_SERVER_PORT"
debug = false                 # true (or --debug): never launch, e.g. to attach a debugger

[host.env]
"#;

/// Commented default configuration.
pub fn config_template() -> String {
    format!(
        "# devwatch configuration file (v{})\n{CONFIG_BODY}",
        env!("CARGO_PKG_VERSION")
    )
}

/// Write the default configuration into `dir`.
pub fn write_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(DEFAULT_CONFIG_NAME);
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    fs::write(&path, config_template())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log!("init"; "wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DevConfig, test_parse_config};
    use tempfile::TempDir;

    #[test]
    fn test_template_matches_defaults() {
        let parsed = test_parse_config(&config_template());
        let defaults = DevConfig::default();

        assert_eq!(parsed.serve.port, defaults.serve.port);
        assert_eq!(parsed.serve.ws_port, defaults.serve.ws_port);
        assert_eq!(parsed.main.command, defaults.main.command);
        assert_eq!(parsed.worker.out_dir, defaults.worker.out_dir);
        assert_eq!(parsed.host.launch, defaults.host.launch);
        assert!(!parsed.host.debug);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DEFAULT_CONFIG_NAME), "# mine").unwrap();

        assert!(write_config(temp.path(), false).is_err());
        let kept = fs::read_to_string(temp.path().join(DEFAULT_CONFIG_NAME)).unwrap();
        assert_eq!(kept, "# mine");

        write_config(temp.path(), true).unwrap();
        let written = fs::read_to_string(temp.path().join(DEFAULT_CONFIG_NAME)).unwrap();
        assert!(written.starts_with("# devwatch configuration file"));
    }
}
