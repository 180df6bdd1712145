//! `resident` strategy: the build tool runs its own watch mode.
//!
//! The tool (e.g. `vite build --watch`) is spawned once and never restarted.
//! It gives no machine-readable completion signal, so completions are read
//! off the output directory: one debounced burst of writes is one
//! successful rebuild. A failed build writes nothing and reports nothing;
//! the tool prints its own diagnostics to the shared terminal. A burst that
//! only removes files (an emptied `out_dir` before a failed write) is not a
//! build either.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use super::{BuildOutcome, BuildTool, WatchHandle, ensure_program};
use crate::actor::fs::{FsActor, WatchSpec};
use crate::actor::messages::PipelineMsg;
use crate::config::{Section, TargetConfig};
use crate::logger::status_error;
use crate::process::terminate_group;
use crate::utils::exec::Cmd;

pub struct Resident {
    section: Section,
    config: TargetConfig,
}

impl Resident {
    pub fn new(section: Section, config: TargetConfig) -> Self {
        Self { section, config }
    }
}

impl BuildTool for Resident {
    fn watch(self: Box<Self>, events: mpsc::Sender<PipelineMsg>) -> Result<WatchHandle> {
        let name = self.section.name();
        let config = self.config;
        let cwd = config.cwd.as_deref().unwrap_or(Path::new("."));

        ensure_program(self.section, &config.command, cwd)?;

        // Watched before the tool starts, so its initial build is seen
        std::fs::create_dir_all(&config.out_dir)
            .with_context(|| format!("failed to create {}", config.out_dir.display()))?;

        let fs = FsActor::spawn(
            WatchSpec {
                label: name,
                roots: vec![config.out_dir.clone()],
                ignore: Vec::new(),
                debounce: Duration::from_millis(config.debounce_ms),
                initial_batch: false,
            },
            move |batch| {
                if !batch.has_writes() {
                    crate::debug!(name; "output removed, not a build: {}", batch.summary());
                    return true;
                }
                crate::debug!(name; "bundle written: {}", batch.summary());
                events
                    .blocking_send(PipelineMsg::Built(BuildOutcome::Succeeded))
                    .is_ok()
            },
        )?;

        let running = Cmd::from_slice(&config.command)
            .cwd(cwd)
            .own_group()
            .inherit()
            .spawn()
            .with_context(|| format!("[{name}] failed to start build tool"))?;

        let pid = Arc::new(AtomicU32::new(running.id()));
        let stopping = Arc::new(AtomicBool::new(false));
        crate::log!(name; "{} watching (pid {})", config.program(), running.id());

        let waiter = {
            let pid = Arc::clone(&pid);
            let stopping = Arc::clone(&stopping);
            std::thread::Builder::new()
                .name(format!("{name}-build"))
                .spawn(move || {
                    let program = running.name().to_string();
                    let result = running.wait();
                    pid.store(0, Ordering::SeqCst);

                    if stopping.load(Ordering::SeqCst) {
                        return;
                    }
                    match result {
                        Ok(output) => status_error(
                            name,
                            &format!("{program} exited ({})", output.status),
                            "no further rebuilds will be picked up; restart devwatch",
                        ),
                        Err(e) => status_error(name, "lost build tool", &format!("{e:#}")),
                    }
                })
        };

        if let Err(e) = waiter {
            terminate_group(pid.load(Ordering::SeqCst));
            fs.stop();
            return Err(e).context("failed to spawn build waiter thread");
        }

        Ok(WatchHandle::new(name).on_stop(move || {
            stopping.store(true, Ordering::SeqCst);
            let pid = pid.swap(0, Ordering::SeqCst);
            if pid != 0 {
                terminate_group(pid);
            }
            fs.stop();
        }))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::Strategy;
    use crate::utils::path::normalize_path;
    use tempfile::TempDir;

    fn target(root: &Path, script: &str) -> TargetConfig {
        TargetConfig {
            strategy: Strategy::Resident,
            command: vec!["sh".into(), "-c".into(), script.into()],
            cwd: Some(root.to_path_buf()),
            out_dir: root.join("dist"),
            watch: Vec::new(),
            debounce_ms: 50,
        }
    }

    async fn next(rx: &mut mpsc::Receiver<PipelineMsg>) -> Option<PipelineMsg> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_output_burst_is_one_success() {
        let temp = TempDir::new().unwrap();
        let root = normalize_path(temp.path());
        // Two files written together, then stay resident like a watch mode
        let config = target(&root, "echo a > dist/a.js; echo b > dist/b.js; sleep 30");

        let (tx, mut rx) = mpsc::channel(8);
        let handle = Box::new(Resident::new(Section::Worker, config))
            .watch(tx)
            .unwrap();

        assert!(matches!(
            next(&mut rx).await,
            Some(PipelineMsg::Built(BuildOutcome::Succeeded))
        ));
        // Nothing else arrives for the same burst
        let extra = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
        assert!(extra.is_err());

        handle.stop();
    }

    #[tokio::test]
    async fn test_removal_only_burst_is_not_a_build() {
        let temp = TempDir::new().unwrap();
        let root = normalize_path(temp.path());
        std::fs::create_dir_all(root.join("dist")).unwrap();
        std::fs::write(root.join("dist/main.js"), "old bundle").unwrap();
        // Empties the output, then never writes (a build failing mid-way)
        let config = target(&root, "sleep 0.3; rm dist/main.js; sleep 30");

        let (tx, mut rx) = mpsc::channel(8);
        let handle = Box::new(Resident::new(Section::Main, config))
            .watch(tx)
            .unwrap();

        let outcome = tokio::time::timeout(Duration::from_millis(1500), rx.recv()).await;
        assert!(outcome.is_err(), "removal reported as {:?}", outcome);
        assert!(!root.join("dist/main.js").exists());

        handle.stop();
    }

    #[tokio::test]
    async fn test_missing_program_fails_before_spawning() {
        let temp = TempDir::new().unwrap();
        let mut config = target(temp.path(), "");
        config.command = vec!["devwatch-no-such-bundler".into()];

        let (tx, _rx) = mpsc::channel(8);
        let result = Box::new(Resident::new(Section::Main, config)).watch(tx);
        assert!(result.is_err());
    }
}
