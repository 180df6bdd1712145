//! Actor Coordinator - Wires up the dev session
//!
//! # Responsibility
//!
//! The Coordinator is a **thin orchestrator** that:
//! - Starts the dev server and waits until it is bound
//! - Starts the main and worker pipelines, wired to their reactions
//! - Waits for the interrupt and tears everything down
//!
//! It does NOT contain business logic - that lives in `pipeline/`.
//!
//! # Sequence
//!
//! ```text
//! DevServer::start ──> address ──> main pipeline (respawn, env = address)
//!                                  worker pipeline (broadcast)
//!                                  renderer watcher (broadcast, optional)
//! ```
//!
//! Any failure before `Running` aborts the session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use super::fs::{FsActor, FsHandle, WatchSpec};
use super::pipeline::{Reload, Respawn, WatchPipeline};
use super::ws::Broadcaster;
use crate::build::{self, BuildTool};
use crate::config::{DevConfig, Section};
use crate::core::{Phase, PhaseCell};
use crate::log;
use crate::logger::{status_success, status_warning};
use crate::process::{CommandSpawner, LaunchSpec, Spawner};
use crate::reload::ReloadMessage;
use crate::server::DevServer;

/// Coordinator - wires up and runs the dev session
pub struct Coordinator {
    config: Arc<DevConfig>,
    phase: PhaseCell,
    spawner: Box<dyn Spawner>,
    /// Build tools to use instead of the configured ones
    tools: Option<(Box<dyn BuildTool>, Box<dyn BuildTool>)>,
}

impl Coordinator {
    pub fn new(config: Arc<DevConfig>) -> Self {
        Self {
            config,
            phase: PhaseCell::new(),
            spawner: Box::new(CommandSpawner),
            tools: None,
        }
    }

    /// Share the phase with an observer.
    #[cfg(test)]
    pub fn with_phase(mut self, phase: PhaseCell) -> Self {
        self.phase = phase;
        self
    }

    /// Launch host processes through `spawner`.
    #[cfg(test)]
    pub fn with_spawner(mut self, spawner: Box<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Use these build tools for the main and worker targets.
    #[cfg(test)]
    pub fn with_build_tools(mut self, main: Box<dyn BuildTool>, worker: Box<dyn BuildTool>) -> Self {
        self.tools = Some((main, worker));
        self
    }

    /// Run the session until `shutdown` fires (or its sender is dropped).
    pub async fn run(self, mut shutdown: mpsc::UnboundedReceiver<()>) -> Result<()> {
        let Self {
            config,
            phase,
            spawner,
            tools,
        } = self;
        let (main_tool, worker_tool) = tools.unwrap_or_else(|| {
            (
                build::from_config(Section::Main, &config.main),
                build::from_config(Section::Worker, &config.worker),
            )
        });

        // 1. dev server, fatal on failure
        enter(&phase, Phase::ServerStarting);
        let server = DevServer::start(&config.serve)?;

        // 2. bound address
        enter(&phase, Phase::ServerReady);
        let addr = server.address();
        log!("serve"; "http://{} (live reload on ws://{})", addr, server.ws_address());

        // 3. main pipeline, then 4. worker pipeline
        enter(&phase, Phase::PipelinesStarting);
        let launch = LaunchSpec::new(&config.host, addr);
        if config.host.debug {
            log!("host"; "debug mode, {} will not be launched", launch.program);
            for name in [&config.host.host_env, &config.host.port_env] {
                log!("host"; "{}={}", name, launch.var(name).unwrap_or_default());
            }
        }

        let respawn = Respawn::new(
            Section::Main.name(),
            spawner,
            launch,
            config.host.debug,
        );
        let main = match WatchPipeline::start(Section::Main, main_tool, respawn)
            .context("failed to start main pipeline")
        {
            Ok(main) => main,
            Err(e) => {
                server.shutdown().await;
                return Err(e);
            }
        };

        let reload = Reload::new(Section::Worker.name(), server.broadcaster());
        let worker = match WatchPipeline::start(Section::Worker, worker_tool, reload)
            .context("failed to start worker pipeline")
        {
            Ok(worker) => worker,
            Err(e) => {
                main.stop().await;
                server.shutdown().await;
                return Err(e);
            }
        };

        // 5. renderer watcher
        let renderer = if config.serve.watch {
            watch_renderer(&config, server.broadcaster())
        } else {
            None
        };

        // 6. run until interrupted
        enter(&phase, Phase::Running);
        crate::debug!("serve"; "running");
        let _ = shutdown.recv().await;

        enter(&phase, Phase::Stopping);
        main.stop().await;
        worker.stop().await;
        if let Some(renderer) = renderer {
            let _ = tokio::task::spawn_blocking(move || renderer.stop()).await;
        }
        server.shutdown().await;

        log!("serve"; "stopped");
        Ok(())
    }
}

/// Move to `next` and report it.
fn enter(phase: &PhaseCell, next: Phase) {
    phase.advance(next);
    crate::debug!("phase"; "{}", phase.get());
}

/// Reload clients when files under the renderer root change.
///
/// Best effort: a missing root or a watcher error only costs this feature.
fn watch_renderer(config: &DevConfig, broadcaster: Broadcaster) -> Option<FsHandle> {
    let root = &config.serve.root;
    if !root.is_dir() {
        status_warning(
            "renderer",
            &format!("{} does not exist, not watching", root.display()),
        );
        return None;
    }

    let spec = WatchSpec {
        label: "renderer",
        roots: vec![root.clone()],
        ignore: Vec::new(),
        debounce: Duration::from_millis(config.serve.debounce_ms),
        initial_batch: false,
    };

    let watch = FsActor::spawn(spec, move |batch| {
        status_success("renderer", &format!("{}, reloading", batch.summary()));
        broadcaster.broadcast(ReloadMessage::FullReload);
        true
    });

    match watch {
        Ok(handle) => Some(handle),
        Err(e) => {
            log!("renderer"; "not watching: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, TcpListener, TcpStream};
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use anyhow::bail;
    use parking_lot::Mutex;

    use super::*;
    use crate::actor::messages::PipelineMsg;
    use crate::build::{BuildOutcome, WatchHandle};
    use crate::core::{SignalAction, on_signal};
    use crate::process::HostProcess;

    type Seen = Arc<Mutex<Vec<String>>>;

    /// Records the phase it was started in, then reports one success.
    struct ObservedTool {
        phase: PhaseCell,
        seen: Seen,
    }

    impl BuildTool for ObservedTool {
        fn watch(self: Box<Self>, events: mpsc::Sender<PipelineMsg>) -> Result<WatchHandle> {
            self.seen.lock().push(self.phase.get().to_string());
            events
                .try_send(PipelineMsg::Built(BuildOutcome::Succeeded))
                .map_err(|_| anyhow::anyhow!("pipeline channel full"))?;
            Ok(WatchHandle::new("test"))
        }
    }

    /// Reports one success and counts how often its watch is stopped.
    struct CountingTool {
        stops: Arc<AtomicUsize>,
    }

    impl BuildTool for CountingTool {
        fn watch(self: Box<Self>, events: mpsc::Sender<PipelineMsg>) -> Result<WatchHandle> {
            events
                .try_send(PipelineMsg::Built(BuildOutcome::Succeeded))
                .map_err(|_| anyhow::anyhow!("pipeline channel full"))?;
            let stops = self.stops;
            Ok(WatchHandle::new("test").on_stop(move || {
                stops.fetch_add(1, Ordering::SeqCst);
            }))
        }
    }

    struct BrokenTool;

    impl BuildTool for BrokenTool {
        fn watch(self: Box<Self>, _events: mpsc::Sender<PipelineMsg>) -> Result<WatchHandle> {
            bail!("build program `vite` not found")
        }
    }

    /// Connects to the advertised dev server address instead of launching.
    struct ReachSpawner {
        seen: Seen,
    }

    struct FakeHost {
        env: Vec<(String, String)>,
        seen: Seen,
    }

    impl HostProcess for FakeHost {
        fn id(&self) -> u32 {
            1
        }

        fn env(&self) -> &[(String, String)] {
            &self.env
        }

        fn terminate(self: Box<Self>) {
            self.seen.lock().push("terminate".to_string());
        }
    }

    impl Spawner for ReachSpawner {
        fn spawn(&mut self, launch: &LaunchSpec) -> Result<Box<dyn HostProcess>> {
            let host = launch.var("VITE_DEV_SERVER_HOST").unwrap_or_default();
            let port = launch.var("VITE_DEV_SERVER_PORT").unwrap_or_default();
            let reachable = TcpStream::connect(format!("{host}:{port}")).is_ok();
            self.seen.lock().push(format!("spawn reachable={reachable}"));
            Ok(Box::new(FakeHost {
                env: launch.env.clone(),
                seen: Arc::clone(&self.seen),
            }))
        }
    }

    fn dev_config(root: &Path) -> DevConfig {
        let mut config = DevConfig::default();
        config.serve.interface = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.serve.port = 0;
        config.serve.ws_port = 0;
        config.serve.root = root.to_path_buf();
        config.serve.watch = false;
        config
    }

    fn config(root: &Path) -> Arc<DevConfig> {
        Arc::new(dev_config(root))
    }

    #[tokio::test]
    async fn test_server_is_up_before_pipelines_start() {
        let temp = tempfile::TempDir::new().unwrap();
        let phase = PhaseCell::new();
        let seen = Seen::default();

        let tool = |seen: &Seen| ObservedTool {
            phase: phase.clone(),
            seen: Arc::clone(seen),
        };
        let coordinator = Coordinator::new(config(temp.path()))
            .with_phase(phase.clone())
            .with_spawner(Box::new(ReachSpawner {
                seen: Arc::clone(&seen),
            }))
            .with_build_tools(Box::new(tool(&seen)), Box::new(tool(&seen)));

        let (tx, rx) = mpsc::unbounded_channel();
        let observer = phase.clone();
        let stopper = async move {
            while observer.get() < Phase::Running {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            // Let both pipelines drain their first outcome
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(()).unwrap();
        };

        let (result, ()) = tokio::join!(coordinator.run(rx), stopper);
        result.unwrap();

        assert_eq!(phase.get(), Phase::Stopping);
        assert_eq!(
            *seen.lock(),
            vec![
                "pipelines-starting".to_string(),
                "pipelines-starting".to_string(),
                "spawn reachable=true".to_string(),
                "terminate".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_pipeline_start_failure_aborts_session() {
        let temp = tempfile::TempDir::new().unwrap();
        let phase = PhaseCell::new();
        let seen = Seen::default();

        let coordinator = Coordinator::new(config(temp.path()))
            .with_phase(phase.clone())
            .with_build_tools(
                Box::new(ObservedTool {
                    phase: phase.clone(),
                    seen: Arc::clone(&seen),
                }),
                Box::new(BrokenTool),
            )
            .with_spawner(Box::new(ReachSpawner {
                seen: Arc::clone(&seen),
            }));

        let (_tx, rx) = mpsc::unbounded_channel();
        let err = coordinator.run(rx).await.unwrap_err();

        assert!(format!("{err:#}").contains("worker pipeline"));
        assert!(phase.get() < Phase::Running);
    }

    #[tokio::test]
    async fn test_taken_port_aborts_before_pipelines() {
        let temp = tempfile::TempDir::new().unwrap();
        let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let mut config = dev_config(temp.path());
        config.serve.port = taken.local_addr().unwrap().port();

        let phase = PhaseCell::new();
        let seen = Seen::default();
        let tool = |seen: &Seen| ObservedTool {
            phase: phase.clone(),
            seen: Arc::clone(seen),
        };
        let coordinator = Coordinator::new(Arc::new(config))
            .with_phase(phase.clone())
            .with_spawner(Box::new(ReachSpawner {
                seen: Arc::clone(&seen),
            }))
            .with_build_tools(Box::new(tool(&seen)), Box::new(tool(&seen)));

        let (_tx, rx) = mpsc::unbounded_channel();
        assert!(coordinator.run(rx).await.is_err());

        assert!(seen.lock().is_empty());
        assert!(phase.get() < Phase::PipelinesStarting);
        drop(taken);
    }

    #[tokio::test]
    async fn test_termination_signal_tears_down_session() {
        let temp = tempfile::TempDir::new().unwrap();
        let phase = PhaseCell::new();
        let seen = Seen::default();
        let stops = Arc::new(AtomicUsize::new(0));

        let tool = || CountingTool {
            stops: Arc::clone(&stops),
        };
        let coordinator = Coordinator::new(config(temp.path()))
            .with_phase(phase.clone())
            .with_spawner(Box::new(ReachSpawner {
                seen: Arc::clone(&seen),
            }))
            .with_build_tools(Box::new(tool()), Box::new(tool()));

        // Same path the installed handler takes, with a local flag
        let (tx, rx) = mpsc::unbounded_channel();
        let observer = phase.clone();
        let signaller = async move {
            while observer.get() < Phase::Running {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            let flag = AtomicBool::new(false);
            assert_eq!(on_signal(&flag, Some(&tx)), SignalAction::Notified);
            assert_eq!(on_signal(&flag, Some(&tx)), SignalAction::Exit(130));
        };

        let (result, ()) = tokio::join!(coordinator.run(rx), signaller);
        result.unwrap();

        assert_eq!(phase.get(), Phase::Stopping);
        assert_eq!(stops.load(Ordering::SeqCst), 2);
        assert_eq!(seen.lock().last().map(String::as_str), Some("terminate"));
    }
}
