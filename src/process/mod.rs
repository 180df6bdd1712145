//! Host process management.
//!
//! The main pipeline relaunches the desktop app's main process after every
//! successful rebuild. Launching goes through [`Spawner`] so the pipeline
//! can be driven by a fake in tests.
//!
//! Processes are started in their own process group and terminated as a
//! group: `npx electron .` forks the real binary, and signalling only the
//! wrapper would leave it running.

mod slot;

pub use slot::ChildSlot;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result, anyhow};

use crate::config::HostConfig;

/// Everything needed to start one host process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Added on top of the inherited environment, in order.
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    /// Build the launch for `host`, pointing it at the dev server at `server`.
    ///
    /// An unspecified bind address (`0.0.0.0`, `::`) is not connectable, so
    /// the host is told to use loopback instead.
    pub fn new(host: &HostConfig, server: SocketAddr) -> Self {
        let ip = match server.ip() {
            ip if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            ip => ip,
        };

        let mut env = vec![
            (host.host_env.clone(), ip.to_string()),
            (host.port_env.clone(), server.port().to_string()),
        ];
        env.extend(host.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut launch = host.launch.iter().cloned();
        Self {
            program: launch.next().unwrap_or_default(),
            args: launch.collect(),
            cwd: host.cwd.clone(),
            env,
        }
    }

    /// Value of an injected variable.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A running host process.
pub trait HostProcess: Send {
    fn id(&self) -> u32;

    /// Environment additions it was launched with.
    fn env(&self) -> &[(String, String)];

    /// Request termination without waiting for exit. Errors (the process
    /// already exited) are ignored.
    fn terminate(self: Box<Self>);
}

/// Starts host processes.
pub trait Spawner: Send {
    fn spawn(&mut self, launch: &LaunchSpec) -> Result<Box<dyn HostProcess>>;
}

impl<S: Spawner + ?Sized> Spawner for Box<S> {
    fn spawn(&mut self, launch: &LaunchSpec) -> Result<Box<dyn HostProcess>> {
        (**self).spawn(launch)
    }
}

// =============================================================================
// Real processes
// =============================================================================

/// Spawns real processes with inherited stdio.
///
/// Must be used from within a tokio runtime, which reaps terminated
/// children in the background.
#[derive(Debug, Default)]
pub struct CommandSpawner;

struct SpawnedHost {
    child: tokio::process::Child,
    pid: u32,
    env: Vec<(String, String)>,
}

impl Spawner for CommandSpawner {
    fn spawn(&mut self, launch: &LaunchSpec) -> Result<Box<dyn HostProcess>> {
        if launch.program.is_empty() {
            return Err(anyhow!("host launch command is empty"));
        }

        let mut cmd = tokio::process::Command::new(&launch.program);
        cmd.args(&launch.args)
            .envs(launch.env.iter().cloned())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Some(dir) = &launch.cwd {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", launch.program))?;
        let pid = child
            .id()
            .ok_or_else(|| anyhow!("`{}` exited immediately", launch.program))?;

        Ok(Box::new(SpawnedHost {
            child,
            pid,
            env: launch.env.clone(),
        }))
    }
}

impl HostProcess for SpawnedHost {
    fn id(&self) -> u32 {
        self.pid
    }

    fn env(&self) -> &[(String, String)] {
        &self.env
    }

    fn terminate(mut self: Box<Self>) {
        if self.child.try_wait().ok().flatten().is_some() {
            return;
        }
        terminate_group(self.pid);
    }
}

/// Ask the process group led by `pid` to exit.
///
/// SIGTERM on unix; on other platforms the whole tree is killed.
pub fn terminate_group(pid: u32) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            return;
        };
        if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGTERM) {
            crate::debug!("host"; "SIGTERM to group {} failed: {}", pid, e);
        }
    }

    #[cfg(not(unix))]
    {
        let pid = pid.to_string();
        let status = std::process::Command::new("taskkill")
            .args(["/PID", pid.as_str(), "/T", "/F"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = status {
            crate::debug!("host"; "taskkill {} failed: {}", pid, e);
        }
    }
}
