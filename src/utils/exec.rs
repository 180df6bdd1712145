//! External command execution utilities.
//!
//! Provides a Builder-based API for spawning build commands, plus a
//! spawned-but-not-yet-waited form so that callers can track the child's
//! pid and terminate it on shutdown.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Spawn, remember the pid, wait later
//! let running = Cmd::from_slice(&config.command).cwd(root).own_group().spawn()?;
//! pid.store(running.id(), Ordering::SeqCst);
//! let output = running.wait()?;
//! ```

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Child, Command, Output, Stdio},
    sync::OnceLock,
};

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    own_group: bool,
    inherit: bool,
}

impl Cmd {
    /// Create from a command array (e.g., `["make"]` or `["npx", "esbuild"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter
            .map(|s| s.as_ref().to_owned())
            .filter(|arg| !arg.is_empty())
            .collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Run in a new process group so the whole tree can be signalled at once.
    ///
    /// Wrappers like `npx` fork the real tool; killing only the wrapper
    /// would leave it running.
    pub fn own_group(mut self) -> Self {
        self.own_group = true;
        self
    }

    /// Share the terminal's stdout/stderr instead of capturing them.
    pub fn inherit(mut self) -> Self {
        self.inherit = true;
        self
    }

    /// Spawn without waiting. Output is captured unless `inherit` was set.
    pub fn spawn(self) -> Result<Running> {
        let name = self.program_name();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());

        if self.inherit {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        if self.own_group {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        Ok(Running { child, name })
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }
}

// ============================================================================
// Running command
// ============================================================================

/// A spawned command whose output is still being collected.
pub struct Running {
    child: Child,
    name: String,
}

impl Running {
    /// OS process id.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Program name, for messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for exit and collect output.
    ///
    /// Returns the output whatever the exit status; only I/O failures are
    /// errors. On success, captured stderr (warnings) is logged.
    pub fn wait(self) -> Result<Output> {
        let name = self.name;
        let output = self
            .child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for `{name}`"))?;

        if output.status.success() {
            log_lines(&name, &String::from_utf8_lossy(&output.stderr));
        }
        Ok(output)
    }
}

/// Describe a failed run of `name` (exit status, stderr, stdout).
pub fn describe_failure(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let mut msg = format!("Command `{name}` failed with {}", output.status);
    let stderr_trimmed = stderr.trim();
    if !stderr_trimmed.is_empty() {
        msg.push('\n');
        msg.push_str(&strip_ansi(stderr_trimmed));
    }

    let stdout_trimmed = stdout.trim();
    if !stdout_trimmed.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(&strip_ansi(stdout_trimmed));
    }
    msg
}

// ============================================================================
// Helpers
// ============================================================================

/// Log non-empty output lines under `name`.
fn log_lines(name: &str, output: &str) {
    let lines: Vec<_> = output
        .lines()
        .filter(|line| !strip_ansi(line).trim().is_empty())
        .collect();

    if !lines.is_empty() {
        log!(name; "{}", lines.join("\n"));
    }
}

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    match RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").ok()) {
        Some(re) => re.replace_all(s, ""),
        None => std::borrow::Cow::Borrowed(s),
    }
}

// ============================================================================
// Tests
// ============================================================================
