use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::ModifyKind;
use rustc_hash::FxHashMap;

use super::types::{ChangeBatch, ChangeKind};
use crate::utils::path::{is_under_any, normalize_path};

/// Sleep used when nothing is pending.
const IDLE_WAIT: Duration = Duration::from_secs(86400);

/// Coalesces raw notify events into batches released after a quiet period.
///
/// Holds no policy beyond which events count; what a batch means is up to
/// the caller.
pub(super) struct Debouncer {
    /// One entry per path, already merged
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    quiet: Duration,
    /// Normalized directories whose events are dropped
    ignore: Vec<PathBuf>,
}

/// How a new event combines with one already pending for the same path.
#[derive(Debug, PartialEq, Eq)]
enum Merge {
    Keep,
    Replace(ChangeKind),
    /// The change cancelled itself out
    Discard,
}

fn merge(pending: ChangeKind, incoming: ChangeKind) -> Merge {
    use ChangeKind::*;
    match (pending, incoming) {
        // restored
        (Removed, Created | Modified) => Merge::Replace(incoming),
        (Modified, Removed) => Merge::Replace(Removed),
        // appeared and vanished within the window
        (Created, Removed) => Merge::Discard,
        _ => Merge::Keep,
    }
}

/// Map a notify event to a change, or `None` for events that never
/// trigger a rebuild (access, metadata-only).
fn classify(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        _ => None,
    }
}

impl Debouncer {
    pub(super) fn new(quiet: Duration) -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            quiet,
            ignore: Vec::new(),
        }
    }

    /// Drop events under these directories (e.g. a target's own output).
    pub(super) fn ignoring(mut self, dirs: &[PathBuf]) -> Self {
        self.ignore = dirs.iter().map(|d| normalize_path(d)).collect();
        self
    }

    pub(super) fn add_event(&mut self, event: &notify::Event) {
        let Some(kind) = classify(&event.kind) else {
            return;
        };

        let paths = event
            .paths
            .iter()
            .filter(|path| !is_editor_artifact(path))
            .map(|path| normalize_path(path))
            .filter(|path| !is_under_any(path, &self.ignore));

        for path in paths {
            let Some(&pending) = self.changes.get(&path) else {
                crate::debug!("watch"; "{} {}", kind.label(), path.display());
                self.changes.insert(path, kind);
                self.last_event = Some(Instant::now());
                continue;
            };

            match merge(pending, kind) {
                Merge::Keep => continue,
                Merge::Replace(next) => {
                    crate::debug!("watch"; "{}->{} {}", pending.label(), next.label(), path.display());
                    self.changes.insert(path, next);
                }
                Merge::Discard => {
                    crate::debug!("watch"; "transient {}", path.display());
                    self.changes.remove(&path);
                }
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Take the pending batch once the quiet period has elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<ChangeBatch> {
        if !self.is_ready() {
            return None;
        }

        self.last_event = None;
        let mut batch: Vec<_> = self.changes.drain().collect();
        batch.sort();
        Some(ChangeBatch(batch))
    }

    pub(super) fn is_ready(&self) -> bool {
        !self.changes.is_empty()
            && self
                .last_event
                .is_some_and(|last| last.elapsed() >= self.quiet)
    }

    /// How long the watch thread may block before a batch could be ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        match self.last_event {
            None => IDLE_WAIT,
            Some(last) => self
                .quiet
                .saturating_sub(last.elapsed())
                .max(Duration::from_millis(1)),
        }
    }
}

/// Swap files, backups and dotfiles written by editors.
fn is_editor_artifact(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChangeKind::*;

    #[test]
    fn test_merge_table() {
        assert_eq!(merge(Removed, Created), Merge::Replace(Created));
        assert_eq!(merge(Removed, Modified), Merge::Replace(Modified));
        assert_eq!(merge(Modified, Removed), Merge::Replace(Removed));
        assert_eq!(merge(Created, Removed), Merge::Discard);
        assert_eq!(merge(Created, Modified), Merge::Keep);
        assert_eq!(merge(Modified, Modified), Merge::Keep);
    }
}
