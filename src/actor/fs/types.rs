use std::path::PathBuf;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// One debounced batch of file changes, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch(pub Vec<(PathBuf, ChangeKind)>);

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// At least one path was created or modified (not only removed).
    pub fn has_writes(&self) -> bool {
        self.0.iter().any(|&(_, kind)| kind != ChangeKind::Removed)
    }

    /// Short human summary: the single path, or a count.
    pub fn summary(&self) -> String {
        match self.0.as_slice() {
            [] => "no changes".to_string(),
            [(path, kind)] => {
                let name = path.file_name().map_or_else(
                    || path.display().to_string(),
                    |n| n.to_string_lossy().into_owned(),
                );
                format!("{} {}", kind.label(), name)
            }
            changes => format!("{} files changed", changes.len()),
        }
    }
}
