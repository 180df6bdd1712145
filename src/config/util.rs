//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`.
/// Returns the absolute path to the config file if found.
///
/// # Example
/// ```text
/// /home/user/app/packages/main/   ← cwd
/// /home/user/app/devwatch.toml    ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_from(&cwd, config_name)
}

fn find_config_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// Expand `~` and resolve a config path against the project root.
pub fn resolve_from_root(path: &Path, root: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let path = PathBuf::from(expanded);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_upward() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("packages/main/src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("devwatch.toml"), "").unwrap();

        let found = find_config_from(&nested, Path::new("devwatch.toml")).unwrap();
        assert_eq!(found, temp.path().join("devwatch.toml"));
    }

    #[test]
    fn test_find_config_missing() {
        let temp = TempDir::new().unwrap();
        assert!(find_config_from(temp.path(), Path::new("no-such-config.toml")).is_none());
    }

    #[test]
    fn test_resolve_from_root() {
        let root = Path::new("/project");
        assert_eq!(
            resolve_from_root(Path::new("packages/main/dist"), root),
            PathBuf::from("/project/packages/main/dist")
        );
        assert_eq!(
            resolve_from_root(Path::new("/abs/dist"), root),
            PathBuf::from("/abs/dist")
        );
    }
}
