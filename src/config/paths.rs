//! Location of the l2backup config file
//!
//! Run artifacts (tickets, server list, report) are relative to the working
//! directory and configured in `paths`; only the config file lives here.

use directories::BaseDirs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "l2backup";
const CONFIG_FILE: &str = "config.yaml";

/// Configuration directory for this process
pub fn config_dir() -> PathBuf {
    config_dir_from(|key| std::env::var(key).ok())
}

/// Resolve the configuration directory from an arbitrary key lookup.
///
/// `L2BACKUP_CONFIG_DIR` is used as is. Otherwise `XDG_CONFIG_HOME/l2backup`,
/// then the platform config directory (`~/.config`, `AppData\Roaming`, ...),
/// then `./.l2backup` when no home directory can be determined.
pub fn config_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(dir) = get("L2BACKUP_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = get("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join(APP_DIR);
    }
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_DIR)))
}

/// Config file read when `--config` is not given
pub fn root_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Ensure a directory exists, creating it if necessary.
///
/// The empty path (parent of a bare file name) is the working directory.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_config_file_name() {
        assert!(root_config_path().ends_with(CONFIG_FILE));
    }

    #[test]
    fn test_explicit_dir_wins() {
        let dir = config_dir_from(|key| match key {
            "L2BACKUP_CONFIG_DIR" => Some("/etc/l2backup".to_string()),
            "XDG_CONFIG_HOME" => Some("/home/ops/.config".to_string()),
            _ => None,
        });
        assert_eq!(dir, PathBuf::from("/etc/l2backup"));
    }

    #[test]
    fn test_xdg_home_gets_app_dir() {
        let dir = config_dir_from(|key| match key {
            "L2BACKUP_CONFIG_DIR" => Some("  ".to_string()),
            "XDG_CONFIG_HOME" => Some("/home/ops/.config".to_string()),
            _ => None,
        });
        assert_eq!(dir, PathBuf::from("/home/ops/.config/l2backup"));
    }

    #[test]
    fn test_fallback_ends_in_app_dir() {
        let dir = config_dir_from(|_| None);
        let name = dir.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.ends_with(APP_DIR));
    }

    #[test]
    fn test_ensure_dir_accepts_bare_file_name_parent() {
        // Path::new("report.json").parent() is Some("")
        assert!(ensure_dir(Path::new("")).is_ok());

        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
