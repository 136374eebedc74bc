//! Install-state markers.
//!
//! After a dependency is installed into `<install root>/<name>`, its version
//! is written to `<install root>/<name>.version`. A later run skips the
//! dependency only when that file holds exactly the wanted version and the
//! install directory is still populated.
//!
//! The marker is written last, so an interrupted install never looks current.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Marker {
    name: String,
    version_file: PathBuf,
    install_dir: PathBuf,
}

impl Marker {
    pub fn for_dependency(name: &str, install_root: &Path) -> Self {
        Self {
            name: name.to_string(),
            version_file: install_root.join(format!("{}.version", name)),
            install_dir: install_root.join(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version_file(&self) -> &Path {
        &self.version_file
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Version recorded by the last successful install, if any.
    pub fn recorded_version(&self) -> Option<String> {
        fs::read_to_string(&self.version_file)
            .ok()
            .map(|s| s.trim().to_string())
    }

    pub fn is_up_to_date(&self, desired_version: &str) -> bool {
        match self.recorded_version() {
            Some(recorded) if recorded == desired_version.trim() => {
                is_populated_dir(&self.install_dir)
            }
            _ => false,
        }
    }

    pub fn mark_installed(&self, version: &str) -> Result<()> {
        if let Some(parent) = self.version_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let tmp = self.version_file.with_extension("version.tmp");
        fs::write(&tmp, version)
            .with_context(|| format!("Failed to write marker {}", tmp.display()))?;
        fs::rename(&tmp, &self.version_file).with_context(|| {
            format!("Failed to write marker {}", self.version_file.display())
        })?;
        Ok(())
    }

    /// Forget the recorded version so the next install runs unconditionally.
    pub fn clear(&self) -> Result<()> {
        if self.version_file.exists() {
            fs::remove_file(&self.version_file).with_context(|| {
                format!("Failed to remove marker {}", self.version_file.display())
            })?;
        }
        Ok(())
    }
}

pub fn is_up_to_date(name: &str, desired_version: &str, install_root: &Path) -> bool {
    Marker::for_dependency(name, install_root).is_up_to_date(desired_version)
}

pub fn mark_installed(name: &str, version: &str, install_root: &Path) -> Result<()> {
    Marker::for_dependency(name, install_root).mark_installed(version)
}

fn is_populated_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populate(root: &Path, name: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("README"), "x").unwrap();
    }

    #[test]
    fn test_no_marker_is_stale() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path(), "sdl2");
        assert!(!is_up_to_date("sdl2", "2.26.0", tmp.path()));
    }

    #[test]
    fn test_marker_matches() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path(), "sdl2");
        mark_installed("sdl2", "2.26.0", tmp.path()).unwrap();
        assert!(is_up_to_date("sdl2", "2.26.0", tmp.path()));
        assert_eq!(
            fs::read_to_string(tmp.path().join("sdl2.version")).unwrap(),
            "2.26.0"
        );
    }

    #[test]
    fn test_marker_version_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path(), "sdl2");
        mark_installed("sdl2", "2.24.0", tmp.path()).unwrap();
        assert!(!is_up_to_date("sdl2", "2.26.0", tmp.path()));
    }

    #[test]
    fn test_marker_overwrites_previous_version() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path(), "sdl2");
        mark_installed("sdl2", "2.24.0", tmp.path()).unwrap();
        mark_installed("sdl2", "2.26.0", tmp.path()).unwrap();
        let marker = Marker::for_dependency("sdl2", tmp.path());
        assert_eq!(marker.recorded_version().as_deref(), Some("2.26.0"));
        assert!(!tmp.path().join("sdl2.version.tmp").exists());
    }

    #[test]
    fn test_marker_requires_install_dir() {
        let tmp = tempfile::tempdir().unwrap();
        mark_installed("boost", "1.83.0", tmp.path()).unwrap();
        assert!(!is_up_to_date("boost", "1.83.0", tmp.path()));

        // An empty directory is not evidence of a completed install either.
        fs::create_dir_all(tmp.path().join("boost")).unwrap();
        assert!(!is_up_to_date("boost", "1.83.0", tmp.path()));

        populate(tmp.path(), "boost");
        assert!(is_up_to_date("boost", "1.83.0", tmp.path()));
    }

    #[test]
    fn test_marker_tolerates_trailing_newline() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path(), "cli11");
        fs::write(tmp.path().join("cli11.version"), "v2.3.2\n").unwrap();
        assert!(is_up_to_date("cli11", "v2.3.2", tmp.path()));
    }

    #[test]
    fn test_clear_marker() {
        let tmp = tempfile::tempdir().unwrap();
        populate(tmp.path(), "sora");
        let marker = Marker::for_dependency("sora", tmp.path());
        marker.mark_installed("2023.13.0").unwrap();
        marker.clear().unwrap();
        assert!(marker.recorded_version().is_none());
        assert!(!marker.is_up_to_date("2023.13.0"));
        // Clearing twice is fine.
        marker.clear().unwrap();
    }
}
