//! On-disk layout of a build.
//!
//! ```text
//! <base>/VERSION
//! <base>/_source/<platform>/<debug|release>/   downloaded archives, sources
//! <base>/_build/<platform>/<debug|release>/    dependency and sample builds
//! <base>/_install/<platform>/<debug|release>/  installed deps + markers
//! ```
//!
//! The tree is picked by `--debug` alone; `RelWithDebInfo` builds share
//! whichever tree that flag selects.

use crate::config::SbuildConfig;
use crate::platform::Platform;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "VERSION";

#[derive(Debug, Clone)]
pub struct Layout {
    pub base_dir: PathBuf,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_dir: PathBuf,
}

impl Layout {
    pub fn new(base_dir: &Path, platform: Platform, debug: bool, config: &SbuildConfig) -> Self {
        let configuration_dir = if debug { "debug" } else { "release" };
        let tree = |root: &str| {
            base_dir
                .join(root)
                .join(platform.id())
                .join(configuration_dir)
        };
        Self {
            base_dir: base_dir.to_path_buf(),
            source_dir: tree(&config.paths.source),
            build_dir: tree(&config.paths.build),
            install_dir: tree(&config.paths.install),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.base_dir.join(MANIFEST_FILE)
    }

    pub fn create_dirs(&self) -> Result<()> {
        for dir in [&self.source_dir, &self.build_dir, &self.install_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Render a path the way CMake expects it on the command line.
pub fn cmake_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
