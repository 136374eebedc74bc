//! Optional project configuration (`sbuild.toml`).
//!
//! Every field has a default, so a project without the file behaves exactly
//! like one with an empty file.
//!
//! ```toml
//! [paths]
//! source = "_source"
//! build = "_build"
//! install = "_install"
//!
//! [tools]
//! python = "python3"
//!
//! [build]
//! jobs = 8
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "sbuild.toml";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct SbuildConfig {
    pub paths: PathsConfig,
    pub tools: ToolsConfig,
    pub build: BuildConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub source: String,
    pub build: String,
    pub install: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "_source".to_string(),
            build: "_build".to_string(),
            install: "_install".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub python: Option<String>,
}

impl ToolsConfig {
    /// Interpreter used to run vendor `run.py` and LLVM's `update.py`.
    pub fn python(&self) -> &str {
        match &self.python {
            Some(p) => p,
            None if cfg!(windows) => "python",
            None => "python3",
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Parallel compile jobs; defaults to the host CPU count.
    pub jobs: Option<usize>,
}

impl BuildConfig {
    pub fn jobs(&self) -> usize {
        self.jobs
            .filter(|&j| j > 0)
            .unwrap_or_else(crate::process::cpu_count)
    }
}

/// Load `sbuild.toml` from `base_dir`, or defaults when it is absent.
pub fn load_config(base_dir: &Path) -> Result<SbuildConfig> {
    let path = base_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(SbuildConfig::default());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors or unknown keys",
            path.display()
        )
    })
}
