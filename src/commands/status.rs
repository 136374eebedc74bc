//! `sbuild status`: wanted vs. installed version of every dependency.

use crate::config::load_config;
use crate::deps::catalog::{Catalog, DepKind, LocalOverrides};
use crate::layout::Layout;
use crate::manifest::read_version_file;
use crate::marker::Marker;
use crate::plan::InstallPlan;
use crate::platform::Platform;
use crate::ui;
use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum State {
    UpToDate,
    Outdated,
    Missing,
    /// The wanted version cannot be determined yet (LLVM before WebRTC).
    Unknown,
    /// The manifest has no entry for this dependency.
    Unpinned,
    /// Rebuilt from a local checkout on every build.
    Local,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    pub name: &'static str,
    pub wanted: Option<String>,
    pub installed: Option<String>,
    pub state: State,
}

pub fn collect_status(
    base_dir: &Path,
    platform: Platform,
    debug: bool,
    overrides: &LocalOverrides,
) -> Result<Vec<DependencyStatus>> {
    let config = load_config(base_dir)?;
    let layout = Layout::new(base_dir, platform, debug, &config);
    let manifest = read_version_file(&layout.manifest_path())?;
    let catalog = Catalog {
        manifest: &manifest,
        layout: &layout,
        platform,
        debug,
        python: config.tools.python(),
        overrides,
    };

    let plan = InstallPlan::for_platform(platform, overrides);
    let statuses = plan
        .steps()
        .iter()
        .map(|kind| {
            let marker = Marker::for_dependency(kind.name(), &layout.install_dir);
            let installed = marker.recorded_version();
            let (wanted, state) = match catalog.wanted_version(*kind) {
                Ok(Some(v)) if marker.is_up_to_date(&v) => (Some(v), State::UpToDate),
                Ok(Some(v)) if installed.is_some() => (Some(v), State::Outdated),
                Ok(Some(v)) => (Some(v), State::Missing),
                Ok(None) => (None, State::Local),
                // LLVM is pinned by the installed WebRTC, not the manifest.
                Err(_) if *kind == DepKind::Llvm => (None, State::Unknown),
                Err(_) => (None, State::Unpinned),
            };
            DependencyStatus {
                name: kind.name(),
                wanted,
                installed,
                state,
            }
        })
        .collect();
    Ok(statuses)
}

pub fn run_status(
    base_dir: &Path,
    platform: Platform,
    debug: bool,
    overrides: &LocalOverrides,
    json: bool,
) -> Result<()> {
    let statuses = collect_status(base_dir, platform, debug, overrides)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!(
        "{} Dependencies for {} ({})",
        "→".blue(),
        platform.to_string().bold(),
        if debug { "debug" } else { "release" }
    );
    let mut table = ui::Table::new(&["Dependency", "Wanted", "Installed", "State"]);
    for status in &statuses {
        let state = match status.state {
            State::UpToDate => "✓ up to date".green().to_string(),
            State::Outdated => "! outdated".yellow().to_string(),
            State::Missing => "x missing".red().to_string(),
            State::Unknown => "? unknown".dimmed().to_string(),
            State::Unpinned => "x not in manifest".red().to_string(),
            State::Local => "→ local checkout".cyan().to_string(),
        };
        table.add_row(vec![
            status.name.to_string(),
            status.wanted.clone().unwrap_or_else(|| "-".to_string()),
            status
                .installed
                .clone()
                .unwrap_or_else(|| "-".dimmed().to_string()),
            state,
        ]);
    }
    table.print();
    Ok(())
}
