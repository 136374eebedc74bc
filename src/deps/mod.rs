//! Dependency installation.
//!
//! Every dependency goes through the same versioned contract:
//!
//! 1. If the marker already records the wanted version (and the install
//!    directory is populated), nothing happens.
//! 2. Otherwise the installer's `fetch` runs: download + extract, a source
//!    build, or a vendor build script.
//! 3. Only after `fetch` succeeds is the marker written.
//!
//! ## Variants
//!
//! - [`ArchiveFetch`] - prebuilt release archives (WebRTC, Boost, Lyra, Sora, CMake)
//! - [`SourceBuild`] - ordered build steps (SDL2, CLI11, LLVM)
//! - [`VendorScriptBuild`] - a local WebRTC / Sora checkout built by its own `run.py`

mod archive;
pub mod catalog;
pub mod fetch;
mod source;
mod vendor;

pub use archive::ArchiveFetch;
pub use catalog::DepKind;
pub use source::{CMakeProject, SourceBuild, SourceStep};
pub use vendor::VendorScriptBuild;

use crate::error::DependencyInstallError;
use crate::layout::Layout;
use crate::marker::Marker;
use crate::platform::Platform;
use crate::process::{CommandRunner, Invocation};
use anyhow::Result;
use colored::*;
use std::path::PathBuf;

/// Everything an installer needs from the surrounding run.
pub struct InstallContext<'a> {
    pub layout: &'a Layout,
    pub platform: Platform,
    pub debug: bool,
    pub jobs: usize,
    pub python: String,
    /// Directories prepended to `PATH` for child processes (e.g. CMake's bin).
    pub extra_path: Vec<PathBuf>,
    pub runner: &'a mut dyn CommandRunner,
}

impl InstallContext<'_> {
    /// Run a command with the context's `PATH` additions applied.
    pub fn run(&mut self, invocation: Invocation) -> Result<()> {
        let invocation = if self.extra_path.is_empty() {
            invocation
        } else {
            invocation.env("PATH", crate::process::path_with(&self.extra_path)?)
        };
        self.runner.run_checked(&invocation)
    }
}

pub trait DependencyInstaller {
    /// Install name: directory under the install root and marker file stem.
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Whether the marker protocol applies. Vendor builds keep their own state.
    fn tracks_version(&self) -> bool {
        true
    }

    /// The expensive part: download, extract, build.
    fn fetch(&self, ctx: &mut InstallContext<'_>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Ignore any existing marker and reinstall.
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    UpToDate,
    Installed,
}

/// Install one dependency, honouring its marker.
pub fn install(
    installer: &dyn DependencyInstaller,
    ctx: &mut InstallContext<'_>,
    options: InstallOptions,
) -> Result<InstallOutcome, DependencyInstallError> {
    let name = installer.name();
    let version = installer.version();
    let wrap = |source: anyhow::Error| DependencyInstallError {
        dependency: name.to_string(),
        version: version.to_string(),
        source,
    };

    if !installer.tracks_version() {
        println!("{} Building {} from local checkout...", "🔨".yellow(), name.bold());
        installer.fetch(ctx).map_err(wrap)?;
        println!("   {} {} built", "✓".green(), name);
        return Ok(InstallOutcome::Installed);
    }

    let marker = Marker::for_dependency(name, &ctx.layout.install_dir);
    if options.force {
        marker.clear().map_err(wrap)?;
    }

    if marker.is_up_to_date(version) {
        println!(
            "   {} {} {} {}",
            "⚡".green(),
            name,
            version.dimmed(),
            "(up to date)".dimmed()
        );
        return Ok(InstallOutcome::UpToDate);
    }

    match marker.recorded_version() {
        Some(previous) if previous != version => println!(
            "{} Updating {} {} → {}",
            "📦".blue(),
            name.bold(),
            previous.dimmed(),
            version.cyan()
        ),
        _ => println!("{} Installing {} {}", "📦".blue(), name.bold(), version.cyan()),
    }
    // fetch rewrites the install dir in place.
    marker.clear().map_err(wrap)?;

    if let Err(e) = installer.fetch(ctx) {
        println!("{} Failed to install {}", "x".red(), name);
        return Err(wrap(e));
    }
    marker.mark_installed(version).map_err(wrap)?;

    println!("   {} {} {} installed", "✓".green(), name, version);
    Ok(InstallOutcome::Installed)
}
