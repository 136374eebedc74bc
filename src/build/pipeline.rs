use super::{BuildConfiguration, CMakeInvocation, ResolvedPaths};
use crate::config::load_config;
use crate::deps::catalog::{Catalog, LocalOverrides};
use crate::deps::{DepKind, DependencyInstaller, InstallContext, InstallOptions, install};
use crate::layout::Layout;
use crate::manifest::read_version_file;
use crate::plan::InstallPlan;
use crate::platform::{Configuration, Platform, Sample};
use crate::process::{CommandRunner, SystemRunner, resolve_program};
use anyhow::Result;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

/// One `sbuild build` run, as parsed from the command line.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub base_dir: PathBuf,
    pub sample: Sample,
    pub platform: Platform,
    pub debug: bool,
    pub relwithdebinfo: bool,
    pub overrides: LocalOverrides,
    pub force: bool,
    /// Overrides `[build] jobs` from the config.
    pub jobs: Option<usize>,
    pub verbose: bool,
}

/// Install every dependency of the platform's plan, then build the sample.
pub fn run_build(request: &BuildRequest) -> Result<()> {
    let mut runner = SystemRunner::new(request.verbose);
    run_with(request, &mut runner, |catalog, kind| catalog.installer(kind))
}

/// [`run_build`] with the runner and installer construction supplied by the
/// caller.
pub fn run_with<F>(
    request: &BuildRequest,
    runner: &mut dyn CommandRunner,
    mut installer_for: F,
) -> Result<()>
where
    F: FnMut(&Catalog<'_>, DepKind) -> Result<Box<dyn DependencyInstaller>>,
{
    let start = Instant::now();
    let config = load_config(&request.base_dir)?;
    let layout = Layout::new(&request.base_dir, request.platform, request.debug, &config);

    // Nothing is touched until the manifest and plan check out.
    let manifest = read_version_file(&layout.manifest_path())?;
    let plan = InstallPlan::for_platform(request.platform, &request.overrides);
    plan.validate()?;
    plan.check_manifest(&manifest, &request.overrides)?;

    layout.create_dirs()?;
    let jobs = request
        .jobs
        .filter(|&j| j > 0)
        .unwrap_or_else(|| config.build.jobs());
    let python = config.tools.python();

    let catalog = Catalog {
        manifest: &manifest,
        layout: &layout,
        platform: request.platform,
        debug: request.debug,
        python,
        overrides: &request.overrides,
    };

    println!(
        "{} Installing dependencies for {} ({}, {})",
        "📦".blue(),
        request.sample.to_string().bold(),
        request.platform,
        if request.debug { "debug" } else { "release" }
    );

    let mut ctx = InstallContext {
        layout: &layout,
        platform: request.platform,
        debug: request.debug,
        jobs,
        python: python.to_string(),
        extra_path: Vec::new(),
        runner: &mut *runner,
    };
    let options = InstallOptions {
        force: request.force,
    };
    for kind in plan.steps() {
        let installer = installer_for(&catalog, *kind)?;
        install(installer.as_ref(), &mut ctx, options)?;
        if let Some(bin) = kind.bin_dir(&layout.install_dir) {
            ctx.extra_path.push(bin);
        }
    }
    let extra_path = ctx.extra_path;

    let build_config = BuildConfiguration {
        sample: request.sample,
        platform: request.platform,
        configuration: Configuration::from_flags(request.debug, request.relwithdebinfo),
        jobs,
    };
    let paths = ResolvedPaths::resolve(&catalog, &plan);
    let cmake = CMakeInvocation::new(&build_config, &paths, &layout)
        .with_cmake(resolve_program("cmake", &extra_path));

    println!(
        "{} Building {} ({}, -j{})...",
        "🔨".yellow(),
        request.sample.to_string().bold(),
        build_config.configuration.cmake_name(),
        jobs
    );
    cmake.run(runner, &extra_path)?;

    println!(
        "{} Built {} in {:.2}s → {}",
        "✓".green(),
        request.sample,
        start.elapsed().as_secs_f64(),
        cmake.build_dir().display()
    );
    Ok(())
}
