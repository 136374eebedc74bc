use super::fetch;
use super::{DependencyInstaller, InstallContext};
use crate::layout::cmake_path;
use crate::platform::Configuration;
use crate::process::{Invocation, resolve_program};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One step of a source build, executed in order.
#[derive(Debug, Clone)]
pub enum SourceStep {
    RemoveDir(PathBuf),
    Download {
        url: String,
        dest: PathBuf,
    },
    Extract {
        archive: PathBuf,
        output_dir: PathBuf,
        dirname: String,
    },
    /// Shallow fetch of a single commit or `refs/tags/<tag>`.
    GitCheckout {
        url: String,
        rev: String,
        dest: PathBuf,
    },
    Run(Invocation),
    CMakeProject(CMakeProject),
    CopyFile {
        from: PathBuf,
        to: PathBuf,
    },
}

/// Configure, build and install a CMake project.
#[derive(Debug, Clone)]
pub struct CMakeProject {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_prefix: PathBuf,
    pub configuration: Configuration,
    pub args: Vec<String>,
}

impl CMakeProject {
    fn invocations(&self, cmake: &Path, jobs: usize) -> Vec<Invocation> {
        let config = self.configuration.cmake_name();
        let configure = Invocation::new(cmake, &self.build_dir)
            .arg(cmake_path(&self.source_dir))
            .args(self.args.iter().cloned())
            .arg(format!("-DCMAKE_BUILD_TYPE={}", config))
            .arg(format!(
                "-DCMAKE_INSTALL_PREFIX={}",
                cmake_path(&self.install_prefix)
            ))
            .arg("-DBUILD_SHARED_LIBS=OFF");
        let build = Invocation::new(cmake, &self.build_dir).args([
            "--build".to_string(),
            ".".to_string(),
            "--config".to_string(),
            config.to_string(),
            format!("-j{}", jobs),
        ]);
        let install = Invocation::new(cmake, &self.build_dir).args([
            "--install",
            ".",
            "--config",
            config,
        ]);
        vec![configure, build, install]
    }
}

/// A dependency produced by a sequence of [`SourceStep`]s.
#[derive(Debug, Clone)]
pub struct SourceBuild {
    pub name: String,
    pub version: String,
    pub steps: Vec<SourceStep>,
}

impl SourceBuild {
    pub fn new(name: &str, version: &str, steps: Vec<SourceStep>) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            steps,
        }
    }
}

impl DependencyInstaller for SourceBuild {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn fetch(&self, ctx: &mut InstallContext<'_>) -> Result<()> {
        for step in &self.steps {
            run_step(step, ctx)?;
        }
        Ok(())
    }
}

fn run_step(step: &SourceStep, ctx: &mut InstallContext<'_>) -> Result<()> {
    match step {
        SourceStep::RemoveDir(dir) => fetch::remove_dir_if_exists(dir),
        SourceStep::Download { url, dest } => fetch::download(url, dest).map(|_| ()),
        SourceStep::Extract {
            archive,
            output_dir,
            dirname,
        } => fetch::extract(archive, output_dir, dirname).map(|_| ()),
        SourceStep::GitCheckout { url, rev, dest } => fetch::git_checkout_shallow(url, rev, dest),
        SourceStep::Run(invocation) => ctx.run(invocation.clone()),
        SourceStep::CMakeProject(project) => {
            fs::create_dir_all(&project.build_dir).with_context(|| {
                format!("Failed to create {}", project.build_dir.display())
            })?;
            let cmake = resolve_program("cmake", &ctx.extra_path);
            for invocation in project.invocations(&cmake, ctx.jobs) {
                ctx.run(invocation)?;
            }
            Ok(())
        }
        SourceStep::CopyFile { from, to } => {
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(from, to).with_context(|| {
                format!("Failed to copy {} to {}", from.display(), to.display())
            })?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::testing::{test_context, test_layout};
    use crate::deps::{InstallOptions, install};
    use crate::marker;
    use crate::process::testing::RecordingRunner;

    fn sdl2_project(root: &std::path::Path) -> CMakeProject {
        CMakeProject {
            source_dir: root.join("_source").join("sdl2"),
            build_dir: root.join("_build").join("sdl2"),
            install_prefix: root.join("_install").join("sdl2"),
            configuration: Configuration::Release,
            args: vec!["-DCMAKE_C_COMPILER=/llvm/clang/bin/clang".to_string()],
        }
    }

    #[test]
    fn test_cmake_project_invocations() {
        let tmp = tempfile::tempdir().unwrap();
        let project = sdl2_project(tmp.path());
        let invocations = project.invocations(Path::new("cmake"), 6);

        assert_eq!(invocations.len(), 3);
        let configure = &invocations[0].args;
        assert_eq!(configure[0], cmake_path(&project.source_dir));
        assert!(configure.contains(&"-DCMAKE_C_COMPILER=/llvm/clang/bin/clang".to_string()));
        assert!(configure.contains(&"-DCMAKE_BUILD_TYPE=Release".to_string()));
        assert!(configure.contains(&"-DBUILD_SHARED_LIBS=OFF".to_string()));
        assert!(invocations[1].args.contains(&"-j6".to_string()));
        assert_eq!(invocations[2].args[0], "--install");
        assert!(
            invocations
                .iter()
                .all(|i| i.current_dir == project.build_dir)
        );
    }

    #[test]
    fn test_source_build_runs_steps_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = test_layout(tmp.path());
        let install_dir = layout.install_dir.join("sdl2");
        let project = CMakeProject {
            install_prefix: install_dir.clone(),
            ..sdl2_project(tmp.path())
        };
        let build = SourceBuild::new(
            "sdl2",
            "2.26.0",
            vec![
                SourceStep::RemoveDir(install_dir.clone()),
                SourceStep::CMakeProject(project),
                SourceStep::Run(Invocation::new("true", tmp.path())),
                SourceStep::CopyFile {
                    from: layout.base_dir.join("VERSION"),
                    to: install_dir.join("VERSION"),
                },
            ],
        );
        fs::write(layout.base_dir.join("VERSION"), "SDL2_VERSION=2.26.0\n").unwrap();

        let mut runner = RecordingRunner::default();
        {
            let mut ctx = test_context(&layout, &mut runner);
            install(&build, &mut ctx, InstallOptions::default()).unwrap();
        }

        let programs: Vec<_> = runner
            .invocations
            .iter()
            .map(|i| i.program.to_string_lossy().to_string())
            .collect();
        assert_eq!(programs, vec!["cmake", "cmake", "cmake", "true"]);
        assert!(install_dir.join("VERSION").is_file());
        assert!(marker::is_up_to_date("sdl2", "2.26.0", &layout.install_dir));
    }

    #[test]
    fn test_source_build_stops_on_failed_step() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = test_layout(tmp.path());
        let build = SourceBuild::new(
            "sdl2",
            "2.26.0",
            vec![
                SourceStep::CMakeProject(sdl2_project(tmp.path())),
                SourceStep::Run(Invocation::new("never-run", tmp.path())),
            ],
        );

        let mut runner = RecordingRunner::failing_on("--build", 2);
        {
            let mut ctx = test_context(&layout, &mut runner);
            let err = install(&build, &mut ctx, InstallOptions::default()).unwrap_err();
            assert_eq!(err.dependency, "sdl2");
        }
        // configure + failed build; install and later steps never run.
        assert_eq!(runner.invocations.len(), 2);
        assert!(!layout.install_dir.join("sdl2.version").exists());
    }
}
