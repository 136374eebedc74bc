use super::ResolvedPaths;
use crate::error::NativeBuildError;
use crate::layout::{Layout, cmake_path};
use crate::platform::{Configuration, Platform, Sample};
use crate::process::{CommandRunner, Invocation, path_with};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// What to compile; resolved fresh for every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfiguration {
    pub sample: Sample,
    pub platform: Platform,
    pub configuration: Configuration,
    pub jobs: usize,
}

/// Configure + compile of a sample in `<build>/<sample>`.
#[derive(Debug, Clone)]
pub struct CMakeInvocation {
    cmake: PathBuf,
    project_dir: PathBuf,
    build_dir: PathBuf,
    configuration: Configuration,
    jobs: usize,
    flags: Vec<String>,
}

impl CMakeInvocation {
    pub fn new(config: &BuildConfiguration, paths: &ResolvedPaths, layout: &Layout) -> Self {
        let mut flags = vec![
            format!("-DCMAKE_BUILD_TYPE={}", config.configuration.cmake_name()),
            format!("-DBOOST_ROOT={}", cmake_path(&paths.boost_dir)),
        ];
        if let Some(lyra) = &paths.lyra_dir {
            flags.push(format!("-DLYRA_DIR={}", cmake_path(lyra)));
        }
        flags.extend([
            format!(
                "-DWEBRTC_INCLUDE_DIR={}",
                cmake_path(&paths.webrtc.include_dir)
            ),
            format!(
                "-DWEBRTC_LIBRARY_DIR={}",
                cmake_path(&paths.webrtc.library_dir)
            ),
            format!("-DSORA_DIR={}", cmake_path(&paths.sora_dir)),
            format!("-DCLI11_DIR={}", cmake_path(&paths.cli11_dir)),
            format!("-DSDL2_DIR={}", cmake_path(&paths.sdl2_dir)),
        ]);

        // Normally a toolchain file's job.
        if paths.pinned_llvm {
            flags.extend([
                format!("-DCMAKE_C_COMPILER={}", paths.webrtc.clang().display()),
                format!("-DCMAKE_CXX_COMPILER={}", paths.webrtc.clangxx().display()),
                format!(
                    "-DLIBCXX_INCLUDE_DIR={}",
                    cmake_path(&paths.webrtc.libcxx_dir.join("include"))
                ),
                "-DCMAKE_CXX_FLAGS=-D_LIBCPP_HARDENING_MODE=_LIBCPP_HARDENING_MODE_EXTENSIVE"
                    .to_string(),
            ]);
        }

        Self {
            cmake: PathBuf::from("cmake"),
            project_dir: layout
                .base_dir
                .join(config.sample.dir_name())
                .join(config.platform.id()),
            build_dir: layout.build_dir.join(config.sample.dir_name()),
            configuration: config.configuration,
            jobs: config.jobs,
            flags,
        }
    }

    /// Use a specific cmake binary (e.g. the downloaded one).
    pub fn with_cmake(mut self, cmake: PathBuf) -> Self {
        self.cmake = cmake;
        self
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn configure(&self) -> Invocation {
        Invocation::new(&self.cmake, &self.build_dir)
            .arg(self.project_dir.to_string_lossy())
            .args(self.flags.iter().cloned())
    }

    pub fn compile(&self) -> Invocation {
        Invocation::new(&self.cmake, &self.build_dir).args([
            "--build".to_string(),
            ".".to_string(),
            format!("-j{}", self.jobs),
            "--config".to_string(),
            self.configuration.cmake_name().to_string(),
        ])
    }

    /// Configure, then compile. A non-zero exit becomes [`NativeBuildError`]
    /// carrying CMake's code.
    pub fn run(&self, runner: &mut dyn CommandRunner, extra_path: &[PathBuf]) -> Result<()> {
        fs::create_dir_all(&self.build_dir)
            .with_context(|| format!("Failed to create {}", self.build_dir.display()))?;

        let steps = [
            ("cmake configure", self.configure()),
            ("cmake --build", self.compile()),
        ];
        for (step, mut invocation) in steps {
            if !extra_path.is_empty() {
                invocation = invocation.env("PATH", path_with(extra_path)?);
            }
            let code = runner.run(&invocation)?;
            if code != 0 {
                return Err(NativeBuildError {
                    step: step.to_string(),
                    code,
                }
                .into());
            }
        }
        Ok(())
    }
}
