//! Failure classes surfaced by a build run.
//!
//! Everything inside the crate propagates `anyhow::Error`; these typed errors
//! are attached at the three points where the caller needs to tell failures
//! apart (manifest, dependency install, native build). `main` downcasts to
//! [`NativeBuildError`] to mirror CMake's exit code.

use std::path::PathBuf;
use thiserror::Error;

/// The version manifest could not be used.
#[derive(Error, Debug)]
pub enum ManifestParseError {
    #[error("Cannot read version manifest {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed line {line} in {path}: '{content}' (expected KEY=VALUE)")]
    Malformed {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Version manifest {path} has no entry for {key}")]
    MissingKey { path: PathBuf, key: String },
}

/// Downloading, extracting or building a dependency failed.
#[derive(Error, Debug)]
#[error("Failed to install {dependency} {version}")]
pub struct DependencyInstallError {
    pub dependency: String,
    pub version: String,
    #[source]
    pub source: anyhow::Error,
}

/// CMake (configure or compile) exited with a non-zero status.
#[derive(Error, Debug)]
#[error("{step} failed with exit code {code}")]
pub struct NativeBuildError {
    pub step: String,
    pub code: i32,
}

impl NativeBuildError {
    /// Exit code the orchestrator itself should report.
    pub fn exit_code(&self) -> i32 {
        if self.code == 0 { 1 } else { self.code }
    }
}
