//! # sbuild - Sora C++ SDK sample builder
//!
//! Builds the `sdl_sample` and `sumomo` sample applications: every
//! third-party dependency pinned in the `VERSION` manifest is installed into
//! a per-platform, per-configuration tree (skipped when its marker already
//! records the wanted version), then CMake compiles the sample against them.
//!
//! ## Quick Start
//!
//! ```bash
//! # Linux, release
//! sbuild build sdl_sample
//!
//! # Windows, debug, against a local webrtc-build checkout
//! sbuild build sumomo --debug --webrtc-build-dir ..\webrtc-build
//!
//! # What is installed?
//! sbuild status
//! ```
//!
//! ## Module Organization
//!
//! - [`manifest`] - `KEY=VALUE` version manifests
//! - [`marker`] - `<dep>.version` install markers
//! - [`deps`] - dependency installers and the versioned install driver
//! - [`plan`] - per-platform install order
//! - [`build`] - CMake configure + compile of a sample
//! - [`commands`] - `status`, `clean`, `doctor`

/// Sample build pipeline and CMake invocation.
pub mod build;

/// Handlers for `status`, `clean` and `doctor`.
pub mod commands;

/// Optional `sbuild.toml`.
pub mod config;

/// Dependency installers.
pub mod deps;

/// Typed failures: manifest, dependency install, native build.
pub mod error;

/// `_source` / `_build` / `_install` directory scheme.
pub mod layout;

/// Version manifest parsing.
pub mod manifest;

/// Install-state markers.
pub mod marker;

/// Install order with declared prerequisites.
pub mod plan;

/// Platforms, samples and CMake configurations.
pub mod platform;

/// Child process invocation.
pub mod process;

/// Terminal tables.
pub mod ui;
