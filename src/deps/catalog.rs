//! The concrete dependencies of the samples and where they come from.
//!
//! | Dependency | Source | Marker version |
//! |---|---|---|
//! | webrtc | shiguredo-webrtc-build release archive | `WEBRTC_BUILD_VERSION` |
//! | llvm | shallow checkouts pinned by WebRTC's `VERSIONS` | concatenated URLs + commits |
//! | boost | sora-cpp-sdk release archive | `BOOST_VERSION` |
//! | lyra | sora-cpp-sdk release archive | `LYRA_VERSION` |
//! | cmake | Kitware release archive | `CMAKE_VERSION` |
//! | sdl2 | libsdl.org source zip, CMake build | `SDL2_VERSION` |
//! | sora | sora-cpp-sdk release archive | `SORA_CPP_SDK_VERSION` |
//! | cli11 | shallow checkout of the release tag | `CLI11_VERSION` |

use super::{
    ArchiveFetch, CMakeProject, DependencyInstaller, SourceBuild, SourceStep, VendorScriptBuild,
};
use crate::layout::Layout;
use crate::manifest::{VersionManifest, keys, read_version_file};
use crate::platform::{Configuration, Platform};
use crate::process::Invocation;
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

const WEBRTC_RELEASES: &str =
    "https://github.com/shiguredo-webrtc-build/webrtc-build/releases/download";
const SORA_RELEASES: &str = "https://github.com/shiguredo/sora-cpp-sdk/releases/download";
const CMAKE_RELEASES: &str = "https://github.com/Kitware/CMake/releases/download";
const SDL2_RELEASES: &str = "http://www.libsdl.org/release";
const CLI11_REPO: &str = "https://github.com/CLIUtils/CLI11.git";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepKind {
    WebRtc,
    Llvm,
    Boost,
    Lyra,
    CMake,
    Sdl2,
    Sora,
    Cli11,
}

impl DepKind {
    /// Install directory and marker name.
    pub fn name(self) -> &'static str {
        match self {
            DepKind::WebRtc => "webrtc",
            DepKind::Llvm => "llvm",
            DepKind::Boost => "boost",
            DepKind::Lyra => "lyra",
            DepKind::CMake => "cmake",
            DepKind::Sdl2 => "sdl2",
            DepKind::Sora => "sora",
            DepKind::Cli11 => "cli11",
        }
    }

    /// Dependencies that must be installed earlier whenever both are part of
    /// the same plan.
    ///
    /// LLVM's pinned commits come from the installed WebRTC; SDL2 is built
    /// with the downloaded CMake and, on Linux, the pinned clang; the Sora SDK
    /// build may need that clang too.
    pub fn prerequisites(self) -> &'static [DepKind] {
        match self {
            DepKind::Llvm => &[DepKind::WebRtc],
            DepKind::Sdl2 => &[DepKind::CMake, DepKind::Llvm],
            DepKind::Sora => &[DepKind::WebRtc, DepKind::Llvm],
            DepKind::WebRtc | DepKind::Boost | DepKind::Lyra | DepKind::CMake | DepKind::Cli11 => {
                &[]
            }
        }
    }

    /// Executables later steps should find on `PATH`.
    pub fn bin_dir(self, install_root: &Path) -> Option<PathBuf> {
        match self {
            DepKind::CMake => Some(install_root.join("cmake").join("bin")),
            _ => None,
        }
    }
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Local webrtc-build / sora-cpp-sdk checkouts replacing the pinned
/// downloads (Windows only).
#[derive(Debug, Clone, Default)]
pub struct LocalOverrides {
    pub webrtc_build_dir: Option<PathBuf>,
    pub webrtc_build_args: Vec<String>,
    pub sora_dir: Option<PathBuf>,
    pub sora_args: Vec<String>,
}

/// Where the WebRTC headers, libraries and its pinned toolchain live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebrtcInfo {
    pub version_file: PathBuf,
    pub include_dir: PathBuf,
    pub library_dir: PathBuf,
    pub clang_dir: PathBuf,
    pub libcxx_dir: PathBuf,
}

impl WebrtcInfo {
    pub fn resolve(
        platform: Platform,
        local_build_dir: Option<&Path>,
        install_dir: &Path,
        debug: bool,
    ) -> Self {
        match local_build_dir {
            None => {
                let webrtc = install_dir.join("webrtc");
                Self {
                    version_file: webrtc.join("VERSIONS"),
                    include_dir: webrtc.join("include"),
                    library_dir: webrtc.join("lib"),
                    clang_dir: install_dir.join("llvm").join("clang"),
                    libcxx_dir: install_dir.join("llvm").join("libcxx"),
                }
            }
            Some(local) => {
                let configuration_dir = if debug { "debug" } else { "release" };
                let source = local.join("_source").join(platform.id()).join("webrtc");
                let build = local
                    .join("_build")
                    .join(platform.id())
                    .join(configuration_dir)
                    .join("webrtc");
                let library_dir = if platform.is_windows() {
                    build.join("obj")
                } else {
                    build
                };
                Self {
                    version_file: local.join("VERSION"),
                    include_dir: source.join("src"),
                    library_dir,
                    clang_dir: source
                        .join("src")
                        .join("third_party")
                        .join("llvm-build")
                        .join("Release+Asserts"),
                    libcxx_dir: source
                        .join("src")
                        .join("buildtools")
                        .join("third_party")
                        .join("libc++")
                        .join("trunk"),
                }
            }
        }
    }

    pub fn clang(&self) -> PathBuf {
        self.clang_dir.join("bin").join("clang")
    }

    pub fn clangxx(&self) -> PathBuf {
        self.clang_dir.join("bin").join("clang++")
    }
}

/// Where the Sora SDK and the Boost it was built against live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoraInfo {
    pub sora_dir: PathBuf,
    pub boost_dir: PathBuf,
}

impl SoraInfo {
    pub fn resolve(
        platform: Platform,
        local_sora_dir: Option<&Path>,
        install_dir: &Path,
        debug: bool,
    ) -> Self {
        let root = match local_sora_dir {
            Some(local) => {
                let configuration_dir = if debug { "debug" } else { "release" };
                local
                    .join("_install")
                    .join(platform.id())
                    .join(configuration_dir)
            }
            None => install_dir.to_path_buf(),
        };
        Self {
            sora_dir: root.join("sora"),
            boost_dir: root.join("boost"),
        }
    }
}

/// Builds the installer for each dependency from the manifest and layout.
pub struct Catalog<'a> {
    pub manifest: &'a VersionManifest,
    pub layout: &'a Layout,
    pub platform: Platform,
    pub debug: bool,
    pub python: &'a str,
    pub overrides: &'a LocalOverrides,
}

impl Catalog<'_> {
    /// Manifest keys a dependency needs before anything is installed.
    pub fn manifest_keys(kind: DepKind, overrides: &LocalOverrides) -> &'static [&'static str] {
        match kind {
            DepKind::WebRtc if overrides.webrtc_build_dir.is_some() => &[],
            DepKind::WebRtc => &[keys::WEBRTC],
            // Pinned by WebRTC's VERSIONS, read once WebRTC is installed.
            DepKind::Llvm => &[],
            DepKind::Boost => &[keys::BOOST, keys::SORA],
            DepKind::Lyra => &[keys::LYRA, keys::SORA],
            DepKind::CMake => &[keys::CMAKE],
            DepKind::Sdl2 => &[keys::SDL2],
            DepKind::Sora if overrides.sora_dir.is_some() => &[],
            DepKind::Sora => &[keys::SORA],
            DepKind::Cli11 => &[keys::CLI11],
        }
    }

    pub fn webrtc_info(&self) -> WebrtcInfo {
        WebrtcInfo::resolve(
            self.platform,
            self.overrides.webrtc_build_dir.as_deref(),
            &self.layout.install_dir,
            self.debug,
        )
    }

    pub fn sora_info(&self) -> SoraInfo {
        SoraInfo::resolve(
            self.platform,
            self.overrides.sora_dir.as_deref(),
            &self.layout.install_dir,
            self.debug,
        )
    }

    /// The version the marker should record, or `None` for local builds.
    pub fn wanted_version(&self, kind: DepKind) -> Result<Option<String>> {
        let version = match kind {
            DepKind::WebRtc if self.overrides.webrtc_build_dir.is_some() => return Ok(None),
            DepKind::Sora if self.overrides.sora_dir.is_some() => return Ok(None),
            DepKind::Llvm => self.llvm_pins()?.version(),
            _ => {
                let key = Self::manifest_keys(kind, self.overrides)[0];
                self.manifest.require(key)?.to_string()
            }
        };
        Ok(Some(version))
    }

    pub fn installer(&self, kind: DepKind) -> Result<Box<dyn DependencyInstaller>> {
        let installer: Box<dyn DependencyInstaller> = match kind {
            DepKind::WebRtc => match &self.overrides.webrtc_build_dir {
                Some(dir) => Box::new(VendorScriptBuild::webrtc(
                    dir.clone(),
                    self.platform.id(),
                    self.debug,
                    &self.overrides.webrtc_build_args,
                )),
                None => Box::new(self.webrtc_archive()?),
            },
            DepKind::Llvm => Box::new(self.llvm_build()?),
            DepKind::Boost => Box::new(self.sora_companion_archive(DepKind::Boost, keys::BOOST)?),
            DepKind::Lyra => Box::new(self.sora_companion_archive(DepKind::Lyra, keys::LYRA)?),
            DepKind::CMake => Box::new(self.cmake_archive()?),
            DepKind::Sdl2 => Box::new(self.sdl2_build()?),
            DepKind::Sora => match &self.overrides.sora_dir {
                Some(dir) => Box::new(VendorScriptBuild::sora(
                    dir.clone(),
                    self.platform.id(),
                    self.debug,
                    &self.overrides.sora_args,
                    self.overrides.webrtc_build_dir.as_deref(),
                )),
                None => Box::new(self.sora_archive()?),
            },
            DepKind::Cli11 => Box::new(self.cli11_build()?),
        };
        Ok(installer)
    }

    fn webrtc_archive(&self) -> Result<ArchiveFetch> {
        let version = self.manifest.require(keys::WEBRTC)?;
        let archive_name = format!("webrtc.{}.{}", self.platform.id(), self.platform.archive_ext());
        let url = format!("{}/{}/{}", WEBRTC_RELEASES, version, archive_name);
        Ok(ArchiveFetch::new("webrtc", version, url, archive_name))
    }

    /// Boost and Lyra are published alongside each Sora SDK release.
    fn sora_companion_archive(&self, kind: DepKind, key: &str) -> Result<ArchiveFetch> {
        let version = self.manifest.require(key)?;
        let sora_version = self.manifest.require(keys::SORA)?;
        let archive_name = format!(
            "{}-{}_sora-cpp-sdk-{}_{}.{}",
            kind.name(),
            version,
            sora_version,
            self.platform.id(),
            self.platform.archive_ext()
        );
        let url = format!("{}/{}/{}", SORA_RELEASES, sora_version, archive_name);
        Ok(ArchiveFetch::new(kind.name(), version, url, archive_name))
    }

    fn sora_archive(&self) -> Result<ArchiveFetch> {
        let version = self.manifest.require(keys::SORA)?;
        let archive_name = format!(
            "sora-cpp-sdk-{}_{}.{}",
            version,
            self.platform.id(),
            self.platform.archive_ext()
        );
        let url = format!("{}/{}/{}", SORA_RELEASES, version, archive_name);
        Ok(ArchiveFetch::new("sora", version, url, archive_name))
    }

    fn cmake_archive(&self) -> Result<ArchiveFetch> {
        let version = self.manifest.require(keys::CMAKE)?;
        let archive_name = format!(
            "cmake-{}-{}.{}",
            version,
            self.platform.cmake_asset_platform(),
            self.platform.archive_ext()
        );
        let url = format!("{}/v{}/{}", CMAKE_RELEASES, version, archive_name);
        Ok(ArchiveFetch::new("cmake", version, url, archive_name))
    }

    fn sdl2_build(&self) -> Result<SourceBuild> {
        let version = self.manifest.require(keys::SDL2)?;
        let layout = self.layout;
        let archive = layout.source_dir.join(format!("SDL2-{}.zip", version));
        let source_dir = layout.source_dir.join("sdl2");
        let build_dir = layout.build_dir.join("sdl2");
        let install_dir = layout.install_dir.join("sdl2");

        let mut args = Vec::new();
        if self.platform.uses_pinned_llvm() {
            let webrtc = self.webrtc_info();
            args.push(format!("-DCMAKE_C_COMPILER={}", webrtc.clang().display()));
            args.push(format!("-DCMAKE_CXX_COMPILER={}", webrtc.clangxx().display()));
        }
        if self.platform.sdl2_family() == "windows" {
            args.push("-DSDL_FORCE_STATIC_VCRT=ON".to_string());
            args.push("-DHAVE_LIBC=ON".to_string());
        }

        let configuration = if self.debug {
            Configuration::Debug
        } else {
            Configuration::Release
        };

        Ok(SourceBuild::new(
            "sdl2",
            version,
            vec![
                SourceStep::Download {
                    url: format!("{}/SDL2-{}.zip", SDL2_RELEASES, version),
                    dest: archive.clone(),
                },
                SourceStep::RemoveDir(source_dir.clone()),
                SourceStep::RemoveDir(build_dir.clone()),
                SourceStep::RemoveDir(install_dir.clone()),
                SourceStep::Extract {
                    archive,
                    output_dir: layout.source_dir.clone(),
                    dirname: "sdl2".to_string(),
                },
                SourceStep::CMakeProject(CMakeProject {
                    source_dir,
                    build_dir,
                    install_prefix: install_dir,
                    configuration,
                    args,
                }),
            ],
        ))
    }

    fn cli11_build(&self) -> Result<SourceBuild> {
        let version = self.manifest.require(keys::CLI11)?;
        let dest = self.layout.install_dir.join("cli11");
        Ok(SourceBuild::new(
            "cli11",
            version,
            vec![SourceStep::GitCheckout {
                url: CLI11_REPO.to_string(),
                rev: format!("refs/tags/{}", version),
                dest,
            }],
        ))
    }

    fn llvm_pins(&self) -> Result<LlvmPins> {
        let info = self.webrtc_info();
        let versions = read_version_file(&info.version_file)
            .context("WebRTC must be installed before LLVM")?;
        let pin = |key: &str| -> Result<String> { Ok(versions.require(key)?.to_string()) };
        Ok(LlvmPins {
            tools_url: pin(keys::TOOLS_URL)?,
            tools_commit: pin(keys::TOOLS_COMMIT)?,
            libcxx_url: pin(keys::LIBCXX_URL)?,
            libcxx_commit: pin(keys::LIBCXX_COMMIT)?,
            buildtools_url: pin(keys::BUILDTOOLS_URL)?,
            buildtools_commit: pin(keys::BUILDTOOLS_COMMIT)?,
        })
    }

    /// The clang binaries come from Chromium's `update.py`; libc++ headers
    /// and `__config_site` come from the commits WebRTC was built with.
    fn llvm_build(&self) -> Result<SourceBuild> {
        let pins = self.llvm_pins()?;
        let llvm_dir = self.layout.install_dir.join("llvm");
        let tools_dir = llvm_dir.join("tools");
        let buildtools_dir = llvm_dir.join("buildtools");
        let libcxx_dir = llvm_dir.join("libcxx");

        let update = Invocation::new(self.python, &tools_dir)
            .arg(
                Path::new("clang")
                    .join("scripts")
                    .join("update.py")
                    .to_string_lossy(),
            )
            .arg("--output-dir")
            .arg(llvm_dir.join("clang").to_string_lossy());

        Ok(SourceBuild::new(
            "llvm",
            &pins.version(),
            vec![
                SourceStep::RemoveDir(llvm_dir.clone()),
                SourceStep::GitCheckout {
                    url: pins.tools_url.clone(),
                    rev: pins.tools_commit.clone(),
                    dest: tools_dir,
                },
                SourceStep::Run(update),
                SourceStep::GitCheckout {
                    url: pins.libcxx_url.clone(),
                    rev: pins.libcxx_commit.clone(),
                    dest: libcxx_dir.clone(),
                },
                SourceStep::GitCheckout {
                    url: pins.buildtools_url.clone(),
                    rev: pins.buildtools_commit.clone(),
                    dest: buildtools_dir.clone(),
                },
                SourceStep::CopyFile {
                    from: buildtools_dir
                        .join("third_party")
                        .join("libc++")
                        .join("__config_site"),
                    to: libcxx_dir.join("include").join("__config_site"),
                },
            ],
        ))
    }
}

struct LlvmPins {
    tools_url: String,
    tools_commit: String,
    libcxx_url: String,
    libcxx_commit: String,
    buildtools_url: String,
    buildtools_commit: String,
}

impl LlvmPins {
    fn version(&self) -> String {
        format!(
            "{}.{}.{}.{}.{}.{}",
            self.tools_url,
            self.tools_commit,
            self.libcxx_url,
            self.libcxx_commit,
            self.buildtools_url,
            self.buildtools_commit
        )
    }
}
