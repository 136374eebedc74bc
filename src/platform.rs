//! Target platforms, samples and build configurations.

use clap::ValueEnum;
use std::fmt;

/// A supported target platform for the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Platform {
    #[value(name = "ubuntu-20.04_x86_64")]
    Ubuntu2004X86_64,
    #[value(name = "windows_x86_64")]
    WindowsX86_64,
}

impl Platform {
    /// Identifier used in directory names and release asset names.
    pub fn id(self) -> &'static str {
        match self {
            Platform::Ubuntu2004X86_64 => "ubuntu-20.04_x86_64",
            Platform::WindowsX86_64 => "windows_x86_64",
        }
    }

    pub fn is_windows(self) -> bool {
        matches!(self, Platform::WindowsX86_64)
    }

    /// Archive extension of the prebuilt WebRTC / Sora / Boost packages.
    pub fn archive_ext(self) -> &'static str {
        if self.is_windows() { "zip" } else { "tar.gz" }
    }

    /// Asset suffix used by Kitware's CMake releases.
    pub fn cmake_asset_platform(self) -> &'static str {
        match self {
            Platform::Ubuntu2004X86_64 => "linux-x86_64",
            Platform::WindowsX86_64 => "windows-x86_64",
        }
    }

    /// Family name used when choosing SDL2 configure options.
    pub fn sdl2_family(self) -> &'static str {
        match self {
            Platform::Ubuntu2004X86_64 => "linux",
            Platform::WindowsX86_64 => "windows",
        }
    }

    /// Samples on Linux compile with the LLVM pinned by WebRTC against its
    /// libc++; Windows uses the host MSVC toolchain.
    pub fn uses_pinned_llvm(self) -> bool {
        !self.is_windows()
    }

    pub fn host() -> Option<Self> {
        if cfg!(all(windows, target_arch = "x86_64")) {
            Some(Platform::WindowsX86_64)
        } else if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
            Some(Platform::Ubuntu2004X86_64)
        } else {
            None
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The sample application to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Sample {
    #[value(name = "sdl_sample")]
    SdlSample,
    #[value(name = "sumomo")]
    Sumomo,
}

impl Sample {
    /// Directory name of the sample's CMake project and its build dir.
    pub fn dir_name(self) -> &'static str {
        match self {
            Sample::SdlSample => "sdl_sample",
            Sample::Sumomo => "sumomo",
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// CMake build type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Configuration {
    Debug,
    Release,
    RelWithDebInfo,
}

impl Configuration {
    /// `--relwithdebinfo` wins over `--debug`.
    pub fn from_flags(debug: bool, relwithdebinfo: bool) -> Self {
        if relwithdebinfo {
            Configuration::RelWithDebInfo
        } else if debug {
            Configuration::Debug
        } else {
            Configuration::Release
        }
    }

    pub fn cmake_name(self) -> &'static str {
        match self {
            Configuration::Debug => "Debug",
            Configuration::Release => "Release",
            Configuration::RelWithDebInfo => "RelWithDebInfo",
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cmake_name())
    }
}
