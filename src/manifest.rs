//! Version manifest (`VERSION`) parsing.
//!
//! The manifest pins one version token per dependency:
//!
//! ```text
//! # comment
//! WEBRTC_BUILD_VERSION=m116.5845.6.1
//! SDL2_VERSION=2.26.0
//! ```
//!
//! The same format is used by the `VERSIONS` file shipped inside the WebRTC
//! build, which pins the LLVM tool and libc++ commits.

use crate::error::ManifestParseError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Keys read from the project `VERSION` file.
pub mod keys {
    pub const WEBRTC: &str = "WEBRTC_BUILD_VERSION";
    pub const BOOST: &str = "BOOST_VERSION";
    pub const LYRA: &str = "LYRA_VERSION";
    pub const CMAKE: &str = "CMAKE_VERSION";
    pub const SDL2: &str = "SDL2_VERSION";
    pub const SORA: &str = "SORA_CPP_SDK_VERSION";
    pub const CLI11: &str = "CLI11_VERSION";

    // Read from the installed WebRTC `VERSIONS` file.
    pub const TOOLS_URL: &str = "WEBRTC_SRC_TOOLS_URL";
    pub const TOOLS_COMMIT: &str = "WEBRTC_SRC_TOOLS_COMMIT";
    pub const LIBCXX_URL: &str = "WEBRTC_SRC_THIRD_PARTY_LIBCXX_SRC_URL";
    pub const LIBCXX_COMMIT: &str = "WEBRTC_SRC_THIRD_PARTY_LIBCXX_SRC_COMMIT";
    pub const BUILDTOOLS_URL: &str = "WEBRTC_SRC_BUILDTOOLS_URL";
    pub const BUILDTOOLS_COMMIT: &str = "WEBRTC_SRC_BUILDTOOLS_COMMIT";
}

/// Immutable key/value view of a manifest file.
#[derive(Debug, Clone, Default)]
pub struct VersionManifest {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl VersionManifest {
    /// Look up a key, failing with [`ManifestParseError::MissingKey`].
    pub fn require(&self, key: &str) -> Result<&str, ManifestParseError> {
        self.get(key).ok_or_else(|| ManifestParseError::MissingKey {
            path: self.path.clone(),
            key: key.to_string(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Check that every key is present, reporting the first missing one.
    pub fn require_all(&self, keys: &[&str]) -> Result<(), ManifestParseError> {
        for key in keys {
            self.require(key)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read and parse a manifest file.
pub fn read_version_file(path: &Path) -> Result<VersionManifest, ManifestParseError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestParseError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse_version_manifest(path, &content)
}

/// Parse manifest text. `path` is only used for error messages.
pub fn parse_version_manifest(
    path: &Path,
    content: &str,
) -> Result<VersionManifest, ManifestParseError> {
    let mut entries = BTreeMap::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let malformed = || ManifestParseError::Malformed {
            path: path.to_path_buf(),
            line: index + 1,
            content: raw.to_string(),
        };

        let (key, value) = line.split_once('=').ok_or_else(malformed)?;
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(malformed());
        }
        let value = value.trim().trim_matches('"');
        if value.is_empty() {
            return Err(malformed());
        }
        entries.insert(key.to_string(), value.to_string());
    }

    Ok(VersionManifest {
        path: path.to_path_buf(),
        entries,
    })
}
