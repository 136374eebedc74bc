use super::fetch;
use super::{DependencyInstaller, InstallContext};
use anyhow::Result;
use std::fs;

/// A prebuilt release archive extracted to `<install root>/<name>`.
#[derive(Debug, Clone)]
pub struct ArchiveFetch {
    pub name: String,
    pub version: String,
    pub url: String,
    /// File name under the source dir.
    pub archive_name: String,
    /// Keep a previously downloaded archive. Only safe when the file name
    /// embeds the version.
    pub reuse_cached: bool,
}

impl ArchiveFetch {
    pub fn new(name: &str, version: &str, url: String, archive_name: String) -> Self {
        let reuse_cached = archive_name.contains(version);
        Self {
            name: name.to_string(),
            version: version.to_string(),
            url,
            archive_name,
            reuse_cached,
        }
    }
}

impl DependencyInstaller for ArchiveFetch {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn fetch(&self, ctx: &mut InstallContext<'_>) -> Result<()> {
        let archive = ctx.layout.source_dir.join(&self.archive_name);
        if !self.reuse_cached && archive.exists() {
            fs::remove_file(&archive)?;
        }
        fetch::download(&self.url, &archive)?;
        fetch::extract(&archive, &ctx.layout.install_dir, &self.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::testing::{test_context, test_layout};
    use crate::deps::{InstallOptions, InstallOutcome, install};
    use crate::marker::Marker;
    use crate::process::testing::RecordingRunner;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::path::Path;

    fn write_sora_archive(path: &Path) {
        let file = fs::File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        let content = b"sora";
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "sora/include/sora/version.h", &content[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_reuse_cached_only_with_versioned_name() {
        let versioned = ArchiveFetch::new(
            "cmake",
            "3.27.7",
            "https://example.com/cmake.tar.gz".to_string(),
            "cmake-3.27.7-linux-x86_64.tar.gz".to_string(),
        );
        assert!(versioned.reuse_cached);

        let unversioned = ArchiveFetch::new(
            "webrtc",
            "m116.5845.6.1",
            "https://example.com/webrtc.tar.gz".to_string(),
            "webrtc.ubuntu-20.04_x86_64.tar.gz".to_string(),
        );
        assert!(!unversioned.reuse_cached);
    }

    #[test]
    fn test_archive_install_from_cached_download() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = test_layout(tmp.path());
        let archive_name = "sora-cpp-sdk-2023.13.0_ubuntu-20.04_x86_64.tar.gz";
        write_sora_archive(&layout.source_dir.join(archive_name));

        let sora = ArchiveFetch::new(
            "sora",
            "2023.13.0",
            "http://invalid.invalid/sora.tar.gz".to_string(),
            archive_name.to_string(),
        );
        let mut runner = RecordingRunner::default();
        let mut ctx = test_context(&layout, &mut runner);
        let outcome = install(&sora, &mut ctx, InstallOptions::default()).unwrap();

        assert_eq!(outcome, InstallOutcome::Installed);
        assert!(
            layout
                .install_dir
                .join("sora/include/sora/version.h")
                .is_file()
        );
        let marker = Marker::for_dependency("sora", &layout.install_dir);
        assert!(marker.is_up_to_date("2023.13.0"));
    }
}
