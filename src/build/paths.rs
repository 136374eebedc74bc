use crate::deps::DepKind;
use crate::deps::catalog::{Catalog, WebrtcInfo};
use crate::plan::InstallPlan;
use std::path::PathBuf;

/// Dependency locations handed to the sample's CMake project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub boost_dir: PathBuf,
    /// Only set when Lyra is part of the plan.
    pub lyra_dir: Option<PathBuf>,
    pub webrtc: WebrtcInfo,
    pub sora_dir: PathBuf,
    pub cli11_dir: PathBuf,
    pub sdl2_dir: PathBuf,
    /// Compile with the clang and libc++ pinned by WebRTC.
    pub pinned_llvm: bool,
}

impl ResolvedPaths {
    pub fn resolve(catalog: &Catalog<'_>, plan: &InstallPlan) -> Self {
        let install_dir = &catalog.layout.install_dir;
        let sora = catalog.sora_info();
        Self {
            boost_dir: sora.boost_dir,
            lyra_dir: plan
                .contains(DepKind::Lyra)
                .then(|| install_dir.join(DepKind::Lyra.name())),
            webrtc: catalog.webrtc_info(),
            sora_dir: sora.sora_dir,
            cli11_dir: install_dir.join(DepKind::Cli11.name()),
            sdl2_dir: install_dir.join(DepKind::Sdl2.name()),
            pinned_llvm: plan.contains(DepKind::Llvm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SbuildConfig;
    use crate::deps::catalog::LocalOverrides;
    use crate::layout::Layout;
    use crate::manifest::VersionManifest;
    use crate::platform::Platform;
    use std::path::Path;

    fn resolve(platform: Platform, overrides: &LocalOverrides) -> (Layout, ResolvedPaths) {
        let layout = Layout::new(Path::new("/work"), platform, false, &SbuildConfig::default());
        let manifest = VersionManifest::default();
        let catalog = Catalog {
            manifest: &manifest,
            layout: &layout,
            platform,
            debug: false,
            python: "python3",
            overrides,
        };
        let plan = InstallPlan::for_platform(platform, overrides);
        let paths = ResolvedPaths::resolve(&catalog, &plan);
        (layout, paths)
    }

    #[test]
    fn test_linux_paths() {
        let (layout, paths) = resolve(Platform::Ubuntu2004X86_64, &LocalOverrides::default());
        assert!(paths.pinned_llvm);
        assert_eq!(paths.lyra_dir, Some(layout.install_dir.join("lyra")));
        assert_eq!(paths.boost_dir, layout.install_dir.join("boost"));
        assert_eq!(paths.webrtc.include_dir, layout.install_dir.join("webrtc").join("include"));
    }

    #[test]
    fn test_windows_local_sora_paths() {
        let overrides = LocalOverrides {
            sora_dir: Some(PathBuf::from("/src/sora-cpp-sdk")),
            ..Default::default()
        };
        let (layout, paths) = resolve(Platform::WindowsX86_64, &overrides);
        assert!(!paths.pinned_llvm);
        assert_eq!(paths.lyra_dir, None);
        assert_eq!(
            paths.sora_dir,
            PathBuf::from("/src/sora-cpp-sdk/_install/windows_x86_64/release/sora")
        );
        assert_eq!(paths.sdl2_dir, layout.install_dir.join("sdl2"));
    }
}
