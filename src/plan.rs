//! Install order for a platform.
//!
//! The order is data rather than call sequence: every dependency declares its
//! prerequisites ([`DepKind::prerequisites`]) and [`InstallPlan::validate`]
//! rejects a plan that would install something before what it needs.

use crate::deps::DepKind;
use crate::deps::catalog::{Catalog, LocalOverrides};
use crate::manifest::VersionManifest;
use crate::platform::Platform;
use anyhow::{Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    steps: Vec<DepKind>,
}

impl InstallPlan {
    pub fn new(steps: Vec<DepKind>) -> Self {
        Self { steps }
    }

    /// The install order for a platform.
    ///
    /// Linux builds against the clang/libc++ pinned by WebRTC, so LLVM comes
    /// right after WebRTC and Lyra is bundled. Windows uses MSVC; a local
    /// sora-cpp-sdk checkout ships its own Boost.
    pub fn for_platform(platform: Platform, overrides: &LocalOverrides) -> Self {
        use DepKind::*;
        let steps = match platform {
            Platform::Ubuntu2004X86_64 => vec![WebRtc, Llvm, Boost, Lyra, CMake, Sdl2, Sora, Cli11],
            Platform::WindowsX86_64 => {
                let mut steps = vec![WebRtc];
                if overrides.sora_dir.is_none() {
                    steps.push(Boost);
                }
                steps.extend([Sora, CMake, Sdl2, Cli11]);
                steps
            }
        };
        Self { steps }
    }

    pub fn steps(&self) -> &[DepKind] {
        &self.steps
    }

    pub fn contains(&self, kind: DepKind) -> bool {
        self.steps.contains(&kind)
    }

    /// Every dependency appears once, after all of its prerequisites that are
    /// part of the plan.
    pub fn validate(&self) -> Result<()> {
        for (index, kind) in self.steps.iter().enumerate() {
            if self.steps[..index].contains(kind) {
                bail!("Install plan lists {} more than once", kind);
            }
            for prerequisite in kind.prerequisites() {
                match self.steps.iter().position(|k| k == prerequisite) {
                    Some(at) if at > index => bail!(
                        "Install plan orders {} before its prerequisite {}",
                        kind,
                        prerequisite
                    ),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Manifest keys needed by the plan, in plan order without duplicates.
    pub fn required_keys(&self, overrides: &LocalOverrides) -> Vec<&'static str> {
        let mut keys = Vec::new();
        for kind in &self.steps {
            for key in Catalog::manifest_keys(*kind, overrides) {
                if !keys.contains(key) {
                    keys.push(*key);
                }
            }
        }
        keys
    }

    /// Fail before any install when a required key is absent.
    pub fn check_manifest(
        &self,
        manifest: &VersionManifest,
        overrides: &LocalOverrides,
    ) -> Result<()> {
        manifest.require_all(&self.required_keys(overrides))?;
        Ok(())
    }
}
