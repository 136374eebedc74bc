use super::{DependencyInstaller, InstallContext};
use crate::process::Invocation;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// A local checkout (webrtc-build, sora-cpp-sdk) built by its own `run.py`.
///
/// These trees track their own build state, so no marker is written and the
/// script runs on every invocation.
#[derive(Debug, Clone)]
pub struct VendorScriptBuild {
    pub name: String,
    pub checkout_dir: PathBuf,
    /// Arguments after `run.py`.
    pub script_args: Vec<String>,
}

impl VendorScriptBuild {
    /// `python3 run.py build <platform> ...` in a webrtc-build checkout.
    pub fn webrtc(checkout_dir: PathBuf, platform: &str, debug: bool, extra: &[String]) -> Self {
        let mut script_args = vec![
            "build".to_string(),
            platform.to_string(),
            "--webrtc-nobuild-ios-framework".to_string(),
            "--webrtc-nobuild-android-aar".to_string(),
        ];
        if debug {
            script_args.push("--debug".to_string());
        }
        script_args.extend(extra.iter().cloned());
        Self {
            name: "webrtc".to_string(),
            checkout_dir,
            script_args,
        }
    }

    /// `python3 run.py <platform> ...` in a sora-cpp-sdk checkout, pointed at
    /// the local WebRTC build when there is one.
    pub fn sora(
        checkout_dir: PathBuf,
        platform: &str,
        debug: bool,
        extra: &[String],
        local_webrtc: Option<&Path>,
    ) -> Self {
        let mut script_args = vec![platform.to_string()];
        script_args.extend(extra.iter().cloned());
        if debug && !extra.iter().any(|a| a == "--debug") {
            script_args.push("--debug".to_string());
        }
        if let Some(dir) = local_webrtc {
            script_args.push("--local-webrtc-build-dir".to_string());
            script_args.push(dir.to_string_lossy().to_string());
        }
        Self {
            name: "sora".to_string(),
            checkout_dir,
            script_args,
        }
    }
}

impl DependencyInstaller for VendorScriptBuild {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "local"
    }

    fn tracks_version(&self) -> bool {
        false
    }

    fn fetch(&self, ctx: &mut InstallContext<'_>) -> Result<()> {
        if !self.checkout_dir.join("run.py").is_file() {
            anyhow::bail!(
                "{} has no run.py - is it a {} checkout?",
                self.checkout_dir.display(),
                if self.name == "webrtc" {
                    "webrtc-build"
                } else {
                    "sora-cpp-sdk"
                }
            );
        }
        let invocation = Invocation::new(ctx.python.as_str(), &self.checkout_dir)
            .arg("run.py")
            .args(self.script_args.iter().cloned());
        ctx.run(invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::testing::{test_context, test_layout};
    use crate::deps::{InstallOptions, install};
    use crate::process::testing::RecordingRunner;
    use std::fs;

    #[test]
    fn test_webrtc_script_args() {
        let build = VendorScriptBuild::webrtc(
            PathBuf::from("/src/webrtc-build"),
            "windows_x86_64",
            true,
            &["--webrtc-fetch".to_string()],
        );
        assert_eq!(
            build.script_args,
            vec![
                "build",
                "windows_x86_64",
                "--webrtc-nobuild-ios-framework",
                "--webrtc-nobuild-android-aar",
                "--debug",
                "--webrtc-fetch",
            ]
        );
    }

    #[test]
    fn test_sora_script_args_do_not_duplicate_debug() {
        let local = PathBuf::from("/src/webrtc-build");
        let build = VendorScriptBuild::sora(
            PathBuf::from("/src/sora-cpp-sdk"),
            "windows_x86_64",
            true,
            &["--debug".to_string()],
            Some(local.as_path()),
        );
        assert_eq!(
            build
                .script_args
                .iter()
                .filter(|a| a.as_str() == "--debug")
                .count(),
            1
        );
        assert!(
            build
                .script_args
                .ends_with(&["--local-webrtc-build-dir".to_string(), local.to_string_lossy().to_string()])
        );
    }

    #[test]
    fn test_vendor_build_runs_every_time_without_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = test_layout(tmp.path());
        let checkout = tmp.path().join("sora-cpp-sdk");
        fs::create_dir_all(&checkout).unwrap();
        fs::write(checkout.join("run.py"), "").unwrap();

        let build = VendorScriptBuild::sora(checkout.clone(), "windows_x86_64", false, &[], None);
        let mut runner = RecordingRunner::default();
        {
            let mut ctx = test_context(&layout, &mut runner);
            install(&build, &mut ctx, InstallOptions::default()).unwrap();
            install(&build, &mut ctx, InstallOptions::default()).unwrap();
        }

        assert_eq!(runner.invocations.len(), 2);
        assert_eq!(runner.invocations[0].current_dir, checkout);
        assert_eq!(runner.invocations[0].args[0], "run.py");
        assert!(!layout.install_dir.join("sora.version").exists());
    }

    #[test]
    fn test_vendor_build_requires_run_py() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = test_layout(tmp.path());
        let build = VendorScriptBuild::webrtc(tmp.path().join("missing"), "windows_x86_64", false, &[]);
        let mut runner = RecordingRunner::default();
        let mut ctx = test_context(&layout, &mut runner);
        let err = install(&build, &mut ctx, InstallOptions::default()).unwrap_err();
        assert_eq!(err.dependency, "webrtc");
        let chain = format!("{:#}", anyhow::Error::from(err));
        assert!(chain.contains("run.py"), "{chain}");
    }
}
