//! End-to-end checks of the `sbuild` command line.
//!
//! These run the compiled binary against a scratch base directory and never
//! reach the network: every case fails (or finishes) before the first
//! download.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const LINUX: &str = "ubuntu-20.04_x86_64";

/// Get the path to the sbuild binary
fn get_sbuild_binary() -> PathBuf {
    let target_dir = std::env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target"));

    let bin_name = if cfg!(windows) { "sbuild.exe" } else { "sbuild" };
    target_dir.join("debug").join(bin_name)
}

fn run_sbuild(args: &[&str], base_dir: &Path) -> Option<Output> {
    let sbuild = get_sbuild_binary();
    if !sbuild.exists() {
        eprintln!("Skipping test: sbuild binary not found at {:?}", sbuild);
        return None;
    }
    let output = Command::new(&sbuild)
        .args(args)
        .current_dir(base_dir)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute sbuild");
    Some(output)
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_build_without_manifest_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let Some(output) = run_sbuild(&["build", "sdl_sample", "--platform", LINUX], tmp.path()) else {
        return;
    };

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("VERSION"), "{}", stderr(&output));
    assert!(!tmp.path().join("_install").exists());
}

#[test]
fn test_missing_manifest_key_fails_before_install() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("VERSION"),
        "WEBRTC_BUILD_VERSION=m116.5845.6.1\nCMAKE_VERSION=3.27.7\n",
    )
    .unwrap();
    let Some(output) = run_sbuild(&["build", "sdl_sample", "--platform", LINUX], tmp.path()) else {
        return;
    };

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("BOOST_VERSION"), "{}", stderr(&output));
    assert!(!tmp.path().join("_install").exists());
    assert!(!tmp.path().join("_source").exists());
}

#[test]
fn test_malformed_manifest_reports_line() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("VERSION"), "# pins\nWEBRTC_BUILD_VERSION\n").unwrap();
    let Some(output) = run_sbuild(&["build", "sdl_sample", "--platform", LINUX], tmp.path()) else {
        return;
    };

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("line 2"), "{}", stderr(&output));
}

#[test]
fn test_windows_only_flags_rejected_on_linux() {
    let tmp = tempfile::tempdir().unwrap();
    for flag in [
        vec!["--relwithdebinfo"],
        vec!["--sora-dir", "../sora-cpp-sdk"],
        vec!["--webrtc-build-dir", "../webrtc-build"],
    ] {
        let mut args = vec!["build", "sdl_sample", "--platform", LINUX];
        args.extend(flag.iter().copied());
        let Some(output) = run_sbuild(&args, tmp.path()) else {
            return;
        };
        assert_eq!(output.status.code(), Some(2), "{:?}", flag);
        assert!(stderr(&output).contains(flag[0]), "{}", stderr(&output));
    }
}

#[test]
fn test_unknown_sample_is_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    let Some(output) = run_sbuild(&["build", "momo"], tmp.path()) else {
        return;
    };
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_status_json() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("VERSION"),
        "WEBRTC_BUILD_VERSION=m116.5845.6.1\nSORA_CPP_SDK_VERSION=2023.13.0\n",
    )
    .unwrap();
    let Some(output) = run_sbuild(&["status", "--platform", LINUX, "--json"], tmp.path()) else {
        return;
    };

    assert!(output.status.success(), "{}", stderr(&output));
    let statuses: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let statuses = statuses.as_array().unwrap();
    assert_eq!(statuses.len(), 8);
    assert_eq!(statuses[0]["name"], "webrtc");
    assert_eq!(statuses[0]["wanted"], "m116.5845.6.1");
    assert_eq!(statuses[0]["state"], "missing");
    assert_eq!(statuses[1]["name"], "llvm");
    assert_eq!(statuses[1]["state"], "unknown");
    assert_eq!(statuses[2]["name"], "boost");
    assert_eq!(statuses[2]["state"], "unpinned");
}

#[test]
fn test_status_local_checkout_rejected_on_linux() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("VERSION"), "WEBRTC_BUILD_VERSION=m116\n").unwrap();
    let args = ["status", "--platform", LINUX, "--sora-dir", "../sora-cpp-sdk"];
    let Some(output) = run_sbuild(&args, tmp.path()) else {
        return;
    };
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--sora-dir"), "{}", stderr(&output));
}

#[test]
fn test_clean_empty_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let Some(output) = run_sbuild(&["clean", "--platform", LINUX, "--all"], tmp.path()) else {
        return;
    };
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Nothing to clean"));
}

#[test]
fn test_completion_script() {
    let tmp = tempfile::tempdir().unwrap();
    let Some(output) = run_sbuild(&["completion", "bash"], tmp.path()) else {
        return;
    };
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("sbuild"));
}
