//! `sbuild doctor`: check the host tools a build needs.

use crate::config::load_config;
use crate::layout::MANIFEST_FILE;
use crate::platform::Platform;
use crate::ui;
use anyhow::Result;
use colored::*;
use std::path::Path;
use std::process::Command;

/// First line of `<program> --version`, or `None` when it cannot be run.
fn tool_version(program: &str) -> Option<String> {
    let output = Command::new(program).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    // Older Pythons print their version on stderr.
    let first_line = stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("Detected");
    Some(first_line.to_string())
}

pub fn run_doctor(base_dir: &Path) -> Result<()> {
    println!("{} Running System Doctor...", "🚑".red());
    println!("-------------------------------");

    print!("Checking OS... ");
    println!(
        "{} ({})",
        std::env::consts::OS.green(),
        std::env::consts::ARCH.cyan()
    );

    print!("Checking platform... ");
    match Platform::host() {
        Some(platform) => println!("{}", platform.id().green()),
        None => println!(
            "{}",
            "Unsupported host (pass --platform explicitly)".yellow()
        ),
    }

    print!("Checking {}... ", MANIFEST_FILE);
    let manifest = base_dir.join(MANIFEST_FILE);
    if manifest.is_file() {
        println!("{}", "Found".green());
    } else {
        println!("{}", format!("Not Found ({})", manifest.display()).red());
    }

    let config = load_config(base_dir)?;
    let tools = [
        ("git", "Git", "Install Git"),
        ("cmake", "CMake", "Optional: downloaded on first build"),
        (config.tools.python(), "Python", "Needed for LLVM and local builds"),
    ];

    let mut table = ui::Table::new(&["Status", "Binary", "Name", "Version"]);
    for (bin, name, hint) in tools {
        let (status, version) = match tool_version(bin) {
            Some(version) => ("✓".green().to_string(), version),
            None => ("x".red().to_string(), format!("Not Found ({})", hint).dimmed().to_string()),
        };
        table.add_row(vec![status, bin.to_string(), name.to_string(), version]);
    }
    table.print();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_has_no_version() {
        assert_eq!(tool_version("sbuild-no-such-tool-xyz"), None);
    }

    #[test]
    fn test_doctor_runs_without_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        run_doctor(tmp.path()).unwrap();
    }
}
