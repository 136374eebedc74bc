//! # sbuild CLI Entry Point
//!
//! Parses arguments with clap and routes to the handlers in the library.
//!
//! ## Commands
//!
//! - `build <sample>` - install dependencies, then compile the sample
//! - `status` - wanted vs. installed dependency versions
//! - `clean` - remove the build (or every) tree of a configuration
//! - `doctor` - check host tools
//! - `completion <shell>` - shell completion script

use anyhow::{Context, Result, anyhow};
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::{Path, PathBuf};

use sbuild::build::{self, BuildRequest};
use sbuild::commands;
use sbuild::deps::catalog::LocalOverrides;
use sbuild::error::NativeBuildError;
use sbuild::platform::{Platform, Sample};

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "sbuild")]
#[command(about = "Build the Sora C++ SDK samples", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Selects one `<platform>/<debug|release>` tree.
#[derive(Args)]
struct TreeArgs {
    /// Target platform [default: the host]
    #[arg(long, value_enum)]
    platform: Option<Platform>,
    /// Use the debug tree and build type
    #[arg(long)]
    debug: bool,
    /// Directory holding VERSION and the sample sources
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Install dependencies and compile a sample
    Build {
        /// Sample to build
        #[arg(value_enum)]
        sample: Sample,
        #[command(flatten)]
        tree: TreeArgs,
        /// Build with CMAKE_BUILD_TYPE=RelWithDebInfo (windows only)
        #[arg(long)]
        relwithdebinfo: bool,
        /// Build WebRTC from a local webrtc-build checkout (windows only)
        #[arg(long)]
        webrtc_build_dir: Option<PathBuf>,
        /// Extra arguments for webrtc-build's run.py (windows only)
        #[arg(long, allow_hyphen_values = true)]
        webrtc_build_args: Option<String>,
        /// Build Sora from a local sora-cpp-sdk checkout (windows only)
        #[arg(long)]
        sora_dir: Option<PathBuf>,
        /// Extra arguments for sora-cpp-sdk's run.py (windows only)
        #[arg(long, allow_hyphen_values = true)]
        sora_args: Option<String>,
        /// Reinstall every dependency even if its marker is current
        #[arg(long)]
        force: bool,
        /// Parallel compile jobs [default: CPU count]
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Print every command before running it
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show wanted and installed dependency versions
    Status {
        #[command(flatten)]
        tree: TreeArgs,
        /// Report WebRTC as built from a local checkout (windows only)
        #[arg(long)]
        webrtc_build_dir: Option<PathBuf>,
        /// Report Sora as built from a local checkout (windows only)
        #[arg(long)]
        sora_dir: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Remove build artifacts
    Clean {
        #[command(flatten)]
        tree: TreeArgs,
        /// Also remove downloaded sources and installed dependencies
        #[arg(long)]
        all: bool,
    },
    /// Check host tools
    Doctor {
        /// Directory holding VERSION
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

struct WindowsOnlyFlags<'a> {
    relwithdebinfo: bool,
    webrtc_build_dir: Option<&'a Path>,
    webrtc_build_args: Option<&'a str>,
    sora_dir: Option<&'a Path>,
    sora_args: Option<&'a str>,
}

impl WindowsOnlyFlags<'_> {
    /// Exit with a usage error when a flag is given for a non-Windows target.
    fn reject_unless_windows(&self, platform: Platform) {
        if platform.is_windows() {
            return;
        }
        if let Some(flag) = self.first_given() {
            Cli::command()
                .error(
                    ErrorKind::ArgumentConflict,
                    format!("{} is only supported for --platform windows_x86_64", flag),
                )
                .exit();
        }
    }

    /// Name of the first flag that was given.
    fn first_given(&self) -> Option<&'static str> {
        [
            ("--relwithdebinfo", self.relwithdebinfo),
            ("--webrtc-build-dir", self.webrtc_build_dir.is_some()),
            ("--webrtc-build-args", self.webrtc_build_args.is_some()),
            ("--sora-dir", self.sora_dir.is_some()),
            ("--sora-args", self.sora_args.is_some()),
        ]
        .into_iter()
        .find(|(_, given)| *given)
        .map(|(flag, _)| flag)
    }
}

fn resolve_platform(platform: Option<Platform>) -> Result<Platform> {
    platform.or_else(Platform::host).ok_or_else(|| {
        anyhow!(
            "Unsupported host {}/{}. Pass --platform explicitly.",
            std::env::consts::OS,
            std::env::consts::ARCH
        )
    })
}

fn resolve_base_dir(base_dir: &Path) -> Result<PathBuf> {
    std::path::absolute(base_dir)
        .with_context(|| format!("Invalid base directory {}", base_dir.display()))
}

/// Split a `--*-args` value with shell quoting rules.
fn split_args(flag: &str, value: Option<&str>) -> Result<Vec<String>> {
    match value {
        None => Ok(Vec::new()),
        Some(value) => {
            shlex::split(value).ok_or_else(|| anyhow!("{} has unbalanced quotes: {}", flag, value))
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Build {
            sample,
            tree,
            relwithdebinfo,
            webrtc_build_dir,
            webrtc_build_args,
            sora_dir,
            sora_args,
            force,
            jobs,
            verbose,
        } => {
            let platform = resolve_platform(tree.platform)?;
            WindowsOnlyFlags {
                relwithdebinfo,
                webrtc_build_dir: webrtc_build_dir.as_deref(),
                webrtc_build_args: webrtc_build_args.as_deref(),
                sora_dir: sora_dir.as_deref(),
                sora_args: sora_args.as_deref(),
            }
            .reject_unless_windows(platform);

            let overrides = LocalOverrides {
                webrtc_build_dir: webrtc_build_dir
                    .map(|dir| resolve_base_dir(&dir))
                    .transpose()?,
                webrtc_build_args: split_args("--webrtc-build-args", webrtc_build_args.as_deref())?,
                sora_dir: sora_dir.map(|dir| resolve_base_dir(&dir)).transpose()?,
                sora_args: split_args("--sora-args", sora_args.as_deref())?,
            };
            let request = BuildRequest {
                base_dir: resolve_base_dir(&tree.base_dir)?,
                sample,
                platform,
                debug: tree.debug,
                relwithdebinfo,
                overrides,
                force,
                jobs,
                verbose,
            };
            build::run_build(&request)
        }
        Commands::Status {
            tree,
            webrtc_build_dir,
            sora_dir,
            json,
        } => {
            let platform = resolve_platform(tree.platform)?;
            WindowsOnlyFlags {
                relwithdebinfo: false,
                webrtc_build_dir: webrtc_build_dir.as_deref(),
                webrtc_build_args: None,
                sora_dir: sora_dir.as_deref(),
                sora_args: None,
            }
            .reject_unless_windows(platform);
            let overrides = LocalOverrides {
                webrtc_build_dir: webrtc_build_dir
                    .map(|dir| resolve_base_dir(&dir))
                    .transpose()?,
                sora_dir: sora_dir.map(|dir| resolve_base_dir(&dir)).transpose()?,
                ..LocalOverrides::default()
            };
            commands::status::run_status(
                &resolve_base_dir(&tree.base_dir)?,
                platform,
                tree.debug,
                &overrides,
                json,
            )
        }
        Commands::Clean { tree, all } => {
            let platform = resolve_platform(tree.platform)?;
            commands::clean::run_clean(&resolve_base_dir(&tree.base_dir)?, platform, tree.debug, all)
        }
        Commands::Doctor { base_dir } => commands::doctor::run_doctor(&base_dir),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn main() {
    enable_windows_utf8_console();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("{} Error: {:#}", "x".red(), e);
        let code = e
            .downcast_ref::<NativeBuildError>()
            .map(NativeBuildError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_split_args_uses_shell_quoting() {
        let args = split_args("--sora-args", Some("--debug --cmake-args \"-DFOO=a b\"")).unwrap();
        assert_eq!(args, vec!["--debug", "--cmake-args", "-DFOO=a b"]);
        assert!(split_args("--sora-args", Some("\"unterminated")).is_err());
        assert!(split_args("--sora-args", None).unwrap().is_empty());
    }

    #[test]
    fn test_windows_only_flags() {
        let none = WindowsOnlyFlags {
            relwithdebinfo: false,
            webrtc_build_dir: None,
            webrtc_build_args: None,
            sora_dir: None,
            sora_args: None,
        };
        assert_eq!(none.first_given(), None);

        let sora = WindowsOnlyFlags {
            sora_dir: Some(Path::new("../sora-cpp-sdk")),
            ..none
        };
        assert_eq!(sora.first_given(), Some("--sora-dir"));
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from([
            "sbuild",
            "build",
            "sumomo",
            "--platform",
            "windows_x86_64",
            "--debug",
            "--sora-args",
            "--debug --foo",
        ])
        .unwrap();
        match cli.command {
            Commands::Build {
                sample,
                tree,
                sora_args,
                ..
            } => {
                assert_eq!(sample, Sample::Sumomo);
                assert_eq!(tree.platform, Some(Platform::WindowsX86_64));
                assert!(tree.debug);
                assert_eq!(sora_args.as_deref(), Some("--debug --foo"));
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_unknown_sample_rejected() {
        assert!(Cli::try_parse_from(["sbuild", "build", "momo"]).is_err());
    }
}
