//! Child process invocation.
//!
//! Each command carries its own working directory and environment instead of
//! relying on the orchestrator's cwd. [`CommandRunner`] is the seam tests use
//! to record invocations without spawning anything.

use anyhow::{Context, Result};
use colored::*;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: PathBuf,
    pub env: BTreeMap<String, OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, current_dir: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: current_dir.to_path_buf(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: &str, value: impl Into<OsString>) -> Self {
        self.env.insert(key.to_string(), value.into());
        self
    }

    /// Shell-like rendering for logs and error messages.
    pub fn display(&self) -> String {
        let mut parts = vec![quote(&self.program.to_string_lossy())];
        parts.extend(self.args.iter().map(|a| quote(a)));
        parts.join(" ")
    }
}

fn quote(s: &str) -> String {
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("\"{}\"", s)
    } else {
        s.to_string()
    }
}

/// Runs an invocation to completion and reports its exit code.
pub trait CommandRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<i32>;

    /// Run and turn a non-zero exit into an error naming the command.
    fn run_checked(&mut self, invocation: &Invocation) -> Result<()> {
        let code = self.run(invocation)?;
        if code != 0 {
            anyhow::bail!(
                "Command exited with code {}: {}",
                code,
                invocation.display()
            );
        }
        Ok(())
    }
}

/// Spawns real processes, inheriting stdout/stderr so tool output reaches the
/// terminal.
#[derive(Debug, Default)]
pub struct SystemRunner {
    pub verbose: bool,
}

impl SystemRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<i32> {
        if self.verbose {
            println!(
                "   {} {} {}",
                "$".dimmed(),
                invocation.display().dimmed(),
                format!("(in {})", invocation.current_dir.display()).dimmed()
            );
        }

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.current_dir)
            .envs(&invocation.env)
            .status()
            .with_context(|| {
                format!(
                    "Failed to start '{}' - is it installed and on PATH?",
                    invocation.program.display()
                )
            })?;

        // Killed by a signal: no code, treat as a generic failure.
        Ok(status.code().unwrap_or(1))
    }
}

/// Number of parallel compile jobs to request from the native build.
pub fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Prepend directories to the inherited `PATH`.
pub fn path_with(extra: &[PathBuf]) -> Result<OsString> {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut dirs: Vec<PathBuf> = extra.to_vec();
    dirs.extend(std::env::split_paths(&current));
    std::env::join_paths(dirs).context("PATH entry contains an invalid separator")
}

/// Locate an executable in `extra` first, falling back to the bare name for
/// `PATH` lookup.
pub fn resolve_program(name: &str, extra: &[PathBuf]) -> PathBuf {
    let file_name = if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    };
    extra
        .iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(name))
}
