//! `sbuild clean`: remove a configuration's build tree.
//!
//! - `sbuild clean` - remove `_build/<platform>/<debug|release>`
//! - `sbuild clean --all` - also remove the source and install trees, so every
//!   dependency is downloaded and installed again on the next build

use crate::config::load_config;
use crate::layout::Layout;
use crate::platform::Platform;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::Path;

pub fn run_clean(base_dir: &Path, platform: Platform, debug: bool, all: bool) -> Result<()> {
    let config = load_config(base_dir)?;
    let layout = Layout::new(base_dir, platform, debug, &config);

    let mut targets = vec![&layout.build_dir];
    if all {
        targets.push(&layout.source_dir);
        targets.push(&layout.install_dir);
    }

    let mut cleaned = false;
    for dir in targets {
        if dir.exists() {
            fs::remove_dir_all(dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
            println!("{} Removed {}", "🗑️".red(), dir.display());
            cleaned = true;
        }
    }

    if cleaned {
        println!("{} Clean complete.", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    Ok(())
}
