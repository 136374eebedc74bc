//! Download, extraction and git primitives shared by the installers.
//!
//! ## Guarantees
//!
//! - Downloads land in `<file>.part` and are renamed when complete, so an
//!   archive that exists on disk is always whole.
//! - Archives are unpacked into a staging directory and renamed into place;
//!   a single top-level directory inside the archive is stripped.

use anyhow::{Context, Result, bail};
use colored::*;
use flate2::read::GzDecoder;
use git2::Repository;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Download `url` to `dest` unless `dest` already exists.
pub fn download(url: &str, dest: &Path) -> Result<PathBuf> {
    if dest.exists() {
        println!(
            "   {} Using cached {}",
            "⚡".green(),
            dest.file_name().unwrap_or_default().to_string_lossy()
        );
        return Ok(dest.to_path_buf());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    println!("   {} Downloading {}", "⬇".blue(), url.dimmed());
    let partial = partial_path(dest);
    match stream_to(url, &partial) {
        Ok(_) => fs::rename(&partial, dest)
            .with_context(|| format!("Failed to move download into {}", dest.display()))?,
        Err(e) => {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
    }
    Ok(dest.to_path_buf())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Bar when the server sends a length, spinner otherwise.
fn transfer_progress(length: Option<u64>) -> ProgressBar {
    match length {
        Some(total) => ProgressBar::new(total).with_style(
            ProgressStyle::default_bar()
                .template("   {spinner:.blue} [{bar:40.green/black}] {bytes}/{total_bytes} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━━╸"),
        ),
        None => ProgressBar::new_spinner().with_style(
            ProgressStyle::default_spinner()
                .template("   {spinner:.blue} {bytes} ({bytes_per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        ),
    }
}

/// Write the response body of `url` to `path`. A body shorter than its
/// `content-length` is an error.
fn stream_to(url: &str, path: &Path) -> Result<u64> {
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("Download failed: {}", url))?;
    let length = response.body().content_length();

    let pb = transfer_progress(length);
    let mut reader = pb.wrap_read(response.into_body().into_reader());
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let written = std::io::copy(&mut reader, &mut file)
        .with_context(|| format!("Connection dropped while downloading {}", url))?;
    file.sync_all()?;
    pb.finish_and_clear();

    if let Some(expected) = length
        && written != expected
    {
        bail!(
            "Truncated download of {}: got {} of {} bytes",
            url,
            written,
            expected
        );
    }
    Ok(written)
}

/// Unpack `archive` into `<output_dir>/<dirname>`, replacing whatever was
/// there.
pub fn extract(archive: &Path, output_dir: &Path, dirname: &str) -> Result<PathBuf> {
    let dest = output_dir.join(dirname);
    let staging = output_dir.join(format!(".{}.partial", dirname));

    println!("   {} Extracting into {}", "📦".blue(), dest.display());

    remove_dir_if_exists(&staging)?;
    fs::create_dir_all(&staging)?;

    let name = archive.to_string_lossy().to_ascii_lowercase();
    let unpacked = if name.ends_with(".zip") {
        extract_zip(archive, &staging)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(archive, &staging)
    } else {
        Err(anyhow::anyhow!(
            "Unsupported archive format: {}",
            archive.display()
        ))
    };
    if let Err(e) = unpacked {
        let _ = fs::remove_dir_all(&staging);
        return Err(e.context(format!("Failed to extract {}", archive.display())));
    }

    remove_dir_if_exists(&dest)?;
    match single_top_dir(&staging)? {
        Some(inner) => {
            fs::rename(&inner, &dest)
                .with_context(|| format!("Failed to move {} into place", inner.display()))?;
            fs::remove_dir_all(&staging)?;
        }
        None => {
            fs::rename(&staging, &dest)
                .with_context(|| format!("Failed to move {} into place", staging.display()))?;
        }
    }
    Ok(dest)
}

fn single_top_dir(dir: &Path) -> Result<Option<PathBuf>> {
    let entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    match entries.as_slice() {
        [only] if only.file_type()?.is_dir() => Ok(Some(only.path())),
        _ => Ok(None),
    }
}

fn extract_zip(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => continue,
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(p) = outpath.parent()
            && !p.exists()
        {
            fs::create_dir_all(p)?;
        }
        let mut outfile = File::create(&outpath)?;
        std::io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}

fn extract_tar_gz(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.unpack(target_dir)?;
    Ok(())
}

pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Fetch a single revision (commit hash or `refs/tags/<tag>`) of `url` into
/// `dest` with depth 1 and check it out. `dest` is recreated.
pub fn git_checkout_shallow(url: &str, rev: &str, dest: &Path) -> Result<()> {
    remove_dir_if_exists(dest)?;
    fs::create_dir_all(dest)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("   {spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷"),
    );
    pb.set_message(format!("Fetching {} @ {}", url, short_rev(rev)));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = fetch_revision(url, rev, dest);
    match &result {
        Ok(()) => pb.finish_with_message(format!(
            "{} Checked out {} @ {}",
            "✓".green(),
            url,
            short_rev(rev)
        )),
        Err(_) => pb.finish_with_message(format!("{} Failed {}", "x".red(), url)),
    }
    result
}

fn fetch_revision(url: &str, rev: &str, dest: &Path) -> Result<()> {
    let repo = Repository::init(dest)
        .with_context(|| format!("Failed to init repository at {}", dest.display()))?;
    let mut remote = repo.remote("origin", url)?;

    let mut options = git2::FetchOptions::new();
    options.depth(1);
    remote
        .fetch(&[rev], Some(&mut options), None)
        .with_context(|| format!("Failed to fetch {} from {}", rev, url))?;

    let mut fetched = None;
    repo.fetchhead_foreach(|_, _, oid, _| {
        fetched = Some(*oid);
        false
    })
    .ok();
    let oid = fetched.with_context(|| format!("Fetch of {} from {} returned nothing", rev, url))?;

    let commit = repo.find_object(oid, None)?.peel_to_commit()?;
    repo.set_head_detached(commit.id())?;
    let mut checkout_opts = git2::build::CheckoutBuilder::new();
    checkout_opts.force();
    repo.checkout_head(Some(&mut checkout_opts))
        .with_context(|| format!("Failed to checkout {}", rev))?;
    Ok(())
}

fn short_rev(rev: &str) -> &str {
    let rev = rev.strip_prefix("refs/tags/").unwrap_or(rev);
    if rev.len() > 12 && rev.chars().all(|c| c.is_ascii_hexdigit()) {
        &rev[..12]
    } else {
        rev
    }
}
