//! Release archive extraction.
//!
//! Release tarballs wrap everything in a single `elasticsearch-<version>/`
//! folder. That folder is stripped so the payload lands directly in the
//! destination (e.g. `elasticsearch-8.9.0/bin/elasticsearch` becomes
//! `bin/elasticsearch`).

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use tar::Archive;

/// Extracts a tar.gz archive to the destination directory.
///
/// Creates the destination directory if it does not exist. If all entries
/// share a common root folder, it is stripped during extraction.
///
/// # Errors
///
/// Returns an error if:
/// - The archive cannot be opened or is not a valid tar.gz file
/// - An entry has an absolute path or a `..` component
/// - Directory or file creation fails
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let strip_prefix = find_common_root_folder(archive_path)?;

    let mut archive = open(archive_path)?;
    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;

        let entry_path = entry
            .path()
            .with_context(|| "Failed to get entry path")?
            .into_owned();

        if escapes_destination(&entry_path) {
            bail!(
                "Refusing to extract path with parent directory or absolute reference: {}",
                entry_path.display()
            );
        }

        let relative_path = match strip_prefix.as_deref().map(|p| entry_path.strip_prefix(p)) {
            Some(Ok(p)) if p.as_os_str().is_empty() => continue,
            Some(Ok(p)) => p.to_path_buf(),
            _ => entry_path,
        };

        let output_path = dest_dir.join(&relative_path);

        if entry.header().entry_type().is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
        } else {
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }

            entry
                .unpack(&output_path)
                .with_context(|| format!("Failed to extract: {}", output_path.display()))?;
        }
    }

    Ok(())
}

fn open(archive_path: &Path) -> Result<Archive<GzDecoder<std::fs::File>>> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    Ok(Archive::new(GzDecoder::new(file)))
}

fn escapes_destination(path: &Path) -> bool {
    path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir))
}

/// Finds a root folder shared by every entry.
///
/// Only returns a prefix when at least one entry is nested below it, so a
/// flat archive holding a single file keeps that file.
fn find_common_root_folder(archive_path: &Path) -> Result<Option<PathBuf>> {
    let mut archive = open(archive_path)?;

    let mut common_root: Option<PathBuf> = None;
    let mut has_nested_entries = false;

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;
        let path = entry.path().with_context(|| "Failed to get entry path")?;

        let mut components = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir));
        let Some(first) = components.next() else {
            continue;
        };
        if components.next().is_some() {
            has_nested_entries = true;
        }
        let root = PathBuf::from(first.as_os_str());

        match &common_root {
            None => common_root = Some(root),
            Some(existing) if existing != &root => return Ok(None),
            Some(_) => {}
        }
    }

    Ok(common_root.filter(|_| has_nested_entries))
}
