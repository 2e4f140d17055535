//! Gzip-compressed tar helpers for BI export archives.

use crate::Result;
use anyhow::Context;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Extract `archive` into `dest`, creating `dest` when needed.
///
/// Entries that would land outside `dest` are skipped by the tar reader.
pub fn unpack(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive {}", archive.display()))?;
    fs::create_dir_all(dest)
        .with_context(|| format!("failed to create directory {}", dest.display()))?;

    let mut reader = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    reader
        .unpack(dest)
        .with_context(|| format!("failed to extract {}", archive.display()))?;

    tracing::debug!(archive = %archive.display(), dest = %dest.display(), "unpacked archive");
    Ok(())
}

/// Package every entry beneath `src` into `archive`, with paths relative to `src`.
pub fn pack(src: &Path, archive: &Path) -> Result<()> {
    if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let file = File::create(archive)
        .with_context(|| format!("failed to create archive {}", archive.display()))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.follow_symlinks(false);

    let mut entries = fs::read_dir(src)
        .with_context(|| format!("failed to list directory {}", src.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to read entries of {}", src.display()))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name();
        if entry.file_type()?.is_dir() {
            builder
                .append_dir_all(&name, &path)
                .with_context(|| format!("failed to add {} to archive", path.display()))?;
        } else {
            builder
                .append_path_with_name(&path, &name)
                .with_context(|| format!("failed to add {} to archive", path.display()))?;
        }
    }

    let encoder = builder
        .into_inner()
        .with_context(|| format!("failed to finish archive {}", archive.display()))?;
    encoder
        .finish()
        .with_context(|| format!("failed to flush archive {}", archive.display()))?;

    tracing::debug!(src = %src.display(), archive = %archive.display(), "packed archive");
    Ok(())
}

/// List the entry paths stored in `archive`, in archive order.
pub fn list_entries(archive: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive {}", archive.display()))?;
    let mut reader = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    let mut paths = Vec::new();
    for entry in reader
        .entries()
        .with_context(|| format!("failed to read {}", archive.display()))?
    {
        let entry = entry.with_context(|| format!("corrupt entry in {}", archive.display()))?;
        paths.push(entry.path()?.into_owned());
    }
    Ok(paths)
}
