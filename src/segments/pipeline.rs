use crate::archive;
use crate::segments::tree::{remove_segments_in_tree, TreeReport};
use crate::Result;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Top-level directory of a BI serialization export that holds its YAML content.
pub const EXPORT_CONTENT_DIR: &str = "lime_bi_collections";

/// Outcome of rewriting an export archive.
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Subtree the YAML walk was applied to, relative to the extraction root.
    pub walked: PathBuf,
    pub tree: TreeReport,
}

/// Extract `input`, strip segment filters from its export content, and repack into `output`.
///
/// An archive without [`EXPORT_CONTENT_DIR`] is repacked unchanged.
pub fn remove_segments_in_archive(input: &Path, output: &Path) -> Result<ArchiveReport> {
    let workdir = tempfile::Builder::new()
        .prefix("bisync-export-")
        .tempdir()
        .context("failed to create extraction directory")?;
    let root = workdir.path();

    archive::unpack(input, root)?;

    let walk_root = root.join(EXPORT_CONTENT_DIR);
    let tree = if walk_root.is_dir() {
        remove_segments_in_tree(&walk_root)?
    } else {
        tracing::warn!(
            archive = %input.display(),
            "no {} directory in export, nothing to rewrite",
            EXPORT_CONTENT_DIR
        );
        TreeReport::default()
    };
    archive::pack(root, output)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        files = tree.files_visited.len(),
        blocks = tree.blocks_removed,
        "wrote export without segment filters"
    );

    Ok(ArchiveReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        walked: PathBuf::from(EXPORT_CONTENT_DIR),
        tree,
    })
}
