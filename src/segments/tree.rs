use crate::segments::filters::strip_segment_filters;
use crate::Result;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Summary of one pass over a directory tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TreeReport {
    /// YAML files that were read and written back.
    pub files_visited: Vec<PathBuf>,
    /// Files whose content changed.
    pub files_changed: usize,
    /// Segment filter blocks removed across all files.
    pub blocks_removed: usize,
}

/// Returns `true` when the file name carries a YAML extension.
pub fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}

/// Strip segment filters from every YAML file under `root`, rewriting each in place.
///
/// The first unreadable or unwritable file aborts the walk.
pub fn remove_segments_in_tree(root: &Path) -> Result<TreeReport> {
    let mut report = TreeReport::default();
    visit(root, &mut report)?;
    tracing::info!(
        root = %root.display(),
        files = report.files_visited.len(),
        changed = report.files_changed,
        blocks = report.blocks_removed,
        "removed segment filters"
    );
    Ok(report)
}

fn visit(dir: &Path, report: &mut TreeReport) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list directory {}", dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat {}", path.display()))?;

        if file_type.is_dir() {
            visit(&path, report)?;
        } else if file_type.is_file() && is_yaml_file(&path) {
            rewrite_file(&path, report)?;
        }
    }

    Ok(())
}

fn rewrite_file(path: &Path, report: &mut TreeReport) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let removal = strip_segment_filters(&content);

    if removal.changed_from(&content) {
        report.files_changed += 1;
        tracing::debug!(path = %path.display(), blocks = removal.blocks_removed, "rewriting");
    }
    report.blocks_removed += removal.blocks_removed;

    fs::write(path, removal.text.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    report.files_visited.push(path.to_path_buf());
    Ok(())
}
