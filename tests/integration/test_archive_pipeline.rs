use bisync::archive;
use bisync::segments::{remove_segments_in_archive, EXPORT_CONTENT_DIR};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CARD: &str = "\
name: Segment card
dataset_query:
  query:
    filter:
    - - segment
      - 5
    source-table: 2
";

const STRIPPED_CARD: &str =
    "name: Segment card\ndataset_query:\n  query:\n    filter:\n    source-table: 2\n";

fn build_export(root: &Path) {
    let content = root.join(EXPORT_CONTENT_DIR);
    let collection = content.join("collections/x1_acme");
    fs::create_dir_all(collection.join("cards")).unwrap();
    fs::create_dir_all(content.join("dashboards")).unwrap();
    fs::write(collection.join("x1_acme.yaml"), "name: acme\n").unwrap();
    fs::write(collection.join("cards/segment_card.yaml"), CARD).unwrap();
    fs::write(content.join("dashboards/overview.yaml"), CARD).unwrap();
    fs::write(root.join("settings.yaml"), "- - segment\n  - 1\n").unwrap();
}

#[test]
fn test_strips_filters_across_export_content() {
    let workdir = TempDir::new().unwrap();
    let staging = workdir.path().join("staging");
    build_export(&staging);
    let input = workdir.path().join("export.tar.gz");
    let output = workdir.path().join("export-without-segments.tar.gz");
    archive::pack(&staging, &input).unwrap();

    let report = remove_segments_in_archive(&input, &output).unwrap();
    assert_eq!(report.walked, PathBuf::from(EXPORT_CONTENT_DIR));
    assert_eq!(report.tree.files_visited.len(), 3);
    assert_eq!(report.tree.blocks_removed, 2);

    let unpacked = workdir.path().join("unpacked");
    archive::unpack(&output, &unpacked).unwrap();
    let content = unpacked.join(EXPORT_CONTENT_DIR);
    assert_eq!(
        fs::read_to_string(content.join("collections/x1_acme/cards/segment_card.yaml")).unwrap(),
        STRIPPED_CARD
    );
    assert_eq!(
        fs::read_to_string(content.join("dashboards/overview.yaml")).unwrap(),
        STRIPPED_CARD
    );

    // Files beside the export content are carried over untouched.
    assert_eq!(
        fs::read_to_string(unpacked.join("settings.yaml")).unwrap(),
        "- - segment\n  - 1\n"
    );
}

#[test]
fn test_archive_entries_keep_relative_layout() {
    let workdir = TempDir::new().unwrap();
    let staging = workdir.path().join("staging");
    build_export(&staging);
    let input = workdir.path().join("in.tar.gz");
    let output = workdir.path().join("out/clean.tar.gz");
    archive::pack(&staging, &input).unwrap();

    remove_segments_in_archive(&input, &output).unwrap();

    let card = Path::new(EXPORT_CONTENT_DIR).join("collections/x1_acme/cards/segment_card.yaml");
    let entries = archive::list_entries(&output).unwrap();
    assert!(entries.contains(&card));
    assert!(entries.iter().all(|path| path.is_relative()));
    assert!(input.exists());
}

#[test]
fn test_export_without_content_dir_is_repacked_unchanged() {
    let workdir = TempDir::new().unwrap();
    let staging = workdir.path().join("staging");
    fs::create_dir_all(staging.join("collections")).unwrap();
    fs::write(staging.join("collections/card.yaml"), CARD).unwrap();
    let input = workdir.path().join("export.tar.gz");
    let output = workdir.path().join("stripped.tar.gz");
    archive::pack(&staging, &input).unwrap();

    let report = remove_segments_in_archive(&input, &output).unwrap();
    assert!(report.tree.files_visited.is_empty());
    assert_eq!(report.tree.blocks_removed, 0);

    let unpacked = workdir.path().join("unpacked");
    archive::unpack(&output, &unpacked).unwrap();
    assert_eq!(
        fs::read_to_string(unpacked.join("collections/card.yaml")).unwrap(),
        CARD
    );
}

#[test]
fn test_missing_input_archive_fails() {
    let workdir = TempDir::new().unwrap();
    let err = remove_segments_in_archive(
        &workdir.path().join("export.tar.gz"),
        &workdir.path().join("out.tar.gz"),
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("export.tar.gz"));
    assert!(!workdir.path().join("out.tar.gz").exists());
}
