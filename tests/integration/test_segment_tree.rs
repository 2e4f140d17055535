use bisync::segments::remove_segments_in_tree;
use std::fs;
use tempfile::TempDir;

const CARD_WITH_SEGMENT: &str = "\
name: Active customers
dataset_query:
  query:
    filter:
    - and
    - - segment
      - 12
    - - =
      - - field
        - 3
        - null
      - true
";

const CARD_WITHOUT_SEGMENT: &str = "\
name: Orders
dataset_query:
  query:
    source-table: 9
";

#[test]
fn test_rewrites_only_yaml_files() {
    let dir = TempDir::new().unwrap();
    let cards = dir.path().join("collections/abc_acme/cards");
    fs::create_dir_all(&cards).unwrap();
    fs::write(cards.join("active.yaml"), CARD_WITH_SEGMENT).unwrap();
    fs::write(cards.join("orders.yml"), CARD_WITHOUT_SEGMENT).unwrap();
    fs::write(cards.join("notes.txt"), "- - segment\n  - 1\n").unwrap();

    let report = remove_segments_in_tree(dir.path()).unwrap();

    assert_eq!(report.files_visited.len(), 2);
    assert_eq!(report.files_changed, 1);
    assert_eq!(report.blocks_removed, 1);

    let active = fs::read_to_string(cards.join("active.yaml")).unwrap();
    assert!(!active.contains("segment"));
    assert!(active.contains("    - - \"=\"\n"));
    assert_eq!(
        fs::read_to_string(cards.join("orders.yml")).unwrap(),
        CARD_WITHOUT_SEGMENT
    );
    assert_eq!(
        fs::read_to_string(cards.join("notes.txt")).unwrap(),
        "- - segment\n  - 1\n"
    );
}

#[test]
fn test_second_pass_changes_nothing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("card.yaml"), CARD_WITH_SEGMENT).unwrap();

    remove_segments_in_tree(dir.path()).unwrap();
    let after_first = fs::read_to_string(dir.path().join("card.yaml")).unwrap();

    let report = remove_segments_in_tree(dir.path()).unwrap();
    assert_eq!(report.files_changed, 0);
    assert_eq!(report.blocks_removed, 0);
    assert_eq!(
        fs::read_to_string(dir.path().join("card.yaml")).unwrap(),
        after_first
    );
}

#[test]
fn test_empty_tree() {
    let dir = TempDir::new().unwrap();
    let report = remove_segments_in_tree(dir.path()).unwrap();
    assert!(report.files_visited.is_empty());
}

#[cfg(unix)]
#[test]
fn test_unreadable_yaml_aborts_walk() {
    let dir = TempDir::new().unwrap();
    // Invalid UTF-8 cannot be read as text.
    fs::write(dir.path().join("broken.yaml"), [0xff, 0xfe, 0x00]).unwrap();

    let err = remove_segments_in_tree(dir.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("broken.yaml"));
}
