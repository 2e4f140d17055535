use bisync::segments::{escape_bare_equals, remove_segment_filters, strip_segment_filters};
use proptest::prelude::*;

fn is_marker(line: &str) -> bool {
    line.trim_start().trim_end() == "- - segment"
}

/// Lines that look like the bodies of exported card queries.
fn yaml_line() -> impl Strategy<Value = String> {
    let indent = prop::sample::select(vec!["", "  ", "    ", "      "]);
    let body = prop::sample::select(vec![
        "- - segment",
        "- 12",
        "- - field",
        "- =",
        "- and",
        "- - =",
        "filter:",
        "source-table: 42",
        "name: Active customers",
        "- \"=\"",
        "",
    ]);
    (indent, body).prop_map(|(indent, body)| {
        if body.is_empty() {
            String::new()
        } else {
            format!("{}{}", indent, body)
        }
    })
}

fn yaml_document() -> impl Strategy<Value = String> {
    (prop::collection::vec(yaml_line(), 0..24), any::<bool>()).prop_map(|(lines, trailing)| {
        let mut doc = lines.join("\n");
        if trailing && !doc.is_empty() {
            doc.push('\n');
        }
        doc
    })
}

proptest! {
    #[test]
    fn removal_is_idempotent(doc in yaml_document()) {
        let once = remove_segment_filters(&doc);
        let twice = remove_segment_filters(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn output_has_no_segment_markers(doc in yaml_document()) {
        let out = remove_segment_filters(&doc);
        prop_assert!(!out.lines().any(is_marker));
    }

    #[test]
    fn filter_free_documents_only_get_escaped(doc in yaml_document()) {
        prop_assume!(!doc.lines().any(is_marker));
        let escaped = escape_bare_equals(&doc).into_owned();
        prop_assert_eq!(remove_segment_filters(&doc), escaped);
    }

    #[test]
    fn surviving_lines_keep_their_order(doc in yaml_document()) {
        let escaped = escape_bare_equals(&doc).into_owned();
        let out = remove_segment_filters(&doc);
        let mut source = escaped.lines();
        for line in out.lines() {
            prop_assert!(source.any(|candidate| candidate == line));
        }
    }
}

#[test]
fn test_single_block_document() {
    let input = "filters:\n  - - segment\n      - 12\n      - 34\nother: value\n";
    assert_eq!(remove_segment_filters(input), "filters:\nother: value\n");
}

#[test]
fn test_two_separate_blocks() {
    let input = "\
name: Churn
query:
  filter:
  - and
  - - segment
    - 7
  - - '>'
    - - field
      - 11
      - null
    - 5
description: keep me
breakout:
- - segment
  - 9
limit: 10
";
    let expected = "\
name: Churn
query:
  filter:
  - and
  - - '>'
    - - field
      - 11
      - null
    - 5
description: keep me
breakout:
limit: 10
";
    let removal = strip_segment_filters(input);
    assert_eq!(removal.text, expected);
    assert_eq!(removal.blocks_removed, 2);
}

#[test]
fn test_equals_escaped_without_filters() {
    let input = "filter:\n- =\n- - field\n  - 3\n";
    assert_eq!(
        remove_segment_filters(input),
        "filter:\n- \"=\"\n- - field\n  - 3\n"
    );
}

#[test]
fn test_equals_with_trailing_space_is_escaped() {
    let input = "filter:\n- = \n- - segment\n  - 4\n";
    assert_eq!(remove_segment_filters(input), "filter:\n- \"=\" \n");
}

#[test]
fn test_trailing_block_leaves_no_blank_lines() {
    let input = "name: x\nfilter:\n- - segment\n  - 4\n";
    assert_eq!(remove_segment_filters(input), "name: x\nfilter:\n");

    let no_newline = "name: x\nfilter:\n- - segment\n  - 4";
    assert_eq!(remove_segment_filters(no_newline), "name: x\nfilter:\n");
}

#[test]
fn test_output_is_still_valid_yaml() {
    let input = "\
name: Revenue by segment
dataset_query:
  query:
    filter:
    - and
    - - segment
      - 3
    - - =
      - - field
        - 21
        - null
      - open
    source-table: 8
";
    let out = remove_segment_filters(input);
    let doc: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();

    let filter = &doc["dataset_query"]["query"]["filter"];
    let clauses = filter.as_sequence().unwrap();
    assert_eq!(clauses.len(), 2);
    assert_eq!(clauses[0].as_str(), Some("and"));
    assert_eq!(clauses[1][0].as_str(), Some("="));
    assert_eq!(doc["dataset_query"]["query"]["source-table"].as_i64(), Some(8));
}
