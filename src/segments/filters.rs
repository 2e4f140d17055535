//! Line-oriented removal of segment filter clauses from exported YAML.
//!
//! Exports are edited as raw text so that untouched content keeps its exact
//! formatting. A segment filter block looks like:
//!
//! ```yaml
//! filter:
//! - and
//! - - segment
//!   - 12
//! - - =
//!   - - field
//! ```
//!
//! The marker line `- - segment` plus every directly following sequence item
//! indented deeper than the marker is one block. Sibling clauses at the
//! marker's own indentation end the block.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Result of stripping segment filters from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRemoval {
    /// Document text after escaping and removal.
    pub text: String,
    /// Number of segment filter blocks removed.
    pub blocks_removed: usize,
}

impl FilterRemoval {
    pub fn changed_from(&self, original: &str) -> bool {
        self.text != original
    }
}

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<indent>[ \t]*)- - segment[ \t]*$").expect("valid segment marker regex")
    })
}

fn continuation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<indent>[ \t]+)- .+$").expect("valid continuation regex")
    })
}

fn bare_equals_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?m)^(?P<item>[ \t]*(?:- )+)=(?P<tail>[ \t]*\r?)$"#)
            .expect("valid equals regex")
    })
}

/// Remove every segment filter block, returning the rewritten document.
pub fn remove_segment_filters(yaml: &str) -> String {
    strip_segment_filters(yaml).text
}

/// Escape bare `=` sequence items, then remove every segment filter block.
pub fn strip_segment_filters(yaml: &str) -> FilterRemoval {
    let escaped = escape_bare_equals(yaml);
    remove_blocks(&escaped)
}

/// Quote sequence items whose whole value is `=` so YAML consumers read a string.
pub fn escape_bare_equals(yaml: &str) -> Cow<'_, str> {
    bare_equals_pattern().replace_all(yaml, "${item}\"=\"${tail}")
}

fn remove_blocks(yaml: &str) -> FilterRemoval {
    let mut text = String::with_capacity(yaml.len());
    let mut blocks_removed = 0;
    let mut open_block: Option<usize> = None;

    for line in yaml.split_inclusive('\n') {
        let content = line.trim_end_matches(&['\n', '\r'][..]);

        if let Some(marker_indent) = open_block {
            if continuation_indent(content).is_some_and(|indent| indent > marker_indent) {
                continue;
            }
            open_block = None;
        }

        if let Some(indent) = marker_indent(content) {
            open_block = Some(indent);
            blocks_removed += 1;
            continue;
        }

        text.push_str(line);
    }

    FilterRemoval {
        text,
        blocks_removed,
    }
}

fn marker_indent(line: &str) -> Option<usize> {
    marker_pattern()
        .captures(line)
        .and_then(|caps| caps.name("indent"))
        .map(|indent| indent.as_str().len())
}

fn continuation_indent(line: &str) -> Option<usize> {
    continuation_pattern()
        .captures(line)
        .and_then(|caps| caps.name("indent"))
        .map(|indent| indent.as_str().len())
}
