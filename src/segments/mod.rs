//! Segment filter removal for BI export content.
//!
//! Segment identifiers are local to one BI database, so exported questions
//! that filter on a segment cannot be imported into another database as-is.
pub mod filters;
pub mod pipeline;
pub mod tree;

pub use filters::{escape_bare_equals, remove_segment_filters, strip_segment_filters, FilterRemoval};
pub use pipeline::{remove_segments_in_archive, ArchiveReport, EXPORT_CONTENT_DIR};
pub use tree::{is_yaml_file, remove_segments_in_tree, TreeReport};
