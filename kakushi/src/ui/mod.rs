// kakushi/src/ui/mod.rs
//! Terminal presentation: themes, messages, diffs and summary tables.

pub mod diff_viewer;
pub mod output_format;
pub mod summary;
pub mod theme;
