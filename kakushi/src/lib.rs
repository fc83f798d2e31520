// kakushi/src/lib.rs
//! # Kakushi CLI
//!
//! The terminal front end for `kakushi-core`: sanitize a file or stdin,
//! scan without rewriting, batch-process a directory tree and list the
//! configured rules.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
