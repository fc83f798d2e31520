// kakushi-core/src/engines/mod.rs
//! Detector and engine implementations.
//!
//! * `pattern_detector`: labeled regex rules over the whole input.
//! * `gazetteer`: a dictionary-backed `EntityRecognizer`.
//! * `sanitize_engine`: the `SanitizationEngine` combining both.
//!
//! # License
//! MIT OR APACHE 2.0

pub mod gazetteer;
pub mod pattern_detector;
pub mod sanitize_engine;
