//! Rule compilation for the pattern detector.
//!
//! This module turns `PatternRule`s into compiled regular expressions
//! (look-around included) and caches the result per configuration so that
//! many engines built from the same configuration share one compiled set.

pub mod compiler;
