//! Span conflict resolution.
//!
//! Detections from the pattern detector and the entity recognizer are merged
//! into a non-overlapping, left-to-right cover by greedy interval selection:
//! earliest start wins, and among equal starts the longest span wins. This is
//! not maximum interval scheduling; it favors the leftmost, widest reading of
//! the text and is fully deterministic.

use std::cmp::Reverse;

use crate::detection::Detection;

/// Detections accepted by the merger.
///
/// Invariant: sorted ascending by `start` and pairwise non-overlapping
/// (`spans[i].end <= spans[i + 1].start`). The only constructors enforce it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptedSpans {
    spans: Vec<Detection>,
}

impl AcceptedSpans {
    /// Wraps spans that are already ordered and disjoint. Returns `None`
    /// if the invariant does not hold or a span is empty.
    pub fn from_ordered(spans: Vec<Detection>) -> Option<Self> {
        let ordered = spans.iter().all(|d| d.start < d.end)
            && spans.windows(2).all(|w| w[0].end <= w[1].start);
        ordered.then_some(Self { spans })
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Ascending by start.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Detection> {
        self.spans.iter()
    }

    /// Descending by start: the order in which substitutions can be spliced
    /// without invalidating offsets of the spans still to be processed.
    pub fn iter_descending(&self) -> impl Iterator<Item = &Detection> {
        self.spans.iter().rev()
    }

    pub fn into_vec(self) -> Vec<Detection> {
        self.spans
    }
}

/// Greedy interval selection over raw detections.
///
/// 1. Sort by `(start asc, end desc)`. The sort is stable, so exact
///    duplicates keep their input order (pattern detections first when the
///    caller concatenates patterns before entities).
/// 2. Accept a detection iff it starts at or after the end of the last
///    accepted one.
pub fn merge_detections(mut detections: Vec<Detection>) -> AcceptedSpans {
    detections.sort_by_key(|d| (d.start, Reverse(d.end)));

    let mut accepted: Vec<Detection> = Vec::with_capacity(detections.len());
    let mut last_end = 0usize;

    for detection in detections {
        if detection.start >= last_end && detection.start < detection.end {
            last_end = detection.end;
            accepted.push(detection);
        }
    }

    AcceptedSpans { spans: accepted }
}
