//! Annotation diffing between what a host shows and what a fresh scan produced.
//!
//! Entries are keyed by the decorated range `(line, start_column, end_column)`;
//! the same range with a different number counts as relabeled.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use sq_core::Annotation;

/// Status of one diffed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiffStatus {
    /// Range labeled only in the new scan.
    Added,
    /// Range labeled only in the old scan.
    Removed,
    /// Range labeled in both, with different numbers.
    Relabeled,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub status: DiffStatus,
    /// The new annotation if present, else the old one.
    pub annotation: Annotation,
    /// Old label, set for relabeled entries.
    pub previous_label: Option<String>,
}

/// Complete diff result between two annotation sets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AnnotationDiff {
    pub entries: Vec<DiffEntry>,
    pub added: usize,
    pub removed: usize,
    pub relabeled: usize,
    pub unchanged: usize,
}

impl AnnotationDiff {
    /// Returns true if there are any differences.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.removed > 0 || self.relabeled > 0
    }

    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.added + self.removed + self.relabeled
    }
}

/// Compute the diff between two annotation sets.
#[must_use]
pub fn diff_annotations(old: &[Annotation], new: &[Annotation]) -> AnnotationDiff {
    let old_by_range: BTreeMap<_, &Annotation> =
        old.iter().map(|a| (a.range_key(), a)).collect();
    let new_by_range: BTreeMap<_, &Annotation> =
        new.iter().map(|a| (a.range_key(), a)).collect();

    let all_ranges: BTreeSet<(usize, usize, usize)> = old_by_range
        .keys()
        .chain(new_by_range.keys())
        .copied()
        .collect();

    let mut diff = AnnotationDiff::default();
    for range in all_ranges {
        let entry = match (old_by_range.get(&range), new_by_range.get(&range)) {
            (None, Some(added)) => {
                diff.added += 1;
                DiffEntry {
                    status: DiffStatus::Added,
                    annotation: (*added).clone(),
                    previous_label: None,
                }
            }
            (Some(removed), None) => {
                diff.removed += 1;
                DiffEntry {
                    status: DiffStatus::Removed,
                    annotation: (*removed).clone(),
                    previous_label: None,
                }
            }
            (Some(before), Some(after)) if before.label != after.label => {
                diff.relabeled += 1;
                DiffEntry {
                    status: DiffStatus::Relabeled,
                    annotation: (*after).clone(),
                    previous_label: Some(before.label.clone()),
                }
            }
            (Some(_), Some(after)) => {
                diff.unchanged += 1;
                DiffEntry {
                    status: DiffStatus::Unchanged,
                    annotation: (*after).clone(),
                    previous_label: None,
                }
            }
            (None, None) => continue,
        };
        diff.entries.push(entry);
    }

    diff
}

/// ANSI color codes for diff rendering.
pub mod colors {
    pub const ADDED: &str = "\x1b[32m"; // Green
    pub const REMOVED: &str = "\x1b[31m"; // Red
    pub const RELABELED: &str = "\x1b[33m"; // Yellow
    pub const UNCHANGED: &str = "\x1b[90m"; // Gray
    pub const RESET: &str = "\x1b[0m";
}

/// Render a one-block summary of a diff.
#[must_use]
pub fn render_diff_summary(diff: &AnnotationDiff, use_colors: bool) -> String {
    let rows = [
        (diff.added, colors::ADDED, '+', "added"),
        (diff.removed, colors::REMOVED, '-', "removed"),
        (diff.relabeled, colors::RELABELED, '~', "relabeled"),
        (diff.unchanged, colors::UNCHANGED, '=', "unchanged"),
    ];

    let mut output = String::from("Annotations:\n");
    for (count, color, marker, word) in rows {
        if count == 0 {
            continue;
        }
        if use_colors {
            output.push_str(color);
        }
        output.push_str(&format!("  {marker} {count} {word}\n"));
        if use_colors {
            output.push_str(colors::RESET);
        }
    }
    output
}
