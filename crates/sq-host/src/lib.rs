#![forbid(unsafe_code)]

//! Host integration for sequence-number annotations.
//!
//! The core in `sq-parser` is a pure function of document text. This crate adds
//! the stateful pieces an editor needs: remembering what is shown, applying the
//! size ceiling and reacting to configuration changes.

pub mod diff;
mod session;

pub use diff::{AnnotationDiff, DiffEntry, DiffStatus, diff_annotations, render_diff_summary};
pub use session::{
    AnnotationSession, AnnotationSink, AnnotationUpdate, DocumentSnapshot, HostEvent,
    SessionError,
};
