//! Observer-style host boundary.
//!
//! A host forwards editor events into [`AnnotationSession::handle`] and applies
//! the returned [`AnnotationUpdate`]s through its [`AnnotationSink`]. The
//! session owns the configuration and what is currently shown per document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sq_core::{Annotation, AnnotatorConfig, ConfigError, DocumentKind, document_line_count};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::diff::{AnnotationDiff, diff_annotations};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One document as the host sees it at the moment of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub uri: String,
    pub kind: DocumentKind,
    pub text: String,
}

impl DocumentSnapshot {
    #[must_use]
    pub fn new(uri: impl Into<String>, kind: DocumentKind, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            kind,
            text: text.into(),
        }
    }
}

/// Editor events a host forwards to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostEvent {
    /// A document became visible; its labels are re-sent even if unchanged.
    Opened(DocumentSnapshot),
    Changed(DocumentSnapshot),
    /// Cursor or selection moved. Treated like a change.
    SelectionChanged(DocumentSnapshot),
    Closed { uri: String },
    ConfigChanged(AnnotatorConfig),
}

/// What the host must do with its decorations for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AnnotationUpdate {
    /// Replace all labels on the document.
    Replace {
        uri: String,
        annotations: Vec<Annotation>,
        diff: AnnotationDiff,
    },
    /// Same labels, new placement or styling.
    Restyle {
        uri: String,
        annotations: Vec<Annotation>,
    },
    /// Remove every label from the document.
    Clear { uri: String },
    /// Labels on screen are already correct.
    Unchanged { uri: String },
}

impl AnnotationUpdate {
    #[must_use]
    pub fn uri(&self) -> &str {
        match self {
            Self::Replace { uri, .. }
            | Self::Restyle { uri, .. }
            | Self::Clear { uri }
            | Self::Unchanged { uri } => uri,
        }
    }

    /// Apply this update through a host sink.
    pub fn apply_to<S: AnnotationSink + ?Sized>(&self, sink: &mut S, config: &AnnotatorConfig) {
        match self {
            Self::Replace {
                uri, annotations, ..
            }
            | Self::Restyle { uri, annotations } => sink.replace(uri, annotations, config),
            Self::Clear { uri } => sink.clear(uri),
            Self::Unchanged { .. } => {}
        }
    }
}

/// Host-side decoration surface.
pub trait AnnotationSink {
    /// Show exactly `annotations` on `uri`, styled per `config`.
    fn replace(&mut self, uri: &str, annotations: &[Annotation], config: &AnnotatorConfig);
    fn clear(&mut self, uri: &str);
}

/// Keeps annotations for open documents in sync with their text.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSession {
    config: AnnotatorConfig,
    shown: BTreeMap<String, Vec<Annotation>>,
}

impl AnnotationSession {
    pub fn new(config: AnnotatorConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            config,
            shown: BTreeMap::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Labels currently shown for `uri`, if any.
    #[must_use]
    pub fn annotations(&self, uri: &str) -> Option<&[Annotation]> {
        self.shown.get(uri).map(Vec::as_slice)
    }

    /// Uris of documents currently showing labels.
    pub fn tracked_documents(&self) -> impl Iterator<Item = &str> {
        self.shown.keys().map(String::as_str)
    }

    /// React to one host event.
    ///
    /// Text events yield exactly one update. `ConfigChanged` yields one
    /// `Restyle` per document showing labels. `Closed` and ignored documents
    /// yield nothing.
    pub fn handle(&mut self, event: HostEvent) -> Result<Vec<AnnotationUpdate>, SessionError> {
        match event {
            HostEvent::Opened(snapshot) => Ok(self.refresh(snapshot, true).into_iter().collect()),
            HostEvent::Changed(snapshot) | HostEvent::SelectionChanged(snapshot) => {
                Ok(self.refresh(snapshot, false).into_iter().collect())
            }
            HostEvent::Closed { uri } => {
                if self.shown.remove(&uri).is_some() {
                    debug!(uri = %uri, "dropped annotations for closed document");
                }
                Ok(Vec::new())
            }
            HostEvent::ConfigChanged(config) => self.set_config(config),
        }
    }

    /// Handle an event and apply every resulting update to `sink`.
    pub fn dispatch<S: AnnotationSink + ?Sized>(
        &mut self,
        event: HostEvent,
        sink: &mut S,
    ) -> Result<Vec<AnnotationUpdate>, SessionError> {
        let updates = self.handle(event)?;
        for update in &updates {
            update.apply_to(sink, &self.config);
        }
        Ok(updates)
    }

    /// Replace the configuration; invalid values leave the session untouched.
    pub fn set_config(
        &mut self,
        config: AnnotatorConfig,
    ) -> Result<Vec<AnnotationUpdate>, SessionError> {
        config.validate()?;
        info!(
            max_lines = config.max_lines,
            placement = %config.placement,
            theme = config.theme.as_str(),
            "annotator configuration updated"
        );
        self.config = config;
        Ok(self
            .shown
            .iter()
            .map(|(uri, annotations)| AnnotationUpdate::Restyle {
                uri: uri.clone(),
                annotations: annotations.clone(),
            })
            .collect())
    }

    /// `force` re-sends labels even when they match what is already shown.
    fn refresh(&mut self, snapshot: DocumentSnapshot, force: bool) -> Option<AnnotationUpdate> {
        let DocumentSnapshot { uri, kind, text } = snapshot;
        if kind == DocumentKind::Other {
            if self.shown.contains_key(&uri) {
                debug!(uri = %uri, "document no longer annotatable; clearing labels");
                return Some(self.clear(uri));
            }
            trace!(uri = %uri, "ignoring document of unsupported kind");
            return None;
        }

        if !self.config.allows_document(&text) {
            debug!(
                uri = %uri,
                lines = document_line_count(&text),
                max_lines = self.config.max_lines,
                "document exceeds max-lines; not annotating"
            );
            return Some(self.clear(uri));
        }

        let annotations = sq_parser::annotate(&text, kind);
        let previous = self.shown.get(&uri).map_or(&[][..], Vec::as_slice);
        let diff = diff_annotations(previous, &annotations);

        if annotations.is_empty() {
            return Some(self.clear(uri));
        }
        if !force && !diff.has_changes() && self.shown.contains_key(&uri) {
            return Some(AnnotationUpdate::Unchanged { uri });
        }

        debug!(
            uri = %uri,
            count = annotations.len(),
            added = diff.added,
            removed = diff.removed,
            relabeled = diff.relabeled,
            "annotations updated"
        );
        self.shown.insert(uri.clone(), annotations.clone());
        Some(AnnotationUpdate::Replace {
            uri,
            annotations,
            diff,
        })
    }

    fn clear(&mut self, uri: String) -> AnnotationUpdate {
        if self.shown.remove(&uri).is_some() {
            AnnotationUpdate::Clear { uri }
        } else {
            AnnotationUpdate::Unchanged { uri }
        }
    }
}

#[cfg(test)]
mod tests {
    use sq_core::{Annotation, AnnotatorConfig, ConfigError, DocumentKind, Placement};

    use super::{
        AnnotationSession, AnnotationSink, AnnotationUpdate, DocumentSnapshot, HostEvent,
        SessionError,
    };

    const DIAGRAM: &str = "sequenceDiagram\nautonumber\nAlice->>Bob: Hello\nBob-->>Alice: Hi";

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<String>,
    }

    impl AnnotationSink for RecordingSink {
        fn replace(&mut self, uri: &str, annotations: &[Annotation], config: &AnnotatorConfig) {
            self.calls.push(format!(
                "replace {uri} {} {}",
                annotations.len(),
                config.placement
            ));
        }

        fn clear(&mut self, uri: &str) {
            self.calls.push(format!("clear {uri}"));
        }
    }

    fn changed(uri: &str, kind: DocumentKind, text: &str) -> HostEvent {
        HostEvent::Changed(DocumentSnapshot::new(uri, kind, text))
    }

    fn session() -> AnnotationSession {
        AnnotationSession::new(AnnotatorConfig::default()).expect("default config is valid")
    }

    #[test]
    fn first_change_replaces_then_identical_change_is_unchanged() {
        let mut session = session();
        let updates = session
            .handle(changed("a.mmd", DocumentKind::Mermaid, DIAGRAM))
            .expect("handle");
        assert!(matches!(
            updates.as_slice(),
            [AnnotationUpdate::Replace { annotations, diff, .. }]
                if annotations.len() == 2 && diff.added == 2
        ));

        let updates = session
            .handle(HostEvent::SelectionChanged(DocumentSnapshot::new(
                "a.mmd",
                DocumentKind::Mermaid,
                DIAGRAM,
            )))
            .expect("handle");
        assert_eq!(
            updates,
            vec![AnnotationUpdate::Unchanged {
                uri: "a.mmd".to_string()
            }]
        );
    }

    #[test]
    fn removing_autonumber_clears_shown_labels() {
        let mut session = session();
        session
            .handle(changed("a.mmd", DocumentKind::Mermaid, DIAGRAM))
            .expect("handle");
        let without = DIAGRAM.replace("autonumber\n", "");
        let updates = session
            .handle(changed("a.mmd", DocumentKind::Mermaid, &without))
            .expect("handle");
        assert_eq!(
            updates,
            vec![AnnotationUpdate::Clear {
                uri: "a.mmd".to_string()
            }]
        );
        assert!(session.annotations("a.mmd").is_none());
    }

    #[test]
    fn other_kinds_are_ignored() {
        let mut session = session();
        let updates = session
            .handle(changed("notes.txt", DocumentKind::Other, DIAGRAM))
            .expect("handle");
        assert!(updates.is_empty());
        assert_eq!(session.tracked_documents().count(), 0);
    }

    #[test]
    fn switching_to_other_kind_clears_shown_labels() {
        let mut session = session();
        session
            .handle(changed("a.mmd", DocumentKind::Mermaid, DIAGRAM))
            .expect("handle");
        let updates = session
            .handle(changed("a.mmd", DocumentKind::Other, DIAGRAM))
            .expect("handle");
        assert_eq!(
            updates,
            vec![AnnotationUpdate::Clear {
                uri: "a.mmd".to_string()
            }]
        );
        assert!(session.annotations("a.mmd").is_none());

        let updates = session
            .handle(changed("a.mmd", DocumentKind::Other, DIAGRAM))
            .expect("handle");
        assert!(updates.is_empty());
    }

    #[test]
    fn opened_without_numbering_clears_previous_labels() {
        let mut session = session();
        session
            .handle(changed("a.mmd", DocumentKind::Mermaid, DIAGRAM))
            .expect("handle");
        let updates = session
            .handle(HostEvent::Opened(DocumentSnapshot::new(
                "a.mmd",
                DocumentKind::Mermaid,
                "sequenceDiagram\nAlice->>Bob: Hello",
            )))
            .expect("handle");
        assert_eq!(
            updates,
            vec![AnnotationUpdate::Clear {
                uri: "a.mmd".to_string()
            }]
        );
    }

    #[test]
    fn oversized_document_clears_previous_labels() {
        let config = AnnotatorConfig {
            max_lines: 4,
            ..AnnotatorConfig::default()
        };
        let mut session = AnnotationSession::new(config).expect("valid");
        session
            .handle(changed("a.mmd", DocumentKind::Mermaid, DIAGRAM))
            .expect("handle");
        assert!(session.annotations("a.mmd").is_some());

        let grown = format!("{DIAGRAM}\nAlice->>Bob: again");
        let updates = session
            .handle(changed("a.mmd", DocumentKind::Mermaid, &grown))
            .expect("handle");
        assert_eq!(
            updates,
            vec![AnnotationUpdate::Clear {
                uri: "a.mmd".to_string()
            }]
        );

        let updates = session
            .handle(changed("a.mmd", DocumentKind::Mermaid, &grown))
            .expect("handle");
        assert!(matches!(updates.as_slice(), [AnnotationUpdate::Unchanged { .. }]));
    }

    #[test]
    fn opened_forces_a_replace_for_known_documents() {
        let mut session = session();
        session
            .handle(changed("a.mmd", DocumentKind::Mermaid, DIAGRAM))
            .expect("handle");
        let updates = session
            .handle(HostEvent::Opened(DocumentSnapshot::new(
                "a.mmd",
                DocumentKind::Mermaid,
                DIAGRAM,
            )))
            .expect("handle");
        assert!(matches!(updates.as_slice(), [AnnotationUpdate::Replace { .. }]));
    }

    #[test]
    fn closed_drops_state() {
        let mut session = session();
        session
            .handle(changed("a.mmd", DocumentKind::Mermaid, DIAGRAM))
            .expect("handle");
        let updates = session
            .handle(HostEvent::Closed {
                uri: "a.mmd".to_string(),
            })
            .expect("handle");
        assert!(updates.is_empty());
        assert!(session.annotations("a.mmd").is_none());
    }

    #[test]
    fn config_change_restyles_every_tracked_document() {
        let mut session = session();
        let markdown = format!("# Doc\n\n```mermaid\n{DIAGRAM}\n```\n");
        session
            .handle(changed("a.mmd", DocumentKind::Mermaid, DIAGRAM))
            .expect("handle");
        session
            .handle(changed("b.md", DocumentKind::Markdown, &markdown))
            .expect("handle");

        let config = AnnotatorConfig {
            placement: Placement::After,
            ..AnnotatorConfig::default()
        };
        let updates = session
            .handle(HostEvent::ConfigChanged(config))
            .expect("handle");
        let uris: Vec<&str> = updates.iter().map(AnnotationUpdate::uri).collect();
        assert_eq!(uris, vec!["a.mmd", "b.md"]);
        assert!(
            updates
                .iter()
                .all(|update| matches!(update, AnnotationUpdate::Restyle { .. }))
        );
        assert_eq!(session.config().placement, Placement::After);
    }

    #[test]
    fn invalid_config_is_rejected_and_kept_out() {
        let mut session = session();
        let bad = AnnotatorConfig {
            max_lines: 0,
            ..AnnotatorConfig::default()
        };
        let err = session
            .handle(HostEvent::ConfigChanged(bad))
            .expect_err("zero max-lines");
        assert!(matches!(err, SessionError::Config(ConfigError::ZeroMaxLines)));
        assert_eq!(session.config(), &AnnotatorConfig::default());
    }

    #[test]
    fn dispatch_drives_the_sink() {
        let mut session = session();
        let mut sink = RecordingSink::default();
        session
            .dispatch(changed("a.mmd", DocumentKind::Mermaid, DIAGRAM), &mut sink)
            .expect("dispatch");
        session
            .dispatch(changed("a.mmd", DocumentKind::Mermaid, DIAGRAM), &mut sink)
            .expect("dispatch");
        session
            .dispatch(changed("a.mmd", DocumentKind::Mermaid, "sequenceDiagram"), &mut sink)
            .expect("dispatch");
        assert_eq!(sink.calls, vec!["replace a.mmd 2 before", "clear a.mmd"]);
    }

    #[test]
    fn events_deserialize_from_tagged_json() {
        let event: HostEvent = serde_json::from_value(serde_json::json!({
            "type": "changed",
            "uri": "file:///a.md",
            "kind": "markdown",
            "text": "# hi"
        }))
        .expect("tagged event");
        assert_eq!(
            event,
            HostEvent::Changed(DocumentSnapshot::new(
                "file:///a.md",
                DocumentKind::Markdown,
                "# hi"
            ))
        );
    }
}
