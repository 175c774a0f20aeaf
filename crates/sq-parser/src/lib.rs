#![forbid(unsafe_code)]

//! Sequence-number placement for Mermaid sequence diagrams.
//!
//! `annotate(text, kind)` is the single entry point hosts need: it locates
//! diagram blocks, numbers their message statements and maps every number to
//! an absolute document position. It is a pure function of its input.

mod classifier;
mod locator;
mod scanner;

use serde::Serialize;
use serde_json::json;
use sq_core::{
    Annotation, COMMENT_MARKER, DiagramBlock, DiagramGates, DocumentKind, MessagePosition,
    SEQUENCE_HEADER,
};

pub use classifier::{classify, is_non_statement};
pub use locator::{locate, locate_fenced};
pub use scanner::{inspect_gates, scan};

/// Map the messages of every block onto document coordinates.
///
/// Numbering restarts at 1 for each block.
#[must_use]
pub fn assemble(blocks: &[DiagramBlock]) -> Vec<Annotation> {
    blocks
        .iter()
        .flat_map(|block| {
            scan(&block.source)
                .into_iter()
                .map(move |message| Annotation::from_message(block.start_line, &message))
        })
        .collect()
}

/// Annotations for a whole document.
///
/// An empty result means no labels should be visible for this document.
#[must_use]
pub fn annotate(document: &str, kind: DocumentKind) -> Vec<Annotation> {
    assemble(&locate(document, kind))
}

/// Per-block detail behind a document's annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockReport {
    pub start_line: usize,
    pub line_count: usize,
    pub gates: DiagramGates,
    pub messages: Vec<MessagePosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationReport {
    pub kind: DocumentKind,
    pub blocks: Vec<BlockReport>,
    pub annotations: Vec<Annotation>,
}

/// Same result as [`annotate`], plus what each block contributed.
#[must_use]
pub fn analyze(document: &str, kind: DocumentKind) -> AnnotationReport {
    let mut blocks = Vec::new();
    let mut annotations = Vec::new();

    for block in locate(document, kind) {
        let (gates, messages) = scanner::scan_with_gates(&block.source);
        annotations.extend(
            messages
                .iter()
                .map(|message| Annotation::from_message(block.start_line, message)),
        );
        blocks.push(BlockReport {
            start_line: block.start_line,
            line_count: block.line_count(),
            gates,
            messages,
        });
    }

    AnnotationReport {
        kind,
        blocks,
        annotations,
    }
}

/// Guess the kind of text that arrived without a name or language id.
///
/// Text whose first significant line is a sequence header is treated as a
/// standalone diagram; anything else as Markdown.
#[must_use]
pub fn detect_document_kind(text: &str) -> DocumentKind {
    match first_significant_line(text) {
        Some(line) if line.starts_with(SEQUENCE_HEADER) => DocumentKind::Mermaid,
        _ => DocumentKind::Markdown,
    }
}

fn first_significant_line(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
}

#[must_use]
pub fn annotation_evidence_json(report: &AnnotationReport) -> String {
    json!({
        "kind": report.kind.as_str(),
        "block_count": report.blocks.len(),
        "active_block_count": report.blocks.iter().filter(|block| block.gates.is_active()).count(),
        "annotation_count": report.annotations.len(),
        "annotated_lines": report.annotations.iter().map(|a| a.line).collect::<Vec<_>>(),
    })
    .to_string()
}
