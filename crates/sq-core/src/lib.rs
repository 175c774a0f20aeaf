#![forbid(unsafe_code)]

mod config;

pub use config::{
    AnnotationStyle, AnnotatorConfig, ConfigError, LabelColors, Placement, ThemeKind,
    document_line_count, parse_hex_color,
};

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Header keyword that opens a Mermaid sequence diagram.
pub const SEQUENCE_HEADER: &str = "sequenceDiagram";
/// Directive that turns on automatic message numbering.
pub const AUTONUMBER_DIRECTIVE: &str = "autonumber";
/// Line comment marker.
pub const COMMENT_MARKER: &str = "%%";
/// Keywords that declare a participant rather than send a message.
pub const DECLARATION_KEYWORDS: [&str; 2] = ["participant", "actor"];
/// Fenced code block language tag for Mermaid sources.
pub const MERMAID_LANGUAGE: &str = "mermaid";

/// Message arrow spellings recognised inside a sequence diagram.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ArrowKind {
    /// `->`
    #[default]
    SolidLine,
    /// `-->`
    DottedLine,
    /// `->>`
    SolidArrow,
    /// `-->>`
    DottedArrow,
    /// `-x`
    SolidCross,
    /// `--x`
    DottedCross,
    /// `-)`
    SolidAsync,
    /// `--)`
    DottedAsync,
}

impl ArrowKind {
    pub const ALL: [Self; 8] = [
        Self::SolidLine,
        Self::DottedLine,
        Self::SolidArrow,
        Self::DottedArrow,
        Self::SolidCross,
        Self::DottedCross,
        Self::SolidAsync,
        Self::DottedAsync,
    ];

    /// Source spelling of the operator.
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::SolidLine => "->",
            Self::DottedLine => "-->",
            Self::SolidArrow => "->>",
            Self::DottedArrow => "-->>",
            Self::SolidCross => "-x",
            Self::DottedCross => "--x",
            Self::SolidAsync => "-)",
            Self::DottedAsync => "--)",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SolidLine => "solid-line",
            Self::DottedLine => "dotted-line",
            Self::SolidArrow => "solid-arrow",
            Self::DottedArrow => "dotted-arrow",
            Self::SolidCross => "solid-cross",
            Self::DottedCross => "dotted-cross",
            Self::SolidAsync => "solid-async",
            Self::DottedAsync => "dotted-async",
        }
    }

    #[must_use]
    pub const fn is_dotted(self) -> bool {
        matches!(
            self,
            Self::DottedLine | Self::DottedArrow | Self::DottedCross | Self::DottedAsync
        )
    }
}

/// Declared content type of a host document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    /// Container document with fenced `mermaid` regions.
    Markdown,
    /// The whole document is Mermaid source.
    Mermaid,
    /// Anything else; never annotated.
    #[default]
    Other,
}

impl DocumentKind {
    /// Map an editor language id (`markdown`, `mermaid`, ...) to a kind.
    #[must_use]
    pub fn from_language_id(language_id: &str) -> Self {
        match language_id.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" | "mdx" => Self::Markdown,
            "mermaid" | "mmd" => Self::Mermaid,
            _ => Self::Other,
        }
    }

    /// Map a file extension to a kind, if it is one we know.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "md" | "markdown" | "mdx" => Some(Self::Markdown),
            "mmd" | "mermaid" => Some(Self::Mermaid),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Mermaid => "mermaid",
            Self::Other => "other",
        }
    }
}

/// One diagram region of a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DiagramBlock {
    /// Raw multi-line content of the region.
    pub source: String,
    /// 0-based document line of the region's first content line.
    pub start_line: usize,
}

impl DiagramBlock {
    #[must_use]
    pub fn new(source: impl Into<String>, start_line: usize) -> Self {
        Self {
            source: source.into(),
            start_line,
        }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.source.split('\n').count()
    }
}

/// Column span of a message statement within its own line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StatementSpan {
    pub start_column: usize,
    pub end_column: usize,
    pub arrow: ArrowKind,
}

/// A numbered message statement, relative to its diagram block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MessagePosition {
    pub start_column: usize,
    pub end_column: usize,
    pub line_in_block: usize,
    /// 1-based, restarts for every block.
    pub sequence_number: usize,
    pub arrow: ArrowKind,
}

/// Result of the header/directive checks on one block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DiagramGates {
    pub has_header: bool,
    pub autonumber: bool,
}

impl DiagramGates {
    /// Numbering applies only when both the header and the directive are present.
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.has_header && self.autonumber
    }
}

/// Placement of one label in absolute document coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Annotation {
    /// 0-based document line.
    pub line: usize,
    pub start_column: usize,
    pub end_column: usize,
    pub label: String,
}

impl Annotation {
    /// Shift a block-relative message onto the document.
    #[must_use]
    pub fn from_message(block_start_line: usize, message: &MessagePosition) -> Self {
        Self {
            line: block_start_line + message.line_in_block,
            start_column: message.start_column,
            end_column: message.end_column,
            label: message.sequence_number.to_string(),
        }
    }

    /// Key identifying the decorated range regardless of its label.
    #[must_use]
    pub const fn range_key(&self) -> (usize, usize, usize) {
        (self.line, self.start_column, self.end_column)
    }
}
