//! Draw sequence labels into document text.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;
use sq_core::{Annotation, Placement};

use crate::config::{LabelMode, Rgb, TermRenderConfig};

const GUTTER_SEPARATOR: &str = " │ ";
const RESET: &str = "\x1b[0m";

/// Result of drawing annotations over a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermRenderResult {
    /// Document text with labels drawn in.
    pub output: String,
    /// Lines in the document.
    pub line_count: usize,
    /// Labels that landed on a document line.
    pub labels_drawn: usize,
    /// Labels pointing past the end of the document.
    pub labels_dropped: usize,
}

pub(crate) fn render_overlay(
    document: &str,
    annotations: &[Annotation],
    config: &TermRenderConfig,
) -> TermRenderResult {
    let mut by_line: BTreeMap<usize, Vec<&Annotation>> = BTreeMap::new();
    for annotation in annotations {
        by_line.entry(annotation.line).or_default().push(annotation);
    }

    let gutter_width = annotations
        .iter()
        .map(|annotation| annotation.label.chars().count())
        .max()
        .unwrap_or(0);

    let lines: Vec<&str> = document.split('\n').collect();
    let mut rendered = Vec::with_capacity(lines.len());
    let mut labels_drawn = 0_usize;

    for (index, line) in lines.iter().enumerate() {
        let labels = by_line.get(&index).map_or(&[][..], Vec::as_slice);
        labels_drawn += labels.len();
        rendered.push(match config.mode {
            LabelMode::Inline => insert_inline(line, labels, config),
            LabelMode::Gutter => with_gutter(line, labels, gutter_width, config),
        });
    }

    TermRenderResult {
        output: rendered.join("\n"),
        line_count: lines.len(),
        labels_drawn,
        labels_dropped: annotations.len() - labels_drawn,
    }
}

fn insert_inline(line: &str, labels: &[&Annotation], config: &TermRenderConfig) -> String {
    let mut output = line.to_string();
    let mut ordered = labels.to_vec();
    // Right to left, so earlier byte offsets stay valid.
    ordered.sort_by_key(|annotation| Reverse(anchor_column(annotation, config.placement)));

    let margin = " ".repeat(config.margin);
    for annotation in ordered {
        let column = anchor_column(annotation, config.placement);
        let offset = byte_offset(&output, column);
        let badge = badge(&annotation.label, config);
        let piece = match config.placement {
            Placement::Before => format!("{badge}{margin}"),
            Placement::After => format!("{margin}{badge}"),
        };
        output.insert_str(offset, &piece);
    }
    output
}

fn with_gutter(
    line: &str,
    labels: &[&Annotation],
    width: usize,
    config: &TermRenderConfig,
) -> String {
    if width == 0 {
        return line.to_string();
    }
    let label = labels
        .iter()
        .map(|annotation| annotation.label.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let pad = " ".repeat(config.padding);
    let cell = if label.is_empty() {
        " ".repeat(width + 2 * config.padding)
    } else if config.use_colors {
        badge(&format!("{label:>width$}"), config)
    } else {
        format!("{pad}{label:>width$}{pad}")
    };
    format!("{cell}{GUTTER_SEPARATOR}{line}")
}

fn anchor_column(annotation: &Annotation, placement: Placement) -> usize {
    match placement {
        Placement::Before => annotation.start_column,
        Placement::After => annotation.end_column,
    }
}

/// Byte offset of a char column, clamped to the end of the line.
fn byte_offset(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map_or(line.len(), |(offset, _)| offset)
}

fn badge(label: &str, config: &TermRenderConfig) -> String {
    if !config.use_colors {
        return format!("[{label}]");
    }
    let pad = " ".repeat(config.padding);
    format!(
        "{}{}{pad}{label}{pad}{RESET}",
        fg_code(config.foreground),
        bg_code(config.background)
    )
}

fn fg_code((r, g, b): Rgb) -> String {
    format!("\x1b[38;2;{r};{g};{b}m")
}

fn bg_code((r, g, b): Rgb) -> String {
    format!("\x1b[48;2;{r};{g};{b}m")
}
