#![forbid(unsafe_code)]

mod config;
mod overlay;

pub use config::{LabelMode, Rgb, TermRenderConfig};
pub use overlay::TermRenderResult;

use sq_core::Annotation;

/// Draw labels as plain `[n]` markers before each annotated span.
#[must_use]
pub fn render_term(document: &str, annotations: &[Annotation]) -> String {
    overlay::render_overlay(document, annotations, &TermRenderConfig::plain()).output
}

#[must_use]
pub fn render_term_with_config(
    document: &str,
    annotations: &[Annotation],
    config: &TermRenderConfig,
) -> TermRenderResult {
    overlay::render_overlay(document, annotations, config)
}
