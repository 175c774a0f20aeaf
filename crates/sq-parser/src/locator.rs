use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use sq_core::{DiagramBlock, DocumentKind, MERMAID_LANGUAGE};
use tracing::{debug, trace};

/// Find the diagram regions of a document, in document order.
#[must_use]
pub fn locate(document: &str, kind: DocumentKind) -> Vec<DiagramBlock> {
    match kind {
        DocumentKind::Mermaid => vec![DiagramBlock::new(document, 0)],
        DocumentKind::Markdown => locate_fenced(document, MERMAID_LANGUAGE),
        DocumentKind::Other => Vec::new(),
    }
}

/// Collect top-level fenced code blocks tagged with `language`.
///
/// Block sources are cut from the document itself, so a fence indented by a
/// few spaces keeps that indentation and columns line up with the document.
/// Fences nested in block quotes or list items are skipped: their lines carry
/// container prefixes that are not diagram source.
#[must_use]
pub fn locate_fenced(document: &str, language: &str) -> Vec<DiagramBlock> {
    let index = LineIndex::new(document);
    let mut blocks = Vec::new();
    let mut depth = 0_usize;
    let mut open: Option<OpenFence> = None;

    for (event, range) in Parser::new_ext(document, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                match &kind {
                    CodeBlockKind::Fenced(info) if fence_language(info) == Some(language) => {
                        if depth == 0 {
                            open = Some(OpenFence {
                                fence_offset: range.start,
                                content: String::new(),
                            });
                        } else {
                            debug!(offset = range.start, "skipping nested {language} fence");
                        }
                    }
                    _ => {}
                }
                depth += 1;
            }
            Event::Start(_) => depth += 1,
            Event::End(TagEnd::CodeBlock) => {
                depth = depth.saturating_sub(1);
                let Some(fence) = open.take() else {
                    continue;
                };
                match index.line_of(fence.fence_offset) {
                    Some(fence_line) => {
                        let start_line = fence_line + 1;
                        let source = index.lines(
                            document,
                            start_line,
                            content_line_count(&fence.content),
                        );
                        trace!(start_line, "located {language} block");
                        blocks.push(DiagramBlock::new(source, start_line));
                    }
                    None => debug!(
                        offset = fence.fence_offset,
                        "skipping {language} block with unresolved position"
                    ),
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(text) => {
                if let Some(fence) = open.as_mut() {
                    fence.content.push_str(&text);
                }
            }
            _ => {}
        }
    }

    blocks
}

struct OpenFence {
    fence_offset: usize,
    /// Parser text of the block, used only to count its lines.
    content: String,
}

fn content_line_count(content: &str) -> usize {
    let breaks = content.matches('\n').count();
    if content.is_empty() || content.ends_with('\n') {
        breaks
    } else {
        breaks + 1
    }
}

/// Language tag of a fence: the first word of its info string.
fn fence_language(info: &str) -> Option<&str> {
    info.split_whitespace().next()
}

/// Byte offset to 0-based line lookup.
struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Raw document lines `first..first + count`, each followed by `\n`.
    ///
    /// Lines past the end of the document are dropped.
    fn lines(&self, document: &str, first: usize, count: usize) -> String {
        let mut out = String::new();
        for line in first..first.saturating_add(count) {
            let Some(&start) = self.line_starts.get(line) else {
                break;
            };
            let end = self
                .line_starts
                .get(line + 1)
                .map_or(self.len, |next| next - 1);
            out.push_str(&document[start..end]);
            out.push('\n');
        }
        out
    }

    fn line_of(&self, offset: usize) -> Option<usize> {
        if offset > self.len {
            return None;
        }
        Some(
            self.line_starts
                .partition_point(|start| *start <= offset)
                .saturating_sub(1),
        )
    }
}
