#![no_main]

use libfuzzer_sys::fuzz_target;
use sq_core::DocumentKind;
use sq_parser::{analyze, annotate};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let line_lengths: Vec<usize> = text.split('\n').map(|line| line.chars().count()).collect();
    for annotation in annotate(text, DocumentKind::Mermaid) {
        assert!(annotation.line < line_lengths.len());
        assert!(annotation.start_column < annotation.end_column);
        assert!(annotation.end_column <= line_lengths[annotation.line]);
    }

    let markdown = annotate(text, DocumentKind::Markdown);
    assert_eq!(analyze(text, DocumentKind::Markdown).annotations, markdown);
});
