#![no_main]

use libfuzzer_sys::fuzz_target;
use sq_core::DocumentKind;
use sq_parser::annotate;
use sq_render_term::{LabelMode, TermRenderConfig, render_term_with_config};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for kind in [DocumentKind::Markdown, DocumentKind::Mermaid] {
        let annotations = annotate(text, kind);
        for mode in [LabelMode::Inline, LabelMode::Gutter] {
            let config = TermRenderConfig::default().with_mode(mode);
            let result = render_term_with_config(text, &annotations, &config);
            assert_eq!(result.labels_drawn + result.labels_dropped, annotations.len());
        }
    }
});
