use sq_core::{ArrowKind, COMMENT_MARKER, DECLARATION_KEYWORDS, SEQUENCE_HEADER, StatementSpan};

/// Ordered longest first so the first hit at a position is the longest spelling.
const MESSAGE_OPERATORS: [(&str, ArrowKind); 8] = [
    ("-->>", ArrowKind::DottedArrow),
    ("-->", ArrowKind::DottedLine),
    ("--x", ArrowKind::DottedCross),
    ("--)", ArrowKind::DottedAsync),
    ("->>", ArrowKind::SolidArrow),
    ("->", ArrowKind::SolidLine),
    ("-x", ArrowKind::SolidCross),
    ("-)", ArrowKind::SolidAsync),
];

/// Classify one raw diagram line.
///
/// Returns the span to decorate when the line is a message statement: from
/// the first non-whitespace char to the start of trailing whitespace, in
/// char columns of the untrimmed line.
#[must_use]
pub fn classify(raw_line: &str) -> Option<StatementSpan> {
    classify_trimmed(raw_line, raw_line.trim())
}

pub(crate) fn classify_trimmed(raw_line: &str, trimmed: &str) -> Option<StatementSpan> {
    if is_non_statement(trimmed) {
        return None;
    }
    let (_, arrow) = find_message_operator(trimmed)?;

    let total = raw_line.chars().count();
    let leading = raw_line.chars().take_while(|ch| ch.is_whitespace()).count();
    let trailing = raw_line
        .chars()
        .rev()
        .take_while(|ch| ch.is_whitespace())
        .count();

    Some(StatementSpan {
        start_column: leading,
        end_column: total - trailing,
        arrow,
    })
}

/// Lines that never carry a number, whatever else they contain.
#[must_use]
pub fn is_non_statement(trimmed: &str) -> bool {
    trimmed.is_empty()
        || trimmed.starts_with(COMMENT_MARKER)
        || trimmed.starts_with(SEQUENCE_HEADER)
        || DECLARATION_KEYWORDS
            .iter()
            .any(|keyword| trimmed.starts_with(keyword))
}

/// Leftmost message operator in the statement, as a byte index and kind.
pub(crate) fn find_message_operator(statement: &str) -> Option<(usize, ArrowKind)> {
    statement
        .char_indices()
        .filter(|(_, ch)| *ch == '-')
        .find_map(|(idx, _)| {
            let tail = &statement[idx..];
            MESSAGE_OPERATORS
                .iter()
                .find(|(operator, _)| tail.starts_with(operator))
                .map(|(_, arrow)| (idx, *arrow))
        })
}

#[cfg(test)]
mod tests {
    use sq_core::ArrowKind;

    use super::{MESSAGE_OPERATORS, classify, find_message_operator, is_non_statement};

    #[test]
    fn operator_table_covers_every_arrow_kind() {
        for arrow in ArrowKind::ALL {
            assert!(
                MESSAGE_OPERATORS
                    .iter()
                    .any(|(operator, kind)| *kind == arrow && *operator == arrow.operator()),
                "missing {arrow:?}"
            );
        }
    }

    #[test]
    fn operator_table_is_longest_first() {
        for window in MESSAGE_OPERATORS.windows(2) {
            assert!(window[0].0.len() >= window[1].0.len());
        }
    }

    #[test]
    fn recognises_all_arrow_spellings() {
        let cases = [
            ("Alice->Bob: hi", ArrowKind::SolidLine),
            ("Alice-->Bob: hi", ArrowKind::DottedLine),
            ("Alice->>Bob: hi", ArrowKind::SolidArrow),
            ("Alice-->>Bob: hi", ArrowKind::DottedArrow),
            ("Alice-xBob: hi", ArrowKind::SolidCross),
            ("Alice--xBob: hi", ArrowKind::DottedCross),
            ("Alice-)Bob: hi", ArrowKind::SolidAsync),
            ("Alice--)Bob: hi", ArrowKind::DottedAsync),
        ];
        for (line, expected) in cases {
            let span = classify(line).unwrap_or_else(|| panic!("not a statement: {line}"));
            assert_eq!(span.arrow, expected, "wrong arrow for {line}");
        }
    }

    #[test]
    fn span_excludes_leading_and_trailing_whitespace() {
        let span = classify("  Alice->>Bob: hi  ").expect("statement");
        assert_eq!(span.start_column, 2);
        assert_eq!(span.end_column, 17);
    }

    #[test]
    fn span_handles_tabs_and_carriage_returns() {
        let span = classify("\tA->>B: ok\r").expect("statement");
        assert_eq!(span.start_column, 1);
        assert_eq!(span.end_column, 10);
    }

    #[test]
    fn span_columns_count_chars_not_bytes() {
        let span = classify("  Älice->>Bøb: grüß ").expect("statement");
        assert_eq!(span.start_column, 2);
        assert_eq!(span.end_column, 19);
    }

    #[test]
    fn operator_is_found_anywhere_in_the_line() {
        assert!(classify("    \"Web Client (v2)\"->>API: GET /").is_some());
        assert!(classify("rect rgb(0,0,0) A->>B").is_some());
        assert_eq!(find_message_operator("A->>B"), Some((1, ArrowKind::SolidArrow)));
        assert_eq!(find_message_operator("a-b-->>c"), Some((3, ArrowKind::DottedArrow)));
    }

    #[test]
    fn skips_comments_headers_and_declarations() {
        for line in [
            "",
            "   ",
            "%% A->>B: commented out",
            "sequenceDiagram",
            "participant A->>B",
            "  actor User",
            "participant Alice",
        ] {
            assert!(classify(line).is_none(), "classified {line:?}");
        }
    }

    #[test]
    fn lines_without_operator_are_not_statements() {
        for line in [
            "autonumber",
            "Note right of Alice: thinking",
            "loop Every minute",
            "end",
            "Alice - Bob",
            "Alice -- Bob",
            "Alice-",
        ] {
            assert!(classify(line).is_none(), "classified {line:?}");
        }
    }

    #[test]
    fn non_statement_prefixes() {
        assert!(is_non_statement(""));
        assert!(is_non_statement("%%{init: {}}%%"));
        assert!(is_non_statement("actor Bob as B"));
        assert!(!is_non_statement("Alice->>Bob: hi"));
    }
}
