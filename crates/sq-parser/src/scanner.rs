use sq_core::{AUTONUMBER_DIRECTIVE, DiagramGates, MessagePosition, SEQUENCE_HEADER};

use crate::classifier::classify_trimmed;

/// Number the message statements of one diagram block.
///
/// Empty unless the block has both a `sequenceDiagram` header and an
/// `autonumber` directive.
#[must_use]
pub fn scan(source: &str) -> Vec<MessagePosition> {
    scan_with_gates(source).1
}

/// Report whether the block is a sequence diagram and whether numbering is on.
#[must_use]
pub fn inspect_gates(source: &str) -> DiagramGates {
    let trimmed: Vec<&str> = source.split('\n').map(str::trim).collect();
    gates_for(&trimmed)
}

pub(crate) fn scan_with_gates(source: &str) -> (DiagramGates, Vec<MessagePosition>) {
    let lines: Vec<&str> = source.split('\n').collect();
    let trimmed: Vec<&str> = lines.iter().map(|line| line.trim()).collect();

    let gates = gates_for(&trimmed);
    if !gates.is_active() {
        return (gates, Vec::new());
    }

    let mut messages = Vec::new();
    for (line_in_block, (raw, trimmed)) in lines.iter().zip(&trimmed).enumerate() {
        let Some(span) = classify_trimmed(raw, trimmed) else {
            continue;
        };
        messages.push(MessagePosition {
            start_column: span.start_column,
            end_column: span.end_column,
            line_in_block,
            sequence_number: messages.len() + 1,
            arrow: span.arrow,
        });
    }

    (gates, messages)
}

fn gates_for(trimmed: &[&str]) -> DiagramGates {
    DiagramGates {
        has_header: trimmed.iter().any(|line| line.starts_with(SEQUENCE_HEADER)),
        autonumber: trimmed
            .iter()
            .any(|line| line.starts_with(AUTONUMBER_DIRECTIVE)),
    }
}
