//! Operation executor
//!
//!     Converts a target document into a line buffer and applies a batch of
//!     operations derived from marker tags. The whole batch is validated
//!     before the first mutation, so a failing batch leaves the target
//!     untouched and the caller can keep the file on disk byte-for-byte
//!     intact.
//!
//! Application order
//!
//!     Operations apply highest target position first, sorted on the
//!     coordinates they carry, never on where their tags sat in the
//!     template. Mutating a line therefore never shifts the row or column
//!     meaning of an operation still queued: everything left addresses the
//!     same row or an earlier one. Operations that share a position apply
//!     in reverse template order, which leaves the earlier tag's content
//!     first in the output.
//!
//! Replace semantics
//!
//!     `replace` always excises `[startCol, endCol)`. On a single row the
//!     content substitutes for that span in place. Across rows the span
//!     collapses into the start row: the start row keeps its prefix plus
//!     the content, strictly interior rows become empty (the row count
//!     never changes), and the end row keeps only its suffix past
//!     `endCol`.

use crate::tagpatch::error::PatchError;
use crate::tagpatch::tokenizer::MarkerTag;
use serde::Serialize;
use std::fmt;

/// The kind of edit an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Insert,
    Replace,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Insert => write!(f, "insert"),
            OpKind::Replace => write!(f, "replace"),
        }
    }
}

/// One positional edit against the target buffer.
///
/// Rows and columns are 0-indexed; rows address lines of the target
/// document as it exists when the batch is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub kind: OpKind,
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: Option<usize>,
    pub end_col: Option<usize>,
    pub content: String,
}

impl Operation {
    /// Derive the operation a tag describes.
    ///
    /// Unknown verbs and missing or non-integer coordinates are config
    /// errors; authoring mistakes are never silently dropped.
    pub fn from_tag(tag: &MarkerTag) -> Result<Operation, PatchError> {
        let kind = match tag.verb.as_str() {
            "insert" => OpKind::Insert,
            "replace" => OpKind::Replace,
            other => {
                return Err(PatchError::Config(format!(
                    "unknown operation verb: {}",
                    other
                )))
            }
        };
        let start_row = require_coordinate(tag, "startRow")?;
        let start_col = require_coordinate(tag, "startCol")?;
        let (end_row, end_col) = match kind {
            OpKind::Insert => (None, None),
            OpKind::Replace => (
                Some(require_coordinate(tag, "endRow")?),
                Some(require_coordinate(tag, "endCol")?),
            ),
        };
        Ok(Operation {
            kind,
            start_row,
            start_col,
            end_row,
            end_col,
            content: tag.body.clone(),
        })
    }
}

fn require_coordinate(tag: &MarkerTag, key: &str) -> Result<usize, PatchError> {
    match tag.attributes.get(key) {
        Some(value) => value.as_coordinate().ok_or_else(|| {
            PatchError::Config(format!(
                "{} operation has a non-integer {}: {:?}",
                tag.verb, key, value
            ))
        }),
        None => Err(PatchError::Config(format!(
            "missing required attribute {} for {} operation",
            key, tag.verb
        ))),
    }
}

/// Plan a tokenized template into operations, one per tag.
pub fn plan(tags: &[MarkerTag]) -> Result<Vec<Operation>, PatchError> {
    tags.iter().map(Operation::from_tag).collect()
}

/// Apply a batch of operations to the target text.
///
/// All-or-nothing: every operation is validated against the split target
/// before any line is mutated, so an error means the input text is the
/// output text on disk.
pub fn execute(target: &str, operations: &[Operation]) -> Result<String, PatchError> {
    let mut lines: Vec<String> = target.split('\n').map(str::to_string).collect();
    validate(operations, lines.len())?;

    let mut order: Vec<(usize, &Operation)> = operations.iter().enumerate().collect();
    order.sort_by(|(index_a, a), (index_b, b)| {
        (b.start_row, b.start_col, index_b).cmp(&(a.start_row, a.start_col, index_a))
    });

    for (_, op) in order {
        match op.kind {
            OpKind::Insert => apply_insert(op, &mut lines),
            OpKind::Replace => apply_replace(op, &mut lines),
        }
    }

    Ok(lines.join("\n"))
}

fn validate(operations: &[Operation], line_count: usize) -> Result<(), PatchError> {
    for op in operations {
        check_row(op, "startRow", op.start_row, line_count)?;
        if op.kind == OpKind::Replace {
            let end_row = match op.end_row {
                Some(row) => row,
                None => {
                    return Err(PatchError::Config(
                        "replace operation is missing endRow".to_string(),
                    ))
                }
            };
            if op.end_col.is_none() {
                return Err(PatchError::Config(
                    "replace operation is missing endCol".to_string(),
                ));
            }
            check_row(op, "endRow", end_row, line_count)?;
            if end_row < op.start_row {
                return Err(PatchError::Config(format!(
                    "replace operation has an inverted row range: {}..{}",
                    op.start_row, end_row
                )));
            }
        }
    }
    Ok(())
}

fn check_row(op: &Operation, name: &str, row: usize, line_count: usize) -> Result<(), PatchError> {
    if row >= line_count {
        return Err(PatchError::Position(format!(
            "{} operation addresses {} {} outside the target ({} lines)",
            op.kind, name, row, line_count
        )));
    }
    Ok(())
}

/// Translate a character column into a byte offset, clamped to line end.
fn byte_offset(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(offset, _)| offset)
        .unwrap_or(line.len())
}

fn apply_insert(op: &Operation, lines: &mut [String]) {
    let line = &mut lines[op.start_row];
    let at = byte_offset(line, op.start_col);
    line.insert_str(at, &op.content);
}

fn apply_replace(op: &Operation, lines: &mut [String]) {
    // validate() guarantees both end coordinates are present.
    let end_row = op.end_row.unwrap_or(op.start_row);
    let end_col = op.end_col.unwrap_or(op.start_col);

    if end_row == op.start_row {
        let line = &mut lines[op.start_row];
        let from = byte_offset(line, op.start_col);
        let to = byte_offset(line, end_col.max(op.start_col));
        line.replace_range(from..to, &op.content);
        return;
    }

    let cut = byte_offset(&lines[op.start_row], op.start_col);
    lines[op.start_row].truncate(cut);
    lines[op.start_row].push_str(&op.content);
    for row in (op.start_row + 1)..end_row {
        lines[row].clear();
    }
    let keep = byte_offset(&lines[end_row], end_col);
    lines[end_row].drain(..keep);
}
