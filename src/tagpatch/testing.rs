//! Test support: factories for building marker templates
//!
//! Kept in the library rather than under `tests/` so unit tests and
//! integration tests construct marker text through one canonical set of
//! helpers instead of hand-concatenating delimiter strings.

/// Build an open marker for `verb` with raw attribute values.
pub fn open_marker(verb: &str, attrs: &[(&str, &str)]) -> String {
    let mut marker = format!("{{{{!-- {}", verb);
    for (key, value) in attrs {
        marker.push_str(&format!(" :{}=\"{}\"", key, value));
    }
    marker.push_str(" --}}");
    marker
}

/// Build a close marker for `verb`.
pub fn close_marker(verb: &str) -> String {
    format!("{{{{!-- /{} --}}}}", verb)
}

/// Build a complete tag: open marker, body on its own line, close marker.
pub fn tag(verb: &str, attrs: &[(&str, &str)], body: &str) -> String {
    format!("{}\n{}\n{}\n", open_marker(verb, attrs), body, close_marker(verb))
}

/// A complete `insert` tag.
pub fn insert_tag(row: usize, col: usize, body: &str) -> String {
    let row = row.to_string();
    let col = col.to_string();
    tag(
        "insert",
        &[("startRow", row.as_str()), ("startCol", col.as_str())],
        body,
    )
}

/// A complete `replace` tag.
pub fn replace_tag(
    start_row: usize,
    start_col: usize,
    end_row: usize,
    end_col: usize,
    body: &str,
) -> String {
    let start_row = start_row.to_string();
    let start_col = start_col.to_string();
    let end_row = end_row.to_string();
    let end_col = end_col.to_string();
    tag(
        "replace",
        &[
            ("startRow", start_row.as_str()),
            ("startCol", start_col.as_str()),
            ("endRow", end_row.as_str()),
            ("endCol", end_col.as_str()),
        ],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagpatch::tokenizer::tokenize;

    #[test]
    fn test_factories_produce_tokenizable_markers() {
        let template = insert_tag(1, 0, "// line");
        let tags = tokenize(&template).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].verb, "insert");
        assert_eq!(tags[0].body, "// line");
    }

    #[test]
    fn test_open_marker_rendering() {
        assert_eq!(
            open_marker("insert", &[("startRow", "2")]),
            "{{!-- insert :startRow=\"2\" --}}"
        );
        assert_eq!(close_marker("insert"), "{{!-- /insert --}}");
    }
}
