//! Marker-tag tokenizer
//!
//!     Scans a template document left to right and extracts comment-embedded
//!     marker pairs:
//!
//!     ```text
//!     {{!-- insert :startRow="1" :startCol="0" --}}
//!     // inserted line
//!     {{!-- /insert --}}
//!     ```
//!
//!     The scan is a single pass over four states: plain text, the prefix of
//!     an open marker, the interior of an open marker, and the interior of a
//!     close marker. Completing an open marker pushes onto an explicit stack;
//!     a close marker must name the verb on top of the stack, so crossed
//!     nesting fails right at the offending close marker. Only the
//!     unclosed-tag case waits for the end of the scan.
//!
//! Marker grammar
//!
//!     An open marker is `{{!--` followed by a space, a verb identifier,
//!     `:key="value"` attribute pairs, and the `--}}` terminator. A close
//!     marker is `{{!-- /verb --}}`. The terminator is the first `--}}`
//!     encountered; attribute values cannot contain it. Everything strictly
//!     between a pair's markers, trimmed of surrounding whitespace, is the
//!     tag's body. Each stack entry records where its own body starts, so
//!     nested tags each capture the content between their own markers.

use crate::tagpatch::error::PatchError;
use crate::tagpatch::value::{parse_literal, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;

/// Splits a marker interior into the verb and the attribute text.
static VERB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)(.*)$").expect("verb regex"));

/// Matches one `:key="value"` attribute pair.
static ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#":(\w+)="([^"]*)""#).expect("attribute regex"));

/// One open/close marker pair found in a template, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerTag {
    /// Operation name, e.g. `insert` or `replace`
    pub verb: String,
    /// Coerced `:key="value"` attributes
    pub attributes: BTreeMap<String, Value>,
    /// Text strictly between the markers, trimmed
    pub body: String,
    /// Byte range in the template from open-marker start to close-marker end
    pub span: Range<usize>,
}

enum ScanState {
    Text,
    OpenTagStart,
    OpenTag,
    CloseTag,
}

/// A completed open marker waiting for its close marker.
struct OpenTag {
    verb: String,
    attributes: BTreeMap<String, Value>,
    marker_start: usize,
    body_start: usize,
}

/// Extract all marker tags from a template document.
///
/// Tags are returned in the order their close markers complete; for
/// non-nested markers this is template document order.
pub fn tokenize(template: &str) -> Result<Vec<MarkerTag>, PatchError> {
    let chars: Vec<(usize, char)> = template.char_indices().collect();
    let char_at = |i: usize| chars.get(i).map(|&(_, c)| c);
    let byte_at = |i: usize| chars.get(i).map(|&(b, _)| b).unwrap_or(template.len());

    let mut tags = Vec::new();
    let mut stack: Vec<OpenTag> = Vec::new();
    let mut state = ScanState::Text;
    let mut buffer = String::new();
    // Byte offset of the `{{` that opened the marker being scanned.
    let mut marker_start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (byte_pos, ch) = chars[i];
        match state {
            ScanState::Text => {
                if ch == '{' && char_at(i + 1) == Some('{') {
                    if char_at(i + 2) == Some('!')
                        && char_at(i + 3) == Some('-')
                        && char_at(i + 4) == Some('-')
                        && char_at(i + 5) == Some(' ')
                        && char_at(i + 6) == Some('/')
                    {
                        marker_start = byte_pos;
                        buffer.clear();
                        state = ScanState::CloseTag;
                        i += 7;
                    } else if char_at(i + 2) == Some('!')
                        && char_at(i + 3) == Some('-')
                        && char_at(i + 4) == Some('-')
                    {
                        marker_start = byte_pos;
                        state = ScanState::OpenTagStart;
                        i += 5;
                    } else {
                        i += 2;
                    }
                } else {
                    i += 1;
                }
            }

            ScanState::OpenTagStart => {
                // The verb buffer starts after the first space inside the marker.
                if ch == ' ' {
                    buffer.clear();
                    state = ScanState::OpenTag;
                }
                i += 1;
            }

            ScanState::OpenTag => {
                if ch == '-'
                    && char_at(i + 1) == Some('-')
                    && char_at(i + 2) == Some('}')
                    && char_at(i + 3) == Some('}')
                {
                    let caps = VERB_RE.captures(&buffer).ok_or_else(|| {
                        PatchError::Syntax(format!("invalid tag format: {}", buffer.trim()))
                    })?;
                    let verb = caps[1].to_string();
                    let attributes = parse_attributes(&caps[2])?;
                    stack.push(OpenTag {
                        verb,
                        attributes,
                        marker_start,
                        body_start: byte_at(i + 4),
                    });
                    buffer.clear();
                    state = ScanState::Text;
                    i += 4;
                } else {
                    buffer.push(ch);
                    i += 1;
                }
            }

            ScanState::CloseTag => {
                if ch == '-'
                    && char_at(i + 1) == Some('-')
                    && char_at(i + 2) == Some('}')
                    && char_at(i + 3) == Some('}')
                {
                    let verb = buffer.trim().to_string();
                    let open = match stack.pop() {
                        Some(open) if open.verb == verb => open,
                        _ => {
                            return Err(PatchError::Syntax(format!(
                                "invalid closing tag: {}",
                                verb
                            )))
                        }
                    };
                    let body = template[open.body_start..marker_start].trim().to_string();
                    tags.push(MarkerTag {
                        verb,
                        attributes: open.attributes,
                        body,
                        span: open.marker_start..byte_at(i + 4),
                    });
                    buffer.clear();
                    state = ScanState::Text;
                    i += 4;
                } else {
                    buffer.push(ch);
                    i += 1;
                }
            }
        }
    }

    if !matches!(state, ScanState::Text) {
        return Err(PatchError::Syntax(format!(
            "unterminated marker starting at byte {}",
            marker_start
        )));
    }
    if let Some(open) = stack.last() {
        return Err(PatchError::Syntax(format!("unclosed tag: {}", open.verb)));
    }

    Ok(tags)
}

fn parse_attributes(attrs: &str) -> Result<BTreeMap<String, Value>, PatchError> {
    let mut map = BTreeMap::new();
    for caps in ATTR_RE.captures_iter(attrs) {
        map.insert(caps[1].to_string(), coerce_value(&caps[2])?);
    }
    Ok(map)
}

/// Fixed-order coercion of one attribute's literal text.
fn coerce_value(raw: &str) -> Result<Value, PatchError> {
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Ok(Value::String(raw[1..raw.len() - 1].to_string()));
    }
    if raw == "true" || raw == "false" {
        return Ok(Value::Bool(raw == "true"));
    }
    if let Ok(number) = raw.parse::<f64>() {
        if number.is_finite() {
            return Ok(Value::Number(number));
        }
    }
    if raw.starts_with('{') || raw.starts_with('[') {
        return parse_literal(raw)
            .map_err(|err| PatchError::Syntax(format!("invalid attribute value {:?}: {}", raw, err)));
    }
    Ok(Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_insert_tag() {
        let template = concat!(
            "{{!-- insert :startRow=\"2\" :startCol=\"0\" --}}\n",
            "// new feature\n",
            "{{!-- /insert --}}\n",
        );
        let tags = tokenize(template).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].verb, "insert");
        assert_eq!(tags[0].body, "// new feature");
        assert_eq!(tags[0].attributes["startRow"], Value::Number(2.0));
        assert_eq!(tags[0].attributes["startCol"], Value::Number(0.0));
    }

    #[test]
    fn test_span_covers_both_markers() {
        let template = "{{!-- insert :startRow=\"0\" :startCol=\"0\" --}}x{{!-- /insert --}}";
        let tags = tokenize(template).unwrap();
        assert_eq!(tags[0].span, 0..template.len());
    }

    #[test]
    fn test_sibling_tags_in_document_order() {
        let template = concat!(
            "{{!-- insert :startRow=\"0\" :startCol=\"0\" --}}a{{!-- /insert --}}\n",
            "{{!-- replace :startRow=\"1\" :startCol=\"0\" :endRow=\"1\" :endCol=\"2\" --}}",
            "b",
            "{{!-- /replace --}}\n",
        );
        let tags = tokenize(template).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].verb, "insert");
        assert_eq!(tags[1].verb, "replace");
    }

    #[test]
    fn test_nested_tags_capture_their_own_bodies() {
        let template = concat!(
            "{{!-- replace :startRow=\"0\" :startCol=\"0\" :endRow=\"0\" :endCol=\"1\" --}}\n",
            "outer head\n",
            "{{!-- insert :startRow=\"1\" :startCol=\"0\" --}}\n",
            "inner body\n",
            "{{!-- /insert --}}\n",
            "{{!-- /replace --}}\n",
        );
        let tags = tokenize(template).unwrap();
        // The inner tag completes first.
        assert_eq!(tags[0].verb, "insert");
        assert_eq!(tags[0].body, "inner body");
        assert_eq!(tags[1].verb, "replace");
        assert!(tags[1].body.starts_with("outer head"));
        assert!(tags[1].body.contains("inner body"));
    }

    #[test]
    fn test_close_verb_mismatch_is_rejected_at_the_close_marker() {
        let template = concat!(
            "{{!-- insert :startRow=\"0\" :startCol=\"0\" --}}\n",
            "x\n",
            "{{!-- /replace --}}\n",
        );
        let err = tokenize(template).unwrap_err();
        assert_eq!(
            err,
            PatchError::Syntax("invalid closing tag: replace".to_string())
        );
    }

    #[test]
    fn test_close_without_open_is_rejected() {
        let err = tokenize("{{!-- /insert --}}").unwrap_err();
        assert_eq!(
            err,
            PatchError::Syntax("invalid closing tag: insert".to_string())
        );
    }

    #[test]
    fn test_unclosed_tag_names_the_verb() {
        let template = "{{!-- insert :startRow=\"0\" :startCol=\"0\" --}}\nbody\n";
        let err = tokenize(template).unwrap_err();
        assert_eq!(err, PatchError::Syntax("unclosed tag: insert".to_string()));
    }

    #[test]
    fn test_marker_without_verb_is_invalid() {
        let err = tokenize("{{!-- :startRow=\"0\" --}}").unwrap_err();
        assert!(matches!(err, PatchError::Syntax(msg) if msg.starts_with("invalid tag format")));
    }

    #[test]
    fn test_unterminated_marker_is_invalid() {
        let err = tokenize("{{!-- insert :startRow=\"0\"").unwrap_err();
        assert!(matches!(err, PatchError::Syntax(msg) if msg.starts_with("unterminated marker")));
    }

    #[test]
    fn test_plain_text_yields_no_tags() {
        assert_eq!(tokenize("no markers here").unwrap(), vec![]);
        assert_eq!(tokenize("{{ handlebars output }}").unwrap(), vec![]);
        assert_eq!(tokenize("").unwrap(), vec![]);
    }

    #[test]
    fn test_body_is_trimmed() {
        let template =
            "{{!-- insert :startRow=\"0\" :startCol=\"0\" --}}\n   spaced body   \n{{!-- /insert --}}";
        let tags = tokenize(template).unwrap();
        assert_eq!(tags[0].body, "spaced body");
    }

    #[test]
    fn test_coercion_order() {
        let template = concat!(
            "{{!-- insert",
            " :quoted=\"'7'\"",
            " :flag=\"true\"",
            " :count=\"7\"",
            " :options=\"{name:'X'}\"",
            " :items=\"[1,2]\"",
            " :plain=\"hello\"",
            " --}}b{{!-- /insert --}}",
        );
        let tags = tokenize(template).unwrap();
        let attrs = &tags[0].attributes;
        assert_eq!(attrs["quoted"], Value::String("7".to_string()));
        assert_eq!(attrs["flag"], Value::Bool(true));
        assert_eq!(attrs["count"], Value::Number(7.0));
        assert!(matches!(attrs["options"], Value::Map(_)));
        assert!(matches!(attrs["items"], Value::List(_)));
        assert_eq!(attrs["plain"], Value::String("hello".to_string()));
    }

    #[test]
    fn test_structured_attribute_rejects_code() {
        let template =
            "{{!-- insert :startRow=\"0\" :opts=\"{a: run()}\" --}}b{{!-- /insert --}}";
        let err = tokenize(template).unwrap_err();
        assert!(matches!(err, PatchError::Syntax(msg) if msg.starts_with("invalid attribute value")));
    }
}
