//! Spoiler markup in post text
//!
//! Text wrapped in a pair of `**spoiler**` markers is sent to the API as plain
//! text plus a `SPOILER` text entity covering it. Offsets and lengths are
//! counted in UTF-16 code units of the cleaned text, which is how the API
//! measures them.

use serde::{Serialize, Serializer};

pub const SPOILER_MARKER: &str = "**spoiler**";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Spoiler,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEntity {
    pub entity_type: EntityType,
    #[serde(serialize_with = "as_string")]
    pub offset: usize,
    #[serde(serialize_with = "as_string")]
    pub length: usize,
}

/// Post text with markers removed, plus the entities they described
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkedText {
    pub text: String,
    pub entities: Vec<TextEntity>,
}

impl MarkedText {
    /// JSON array for the `text_entities` request field, if there is anything to send
    pub fn entities_json(&self) -> Option<String> {
        if self.entities.is_empty() {
            None
        } else {
            serde_json::to_string(&self.entities).ok()
        }
    }
}

/// Strip spoiler markers from `input` and record what they covered
///
/// An opening marker without a matching closing marker is left in the text
/// untouched, as is everything after it. Empty spoilers produce no entity.
pub fn extract_spoilers(input: &str) -> MarkedText {
    let mut text = String::with_capacity(input.len());
    let mut entities = Vec::new();
    let mut position = 0;
    let mut rest = input;

    while let Some(open) = rest.find(SPOILER_MARKER) {
        let inner = &rest[open + SPOILER_MARKER.len()..];
        let Some(close) = inner.find(SPOILER_MARKER) else {
            break;
        };

        let before = &rest[..open];
        text.push_str(before);
        position += utf16_len(before);

        let spoiler = &inner[..close];
        let length = utf16_len(spoiler);
        if length > 0 {
            entities.push(TextEntity {
                entity_type: EntityType::Spoiler,
                offset: position,
                length,
            });
        }
        text.push_str(spoiler);
        position += length;

        rest = &inner[close + SPOILER_MARKER.len()..];
    }

    text.push_str(rest);
    MarkedText { text, entities }
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

fn as_string<S: Serializer>(value: &usize, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_unchanged() {
        let marked = extract_spoilers("nothing to hide");
        assert_eq!(marked.text, "nothing to hide");
        assert!(marked.entities.is_empty());
        assert_eq!(marked.entities_json(), None);
    }

    #[test]
    fn test_single_spoiler() {
        let marked = extract_spoilers("The butler **spoiler**did it**spoiler**!");
        assert_eq!(marked.text, "The butler did it!");
        assert_eq!(
            marked.entities,
            vec![TextEntity {
                entity_type: EntityType::Spoiler,
                offset: 11,
                length: 6,
            }]
        );
    }

    #[test]
    fn test_multiple_spoilers_offsets_use_cleaned_text() {
        let marked = extract_spoilers("**spoiler**a**spoiler** and **spoiler**bc**spoiler**");
        assert_eq!(marked.text, "a and bc");
        let offsets: Vec<_> = marked.entities.iter().map(|e| (e.offset, e.length)).collect();
        assert_eq!(offsets, vec![(0, 1), (6, 2)]);
    }

    #[test]
    fn test_unclosed_marker_keeps_remaining_text() {
        let marked = extract_spoilers("ok **spoiler**hidden**spoiler** then **spoiler**dangling");
        assert_eq!(marked.text, "ok hidden then **spoiler**dangling");
        assert_eq!(marked.entities.len(), 1);
    }

    #[test]
    fn test_offsets_count_utf16_units() {
        let marked = extract_spoilers("🎠 **spoiler**ride**spoiler**");
        assert_eq!(marked.text, "🎠 ride");
        assert_eq!(marked.entities[0].offset, 3);
        assert_eq!(marked.entities[0].length, 4);
    }

    #[test]
    fn test_empty_spoiler_has_no_entity() {
        let marked = extract_spoilers("a**spoiler****spoiler**b");
        assert_eq!(marked.text, "ab");
        assert!(marked.entities.is_empty());
    }

    #[test]
    fn test_entities_json_uses_string_numbers() {
        let marked = extract_spoilers("x**spoiler**y**spoiler**");
        assert_eq!(
            marked.entities_json().unwrap(),
            r#"[{"entity_type":"SPOILER","offset":"1","length":"1"}]"#
        );
    }
}
