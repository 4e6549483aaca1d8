// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strict validation of untrusted imported history documents.
//!
//! The document must be an array of turn objects. Each structural level is
//! checked with exact field-set membership: a turn has exactly `role` and
//! `parts`, a part has `text` and/or `inline_data` and nothing else, and
//! `inline_data` has exactly `mime_type` and `data` (base64 text, not
//! decoded here). The first failure short-circuits, and the reason list
//! accumulates innermost cause first as each check escalates to its caller.
//!
//! The input is never mutated; on success the typed turns are returned,
//! ready for storage.

use serde_json::{Map, Value};

use kaiwa_core::{InlineData, KaiwaError, Part, Role, Turn};

type Reasons = Vec<String>;

fn fail(reason: &str) -> Reasons {
    vec![reason.to_string()]
}

/// Validate an untrusted document against the turn schema.
pub fn validate_document(doc: &Value) -> Result<Vec<Turn>, KaiwaError> {
    check_document(doc).map_err(|reasons| KaiwaError::Validation { reasons })
}

fn check_document(doc: &Value) -> Result<Vec<Turn>, Reasons> {
    let Some(entries) = doc.as_array() else {
        return Err(fail("invalid history format"));
    };
    let mut turns = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            return Err(fail("invalid message format"));
        };
        turns.push(check_turn(obj)?);
    }
    Ok(turns)
}

fn check_turn(obj: &Map<String, Value>) -> Result<Turn, Reasons> {
    // Parts are checked before the role, matching the failure order callers
    // observe in the reason list.
    let Some(entries) = obj.get("parts").and_then(Value::as_array) else {
        return Err(fail("invalid parts format"));
    };
    if entries.is_empty() {
        return Err(fail("invalid parts format"));
    }

    let mut parts = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(part_obj) = entry.as_object() else {
            return Err(fail("invalid part format"));
        };
        match check_part(part_obj) {
            Ok(checked) => parts.extend(checked),
            Err(mut reasons) => {
                reasons.push("invalid part format".to_string());
                return Err(reasons);
            }
        }
    }

    let role = match obj.get("role").and_then(Value::as_str) {
        Some("user") => Role::User,
        Some("model") => Role::Model,
        _ => return Err(fail("invalid role format")),
    };

    if obj.keys().any(|k| k != "role" && k != "parts") {
        return Err(fail("invalid message format"));
    }

    Ok(Turn { role, parts })
}

fn check_part(obj: &Map<String, Value>) -> Result<Vec<Part>, Reasons> {
    let mut parts = Vec::new();

    if let Some(text) = obj.get("text") {
        let Some(text) = text.as_str() else {
            return Err(fail("invalid text format"));
        };
        parts.push(Part::Text(text.to_string()));
    }

    if let Some(inline) = obj.get("inline_data") {
        match check_inline_data(inline) {
            Ok(data) => parts.push(Part::InlineData(data)),
            Err(mut reasons) => {
                reasons.push("invalid inline_data".to_string());
                return Err(reasons);
            }
        }
    }

    if obj.keys().any(|k| k != "text" && k != "inline_data") {
        return Err(fail("invalid data present in part"));
    }
    if parts.is_empty() {
        return Err(fail("empty part"));
    }
    Ok(parts)
}

fn check_inline_data(value: &Value) -> Result<InlineData, Reasons> {
    let Some(obj) = value.as_object() else {
        return Err(fail("invalid inline_data format"));
    };
    let Some(mime_type) = obj.get("mime_type").and_then(Value::as_str) else {
        return Err(fail("invalid mime_type format"));
    };
    // Base64 well-formedness is deliberately not checked here; the stored
    // representation stays textual and is only decoded on demand.
    let Some(data) = obj.get("data").and_then(Value::as_str) else {
        return Err(fail("invalid data format"));
    };
    if obj.keys().any(|k| k != "mime_type" && k != "data") {
        return Err(fail("invalid value present in inline_data"));
    }
    Ok(InlineData {
        mime_type: mime_type.to_string(),
        data: data.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reasons_of(doc: Value) -> Vec<String> {
        match validate_document(&doc) {
            Err(KaiwaError::Validation { reasons }) => reasons,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn accepts_plain_text_turn() {
        let doc = json!([{"role": "user", "parts": [{"text": "hi"}]}]);
        let turns = validate_document(&doc).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].joined_text(), "hi");
    }

    #[test]
    fn accepts_inline_data_part() {
        let doc = json!([{
            "role": "user",
            "parts": [{"inline_data": {"mime_type": "image/png", "data": "AAAA"}}]
        }]);
        let turns = validate_document(&doc).unwrap();
        assert!(matches!(turns[0].parts[0], Part::InlineData(_)));
    }

    #[test]
    fn accepts_text_and_inline_data_in_one_part() {
        let doc = json!([{
            "role": "model",
            "parts": [{
                "text": "caption",
                "inline_data": {"mime_type": "image/png", "data": "AAAA"}
            }]
        }]);
        let turns = validate_document(&doc).unwrap();
        // The combined part expands to text first, then the attachment.
        assert_eq!(turns[0].parts.len(), 2);
        assert!(matches!(turns[0].parts[0], Part::Text(_)));
    }

    #[test]
    fn rejects_extra_field_in_part() {
        let doc = json!([{"role": "user", "parts": [{"text": "hi", "extra": 1}]}]);
        let reasons = reasons_of(doc);
        assert_eq!(
            reasons,
            vec!["invalid data present in part", "invalid part format"]
        );
    }

    #[test]
    fn rejects_extra_field_in_inline_data() {
        let doc = json!([{
            "role": "user",
            "parts": [{"inline_data": {"mime_type": "image/png", "data": "AAAA", "x": 1}}]
        }]);
        let reasons = reasons_of(doc);
        assert_eq!(
            reasons,
            vec![
                "invalid value present in inline_data",
                "invalid inline_data",
                "invalid part format"
            ]
        );
    }

    #[test]
    fn rejects_extra_field_in_turn() {
        let doc = json!([{"role": "user", "parts": [{"text": "hi"}], "meta": true}]);
        assert_eq!(reasons_of(doc), vec!["invalid message format"]);
    }

    #[test]
    fn rejects_non_array_document() {
        assert_eq!(reasons_of(json!({"role": "user"})), vec!["invalid history format"]);
    }

    #[test]
    fn rejects_non_object_turn() {
        assert_eq!(reasons_of(json!(["hi"])), vec!["invalid message format"]);
    }

    #[test]
    fn rejects_unknown_role() {
        let doc = json!([{"role": "assistant", "parts": [{"text": "hi"}]}]);
        assert_eq!(reasons_of(doc), vec!["invalid role format"]);
    }

    #[test]
    fn rejects_non_string_role() {
        let doc = json!([{"role": 3, "parts": [{"text": "hi"}]}]);
        assert_eq!(reasons_of(doc), vec!["invalid role format"]);
    }

    #[test]
    fn rejects_missing_or_empty_parts() {
        assert_eq!(
            reasons_of(json!([{"role": "user"}])),
            vec!["invalid parts format"]
        );
        assert_eq!(
            reasons_of(json!([{"role": "user", "parts": []}])),
            vec!["invalid parts format"]
        );
    }

    #[test]
    fn rejects_part_with_no_content() {
        let doc = json!([{"role": "user", "parts": [{}]}]);
        assert_eq!(reasons_of(doc), vec!["empty part", "invalid part format"]);
    }

    #[test]
    fn rejects_non_string_text() {
        let doc = json!([{"role": "user", "parts": [{"text": 1}]}]);
        assert_eq!(
            reasons_of(doc),
            vec!["invalid text format", "invalid part format"]
        );
    }

    #[test]
    fn rejects_non_object_inline_data() {
        let doc = json!([{"role": "user", "parts": [{"inline_data": "AAAA"}]}]);
        assert_eq!(
            reasons_of(doc),
            vec![
                "invalid inline_data format",
                "invalid inline_data",
                "invalid part format"
            ]
        );
    }

    #[test]
    fn first_failure_short_circuits() {
        // The second turn is also invalid, but only the first is reported.
        let doc = json!([
            {"role": "user", "parts": [{"bogus": 1}]},
            {"role": 7, "parts": []}
        ]);
        assert_eq!(
            reasons_of(doc),
            vec!["invalid data present in part", "invalid part format"]
        );
    }

    #[test]
    fn input_document_is_not_mutated() {
        let doc = json!([{"role": "user", "parts": [{"text": "hi"}]}]);
        let before = doc.clone();
        let _ = validate_document(&doc);
        assert_eq!(doc, before);
    }

    #[test]
    fn validated_turns_round_trip_through_serde() {
        let doc = json!([
            {"role": "user", "parts": [{"text": "q"}]},
            {"role": "model", "parts": [{"text": "a"}]}
        ]);
        let turns = validate_document(&doc).unwrap();
        let reserialized = serde_json::to_value(&turns).unwrap();
        assert_eq!(reserialized, doc);
    }
}
