//! Lenient parsing of classifier replies.
//!
//! The classifier is asked for exactly one JSON object but may wrap it in
//! prose, drop fields, or not produce JSON at all. Parsing never fails:
//!
//! 1. Take the text from the first `{` to the last `}`.
//! 2. Parse it; use its `intent` member when that is an object, otherwise
//!    the object itself.
//! 3. Default missing fields: type `general_info`, params `{}`, empty reply,
//!    confidence `0.5`.
//! 4. If there is no such text or it is not valid JSON, return
//!    `general_info` with `{"topic": "unknown"}`, confidence `0.3` and the
//!    first 200 characters of the raw reply as the reply text.

use crate::intent::{DEFAULT_CONFIDENCE, IntentEnvelope};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Confidence of the intent produced when a reply cannot be parsed
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

const FALLBACK_REPLY_CHARS: usize = 200;
const DEFAULT_INTENT_TYPE: &str = "general_info";

/// First `{` through last `}`, across lines
#[allow(clippy::expect_used)] // constant pattern
static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON object pattern compiles"));

/// Extract an intent from a raw classifier reply
#[must_use]
pub fn parse_classifier_reply(raw: &str) -> IntentEnvelope {
    match extract(raw) {
        Some(envelope) => envelope,
        None => {
            tracing::debug!("Classifier reply had no usable JSON, using fallback intent");
            fallback(raw)
        },
    }
}

fn extract(raw: &str) -> Option<IntentEnvelope> {
    let candidate = JSON_OBJECT_RE.find(raw)?.as_str();
    let parsed: Map<String, Value> = serde_json::from_str(candidate).ok()?;

    let intent = match parsed.get("intent") {
        Some(Value::Object(inner)) => inner,
        _ => &parsed,
    };

    Some(IntentEnvelope {
        kind: intent
            .get("type")
            .and_then(Value::as_str)
            .filter(|kind| !kind.is_empty())
            .unwrap_or(DEFAULT_INTENT_TYPE)
            .to_string(),
        params: intent
            .get("params")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        response_text: intent
            .get("responseText")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        confidence: intent
            .get("confidence")
            .and_then(Value::as_f64)
            .map_or(DEFAULT_CONFIDENCE, |c| c.clamp(0.0, 1.0)),
    })
}

fn fallback(raw: &str) -> IntentEnvelope {
    let mut params = Map::new();
    params.insert("topic".to_string(), Value::String("unknown".to_string()));

    IntentEnvelope {
        kind: DEFAULT_INTENT_TYPE.to_string(),
        params,
        response_text: raw.chars().take(FALLBACK_REPLY_CHARS).collect(),
        confidence: FALLBACK_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapped_intent_passes_through() {
        let envelope = parse_classifier_reply(
            r#"{"intent":{"type":"rotate_building","params":{"direction":"next"},"responseText":"ok","confidence":0.9}}"#,
        );

        assert_eq!(envelope.kind, "rotate_building");
        assert_eq!(Value::Object(envelope.params), json!({"direction": "next"}));
        assert_eq!(envelope.response_text, "ok");
        assert!((envelope.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_prose_without_json_falls_back() {
        let envelope = parse_classifier_reply("I think you should rotate");

        assert_eq!(envelope.kind, "general_info");
        assert_eq!(Value::Object(envelope.params), json!({"topic": "unknown"}));
        assert_eq!(envelope.response_text, "I think you should rotate");
        assert!((envelope.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bare_object_and_surrounding_prose() {
        let envelope = parse_classifier_reply(
            "Sure! {\"type\": \"go_back\", \"responseText\": \"Going back.\"} Hope that helps.",
        );

        assert_eq!(envelope.kind, "go_back");
        assert!(envelope.params.is_empty());
        assert_eq!(envelope.response_text, "Going back.");
        assert!((envelope.confidence - DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_object_pattern_spans_first_to_last_brace() {
        let found = JSON_OBJECT_RE
            .find("a {\"x\": {\"y\": 1}}\n tail } end")
            .map(|m| m.as_str());
        assert_eq!(found, Some("{\"x\": {\"y\": 1}}\n tail }"));
        assert!(JSON_OBJECT_RE.find("no braces here").is_none());
    }

    #[test]
    fn test_multiline_reply() {
        let envelope = parse_classifier_reply(
            "```json\n{\n  \"intent\": {\n    \"type\": \"show_room\",\n    \"params\": {\"room\": \"kitchen\"}\n  }\n}\n```",
        );
        assert_eq!(envelope.kind, "show_room");
        assert_eq!(envelope.params.get("room"), Some(&json!("kitchen")));
    }

    #[test]
    fn test_empty_object_gets_all_defaults() {
        let envelope = parse_classifier_reply("{}");
        assert_eq!(envelope.kind, "general_info");
        assert!(envelope.params.is_empty());
        assert_eq!(envelope.response_text, "");
        assert!((envelope.confidence - DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_confidence_is_clamped_and_defaulted() {
        let high = parse_classifier_reply(r#"{"type":"go_back","confidence":7}"#);
        assert!((high.confidence - 1.0).abs() < f64::EPSILON);

        let text = parse_classifier_reply(r#"{"type":"go_back","confidence":"high"}"#);
        assert!((text.confidence - DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_json_falls_back_with_truncated_reply() {
        let raw = format!("{{ \"intent\": {} ", "x".repeat(300));
        let envelope = parse_classifier_reply(&raw);

        assert_eq!(envelope.kind, "general_info");
        assert_eq!(envelope.response_text.chars().count(), 200);
        assert!(raw.starts_with(&envelope.response_text));
    }

    #[test]
    fn test_fallback_truncates_on_char_boundaries() {
        let raw = "ž".repeat(250);
        let envelope = parse_classifier_reply(&raw);
        assert_eq!(envelope.response_text, "ž".repeat(200));
    }
}
