//! Recovers structured detections from free-form vision model output.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::model::{first_label, parse_decimal, VisionDetection, DEFAULT_PORTION, DETECTION_PLACEHOLDER};

lazy_static! {
    static ref FENCE_RE: Regex = Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").unwrap();
    static ref BRACKETED_RE: Regex = Regex::new(r"(?s)\[.*?\]|\{.*?\}").unwrap();
}

/// Wrapper keys models like to put the detection list under.
const LIST_KEYS: &[&str] = &["items", "foods", "detections"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Extraction {
    #[serde(rename = "items")]
    Detections(Vec<VisionDetection>),
    RawText(String),
}

/// Never fails: text that holds no recoverable detection comes back as
/// [`Extraction::RawText`].
///
/// Candidates are tried in order: the (fenced) body as a whole, the first
/// non-greedy bracketed span, then a one-value parse at every `[` / `{`. A
/// candidate only counts when it yields at least one detection, so footnotes
/// like `[1]` or bare number lists never hide the model's prose.
pub fn extract_detections(text: &str) -> Extraction {
    let body = FENCE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str())
        .trim();

    let whole = (body.starts_with('[') || body.starts_with('{'))
        .then(|| serde_json::from_str::<Value>(body).ok())
        .flatten();
    let bracketed = BRACKETED_RE
        .find(body)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok());

    whole
        .into_iter()
        .chain(bracketed)
        .chain(embedded_values(body))
        .find_map(recovered)
        .map_or_else(|| Extraction::RawText(text.to_string()), Extraction::Detections)
}

fn recovered(value: Value) -> Option<Vec<VisionDetection>> {
    let detections = detections_from(value);
    (!detections.is_empty()).then_some(detections)
}

/// Single-value JSON parses starting at each `[` / `{`, in order.
fn embedded_values(text: &str) -> impl Iterator<Item = Value> + '_ {
    text.char_indices()
        .filter(|(_, c)| *c == '[' || *c == '{')
        .filter_map(move |(i, _)| {
            serde_json::Deserializer::from_str(&text[i..])
                .into_iter::<Value>()
                .next()
                .and_then(Result::ok)
        })
        .filter(|v| v.is_array() || v.is_object())
}

fn detections_from(value: Value) -> Vec<VisionDetection> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) if !map.contains_key("name") && !map.contains_key("label") => {
            match LIST_KEYS
                .iter()
                .find(|k| map.get(**k).is_some_and(Value::is_array))
            {
                Some(key) => match map.remove(*key) {
                    Some(Value::Array(list)) => list,
                    _ => Vec::new(),
                },
                None => vec![Value::Object(map)],
            }
        }
        other => vec![other],
    };
    items.iter().filter_map(detection).collect()
}

/// Keys that mark an object as describing a detected food.
const DETECTION_KEYS: &[&str] = &["name", "label", "portion", "amount", "quantity", "confidence"];

fn detection(item: &Value) -> Option<VisionDetection> {
    match item {
        Value::Object(map) if DETECTION_KEYS.iter().any(|k| map.contains_key(*k)) => {
            Some(VisionDetection {
                name: first_label(item, &["name", "label"])
                    .unwrap_or_else(|| DETECTION_PLACEHOLDER.to_string()),
                portion: portion(item).unwrap_or_else(|| DEFAULT_PORTION.to_string()),
                confidence: item.get("confidence").map_or(0.0, confidence),
            })
        }
        Value::String(s) if !s.trim().is_empty() => Some(VisionDetection {
            name: s.trim().to_string(),
            portion: DEFAULT_PORTION.to_string(),
            confidence: 0.0,
        }),
        _ => None,
    }
}

fn portion(item: &Value) -> Option<String> {
    first_label(item, &["portion", "amount", "quantity"]).or_else(|| {
        ["portion", "amount", "quantity"]
            .iter()
            .find_map(|k| item.get(*k).and_then(Value::as_f64))
            .filter(|n| n.is_finite())
            .map(|n| n.to_string())
    })
}

fn confidence(v: &Value) -> f64 {
    let n = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_decimal(s).unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detections(e: Extraction) -> Vec<VisionDetection> {
        match e {
            Extraction::Detections(d) => d,
            Extraction::RawText(t) => panic!("expected detections, got raw text {t:?}"),
        }
    }

    #[test]
    fn plain_json_array_is_taken_as_is() {
        let d = detections(extract_detections(
            r#"[{"name":"rice","portion":"120g","confidence":0.9}]"#,
        ));
        assert_eq!(
            d,
            vec![VisionDetection {
                name: "rice".into(),
                portion: "120g".into(),
                confidence: 0.9,
            }]
        );
    }

    #[test]
    fn fenced_json_defaults_missing_confidence() {
        let d = detections(extract_detections(
            "```json\n[{\"name\":\"egg\",\"portion\":\"1 unit\"}]\n```",
        ));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].name, "egg");
        assert_eq!(d[0].portion, "1 unit");
        assert_eq!(d[0].confidence, 0.0);
    }

    #[test]
    fn untagged_fence_inside_prose() {
        let text = "Sure! Here you go:\n```\n{\"name\":\"toast\",\"confidence\":\"0.7\"}\n```\nEnjoy.";
        let d = detections(extract_detections(text));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].name, "toast");
        assert_eq!(d[0].portion, "1 serving");
        assert_eq!(d[0].confidence, 0.7);
    }

    #[test]
    fn prose_without_brackets_returns_raw_text() {
        let text = "I can see a plate with some pasta and a salad.";
        assert_eq!(extract_detections(text), Extraction::RawText(text.to_string()));
    }

    #[test]
    fn embedded_array_is_found_after_prose() {
        let text = r#"The image shows: [{"name":"apple","portion":"1 medium","confidence":0.95}] hope that helps"#;
        let d = detections(extract_detections(text));
        assert_eq!(d[0].name, "apple");
        assert_eq!(d[0].confidence, 0.95);
    }

    #[test]
    fn nested_brackets_fall_back_to_balanced_scan() {
        let text = r#"Result -> [{"name":"bowl","tags":["hot"]},{"name":"bread"}] end"#;
        let d = detections(extract_detections(text));
        assert_eq!(d.len(), 2);
        assert_eq!(d[1].name, "bread");
    }

    #[test]
    fn bracketed_prose_before_json_is_skipped() {
        let text = r#"[note] detected {"name":"pear","portion":"150 g"}"#;
        let d = detections(extract_detections(text));
        assert_eq!(d[0].name, "pear");
        assert_eq!(d[0].portion, "150 g");
    }

    #[test]
    fn wrapped_list_is_unwrapped() {
        let d = detections(extract_detections(
            r#"{"items":[{"label":"soup","amount":"1 bowl"}, "bread", 7]}"#,
        ));
        assert_eq!(d.len(), 2);
        assert_eq!(d[0].name, "soup");
        assert_eq!(d[0].portion, "1 bowl");
        assert_eq!(d[1].name, "bread");
    }

    #[test]
    fn confidence_is_clamped_and_names_defaulted() {
        let d = detections(extract_detections(r#"[{"confidence": 3}, {"confidence": -1, "portion": 200}]"#));
        assert_eq!(d[0].name, "Detected item");
        assert_eq!(d[0].confidence, 1.0);
        assert_eq!(d[1].confidence, 0.0);
        assert_eq!(d[1].portion, "200");
    }

    #[test]
    fn broken_json_with_no_recoverable_value_is_raw() {
        let text = "```json\n[{\"name\": \"rice\",\n```";
        assert_eq!(extract_detections(text), Extraction::RawText(text.to_string()));
    }

    #[test]
    fn footnote_marker_keeps_prose() {
        let text = "The plate holds pasta with tomato sauce [1] and a side salad.";
        assert_eq!(extract_detections(text), Extraction::RawText(text.to_string()));
    }

    #[test]
    fn empty_object_is_not_a_detection() {
        let text = "I could not find any food here {}";
        assert_eq!(extract_detections(text), Extraction::RawText(text.to_string()));
    }

    #[test]
    fn bare_number_list_keeps_prose() {
        let text = "Confidence per item: [0.9, 0.4]";
        assert_eq!(extract_detections(text), Extraction::RawText(text.to_string()));
    }

    #[test]
    fn later_candidate_wins_after_empty_one() {
        let text = r#"See [1]. Foods: [{"name":"soup","portion":"1 bowl"}]"#;
        let d = detections(extract_detections(text));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].name, "soup");
    }

    #[test]
    fn serializes_to_items_or_raw_text() {
        let items = serde_json::to_value(Extraction::Detections(vec![])).unwrap();
        assert_eq!(items, serde_json::json!({"items": []}));
        let raw = serde_json::to_value(Extraction::RawText("x".into())).unwrap();
        assert_eq!(raw, serde_json::json!({"rawText": "x"}));
    }
}
