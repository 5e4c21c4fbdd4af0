use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ITEM_PLACEHOLDER: &str = "Item";
pub const RECIPE_PLACEHOLDER: &str = "Recipe";
pub const DETECTION_PLACEHOLDER: &str = "Detected item";
pub const DEFAULT_PORTION: &str = "1 serving";

/// Canonical nutrition record produced from any provider payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionCard {
    pub name: String,
    pub serving_text: String,
    pub calories: f64,
    pub protein_grams: f64,
    pub carbs_grams: f64,
    pub fat_grams: f64,
    pub raw: Value,
}

/// Candidate item the user picks before nutrition is looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub label: String,
    pub measure_text: String,
    pub source_record: Value,
    /// Macros readable from the listing record itself (zeros when it carries none).
    pub preview: NutritionCard,
}

impl ChoiceItem {
    /// Phrase handed to the nutrition analyzer, e.g. "120 g banana".
    pub fn lookup_text(&self) -> String {
        format!("{} {}", self.measure_text, self.label)
    }

    pub(crate) fn from_card(card: NutritionCard, measure_text: impl Into<String>) -> Self {
        Self {
            label: card.name.clone(),
            measure_text: measure_text.into(),
            source_record: card.raw.clone(),
            preview: card,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionDetection {
    pub name: String,
    pub portion: String,
    pub confidence: f64,
}

impl VisionDetection {
    pub fn into_choice(self) -> ChoiceItem {
        let raw = serde_json::to_value(&self).unwrap_or(Value::Null);
        let preview = NutritionCard {
            name: self.name.clone(),
            serving_text: self.portion.clone(),
            calories: 0.0,
            protein_grams: 0.0,
            carbs_grams: 0.0,
            fat_grams: 0.0,
            raw: raw.clone(),
        };
        ChoiceItem {
            label: self.name,
            measure_text: self.portion,
            source_record: raw,
            preview,
        }
    }
}

/// Outcome of shape-sniffing a provider payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CanonicalResult {
    Card { card: NutritionCard },
    Choices { choices: Vec<ChoiceItem> },
    Unrecognized { raw: Value },
}

impl CanonicalResult {
    pub fn into_card(self) -> Option<NutritionCard> {
        match self {
            CanonicalResult::Card { card } => Some(card),
            _ => None,
        }
    }
}

/// Coerces any JSON value into a finite, non-negative macro figure rounded to
/// one decimal. Anything that is not a number or numeric string becomes 0.
pub fn number_or_zero(v: &Value) -> f64 {
    let n = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_decimal(s).unwrap_or(0.0),
        _ => 0.0,
    };
    round1(n)
}

pub(crate) fn parse_decimal(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

pub(crate) fn round1(n: f64) -> f64 {
    if !n.is_finite() || n <= 0.0 {
        return 0.0;
    }
    let scaled = n * 10.0;
    if !scaled.is_finite() {
        // Already far past one-decimal precision.
        return n;
    }
    scaled.round() / 10.0
}

/// First non-blank string among `keys` on `obj`.
pub(crate) fn first_label(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
}
