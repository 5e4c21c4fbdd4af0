use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::nutrition::{ChoiceItem, VisionDetection};

/// A single ingredient line or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientLines {
    One(String),
    Many(Vec<String>),
}

impl IngredientLines {
    /// Trimmed, non-blank lines.
    pub fn into_lines(self) -> Vec<String> {
        let lines = match self {
            IngredientLines::One(line) => vec![line],
            IngredientLines::Many(lines) => lines,
        };
        lines
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct FoodParserRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NutritionRequest {
    pub ingredients: Option<IngredientLines>,
}

/// Either `text` (e.g. "120 g banana") or an item picked from a choice list
/// or a vision scan.
#[derive(Debug, Deserialize)]
pub struct NutritionByItemRequest {
    pub text: Option<String>,
    pub name: Option<String>,
    pub choice: Option<PickedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PickedItem {
    Choice(ChoiceItem),
    Detection(VisionDetection),
}

impl PickedItem {
    pub fn into_choice(self) -> ChoiceItem {
        match self {
            PickedItem::Choice(choice) => choice,
            PickedItem::Detection(detection) => detection.into_choice(),
        }
    }
}

impl NutritionByItemRequest {
    /// Analyzer phrase and display name. A picked item wins over `text` and
    /// lends its label when no `name` is given.
    pub fn lookup(self) -> Result<(String, Option<String>), AppError> {
        let name = optional(self.name);
        match self.choice {
            Some(picked) => {
                let choice = picked.into_choice();
                let text = required(Some(choice.lookup_text()), "text")?;
                Ok((text, name.or(optional(Some(choice.label)))))
            }
            None => Ok((required(self.text, "text")?, name)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecipeSearchRequest {
    pub q: Option<String>,
    /// Either a number ("600") or an Edamam range ("100-600").
    pub calories: Option<Value>,
    pub diet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IngredientSearchRequest {
    pub ingredients: Option<IngredientLines>,
}

#[derive(Debug, Deserialize)]
pub struct PackagedSearchRequest {
    pub query: Option<String>,
}

pub fn required(value: Option<String>, field: &'static str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingField(field))
}

pub fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn calorie_filter(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => optional(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
