//! Shape-sniffing normalizer.
//!
//! Provider payloads are recognized by structure, never by a declared provider
//! flag. The predicates run in a fixed order and the first match decides:
//!
//! 1. `food.nutrients` present: single-food parse result
//! 2. top-level `calories` or a `totalNutrients` mapping: nutrition analysis
//! 3. `food_description` / `food_name` / `food_id`: packaged-food search hit
//! 4. a JSON array: recipe listing
//! 5. a known search envelope (`hints`/`parsed`, `foods.food`, `hits`, `results`)
//!
//! Anything else is [`CanonicalResult::Unrecognized`] and carries the payload back.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::model::{
    first_label, number_or_zero, parse_decimal, round1, CanonicalResult, ChoiceItem, NutritionCard,
    ITEM_PLACEHOLDER, RECIPE_PLACEHOLDER,
};

const PER_100G: &str = "per 100 g";
const PER_RECIPE: &str = "per recipe";
const PER_SERVING: &str = "per serving";
const DEFAULT_MEASURE: &str = "100 g";
const DEFAULT_RECIPE_MEASURE: &str = "1 serving";

const CALORIE_KEYS: &[&str] = &["calorie", "enerc_kcal"];
const PROTEIN_KEYS: &[&str] = &["protein", "procnt"];
const CARB_KEYS: &[&str] = &["carb", "chocdf"];
const FAT_KEYS: &[&str] = &["fat"];

lazy_static! {
    static ref CALORIES_RE: Regex = Regex::new(r"(?i)calories:\s*([0-9][0-9,.]*)\s*k?cal").unwrap();
    static ref FAT_RE: Regex = Regex::new(r"(?i)\bfat:\s*([0-9][0-9,.]*)\s*g").unwrap();
    static ref CARBS_RE: Regex = Regex::new(r"(?i)\bcarbs:\s*([0-9][0-9,.]*)\s*g").unwrap();
    static ref PROTEIN_RE: Regex = Regex::new(r"(?i)\bprotein:\s*([0-9][0-9,.]*)\s*g").unwrap();
    static ref PER_RE: Regex = Regex::new(r"(?i)^\s*per\s+(.+?)\s+-\s").unwrap();
}

pub fn normalize(payload: &Value) -> CanonicalResult {
    if let Some(food) = parsed_food(payload) {
        return CanonicalResult::Card {
            card: food_parse_card(payload, food),
        };
    }
    if is_nutrition_analysis(payload) {
        return CanonicalResult::Card {
            card: analysis_card(payload),
        };
    }
    if is_packaged_food(payload) {
        return CanonicalResult::Card {
            card: packaged_card(payload),
        };
    }
    if let Value::Array(records) = payload {
        if let Some(choices) = recipe_choices(records) {
            return CanonicalResult::Choices { choices };
        }
    }
    if let Some(choices) = envelope_choices(payload) {
        return CanonicalResult::Choices { choices };
    }
    CanonicalResult::Unrecognized {
        raw: payload.clone(),
    }
}

// --- case 1: food parser ---

fn parsed_food(payload: &Value) -> Option<&Value> {
    let food = payload.get("food")?;
    food.get("nutrients").filter(|n| n.is_object())?;
    Some(food)
}

fn food_parse_card(payload: &Value, food: &Value) -> NutritionCard {
    let nutrients = &food["nutrients"];
    let name = first_label(food, &["label", "foodId"])
        .or_else(|| first_label(payload, &["label"]))
        .unwrap_or_else(|| ITEM_PLACEHOLDER.to_string());
    let serving_text = first_measure_grams(payload)
        .or_else(|| serving_size(food))
        .unwrap_or_else(|| PER_100G.to_string());

    NutritionCard {
        name,
        serving_text,
        calories: number_or_zero(&nutrients["ENERC_KCAL"]),
        protein_grams: number_or_zero(&nutrients["PROCNT"]),
        carbs_grams: number_or_zero(&nutrients["CHOCDF"]),
        fat_grams: number_or_zero(&nutrients["FAT"]),
        raw: payload.clone(),
    }
}

fn first_measure_grams(entry: &Value) -> Option<String> {
    let weight = entry
        .get("measures")?
        .as_array()?
        .first()?
        .get("weight")
        .and_then(positive_amount)?;
    Some(format!("{} g", weight.round()))
}

fn serving_size(food: &Value) -> Option<String> {
    match food.get("servingSize")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        v => positive_amount(v).map(|n| format!("{} g", format_amount(n))),
    }
}

// --- case 2: nutrition analysis ---

fn is_nutrition_analysis(payload: &Value) -> bool {
    payload.get("calories").is_some_and(|c| !c.is_null())
        || payload.get("totalNutrients").is_some_and(Value::is_object)
}

fn analysis_card(payload: &Value) -> NutritionCard {
    let quantity = |code: &str| {
        payload
            .get("totalNutrients")
            .and_then(|t| t.get(code))
            .and_then(|n| n.get("quantity"))
            .map(number_or_zero)
            .unwrap_or(0.0)
    };

    let mut calories = payload.get("calories").map(number_or_zero).unwrap_or(0.0);
    if calories == 0.0 {
        calories = quantity("ENERC_KCAL");
    }

    let name = payload
        .get("recipe")
        .and_then(|r| first_label(r, &["label"]))
        .or_else(|| first_label(payload, &["title"]))
        .unwrap_or_else(|| RECIPE_PLACEHOLDER.to_string());
    let serving_text = payload
        .get("totalWeight")
        .and_then(positive_amount)
        .map(|w| format!("{} g (analyzed)", w.round()))
        .unwrap_or_else(|| PER_RECIPE.to_string());

    NutritionCard {
        name,
        serving_text,
        calories,
        protein_grams: quantity("PROCNT"),
        carbs_grams: quantity("CHOCDF"),
        fat_grams: quantity("FAT"),
        raw: payload.clone(),
    }
}

// --- case 3: packaged food ---

fn is_packaged_food(payload: &Value) -> bool {
    ["food_description", "food_desc", "food_name", "food_id"]
        .iter()
        .any(|k| payload.get(*k).is_some_and(|v| !v.is_null()))
}

fn description(payload: &Value) -> &str {
    ["food_description", "food_desc"]
        .iter()
        .find_map(|k| payload.get(*k).and_then(Value::as_str))
        .unwrap_or("")
}

fn packaged_card(payload: &Value) -> NutritionCard {
    let desc = description(payload);
    let name = first_label(payload, &["food_name", "food"])
        .unwrap_or_else(|| ITEM_PLACEHOLDER.to_string());
    let serving_text = per_basis(desc)
        .map(|basis| format!("per {basis}"))
        .unwrap_or_else(|| PER_100G.to_string());

    NutritionCard {
        name,
        serving_text,
        calories: labelled_amount(&CALORIES_RE, desc),
        protein_grams: labelled_amount(&PROTEIN_RE, desc),
        carbs_grams: labelled_amount(&CARBS_RE, desc),
        fat_grams: labelled_amount(&FAT_RE, desc),
        raw: payload.clone(),
    }
}

fn labelled_amount(re: &Regex, desc: &str) -> f64 {
    re.captures(desc)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_decimal(m.as_str()))
        .map(round1)
        .unwrap_or(0.0)
}

/// The "100g" in "Per 100g - Calories: ...".
fn per_basis(desc: &str) -> Option<String> {
    PER_RE
        .captures(desc)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

// --- case 4: recipe listing ---

fn recipe_choices(records: &[Value]) -> Option<Vec<ChoiceItem>> {
    let choices: Vec<ChoiceItem> = records
        .iter()
        .filter(|r| r.is_object())
        .map(|r| ChoiceItem::from_card(recipe_card(r), DEFAULT_RECIPE_MEASURE))
        .collect();
    if choices.is_empty() && !records.is_empty() {
        return None;
    }
    Some(choices)
}

#[derive(Default)]
struct Macros {
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
}

impl Macros {
    /// Files `amount` under every category whose needle occurs in `name`,
    /// unless that category already holds a value.
    fn offer(&mut self, name: &str, amount: f64) {
        let key = name.to_ascii_lowercase();
        let hit = |needles: &[&str]| needles.iter().any(|n| key.contains(n));
        if hit(CALORIE_KEYS) {
            self.calories.get_or_insert(amount);
        }
        if hit(PROTEIN_KEYS) {
            self.protein.get_or_insert(amount);
        }
        if hit(CARB_KEYS) {
            self.carbs.get_or_insert(amount);
        }
        if hit(FAT_KEYS) {
            self.fat.get_or_insert(amount);
        }
    }

    fn collect(source: Option<&Value>) -> Self {
        let mut macros = Self::default();
        match source {
            Some(Value::Array(entries)) => {
                for entry in entries {
                    if let Some(name) = first_label(entry, &["name", "label"]) {
                        macros.offer(&name, nutrient_amount(entry));
                    }
                }
            }
            Some(Value::Object(map)) => {
                for (name, v) in map {
                    macros.offer(name, nutrient_amount(v));
                }
            }
            _ => {}
        }
        macros
    }
}

/// A nutrient value is either a bare number or an object carrying one.
fn nutrient_amount(v: &Value) -> f64 {
    match v {
        Value::Object(_) => ["amount", "value", "quantity"]
            .iter()
            .find_map(|k| v.get(*k).filter(|x| !x.is_null()))
            .map(number_or_zero)
            .unwrap_or(0.0),
        other => number_or_zero(other),
    }
}

fn recipe_card(record: &Value) -> NutritionCard {
    let name = first_label(record, &["title", "name", "label"])
        .unwrap_or_else(|| RECIPE_PLACEHOLDER.to_string());

    let source = match record.get("nutrition") {
        Some(n) => Some(n.get("nutrients").filter(|x| !x.is_null()).unwrap_or(n)),
        None => record.get("totalNutrients"),
    };
    let macros = Macros::collect(source);

    let serving_text = ["servings", "yield"]
        .iter()
        .find_map(|k| record.get(*k).and_then(positive_amount))
        .map(|n| format!("{} servings", format_amount(n)))
        .unwrap_or_else(|| PER_SERVING.to_string());

    NutritionCard {
        name,
        serving_text,
        calories: macros.calories.unwrap_or(0.0),
        protein_grams: macros.protein.unwrap_or(0.0),
        carbs_grams: macros.carbs.unwrap_or(0.0),
        fat_grams: macros.fat.unwrap_or(0.0),
        raw: record.clone(),
    }
}

// --- search envelopes ---

fn envelope_choices(payload: &Value) -> Option<Vec<ChoiceItem>> {
    if !payload.is_object() {
        return None;
    }
    food_parser_hints(payload)
        .or_else(|| packaged_search(payload))
        .or_else(|| recipe_listing(payload))
}

fn food_parser_hints(payload: &Value) -> Option<Vec<ChoiceItem>> {
    let parsed = payload.get("parsed").and_then(Value::as_array);
    let hints = payload.get("hints").and_then(Value::as_array);
    if parsed.is_none() && hints.is_none() {
        return None;
    }

    let mut seen = HashSet::new();
    let choices = parsed
        .into_iter()
        .chain(hints)
        .flatten()
        .filter_map(|entry| {
            let food = entry.get("food").filter(|f| f.is_object())?;
            if let Some(id) = food.get("foodId").and_then(Value::as_str) {
                if !seen.insert(id.to_string()) {
                    return None;
                }
            }
            let measure =
                first_measure_grams(entry).unwrap_or_else(|| DEFAULT_MEASURE.to_string());
            Some(ChoiceItem::from_card(food_parse_card(entry, food), measure))
        })
        .collect();
    Some(choices)
}

fn packaged_search(payload: &Value) -> Option<Vec<ChoiceItem>> {
    let foods = payload.get("foods").filter(|f| f.is_object())?;
    let listed: Vec<&Value> = match foods.get("food") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    };
    let choices = listed
        .into_iter()
        .filter(|f| f.is_object())
        .map(|f| {
            let measure = per_basis(description(f)).unwrap_or_else(|| DEFAULT_MEASURE.to_string());
            ChoiceItem::from_card(packaged_card(f), measure)
        })
        .collect();
    Some(choices)
}

fn recipe_listing(payload: &Value) -> Option<Vec<ChoiceItem>> {
    if let Some(hits) = payload.get("hits").and_then(Value::as_array) {
        let recipes: Vec<Value> = hits
            .iter()
            .filter_map(|h| h.get("recipe").cloned())
            .collect();
        return recipe_choices(&recipes).or(Some(Vec::new()));
    }
    let results = payload.get("results").and_then(Value::as_array)?;
    recipe_choices(results)
}

// --- helpers ---

fn positive_amount(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_decimal(s)?,
        _ => return None,
    };
    (n.is_finite() && n > 0.0).then_some(n)
}

fn format_amount(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{}", (n * 10.0).round() / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card(result: CanonicalResult) -> NutritionCard {
        match result {
            CanonicalResult::Card { card } => card,
            other => panic!("expected a card, got {other:?}"),
        }
    }

    fn choices(result: CanonicalResult) -> Vec<ChoiceItem> {
        match result {
            CanonicalResult::Choices { choices } => choices,
            other => panic!("expected choices, got {other:?}"),
        }
    }

    #[test]
    fn food_parser_payload_reads_nutrient_codes() {
        let payload = json!({
            "food": {
                "foodId": "food_a1",
                "label": "Banana",
                "nutrients": {"ENERC_KCAL": 89.04, "PROCNT": 1.09, "FAT": 0.33, "CHOCDF": 22.84}
            },
            "measures": [{"label": "Whole", "weight": 117.6}]
        });
        let c = card(normalize(&payload));
        assert_eq!(c.name, "Banana");
        assert_eq!(c.serving_text, "118 g");
        assert_eq!(c.calories, 89.0);
        assert_eq!(c.protein_grams, 1.1);
        assert_eq!(c.fat_grams, 0.3);
        assert_eq!(c.carbs_grams, 22.8);
        assert_eq!(c.raw, payload);
    }

    #[test]
    fn food_parser_missing_nutrients_default_to_zero() {
        let payload = json!({"food": {"nutrients": {"ENERC_KCAL": "52"}}});
        let c = card(normalize(&payload));
        assert_eq!(c.name, "Item");
        assert_eq!(c.serving_text, "per 100 g");
        assert_eq!(c.calories, 52.0);
        assert_eq!(c.protein_grams, 0.0);
        assert_eq!(c.carbs_grams, 0.0);
        assert_eq!(c.fat_grams, 0.0);
    }

    #[test]
    fn food_parser_falls_back_to_serving_size_then_food_id() {
        let payload = json!({
            "food": {"foodId": "food_x", "servingSize": "1 cup", "nutrients": {}},
            "measures": []
        });
        let c = card(normalize(&payload));
        assert_eq!(c.name, "food_x");
        assert_eq!(c.serving_text, "1 cup");
    }

    #[test]
    fn nutrition_analysis_reads_quantities() {
        let payload = json!({
            "calories": 412,
            "totalWeight": 250.4,
            "totalNutrients": {
                "PROCNT": {"label": "Protein", "quantity": 20.26, "unit": "g"},
                "CHOCDF": {"label": "Carbs", "quantity": 55.51, "unit": "g"}
            }
        });
        let c = card(normalize(&payload));
        assert_eq!(c.name, "Recipe");
        assert_eq!(c.serving_text, "250 g (analyzed)");
        assert_eq!(c.calories, 412.0);
        assert_eq!(c.protein_grams, 20.3);
        assert_eq!(c.carbs_grams, 55.5);
        assert_eq!(c.fat_grams, 0.0);
    }

    #[test]
    fn nutrition_analysis_without_calories_uses_energy_code() {
        let payload = json!({
            "title": "Dal",
            "totalNutrients": {"ENERC_KCAL": {"quantity": 180.0, "unit": "kcal"}}
        });
        let c = card(normalize(&payload));
        assert_eq!(c.name, "Dal");
        assert_eq!(c.serving_text, "per recipe");
        assert_eq!(c.calories, 180.0);
    }

    #[test]
    fn packaged_description_extracts_each_macro_in_any_order() {
        let payload = json!({
            "food_name": "Banana",
            "food_description": "Per 100g - Protein: 1.09g | Carbs: 22.84g | Calories: 89kcal | Fat: 0.33g"
        });
        let c = card(normalize(&payload));
        assert_eq!(c.name, "Banana");
        assert_eq!(c.serving_text, "per 100g");
        assert_eq!(c.calories, 89.0);
        assert_eq!(c.fat_grams, 0.3);
        assert_eq!(c.carbs_grams, 22.8);
        assert_eq!(c.protein_grams, 1.1);
    }

    #[test]
    fn packaged_description_missing_labels_yield_zero() {
        let payload = json!({"food_id": "33691", "food_description": "calories: 1,250 KCAL"});
        let c = card(normalize(&payload));
        assert_eq!(c.name, "Item");
        assert_eq!(c.serving_text, "per 100 g");
        assert_eq!(c.calories, 1250.0);
        assert_eq!(c.fat_grams, 0.0);
        assert_eq!(c.carbs_grams, 0.0);
        assert_eq!(c.protein_grams, 0.0);
    }

    #[test]
    fn recipe_array_accepts_named_entries_and_flat_mapping() {
        let payload = json!([
            {"title": "Soup", "nutrition": {"nutrients": [{"name": "Calories", "amount": 250}]}},
            {"name": "Salad", "servings": 2, "nutrition": {"calories": 300}}
        ]);
        let list = choices(normalize(&payload));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].label, "Soup");
        assert_eq!(list[0].preview.calories, 250.0);
        assert_eq!(list[0].preview.serving_text, "per serving");
        assert_eq!(list[0].measure_text, "1 serving");
        assert_eq!(list[1].preview.calories, 300.0);
        assert_eq!(list[1].preview.serving_text, "2 servings");
    }

    #[test]
    fn recipe_nutrient_first_match_wins() {
        let payload = json!([{
            "title": "Stew",
            "nutrition": {"nutrients": [
                {"name": "Fat", "amount": 12},
                {"name": "Saturated Fat", "amount": 4},
                {"name": "Carbohydrates", "amount": 30},
                {"name": "Net Carbohydrates", "amount": 25},
                {"name": "Protein", "amount": "9.04"}
            ]}
        }]);
        let preview = &choices(normalize(&payload))[0].preview;
        assert_eq!(preview.fat_grams, 12.0);
        assert_eq!(preview.carbs_grams, 30.0);
        assert_eq!(preview.protein_grams, 9.0);
        assert_eq!(preview.calories, 0.0);
    }

    #[test]
    fn recipe_without_nutrition_uses_placeholder_and_zeroes() {
        let payload = json!([{"id": 641803, "usedIngredientCount": 2}]);
        let list = choices(normalize(&payload));
        assert_eq!(list[0].label, "Recipe");
        assert_eq!(list[0].preview.calories, 0.0);
    }

    #[test]
    fn empty_object_is_unrecognized() {
        assert_eq!(
            normalize(&json!({})),
            CanonicalResult::Unrecognized { raw: json!({}) }
        );
    }

    #[test]
    fn scalars_and_scalar_arrays_are_unrecognized() {
        for payload in [json!(null), json!(42), json!("text"), json!([1, 2])] {
            assert!(matches!(
                normalize(&payload),
                CanonicalResult::Unrecognized { .. }
            ));
        }
    }

    #[test]
    fn priority_prefers_food_parse_over_analysis() {
        let payload = json!({"calories": 999, "food": {"label": "Egg", "nutrients": {"ENERC_KCAL": 70}}});
        assert_eq!(card(normalize(&payload)).calories, 70.0);
    }

    #[test]
    fn parser_envelope_lists_hints_once_per_food() {
        let payload = json!({
            "text": "apple",
            "parsed": [{"food": {"foodId": "f1", "label": "Apple", "nutrients": {"ENERC_KCAL": 52}}}],
            "hints": [
                {"food": {"foodId": "f1", "label": "Apple", "nutrients": {"ENERC_KCAL": 52}},
                 "measures": [{"weight": 182.0}]},
                {"food": {"foodId": "f2", "label": "Apple Juice", "nutrients": {"ENERC_KCAL": 46}},
                 "measures": [{"weight": 248.0}]}
            ]
        });
        let list = choices(normalize(&payload));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].label, "Apple");
        assert_eq!(list[0].measure_text, "100 g");
        assert_eq!(list[1].measure_text, "248 g");
        assert_eq!(list[1].lookup_text(), "248 g Apple Juice");
        assert_eq!(list[1].preview.calories, 46.0);
    }

    #[test]
    fn packaged_envelope_accepts_single_object_and_list() {
        let single = json!({"foods": {"food": {
            "food_name": "Cola",
            "food_description": "Per 1 can - Calories: 140kcal | Fat: 0.00g | Carbs: 39.00g | Protein: 0.00g"
        }}});
        let list = choices(normalize(&single));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].measure_text, "1 can");
        assert_eq!(list[0].preview.serving_text, "per 1 can");
        assert_eq!(list[0].preview.carbs_grams, 39.0);

        let empty = json!({"foods": {"max_results": "20", "total_results": "0"}});
        assert!(choices(normalize(&empty)).is_empty());
    }

    #[test]
    fn recipe_hits_envelope_reads_total_nutrients() {
        let payload = json!({"hits": [{"recipe": {
            "label": "Chicken Curry",
            "yield": 4.0,
            "totalNutrients": {
                "ENERC_KCAL": {"quantity": 1600.4},
                "FAT": {"quantity": 80.0},
                "PROCNT": {"quantity": 120.0}
            }
        }}]});
        let list = choices(normalize(&payload));
        assert_eq!(list[0].label, "Chicken Curry");
        assert_eq!(list[0].preview.serving_text, "4 servings");
        assert_eq!(list[0].preview.calories, 1600.4);
        assert_eq!(list[0].preview.fat_grams, 80.0);
        assert_eq!(list[0].preview.protein_grams, 120.0);
    }
}
