use serde::{Deserialize, Serialize};

use super::model::{round1, NutritionCard};

/// Client-owned ordered log of cards the user chose to keep for the day.
/// The server never reads or stores one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyLog {
    entries: Vec<NutritionCard>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroTotals {
    pub calories: f64,
    pub protein_grams: f64,
    pub carbs_grams: f64,
    pub fat_grams: f64,
}

impl DailyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, card: NutritionCard) {
        self.entries.push(card);
    }

    /// Removes the entry at `index`; out-of-range indexes are ignored.
    pub fn remove(&mut self, index: usize) -> Option<NutritionCard> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[NutritionCard] {
        &self.entries
    }

    pub fn totals(&self) -> MacroTotals {
        let sum = self.entries.iter().fold(MacroTotals::default(), |acc, c| MacroTotals {
            calories: acc.calories + c.calories,
            protein_grams: acc.protein_grams + c.protein_grams,
            carbs_grams: acc.carbs_grams + c.carbs_grams,
            fat_grams: acc.fat_grams + c.fat_grams,
        });
        MacroTotals {
            calories: round1(sum.calories),
            protein_grams: round1(sum.protein_grams),
            carbs_grams: round1(sum.carbs_grams),
            fat_grams: round1(sum.fat_grams),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card(name: &str, calories: f64, protein: f64) -> NutritionCard {
        NutritionCard {
            name: name.into(),
            serving_text: "1 serving".into(),
            calories,
            protein_grams: protein,
            carbs_grams: 0.0,
            fat_grams: 0.0,
            raw: json!({}),
        }
    }

    #[test]
    fn append_remove_clear() {
        let mut log = DailyLog::new();
        log.append(card("oats", 150.0, 5.0));
        log.append(card("milk", 103.0, 8.1));
        log.append(card("egg", 70.0, 6.3));

        assert_eq!(log.remove(1).map(|c| c.name), Some("milk".to_string()));
        assert_eq!(log.remove(5), None);
        let names: Vec<&str> = log.entries().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["oats", "egg"]);

        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn totals_are_rounded_sums() {
        let mut log = DailyLog::new();
        log.append(card("a", 0.1, 0.2));
        log.append(card("b", 0.2, 0.1));
        let t = log.totals();
        assert_eq!(t.calories, 0.3);
        assert_eq!(t.protein_grams, 0.3);
        assert_eq!(DailyLog::new().totals(), MacroTotals::default());
    }

    #[test]
    fn serializes_as_plain_list() {
        let mut log = DailyLog::new();
        log.append(card("oats", 150.0, 5.0));
        let v = serde_json::to_value(&log).unwrap();
        assert!(v.is_array());
        let back: DailyLog = serde_json::from_value(v).unwrap();
        assert_eq!(back, log);
    }
}
