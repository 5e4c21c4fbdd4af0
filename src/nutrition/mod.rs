mod daily_log;
mod extract;
mod model;
mod normalize;

pub use daily_log::{DailyLog, MacroTotals};
pub use extract::{extract_detections, Extraction};
pub use model::{number_or_zero, CanonicalResult, ChoiceItem, NutritionCard, VisionDetection};
pub use normalize::normalize;
