use anyhow::anyhow;
use tracing::debug;

use crate::error::AppError;
use crate::nutrition::{normalize, NutritionCard};
use crate::state::AppState;

/// Analyzes a single phrase such as "120 g banana" and returns its card,
/// labelled with `name` when one is given.
pub async fn nutrition_for_item(
    st: &AppState,
    text: String,
    name: Option<String>,
) -> Result<NutritionCard, AppError> {
    let payload = st.edamam.analyze_nutrition(&[text]).await?;
    let mut card = normalize(&payload)
        .into_card()
        .ok_or_else(|| anyhow!("nutrition analysis returned an unrecognized payload"))?;

    if let Some(name) = name {
        card.name = name;
    }
    debug!(name = %card.name, calories = card.calories, "item analyzed");
    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn card_takes_requested_name() {
        let st = AppState::fake();
        let card = nutrition_for_item(&st, "100 g oats".into(), Some("Oats".into()))
            .await
            .unwrap();
        assert_eq!(card.name, "Oats");
        assert_eq!(card.calories, 120.0);
        assert_eq!(card.protein_grams, 4.4);
        assert_eq!(card.serving_text, "100 g (analyzed)");
    }

    #[tokio::test]
    async fn unrecognized_analysis_is_an_error() {
        let st = AppState::fake();
        let err = nutrition_for_item(&st, "odd thing".into(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
