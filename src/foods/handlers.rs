use axum::{extract::State, routing::post, Json, Router};
use serde_json::Value;
use tracing::{info, instrument};

use super::dto::{
    calorie_filter, optional, required, FoodParserRequest, IngredientSearchRequest,
    NutritionByItemRequest, NutritionRequest, PackagedSearchRequest, RecipeSearchRequest,
};
use super::services::nutrition_for_item;
use crate::{
    error::AppError,
    nutrition::{normalize, CanonicalResult, NutritionCard},
    providers::RecipeQuery,
    state::AppState,
};

pub fn edamam_routes() -> Router<AppState> {
    Router::new()
        .route("/edamam/food-parser", post(food_parser))
        .route("/edamam/nutrition", post(nutrition))
        .route("/edamam/nutrition-by-item", post(nutrition_by_item))
        .route("/edamam/recipes", post(edamam_recipes))
}

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/spoonacular/search-recipes", post(spoonacular_recipes))
        .route("/fatsecret/search", post(fatsecret_search))
        .route("/normalize", post(normalize_payload))
}

#[instrument(skip(state, body))]
pub async fn food_parser(
    State(state): State<AppState>,
    Json(body): Json<FoodParserRequest>,
) -> Result<Json<Value>, AppError> {
    let text = required(body.text, "text")?;
    let data = state.edamam.parse_food(&text).await?;
    Ok(Json(data))
}

#[instrument(skip(state, body))]
pub async fn nutrition(
    State(state): State<AppState>,
    Json(body): Json<NutritionRequest>,
) -> Result<Json<Value>, AppError> {
    let lines = body.ingredients.map(|i| i.into_lines()).unwrap_or_default();
    if lines.is_empty() {
        return Err(AppError::MissingField("ingredients"));
    }
    info!(lines = lines.len(), "analyzing ingredient lines");
    let data = state.edamam.analyze_nutrition(&lines).await?;
    Ok(Json(data))
}

#[instrument(skip(state, body))]
pub async fn nutrition_by_item(
    State(state): State<AppState>,
    Json(body): Json<NutritionByItemRequest>,
) -> Result<Json<NutritionCard>, AppError> {
    let (text, name) = body.lookup()?;
    let card = nutrition_for_item(&state, text, name).await?;
    Ok(Json(card))
}

#[instrument(skip(state, body))]
pub async fn edamam_recipes(
    State(state): State<AppState>,
    Json(body): Json<RecipeSearchRequest>,
) -> Result<Json<Value>, AppError> {
    let query = RecipeQuery {
        q: optional(body.q),
        calories: calorie_filter(body.calories),
        diet: optional(body.diet),
    };
    let data = state.edamam.search_recipes(&query).await?;
    Ok(Json(data))
}

#[instrument(skip(state, body))]
pub async fn spoonacular_recipes(
    State(state): State<AppState>,
    Json(body): Json<IngredientSearchRequest>,
) -> Result<Json<Value>, AppError> {
    let lines = body.ingredients.map(|i| i.into_lines()).unwrap_or_default();
    if lines.is_empty() {
        return Err(AppError::MissingField("ingredients"));
    }
    let data = state.spoonacular.find_by_ingredients(&lines.join(",")).await?;
    Ok(Json(data))
}

#[instrument(skip(state, body))]
pub async fn fatsecret_search(
    State(state): State<AppState>,
    Json(body): Json<PackagedSearchRequest>,
) -> Result<Json<Value>, AppError> {
    let query = required(body.query, "query")?;
    let data = state.fatsecret.search_foods(&query).await?;
    Ok(Json(data))
}

/// Maps any provider payload the client already holds onto the canonical shapes.
#[instrument(skip(payload))]
pub async fn normalize_payload(Json(payload): Json<Value>) -> Json<CanonicalResult> {
    Json(normalize(&payload))
}
