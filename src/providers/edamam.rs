use axum::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{fetch_json, ProviderError};
use crate::config::{AppCredentials, EdamamConfig};

const FOOD_DATABASE: &str = "Edamam Food Database";
const NUTRITION_ANALYSIS: &str = "Edamam Nutrition Analysis";
const RECIPE_SEARCH: &str = "Edamam Recipe Search";

/// Optional filters for the recipe search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeQuery {
    pub q: Option<String>,
    pub calories: Option<String>,
    pub diet: Option<String>,
}

#[async_trait]
pub trait EdamamApi: Send + Sync {
    async fn parse_food(&self, text: &str) -> Result<Value, ProviderError>;
    async fn analyze_nutrition(&self, ingredients: &[String]) -> Result<Value, ProviderError>;
    async fn search_recipes(&self, query: &RecipeQuery) -> Result<Value, ProviderError>;
}

#[derive(Clone)]
pub struct EdamamClient {
    http: Client,
    config: EdamamConfig,
}

impl EdamamClient {
    pub fn new(http: Client, config: EdamamConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

fn credentials<'a>(
    creds: &'a Option<AppCredentials>,
    provider: &'static str,
) -> Result<&'a AppCredentials, ProviderError> {
    creds
        .as_ref()
        .ok_or(ProviderError::NotConfigured { provider })
}

#[async_trait]
impl EdamamApi for EdamamClient {
    async fn parse_food(&self, text: &str) -> Result<Value, ProviderError> {
        let creds = credentials(&self.config.food, FOOD_DATABASE)?;
        let request = self
            .http
            .get(self.url("/api/food-database/v2/parser"))
            .query(&[
                ("app_id", creds.app_id.as_str()),
                ("app_key", creds.app_key.as_str()),
                ("ingr", text),
            ]);
        fetch_json(FOOD_DATABASE, request).await
    }

    async fn analyze_nutrition(&self, ingredients: &[String]) -> Result<Value, ProviderError> {
        let creds = credentials(&self.config.nutrition, NUTRITION_ANALYSIS)?;
        let request = self
            .http
            .post(self.url("/api/nutrition-details"))
            .query(&[
                ("app_id", creds.app_id.as_str()),
                ("app_key", creds.app_key.as_str()),
            ])
            .json(&json!({ "title": "User Recipe", "ingr": ingredients }));
        fetch_json(NUTRITION_ANALYSIS, request).await
    }

    async fn search_recipes(&self, query: &RecipeQuery) -> Result<Value, ProviderError> {
        let creds = credentials(&self.config.recipe, RECIPE_SEARCH)?;
        let mut params = vec![
            ("type", "public"),
            ("app_id", creds.app_id.as_str()),
            ("app_key", creds.app_key.as_str()),
        ];
        if let Some(q) = query.q.as_deref() {
            params.push(("q", q));
        }
        if let Some(calories) = query.calories.as_deref() {
            params.push(("calories", calories));
        }
        if let Some(diet) = query.diet.as_deref() {
            params.push(("diet", diet));
        }
        let request = self.http.get(self.url("/api/recipes/v2")).query(&params);
        fetch_json(RECIPE_SEARCH, request).await
    }
}
