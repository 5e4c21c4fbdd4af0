use axum::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{fetch_json, ProviderError};
use crate::config::SpoonacularConfig;

const PROVIDER: &str = "Spoonacular";
const RESULT_COUNT: &str = "6";

#[async_trait]
pub trait SpoonacularApi: Send + Sync {
    /// `ingredients` is a comma-separated list, e.g. "apples,flour,sugar".
    async fn find_by_ingredients(&self, ingredients: &str) -> Result<Value, ProviderError>;
}

#[derive(Clone)]
pub struct SpoonacularClient {
    http: Client,
    config: SpoonacularConfig,
}

impl SpoonacularClient {
    pub fn new(http: Client, config: SpoonacularConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl SpoonacularApi for SpoonacularClient {
    async fn find_by_ingredients(&self, ingredients: &str) -> Result<Value, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured { provider: PROVIDER })?;

        let url = format!(
            "{}/recipes/findByIngredients",
            self.config.base_url.trim_end_matches('/')
        );
        let request = self.http.get(url).query(&[
            ("ingredients", ingredients),
            ("number", RESULT_COUNT),
            ("apiKey", api_key),
        ]);
        fetch_json(PROVIDER, request).await
    }
}
