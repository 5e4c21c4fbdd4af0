use std::sync::Arc;

use crate::config::AppConfig;
use crate::providers::{
    http_client, EdamamApi, EdamamClient, FatSecretApi, FatSecretClient, OpenAiVisionClient,
    SpoonacularApi, SpoonacularClient, VisionApi,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub edamam: Arc<dyn EdamamApi>,
    pub fatsecret: Arc<dyn FatSecretApi>,
    pub spoonacular: Arc<dyn SpoonacularApi>,
    pub vision: Arc<dyn VisionApi>,
}

impl AppState {
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let http = http_client()?;

        let edamam = Arc::new(EdamamClient::new(http.clone(), config.edamam.clone())) as Arc<dyn EdamamApi>;
        let fatsecret = Arc::new(FatSecretClient::new(http.clone(), &config.fatsecret)) as Arc<dyn FatSecretApi>;
        let spoonacular = Arc::new(SpoonacularClient::new(http.clone(), config.spoonacular.clone()))
            as Arc<dyn SpoonacularApi>;
        let vision = Arc::new(OpenAiVisionClient::new(http, config.openai.clone())) as Arc<dyn VisionApi>;

        Ok(Self {
            config: Arc::new(config),
            edamam,
            fatsecret,
            spoonacular,
            vision,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        edamam: Arc<dyn EdamamApi>,
        fatsecret: Arc<dyn FatSecretApi>,
        spoonacular: Arc<dyn SpoonacularApi>,
        vision: Arc<dyn VisionApi>,
    ) -> Self {
        Self {
            config,
            edamam,
            fatsecret,
            spoonacular,
            vision,
        }
    }

    /// State backed by canned provider responses and a private upload directory.
    #[cfg(test)]
    pub fn fake() -> Self {
        use axum::async_trait;
        use serde_json::{json, Value};

        use crate::providers::{ProviderError, RecipeQuery};

        struct FakeEdamam;
        #[async_trait]
        impl EdamamApi for FakeEdamam {
            async fn parse_food(&self, text: &str) -> Result<Value, ProviderError> {
                Ok(json!({
                    "food": {"label": text, "nutrients": {"ENERC_KCAL": 52, "PROCNT": 0.3}},
                    "measures": [{"weight": 182.0}]
                }))
            }
            async fn analyze_nutrition(&self, ingredients: &[String]) -> Result<Value, ProviderError> {
                if ingredients.iter().any(|i| i.contains("unknown")) {
                    return Err(ProviderError::Status {
                        provider: "Edamam Nutrition Analysis",
                        status: 555,
                        body: r#"{"error":"low_quality"}"#.into(),
                    });
                }
                if ingredients.iter().any(|i| i.contains("odd")) {
                    return Ok(json!({"status": "odd"}));
                }
                Ok(json!({
                    "calories": 120,
                    "totalWeight": 100.0,
                    "totalNutrients": {
                        "PROCNT": {"quantity": 4.44},
                        "CHOCDF": {"quantity": 20.0},
                        "FAT": {"quantity": 2.0}
                    },
                    "ingr": ingredients
                }))
            }
            async fn search_recipes(&self, query: &RecipeQuery) -> Result<Value, ProviderError> {
                Ok(json!({"q": query.q, "calories": query.calories, "diet": query.diet, "hits": []}))
            }
        }

        struct FakeFatSecret;
        #[async_trait]
        impl FatSecretApi for FakeFatSecret {
            async fn search_foods(&self, query: &str) -> Result<Value, ProviderError> {
                Ok(json!({"foods": {"food": {
                    "food_name": query,
                    "food_description": "Per 100g - Calories: 89kcal | Fat: 0.33g | Carbs: 22.84g | Protein: 1.09g"
                }}}))
            }
        }

        struct FakeSpoonacular;
        #[async_trait]
        impl SpoonacularApi for FakeSpoonacular {
            async fn find_by_ingredients(&self, ingredients: &str) -> Result<Value, ProviderError> {
                Ok(json!([{"title": "Pie", "ingredients": ingredients}]))
            }
        }

        struct FakeVision;
        #[async_trait]
        impl VisionApi for FakeVision {
            async fn describe_image(&self, image: &[u8], _mime: &str) -> Result<String, ProviderError> {
                match image {
                    b"fail" => Err(ProviderError::Status {
                        provider: "OpenAI Vision",
                        status: 500,
                        body: String::new(),
                    }),
                    b"prose" => Ok("A bowl of something tasty.".into()),
                    _ => Ok("```json\n[{\"name\":\"rice\",\"portion\":\"120 g\",\"confidence\":0.9}]\n```".into()),
                }
            }
        }

        let mut config = AppConfig::unconfigured();
        config.upload_dir = std::env::temp_dir().join(format!("nutrihub-uploads-{}", uuid::Uuid::new_v4()));

        Self::from_parts(
            Arc::new(config),
            Arc::new(FakeEdamam),
            Arc::new(FakeFatSecret),
            Arc::new(FakeSpoonacular),
            Arc::new(FakeVision),
        )
    }
}
