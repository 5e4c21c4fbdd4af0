use std::path::PathBuf;

use anyhow::Context;

pub const EDAMAM_BASE_URL: &str = "https://api.edamam.com";
pub const FATSECRET_BASE_URL: &str = "https://platform.fatsecret.com";
pub const SPOONACULAR_BASE_URL: &str = "https://api.spoonacular.com";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";

/// An application id / key pair as issued by Edamam.
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_key: String,
}

#[derive(Debug, Clone)]
pub struct EdamamConfig {
    pub base_url: String,
    pub food: Option<AppCredentials>,
    pub nutrition: Option<AppCredentials>,
    pub recipe: Option<AppCredentials>,
}

#[derive(Debug, Clone)]
pub struct FatSecretConfig {
    pub base_url: String,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SpoonacularConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub edamam: EdamamConfig,
    pub fatsecret: FatSecretConfig,
    pub spoonacular: SpoonacularConfig,
    pub openai: OpenAiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .context("APP_PORT must be a port number")?;

        Ok(Self {
            host: var_or("APP_HOST", "0.0.0.0"),
            port,
            static_dir: var_or("STATIC_DIR", "public").into(),
            upload_dir: var_or("UPLOAD_DIR", "uploads").into(),
            edamam: EdamamConfig {
                base_url: var_or("EDAMAM_BASE_URL", EDAMAM_BASE_URL),
                food: pair("EDAMAM_FOOD_APP_ID", "EDAMAM_FOOD_APP_KEY"),
                nutrition: pair("EDAMAM_NUTRITION_APP_ID", "EDAMAM_NUTRITION_APP_KEY"),
                recipe: pair("EDAMAM_RECIPE_APP_ID", "EDAMAM_RECIPE_APP_KEY"),
            },
            fatsecret: FatSecretConfig {
                base_url: var_or("FATSECRET_BASE_URL", FATSECRET_BASE_URL),
                consumer_key: non_empty("FATSECRET_KEY"),
                consumer_secret: non_empty("FATSECRET_SECRET"),
            },
            spoonacular: SpoonacularConfig {
                base_url: var_or("SPOONACULAR_BASE_URL", SPOONACULAR_BASE_URL),
                api_key: non_empty("SPOONACULAR_API_KEY"),
            },
            openai: OpenAiConfig {
                base_url: var_or("OPENAI_BASE_URL", OPENAI_BASE_URL),
                api_key: non_empty("OPENAI_API_KEY"),
                model: var_or("OPENAI_VISION_MODEL", DEFAULT_VISION_MODEL),
            },
        })
    }

    /// Providers whose credentials are absent; their routes fail at call time.
    pub fn missing_providers(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.edamam.food.is_none() {
            missing.push("Edamam Food Database (EDAMAM_FOOD_APP_ID / EDAMAM_FOOD_APP_KEY)");
        }
        if self.edamam.nutrition.is_none() {
            missing.push("Edamam Nutrition Analysis (EDAMAM_NUTRITION_APP_ID / EDAMAM_NUTRITION_APP_KEY)");
        }
        if self.edamam.recipe.is_none() {
            missing.push("Edamam Recipe Search (EDAMAM_RECIPE_APP_ID / EDAMAM_RECIPE_APP_KEY)");
        }
        if self.fatsecret.consumer_key.is_none() || self.fatsecret.consumer_secret.is_none() {
            missing.push("FatSecret (FATSECRET_KEY / FATSECRET_SECRET)");
        }
        if self.spoonacular.api_key.is_none() {
            missing.push("Spoonacular (SPOONACULAR_API_KEY)");
        }
        if self.openai.api_key.is_none() {
            missing.push("OpenAI Vision (OPENAI_API_KEY)");
        }
        missing
    }

    /// A configuration with every provider unconfigured, pointed at the public hosts.
    pub fn unconfigured() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            static_dir: "public".into(),
            upload_dir: std::env::temp_dir(),
            edamam: EdamamConfig {
                base_url: EDAMAM_BASE_URL.into(),
                food: None,
                nutrition: None,
                recipe: None,
            },
            fatsecret: FatSecretConfig {
                base_url: FATSECRET_BASE_URL.into(),
                consumer_key: None,
                consumer_secret: None,
            },
            spoonacular: SpoonacularConfig {
                base_url: SPOONACULAR_BASE_URL.into(),
                api_key: None,
            },
            openai: OpenAiConfig {
                base_url: OPENAI_BASE_URL.into(),
                api_key: None,
                model: DEFAULT_VISION_MODEL.into(),
            },
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    non_empty(key).unwrap_or_else(|| default.to_string())
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn pair(id_key: &str, key_key: &str) -> Option<AppCredentials> {
    Some(AppCredentials {
        app_id: non_empty(id_key)?,
        app_key: non_empty(key_key)?,
    })
}
