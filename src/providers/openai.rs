use axum::async_trait;
use base64ct::{Base64, Encoding};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use super::{fetch_json, ProviderError};
use crate::config::OpenAiConfig;

const PROVIDER: &str = "OpenAI Vision";

const VISION_PROMPT: &str = "Identify the foods in this image and estimate sensible portion sizes \
in grams or household measures. Reply with only a JSON array, one object per food, shaped as \
{\"name\": string, \"portion\": string, \"confidence\": number between 0 and 1}.";

#[async_trait]
pub trait VisionApi: Send + Sync {
    /// Returns the model's reply text verbatim.
    async fn describe_image(&self, image: &[u8], mime: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
}

#[derive(Clone)]
pub struct OpenAiVisionClient {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiVisionClient {
    pub fn new(http: Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }
}

fn data_url(image: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", Base64::encode_string(image))
}

#[async_trait]
impl VisionApi for OpenAiVisionClient {
    async fn describe_image(&self, image: &[u8], mime: &str) -> Result<String, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured { provider: PROVIDER })?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": VISION_PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url(image, mime) } }
                ]
            })],
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let request = self.http.post(url).bearer_auth(api_key).json(&body);
        let completion = fetch_json(PROVIDER, request).await?;

        Ok(completion
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}
