//! Outbound clients, one per third-party API. Each call is a single request
//! with no retry; failures come back as a [`ProviderError`].

pub mod edamam;
pub mod fatsecret;
mod oauth1;
pub mod openai;
pub mod spoonacular;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub use edamam::{EdamamApi, EdamamClient, RecipeQuery};
pub use fatsecret::{FatSecretApi, FatSecretClient};
pub use openai::{OpenAiVisionClient, VisionApi};
pub use spoonacular::{SpoonacularApi, SpoonacularClient};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} is not configured")]
    NotConfigured { provider: &'static str },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error: HTTP {status}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an unreadable response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
}

pub fn http_client() -> anyhow::Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("nutrihub/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Sends `request` and decodes a 2xx body as JSON; any other status is
/// returned with its body text attached.
pub(crate) async fn fetch_json(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<Value, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|source| ProviderError::Transport { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(provider, status = status.as_u16(), "upstream returned an error status");
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    debug!(provider, status = status.as_u16(), "upstream call succeeded");
    response
        .json::<Value>()
        .await
        .map_err(|e| ProviderError::Decode {
            provider,
            message: e.to_string(),
        })
}
