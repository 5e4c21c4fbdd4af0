use axum::async_trait;
use reqwest::{header::AUTHORIZATION, Client};
use serde_json::Value;

use super::{fetch_json, oauth1::OAuth1Signer, ProviderError};
use crate::config::FatSecretConfig;

const PROVIDER: &str = "FatSecret";
const SERVER_API_PATH: &str = "/rest/server.api";

#[async_trait]
pub trait FatSecretApi: Send + Sync {
    async fn search_foods(&self, query: &str) -> Result<Value, ProviderError>;
}

#[derive(Clone)]
pub struct FatSecretClient {
    http: Client,
    endpoint: String,
    signer: Option<OAuth1Signer>,
}

impl FatSecretClient {
    pub fn new(http: Client, config: &FatSecretConfig) -> Self {
        let signer = match (&config.consumer_key, &config.consumer_secret) {
            (Some(key), Some(secret)) => Some(OAuth1Signer::new(key.as_str(), secret.as_str())),
            _ => None,
        };
        Self {
            http,
            endpoint: format!("{}{}", config.base_url.trim_end_matches('/'), SERVER_API_PATH),
            signer,
        }
    }
}

#[async_trait]
impl FatSecretApi for FatSecretClient {
    async fn search_foods(&self, query: &str) -> Result<Value, ProviderError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or(ProviderError::NotConfigured { provider: PROVIDER })?;

        let form = [
            ("method", "foods.search"),
            ("search_expression", query),
            ("format", "json"),
        ];
        let authorization = signer.authorization("POST", &self.endpoint, &form);

        let request = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, authorization)
            .form(&form);
        fetch_json(PROVIDER, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> FatSecretConfig {
        FatSecretConfig {
            base_url,
            consumer_key: Some("ck".into()),
            consumer_secret: Some("cs".into()),
        }
    }

    #[tokio::test]
    async fn search_is_signed_and_form_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/server.api"))
            .and(header_regex("authorization", r#"^OAuth oauth_consumer_key="ck", .*oauth_signature=""#))
            .and(body_string_contains("method=foods.search"))
            .and(body_string_contains("search_expression=greek+yogurt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"foods": {"food": []}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = FatSecretClient::new(Client::new(), &config(server.uri()));
        let body = client.search_foods("greek yogurt").await.unwrap();
        assert!(body["foods"].is_object());
    }

    #[tokio::test]
    async fn unsigned_client_reports_not_configured() {
        let mut cfg = config("http://127.0.0.1:9".into());
        cfg.consumer_secret = None;
        let err = FatSecretClient::new(Client::new(), &cfg)
            .search_foods("milk")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured { .. }));
        assert_eq!(err.to_string(), "FatSecret is not configured");
    }
}
