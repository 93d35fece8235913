//! Authenticated Gemini API client.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::wire::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    ModelCatalog,
};
use crate::{Error, Result};

const BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

/// Handle to the Gemini API, bound to one API key and the shared transport.
///
/// The adapter builds at most one live client at a time and rebuilds it
/// whenever authentication changes; the client itself is stateless beyond
/// its credential.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: SecretString) -> Self {
        Self {
            http,
            api_key,
            base_url: Self::base_url_from_env(),
        }
    }

    fn base_url_from_env() -> String {
        std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| BASE_URL.into())
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn model_path(&self, model_id: &str) -> String {
        // The catalog returns qualified names ("models/gemini-pro"); accept
        // bare ids too.
        if model_id.contains('/') {
            format!("{}/{}/{}", self.base_url, API_VERSION, model_id)
        } else {
            format!("{}/{}/models/{}", self.base_url, API_VERSION, model_id)
        }
    }

    /// Invoke `generateContent` for `model_id`.
    pub async fn generate_content(
        &self,
        model_id: &str,
        contents: Vec<Content>,
        generation_config: Option<GenerationConfig>,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}:generateContent", self.model_path(model_id));
        let body = GenerateContentRequest {
            contents,
            generation_config,
        };

        tracing::debug!(model = model_id, "dispatching generateContent");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Fetch the provider's model catalog.
    pub async fn list_models(&self) -> Result<ModelCatalog> {
        let url = format!("{}/{}/models", self.base_url, API_VERSION);

        tracing::debug!("fetching model catalog");
        let response = self
            .http
            .get(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => envelope.error.message,
                Err(_) => body,
            };
            tracing::warn!(status = status.as_u16(), "Gemini API returned an error");
            return Err(Error::response(format!("HTTP {status}: {message}")));
        }

        let json: serde_json::Value = response.json().await?;
        serde_json::from_value(json)
            .map_err(|e| Error::response(format!("unparsable payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(reqwest::Client::new(), SecretString::from("test-key"))
    }

    #[test]
    fn test_model_path_accepts_qualified_and_bare_ids() {
        let client = client().with_base_url("http://localhost:1");
        assert_eq!(
            client.model_path("models/gemini-pro"),
            "http://localhost:1/v1beta/models/gemini-pro"
        );
        assert_eq!(
            client.model_path("gemini-pro"),
            "http://localhost:1/v1beta/models/gemini-pro"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("test-key"));
    }
}
