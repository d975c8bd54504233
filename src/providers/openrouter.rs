use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use zeroize::Zeroize;

use crate::providers::ProviderError;
use crate::traits::CompletionProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenRouter-compatible chat-completion client. Any endpoint that speaks
/// the OpenAI `/chat/completions` shape works.
pub struct OpenRouterProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl Drop for OpenRouterProvider {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

/// Validate the base URL for security.
/// - HTTPS is required for remote URLs to protect the API key in transit
/// - HTTP is allowed only for localhost (local completion servers)
fn validate_base_url(base_url: &str) -> Result<(), String> {
    let parsed = reqwest::Url::parse(base_url)
        .map_err(|e| format!("Invalid base_url '{}': {}", base_url, e))?;

    let scheme = parsed.scheme();
    let host = parsed.host_str().unwrap_or("");

    match scheme {
        "https" => Ok(()),
        "http" => {
            let is_localhost =
                host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "::1";
            if is_localhost {
                warn!(
                    "Using unencrypted HTTP for local completion server at '{}'.",
                    base_url
                );
                Ok(())
            } else {
                Err(format!(
                    "HTTP is not allowed for remote URLs (base_url: '{}'). \
                     Use HTTPS to protect your API key in transit.",
                    base_url
                ))
            }
        }
        _ => Err(format!(
            "Unsupported URL scheme '{}' in base_url '{}'. Only http and https are allowed.",
            scheme, base_url
        )),
    }
}

impl OpenRouterProvider {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> anyhow::Result<Self> {
        validate_base_url(base_url).map_err(|e| anyhow::anyhow!(e))?;

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let url = format!("{}/chat/completions", self.base_url);
        info!(model = %self.model, url = %url, max_tokens, "Calling completion API");

        let resp = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "fitcoach")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!("HTTP request failed: {}", e);
                return Err(ProviderError::network(&e));
            }
        };

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ProviderError::network(&e))?;

        if !status.is_success() {
            error!(status = %status, "Completion API error: {}", text);
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }

        debug!(bytes = text.len(), "Completion API response received");

        let data: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::malformed(format!("invalid JSON: {}", e)))?;

        let content = data["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or_else(|| ProviderError::malformed("no choices[0].message.content"))?;

        if content.trim().is_empty() {
            return Err(ProviderError::malformed("empty completion content"));
        }

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_accepted() {
        assert!(validate_base_url("https://openrouter.ai/api/v1").is_ok());
    }

    #[test]
    fn http_localhost_accepted() {
        assert!(validate_base_url("http://localhost:8080").is_ok());
        assert!(validate_base_url("http://127.0.0.1:1234").is_ok());
    }

    #[test]
    fn http_remote_rejected() {
        let err = validate_base_url("http://api.example.com").unwrap_err();
        assert!(err.contains("HTTP is not allowed"), "got: {}", err);
    }

    #[test]
    fn other_schemes_rejected() {
        let err = validate_base_url("ftp://example.com").unwrap_err();
        assert!(err.contains("Unsupported URL scheme"), "got: {}", err);
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider =
            OpenRouterProvider::new("https://openrouter.ai/api/v1/", "test-key", "test-model")
                .unwrap();
        assert!(!provider.base_url.ends_with('/'));
    }
}
