use super::ModelClient;
use crate::errors::ConfigError;
use crate::model::LlmResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Client for a local Ollama server (`POST {base_url}/api/generate`).
///
/// No request timeout is set here; the batch runner bounds each call.
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    total_duration: Option<u64>,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, temperature: f32) -> Result<Self, ConfigError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError(format!(
                "model.base_url must be an http(s) URL (got '{}')",
                base_url
            )));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url,
            model: model.to_string(),
            temperature,
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<LlmResponse> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    anyhow::anyhow!("cannot reach Ollama at {}: {}", self.base_url, e)
                } else {
                    anyhow::anyhow!("Ollama request failed: {}", e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Ollama API error ({}): {}", status.as_u16(), error_text);
        }

        let parsed: GenerateResponse = resp.json().await?;
        Ok(LlmResponse {
            text: parsed.response,
            provider: "ollama".to_string(),
            model: self.model.clone(),
            meta: serde_json::json!({
                "eval_count": parsed.eval_count,
                "total_duration_ns": parsed.total_duration,
            }),
        })
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_base_url() {
        let c = OllamaClient::new("http://localhost:11434/", "llama2:7b", 0.1).unwrap();
        assert_eq!(c.endpoint(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(OllamaClient::new("localhost:11434", "m", 0.1).is_err());
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            model: "llama2:7b",
            prompt: "hi",
            stream: false,
            options: GenerateOptions { temperature: 0.5 },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["stream"], false);
        assert_eq!(v["options"]["temperature"], 0.5);
    }
}
