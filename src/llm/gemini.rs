// Gemini `generateContent` client.
//
// One request per call, no streaming and no retries. The reply text is the
// concatenation of every text part of the first candidate.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::LlmClient;

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let res = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("gemini request")?;

        let status = res.status();
        let raw = res.text().await.context("gemini response body")?;
        let payload: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = extract_error_message(&payload)
                .unwrap_or_else(|| format!("gemini returned {status}"));
            warn!(%status, "gemini request rejected");
            anyhow::bail!(message);
        }

        let text = parse_candidate_text(&payload)
            .ok_or_else(|| anyhow::anyhow!("gemini response contained no text"))?;
        debug!(model = %self.model, chars = text.len(), "gemini replied");
        Ok(text)
    }
}

pub(crate) fn parse_candidate_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn extract_error_message(payload: &Value) -> Option<String> {
    payload
        .get("error")?
        .get("message")?
        .as_str()
        .map(String::from)
}
