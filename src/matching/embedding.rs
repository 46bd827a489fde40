//! Optional embedding provider for semantic similarity.
//!
//! Points at a TEI/OpenAI-style HTTP endpoint. The provider is entirely
//! optional: when `EMBEDDINGS_API_URL` is unset the pipeline runs
//! lexical-only, and per-call failures are absorbed by the caller
//! (`matching::similarity::semantic_similarity`).

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::util::env::{env_opt, env_parse};

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Clone)]
pub struct HttpEmbeddings {
    endpoint: String,
    model: Option<String>,
    api_key: Option<String>,
    http: Client,
}

impl HttpEmbeddings {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .user_agent("price-recon/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: None,
            api_key: None,
            http,
        })
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|s| !s.trim().is_empty());
        self
    }

    /// Build from `EMBEDDINGS_API_URL` / `EMBEDDINGS_MODEL` /
    /// `EMBEDDINGS_API_KEY`. Returns `None` when no endpoint is configured —
    /// a legitimate state, not an error.
    pub fn from_env() -> Result<Option<Self>> {
        let Some(endpoint) = env_opt("EMBEDDINGS_API_URL") else {
            return Ok(None);
        };
        let me = Self::new(&endpoint, env_parse("REQUEST_TIMEOUT_SECS", 15u64))?
            .with_model(env_opt("EMBEDDINGS_MODEL"))
            .with_api_key(env_opt("EMBEDDINGS_API_KEY"));
        Ok(Some(me))
    }

    /// Accepts either OpenAI-style `{"data":[{"embedding":[..]}]}` or a bare
    /// `{"embedding":[..]}` / `[[..]]` body.
    fn extract_vector(body: &Value) -> Option<Vec<f32>> {
        let arr = body
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|a| a.first())
            .and_then(|e| e.get("embedding"))
            .or_else(|| body.get("embedding"))
            .or_else(|| body.as_array().and_then(|a| a.first()))
            .and_then(|v| v.as_array())?;

        let mut out = Vec::with_capacity(arr.len());
        for n in arr {
            out.push(n.as_f64()? as f32);
        }
        Some(out)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut payload = json!({ "input": text });
        if let Some(model) = &self.model {
            payload["model"] = json!(model);
        }

        let mut req = self.http.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("embedding request failed: {status}"));
        }

        let body: Value = resp.json().await?;
        Self::extract_vector(&body)
            .ok_or_else(|| anyhow!("embedding response had no vector"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_openai_shape() {
        let body = json!({ "data": [ { "embedding": [0.1, 0.2] } ] });
        assert_eq!(HttpEmbeddings::extract_vector(&body), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn extracts_bare_shapes() {
        assert_eq!(
            HttpEmbeddings::extract_vector(&json!({ "embedding": [1.0] })),
            Some(vec![1.0])
        );
        assert_eq!(
            HttpEmbeddings::extract_vector(&json!([[0.5, 0.5]])),
            Some(vec![0.5, 0.5])
        );
    }

    #[test]
    fn rejects_vectorless_bodies() {
        assert_eq!(HttpEmbeddings::extract_vector(&json!({ "ok": true })), None);
        assert_eq!(
            HttpEmbeddings::extract_vector(&json!({ "embedding": ["x"] })),
            None
        );
    }
}
