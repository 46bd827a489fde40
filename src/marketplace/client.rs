//! Marketplace collaborator boundary: candidate search plus the secondary
//! detail lookup used for aggregate-seller resolution.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::util::env::{env_parse, env_req};

use super::types::{Candidate, DetailRef};

fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        // Payloads are full of multi-byte Persian text; cutting at a raw
        // byte index mid-character would panic. Back up to a boundary.
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

/// Marketplace full-text search. Failure means "zero candidates for this
/// product" to the caller; the pipeline logs and moves on.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>>;
}

/// Secondary detail lookup for one search result. Only consulted when a
/// seller label turns out to be an aggregate listing.
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn fetch_detail(&self, detail: &DetailRef) -> Result<Value>;
}

/// HTTP client for a Torob-style price-comparison API.
///
/// Endpoints:
/// - GET {base}/search/?q=...&page=0       → { "results": [ ... ] }
/// - GET {base}/details/?prk=..&search_id=.. → { "offers"|"prices": [ ... ] }
#[derive(Debug, Clone)]
pub struct HttpMarketplace {
    base_url: String,
    http: Client,
}

impl HttpMarketplace {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .user_agent("price-recon/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Construct from `MARKETPLACE_API_URL` (+ optional `REQUEST_TIMEOUT_SECS`).
    pub fn from_env() -> Result<Self> {
        let base = env_req("MARKETPLACE_API_URL")?;
        Self::new(&base, env_parse("REQUEST_TIMEOUT_SECS", 15u64))
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 2000);
            return Err(anyhow!("marketplace request failed: {status} url={url} body={body}"));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl CandidateSource for HttpMarketplace {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>> {
        let url = format!("{}/search/", self.base_url);
        let body = self.get_json(&url, &[("q", query), ("page", "0")]).await?;

        let mut out = Vec::new();
        let results = body
            .get("results")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        for item in &results {
            match Candidate::from_search_result(item) {
                Some(c) => out.push(c),
                None => warn!(
                    query,
                    entry = %truncate_for_log(item.to_string(), 300),
                    "skipping unusable search result (no display name)"
                ),
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl DetailSource for HttpMarketplace {
    async fn fetch_detail(&self, detail: &DetailRef) -> Result<Value> {
        let url = format!("{}/details/", self.base_url);
        self.get_json(
            &url,
            &[("prk", detail.key.as_str()), ("search_id", detail.search_id.as_str())],
        )
        .await
    }
}
