use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::ingest::types::{NewsProvider, ProviderItem};

pub const DEFAULT_PROVIDER_URL: &str = "https://news-provider-service.onrender.com";

/// Client for the news-provider service's stored-news listing.
/// The service ignores the query string today; only `limit` is forwarded.
pub struct NewsProviderClient {
    mode: Mode,
}

enum Mode {
    // Owned copy so tests can build fixtures at runtime.
    Fixture(String),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl NewsProviderClient {
    pub fn from_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("newsbrief-ingest/0.1")
            .timeout(Duration::from_secs(20))
            .build()
            .context("building provider http client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
                client,
            },
        })
    }

    pub fn from_fixture(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
        }
    }

    pub fn endpoint(base_url: &str, limit: usize) -> String {
        format!("{base_url}/api/v1/news/stored?limit={limit}")
    }
}

#[derive(Deserialize)]
struct Wrapped {
    data: Vec<ProviderItem>,
}

/// Accepts the shapes the provider has been seen to return:
/// a bare array, `{ "data": [...] }`, or a single item with an id.
/// Anything else is treated as an empty batch.
pub fn parse_provider_body(body: &str) -> Vec<ProviderItem> {
    if let Ok(items) = serde_json::from_str::<Vec<ProviderItem>>(body) {
        return items;
    }
    if let Ok(w) = serde_json::from_str::<Wrapped>(body) {
        if !w.data.is_empty() {
            return w.data;
        }
    }
    if let Ok(one) = serde_json::from_str::<ProviderItem>(body) {
        if !one.id.is_empty() {
            return vec![one];
        }
    }
    Vec::new()
}

fn parse_timed(body: &str, limit: usize) -> Vec<ProviderItem> {
    let t0 = std::time::Instant::now();
    let mut items = parse_provider_body(body);
    items.truncate(limit);
    histogram!("ingest_provider_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("ingest_provider_items_total").increment(items.len() as u64);
    items
}

#[async_trait]
impl NewsProvider for NewsProviderClient {
    async fn search(&self, _query: &str, top_k: usize) -> Result<Vec<ProviderItem>> {
        match &self.mode {
            Mode::Fixture(s) => Ok(parse_timed(s, top_k)),
            Mode::Http { base_url, client } => {
                let url = Self::endpoint(base_url, top_k);
                let resp = client.get(&url).send().await.context("provider http get()")?;
                let status = resp.status();
                if !status.is_success() {
                    bail!("provider status {}", status.as_u16());
                }
                let body = resp.text().await.context("provider http .text()")?;
                Ok(parse_timed(&body, top_k))
            }
        }
    }

    fn name(&self) -> &'static str {
        "news-provider"
    }
}
