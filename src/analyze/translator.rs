//! Google Translate (`translate_a/single`, client=gtx) adapter.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

use crate::ingest::types::Translator;

pub struct GoogleTranslator {
    http: reqwest::Client,
    url: String,
}

impl GoogleTranslator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("newsbrief-ingest/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building translator http client")?;
        Ok(Self {
            http,
            url: url.trim().to_string(),
        })
    }
}

/// The endpoint answers with nested arrays: `[[["<translated>","<source>",..],..],..]`.
/// The translation is the concatenation of every segment's first element.
pub fn parse_translation(v: &Value) -> Option<String> {
    let segments = v.get(0)?.as_array()?;
    let out: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();
    if out.trim().is_empty() {
        None
    } else {
        Some(out)
    }
}

#[async_trait::async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let resp = self
            .http
            .get(&self.url)
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .context("translate request")?;
        let status = resp.status();
        if !status.is_success() {
            bail!("translate status {}", status.as_u16());
        }
        let v: Value = resp.json().await.context("translate json")?;
        parse_translation(&v).ok_or_else(|| anyhow!("translate: unexpected response shape"))
    }
}
