//! Gemini `generateContent` client: summarization and raw topic labels.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ingest::types::{Summarizer, TopicClassifier};

/// Label count asked for when the caller passes 0.
const DEFAULT_LABELS: usize = 2;

pub struct GeminiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
struct GenReq<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GenResp {
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}
#[derive(Deserialize, Default)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}
#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<RespPart>,
}
#[derive(Deserialize, Default)]
#[serde(default)]
struct RespPart {
    text: String,
}
#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiError {
    message: String,
}

impl GeminiClient {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        if api_url.trim().is_empty() {
            bail!("gemini api url is empty");
        }
        let http = reqwest::Client::builder()
            .user_agent("newsbrief-ingest/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building gemini http client")?;
        Ok(Self {
            http,
            api_url: api_url.trim().to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    /// Append the key as `?key=` or `&key=` depending on the configured URL.
    pub fn url_with_key(&self) -> String {
        with_key(&self.api_url, &self.api_key)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let req = GenReq {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let resp = self
            .http
            .post(self.url_with_key())
            .json(&req)
            .send()
            .await
            .context("gemini request")?;
        let status = resp.status();
        let body = resp.text().await.context("gemini body")?;
        if !status.is_success() {
            bail!("gemini error {}: {}", status.as_u16(), truncate(&body, 200));
        }
        extract_text(&body)
    }
}

pub fn with_key(url: &str, key: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}key={key}")
}

/// First candidate's first text part.
fn extract_text(body: &str) -> Result<String> {
    let parsed: GenResp = serde_json::from_str(body).context("parsing gemini response")?;
    if let Some(err) = parsed.error {
        bail!("gemini api error: {}", err.message);
    }
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| anyhow!("no candidates returned from model"))
}

/// Interpret classifier output: a JSON array of strings when possible, otherwise
/// a comma/newline separated list. Capped at `top_k`.
pub fn parse_topic_labels(text: &str, top_k: usize) -> Vec<String> {
    let top_k = if top_k == 0 { DEFAULT_LABELS } else { top_k };
    let body = strip_code_fence(text);

    if let Ok(arr) = serde_json::from_str::<Vec<String>>(body) {
        return arr.into_iter().take(top_k).collect();
    }
    body.replace('\n', ",")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(top_k)
        .map(str::to_string)
        .collect()
}

/// Models like to wrap JSON in ```json fences.
fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(inner) = t.strip_prefix("```") else {
        return t;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // drop an info string such as "json"
    match inner.find('\n') {
        Some(i) if !inner[..i].trim().starts_with('[') => inner[i + 1..].trim(),
        _ => inner.trim(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[async_trait::async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, text: &str, lang: &str) -> Result<String> {
        let prompt =
            format!("Summarize the following text in {lang}. Keep it concise and clear.\n\n{text}");
        let out = self.generate(&prompt).await?;
        if out.trim().is_empty() {
            bail!("empty summary from model");
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl TopicClassifier for GeminiClient {
    async fn classify_topics(&self, text: &str, lang: &str, top_k: usize) -> Result<Vec<String>> {
        let k = if top_k == 0 { DEFAULT_LABELS } else { top_k };
        let prompt = format!(
            "Return a JSON array (no prose) of up to {k} high-level topic labels in {lang} for the \
             following text. Keep labels concise, 1-3 words. If uncertain, still return best \
             guesses. Text:\n\n{text}"
        );
        let out = self.generate(&prompt).await?;
        Ok(parse_topic_labels(&out, k))
    }
}
