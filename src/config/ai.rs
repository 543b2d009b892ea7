// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const DEFAULT_TRANSLATOR_URL: &str = "https://translate.googleapis.com/translate_a/single";

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_translator_url() -> String {
    DEFAULT_TRANSLATOR_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    15
}

/// Summarizer / classifier / translator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// "gemini" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Full generateContent URL; the API key is appended as `key=`.
    #[serde(default)]
    pub api_url: String,
    /// "ENV" means: read from GEMINI_API_KEY
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_translator_url")]
    pub translator_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            api_url: String::new(),
            api_key: String::new(),
            translator_url: default_translator_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;

        // Normalize provider
        cfg.provider = cfg.provider.trim().to_lowercase();

        // Resolve api key if "ENV"
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "gemini" => env::var("GEMINI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("Missing GEMINI_API_KEY env var"))?,
                "mock" => String::new(),
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
        }
        if cfg.api_url.trim().is_empty() {
            cfg.api_url = env::var("GEMINI_API_URL").unwrap_or_default();
        }
        if cfg.timeout_secs == 0 {
            cfg.timeout_secs = default_timeout_secs();
        }

        Ok(cfg)
    }

    /// Config purely from GEMINI_API_URL / GEMINI_API_KEY / TRANSLATOR_URL.
    /// Enabled iff an API URL is present.
    pub fn from_env() -> Self {
        let api_url = env::var("GEMINI_API_URL").unwrap_or_default();
        Self {
            enabled: !api_url.trim().is_empty(),
            provider: default_provider(),
            api_url,
            api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            translator_url: env::var("TRANSLATOR_URL").unwrap_or_else(|_| default_translator_url()),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// `config/ai.json` when present, else the environment.
    pub fn load_default() -> anyhow::Result<Self> {
        let p = Path::new(DEFAULT_AI_CONFIG_PATH);
        if p.exists() {
            Self::load_from_file(p)
        } else {
            Ok(Self::from_env())
        }
    }
}
