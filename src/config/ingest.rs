// src/config/ingest.rs
use anyhow::{anyhow, Context, Result};
use chrono::NaiveTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::providers::news_provider::DEFAULT_PROVIDER_URL;
use crate::ingest::topics::{CatalogSpec, TopicCatalog};

const ENV_CATALOG_PATH: &str = "TOPIC_CATALOG_PATH";

pub const DEFAULT_QUERY: &str = "general";
pub const DEFAULT_SCHEDULED_COUNT: i64 = 20;
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SCHEDULE_TIMES: &str = "07:00,13:00,19:00";

/// Runtime settings for provider ingestion and its daily trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub provider_url: String,
    pub scheduled_enabled: bool,
    pub scheduled_query: String,
    pub scheduled_count: i64,
    pub run_timeout: Duration,
    /// Local wall-clock times, sorted and deduplicated.
    pub schedule_times: Vec<NaiveTime>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            scheduled_enabled: true,
            scheduled_query: DEFAULT_QUERY.to_string(),
            scheduled_count: DEFAULT_SCHEDULED_COUNT,
            run_timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
            // Constant input, cannot fail.
            schedule_times: parse_schedule_times(DEFAULT_SCHEDULE_TIMES).unwrap_or_default(),
        }
    }
}

impl IngestConfig {
    /// Read settings from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary key lookup (for tests).
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = non_empty("NEWS_PROVIDER_URL") {
            cfg.provider_url = url;
        }
        if let Some(v) = non_empty("PROVIDER_INGEST_SCHEDULED") {
            // Unset or "true" keeps the trigger on; anything else turns it off.
            cfg.scheduled_enabled = v.eq_ignore_ascii_case("true");
        }
        if let Some(q) = non_empty("PROVIDER_INGEST_QUERY") {
            cfg.scheduled_query = q;
        }
        if let Some(n) = non_empty("PROVIDER_INGEST_COUNT") {
            cfg.scheduled_count = n
                .parse()
                .with_context(|| format!("PROVIDER_INGEST_COUNT is not an integer: {n}"))?;
        }
        if let Some(s) = non_empty("PROVIDER_INGEST_TIMEOUT_SECS") {
            let secs: u64 = s
                .parse()
                .with_context(|| format!("PROVIDER_INGEST_TIMEOUT_SECS is not an integer: {s}"))?;
            cfg.run_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(t) = non_empty("PROVIDER_INGEST_TIMES") {
            cfg.schedule_times = parse_schedule_times(&t)?;
        }
        Ok(cfg)
    }
}

/// "07:00, 13:00,19:00" -> sorted, deduplicated times.
pub fn parse_schedule_times(s: &str) -> Result<Vec<NaiveTime>> {
    let mut out = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let t = NaiveTime::parse_from_str(part, "%H:%M")
            .with_context(|| format!("invalid schedule time '{part}' (expected HH:MM)"))?;
        out.push(t);
    }
    if out.is_empty() {
        return Err(anyhow!("schedule has no times"));
    }
    out.sort();
    out.dedup();
    Ok(out)
}

// ------------------------------------------------------------
// Topic catalog
// ------------------------------------------------------------

/// Load the topic catalog from an explicit path. Supports TOML or JSON formats.
pub fn load_catalog_from(path: &Path) -> Result<TopicCatalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading topic catalog from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let spec = parse_catalog(&content, ext.as_str())?;
    TopicCatalog::from_spec(spec).with_context(|| format!("validating {}", path.display()))
}

/// Load the catalog using env var + fallbacks:
/// 1) $TOPIC_CATALOG_PATH
/// 2) config/topics.toml
/// 3) config/topics.json
/// 4) built-in seed
pub fn load_catalog_default() -> Result<TopicCatalog> {
    if let Ok(p) = std::env::var(ENV_CATALOG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_catalog_from(&pb);
        } else {
            return Err(anyhow!("TOPIC_CATALOG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/topics.toml");
    if toml_p.exists() {
        return load_catalog_from(&toml_p);
    }
    let json_p = PathBuf::from("config/topics.json");
    if json_p.exists() {
        return load_catalog_from(&json_p);
    }
    Ok(TopicCatalog::default_seed())
}

fn parse_catalog(s: &str, hint_ext: &str) -> Result<CatalogSpec> {
    // JSON only when hinted or the content is clearly an object.
    if hint_ext == "json" || s.trim_start().starts_with('{') {
        return serde_json::from_str(s).context("parsing topic catalog json");
    }
    toml::from_str(s).context("parsing topic catalog toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| m.get(k).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = IngestConfig::from_lookup(lookup(&[])).unwrap();
        assert!(cfg.scheduled_enabled);
        assert_eq!(cfg.scheduled_query, "general");
        assert_eq!(cfg.scheduled_count, 20);
        assert_eq!(cfg.run_timeout, Duration::from_secs(120));
        assert_eq!(cfg.schedule_times.len(), 3);
        assert_eq!(cfg.schedule_times[0], NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    }

    #[test]
    fn scheduled_toggle_only_true_enables() {
        let on = IngestConfig::from_lookup(lookup(&[("PROVIDER_INGEST_SCHEDULED", "TRUE")])).unwrap();
        assert!(on.scheduled_enabled);
        let off = IngestConfig::from_lookup(lookup(&[("PROVIDER_INGEST_SCHEDULED", "false")])).unwrap();
        assert!(!off.scheduled_enabled);
        let blank = IngestConfig::from_lookup(lookup(&[("PROVIDER_INGEST_SCHEDULED", " ")])).unwrap();
        assert!(blank.scheduled_enabled);
    }

    #[test]
    fn bad_numbers_are_errors() {
        assert!(IngestConfig::from_lookup(lookup(&[("PROVIDER_INGEST_COUNT", "many")])).is_err());
        assert!(IngestConfig::from_lookup(lookup(&[("PROVIDER_INGEST_TIMES", "7am")])).is_err());
    }

    #[test]
    fn schedule_times_sorted_and_deduped() {
        let t = parse_schedule_times("19:00, 07:00,07:00").unwrap();
        assert_eq!(
            t,
            vec![
                NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(19, 0, 0).unwrap()
            ]
        );
    }

    #[serial_test::serial]
    #[test]
    fn catalog_default_uses_env_then_fallbacks() {
        // Isolate CWD so the repo's own config/ is not read
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CATALOG_PATH);

        // Nothing on disk -> built-in seed
        let c = load_catalog_default().unwrap();
        assert_eq!(c, TopicCatalog::default_seed());

        // Env wins
        let p_json = tmp.path().join("topics.json");
        fs::write(
            &p_json,
            r#"{"topics":{"world":"World","national":"National","sports":"Sports"}}"#,
        )
        .unwrap();
        env::set_var(ENV_CATALOG_PATH, p_json.display().to_string());
        let c2 = load_catalog_default().unwrap();
        assert!(c2.contains("sports"));
        assert!(!c2.contains("economy"));
        env::remove_var(ENV_CATALOG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
