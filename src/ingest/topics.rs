//! # Topic catalog
//!
//! Immutable lookup data deciding which topics the pipeline may attach to a record:
//!
//! - a whitelist of canonical slugs with their English label,
//! - an ordered list of keyword rules used when classification yields fewer than two topics,
//! - two forced defaults (`national`, then `world`) that guarantee at least one topic.
//!
//! The catalog is built once (from config or [`TopicCatalog::default_seed`]) and shared
//! read-only; nothing here performs I/O.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::Deserialize;

/// Characters stripped from both ends of a raw classifier label.
const LABEL_TRIM: &[char] = &['[', ']', '(', ')', '{', '}', '"', '\''];

/// Number of topics the pipeline tries to attach to every record.
pub const TARGET_TOPICS: usize = 2;

/// One fallback heuristic. Fires when any `title` term occurs in the lower-cased title
/// or any `body` term occurs in the lower-cased body (plain substring match).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct KeywordRule {
    pub slug: String,
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub body: Vec<String>,
}

impl KeywordRule {
    fn new(slug: &str, title: &[&str], body: &[&str]) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.iter().map(|s| s.to_string()).collect(),
            body: body.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn fires(&self, title_lower: &str, body_lower: &str) -> bool {
        self.title.iter().any(|t| title_lower.contains(t.as_str()))
            || self.body.iter().any(|t| body_lower.contains(t.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FallbackDefaults {
    /// Selected when no keyword rule fires.
    pub primary: String,
    /// Appended while fewer than two slugs are picked.
    pub secondary: String,
}

impl Default for FallbackDefaults {
    fn default() -> Self {
        Self {
            primary: "national".into(),
            secondary: "world".into(),
        }
    }
}

/// Serialized form of the catalog (TOML or JSON).
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSpec {
    /// slug -> canonical English label
    pub topics: BTreeMap<String, String>,
    #[serde(default)]
    pub rules: Vec<KeywordRule>,
    #[serde(default)]
    pub defaults: FallbackDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicCatalog {
    labels: BTreeMap<String, String>,
    rules: Vec<KeywordRule>,
    defaults: FallbackDefaults,
}

impl TopicCatalog {
    /// Validate and normalize a catalog spec.
    ///
    /// Slugs and rule terms are lower-cased; rules pointing outside the whitelist are
    /// dropped. Both fallback defaults must be whitelisted.
    pub fn from_spec(spec: CatalogSpec) -> Result<Self> {
        let labels: BTreeMap<String, String> = spec
            .topics
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        if labels.is_empty() {
            bail!("topic catalog has no whitelisted topics");
        }

        let defaults = FallbackDefaults {
            primary: spec.defaults.primary.trim().to_lowercase(),
            secondary: spec.defaults.secondary.trim().to_lowercase(),
        };
        for d in [&defaults.primary, &defaults.secondary] {
            if !labels.contains_key(d) {
                bail!("fallback default '{d}' is not a whitelisted topic");
            }
        }

        let rules = spec
            .rules
            .into_iter()
            .map(|r| KeywordRule {
                slug: r.slug.trim().to_lowercase(),
                title: clean_terms(r.title),
                body: clean_terms(r.body),
            })
            .filter(|r| labels.contains_key(&r.slug))
            .collect();

        Ok(Self {
            labels,
            rules,
            defaults,
        })
    }

    /// Built-in whitelist of 18 topics and the stock keyword heuristics.
    pub fn default_seed() -> Self {
        let labels = [
            "world",
            "national",
            "politics",
            "business",
            "economy",
            "finance",
            "technology",
            "science",
            "health",
            "environment",
            "education",
            "law",
            "crime",
            "weather",
            "opinion",
            "sports",
            "entertainment",
            "culture",
        ]
        .into_iter()
        .map(|s| (s.to_string(), s.to_string()))
        .collect();

        let rules = vec![
            KeywordRule::new("economy", &["econom", "inflation"], &["econom", "inflation"]),
            KeywordRule::new("politics", &["politic", "government"], &["politic", "government"]),
            KeywordRule::new("health", &[], &["health", "hospital"]),
            KeywordRule::new("environment", &[], &["climate", "weather"]),
            KeywordRule::new("technology", &["tech"], &["ai ", "technology"]),
            KeywordRule::new("finance", &[], &["market", "stock"]),
        ];

        Self {
            labels,
            rules,
            defaults: FallbackDefaults::default(),
        }
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.labels.contains_key(slug)
    }

    /// Canonical English label of a whitelisted slug.
    pub fn label_for(&self, slug: &str) -> Option<&str> {
        self.labels.get(slug).map(String::as_str)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Map a noisy classifier label to a whitelisted slug.
    ///
    /// Lower-case + trim, strip surrounding brackets/quotes, keep the text before the first
    /// comma, then exact-match; a trailing `s` is dropped as a last try. No fuzzy matching.
    pub fn map_label(&self, raw: &str) -> Option<String> {
        let lowered = raw.trim().to_lowercase();
        let stripped = lowered.trim_matches(LABEL_TRIM);
        let head = stripped.split(',').next().unwrap_or_default().trim();
        if head.is_empty() {
            return None;
        }
        if self.contains(head) {
            return Some(head.to_string());
        }
        head.strip_suffix('s')
            .filter(|base| self.contains(base))
            .map(str::to_string)
    }

    /// Keyword-based topic guesses: up to two distinct slugs, in rule order, then the
    /// forced defaults. Never returns an empty list.
    pub fn infer_fallback(&self, title: &str, body: &str) -> Vec<String> {
        let title_lower = title.to_lowercase();
        let body_lower = body.to_lowercase();

        let mut picks: Vec<String> = Vec::with_capacity(TARGET_TOPICS);
        let pick = |slug: &str, picks: &mut Vec<String>| {
            if picks.len() < TARGET_TOPICS && !picks.iter().any(|p| p == slug) {
                picks.push(slug.to_string());
            }
        };

        for rule in &self.rules {
            if picks.len() >= TARGET_TOPICS {
                break;
            }
            if rule.fires(&title_lower, &body_lower) {
                pick(&rule.slug, &mut picks);
            }
        }
        if picks.is_empty() {
            pick(&self.defaults.primary, &mut picks);
        }
        if picks.len() < TARGET_TOPICS {
            pick(&self.defaults.secondary, &mut picks);
        }
        picks
    }
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self::default_seed()
    }
}

fn clean_terms(terms: Vec<String>) -> Vec<String> {
    // Inner spaces are significant ("ai "), so only drop fully blank terms.
    terms
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_plain_and_noisy_labels() {
        let c = TopicCatalog::default_seed();
        assert_eq!(c.map_label("Politics").as_deref(), Some("politics"));
        assert_eq!(c.map_label("  [Economy, growth]").as_deref(), Some("economy"));
        assert_eq!(c.map_label("\"Health\"").as_deref(), Some("health"));
        assert_eq!(c.map_label("sports,").as_deref(), Some("sports"));
        assert_eq!(c.map_label("gadgets"), None);
        assert_eq!(c.map_label(""), None);
        assert_eq!(c.map_label("[]"), None);
    }

    #[test]
    fn naive_plural_is_stripped_once() {
        let c = TopicCatalog::default_seed();
        assert_eq!(c.map_label("Crimes").as_deref(), Some("crime"));
        assert_eq!(c.map_label("Cultures").as_deref(), Some("culture"));
        // "sports" is itself whitelisted and must not lose its "s"
        assert_eq!(c.map_label("Sports").as_deref(), Some("sports"));
        assert_eq!(c.map_label("laws").as_deref(), Some("law"));
        assert_eq!(c.map_label("lawss"), None);
    }

    #[test]
    fn fallback_pads_with_world() {
        let c = TopicCatalog::default_seed();
        let got = c.infer_fallback("Markets rally amid inflation fears", "");
        assert_eq!(got, vec!["economy".to_string(), "world".to_string()]);
    }

    #[test]
    fn fallback_forces_national_when_nothing_fires() {
        let c = TopicCatalog::default_seed();
        let got = c.infer_fallback("Flood displaces thousands", "Residents fled overnight.");
        assert_eq!(got, vec!["national".to_string(), "world".to_string()]);
    }

    #[test]
    fn fallback_stops_after_two_rules_in_order() {
        let c = TopicCatalog::default_seed();
        let got = c.infer_fallback(
            "Government hospital budget",
            "The government said hospital stock markets and climate were discussed.",
        );
        assert_eq!(got, vec!["politics".to_string(), "health".to_string()]);
    }

    #[test]
    fn catalog_drops_rules_outside_whitelist() {
        let spec: CatalogSpec = toml::from_str(
            r#"
[topics]
world = "World"
national = "National"
economy = "Economy"

[[rules]]
slug = "economy"
body = ["inflation"]

[[rules]]
slug = "gadgets"
body = ["phone"]
"#,
        )
        .unwrap();
        let c = TopicCatalog::from_spec(spec).unwrap();
        assert_eq!(c.rules().len(), 1);
        assert_eq!(c.label_for("economy"), Some("Economy"));
    }

    #[test]
    fn catalog_rejects_defaults_outside_whitelist() {
        let spec: CatalogSpec =
            toml::from_str("[topics]\neconomy = \"economy\"\n").unwrap();
        assert!(TopicCatalog::from_spec(spec).is_err());
    }
}
