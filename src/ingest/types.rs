// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Raw item returned by the external news-provider search API.
/// Every field is optional on the wire; missing or `null` ones deserialize to "".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderItem {
    #[serde(deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub source_url: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub source_site: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub source_type: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub published_date: String, // RFC 3339 when present
    #[serde(deserialize_with = "null_as_empty")]
    pub lang: String, // "en" | "am" | ""
}

fn null_as_empty<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(d).map(Option::unwrap_or_default)
}

/// The two languages every text field is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    Am,
}

impl Lang {
    /// Unknown or empty tags map to English, which is where originals land by default.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("am") {
            Lang::Am
        } else {
            Lang::En
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Am => "am",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Lang::En => Lang::Am,
            Lang::Am => Lang::En,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BilingualField {
    pub en: String,
    pub am: String,
}

impl BilingualField {
    /// Same text in both languages (placeholder until curated).
    pub fn mirrored(text: &str) -> Self {
        Self {
            en: text.to_string(),
            am: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub slug: String,
    pub label: BilingualField,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub logo_url: String,
    pub language: Lang,
    pub reliability_score: f64,
}

/// Enriched, bilingual news record as persisted and served.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsRecord {
    pub id: String,
    pub title: String,
    pub body: String,
    pub title_en: String,
    pub title_am: String,
    pub body_en: String,
    pub body_am: String,
    pub summary_en: String,
    pub summary_am: String,
    /// Language tag of the original (non-translated) text.
    pub language: String,
    pub source_id: String,
    pub source_url: String,
    pub topics: Vec<String>,
    pub published_at: DateTime<Utc>,
    pub published_date_localized: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewsRecord {
    /// Empty record with both timestamps set to `now`.
    pub fn blank(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: String::new(),
            body: String::new(),
            title_en: String::new(),
            title_am: String::new(),
            body_en: String::new(),
            body_am: String::new(),
            summary_en: String::new(),
            summary_am: String::new(),
            language: String::new(),
            source_id: String::new(),
            source_url: String::new(),
            topics: Vec::new(),
            published_at: now,
            published_date_localized: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Put original title/body/summary into the slots of `lang`, leaving the counterpart empty.
    pub fn set_originals(&mut self, lang: Lang, title: &str, body: &str, summary: &str) {
        let (t, b, s) = match lang {
            Lang::En => (&mut self.title_en, &mut self.body_en, &mut self.summary_en),
            Lang::Am => (&mut self.title_am, &mut self.body_am, &mut self.summary_am),
        };
        *t = title.to_string();
        *b = body.to_string();
        *s = summary.to_string();
    }
}

// ------------------------------------------------------------
// Collaborator contracts
// ------------------------------------------------------------

/// Upstream news search. One call per batch.
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ProviderItem>>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, lang: &str) -> Result<String>;
}

#[async_trait::async_trait]
pub trait TopicClassifier: Send + Sync {
    /// Up to `top_k` raw, unvalidated topic labels.
    async fn classify_topics(&self, text: &str, lang: &str, top_k: usize) -> Result<Vec<String>>;
}

#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
}

/// Produces globally unique opaque identifiers.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

/// UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_item_tolerates_missing_fields() {
        let it: ProviderItem = serde_json::from_str(r#"{"id":"x1","title":"Hello"}"#).unwrap();
        assert_eq!(it.id, "x1");
        assert_eq!(it.title, "Hello");
        assert!(it.text.is_empty());
        assert!(it.lang.is_empty());
    }

    #[test]
    fn provider_item_treats_null_as_empty() {
        let it: ProviderItem = serde_json::from_str(
            r#"{"id":"x2","title":"Hi","text":null,"lang":null,"published_date":null,"source_site":null}"#,
        )
        .unwrap();
        assert_eq!(it.id, "x2");
        assert!(it.text.is_empty());
        assert!(it.lang.is_empty());
        assert!(it.published_date.is_empty());
        assert!(it.source_site.is_empty());
    }

    #[test]
    fn lang_tags_default_to_english() {
        assert_eq!(Lang::from_tag("am"), Lang::Am);
        assert_eq!(Lang::from_tag(" AM "), Lang::Am);
        assert_eq!(Lang::from_tag("en"), Lang::En);
        assert_eq!(Lang::from_tag("fr"), Lang::En);
        assert_eq!(Lang::from_tag(""), Lang::En);
        assert_eq!(Lang::Am.other(), Lang::En);
    }

    #[test]
    fn set_originals_fills_only_one_language() {
        let mut n = NewsRecord::blank("n1".into(), Utc::now());
        n.set_originals(Lang::Am, "t", "b", "s");
        assert_eq!((n.title_am.as_str(), n.body_am.as_str(), n.summary_am.as_str()), ("t", "b", "s"));
        assert!(n.title_en.is_empty() && n.body_en.is_empty() && n.summary_en.is_empty());
    }
}
