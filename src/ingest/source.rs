// src/ingest/source.rs
use crate::ingest::types::{IdGenerator, Lang, Source};
use crate::store::{SourceStore, StoreError};

/// Lower-case and replace spaces, slashes and underscores with hyphens.
/// "BBC News/Africa" -> "bbc-news-africa"
pub fn slugify(site: &str) -> String {
    site.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '_' => '-',
            c => c,
        })
        .collect()
}

/// Skeleton record for a site we have never seen: only name, url and language are known.
pub fn skeleton_source(id: String, site: &str, url: &str, lang: Lang) -> Source {
    Source {
        id,
        slug: slugify(site),
        name: site.to_string(),
        description: String::new(),
        url: url.to_string(),
        logo_url: String::new(),
        language: lang,
        reliability_score: 0.0,
    }
}

/// Resolve the provider's site name to a source id, creating a skeleton on first sight.
/// An empty site name resolves to an empty id without touching the store.
pub async fn resolve_source(
    store: &dyn SourceStore,
    ids: &dyn IdGenerator,
    site: &str,
    url: &str,
    lang: Lang,
) -> Result<String, StoreError> {
    if site.trim().is_empty() {
        return Ok(String::new());
    }
    let candidate = skeleton_source(ids.new_id(), site.trim(), url, lang);
    let stored = store.get_or_create(candidate).await?;
    Ok(stored.id)
}
