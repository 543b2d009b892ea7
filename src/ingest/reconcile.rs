// src/ingest/reconcile.rs
//! Bilingual reconciliation: after this pass every {title, body, summary} pair of a
//! [`NewsRecord`] is either filled in both languages or empty in both.
//!
//! A missing side is machine-translated from its sibling. When translation fails the
//! sibling text is copied verbatim, so a record never ships half-filled.

use metrics::counter;

use crate::ingest::types::{Lang, NewsRecord, Translator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// Both sides were already filled, or both empty.
    Untouched,
    Translated,
    Mirrored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub translated: usize,
    pub mirrored: usize,
}

impl ReconcileReport {
    fn record(&mut self, o: PairOutcome) {
        match o {
            PairOutcome::Untouched => {}
            PairOutcome::Translated => self.translated += 1,
            PairOutcome::Mirrored => self.mirrored += 1,
        }
    }
}

/// Fill the empty side of one field pair. Never overwrites a non-empty side.
pub async fn fill_pair(
    en: &mut String,
    am: &mut String,
    translator: &dyn Translator,
) -> PairOutcome {
    let (src, dst, from) = match (en.is_empty(), am.is_empty()) {
        (false, true) => (&*en, am, Lang::En),
        (true, false) => (&*am, en, Lang::Am),
        _ => return PairOutcome::Untouched,
    };

    match translator
        .translate(src, from.code(), from.other().code())
        .await
    {
        Ok(t) if !t.trim().is_empty() => {
            *dst = t;
            PairOutcome::Translated
        }
        Ok(_) => {
            tracing::debug!(target: "ingest", from = from.code(), "empty translation, mirroring");
            *dst = src.clone();
            PairOutcome::Mirrored
        }
        Err(e) => {
            tracing::debug!(target: "ingest", from = from.code(), error = ?e, "translation failed, mirroring");
            *dst = src.clone();
            PairOutcome::Mirrored
        }
    }
}

/// Reconcile title, body and summary, in that order. Each field is independent:
/// a failure on one does not affect the others.
pub async fn reconcile(record: &mut NewsRecord, translator: &dyn Translator) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    report.record(fill_pair(&mut record.title_en, &mut record.title_am, translator).await);
    report.record(fill_pair(&mut record.body_en, &mut record.body_am, translator).await);
    report.record(fill_pair(&mut record.summary_en, &mut record.summary_am, translator).await);

    if report.mirrored > 0 {
        counter!("ingest_translation_fallbacks_total").increment(report.mirrored as u64);
    }
    report
}

/// True when no field pair has exactly one side filled.
pub fn is_bilingual_complete(n: &NewsRecord) -> bool {
    [
        (&n.title_en, &n.title_am),
        (&n.body_en, &n.body_am),
        (&n.summary_en, &n.summary_am),
    ]
    .iter()
    .all(|(a, b)| a.is_empty() == b.is_empty())
}
