// src/ingest/summary.rs
//! Reader-facing summary layout: exactly five sentences, each spread over two lines.

const SENTENCES: usize = 5;
/// Sentences with more words than this are split at the word midpoint.
const SPLIT_MIN_WORDS: usize = 6;

/// Reshape a model summary.
///
/// Sentences are cut on `.`; fewer than five are padded by repeating the last one.
/// A long sentence is broken at its word midpoint, a short one is repeated on the
/// second line. Empty input stays empty.
pub fn shape_summary(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }

    let mut sentences: Vec<String> = s
        .split('.')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    let Some(last) = sentences.last().cloned() else {
        return s.to_string();
    };
    while sentences.len() < SENTENCES {
        sentences.push(last.clone());
    }
    sentences.truncate(SENTENCES);

    let lines: Vec<String> = sentences.iter().map(|s| two_lines(s)).collect();
    format!("{}.", lines.join(".\n"))
}

fn two_lines(sentence: &str) -> String {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.len() > SPLIT_MIN_WORDS {
        let mid = words.len() / 2;
        format!("{}\n{}", words[..mid].join(" "), words[mid..].join(" "))
    } else {
        format!("{sentence}\n{sentence}")
    }
}
