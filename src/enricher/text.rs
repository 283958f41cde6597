//! Text-analysis enrichment pass (spec §4.4, §9): gathers whatever text is
//! available across a business's provenance (review blurbs, crawled page
//! text, search snippets), then runs the closed-vocabulary deterministic
//! fallback named in spec §9 — a regex + lexicon analysis, not a live
//! sentiment-API call (that call is explicitly out of the core's required
//! behavior per spec §1: "an optional text-sentiment call").

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::error::PipelineError;
use crate::model::{Business, OwnerInfo};

/// Closed succession-cue vocabulary (spec §4.4).
const SUCCESSION_CUES: &[&str] = &["retire", "succession", "selling", "exit", "family business"];

const POSITIVE_LEXICON: &[&str] = &[
    "great", "excellent", "friendly", "professional", "reliable", "trusted", "recommend",
    "amazing", "fantastic", "best", "helpful", "honest", "quality", "clean", "fast",
];
const NEGATIVE_LEXICON: &[&str] = &[
    "terrible", "rude", "overpriced", "scam", "unreliable", "slow", "dirty", "worst",
    "avoid", "disappointed", "awful", "poor", "never", "complaint",
];
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "from", "have", "our", "are", "was",
    "were", "they", "their", "your", "you", "has", "had", "been", "about", "will",
];

static OWNER_ROLE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(owner|ceo|president|founder)\b").expect("static pattern"));
static NAME_THEN_ROLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][a-zA-Z'.-]+(?:\s[A-Z][a-zA-Z'.-]+){0,2}),?\s+(?:is\s+(?:the|our)\s+)?(owner|CEO|president|founder)\b")
        .expect("static pattern")
});
static ROLE_THEN_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(owner|ceo|president|founder)\b\s*[:\-]?\s*([A-Z][a-zA-Z'.-]+(?:\s[A-Z][a-zA-Z'.-]+){0,2})")
        .expect("static pattern")
});
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{3,}").expect("static pattern"));

pub async fn enrich(business: &mut Business) -> Result<bool, PipelineError> {
    let text = gather_text(business);
    if text.trim().is_empty() {
        return Ok(false);
    }

    let sentiment = sentiment_polarity(&text);
    let themes = key_themes(&text, 5);
    let owner_mention = extract_owner_mention(&text);
    let succession_cues: Vec<&str> =
        SUCCESSION_CUES.iter().copied().filter(|cue| text.to_lowercase().contains(cue)).collect();

    if business.owner.is_none() {
        if let Some((name, _role)) = &owner_mention {
            business.owner = Some(OwnerInfo {
                name: Some(name.clone()),
                age_estimate: None,
                detection_source: "text_analysis".to_string(),
                confidence: 0.6,
            });
        } else if OWNER_ROLE_TOKEN_RE.is_match(&text) {
            business.owner = Some(OwnerInfo {
                name: None,
                age_estimate: None,
                detection_source: "text_analysis".to_string(),
                confidence: 0.6,
            });
        }
    }

    business.enrichment.nlp_analysis = Some(json!({
        "sentiment_polarity": sentiment,
        "key_themes": themes,
        "owner_mentioned": owner_mention.is_some() || OWNER_ROLE_TOKEN_RE.is_match(&text),
        "owner_name_extracted": owner_mention.map(|(n, _)| n),
        "succession_cues_detected": !succession_cues.is_empty(),
        "succession_cues": succession_cues,
        "source_char_count": text.len(),
    }));
    Ok(true)
}

/// Gather candidate text from a business's own name, notes, and any string
/// field in its provenance raw payloads (spec: "descriptions, reviews in
/// per-source raw payloads").
fn gather_text(business: &Business) -> String {
    let mut parts = vec![business.name.clone()];
    parts.extend(business.notes.iter().cloned());

    for record in &business.data_sources {
        collect_strings(&record.raw, &mut parts);
    }
    parts.retain(|p| p.len() > 3);
    parts.join(". ")
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

/// Polarity in [-1, 1]: lexicon hit balance scaled by a fixed gain so a
/// handful of strong words move the needle without one token saturating it.
fn sentiment_polarity(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let words: Vec<&str> = WORD_RE.find_iter(&lower).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return 0.0;
    }
    let positive = words.iter().filter(|w| POSITIVE_LEXICON.contains(w)).count() as f64;
    let negative = words.iter().filter(|w| NEGATIVE_LEXICON.contains(w)).count() as f64;
    ((positive - negative) / (words.len() as f64).sqrt().max(1.0)).clamp(-1.0, 1.0)
}

/// Top-N most frequent non-stopword tokens of length >= 4, a cheap stand-in
/// for a real topic model.
fn key_themes(text: &str, n: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for m in WORD_RE.find_iter(&lower) {
        let w = m.as_str();
        if w.len() >= 4 && !STOPWORDS.contains(&w) {
            *counts.entry(w).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(&str, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(w, _)| w.to_string()).collect()
}

/// Best-effort owner name extraction around a role token, trying both
/// "Name, role" and "role: Name" orderings.
fn extract_owner_mention(text: &str) -> Option<(String, String)> {
    if let Some(caps) = NAME_THEN_ROLE_RE.captures(text) {
        return Some((caps[1].to_string(), caps[2].to_lowercase()));
    }
    if let Some(caps) = ROLE_THEN_NAME_RE.captures(text) {
        return Some((caps[2].to_string(), caps[1].to_lowercase()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_succession_cues_from_closed_vocabulary() {
        let text = "The owner is planning to retire next year and is open to selling.";
        assert!(SUCCESSION_CUES.iter().any(|c| text.to_lowercase().contains(c)));
    }

    #[test]
    fn extracts_owner_name_from_role_then_name_pattern() {
        let (name, role) = extract_owner_mention("Contact the Owner: Maria Gonzalez for details.").unwrap();
        assert_eq!(name, "Maria Gonzalez");
        assert_eq!(role, "owner");
    }

    #[test]
    fn sentiment_is_positive_for_praise_heavy_text() {
        let score = sentiment_polarity("Great friendly professional service, highly recommend, excellent quality.");
        assert!(score > 0.0);
    }

    #[test]
    fn sentiment_is_zero_for_empty_text() {
        assert_eq!(sentiment_polarity(""), 0.0);
    }
}
