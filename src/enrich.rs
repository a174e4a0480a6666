use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static BENEFIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:benefits?|advantages?)(?:\s+(?:include|includes|are|is|of))?\s*:?\s+([^.;!?]+)|\b((?:helps|provides|reduces|improves)\s+[^.;!?]+)",
    )
    .unwrap()
});

static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?\n]+").unwrap());

pub const SUSTAINABILITY_KEYWORDS: &[&str] = &[
    "sustainable",
    "sustainability",
    "biodegradable",
    "renewable",
    "carbon",
    "eco-friendly",
    "recyclable",
    "compostable",
    "organic",
    "regenerative",
    "pesticide",
    "low water",
];

pub const STOP_WORDS: &[&str] = &[
    "about", "also", "been", "both", "each", "from", "have", "into", "made", "more", "most",
    "only", "other", "over", "some", "such", "than", "that", "their", "them", "then", "there",
    "these", "they", "this", "those", "under", "used", "uses", "using", "very", "were", "what",
    "when", "where", "which", "while", "will", "with", "your",
];

pub const MAX_KEYWORDS: usize = 20;
const MIN_BENEFIT_LEN: usize = 4;

/// Clauses following benefit/advantage/helps/provides/reduces/improves phrasing.
pub fn derive_benefits(description: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    BENEFIT_RE
        .captures_iter(description)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().trim_end_matches(',').trim().to_string())
        .filter(|b| b.chars().count() >= MIN_BENEFIT_LEN && seen.insert(b.to_lowercase()))
        .collect()
}

/// First sentence mentioning each sustainability keyword, without repeats.
pub fn derive_sustainability(description: &str) -> Vec<String> {
    let sentences: Vec<&str> = SENTENCE_RE
        .split(description)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut aspects: Vec<String> = Vec::new();
    for keyword in SUSTAINABILITY_KEYWORDS {
        let hit = sentences
            .iter()
            .find(|s| s.to_lowercase().contains(keyword));
        if let Some(sentence) = hit {
            if !aspects.iter().any(|a| a == sentence) {
                aspects.push(sentence.to_string());
            }
        }
    }
    aspects
}

/// Distinct lowercase tokens longer than three chars, stop words removed,
/// first-seen order, at most twenty.
pub fn keywords(name: &str, description: &str, plant_part: &str, industry: &str) -> Vec<String> {
    let text = format!("{} {} {} {}", name, description, plant_part, industry).to_lowercase();
    let mut seen = HashSet::new();
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() > 3 && !STOP_WORDS.contains(t))
        .filter(|t| seen.insert(t.to_string()))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}
