use std::sync::LazyLock;

use regex::Regex;

use super::truncate;
use crate::heuristics::{detect_industry, detect_plant_part, is_subject_related};
use crate::record::RawRecord;

static SENTENCE_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?\n]+").unwrap());

// Tried in order; first hit names the product.
static SENTENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^([^,]+?)\s+(?:is used for|can be used for|is used in|used in)\s+(.+)$",
        r"^([^:]+):\s*(.+)$",
        r"^([^-–—]+?)\s*[-–—]\s*(.+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const MIN_SENTENCE: usize = 10;
const MAX_FALLBACK_NAME: usize = 50;

/// One record per subject-related sentence of a plain-text document.
pub fn extract(content: &str, source_url: &str) -> Vec<RawRecord> {
    SENTENCE_SPLIT_RE
        .split(content)
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_SENTENCE && is_subject_related(s))
        .map(|s| parse_sentence(s, source_url))
        .collect()
}

fn parse_sentence(sentence: &str, source_url: &str) -> RawRecord {
    let (name, description) = SENTENCE_PATTERNS
        .iter()
        .find_map(|re| {
            let caps = re.captures(sentence)?;
            Some((caps[1].trim().to_string(), caps[2].trim().to_string()))
        })
        .unwrap_or_else(|| (truncate(sentence, MAX_FALLBACK_NAME), sentence.to_string()));

    RawRecord::new(
        name,
        description,
        detect_plant_part(sentence),
        detect_industry(sentence),
        source_url,
    )
}
