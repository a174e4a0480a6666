use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::enrich;
use crate::record::{CanonicalRecord, RawRecord};

const BULLETS: &[char] = &['•', '·', '▪', '◦', '‣', '*', '-', '–', '—', '>'];

/// Per-run dedup state. Owned by the orchestrator and dropped with the run.
#[derive(Debug, Default)]
pub struct RunContext {
    seen: HashSet<String>,
    duplicates: usize,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn unique(&self) -> usize {
        self.seen.len()
    }

    /// Clean, hash and enrich one validated record. `None` when the run has
    /// already emitted a record with the same content hash.
    pub fn canonicalize(&mut self, raw: RawRecord) -> Option<CanonicalRecord> {
        let name = clean_text(&raw.name);
        let description = clean_text(&raw.description);
        let plant_part = title_case(&clean_text(&raw.plant_part));
        let industry = title_case(&clean_text(&raw.industry));
        let content_hash = content_hash(&name, &plant_part, &industry);

        if !self.seen.insert(content_hash.clone()) {
            self.duplicates += 1;
            return None;
        }

        let benefits = match clean_list(raw.benefits) {
            b if b.is_empty() => enrich::derive_benefits(&description),
            b => b,
        };
        let sustainability_aspects = match clean_list(raw.sustainability_aspects) {
            s if s.is_empty() => enrich::derive_sustainability(&description),
            s => s,
        };
        let keywords = enrich::keywords(&name, &description, &plant_part, &industry);
        let technical_specs = raw
            .technical_specs
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (clean_text(&k), clean_text(&v)))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        Some(CanonicalRecord {
            name,
            description,
            plant_part,
            industry,
            source_url: raw.source_url.trim().to_string(),
            benefits,
            technical_specs,
            sustainability_aspects,
            keywords,
            content_hash,
        })
    }
}

/// SHA-256 over `name|plant_part|industry`, each trimmed and lowercased.
pub fn content_hash(name: &str, plant_part: &str, industry: &str) -> String {
    let key = format!(
        "{}|{}|{}",
        name.trim().to_lowercase(),
        plant_part.trim().to_lowercase(),
        industry.trim().to_lowercase()
    );
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Strip control characters, collapse whitespace runs and drop leading
/// bullet or dash decorations.
pub fn clean_text(s: &str) -> String {
    let spaced: String = s
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() {
                None
            } else {
                Some(c)
            }
        })
        .collect();
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_start_matches(|c: char| BULLETS.contains(&c) || c == ' ')
        .to_string()
}

/// "food & nutrition" -> "Food & Nutrition"
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn clean_list(list: Option<Vec<String>>) -> Vec<String> {
    let mut seen = HashSet::new();
    list.unwrap_or_default()
        .iter()
        .map(|s| clean_text(s))
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, part: &str, industry: &str) -> RawRecord {
        RawRecord::new(name, "Hemp based product", part, industry, "https://hemp.org")
    }

    #[test]
    fn hash_ignores_case_and_outer_whitespace() {
        assert_eq!(
            content_hash("Hemp Rope", "Fiber", "Textiles"),
            content_hash("  hemp rope ", "FIBER", " textiles")
        );
        assert_ne!(
            content_hash("Hemp Rope", "Fiber", "Textiles"),
            content_hash("Hemp Twine", "Fiber", "Textiles")
        );
        assert_ne!(
            content_hash("Hemp Rope", "Fiber", "Textiles"),
            content_hash("Hemp Rope", "Stem", "Textiles")
        );
        assert_ne!(
            content_hash("Hemp Rope", "Fiber", "Textiles"),
            content_hash("Hemp Rope", "Fiber", "Construction")
        );
    }

    #[test]
    fn hash_is_order_dependent() {
        assert_ne!(content_hash("a", "b", "c"), content_hash("b", "a", "c"));
        assert_eq!(content_hash("a", "b", "c").len(), 64);
    }

    #[test]
    fn clean_text_rules() {
        assert_eq!(clean_text("  • Hemp\t\tseed \n oil  "), "Hemp seed oil");
        assert_eq!(clean_text("- – Hemp rope"), "Hemp rope");
        assert_eq!(clean_text("Hemp\u{0007}crete"), "Hempcrete");
        // interior dashes are content
        assert_eq!(clean_text("Hemp - based"), "Hemp - based");
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("food & nutrition"), "Food & Nutrition");
        assert_eq!(title_case("FIBER"), "Fiber");
        assert_eq!(title_case("whole  plant"), "Whole Plant");
    }

    #[test]
    fn duplicates_are_counted_not_emitted() {
        let mut ctx = RunContext::new();
        let inputs = vec![
            raw("Hemp Rope", "fiber", "textiles"),
            raw(" hemp rope", "FIBER", "Textiles "),
            raw("Hemp Rope", "stem", "textiles"),
            raw("•  Hemp   Rope", "fiber", "textiles"),
        ];
        let n = inputs.len();
        let out: Vec<CanonicalRecord> = inputs.into_iter().filter_map(|r| ctx.canonicalize(r)).collect();

        assert_eq!(out.len(), 2);
        assert_eq!(ctx.duplicates(), 2);
        assert_eq!(ctx.duplicates() + ctx.unique(), n);
        let hashes: HashSet<&str> = out.iter().map(|r| r.content_hash.as_str()).collect();
        assert_eq!(hashes.len(), out.len());
        assert_eq!(out[0].plant_part, "Fiber");
        assert_eq!(out[0].industry, "Textiles");
    }

    #[test]
    fn provided_lists_are_kept_and_cleaned() {
        let mut ctx = RunContext::new();
        let mut r = raw("Hemp Milk", "seed", "food & nutrition");
        r.benefits = Some(vec![" creamy ".into(), "Creamy".into(), "".into()]);
        let c = ctx.canonicalize(r).unwrap();
        assert_eq!(c.benefits, vec!["creamy".to_string()]);
        assert_eq!(c.industry, "Food & Nutrition");
    }

    #[test]
    fn contexts_are_isolated() {
        let mut a = RunContext::new();
        let mut b = RunContext::new();
        assert!(a.canonicalize(raw("Hemp Rope", "fiber", "Textiles")).is_some());
        assert!(b.canonicalize(raw("Hemp Rope", "fiber", "Textiles")).is_some());
        assert!(a.canonicalize(raw("Hemp Rope", "fiber", "Textiles")).is_none());
    }
}
