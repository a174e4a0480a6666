use rayon::prelude::*;
use tracing::debug;

use crate::heuristics::{is_numeric, OTHER_INDUSTRY};
use crate::record::RawRecord;

const NAME_TERMS: &[&str] = &["hemp", "cannabis", "cbd"];
const DESCRIPTION_TERM: &str = "hemp";

pub const ALLOWED_PLANT_PARTS: &[&str] = &[
    "seed", "fiber", "fibre", "flower", "leaf", "root", "stem", "stalk", "hurd",
    "bast", "oil", "whole plant", "biomass",
];

// User-generated content hosts; records from these need a real description.
const RISKY_HOSTS: &[&str] = &["reddit.com", "quora.com", "pinterest.", "facebook.com", "tiktok.com"];
const RISKY_MIN_DESCRIPTION: usize = 20;

/// All rules must pass. Returns the first failing rule for logging.
pub fn check(record: &RawRecord) -> Result<(), &'static str> {
    let name = record.name.trim();
    let description = record.description.trim();
    let name_len = name.chars().count();

    if is_numeric(name) {
        return Err("numeric name");
    }
    if is_numeric(&record.plant_part) {
        return Err("numeric plant part");
    }
    if name_len < 3 {
        return Err("name too short");
    }
    if description.is_empty() && name_len < 5 {
        return Err("too little signal");
    }

    let name_lower = name.to_lowercase();
    let desc_lower = description.to_lowercase();
    if !NAME_TERMS.iter().any(|t| name_lower.contains(t)) && !desc_lower.contains(DESCRIPTION_TERM) {
        return Err("not subject related");
    }

    let industry = record.industry.trim();
    if industry.is_empty() || industry == OTHER_INDUSTRY || is_numeric(industry) {
        return Err("missing industry");
    }

    // Either direction of containment counts, so short terms can over-match
    // (e.g. "oil" inside "soil").
    let part = record.plant_part.trim().to_lowercase();
    if part.is_empty()
        || !ALLOWED_PLANT_PARTS
            .iter()
            .any(|allowed| allowed.contains(part.as_str()) || part.contains(allowed))
    {
        return Err("plant part not allowed");
    }

    let url = record.source_url.to_lowercase();
    if RISKY_HOSTS.iter().any(|h| url.contains(h))
        && description.chars().count() < RISKY_MIN_DESCRIPTION
    {
        return Err("thin record from risky host");
    }

    Ok(())
}

pub fn is_valid(record: &RawRecord) -> bool {
    match check(record) {
        Ok(()) => true,
        Err(rule) => {
            debug!("Rejected '{}' from {}: {}", record.name, record.source_url, rule);
            false
        }
    }
}

/// Keep the valid records in their original order; returns them with the
/// number rejected.
pub fn validate_batch(records: Vec<RawRecord>) -> (Vec<RawRecord>, usize) {
    let total = records.len();
    let accepted: Vec<RawRecord> = records.into_par_iter().filter(is_valid).collect();
    let rejected = total - accepted.len();
    (accepted, rejected)
}
