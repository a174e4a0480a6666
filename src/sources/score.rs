use tracing::{debug, info};

use super::{CandidateSource, SourceFormat};
use crate::config::{ScoringWeights, Settings};

pub const MAX_RANKED: usize = 10;

const OPEN_LICENSES: &[&str] = &[
    "mit",
    "apache",
    "bsd",
    "gpl",
    "cc0",
    "cc-by",
    "cc by",
    "creative commons",
    "public domain",
    "odbl",
    "open data",
    "open government",
    "ogl",
];

const HIGH_TRUST: &[&str] = &[
    "usda.gov",
    "data.gov",
    "fao.org",
    "europa.eu",
    "ncbi.nlm.nih.gov",
    "votehemp.com",
];

const PUBLIC_HOST_BONUS: f64 = 0.1;
const HIGH_TRUST_BONUS: f64 = 0.15;

// No size or freshness signal is measured yet; both terms contribute a fixed
// half weight for every source.
const DATASET_SIZE_FACTOR: f64 = 0.5;
const FRESHNESS_FACTOR: f64 = 0.5;

fn structure_factor(format: SourceFormat) -> f64 {
    match format {
        SourceFormat::Csv | SourceFormat::Json => 1.0,
        SourceFormat::Html | SourceFormat::Text => 0.5,
        SourceFormat::Pdf => 0.3,
    }
}

fn license_factor(license: Option<&str>) -> f64 {
    let open = license
        .map(|l| l.to_lowercase())
        .is_some_and(|l| OPEN_LICENSES.iter().any(|k| l.contains(k)));
    if open {
        1.0
    } else {
        0.5
    }
}

fn is_public_host(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(u) => u
            .host_str()
            .is_some_and(|h| h.ends_with(".gov") || h.ends_with(".org")),
        Err(_) => url.contains(".gov") || url.contains(".org"),
    }
}

/// Weighted sum of the scoring terms plus host bonuses. Not capped at 1.0.
pub fn score(source: &CandidateSource, weights: &ScoringWeights) -> f64 {
    let mut s = weights.structure * structure_factor(source.format)
        + weights.license * license_factor(source.license.as_deref())
        + weights.dataset_size * DATASET_SIZE_FACTOR
        + weights.freshness * FRESHNESS_FACTOR;

    if is_public_host(&source.url) {
        s += PUBLIC_HOST_BONUS;
    }
    let lower = source.url.to_lowercase();
    if HIGH_TRUST.iter().any(|t| lower.contains(t)) {
        s += HIGH_TRUST_BONUS;
    }
    s
}

/// Score, sort descending, keep the top ten, then drop anything under the threshold.
pub fn rank(sources: Vec<CandidateSource>, settings: &Settings) -> Vec<CandidateSource> {
    let total = sources.len();
    let mut scored: Vec<CandidateSource> = sources
        .into_iter()
        .map(|mut s| {
            s.score = score(&s, &settings.weights);
            debug!("Scored {} ({}) = {:.3}", s.url, s.format.as_str(), s.score);
            s
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(MAX_RANKED);
    scored.retain(|s| s.score >= settings.score_threshold);

    info!(
        "Ranked {} candidate sources, {} at or above threshold {:.2}",
        total,
        scored.len(),
        settings.score_threshold
    );
    scored
}
