pub mod score;
pub mod search;
pub mod sitemap;

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Html,
    Csv,
    Json,
    Pdf,
    Text,
}

impl SourceFormat {
    /// Guess the format from the URL path extension; anything unknown is HTML.
    pub fn infer(url: &str) -> Self {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_lowercase();
        if path.ends_with(".csv") {
            SourceFormat::Csv
        } else if path.ends_with(".json") {
            SourceFormat::Json
        } else if path.ends_with(".pdf") {
            SourceFormat::Pdf
        } else if path.ends_with(".txt") {
            SourceFormat::Text
        } else {
            SourceFormat::Html
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "html" | "htm" => Some(SourceFormat::Html),
            "csv" => Some(SourceFormat::Csv),
            "json" => Some(SourceFormat::Json),
            "pdf" => Some(SourceFormat::Pdf),
            "text" | "txt" => Some(SourceFormat::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Html => "html",
            SourceFormat::Csv => "csv",
            SourceFormat::Json => "json",
            SourceFormat::Pdf => "pdf",
            SourceFormat::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSource {
    pub url: String,
    pub format: SourceFormat,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub score: f64,
}

impl CandidateSource {
    pub fn new(url: impl Into<String>, format: SourceFormat, license: Option<&str>) -> Self {
        CandidateSource {
            url: url.into(),
            format,
            license: license.map(str::to_string),
            score: 0.0,
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let format = SourceFormat::infer(&url);
        CandidateSource::new(url, format, None)
    }
}

/// Built-in seed list; always part of discovery.
pub const SEED_SOURCES: &[(&str, SourceFormat, Option<&str>)] = &[
    (
        "https://www.ers.usda.gov/data-products/industrial-hemp-data.csv",
        SourceFormat::Csv,
        Some("Public Domain"),
    ),
    (
        "https://www.nass.usda.gov/Publications/Todays_Reports/reports/hempan.txt",
        SourceFormat::Text,
        Some("Public Domain"),
    ),
    (
        "https://raw.githubusercontent.com/hemp-data/hemp-products/main/products.json",
        SourceFormat::Json,
        Some("CC-BY-4.0"),
    ),
    (
        "https://en.wikipedia.org/wiki/Hemp",
        SourceFormat::Html,
        Some("CC BY-SA 4.0"),
    ),
    (
        "https://www.fao.org/faostat/en/#data/QCL",
        SourceFormat::Html,
        Some("CC BY-NC-SA 3.0 IGO"),
    ),
    (
        "https://votehemp.com/wp-content/uploads/2019/09/hemp-uses.pdf",
        SourceFormat::Pdf,
        None,
    ),
];

pub fn seed_sources() -> Vec<CandidateSource> {
    SEED_SOURCES
        .iter()
        .map(|(url, format, license)| CandidateSource::new(*url, *format, *license))
        .collect()
}

#[derive(Deserialize)]
struct SeedEntry {
    url: String,
    format: Option<SourceFormat>,
    license: Option<String>,
}

/// Load extra seeds from a JSON array of `{url, format?, license?}`.
pub fn load_seed_file(path: &Path) -> Result<Vec<CandidateSource>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {:?}", path))?;
    let entries: Vec<SeedEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("Seed file {:?} is not a JSON array of sources", path))?;
    Ok(entries
        .into_iter()
        .map(|e| {
            let format = e.format.unwrap_or_else(|| SourceFormat::infer(&e.url));
            CandidateSource {
                url: e.url,
                format,
                license: e.license,
                score: 0.0,
            }
        })
        .collect())
}

/// Absolute http(s) URL with a host. Links found by sitemaps and search
/// must pass this; local paths only come from the operator.
pub fn is_web_url(url: &str) -> bool {
    url::Url::parse(url.trim())
        .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

/// Keep the first occurrence of each URL.
pub fn dedup_by_url(sources: Vec<CandidateSource>) -> Vec<CandidateSource> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert(s.url.trim_end_matches('/').to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn infer_format_from_extension() {
        assert_eq!(SourceFormat::infer("https://a.org/data.CSV"), SourceFormat::Csv);
        assert_eq!(SourceFormat::infer("https://a.org/x.json?raw=1"), SourceFormat::Json);
        assert_eq!(SourceFormat::infer("https://a.org/report.pdf#p2"), SourceFormat::Pdf);
        assert_eq!(SourceFormat::infer("https://a.org/notes.txt"), SourceFormat::Text);
        assert_eq!(SourceFormat::infer("https://a.org/hemp"), SourceFormat::Html);
    }

    #[test]
    fn seeds_start_unscored() {
        let seeds = seed_sources();
        assert_eq!(seeds.len(), SEED_SOURCES.len());
        assert!(seeds.iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn seed_file_infers_missing_format() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"[{{"url":"https://a.org/products.csv","license":"MIT"}},{{"url":"https://b.org/page","format":"json"}}]"#
        )
        .unwrap();
        let sources = load_seed_file(f.path()).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].format, SourceFormat::Csv);
        assert_eq!(sources[0].license.as_deref(), Some("MIT"));
        assert_eq!(sources[1].format, SourceFormat::Json);
    }

    #[test]
    fn only_http_urls_are_web_urls() {
        assert!(is_web_url("https://a.org/hemp.csv"));
        assert!(is_web_url("http://a.org"));
        assert!(!is_web_url("file:///etc/hemp.csv"));
        assert!(!is_web_url("/tmp/hemp.csv"));
        assert!(!is_web_url("ftp://a.org/hemp.csv"));
    }

    #[test]
    fn dedup_keeps_first() {
        let sources = vec![
            CandidateSource::new("https://a.org/x/", SourceFormat::Html, Some("MIT")),
            CandidateSource::from_url("https://A.org/x"),
            CandidateSource::from_url("https://b.org/y.csv"),
        ];
        let out = dedup_by_url(sources);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].license.as_deref(), Some("MIT"));
    }
}
