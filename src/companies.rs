use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::dedup::clean_text;
use crate::record::{CanonicalRecord, Company};

// Capitalized run of up to five words: "Green Valley Hemp Co"
const NAME: &str = r"[A-Z][\w&'-]*(?:\s+[A-Z][\w&'-]*){0,4}";

static ATTRIBUTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i:made|produced|manufactured|developed|sold)\s+(?i:by)\s+({NAME})"
    ))
    .unwrap()
});

static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b((?:[A-Z][\w&'-]*\s+){1,4}(?:Inc|LLC|Ltd|Corp|Co|Company|GmbH|Brand))\b").unwrap()
});

static COPYRIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:©|\([cC]\)|(?i:copyright))\s*(?:\d{{4}}(?:\s*[-–]\s*\d{{4}})?\s*)?({NAME})"
    ))
    .unwrap()
});

const MIN_NAME: usize = 3;

/// Company names mentioned in `text`, in pattern order then position order.
/// Not deduplicated.
pub fn company_names(text: &str) -> Vec<String> {
    [&*ATTRIBUTION_RE, &*SUFFIX_RE, &*COPYRIGHT_RE]
        .iter()
        .flat_map(|re| re.captures_iter(text).map(|caps| clean_name(&caps[1])))
        .filter(|n| n.chars().count() >= MIN_NAME)
        .collect()
}

fn clean_name(raw: &str) -> String {
    clean_text(raw)
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

/// `https://www.example.org/a/b?c` -> `https://www.example.org/`. Only http(s).
pub fn site_root(source_url: &str) -> Option<String> {
    let mut url = Url::parse(source_url.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Companies seen during one run, deduplicated by lowercase name.
#[derive(Debug, Default)]
pub struct CompanyBook {
    seen: HashSet<String>,
    companies: Vec<Company>,
}

impl CompanyBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every company mentioned by `record`. Returns how many were new.
    pub fn observe(&mut self, record: &CanonicalRecord) -> usize {
        let text = format!("{} {}", record.description, record.source_url);
        let mut added = 0;
        for name in company_names(&text) {
            if !self.seen.insert(name.to_lowercase()) {
                continue;
            }
            self.companies.push(Company {
                name,
                website: site_root(&record.source_url),
                description: None,
                primary_focus: Some(record.industry.clone()).filter(|i| !i.is_empty()),
            });
            added += 1;
        }
        added
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }
}
