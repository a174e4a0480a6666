use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use super::{is_web_url, CandidateSource, SourceFormat};
use crate::config::Settings;
use crate::fetch::Fetcher;
use crate::heuristics::is_subject_related;

pub const DEFAULT_QUERIES: &[&str] = &[
    "industrial hemp products dataset",
    "hemp product uses csv",
    "hemp fiber applications list",
    "hemp seed food products",
    "hempcrete building materials",
];

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Keyed web search returning `{"results": [{url, title, description}]}`.
pub struct SearchClient {
    endpoint: String,
    key: String,
}

impl SearchClient {
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let endpoint = settings.search_endpoint.clone()?;
        let key = settings.search_api_key.clone()?;
        Some(SearchClient { endpoint, key })
    }

    fn query_url(&self, query: &str) -> Result<String> {
        let url = url::Url::parse_with_params(&self.endpoint, &[("q", query), ("key", self.key.as_str())])
            .with_context(|| format!("Invalid search endpoint {}", self.endpoint))?;
        Ok(url.to_string())
    }

    pub async fn discover(&self, fetcher: &Fetcher, queries: &[&str]) -> Vec<CandidateSource> {
        let mut urls = Vec::new();
        let mut labels = Vec::new();
        for q in queries {
            match self.query_url(q) {
                Ok(u) => {
                    urls.push(u);
                    labels.push(*q);
                }
                Err(e) => warn!("{}", e),
            }
        }

        let mut found = Vec::new();
        for (query, (_, result)) in labels.into_iter().zip(fetcher.fetch_many(urls).await) {
            // errors carry the keyed URL; log the query only
            let hits = match result.ok().map(|body| parse_results(&body)) {
                Some(Ok(hits)) => hits,
                Some(Err(_)) | None => {
                    warn!("Search query '{}' failed", query);
                    continue;
                }
            };
            let before = found.len();
            found.extend(hits_to_sources(hits));
            info!("Search '{}': {} candidate sources", query, found.len() - before);
        }
        found
    }
}

pub fn parse_results(body: &str) -> Result<Vec<SearchHit>> {
    let resp: SearchResponse =
        serde_json::from_str(body).context("Search response is not the expected JSON shape")?;
    Ok(resp.results)
}

fn hits_to_sources(hits: Vec<SearchHit>) -> Vec<CandidateSource> {
    hits.into_iter()
        .filter(|h| is_web_url(&h.url))
        .filter(|h| is_subject_related(&format!("{} {} {}", h.url, h.title, h.description)))
        .map(|h| {
            let format = SourceFormat::infer(&h.url);
            CandidateSource::new(h.url, format, None)
        })
        .collect()
}
