use anyhow::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{info, warn};

use super::{is_web_url, CandidateSource, SourceFormat};
use crate::fetch::Fetcher;
use crate::heuristics::is_subject_related;

/// Fetch each sitemap and keep the URLs that look like hemp data: structured
/// files, or pages whose path mentions the subject.
pub async fn discover(fetcher: &Fetcher, sitemaps: &[String]) -> Vec<CandidateSource> {
    if sitemaps.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    for (url, result) in fetcher.fetch_many(sitemaps.to_vec()).await {
        let xml = match result {
            Ok(xml) => xml,
            Err(e) => {
                warn!("Sitemap skipped: {}", e);
                continue;
            }
        };
        match parse_urlset(&xml) {
            Ok(urls) => {
                let before = found.len();
                found.extend(filter_candidates(urls));
                info!(
                    "Sitemap {}: {} candidate URLs",
                    url,
                    found.len() - before
                );
            }
            Err(e) => warn!("Sitemap {} is not a urlset: {}", url, e),
        }
    }
    found
}

fn filter_candidates(urls: Vec<String>) -> Vec<CandidateSource> {
    urls.into_iter()
        .filter(|url| is_web_url(url))
        .filter_map(|url| {
            let format = SourceFormat::infer(&url);
            let keep = format != SourceFormat::Html || is_subject_related(&url);
            keep.then(|| CandidateSource::new(url, format, None))
        })
        .collect()
}

/// `<loc>` values of every `<url>` entry, in document order.
fn parse_urlset(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<String> = None;
    let mut locs = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"loc" && path.last().map(Vec::as_slice) == Some(b"url".as_slice()) {
                    current = Some(String::new());
                }
                path.push(name);
            }
            Event::Text(t) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if path.pop().as_deref() == Some(b"loc".as_slice()) {
                    if let Some(loc) = current.take().filter(|l| !l.trim().is_empty()) {
                        locs.push(loc.trim().to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(locs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn parses_locs_inside_url_entries() {
        let xml = std::fs::read_to_string("tests/fixtures/sitemap.xml").unwrap();
        let urls = parse_urlset(&xml).unwrap();
        assert_eq!(urls.len(), 4);
        assert_eq!(urls[0], "https://plantfacts.org/data/products.csv");
    }

    #[test]
    fn keeps_data_files_and_subject_pages() {
        let xml = std::fs::read_to_string("tests/fixtures/sitemap.xml").unwrap();
        let candidates = filter_candidates(parse_urlset(&xml).unwrap());
        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://plantfacts.org/data/products.csv",
                "https://plantfacts.org/hemp-uses",
                "https://plantfacts.org/reports/fiber.json",
            ]
        );
        assert_eq!(candidates[0].format, SourceFormat::Csv);
        assert_eq!(candidates[1].format, SourceFormat::Html);
    }

    #[test]
    fn local_file_locs_are_rejected() {
        let xml = r#"<urlset>
            <url><loc>file:///tmp/hemp_products.csv</loc></url>
            <url><loc>/srv/data/hemp.json</loc></url>
            <url><loc><![CDATA[https://plantfacts.org/hemp.csv]]></loc></url>
        </urlset>"#;
        let urls = parse_urlset(xml).unwrap();
        assert_eq!(urls.len(), 3);
        let candidates = filter_candidates(urls);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://plantfacts.org/hemp.csv");
    }

    #[test]
    fn loc_outside_url_is_ignored() {
        let xml = "<urlset><loc>https://a.org/stray.csv</loc><url><loc>https://a.org/hemp.csv</loc></url></urlset>";
        assert_eq!(parse_urlset(xml).unwrap(), vec!["https://a.org/hemp.csv".to_string()]);
    }

    #[tokio::test]
    async fn unreachable_sitemaps_are_skipped() {
        let fetcher = Fetcher::new(&Settings::default()).unwrap();
        let found = discover(
            &fetcher,
            &[
                "tests/fixtures/missing.xml".to_string(),
                "tests/fixtures/sitemap.xml".to_string(),
            ],
        )
        .await;
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn malformed_xml_errors() {
        assert!(parse_urlset("<urlset><url><loc>a</url>").is_err());
    }
}
