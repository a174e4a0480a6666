pub mod csv;
pub mod html;
pub mod json;
pub mod text;

use std::time::Duration;

use tracing::{info, warn};

use crate::error::HarvestError;
use crate::record::RawRecord;
use crate::sources::{CandidateSource, SourceFormat};

/// Run the extractor matching the source's declared format.
pub fn extract(
    format: SourceFormat,
    content: &str,
    source_url: &str,
) -> Result<Vec<RawRecord>, HarvestError> {
    let records = match format {
        SourceFormat::Html => html::extract(content, source_url),
        SourceFormat::Csv => csv::extract(content, source_url),
        SourceFormat::Json => json::extract(content, source_url)?,
        SourceFormat::Text => text::extract(content, source_url),
        SourceFormat::Pdf => {
            warn!("PDF extraction is not implemented; {} yields no records", source_url);
            Vec::new()
        }
    };
    Ok(records)
}

/// Extract, then hold the caller for `delay` so consecutive sources respect
/// the per-source rate limit. The delay applies on failure too.
pub async fn extract_paced(
    source: &CandidateSource,
    content: &str,
    delay: Duration,
) -> Result<Vec<RawRecord>, HarvestError> {
    let result = extract(source.format, content, &source.url);
    if let Ok(records) = &result {
        info!(
            "Extracted {} candidate records from {} ({})",
            records.len(),
            source.url,
            source.format.as_str()
        );
    }
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    result
}

/// Truncate to at most `max` chars, appending "..." when cut.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", s[..cut].trim_end()),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn pdf_always_empty() {
        let out = extract(SourceFormat::Pdf, "%PDF-1.7 hemp fiber", "https://a.org/x.pdf").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn dispatch_by_format() {
        let csv = "name,description,part,industry\nHemp Twine,Strong hemp twine,fiber,Textiles";
        let out = extract(SourceFormat::Csv, csv, "https://a.org/x.csv").unwrap();
        assert_eq!(out.len(), 1);

        let err = extract(SourceFormat::Json, "{not json", "https://a.org/x.json").unwrap_err();
        assert!(matches!(err, HarvestError::FormatUnsupported { .. }));
    }

    #[tokio::test]
    async fn pacing_delay_is_applied() {
        let source = CandidateSource::from_url("https://a.org/x.csv");
        let start = Instant::now();
        extract_paced(&source, "name\nHemp Rope", Duration::from_millis(40))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("hemp", 10), "hemp");
        assert_eq!(truncate("hempseed oil", 8), "hempseed...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }
}
