use thiserror::Error;

/// Failures the harvest distinguishes. Everything except `FatalConfig` is
/// recorded against the run and processing moves on.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("source unreachable: {url}: {reason}")]
    SourceUnreachable { url: String, reason: String },

    #[error("unsupported format for {url}: {reason}")]
    FormatUnsupported { url: String, reason: String },

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("fatal configuration error: {0}")]
    FatalConfig(String),
}

impl HarvestError {
    pub fn unreachable(url: &str, reason: impl ToString) -> Self {
        HarvestError::SourceUnreachable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn unsupported(url: &str, reason: impl ToString) -> Self {
        HarvestError::FormatUnsupported {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<rusqlite::Error> for HarvestError {
    fn from(e: rusqlite::Error) -> Self {
        HarvestError::Storage(e.to_string())
    }
}
