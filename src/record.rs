use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A candidate record as produced by an extractor, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRecord {
    pub name: String,
    pub description: String,
    pub plant_part: String,
    pub industry: String,
    pub source_url: String,
    pub benefits: Option<Vec<String>>,
    pub technical_specs: Option<BTreeMap<String, String>>,
    pub sustainability_aspects: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
}

impl RawRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        plant_part: impl Into<String>,
        industry: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        RawRecord {
            name: name.into(),
            description: description.into(),
            plant_part: plant_part.into(),
            industry: industry.into(),
            source_url: source_url.into(),
            ..Default::default()
        }
    }
}

/// A validated, cleaned and hashed record ready for storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub name: String,
    pub description: String,
    pub plant_part: String,
    pub industry: String,
    pub source_url: String,
    pub benefits: Vec<String>,
    pub technical_specs: BTreeMap<String, String>,
    pub sustainability_aspects: Vec<String>,
    pub keywords: Vec<String>,
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Company {
    pub name: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub primary_focus: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

pub type RunId = i64;

/// One row of the run log.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestRun {
    pub id: RunId,
    pub agent: String,
    pub started_at: DateTime<Utc>,
    pub status: RunStatus,
    pub products_found: usize,
    pub products_saved: usize,
    pub companies_saved: usize,
    pub errors: Vec<String>,
}

/// Fields written to a run when it finishes.
#[derive(Debug, Clone)]
pub struct RunUpdate {
    pub status: RunStatus,
    pub products_found: usize,
    pub products_saved: usize,
    pub companies_saved: usize,
    pub error_message: Option<String>,
}
