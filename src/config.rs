use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::HarvestError;

const DEFAULT_USER_AGENT: &str = "hemp_harvester/0.1 (+https://github.com/hemp-harvester)";

/// Relative weights of the four scoring terms. Must sum to 1.0.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScoringWeights {
    pub structure: f64,
    pub license: f64,
    pub dataset_size: f64,
    pub freshness: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            structure: 0.4,
            license: 0.3,
            dataset_size: 0.15,
            freshness: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.structure + self.license + self.dataset_size + self.freshness
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub rate_limit_ms: u64,
    pub max_concurrent_requests: usize,
    pub user_agent: String,
    pub request_timeout_ms: u64,
    pub score_threshold: f64,
    pub weights: ScoringWeights,
    pub batch_size: usize,
    pub db_path: String,
    pub search_endpoint: Option<String>,
    pub search_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            rate_limit_ms: 1000,
            max_concurrent_requests: 2,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_ms: 30_000,
            score_threshold: 0.6,
            weights: ScoringWeights::default(),
            batch_size: 500,
            db_path: "data/hemp.sqlite".to_string(),
            search_endpoint: None,
            search_api_key: None,
        }
    }
}

impl Settings {
    /// Defaults, then the optional TOML file, then `HEMP_*` environment
    /// variables (`__` separates nested keys, e.g. `HEMP_WEIGHTS__LICENSE`).
    pub fn load(file: Option<&Path>) -> Result<Self, HarvestError> {
        let d = Settings::default();
        let path = file
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| "harvest.toml".to_string());

        let settings = build(&d, &path)
            .and_then(|c| c.try_deserialize::<Settings>())
            .map_err(|e| HarvestError::FatalConfig(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), HarvestError> {
        let fatal = |msg: String| Err(HarvestError::FatalConfig(msg));

        if (self.weights.total() - 1.0).abs() > 1e-6 {
            return fatal(format!(
                "scoring weights must sum to 1.0 (got {:.3})",
                self.weights.total()
            ));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return fatal(format!(
                "score_threshold must be within 0..=1 (got {})",
                self.score_threshold
            ));
        }
        if self.max_concurrent_requests == 0 {
            return fatal("max_concurrent_requests must be at least 1".into());
        }
        if self.batch_size == 0 {
            return fatal("batch_size must be at least 1".into());
        }
        if self.db_path.trim().is_empty() {
            return fatal("db_path is required".into());
        }
        if self.search_endpoint.is_some()
            && self.search_api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return fatal("search_endpoint is set but search_api_key is missing".into());
        }
        Ok(())
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn build(d: &Settings, path: &str) -> Result<::config::Config, ::config::ConfigError> {
    ::config::Config::builder()
        .set_default("rate_limit_ms", d.rate_limit_ms as i64)?
        .set_default("max_concurrent_requests", d.max_concurrent_requests as i64)?
        .set_default("user_agent", d.user_agent.as_str())?
        .set_default("request_timeout_ms", d.request_timeout_ms as i64)?
        .set_default("score_threshold", d.score_threshold)?
        .set_default("weights.structure", d.weights.structure)?
        .set_default("weights.license", d.weights.license)?
        .set_default("weights.dataset_size", d.weights.dataset_size)?
        .set_default("weights.freshness", d.weights.freshness)?
        .set_default("batch_size", d.batch_size as i64)?
        .set_default("db_path", d.db_path.as_str())?
        .add_source(::config::File::with_name(path).required(false))
        .add_source(
            ::config::Environment::with_prefix("HEMP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
}
