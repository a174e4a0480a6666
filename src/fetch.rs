use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::HarvestError;

/// Caps simultaneous outbound requests. Tokio's semaphore is fair, so waiters
/// are served in the order they called `acquire`.
#[derive(Clone)]
pub struct Limiter {
    sem: Arc<Semaphore>,
}

impl Limiter {
    pub fn new(max_concurrent: usize) -> Self {
        Limiter {
            sem: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, HarvestError> {
        Arc::clone(&self.sem)
            .acquire_owned()
            .await
            .map_err(|e| HarvestError::unreachable("request limiter", e))
    }

    pub fn available(&self) -> usize {
        self.sem.available_permits()
    }
}

/// Plain GET against http(s) URLs, or a read for `file://` URLs and bare paths.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    limiter: Limiter,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self, HarvestError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| HarvestError::FatalConfig(format!("http client: {e}")))?;
        Ok(Fetcher {
            client,
            limiter: Limiter::new(settings.max_concurrent_requests),
        })
    }

    pub async fn get(&self, url: &str) -> Result<String, HarvestError> {
        if local_path(url).is_some() {
            return self.fetch_unlimited(url).await;
        }
        let _permit = self.limiter.acquire().await?;
        self.fetch_unlimited(url).await
    }

    /// Fetch several URLs concurrently under the limiter. Permits are taken in
    /// submission order before each task is spawned; results come back in the
    /// same order as `urls`.
    pub async fn fetch_many(&self, urls: Vec<String>) -> Vec<(String, Result<String, HarvestError>)> {
        debug!(
            "Queueing {} fetches, {} permits free",
            urls.len(),
            self.limiter.available()
        );
        let mut handles = Vec::with_capacity(urls.len());
        for url in urls {
            let task = match self.limiter.acquire().await {
                Ok(permit) => {
                    let this = self.clone();
                    let target = url.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        this.fetch_unlimited(&target).await
                    })
                }
                Err(e) => tokio::spawn(async move { Err(e) }),
            };
            handles.push((url, task));
        }
        join_in_order(handles).await
    }

    async fn fetch_unlimited(&self, url: &str) -> Result<String, HarvestError> {
        if let Some(path) = local_path(url) {
            return tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| HarvestError::unreachable(url, e));
        }

        let start = Instant::now();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HarvestError::unreachable(url, e))?
            .error_for_status()
            .map_err(|e| HarvestError::unreachable(url, e))?;
        let body = resp
            .text()
            .await
            .map_err(|e| HarvestError::unreachable(url, e))?;
        debug!(
            "GET {} -> {} bytes in {}ms",
            url,
            body.len(),
            start.elapsed().as_millis()
        );
        Ok(body)
    }
}

/// One entry per handle, in order. A task that panicked or was cancelled
/// counts as an unreachable source.
async fn join_in_order(
    handles: Vec<(String, JoinHandle<Result<String, HarvestError>>)>,
) -> Vec<(String, Result<String, HarvestError>)> {
    let mut out = Vec::with_capacity(handles.len());
    for (url, task) in handles {
        let result = match task.await {
            Ok(r) => r,
            Err(e) => {
                warn!("Fetch task for {} failed: {}", url, e);
                Err(HarvestError::unreachable(&url, e))
            }
        };
        out.push((url, result));
    }
    out
}

fn local_path(url: &str) -> Option<PathBuf> {
    if let Some(rest) = url.strip_prefix("file://") {
        return Some(PathBuf::from(rest));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        None
    } else {
        Some(PathBuf::from(url))
    }
}
