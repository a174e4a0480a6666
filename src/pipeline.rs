use std::path::PathBuf;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::companies::CompanyBook;
use crate::config::Settings;
use crate::dedup::RunContext;
use crate::error::HarvestError;
use crate::extract;
use crate::fetch::Fetcher;
use crate::record::{CanonicalRecord, RawRecord, RunStatus, RunUpdate};
use crate::sources::search::{SearchClient, DEFAULT_QUERIES};
use crate::sources::{self, score, sitemap, CandidateSource};
use crate::store::Storage;
use crate::validate;

pub const AGENT_LABEL: &str = "hemp_harvester";

/// Where candidate sources come from, besides the built-in seeds.
#[derive(Debug, Default)]
pub struct Discovery {
    pub seed_file: Option<PathBuf>,
    pub sitemaps: Vec<String>,
    pub search: bool,
}

/// Built-in seeds, then the seed file, sitemaps and search hits, first URL wins.
pub async fn discover(
    opts: &Discovery,
    settings: &Settings,
    fetcher: &Fetcher,
) -> Result<Vec<CandidateSource>> {
    let mut found = sources::seed_sources();
    if let Some(path) = &opts.seed_file {
        found.extend(sources::load_seed_file(path)?);
    }
    found.extend(sitemap::discover(fetcher, &opts.sitemaps).await);

    if opts.search {
        match SearchClient::from_settings(settings) {
            Some(client) => found.extend(client.discover(fetcher, DEFAULT_QUERIES).await),
            None => info!("No search endpoint configured; skipping search discovery"),
        }
    }

    let total = found.len();
    let unique = sources::dedup_by_url(found);
    info!("Discovered {} candidate sources ({} unique)", total, unique.len());
    Ok(unique)
}

/// Tallies for one run. Produced even when sources or batches fail.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub sources_scored: usize,
    pub sources_processed: usize,
    pub found: usize,
    pub valid: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub saved: usize,
    pub companies_found: usize,
    pub companies_saved: usize,
    pub errors: Vec<String>,
}

impl RunSummary {
    pub fn print(&self) {
        println!(
            "Sources: {} scored, {} processed.",
            self.sources_scored, self.sources_processed
        );
        println!(
            "Products: {} found, {} valid, {} rejected, {} duplicates, {} saved.",
            self.found, self.valid, self.rejected, self.duplicates, self.saved
        );
        println!(
            "Companies: {} found, {} saved.",
            self.companies_found, self.companies_saved
        );
        if !self.errors.is_empty() {
            println!("\n--- Errors ({}) ---", self.errors.len());
            for e in &self.errors {
                println!("  {}", e);
            }
        }
    }

    fn status(&self, attempted: usize) -> RunStatus {
        if attempted > 0 && self.sources_processed == 0 && !self.errors.is_empty() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        }
    }
}

/// Rank `candidates`, then fetch, extract, validate and canonicalize each
/// source in turn before saving products and companies in batches.
///
/// Only a store that cannot open or record the run aborts; per-source and
/// per-batch failures land in `RunSummary::errors`.
pub async fn run<S: Storage + ?Sized>(
    candidates: Vec<CandidateSource>,
    settings: &Settings,
    fetcher: &Fetcher,
    store: &S,
) -> Result<RunSummary, HarvestError> {
    let run_id = store.create_run(AGENT_LABEL)?;
    let mut summary = RunSummary {
        sources_scored: candidates.len(),
        ..RunSummary::default()
    };

    let ranked = score::rank(candidates, settings);
    info!("Run {}: processing {} sources", run_id, ranked.len());

    let pb = ProgressBar::new(ranked.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut ctx = RunContext::new();
    let mut products: Vec<CanonicalRecord> = Vec::new();

    for source in &ranked {
        pb.set_message(source.url.clone());
        match harvest_source(source, settings, fetcher).await {
            Ok(raw) => {
                summary.sources_processed += 1;
                summary.found += raw.len();
                let (accepted, rejected) = validate::validate_batch(raw);
                summary.valid += accepted.len();
                summary.rejected += rejected;
                products.extend(accepted.into_iter().filter_map(|r| ctx.canonicalize(r)));
            }
            Err(e) => {
                warn!("Source {} failed: {}", source.url, e);
                summary.errors.push(e.to_string());
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    summary.duplicates = ctx.duplicates();
    info!(
        "{} unique products, {} duplicates skipped",
        ctx.unique(),
        summary.duplicates
    );

    let mut book = CompanyBook::new();
    for record in &products {
        book.observe(record);
    }
    summary.companies_found = book.len();

    for (i, chunk) in products.chunks(settings.batch_size.max(1)).enumerate() {
        match store.upsert_products(chunk) {
            Ok(outcome) => {
                summary.saved += outcome.count;
                summary.errors.extend(outcome.errors);
            }
            Err(e) => {
                warn!("Product batch {} failed: {}", i + 1, e);
                summary.errors.push(format!("product batch {}: {}", i + 1, e));
            }
        }
    }

    if !book.is_empty() {
        match store.upsert_companies(book.companies()) {
            Ok(outcome) => {
                summary.companies_saved = outcome.count;
                summary.errors.extend(outcome.errors);
            }
            Err(e) => {
                warn!("Company upsert failed: {}", e);
                summary.errors.push(format!("companies: {}", e));
            }
        }
    }

    let update = RunUpdate {
        status: summary.status(ranked.len()),
        products_found: summary.found,
        products_saved: summary.saved,
        companies_saved: summary.companies_saved,
        error_message: (!summary.errors.is_empty()).then(|| summary.errors.join("\n")),
    };
    if let Err(e) = store.update_run(run_id, &update) {
        warn!("Could not record outcome of run {}: {}", run_id, e);
        summary.errors.push(format!("run {}: {}", run_id, e));
    }

    info!(
        "Run {} {}: {} saved, {} duplicates, {} errors",
        run_id,
        update.status.as_str(),
        summary.saved,
        summary.duplicates,
        summary.errors.len()
    );
    Ok(summary)
}

async fn harvest_source(
    source: &CandidateSource,
    settings: &Settings,
    fetcher: &Fetcher,
) -> Result<Vec<RawRecord>, HarvestError> {
    let content = fetcher.get(&source.url).await?;
    extract::extract_paced(source, &content, settings.rate_limit()).await
}

/// Extract and canonicalize one source without touching storage.
pub async fn dry_run(
    source: &CandidateSource,
    fetcher: &Fetcher,
) -> Result<Vec<CanonicalRecord>, HarvestError> {
    let content = fetcher.get(&source.url).await?;
    let raw = extract::extract(source.format, &content, &source.url)?;
    let (accepted, rejected) = validate::validate_batch(raw);
    info!("{} accepted, {} rejected", accepted.len(), rejected);
    let mut ctx = RunContext::new();
    Ok(accepted.into_iter().filter_map(|r| ctx.canonicalize(r)).collect())
}
