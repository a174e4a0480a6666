mod companies;
mod config;
mod dedup;
mod enrich;
mod error;
mod extract;
mod fetch;
mod heuristics;
mod pipeline;
mod record;
mod sources;
mod store;
mod validate;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::Settings;
use crate::extract::truncate;
use crate::fetch::Fetcher;
use crate::pipeline::Discovery;
use crate::sources::{CandidateSource, SourceFormat};
use crate::store::SqliteStore;

#[derive(Parser)]
#[command(name = "hemp_harvester", about = "Harvest hemp product records from open data sources")]
struct Cli {
    /// Settings file (default: harvest.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DiscoveryArgs {
    /// JSON file with extra sources: [{"url", "format"?, "license"?}]
    #[arg(long)]
    seeds: Option<PathBuf>,
    /// Sitemap to mine for candidate URLs (repeatable)
    #[arg(long = "sitemap")]
    sitemaps: Vec<String>,
    /// Skip the search strategy even when an endpoint is configured
    #[arg(long)]
    no_search: bool,
}

impl DiscoveryArgs {
    fn into_discovery(self) -> Discovery {
        Discovery {
            seed_file: self.seeds,
            sitemaps: self.sitemaps,
            search: !self.no_search,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, extract, validate and store products in one run
    Run {
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },
    /// Show ranked candidate sources without fetching them
    Discover {
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },
    /// Extract one file or URL and print canonical records as JSON
    Extract {
        /// Local path, file:// or http(s) URL
        target: String,
        /// html, csv, json, pdf or text (default: from the extension)
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Recent harvest runs
    Runs {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Run { discovery } => {
            let store = SqliteStore::open(Path::new(&settings.db_path))?;
            let fetcher = Fetcher::new(&settings)?;
            let candidates = pipeline::discover(&discovery.into_discovery(), &settings, &fetcher).await?;
            println!("Harvesting from {} candidate sources...", candidates.len());
            let summary = pipeline::run(candidates, &settings, &fetcher, &store).await?;
            summary.print();
            Ok(())
        }
        Commands::Discover { discovery } => {
            let fetcher = Fetcher::new(&settings)?;
            let candidates = pipeline::discover(&discovery.into_discovery(), &settings, &fetcher).await?;
            let total = candidates.len();
            let ranked = sources::score::rank(candidates, &settings);
            if ranked.is_empty() {
                println!(
                    "No sources at or above threshold {:.2} ({} candidates).",
                    settings.score_threshold, total
                );
                return Ok(());
            }

            println!("{:>3} | {:>5} | {:<6} | {:<18} | {:<60}", "#", "Score", "Format", "License", "URL");
            println!("{}", "-".repeat(104));
            for (i, s) in ranked.iter().enumerate() {
                let license = s.license.as_deref().unwrap_or("-");
                println!(
                    "{:>3} | {:>5.2} | {:<6} | {:<18} | {:<60}",
                    i + 1,
                    s.score,
                    s.format.as_str(),
                    truncate(license, 18),
                    truncate(&s.url, 60)
                );
            }
            println!("\n{} of {} candidates ranked", ranked.len(), total);
            Ok(())
        }
        Commands::Extract { target, format } => {
            let source = match format.as_deref() {
                Some(f) => {
                    let fmt = SourceFormat::parse(f)
                        .with_context(|| format!("Unknown format '{}'", f))?;
                    CandidateSource::new(target, fmt, None)
                }
                None => CandidateSource::from_url(target),
            };
            let fetcher = Fetcher::new(&settings)?;
            let records = pipeline::dry_run(&source, &fetcher).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            eprintln!("{} canonical records from {}", records.len(), source.url);
            Ok(())
        }
        Commands::Runs { limit } => {
            let store = SqliteStore::open(Path::new(&settings.db_path))?;
            let runs = store.recent_runs(limit)?;
            if runs.is_empty() {
                println!("No harvest runs yet. Run 'run' first.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<19} | {:<9} | {:>5} | {:>5} | {:>9} | {:>6}",
                "Id", "Started", "Status", "Found", "Saved", "Companies", "Errors"
            );
            println!("{}", "-".repeat(76));
            for r in &runs {
                println!(
                    "{:>4} | {:<19} | {:<9} | {:>5} | {:>5} | {:>9} | {:>6}",
                    r.id,
                    r.started_at.format("%Y-%m-%d %H:%M:%S"),
                    r.status.as_str(),
                    r.products_found,
                    r.products_saved,
                    r.companies_saved,
                    r.errors.len()
                );
            }

            println!(
                "\nStored: {} products, {} companies",
                store.product_count()?,
                store.company_count()?
            );

            if let Some(latest) = runs.iter().find(|r| !r.errors.is_empty()) {
                println!("\n--- Errors of run {} ---", latest.id);
                for e in &latest.errors {
                    println!("  {}", truncate(e, 100));
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, secs % 3600 / 60, secs % 60) {
        (0, 0, _) => format!("{:.1}s", d.as_secs_f64()),
        (0, m, s) => format!("{m}m{s:02}s"),
        (h, m, s) => format!("{h}h{m:02}m{s:02}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m05s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h02m05s");
        assert_eq!(format_duration(Duration::from_secs(7200)), "2h00m00s");
    }

    #[test]
    fn table_cells_are_shortened() {
        assert_eq!(truncate("CC-BY-4.0", 18), "CC-BY-4.0");
        assert_eq!(truncate("https://plantfacts.org/data", 12), "https://plan...");
    }

    #[test]
    fn cli_parses_discovery_flags() {
        let cli = Cli::parse_from([
            "hemp_harvester",
            "run",
            "--seeds",
            "seeds.json",
            "--sitemap",
            "https://a.org/sitemap.xml",
            "--sitemap",
            "https://b.org/sitemap.xml",
            "--no-search",
        ]);
        match cli.command {
            Commands::Run { discovery } => {
                let d = discovery.into_discovery();
                assert_eq!(d.seed_file, Some(PathBuf::from("seeds.json")));
                assert_eq!(d.sitemaps.len(), 2);
                assert!(!d.search);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn cli_extract_and_runs() {
        let cli = Cli::parse_from(["hemp_harvester", "extract", "data.txt", "-f", "text", "-c", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            cli.command,
            Commands::Extract { ref target, format: Some(ref f) } if target == "data.txt" && f == "text"
        ));

        let cli = Cli::parse_from(["hemp_harvester", "runs"]);
        assert!(matches!(cli.command, Commands::Runs { limit: 10 }));
    }
}
