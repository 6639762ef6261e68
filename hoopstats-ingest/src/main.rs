//! hoopstats - player lookup and comparison CLI
//!
//! Subcommands:
//! - `search <name>`: candidates as JSON lines `{index, display_name, identifier, team}`
//! - `fetch <name>` / `fetch --id <id>`: merged record (and optionally the season series) as JSON
//! - `compare <left> <right>`: side-by-side comparison table as JSON
//!
//! Logs go to stderr (or the configured file); stdout carries only JSON.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use hoopstats_common::config::load_bootstrap_config;
use hoopstats_common::logging::init_logging;
use hoopstats_ingest::comparison::ComparisonAssembler;
use hoopstats_ingest::fields::DEFAULT_COMPARISON_METRICS;
use hoopstats_ingest::{
    CachePolicy, CanonicalRecord, ConfigOverrides, Disambiguation, Ingest, IngestConfig,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " [",
    env!("GIT_HASH"),
    "] built ",
    env!("BUILD_TIMESTAMP"),
    " (",
    env!("BUILD_PROFILE"),
    ")"
);

/// Command-line arguments for hoopstats
#[derive(Parser, Debug)]
#[command(name = "hoopstats")]
#[command(about = "Resolve, fetch and compare NBA player records")]
#[command(version, long_version = LONG_VERSION)]
struct Args {
    /// Bootstrap TOML file (else $HOOPSTATS_CONFIG, else the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for cached records
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Stats API root
    #[arg(long, global = true)]
    api_base_url: Option<String>,

    /// Rendered page host
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Minimum milliseconds between upstream requests (0 disables pacing)
    #[arg(long, global = true)]
    pacing_ms: Option<u64>,

    /// Season for the player listing, e.g. 2024-25
    #[arg(long, global = true)]
    season: Option<String>,

    /// Ignore cached entries and fetch again
    #[arg(long, global = true)]
    refresh: bool,

    /// Keep unmodified upstream payloads under <cache_dir>/raw
    #[arg(long, global = true)]
    persist_raw: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List players whose name contains the query
    Search {
        query: String,
    },

    /// Fetch one player's merged record
    Fetch {
        /// Player name (ignored with --id)
        #[arg(required_unless_present = "id")]
        query: Option<String>,

        /// Fetch by identifier, skipping name resolution
        #[arg(long)]
        id: Option<String>,

        #[command(flatten)]
        pick: Pick,

        /// Include the per-season series
        #[arg(long)]
        series: bool,
    },

    /// Compare two players metric by metric
    Compare {
        left: String,
        right: String,

        /// Treat LEFT and RIGHT as identifiers
        #[arg(long)]
        ids: bool,

        /// Comma-separated metrics, in output order
        #[arg(long, value_delimiter = ',')]
        metrics: Vec<String>,

        /// Take the first candidate when a name is ambiguous
        #[arg(long)]
        first: bool,

        /// 1-based candidate for LEFT
        #[arg(long)]
        select_left: Option<usize>,

        /// 1-based candidate for RIGHT
        #[arg(long)]
        select_right: Option<usize>,

        /// Also align both season series on this metric
        #[arg(long)]
        trend: Option<String>,
    },
}

/// Candidate choice when a name matches several players
#[derive(ClapArgs, Debug)]
struct Pick {
    /// Take the first candidate in listing order
    #[arg(long)]
    first: bool,

    /// 1-based candidate position (see `search`)
    #[arg(long, conflicts_with = "first")]
    select: Option<usize>,
}

fn disambiguation(select: Option<usize>, first: bool) -> Disambiguation {
    match (select, first) {
        (Some(index), _) => Disambiguation::Index(index),
        (None, true) => Disambiguation::FirstMatch,
        (None, false) => Disambiguation::RequireUnique,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = load_bootstrap_config(args.config.as_deref())?;
    init_logging(&toml.logging)?;

    info!(
        "Starting hoopstats v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let overrides = ConfigOverrides {
        base_url: args.base_url.clone(),
        api_base_url: args.api_base_url.clone(),
        cache_directory: args.cache_dir.clone(),
        pacing_delay_ms: args.pacing_ms,
        season: args.season.clone(),
        persist_raw: args.persist_raw,
    };
    let config = IngestConfig::resolve(&toml, &overrides);
    let ingest = Ingest::from_config(&config).context("Failed to set up ingest pipeline")?;

    let cache_policy = if args.refresh {
        CachePolicy::Refresh
    } else {
        CachePolicy::UseCache
    };

    match args.command {
        Command::Search { query } => search(&ingest, &query).await,
        Command::Fetch {
            query,
            id,
            pick,
            series,
        } => {
            let record = match (id, query) {
                (Some(id), _) => ingest.fetcher().fetch_record_with(&id, cache_policy).await?,
                (None, Some(query)) => {
                    ingest
                        .fetch_by_name(&query, disambiguation(pick.select, pick.first), cache_policy)
                        .await?
                }
                (None, None) => anyhow::bail!("either a player name or --id is required"),
            };

            let output = if series {
                let series = ingest
                    .fetcher()
                    .fetch_series_with(record.identifier(), cache_policy)
                    .await;
                json!({ "record": record, "series": series })
            } else {
                json!({ "record": record })
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Command::Compare {
            left,
            right,
            ids,
            metrics,
            first,
            select_left,
            select_right,
            trend,
        } => {
            let left = load(&ingest, &left, ids, disambiguation(select_left, first), cache_policy)
                .await
                .with_context(|| format!("Failed to load '{}'", left))?;
            let right = load(&ingest, &right, ids, disambiguation(select_right, first), cache_policy)
                .await
                .with_context(|| format!("Failed to load '{}'", right))?;

            let metrics: Vec<String> = if metrics.is_empty() {
                DEFAULT_COMPARISON_METRICS.iter().map(|m| m.to_string()).collect()
            } else {
                metrics
            };
            let table = ComparisonAssembler::compare(&left, &right, &metrics);

            let output = match trend {
                Some(metric) => {
                    let left_series = ingest
                        .fetcher()
                        .fetch_series_with(left.identifier(), cache_policy)
                        .await;
                    let right_series = ingest
                        .fetcher()
                        .fetch_series_with(right.identifier(), cache_policy)
                        .await;
                    let trend =
                        ComparisonAssembler::compare_series(&left_series, &right_series, &metric);
                    json!({ "comparison": table, "trend": trend })
                }
                None => json!({ "comparison": table }),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

async fn search(ingest: &Ingest, query: &str) -> Result<()> {
    let identity = ingest
        .search(query)
        .await
        .context("Player listing could not be fetched")?;

    if identity.is_empty() {
        info!(query = %query, "No players match");
        return Ok(());
    }

    for (position, candidate) in identity.candidates().iter().enumerate() {
        let line = json!({
            "index": position + 1,
            "display_name": candidate.display_name,
            "identifier": candidate.identifier,
            "team": candidate.team,
        });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

async fn load(
    ingest: &Ingest,
    player: &str,
    by_id: bool,
    policy: Disambiguation,
    cache_policy: CachePolicy,
) -> Result<CanonicalRecord> {
    if by_id {
        Ok(ingest.fetcher().fetch_record_with(player, cache_policy).await?)
    } else {
        Ok(ingest.fetch_by_name(player, policy, cache_policy).await?)
    }
}
