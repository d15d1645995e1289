use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::batch::{rerank_batch, RerankRequest};
use crate::config::{clamp_top_k, ClickFeature, Config, DuplicatePolicy, RerankConfig};
use crate::rerank::{Reranker, WeightedReranker};
use crate::signals::aggregate;
use crate::{table, warn_print};

/// Rank travel activities by similarity blended with user behavior
#[derive(Parser, Debug)]
#[command(name = "travelrank")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output (only show results/errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to ~/.travelrank/config.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rerank a candidate table using an event log
    Rank {
        /// CSV with activity_id (or id), title, sim
        #[arg(long)]
        activities: PathBuf,

        /// CSV with activity_id, dwell_sec, clicked
        #[arg(long)]
        logs: PathBuf,

        /// Weight on similarity
        #[arg(long, allow_negative_numbers = true)]
        alpha: Option<f64>,

        /// Weight on normalized dwell
        #[arg(long, allow_negative_numbers = true)]
        beta: Option<f64>,

        /// Weight on the click feature
        #[arg(long, allow_negative_numbers = true)]
        gamma: Option<f64>,

        /// Number of results to keep; zero or negative keeps none
        #[arg(long, allow_negative_numbers = true)]
        top_k: Option<i64>,

        /// Dwell in seconds at which the dwell feature saturates
        #[arg(long)]
        t0: Option<f64>,

        /// Use click rate instead of the ever-clicked flag
        #[arg(long)]
        click_rate: bool,

        /// Fail when an activity id appears twice in the candidate table
        #[arg(long)]
        reject_duplicates: bool,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show per-activity behavior aggregated from an event log
    Signals {
        /// CSV with activity_id, dwell_sec, clicked
        #[arg(long)]
        logs: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Rerank a JSON array of requests in parallel
    Batch {
        /// JSON file holding an array of {query, candidates, events, config}
        #[arg(long)]
        requests: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve reranking over HTTP
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Flag overrides applied on top of the loaded configuration
#[derive(Debug, Default)]
struct RankOverrides {
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
    top_k: Option<i64>,
    t0: Option<f64>,
    click_rate: bool,
    reject_duplicates: bool,
}

impl RankOverrides {
    fn apply(self, mut config: RerankConfig) -> RerankConfig {
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(beta) = self.beta {
            config.beta = beta;
        }
        if let Some(gamma) = self.gamma {
            config.gamma = gamma;
        }
        if let Some(top_k) = self.top_k {
            config.top_k = clamp_top_k(top_k);
        }
        if let Some(t0) = self.t0 {
            config.t0 = t0;
        }
        if self.click_rate {
            config.click_feature = ClickFeature::Rate;
        }
        if self.reject_duplicates {
            config.duplicates = DuplicatePolicy::Reject;
        }
        config
    }
}

pub async fn run_with(cli: Cli) -> Result<()> {
    if cli.quiet {
        crate::output::set_quiet(true);
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Rank {
            activities,
            logs,
            alpha,
            beta,
            gamma,
            top_k,
            t0,
            click_rate,
            reject_duplicates,
            json,
        } => {
            let overrides = RankOverrides {
                alpha,
                beta,
                gamma,
                top_k,
                t0,
                click_rate,
                reject_duplicates,
            };
            rank(&activities, &logs, overrides.apply(config.rerank), json)
        }
        Commands::Signals { logs, json } => signals(&logs, json),
        Commands::Batch { requests, json } => batch(&requests, &config.rerank, json),
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            crate::server::serve(&host, port, config.rerank).await
        }
    }
}

fn rank(activities: &Path, logs: &Path, config: RerankConfig, json: bool) -> Result<()> {
    let reranker = WeightedReranker::new(config).context("Invalid rerank configuration")?;

    let candidates = table::load_candidates(activities)
        .with_context(|| format!("Failed to read activities from {}", activities.display()))?;
    let events = table::load_events(logs)
        .with_context(|| format!("Failed to read logs from {}", logs.display()))?;

    info!(
        candidates = candidates.len(),
        events = events.len(),
        "Loaded rerank inputs"
    );

    let signals = aggregate(&events);
    let results = reranker.rerank(candidates, &signals)?;

    crate::output::print_ranked(&results, json)
}

fn signals(logs: &Path, json: bool) -> Result<()> {
    let events = table::load_events(logs)
        .with_context(|| format!("Failed to read logs from {}", logs.display()))?;
    let index = aggregate(&events);
    crate::output::print_signals(index.summaries(), json)
}

fn batch(path: &Path, base: &RerankConfig, json: bool) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read requests from {}", path.display()))?;
    let requests: Vec<RerankRequest> =
        serde_json::from_str(&content).context("Requests file must be a JSON array of rerank requests")?;

    let responses = rerank_batch(requests, base);

    if json {
        let mut output = Vec::with_capacity(responses.len());
        for (idx, response) in responses.into_iter().enumerate() {
            match response {
                Ok(response) => output.push(serde_json::to_value(&response)?),
                Err(e) => {
                    warn_print!("Request {} failed: {}", idx, e);
                    output.push(serde_json::json!({ "error": e.to_string() }));
                }
            }
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", crate::output::format_batch(&responses));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let overrides = RankOverrides {
            alpha: Some(1.0),
            top_k: Some(-3),
            click_rate: true,
            ..Default::default()
        };
        let config = overrides.apply(RerankConfig::default());

        assert_eq!(config.alpha, 1.0);
        assert_eq!(config.beta, 0.3);
        assert_eq!(config.top_k, 0);
        assert_eq!(config.click_feature, ClickFeature::Rate);
        assert_eq!(config.duplicates, DuplicatePolicy::Keep);
    }

    #[test]
    fn test_parse_batch_json_flag() {
        let cli = Cli::try_parse_from(["travelrank", "batch", "--requests", "r.json", "--json"]).unwrap();
        match cli.command {
            Commands::Batch { requests, json } => {
                assert_eq!(requests, PathBuf::from("r.json"));
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["travelrank", "batch", "--requests", "r.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Batch { json: false, .. }));
    }

    #[test]
    fn test_parse_rank_command() {
        let cli = Cli::try_parse_from([
            "travelrank",
            "rank",
            "--activities",
            "a.csv",
            "--logs",
            "l.csv",
            "--top-k",
            "5",
            "--gamma",
            "0.2",
        ])
        .unwrap();

        match cli.command {
            Commands::Rank { top_k, gamma, alpha, .. } => {
                assert_eq!(top_k, Some(5));
                assert_eq!(gamma, Some(0.2));
                assert_eq!(alpha, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
