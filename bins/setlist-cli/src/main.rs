//! setlist: command-line front end for the league metrics engine.
//!
//! Loads a JSON league snapshot, runs one metric family and prints the
//! result as pretty JSON.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{debug, info};

use setlist_core::{Dataset, League, RoundId};
use setlist_metrics::MetricsConfig;
use setlist_metrics::arcs::all_player_arcs;
use setlist_metrics::network::{build_voting_graph, influence_score_with, voting_blocs, voting_reciprocity};
use setlist_metrics::report::{CommentReport, LeagueReport};
use setlist_metrics::songs::all_song_metrics;
use setlist_metrics::submitters::all_submitter_metrics;
use setlist_metrics::summary::league_summary;
use setlist_metrics::trends::{all_momentum_scores, round_rankings};
use setlist_metrics::voters::{all_voter_metrics, voter_similarity_matrix};

/// Ranking, taste, influence and trajectory metrics for a song-voting league.
#[derive(Parser, Debug)]
#[command(name = "setlist", version, about = "Metrics for song-voting leagues.")]
struct Cli {
    /// League snapshot (JSON).
    #[arg(short, long)]
    league: PathBuf,

    /// Config file (default: <config_dir>/setlist/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Snapshot counts and fingerprint.
    Info,
    /// Per-song points, controversy and obscurity.
    Songs(RoundArgs),
    /// Per-voter generosity, hipster score and golden ear.
    Voters(RoundArgs),
    /// Per-submitter averages, consistency, underdog factor, fan and nemesis.
    Submitters(RoundArgs),
    /// Voting graph, influence, reciprocity, similarity and blocs.
    Network(RoundArgs),
    /// Per-round positions of every submission.
    Rankings(RoundArgs),
    /// Momentum and hot streaks.
    Momentum,
    /// Narrative arc per submitter.
    Arcs,
    /// Comment engagement.
    Comments,
    /// Every table at once.
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct RoundArgs {
    /// Restrict to one round.
    #[arg(short, long)]
    round: Option<String>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Write the report here instead of stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let metrics_config = config::load(cli.config.as_deref())?;
    debug!(?metrics_config, "config loaded");

    let league = League::load(&cli.league)
        .with_context(|| format!("failed to load league from {}", cli.league.display()))?;
    info!(league = %league.name, rounds = league.rounds.len(), "league loaded");

    let output = run(&cli.command, &league, &metrics_config)?;
    let out = match &cli.command {
        Commands::Report(args) => args.out.as_deref(),
        _ => None,
    };
    emit(&output, out)
}

/// Run one subcommand against a loaded league.
fn run(command: &Commands, league: &League, cfg: &MetricsConfig) -> Result<Value> {
    let ds: &dyn Dataset = league;
    let value = match command {
        Commands::Info => json!({
            "name": league.name,
            "fingerprint": league.fingerprint()?,
            "rounds": ds.rounds().len(),
            "competitors": ds.competitors().len(),
            "submissions": ds.submissions().len(),
            "votes": ds.votes().len(),
            "tracks": league.tracks.len(),
            "summary": league_summary(ds),
        }),
        Commands::Songs(args) => {
            let round = resolve_round(ds, args)?;
            serde_json::to_value(all_song_metrics(ds, round.as_ref()))?
        }
        Commands::Voters(args) => {
            let round = resolve_round(ds, args)?;
            serde_json::to_value(all_voter_metrics(ds, round.as_ref()))?
        }
        Commands::Submitters(args) => {
            let round = resolve_round(ds, args)?;
            serde_json::to_value(all_submitter_metrics(ds, round.as_ref()))?
        }
        Commands::Network(args) => {
            let round = resolve_round(ds, args)?;
            let round = round.as_ref();
            let graph = build_voting_graph(ds, round);
            json!({
                "nodes": graph.node_count(),
                "edges": graph.edge_count(),
                "influence": influence_score_with(ds, round, &cfg.rank_config()),
                "reciprocity": voting_reciprocity(ds, round),
                "similarity": voter_similarity_matrix(ds, round),
                "blocs": voting_blocs(ds, round),
            })
        }
        Commands::Rankings(args) => {
            let round = resolve_round(ds, args)?;
            let rankings: Vec<_> = round_rankings(ds)
                .into_iter()
                .filter(|r| round.as_ref().is_none_or(|id| &r.round_id == id))
                .collect();
            serde_json::to_value(rankings)?
        }
        Commands::Momentum => serde_json::to_value(all_momentum_scores(ds, cfg.top_n))?,
        Commands::Arcs => serde_json::to_value(all_player_arcs(ds, cfg.stretch_window))?,
        Commands::Comments => serde_json::to_value(CommentReport::build(ds, cfg))?,
        Commands::Report(_) => serde_json::to_value(LeagueReport::build(ds, cfg))?,
    };
    Ok(value)
}

/// Turn `--round` into a known round id.
fn resolve_round(ds: &dyn Dataset, args: &RoundArgs) -> Result<Option<RoundId>> {
    let Some(raw) = &args.round else {
        return Ok(None);
    };
    let round = RoundId::from(raw.as_str());
    if ds.round_index(&round).is_none() {
        bail!("unknown round: {raw}");
    }
    Ok(Some(round))
}

fn emit(value: &Value, out: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text. Logs go to stderr so stdout stays
/// valid JSON.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}
