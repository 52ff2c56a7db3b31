use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use hornets_stats::config::{Config, parse_seasons};
use hornets_stats::game_store;
use hornets_stats::logging;
use hornets_stats::nba_api::NbaStatsClient;

fn main() -> Result<()> {
    logging::init("info");
    let cfg = Config::load();

    let seasons = parse_seasons_arg().unwrap_or_else(|| cfg.seasons.clone());
    if seasons.is_empty() {
        return Err(anyhow!("no seasons resolved for ingest"));
    }

    let db_path = parse_db_path_arg()
        .or_else(|| cfg.db_path.clone())
        .or_else(game_store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let client = NbaStatsClient::from_config(&cfg);
    let mut conn = game_store::open_db(&db_path)?;
    let summary = game_store::ingest_seasons(&mut conn, db_path.clone(), &client, &seasons)?;

    println!("Season ingest complete");
    println!("DB: {}", summary.db_path.display());
    println!(
        "Seasons: {}/{}",
        summary.seasons_succeeded, summary.seasons_total
    );
    println!("Games upserted: {}", summary.games_upserted);
    for item in &summary.per_season {
        match item.error.as_deref() {
            None => println!("season {}: games={}", item.season, item.games_upserted),
            Some(err) => println!("season {}: failed - {err}", item.season),
        }
    }

    Ok(())
}

fn arg_value(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_db_path_arg() -> Option<PathBuf> {
    arg_value("--db").map(PathBuf::from)
}

fn parse_seasons_arg() -> Option<Vec<String>> {
    arg_value("--seasons")
        .map(|raw| parse_seasons(&raw))
        .filter(|s| !s.is_empty())
}
