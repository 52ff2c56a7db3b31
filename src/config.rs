use std::path::PathBuf;
use std::time::Duration;

use crate::aggregate::Metric;
use crate::http_client::DEFAULT_TIMEOUT_SECS;
use crate::nba_api::STATS_BASE_URL;

const DEFAULT_TEAM: &str = "CHA";
const DEFAULT_SEASONS: &[&str] = &["2023-24", "2024-25"];
const DEFAULT_THRESHOLD: f64 = 100.0;
const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 6 * 60 * 60;
const MIN_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub team: String,
    pub seasons: Vec<String>,
    pub stat: Metric,
    pub threshold: f64,
    /// NBA stats person id; switches the report from team to player.
    pub player: Option<u64>,
    /// Restrict the player report to games against this team code.
    pub opponent: Option<String>,
    pub db_path: Option<PathBuf>,
    pub base_url: String,
    pub http_timeout: Duration,
    pub cache_max_age: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Read `.env.local` and `.env` (if present) and then the process env.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let team = get("NBA_TEAM")
            .map(|t| t.to_ascii_uppercase())
            .unwrap_or_else(|| DEFAULT_TEAM.to_string());
        let seasons = get("NBA_SEASONS")
            .map(|raw| parse_seasons(&raw))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SEASONS.iter().map(|s| s.to_string()).collect());
        let stat = get("NBA_STAT")
            .and_then(|raw| Metric::from_code(&raw))
            .unwrap_or(Metric::Points);
        let threshold = get("NBA_THRESHOLD")
            .and_then(|raw| parse_threshold(&raw))
            .unwrap_or(DEFAULT_THRESHOLD);
        let player = get("NBA_PLAYER_ID").and_then(|raw| raw.parse::<u64>().ok());
        let opponent = get("NBA_OPPONENT").map(|t| t.to_ascii_uppercase());
        let db_path = get("NBA_DB_PATH").map(PathBuf::from);
        let base_url = get("NBA_STATS_BASE_URL").unwrap_or_else(|| STATS_BASE_URL.to_string());
        let timeout_secs = get("NBA_HTTP_TIMEOUT_SECS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(MIN_TIMEOUT_SECS);
        let cache_secs = get("NBA_CACHE_MAX_AGE_SECS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CACHE_MAX_AGE_SECS);

        Self {
            team,
            seasons,
            stat,
            threshold,
            player,
            opponent,
            db_path,
            base_url,
            http_timeout: Duration::from_secs(timeout_secs),
            cache_max_age: Duration::from_secs(cache_secs),
        }
    }
}

/// Threshold X for the estimator; only finite numbers are accepted.
pub fn parse_threshold(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

/// "2023-24, 2024-25" -> ["2023-24", "2024-25"]
pub fn parse_seasons(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
