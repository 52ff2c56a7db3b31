use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::Config;
use crate::error::StatsError;
use crate::game_log::{BoxScore, Entity, GameRecord, Outcome, SeasonLog};
use crate::game_source::GameLogSource;
use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;

pub const STATS_BASE_URL: &str = "https://stats.nba.com/stats";

/// Game-log source backed by the public NBA stats endpoints.
#[derive(Debug, Clone)]
pub struct NbaStatsClient {
    base_url: String,
    timeout: Duration,
    cache_max_age: Duration,
}

impl NbaStatsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, cache_max_age: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            cache_max_age,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.base_url.clone(), cfg.http_timeout, cfg.cache_max_age)
    }

    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String> {
        let client = http_client(self.timeout)?;
        let url = format!("{}/{endpoint}", self.base_url);
        fetch_json_cached(client, &url, query, self.cache_max_age)
            .with_context(|| format!("{endpoint} request failed"))
    }

    /// Every team's games in a season, one record per team per game.
    pub fn league_games(&self, season: &str) -> Result<Vec<GameRecord>> {
        let body = self.get(
            "leaguegamefinder",
            &[
                ("PlayerOrTeam", "T"),
                ("LeagueID", "00"),
                ("SeasonNullable", season),
            ],
        )?;
        parse_result_set_json(&body)
    }

    pub fn player_games(&self, player_id: u64, season: &str) -> Result<Vec<GameRecord>> {
        let id = player_id.to_string();
        let body = self.get(
            "playergamelog",
            &[
                ("PlayerID", id.as_str()),
                ("Season", season),
                ("SeasonType", "Regular Season"),
            ],
        )?;
        parse_result_set_json(&body)
    }
}

impl GameLogSource for NbaStatsClient {
    fn fetch_season(&self, entity: &Entity, season: &str) -> Result<SeasonLog, StatsError> {
        let games = match entity {
            Entity::League => self.league_games(season),
            Entity::Team(code) => self.league_games(season).map(|games| {
                games
                    .into_iter()
                    .filter(|g| g.team.eq_ignore_ascii_case(code))
                    .collect()
            }),
            Entity::Player(id) => self.player_games(*id, season),
        }
        .map_err(|err| StatsError::unavailable(entity, season, format!("{err:#}")))?;

        if games.is_empty() {
            return Err(StatsError::unavailable(entity, season, "no games returned"));
        }
        Ok(SeasonLog::new(entity.clone(), season, games))
    }
}

/// Decode the `resultSets` header/rowSet payload shared by the stats
/// endpoints. Rows without an id, a parseable date or a matchup are skipped.
pub fn parse_result_set_json(raw: &str) -> Result<Vec<GameRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid stats json")?;

    let set = v
        .get("resultSets")
        .and_then(|x| x.as_array())
        .and_then(|sets| sets.first())
        .or_else(|| v.get("resultSet"))
        .ok_or_else(|| anyhow!("missing resultSets"))?;

    let headers: Vec<String> = set
        .get("headers")
        .and_then(|x| x.as_array())
        .ok_or_else(|| anyhow!("missing headers"))?
        .iter()
        .map(|h| h.as_str().unwrap_or_default().to_ascii_uppercase())
        .collect();
    let Some(rows) = set.get("rowSet").and_then(|x| x.as_array()) else {
        return Ok(Vec::new());
    };

    let cols = Columns::new(&headers);
    Ok(rows.iter().filter_map(|row| cols.parse_row(row)).collect())
}

struct Columns {
    game_id: Option<usize>,
    game_date: Option<usize>,
    team: Option<usize>,
    matchup: Option<usize>,
    wl: Option<usize>,
    minutes: Option<usize>,
    points: Option<usize>,
    fgm: Option<usize>,
    fga: Option<usize>,
    fg3m: Option<usize>,
    fg3a: Option<usize>,
    ftm: Option<usize>,
    fta: Option<usize>,
    oreb: Option<usize>,
    dreb: Option<usize>,
    reb: Option<usize>,
    ast: Option<usize>,
    stl: Option<usize>,
    blk: Option<usize>,
    tov: Option<usize>,
    pf: Option<usize>,
    plus_minus: Option<usize>,
}

impl Columns {
    fn new(headers: &[String]) -> Self {
        let idx = |name: &str| headers.iter().position(|h| h == name);
        Self {
            game_id: idx("GAME_ID"),
            game_date: idx("GAME_DATE"),
            team: idx("TEAM_ABBREVIATION"),
            matchup: idx("MATCHUP"),
            wl: idx("WL"),
            minutes: idx("MIN"),
            points: idx("PTS"),
            fgm: idx("FGM"),
            fga: idx("FGA"),
            fg3m: idx("FG3M"),
            fg3a: idx("FG3A"),
            ftm: idx("FTM"),
            fta: idx("FTA"),
            oreb: idx("OREB"),
            dreb: idx("DREB"),
            reb: idx("REB"),
            ast: idx("AST"),
            stl: idx("STL"),
            blk: idx("BLK"),
            tov: idx("TOV"),
            pf: idx("PF"),
            plus_minus: idx("PLUS_MINUS"),
        }
    }

    fn parse_row(&self, row: &Value) -> Option<GameRecord> {
        let cells = row.as_array()?;
        let cell = |i: Option<usize>| i.and_then(|i| cells.get(i)).filter(|v| !v.is_null());
        let num = |i: Option<usize>| cell(i).and_then(parse_number).unwrap_or(0.0);

        let game_id = match cell(self.game_id)? {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let game_date = cell(self.game_date)
            .and_then(|x| x.as_str())
            .and_then(parse_game_date)?;
        let matchup = cell(self.matchup)?.as_str()?.trim().to_string();
        // Player logs carry no team column; the matchup leads with the team.
        let team = cell(self.team)
            .and_then(|x| x.as_str())
            .map(|s| s.trim().to_string())
            .or_else(|| matchup.split_whitespace().next().map(|s| s.to_string()))?;
        let outcome = cell(self.wl).and_then(|x| x.as_str()).and_then(Outcome::from_code);

        Some(GameRecord {
            game_id,
            game_date,
            team,
            matchup,
            outcome,
            stats: BoxScore {
                minutes: num(self.minutes),
                points: num(self.points),
                fgm: num(self.fgm),
                fga: num(self.fga),
                fg3m: num(self.fg3m),
                fg3a: num(self.fg3a),
                ftm: num(self.ftm),
                fta: num(self.fta),
                oreb: num(self.oreb),
                dreb: num(self.dreb),
                reb: num(self.reb),
                ast: num(self.ast),
                stl: num(self.stl),
                blk: num(self.blk),
                tov: num(self.tov),
                pf: num(self.pf),
                plus_minus: num(self.plus_minus),
            },
        })
    }
}

fn parse_number(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    let s = v.as_str()?.trim();
    // Minutes sometimes arrive as "34:12".
    if let Some((mins, secs)) = s.split_once(':') {
        let mins = mins.trim().parse::<f64>().ok()?;
        let secs = secs.trim().parse::<f64>().ok()?;
        return Some(mins + secs / 60.0);
    }
    s.parse::<f64>().ok()
}

/// Accepts "2024-04-14", "2024-04-14T00:00:00" and "APR 14, 2024".
pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Some(head) = s.get(..10) {
        if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
            return Some(d);
        }
    }
    let (month, rest) = s.split_once(' ')?;
    let mut chars = month.chars();
    let first = chars.next()?;
    let month = format!("{}{}", first.to_ascii_uppercase(), chars.as_str().to_ascii_lowercase());
    NaiveDate::parse_from_str(&format!("{month} {}", rest.trim()), "%b %d, %Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_date_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 4, 14);
        assert_eq!(parse_game_date("2024-04-14"), d);
        assert_eq!(parse_game_date("2024-04-14T00:00:00"), d);
        assert_eq!(parse_game_date("APR 14, 2024"), d);
        assert_eq!(parse_game_date("Apr 14, 2024"), d);
        assert_eq!(parse_game_date("someday"), None);
    }

    #[test]
    fn parse_number_handles_clock_minutes() {
        assert_eq!(parse_number(&Value::from(12)), Some(12.0));
        assert_eq!(parse_number(&Value::from("34:30")), Some(34.5));
        assert_eq!(parse_number(&Value::from("7")), Some(7.0));
        assert_eq!(parse_number(&Value::from("-")), None);
    }
}
