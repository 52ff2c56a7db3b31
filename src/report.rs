use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::aggregate::{
    self, DEFENSIVE_PERFORMANCE, DistributionSummary, Metric, PER_GAME_PRODUCTION,
    REBOUNDS_AND_SCORING, ScoringSplit, TeamPointsAverage, Totals,
};
use crate::game_log::{CombinedLog, Entity, GameRecord, SeasonLog};
use crate::game_source::{GameLogSource, load_combined};
use crate::gumbel::{self, ThresholdEstimate};
use crate::standings::{self, StandingsRow, TeamRecord};

const CURVE_POINTS: usize = 200;

/// Box-score columns summarised for a player.
pub const PLAYER_STATS: &[Metric] = &[Metric::Points, Metric::Rebounds, Metric::Assists];

/// Season averages shown next to a player's distribution table.
pub const PLAYER_SEASON_AVERAGES: &[Metric] = &[
    Metric::PointsPerGame,
    Metric::Assists,
    Metric::ReboundsPerGame,
    Metric::Minutes,
];

/// Everything the dashboard shows for one team over a run of seasons.
///
/// Only decided games feed the report; scheduled games carry no box score.
#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    pub team: String,
    pub seasons: Vec<String>,
    pub games: usize,
    /// Standings of the last requested season.
    pub standings_season: Option<String>,
    pub east: Vec<StandingsRow>,
    pub west: Vec<StandingsRow>,
    pub league_points: Vec<TeamPointsAverage>,
    pub record: TeamRecord,
    pub totals: Totals,
    pub home_totals: Totals,
    pub away_totals: Totals,
    pub by_season: Vec<(String, Totals)>,
    pub scoring: ScoringSplit,
    pub stat: Metric,
    pub summary: Option<DistributionSummary>,
    pub estimate: Option<ThresholdEstimate>,
    pub estimate_error: Option<String>,
    /// Fitted density over the observed range of `stat`, for charting.
    pub fit_curve: Vec<(f64, f64)>,
}

pub fn report_metrics() -> Vec<Metric> {
    let mut metrics = REBOUNDS_AND_SCORING.to_vec();
    for m in DEFENSIVE_PERFORMANCE.iter().chain(PER_GAME_PRODUCTION) {
        if !metrics.contains(m) {
            metrics.push(*m);
        }
    }
    metrics
}

pub fn build_team_report<S: GameLogSource + ?Sized>(
    source: &S,
    team: &str,
    seasons: &[String],
    stat: Metric,
    threshold: f64,
) -> TeamReport {
    let (league_logs, _) = load_combined(source, &Entity::League, seasons);
    let team_logs: Vec<SeasonLog> = league_logs
        .iter()
        .map(|log| log.for_team(team).decided())
        .collect();
    let combined = CombinedLog::concat(&team_logs);
    let games = combined.games();

    let latest = league_logs.last().map(SeasonLog::decided);
    let standings_rows = latest
        .as_ref()
        .map(|log| standings::compute_standings(log.games()))
        .unwrap_or_default();
    let (east, west) = standings::split_by_conference(&standings_rows);
    let league_points = latest
        .as_ref()
        .map(|log| aggregate::league_points_averages(log.games()))
        .unwrap_or_default();

    let metrics = report_metrics();
    let (home, away) = aggregate::split_home_away(games);

    let values = aggregate::column(games, stat);
    let summary = aggregate::describe(&values);
    let (estimate, estimate_error, fit_curve) = match gumbel::fit(&values) {
        Ok(params) => {
            let curve = summary
                .map(|s| params.density_curve(s.min, s.max, CURVE_POINTS))
                .unwrap_or_default();
            (Some(gumbel::query(params, &values, threshold)), None, curve)
        }
        Err(err) => (None, Some(err.to_string()), Vec::new()),
    };

    TeamReport {
        team: team.to_string(),
        seasons: combined.seasons.clone(),
        games: combined.len(),
        standings_season: latest.map(|log| log.season),
        east,
        west,
        league_points,
        record: standings::team_record(games),
        totals: aggregate::aggregate_totals(games, &metrics),
        home_totals: aggregate::aggregate_totals(&home, &metrics),
        away_totals: aggregate::aggregate_totals(&away, &metrics),
        by_season: aggregate::aggregate_by_season(&team_logs, &metrics),
        scoring: aggregate::scoring_split(games),
        stat,
        summary,
        estimate,
        estimate_error,
        fit_curve,
    }
}

/// Per-player view: distribution of points, rebounds and assists overall
/// and by location, season averages and the games against one opponent.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    pub player_id: u64,
    pub seasons: Vec<String>,
    pub games: usize,
    pub record: TeamRecord,
    pub summaries: BTreeMap<Metric, DistributionSummary>,
    pub home_summaries: BTreeMap<Metric, DistributionSummary>,
    pub away_summaries: BTreeMap<Metric, DistributionSummary>,
    pub averages: Totals,
    /// Every opponent faced, by team code.
    pub opponents: Vec<String>,
    pub opponent: Option<String>,
    pub vs_opponent: Vec<GameRecord>,
}

/// `describe` for each metric; metrics with no values are left out.
pub fn stat_summaries(
    games: &[GameRecord],
    metrics: &[Metric],
) -> BTreeMap<Metric, DistributionSummary> {
    metrics
        .iter()
        .filter_map(|&m| aggregate::describe(&aggregate::column(games, m)).map(|s| (m, s)))
        .collect()
}

pub fn build_player_report<S: GameLogSource + ?Sized>(
    source: &S,
    player_id: u64,
    seasons: &[String],
    opponent: Option<&str>,
) -> PlayerReport {
    let (logs, _) = load_combined(source, &Entity::Player(player_id), seasons);
    let played: Vec<SeasonLog> = logs.iter().map(SeasonLog::decided).collect();
    let combined = CombinedLog::concat(&played);
    let games = combined.games();
    let (home, away) = aggregate::split_home_away(games);

    let opponents: BTreeSet<String> = games
        .iter()
        .filter_map(|g| g.opponent())
        .map(str::to_string)
        .collect();
    let vs_opponent = match opponent {
        Some(code) => games
            .iter()
            .filter(|g| g.opponent().is_some_and(|o| o.eq_ignore_ascii_case(code)))
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    PlayerReport {
        player_id,
        seasons: combined.seasons.clone(),
        games: combined.len(),
        record: standings::team_record(games),
        summaries: stat_summaries(games, PLAYER_STATS),
        home_summaries: stat_summaries(&home, PLAYER_STATS),
        away_summaries: stat_summaries(&away, PLAYER_STATS),
        averages: aggregate::aggregate_totals(games, PLAYER_SEASON_AVERAGES),
        opponents: opponents.into_iter().collect(),
        opponent: opponent.map(|o| o.to_ascii_uppercase()),
        vs_opponent,
    }
}
