use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use serde::Serialize;

use crate::game_log::{GameRecord, Location, SeasonLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Aggregation {
    Sum,
    Mean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Metric {
    Points,
    PointsPerGame,
    Rebounds,
    ReboundsPerGame,
    OffensiveRebounds,
    DefensiveRebounds,
    TwoPointMade,
    ThreePointMade,
    FreeThrowsMade,
    Steals,
    Assists,
    Blocks,
    Turnovers,
    Fouls,
    PlusMinus,
    PointsAllowed,
    Minutes,
}

impl Metric {
    /// How the metric is reduced over a log. Fixed per metric.
    pub fn aggregation(self) -> Aggregation {
        match self {
            Metric::Points
            | Metric::Rebounds
            | Metric::OffensiveRebounds
            | Metric::DefensiveRebounds
            | Metric::TwoPointMade
            | Metric::ThreePointMade
            | Metric::FreeThrowsMade
            | Metric::Steals => Aggregation::Sum,
            Metric::PointsPerGame
            | Metric::ReboundsPerGame
            | Metric::Assists
            | Metric::Blocks
            | Metric::Turnovers
            | Metric::Fouls
            | Metric::PlusMinus
            | Metric::PointsAllowed
            | Metric::Minutes => Aggregation::Mean,
        }
    }

    pub fn value(self, g: &GameRecord) -> f64 {
        let s = &g.stats;
        match self {
            Metric::Points | Metric::PointsPerGame => s.points,
            Metric::Rebounds | Metric::ReboundsPerGame => s.reb,
            Metric::OffensiveRebounds => s.oreb,
            Metric::DefensiveRebounds => s.dreb,
            Metric::TwoPointMade => g.two_point_made(),
            Metric::ThreePointMade => s.fg3m,
            Metric::FreeThrowsMade => s.ftm,
            Metric::Steals => s.stl,
            Metric::Assists => s.ast,
            Metric::Blocks => s.blk,
            Metric::Turnovers => s.tov,
            Metric::Fouls => s.pf,
            Metric::PlusMinus => s.plus_minus,
            Metric::PointsAllowed => g.points_allowed(),
            Metric::Minutes => s.minutes,
        }
    }

    /// Upstream column code ("PTS", "REB", ...). Per-game variants of a
    /// summed column get their own code.
    pub fn code(self) -> &'static str {
        match self {
            Metric::Points => "PTS",
            Metric::PointsPerGame => "PPG",
            Metric::Rebounds => "REB",
            Metric::ReboundsPerGame => "RPG",
            Metric::OffensiveRebounds => "OREB",
            Metric::DefensiveRebounds => "DREB",
            Metric::TwoPointMade => "FG2M",
            Metric::ThreePointMade => "FG3M",
            Metric::FreeThrowsMade => "FTM",
            Metric::Steals => "STL",
            Metric::Assists => "AST",
            Metric::Blocks => "BLK",
            Metric::Turnovers => "TOV",
            Metric::Fouls => "PF",
            Metric::PlusMinus => "PLUS_MINUS",
            Metric::PointsAllowed => "OPP_PTS",
            Metric::Minutes => "MIN",
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        let code = raw.trim().to_ascii_uppercase();
        ALL_METRICS.iter().copied().find(|m| m.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Points => "Total Points",
            Metric::PointsPerGame => "Points per Game",
            Metric::Rebounds => "Total Rebounds",
            Metric::ReboundsPerGame => "Rebounds per Game",
            Metric::OffensiveRebounds => "Total Offensive Rebounds",
            Metric::DefensiveRebounds => "Total Defensive Rebounds",
            Metric::TwoPointMade => "Total 2-Point Field Goals Made",
            Metric::ThreePointMade => "Total 3-Point Field Goals Made",
            Metric::FreeThrowsMade => "Total Free Throws Made",
            Metric::Steals => "Total Steals",
            Metric::Assists => "Assists per Game",
            Metric::Blocks => "Average Blocks per Game",
            Metric::Turnovers => "Average Turnovers per Game",
            Metric::Fouls => "Average Personal Fouls per Game",
            Metric::PlusMinus => "Average Plus/Minus",
            Metric::PointsAllowed => "Average Points Allowed",
            Metric::Minutes => "Average Minutes",
        }
    }
}

pub const ALL_METRICS: &[Metric] = &[
    Metric::Points,
    Metric::PointsPerGame,
    Metric::Rebounds,
    Metric::ReboundsPerGame,
    Metric::OffensiveRebounds,
    Metric::DefensiveRebounds,
    Metric::TwoPointMade,
    Metric::ThreePointMade,
    Metric::FreeThrowsMade,
    Metric::Steals,
    Metric::Assists,
    Metric::Blocks,
    Metric::Turnovers,
    Metric::Fouls,
    Metric::PlusMinus,
    Metric::PointsAllowed,
    Metric::Minutes,
];

pub const REBOUNDS_AND_SCORING: &[Metric] = &[
    Metric::Rebounds,
    Metric::OffensiveRebounds,
    Metric::DefensiveRebounds,
    Metric::Points,
    Metric::TwoPointMade,
    Metric::ThreePointMade,
    Metric::FreeThrowsMade,
];

pub const DEFENSIVE_PERFORMANCE: &[Metric] = &[
    Metric::Steals,
    Metric::DefensiveRebounds,
    Metric::Blocks,
    Metric::Turnovers,
    Metric::Fouls,
];

pub const PER_GAME_PRODUCTION: &[Metric] = &[
    Metric::PointsPerGame,
    Metric::Assists,
    Metric::ReboundsPerGame,
    Metric::ThreePointMade,
];

pub type Totals = BTreeMap<Metric, f64>;

/// Reduce each requested metric with its fixed aggregation.
/// An empty log yields an empty mapping.
pub fn aggregate_totals(games: &[GameRecord], metrics: &[Metric]) -> Totals {
    let mut out = Totals::new();
    if games.is_empty() {
        return out;
    }
    let n = games.len() as f64;
    for &metric in metrics {
        let sum: f64 = games.iter().map(|g| metric.value(g)).sum();
        let value = match metric.aggregation() {
            Aggregation::Sum => sum,
            Aggregation::Mean => sum / n,
        };
        out.insert(metric, value);
    }
    out
}

/// One totals mapping per season label, in input order.
pub fn aggregate_by_season(logs: &[SeasonLog], metrics: &[Metric]) -> Vec<(String, Totals)> {
    logs.iter()
        .map(|log| (log.season.clone(), aggregate_totals(log.games(), metrics)))
        .collect()
}

/// Partition games into (home, away) with `classify_location`.
pub fn split_home_away(games: &[GameRecord]) -> (Vec<GameRecord>, Vec<GameRecord>) {
    games
        .iter()
        .cloned()
        .partition(|g| g.location() == Location::Home)
}

pub fn column(games: &[GameRecord], metric: Metric) -> Vec<f64> {
    games.iter().map(|g| metric.value(g)).collect()
}

/// Mean of the values, NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringSplit {
    pub home_scored: f64,
    pub home_allowed: f64,
    pub away_scored: f64,
    pub away_allowed: f64,
}

/// Mean points scored and allowed at home and away. A side with no games
/// reports NaN.
pub fn scoring_split(games: &[GameRecord]) -> ScoringSplit {
    let (home, away) = split_home_away(games);
    ScoringSplit {
        home_scored: mean(&column(&home, Metric::Points)),
        home_allowed: mean(&column(&home, Metric::PointsAllowed)),
        away_scored: mean(&column(&away, Metric::Points)),
        away_allowed: mean(&column(&away, Metric::PointsAllowed)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPointsAverage {
    pub team: String,
    pub games: usize,
    pub avg_scored: f64,
    pub avg_allowed: f64,
}

/// Per-team mean points scored and allowed over a league-wide log,
/// ordered by team code.
pub fn league_points_averages(games: &[GameRecord]) -> Vec<TeamPointsAverage> {
    let mut by_team: HashMap<&str, Vec<&GameRecord>> = HashMap::new();
    for g in games {
        by_team.entry(g.team.as_str()).or_default().push(g);
    }

    let mut rows: Vec<TeamPointsAverage> = by_team
        .into_par_iter()
        .map(|(team, team_games)| {
            let n = team_games.len() as f64;
            let scored: f64 = team_games.iter().map(|g| g.stats.points).sum();
            let allowed: f64 = team_games.iter().map(|g| g.points_allowed()).sum();
            TeamPointsAverage {
                team: team.to_string(),
                games: team_games.len(),
                avg_scored: scored / n,
                avg_allowed: allowed / n,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.team.cmp(&b.team));
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n - 1 denominator), NaN below two values.
    pub std_dev: f64,
    pub p_above_mean: f64,
    pub p_below_mean: f64,
}

/// Descriptive summary of one stat column. `None` for an empty slice.
pub fn describe(values: &[f64]) -> Option<DistributionSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let mean = mean(&sorted);
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    // Smallest of the most frequent values; `sorted` makes runs contiguous.
    let mut mode = sorted[0];
    let mut best_run = 0usize;
    let mut i = 0usize;
    while i < n {
        let mut j = i + 1;
        while j < n && sorted[j] == sorted[i] {
            j += 1;
        }
        if j - i > best_run {
            best_run = j - i;
            mode = sorted[i];
        }
        i = j;
    }

    let std_dev = if n < 2 {
        f64::NAN
    } else {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    };

    let above = sorted.iter().filter(|v| **v > mean).count();
    let p_above_mean = above as f64 / n as f64;

    Some(DistributionSummary {
        count: n,
        mean,
        median,
        mode,
        min: sorted[0],
        max: sorted[n - 1],
        std_dev,
        p_above_mean,
        p_below_mean: 1.0 - p_above_mean,
    })
}
