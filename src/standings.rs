use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::game_log::{GameRecord, Location, Outcome};

const EASTERN_CONFERENCE: &[&str] = &[
    "ATL", "BOS", "BKN", "CHA", "CHI", "CLE", "DET", "IND", "MIA", "MIL", "NYK", "ORL", "PHI",
    "TOR", "WAS",
];

const WESTERN_CONFERENCE: &[&str] = &[
    "DAL", "DEN", "GSW", "HOU", "LAC", "LAL", "MEM", "MIN", "NOP", "OKC", "PHX", "POR", "SAC",
    "SAS", "UTA",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Conference {
    East,
    West,
}

pub fn conference_of(team: &str) -> Option<Conference> {
    let code = team.trim().to_ascii_uppercase();
    if EASTERN_CONFERENCE.contains(&code.as_str()) {
        Some(Conference::East)
    } else if WESTERN_CONFERENCE.contains(&code.as_str()) {
        Some(Conference::West)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsRow {
    pub team: String,
    pub wins: u32,
    pub losses: u32,
    /// wins / (wins + losses); NaN when the team has no decided games.
    pub win_pct: f64,
}

impl StandingsRow {
    pub fn new(team: impl Into<String>, wins: u32, losses: u32) -> Self {
        Self {
            team: team.into(),
            wins,
            losses,
            win_pct: win_percentage(wins, losses),
        }
    }

    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }
}

pub fn win_percentage(wins: u32, losses: u32) -> f64 {
    let played = wins + losses;
    if played == 0 {
        return f64::NAN;
    }
    wins as f64 / played as f64
}

/// Rank teams by win percentage.
///
/// Undecided games are skipped. Teams are grouped in ascending team-code
/// order and then stably sorted by win percentage, so equal percentages stay
/// in team-code order. NaN rows go last.
pub fn compute_standings(games: &[GameRecord]) -> Vec<StandingsRow> {
    let mut tally: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for g in games {
        let Some(outcome) = g.outcome else { continue };
        let entry = tally.entry(g.team.as_str()).or_insert((0, 0));
        match outcome {
            Outcome::Win => entry.0 += 1,
            Outcome::Loss => entry.1 += 1,
        }
    }

    let mut rows: Vec<StandingsRow> = tally
        .into_iter()
        .map(|(team, (wins, losses))| StandingsRow::new(team, wins, losses))
        .collect();
    rows.sort_by(|a, b| cmp_win_pct_desc(a.win_pct, b.win_pct));
    rows
}

fn cmp_win_pct_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Split standings into East and West tables, keeping rank order.
/// Teams outside both conferences are dropped.
pub fn split_by_conference(rows: &[StandingsRow]) -> (Vec<StandingsRow>, Vec<StandingsRow>) {
    let mut east = Vec::new();
    let mut west = Vec::new();
    for row in rows {
        match conference_of(&row.team) {
            Some(Conference::East) => east.push(row.clone()),
            Some(Conference::West) => west.push(row.clone()),
            None => {}
        }
    }
    (east, west)
}

/// Win/loss record of one entity, overall and by location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
    pub home_wins: u32,
    pub home_losses: u32,
    pub away_wins: u32,
    pub away_losses: u32,
}

impl TeamRecord {
    pub fn win_pct(&self) -> f64 {
        win_percentage(self.wins, self.losses)
    }

    pub fn home_win_pct(&self) -> f64 {
        win_percentage(self.home_wins, self.home_losses)
    }

    pub fn away_win_pct(&self) -> f64 {
        win_percentage(self.away_wins, self.away_losses)
    }
}

pub fn team_record(games: &[GameRecord]) -> TeamRecord {
    let mut rec = TeamRecord::default();
    for g in games {
        let Some(outcome) = g.outcome else { continue };
        let home = g.location() == Location::Home;
        match (outcome, home) {
            (Outcome::Win, true) => rec.home_wins += 1,
            (Outcome::Win, false) => rec.away_wins += 1,
            (Outcome::Loss, true) => rec.home_losses += 1,
            (Outcome::Loss, false) => rec.away_losses += 1,
        }
    }
    rec.wins = rec.home_wins + rec.away_wins;
    rec.losses = rec.home_losses + rec.away_losses;
    rec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_games_is_nan() {
        assert!(win_percentage(0, 0).is_nan());
        assert_eq!(win_percentage(3, 1), 0.75);
        assert!(StandingsRow::new("CHA", 0, 0).win_pct.is_nan());
    }

    #[test]
    fn nan_rows_sort_last() {
        let mut rows = vec![
            StandingsRow::new("AAA", 0, 0),
            StandingsRow::new("BBB", 1, 3),
            StandingsRow::new("CCC", 3, 1),
        ];
        rows.sort_by(|a, b| cmp_win_pct_desc(a.win_pct, b.win_pct));
        let order: Vec<&str> = rows.iter().map(|r| r.team.as_str()).collect();
        assert_eq!(order, vec!["CCC", "BBB", "AAA"]);
    }

    #[test]
    fn conferences_cover_thirty_teams() {
        assert_eq!(EASTERN_CONFERENCE.len() + WESTERN_CONFERENCE.len(), 30);
        assert_eq!(conference_of("cha"), Some(Conference::East));
        assert_eq!(conference_of("LAL"), Some(Conference::West));
        assert_eq!(conference_of("XXX"), None);
    }
}
