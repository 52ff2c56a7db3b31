use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Token the upstream matchup descriptor uses for home games ("CHA vs. BOS").
/// Away games use "@" ("CHA @ BOS"). Anything without the home token is away.
pub const HOME_MARKER: &str = "vs.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim() {
            "W" | "w" => Some(Outcome::Win),
            "L" | "l" => Some(Outcome::Loss),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Outcome::Win => "W",
            Outcome::Loss => "L",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Home,
    Away,
}

/// Classify a matchup descriptor as a home or away game.
///
/// Every home/away split in the crate goes through this predicate, so a
/// change in the upstream descriptor format only needs fixing here.
pub fn classify_location(matchup: &str) -> Location {
    if matchup.contains(HOME_MARKER) {
        Location::Home
    } else {
        Location::Away
    }
}

/// Box score line for one team (or player) in one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    pub minutes: f64,
    pub points: f64,
    pub fgm: f64,
    pub fga: f64,
    pub fg3m: f64,
    pub fg3a: f64,
    pub ftm: f64,
    pub fta: f64,
    pub oreb: f64,
    pub dreb: f64,
    pub reb: f64,
    pub ast: f64,
    pub stl: f64,
    pub blk: f64,
    pub tov: f64,
    pub pf: f64,
    pub plus_minus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: String,
    pub game_date: NaiveDate,
    pub team: String,
    pub matchup: String,
    pub outcome: Option<Outcome>,
    pub stats: BoxScore,
}

impl GameRecord {
    pub fn location(&self) -> Location {
        classify_location(&self.matchup)
    }

    /// Opponent code, taken from the last token of the matchup descriptor.
    pub fn opponent(&self) -> Option<&str> {
        let mut parts = self.matchup.split_whitespace();
        let first = parts.next()?;
        Some(parts.last().unwrap_or(first))
    }

    /// Whether the game has a result. Scheduled games carry no box score.
    pub fn is_decided(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn points_allowed(&self) -> f64 {
        self.stats.points - self.stats.plus_minus
    }

    pub fn two_point_made(&self) -> f64 {
        self.stats.fgm - self.stats.fg3m
    }
}

/// Whose games a log describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    /// Every team's games in a season.
    League,
    /// One team, by abbreviation ("CHA").
    Team(String),
    /// One player, by NBA stats person id.
    Player(u64),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::League => write!(f, "league"),
            Entity::Team(code) => write!(f, "team {code}"),
            Entity::Player(id) => write!(f, "player {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonLog {
    pub entity: Entity,
    pub season: String,
    pub games: Vec<GameRecord>,
}

impl SeasonLog {
    pub fn new(entity: Entity, season: impl Into<String>, games: Vec<GameRecord>) -> Self {
        Self {
            entity,
            season: season.into(),
            games,
        }
    }

    pub fn empty(entity: Entity, season: impl Into<String>) -> Self {
        Self::new(entity, season, Vec::new())
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Restrict a league-wide log to one team's games.
    pub fn for_team(&self, team: &str) -> SeasonLog {
        let games = self
            .games
            .iter()
            .filter(|g| g.team.eq_ignore_ascii_case(team))
            .cloned()
            .collect();
        SeasonLog::new(Entity::Team(team.to_string()), self.season.clone(), games)
    }

    /// Same log with scheduled (unplayed) games removed.
    pub fn decided(&self) -> SeasonLog {
        let games = self.games.iter().filter(|g| g.is_decided()).cloned().collect();
        SeasonLog::new(self.entity.clone(), self.season.clone(), games)
    }
}

/// Several season logs back to back. Order is kept as given; nothing is
/// deduplicated or re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedLog {
    pub seasons: Vec<String>,
    pub games: Vec<GameRecord>,
}

impl CombinedLog {
    pub fn concat<'a>(logs: impl IntoIterator<Item = &'a SeasonLog>) -> Self {
        let mut out = CombinedLog::default();
        for log in logs {
            out.push(log);
        }
        out
    }

    pub fn push(&mut self, log: &SeasonLog) {
        self.seasons.push(log.season.clone());
        self.games.extend(log.games.iter().cloned());
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }
}
