//! Season aggregation and extreme-value estimates over NBA game logs.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod game_log;
pub mod game_source;
pub mod game_store;
pub mod gumbel;
pub mod http_cache;
pub mod http_client;
pub mod logging;
pub mod nba_api;
pub mod report;
pub mod standings;

pub use aggregate::{Aggregation, Metric, aggregate_totals, split_home_away};
pub use error::StatsError;
pub use game_log::{
    BoxScore, CombinedLog, Entity, GameRecord, Location, Outcome, SeasonLog, classify_location,
};
pub use gumbel::{GumbelParams, ThresholdEstimate};
pub use standings::{StandingsRow, compute_standings};
