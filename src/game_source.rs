use tracing::warn;

use crate::error::StatsError;
use crate::game_log::{CombinedLog, Entity, SeasonLog};

/// Anything that can hand back one entity's games for one season.
///
/// Implementations report every failure, including an empty upstream
/// answer, as `StatsError::DataUnavailable`.
pub trait GameLogSource {
    fn fetch_season(&self, entity: &Entity, season: &str) -> Result<SeasonLog, StatsError>;
}

/// Fetch a season, turning an unavailable log into an empty one.
pub fn load_season_or_empty<S: GameLogSource + ?Sized>(
    source: &S,
    entity: &Entity,
    season: &str,
) -> SeasonLog {
    match source.fetch_season(entity, season) {
        Ok(log) => log,
        Err(err) => {
            warn!(%entity, season, error = %err, "game log unavailable, using empty log");
            SeasonLog::empty(entity.clone(), season)
        }
    }
}

/// Fetch several seasons and concatenate them in the order given.
pub fn load_combined<S: GameLogSource + ?Sized>(
    source: &S,
    entity: &Entity,
    seasons: &[String],
) -> (Vec<SeasonLog>, CombinedLog) {
    let logs: Vec<SeasonLog> = seasons
        .iter()
        .map(|season| load_season_or_empty(source, entity, season))
        .collect();
    let combined = CombinedLog::concat(&logs);
    (logs, combined)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct FixedSource {
        logs: HashMap<String, SeasonLog>,
    }

    impl GameLogSource for FixedSource {
        fn fetch_season(&self, entity: &Entity, season: &str) -> Result<SeasonLog, StatsError> {
            self.logs
                .get(season)
                .cloned()
                .ok_or_else(|| StatsError::unavailable(entity, season, "not stored"))
        }
    }

    #[test]
    fn missing_season_becomes_empty_log() {
        let source = FixedSource {
            logs: HashMap::new(),
        };
        let entity = Entity::Team("CHA".to_string());
        let log = load_season_or_empty(&source, &entity, "2023-24");
        assert!(log.is_empty());
        assert_eq!(log.season, "2023-24");
        assert_eq!(log.entity, entity);
    }

    #[test]
    fn combined_keeps_requested_season_order() {
        let entity = Entity::Team("CHA".to_string());
        let source = FixedSource {
            logs: HashMap::from([(
                "2024-25".to_string(),
                SeasonLog::empty(entity.clone(), "2024-25"),
            )]),
        };
        let seasons = vec!["2024-25".to_string(), "2023-24".to_string()];
        let (logs, combined) = load_combined(&source, &entity, &seasons);
        assert_eq!(logs.len(), 2);
        assert_eq!(combined.seasons, seasons);
        assert!(combined.is_empty());
    }
}
