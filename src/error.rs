use thiserror::Error;

/// Errors raised by the aggregation and estimation core.
///
/// Expected empty-input cases (no games, no decided games) are reported with
/// empty mappings or NaN values instead of an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("game log unavailable for {entity} in {season}: {reason}")]
    DataUnavailable {
        entity: String,
        season: String,
        reason: String,
    },

    #[error("need at least {required} distinct values to fit, got {distinct}")]
    InsufficientData { distinct: usize, required: usize },

    #[error("sample value at index {index} is not finite")]
    NonFiniteValue { index: usize },

    /// The sample spread over- or underflows f64, so the fitted parameters
    /// are not usable.
    #[error("fit produced unusable parameters (location {location}, scale {scale})")]
    DegenerateFit { location: f64, scale: f64 },
}

impl StatsError {
    pub fn unavailable(entity: impl ToString, season: &str, reason: impl ToString) -> Self {
        StatsError::DataUnavailable {
            entity: entity.to_string(),
            season: season.to_string(),
            reason: reason.to_string(),
        }
    }
}
