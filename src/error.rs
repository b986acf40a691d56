use thiserror::Error;

/// An error in the traffic configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The lane layout has no lanes, so nothing could ever spawn.
    #[error("lane layout is empty")]
    NoLanes,

    /// The configuration could not be parsed.
    #[cfg(feature = "serde")]
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
