use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiposteError {
    /// Defender actor (or its data) could not be resolved; evaluation fails closed.
    #[error("Missing capability data: {0}")]
    MissingCapabilityData(String),

    /// Stored usage entry is not a non-negative integer; treated as zero.
    #[error("Usage state corrupt: {0}")]
    UsageStateCorrupt(String),

    /// Alias lists are empty or malformed; unmatched aliases simply deny.
    #[error("Configuration mismatch: {0}")]
    ConfigurationMismatch(String),

    #[error("Invalid talent rank {value} for actor {actor}")]
    InvalidRank { actor: String, value: i64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RiposteError>;
