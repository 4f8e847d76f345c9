use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A rule value failed to deserialize.
    #[error("invalid fanout rule: {0}")]
    Parse(#[from] serde_json::Error),

    /// A rule deserialized but carries unusable values.
    #[error("invalid fanout rule: {field}: {reason}")]
    InvalidSetting {
        field: &'static str,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
