/// Result alias that carries the custom [`BeatshiftError`] type.
pub type Result<T> = std::result::Result<T, BeatshiftError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum BeatshiftError {
    /// The run could not be configured: unreadable input, malformed config
    /// file or an out-of-range option.
    #[error("configuration error: {0}")]
    Config(String),
    /// The decoded audio advertises a format the engine cannot segment.
    #[error("invalid audio format: {0}")]
    InvalidFormat(String),
    /// The tempo or bar layout does not produce a usable beat length.
    #[error("invalid tempo: {0}")]
    InvalidTempo(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around errors raised by the WAV container codec.
    #[error("wav codec error: {0}")]
    Wav(#[from] hound::Error),
    /// Wrapper around JSON serialisation errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BeatshiftError {
    /// Creates a configuration error from the provided message.
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_format<T: Into<String>>(msg: T) -> Self {
        Self::InvalidFormat(msg.into())
    }

    pub fn invalid_tempo<T: Into<String>>(msg: T) -> Self {
        Self::InvalidTempo(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure_class() {
        let err = BeatshiftError::invalid_tempo("bpm must be positive");
        assert_eq!(err.to_string(), "invalid tempo: bpm must be positive");

        let err = BeatshiftError::config("missing input");
        assert!(err.to_string().starts_with("configuration error"));
    }
}
