//! Error taxonomy for the mirroring pipeline.

use thiserror::Error;

/// Failure kinds produced while mirroring a single leader event.
///
/// Everything except [`MirrorError::Stream`] is contained to the event that
/// produced it; the processor logs it and moves on.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Malformed frame: {0}")]
    Decode(String),

    #[error("Cannot resolve market {coin}: {reason}")]
    Resolution { coin: String, reason: String },

    #[error("Invalid follower size for {coin}: {reason}")]
    Sizing { coin: String, reason: String },

    #[error("Exchange rejected {action}: {reason}")]
    Submission { action: &'static str, reason: String },

    #[error("Event stream failure: {0}")]
    Stream(String),
}

impl MirrorError {
    pub fn resolution(coin: &str, reason: impl Into<String>) -> Self {
        Self::Resolution {
            coin: coin.to_string(),
            reason: reason.into(),
        }
    }

    pub fn sizing(coin: &str, reason: impl Into<String>) -> Self {
        Self::Sizing {
            coin: coin.to_string(),
            reason: reason.into(),
        }
    }

    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Resolution { .. } => "resolution",
            Self::Sizing { .. } => "sizing",
            Self::Submission { .. } => "submission",
            Self::Stream(_) => "stream",
        }
    }
}

impl From<serde_json::Error> for MirrorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for MirrorError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Stream(e.to_string())
    }
}

pub type MirrorResult<T> = std::result::Result<T, MirrorError>;
