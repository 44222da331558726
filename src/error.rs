//! Error types for the Jarvis dispatcher

use thiserror::Error;

/// Result type alias for dispatcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the dispatcher
///
/// Expected listening outcomes (timeouts, unintelligible speech, an
/// unreachable ASR backend) are not errors; see [`crate::listen::Capture`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Wake phrase compilation error
    #[error("wake word error: {0}")]
    WakeWord(String),

    /// Speech output queue error
    #[error("speech queue error: {0}")]
    Speech(String),

    /// External action failed
    #[error("action error: {0}")]
    Action(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
