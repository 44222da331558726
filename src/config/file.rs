//! TOML configuration file loading
//!
//! Supports `~/.config/jarvis/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct JarvisConfigFile {
    /// Assistant identity and wake phrase tuning
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Capture timing and microphone settings
    #[serde(default)]
    pub listen: ListenFileConfig,

    /// STT/TTS model selection
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Assistant identity configuration
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Canonical name (e.g. "jarvis")
    pub name: Option<String>,

    /// Ordered wake phrases, most specific first
    pub wake_phrases: Option<Vec<String>>,

    /// Words that may precede the name (e.g. "hey")
    pub wake_prefixes: Option<Vec<String>>,

    /// Similarity accepted without a prefix
    pub strict_ratio: Option<f64>,

    /// Similarity accepted after a prefix word
    pub prefixed_ratio: Option<f64>,

    /// Add contractions and interjections to responses
    pub humanize: Option<bool>,
}

/// Listening configuration
#[derive(Debug, Default, Deserialize)]
pub struct ListenFileConfig {
    pub command_timeout_secs: Option<u64>,
    pub confirm_timeout_secs: Option<u64>,
    pub phrase_limit_secs: Option<u64>,
    pub wake_phrase_limit_secs: Option<u64>,
    pub retries: Option<u32>,
    pub service_backoff_ms: Option<u64>,

    /// Substring of the input device name to prefer
    pub input_device: Option<String>,

    /// Minimum RMS energy that counts as speech
    pub energy_floor: Option<f32>,
    pub calibration_ms: Option<u64>,
    pub pause_ms: Option<u64>,
    pub min_phrase_ms: Option<u64>,
}

/// Voice model configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `JarvisConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> JarvisConfigFile {
    let Some(path) = config_file_path() else {
        return JarvisConfigFile::default();
    };

    if !path.exists() {
        return JarvisConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            JarvisConfigFile::default()
        }
    }
}

/// Read and parse an explicit config file
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<JarvisConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/jarvis/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("jarvis").join("config.toml"))
}
